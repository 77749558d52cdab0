//! HTTP-level integration tests for artwork gallery endpoints.
//!
//! Uploads go through the real multipart handler into a temporary media
//! directory, so the served file can be fetched back.

mod common;

use axum::http::StatusCode;
use common::{body_json, build_test_app, delete, error_code, get, post_multipart, put, put_json};
use serde_json::{json, Value};
use sqlx::PgPool;

const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nnot-really-a-png";

async fn upload(app: axum::Router, artwork_id: i64, name: &str) -> Value {
    let response = post_multipart(
        app,
        &format!("/api/v1/artworks/{artwork_id}/images"),
        name,
        PNG_BYTES,
        &[],
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"].clone()
}

async fn gallery(app: axum::Router, artwork_id: i64) -> Vec<Value> {
    let response = get(app, &format!("/api/v1/artworks/{artwork_id}/images")).await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["data"].as_array().unwrap().clone()
}

fn ids(images: &[Value]) -> Vec<i64> {
    images.iter().map(|i| i["id"].as_i64().unwrap()).collect()
}

fn primaries(images: &[Value]) -> Vec<i64> {
    images
        .iter()
        .filter(|i| i["is_primary"] == true)
        .map(|i| i["id"].as_i64().unwrap())
        .collect()
}

// ---------------------------------------------------------------------------
// Upload
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn test_upload_stores_and_serves_file(pool: PgPool) {
    let media = tempfile::tempdir().unwrap();
    let app = build_test_app(pool, media.path());

    let image = upload(app.clone(), 5, "cover.PNG").await;
    assert_eq!(image["is_primary"], true);
    assert_eq!(image["sort_order"], 0);
    assert_eq!(image["category"], "uncategorized");

    let url = image["rendition_urls"]["original"].as_str().unwrap().to_string();
    assert!(url.starts_with("/media/5/") && url.ends_with(".png"), "{url}");

    let file_name = image["file_name"].as_str().unwrap();
    assert!(media.path().join("5").join(file_name).exists());

    let response = get(app, &url).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_upload_appends_non_primary(pool: PgPool) {
    let media = tempfile::tempdir().unwrap();
    let app = build_test_app(pool, media.path());

    upload(app.clone(), 5, "a.jpg").await;
    let second = upload(app.clone(), 5, "b.webp").await;
    assert_eq!(second["is_primary"], false);
    assert_eq!(second["sort_order"], 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_upload_with_category(pool: PgPool) {
    let media = tempfile::tempdir().unwrap();
    let app = build_test_app(pool, media.path());

    let response = post_multipart(
        app,
        "/api/v1/artworks/5/images",
        "a.gif",
        PNG_BYTES,
        &[("category", "Prints")],
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["data"]["category"], "prints");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_upload_rejects_unsupported_extension(pool: PgPool) {
    let media = tempfile::tempdir().unwrap();
    let app = build_test_app(pool, media.path());

    let response = post_multipart(app.clone(), "/api/v1/artworks/5/images", "notes.txt", b"hi", &[]).await;
    assert_eq!(error_code(response, StatusCode::BAD_REQUEST).await, "BAD_REQUEST");
    assert!(gallery(app, 5).await.is_empty());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_upload_rejects_unknown_category(pool: PgPool) {
    let media = tempfile::tempdir().unwrap();
    let app = build_test_app(pool, media.path());

    let response = post_multipart(
        app,
        "/api/v1/artworks/5/images",
        "a.png",
        PNG_BYTES,
        &[("category", "sculpture")],
    )
    .await;
    assert_eq!(error_code(response, StatusCode::NOT_FOUND).await, "NOT_FOUND");
}

// ---------------------------------------------------------------------------
// Delete / primary
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn test_delete_primary_promotes_next(pool: PgPool) {
    let media = tempfile::tempdir().unwrap();
    let app = build_test_app(pool, media.path());

    let p = upload(app.clone(), 5, "p.png").await;
    let b = upload(app.clone(), 5, "b.png").await;
    let c = upload(app.clone(), 5, "c.png").await;

    let response = delete(app.clone(), &format!("/api/v1/artworks/5/images/{}", p["id"])).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let images = gallery(app, 5).await;
    assert_eq!(ids(&images), vec![b["id"].as_i64().unwrap(), c["id"].as_i64().unwrap()]);
    assert_eq!(primaries(&images), vec![b["id"].as_i64().unwrap()]);
    assert_eq!(images[0]["sort_order"], 0);
    assert_eq!(images[1]["sort_order"], 1);

    let file_name = p["file_name"].as_str().unwrap();
    assert!(!media.path().join("5").join(file_name).exists());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_delete_unknown_is_404(pool: PgPool) {
    let media = tempfile::tempdir().unwrap();
    let app = build_test_app(pool, media.path());

    let response = delete(app, "/api/v1/artworks/5/images/424242").await;
    assert_eq!(error_code(response, StatusCode::NOT_FOUND).await, "NOT_FOUND");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_set_primary_leaves_exactly_one(pool: PgPool) {
    let media = tempfile::tempdir().unwrap();
    let app = build_test_app(pool, media.path());

    upload(app.clone(), 5, "a.png").await;
    let b = upload(app.clone(), 5, "b.png").await;
    let b_id = b["id"].as_i64().unwrap();

    let response = put(app.clone(), &format!("/api/v1/artworks/5/images/{b_id}/primary")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["is_primary"], true);

    assert_eq!(primaries(&gallery(app, 5).await), vec![b_id]);
}

// ---------------------------------------------------------------------------
// Reorder
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn test_reorder_persists_full_sequence(pool: PgPool) {
    let media = tempfile::tempdir().unwrap();
    let app = build_test_app(pool, media.path());

    let a = upload(app.clone(), 5, "a.png").await["id"].as_i64().unwrap();
    let b = upload(app.clone(), 5, "b.png").await["id"].as_i64().unwrap();
    let c = upload(app.clone(), 5, "c.png").await["id"].as_i64().unwrap();

    let response = put_json(
        app.clone(),
        "/api/v1/artworks/5/images/order",
        json!({ "image_ids": [c, a, b] }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let images = gallery(app, 5).await;
    assert_eq!(ids(&images), vec![c, a, b]);
    assert_eq!(primaries(&images), vec![a]);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_reorder_missing_member_is_rejected(pool: PgPool) {
    let media = tempfile::tempdir().unwrap();
    let app = build_test_app(pool, media.path());

    let a = upload(app.clone(), 5, "a.png").await["id"].as_i64().unwrap();
    let b = upload(app.clone(), 5, "b.png").await["id"].as_i64().unwrap();
    upload(app.clone(), 5, "c.png").await;

    let response = put_json(
        app.clone(),
        "/api/v1/artworks/5/images/order",
        json!({ "image_ids": [b, a] }),
    )
    .await;
    assert_eq!(
        error_code(response, StatusCode::BAD_REQUEST).await,
        "VALIDATION_ERROR"
    );
    assert_eq!(gallery(app, 5).await.len(), 3);
}

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn test_assign_category(pool: PgPool) {
    let media = tempfile::tempdir().unwrap();
    let app = build_test_app(pool, media.path());

    let id = upload(app.clone(), 5, "a.png").await["id"].as_i64().unwrap();

    let response = put_json(
        app.clone(),
        &format!("/api/v1/artworks/5/images/{id}/category"),
        json!({ "category": "PAINTINGS" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["category"], "paintings");

    let response = put_json(
        app,
        &format!("/api/v1/artworks/5/images/{id}/category"),
        json!({ "category": "ghost" }),
    )
    .await;
    assert_eq!(error_code(response, StatusCode::NOT_FOUND).await, "NOT_FOUND");
}
