//! HTTP-level integration tests for the category registry endpoints.

mod common;

use axum::http::StatusCode;
use common::{body_json, build_test_app, delete, error_code, get, post_multipart, post_json, put_json};
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "../db/migrations")]
async fn test_list_is_sorted(pool: PgPool) {
    let media = tempfile::tempdir().unwrap();
    let app = build_test_app(pool, media.path());

    let json = body_json(get(app, "/api/v1/categories").await).await;
    assert_eq!(json["data"], json!(["paintings", "prints", "uncategorized"]));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_create_returns_full_list(pool: PgPool) {
    let media = tempfile::tempdir().unwrap();
    let app = build_test_app(pool, media.path());

    let response = post_json(app, "/api/v1/categories", json!({ "name": "Blog" })).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(
        json["data"],
        json!(["blog", "paintings", "prints", "uncategorized"])
    );
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_duplicate_create_is_conflict(pool: PgPool) {
    let media = tempfile::tempdir().unwrap();
    let app = build_test_app(pool, media.path());

    let response = post_json(app, "/api/v1/categories", json!({ "name": "Prints" })).await;
    assert_eq!(error_code(response, StatusCode::CONFLICT).await, "CONFLICT");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_rename_cascades_to_images(pool: PgPool) {
    let media = tempfile::tempdir().unwrap();
    let app = build_test_app(pool, media.path());

    post_json(app.clone(), "/api/v1/categories", json!({ "name": "blog" })).await;
    let response = post_multipart(
        app.clone(),
        "/api/v1/artworks/3/images",
        "a.png",
        b"data",
        &[("category", "blog")],
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = put_json(
        app.clone(),
        "/api/v1/categories/blog",
        json!({ "new_name": "news" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let names = body_json(response).await["data"].clone();
    assert_eq!(names, json!(["news", "paintings", "prints", "uncategorized"]));

    let images = body_json(get(app, "/api/v1/artworks/3/images").await).await;
    assert_eq!(images["data"][0]["category"], "news");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_delete_reassigns_to_uncategorized(pool: PgPool) {
    let media = tempfile::tempdir().unwrap();
    let app = build_test_app(pool, media.path());

    post_json(app.clone(), "/api/v1/categories", json!({ "name": "events" })).await;
    post_multipart(
        app.clone(),
        "/api/v1/artworks/3/images",
        "a.png",
        b"data",
        &[("category", "events")],
    )
    .await;

    let response = delete(app.clone(), "/api/v1/categories/events").await;
    assert_eq!(response.status(), StatusCode::OK);

    let images = body_json(get(app, "/api/v1/artworks/3/images").await).await;
    assert_eq!(images["data"][0]["category"], "uncategorized");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_uncategorized_cannot_be_deleted(pool: PgPool) {
    let media = tempfile::tempdir().unwrap();
    let app = build_test_app(pool, media.path());

    let response = delete(app.clone(), "/api/v1/categories/uncategorized").await;
    assert_eq!(
        error_code(response, StatusCode::BAD_REQUEST).await,
        "VALIDATION_ERROR"
    );

    let json = body_json(get(app, "/api/v1/categories").await).await;
    assert!(json["data"]
        .as_array()
        .unwrap()
        .iter()
        .any(|n| n == "uncategorized"));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_unknown_rename_is_404(pool: PgPool) {
    let media = tempfile::tempdir().unwrap();
    let app = build_test_app(pool, media.path());

    let response = put_json(
        app,
        "/api/v1/categories/ghost",
        json!({ "new_name": "spirit" }),
    )
    .await;
    assert_eq!(error_code(response, StatusCode::NOT_FOUND).await, "NOT_FOUND");
}
