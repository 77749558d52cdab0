//! Handlers for the image category registry.
//!
//! Every mutation answers with the full sorted name list so clients can
//! replace their copy of the registry wholesale.

use atelier_db::models::category::{CreateCategory, RenameCategory};
use atelier_db::repositories::CategoryRepo;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/categories
pub async fn list(State(state): State<AppState>) -> AppResult<Json<DataResponse<Vec<String>>>> {
    let names = CategoryRepo::list_names(&state.pool).await?;
    Ok(Json(DataResponse { data: names }))
}

/// POST /api/v1/categories
///
/// Case-insensitive duplicates answer 409.
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateCategory>,
) -> AppResult<(StatusCode, Json<DataResponse<Vec<String>>>)> {
    let change = CategoryRepo::create(&state.pool, &input.name).await?;
    tracing::info!(name = %input.name.trim().to_lowercase(), "Category created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: change.names })))
}

/// PUT /api/v1/categories/{name}
///
/// Rename, moving every image tagged with the old name in the same
/// transaction.
pub async fn rename(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(input): Json<RenameCategory>,
) -> AppResult<Json<DataResponse<Vec<String>>>> {
    let change = CategoryRepo::rename(&state.pool, &name, &input.new_name).await?;
    tracing::info!(
        from = %name,
        to = %input.new_name,
        reassigned_images = change.reassigned_images,
        "Category renamed",
    );
    Ok(Json(DataResponse { data: change.names }))
}

/// DELETE /api/v1/categories/{name}
///
/// Images in the category fall back to `uncategorized`, which itself cannot
/// be deleted.
pub async fn delete(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<Json<DataResponse<Vec<String>>>> {
    let change = CategoryRepo::delete(&state.pool, &name).await?;
    tracing::info!(
        name = %name,
        reassigned_images = change.reassigned_images,
        "Category deleted",
    );
    Ok(Json(DataResponse { data: change.names }))
}
