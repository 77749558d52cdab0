//! Handlers for artwork image galleries.
//!
//! Images are nested under artworks: `/artworks/{artwork_id}/images[/{id}]`.
//! Each gallery keeps a dense order and exactly one primary image while it
//! is non-empty; the repository enforces both inside its transactions.

use std::collections::BTreeMap;
use std::path::Path as FsPath;

use atelier_core::error::CoreError;
use atelier_core::taxonomy::{self, UNCATEGORIZED};
use atelier_core::types::DbId;
use atelier_db::models::artwork_image::{
    ArtworkImage, AssignCategoryRequest, CreateArtworkImage, ReorderImagesRequest,
};
use atelier_db::repositories::{ArtworkImageRepo, CategoryRepo};
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Accepted upload extensions.
const SUPPORTED_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif"];

/// Rendition key for the stored upload.
const ORIGINAL_RENDITION: &str = "original";

fn image_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound { entity: "Image", id })
}

/// Lowercased extension of an uploaded file name, if it is an accepted one.
fn image_extension(file_name: &str) -> Option<String> {
    let ext = FsPath::new(file_name)
        .extension()?
        .to_str()?
        .to_lowercase();
    SUPPORTED_IMAGE_EXTENSIONS
        .contains(&ext.as_str())
        .then_some(ext)
}

/// Normalize a category name and require that it is registered.
async fn registered_category(state: &AppState, raw: &str) -> AppResult<String> {
    let name = taxonomy::normalize_name(raw)?;
    if !CategoryRepo::exists(&state.pool, &name).await? {
        return Err(AppError::Core(CoreError::NotFoundByName {
            entity: "Category",
            name,
        }));
    }
    Ok(name)
}

/// GET /api/v1/artworks/{artwork_id}/images
///
/// The gallery in display order.
pub async fn list(
    State(state): State<AppState>,
    Path(artwork_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<ArtworkImage>>>> {
    let images = ArtworkImageRepo::list_for_artwork(&state.pool, artwork_id).await?;
    Ok(Json(DataResponse { data: images }))
}

/// POST /api/v1/artworks/{artwork_id}/images
///
/// Multipart form with a required `file` field and an optional `category`.
/// The image is appended at the end; the first image of an empty gallery
/// becomes primary.
pub async fn upload(
    State(state): State<AppState>,
    Path(artwork_id): Path<DbId>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<ArtworkImage>>)> {
    let mut file_data: Option<(String, Vec<u8>)> = None;
    let mut category: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                file_data = Some((filename, data.to_vec()));
            }
            "category" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                if !text.trim().is_empty() {
                    category = Some(text);
                }
            }
            _ => {}
        }
    }

    let (filename, data) =
        file_data.ok_or_else(|| AppError::BadRequest("Missing required 'file' field".into()))?;
    if data.is_empty() {
        return Err(AppError::BadRequest("Uploaded file is empty".into()));
    }

    let ext = image_extension(&filename).ok_or_else(|| {
        AppError::BadRequest(format!(
            "Unsupported image file '{filename}'. Supported: .{}",
            SUPPORTED_IMAGE_EXTENSIONS.join(", .")
        ))
    })?;

    let category = match category {
        Some(raw) => registered_category(&state, &raw).await?,
        None => UNCATEGORIZED.to_string(),
    };

    let artwork_dir = state.config.media_root.join(artwork_id.to_string());
    tokio::fs::create_dir_all(&artwork_dir)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

    let stored_name = format!("{}.{ext}", uuid::Uuid::new_v4());
    let file_path = artwork_dir.join(&stored_name);
    tokio::fs::write(&file_path, &data)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

    let mut rendition_urls = BTreeMap::new();
    rendition_urls.insert(
        ORIGINAL_RENDITION.to_string(),
        state
            .config
            .media_url(&format!("{artwork_id}/{stored_name}")),
    );

    let input = CreateArtworkImage {
        artwork_id,
        category,
        file_name: stored_name,
        rendition_urls,
    };

    let image = match ArtworkImageRepo::create(&state.pool, &input).await {
        Ok(image) => image,
        Err(e) => {
            if let Err(io) = tokio::fs::remove_file(&file_path).await {
                tracing::warn!(path = %file_path.display(), error = %io, "Failed to remove orphaned upload");
            }
            return Err(e.into());
        }
    };

    tracing::info!(
        artwork_id,
        image_id = image.id,
        sort_order = image.sort_order,
        is_primary = image.is_primary,
        bytes = data.len(),
        "Image uploaded",
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: image })))
}

/// DELETE /api/v1/artworks/{artwork_id}/images/{id}
///
/// Remaining images are renumbered; deleting the primary promotes the new
/// first image.
pub async fn delete(
    State(state): State<AppState>,
    Path((artwork_id, id)): Path<(DbId, DbId)>,
) -> AppResult<StatusCode> {
    let deleted = ArtworkImageRepo::delete(&state.pool, artwork_id, id)
        .await?
        .ok_or_else(|| image_not_found(id))?;

    let file_path = state
        .config
        .media_root
        .join(artwork_id.to_string())
        .join(&deleted.file_name);
    if let Err(e) = tokio::fs::remove_file(&file_path).await {
        tracing::warn!(path = %file_path.display(), error = %e, "Failed to remove image file");
    }

    tracing::info!(artwork_id, image_id = id, was_primary = deleted.is_primary, "Image deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/artworks/{artwork_id}/images/{id}/primary
pub async fn set_primary(
    State(state): State<AppState>,
    Path((artwork_id, id)): Path<(DbId, DbId)>,
) -> AppResult<Json<DataResponse<ArtworkImage>>> {
    let image = ArtworkImageRepo::set_primary(&state.pool, artwork_id, id)
        .await?
        .ok_or_else(|| image_not_found(id))?;
    tracing::info!(artwork_id, image_id = id, "Primary image set");
    Ok(Json(DataResponse { data: image }))
}

/// PUT /api/v1/artworks/{artwork_id}/images/order
///
/// The body must list every image of the gallery exactly once.
pub async fn reorder(
    State(state): State<AppState>,
    Path(artwork_id): Path<DbId>,
    Json(input): Json<ReorderImagesRequest>,
) -> AppResult<Json<DataResponse<Vec<ArtworkImage>>>> {
    let images = ArtworkImageRepo::reorder(&state.pool, artwork_id, &input.image_ids).await?;
    tracing::info!(artwork_id, count = images.len(), "Gallery reordered");
    Ok(Json(DataResponse { data: images }))
}

/// PUT /api/v1/artworks/{artwork_id}/images/{id}/category
pub async fn assign_category(
    State(state): State<AppState>,
    Path((artwork_id, id)): Path<(DbId, DbId)>,
    Json(input): Json<AssignCategoryRequest>,
) -> AppResult<Json<DataResponse<ArtworkImage>>> {
    let category = registered_category(&state, &input.category).await?;
    let image = ArtworkImageRepo::set_category(&state.pool, artwork_id, id, &category)
        .await?
        .ok_or_else(|| image_not_found(id))?;
    tracing::info!(artwork_id, image_id = id, category = %image.category, "Image category assigned");
    Ok(Json(DataResponse { data: image }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepted_extensions_are_case_insensitive() {
        assert_eq!(image_extension("Sunset.JPG").as_deref(), Some("jpg"));
        assert_eq!(image_extension("a.b.webp").as_deref(), Some("webp"));
    }

    #[test]
    fn other_files_are_refused() {
        assert!(image_extension("notes.txt").is_none());
        assert!(image_extension("noextension").is_none());
        assert!(image_extension("").is_none());
    }
}
