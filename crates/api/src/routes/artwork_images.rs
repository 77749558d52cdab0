//! Route definitions for artwork image galleries.

use axum::routing::{delete, get, put};
use axum::Router;

use crate::handlers::artwork_images;
use crate::state::AppState;

/// Routes mounted at `/artworks`.
///
/// ```text
/// GET    /{artwork_id}/images                 -> list
/// POST   /{artwork_id}/images                 -> upload
/// PUT    /{artwork_id}/images/order           -> reorder
/// DELETE /{artwork_id}/images/{id}            -> delete
/// PUT    /{artwork_id}/images/{id}/primary    -> set_primary
/// PUT    /{artwork_id}/images/{id}/category   -> assign_category
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/{artwork_id}/images",
            get(artwork_images::list).post(artwork_images::upload),
        )
        .route("/{artwork_id}/images/order", put(artwork_images::reorder))
        .route("/{artwork_id}/images/{id}", delete(artwork_images::delete))
        .route(
            "/{artwork_id}/images/{id}/primary",
            put(artwork_images::set_primary),
        )
        .route(
            "/{artwork_id}/images/{id}/category",
            put(artwork_images::assign_category),
        )
}
