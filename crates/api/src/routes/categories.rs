//! Route definitions for the category registry.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::categories;
use crate::state::AppState;

/// Routes mounted at `/categories`.
///
/// ```text
/// GET    /         -> list
/// POST   /         -> create
/// PUT    /{name}   -> rename
/// DELETE /{name}   -> delete
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::list).post(categories::create))
        .route("/{name}", put(categories::rename).delete(categories::delete))
}
