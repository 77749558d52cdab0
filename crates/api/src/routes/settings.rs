//! Route definitions for page settings and groups.

use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::handlers::settings;
use crate::state::AppState;

/// Page-scoped routes mounted at `/pages`.
///
/// ```text
/// GET    /{page}/sections                                  -> list_sections
/// GET    /{page}/sections/{section}/settings               -> list_settings
/// POST   /{page}/sections/{section}/settings               -> create_setting
/// GET    /{page}/sections/{section}/groups                 -> list_groups
/// POST   /{page}/sections/{section}/groups/{kind}          -> add_group
/// DELETE /{page}/sections/{section}/groups/{kind}/{index}  -> remove_group
/// ```
pub fn pages_router() -> Router<AppState> {
    Router::new()
        .route("/{page}/sections", get(settings::list_sections))
        .route(
            "/{page}/sections/{section}/settings",
            get(settings::list_settings).post(settings::create_setting),
        )
        .route("/{page}/sections/{section}/groups", get(settings::list_groups))
        .route(
            "/{page}/sections/{section}/groups/{kind}",
            post(settings::add_group),
        )
        .route(
            "/{page}/sections/{section}/groups/{kind}/{index}",
            delete(settings::remove_group),
        )
}

/// Cross-section routes mounted at `/settings`.
///
/// ```text
/// PUT /batch -> batch_update
/// ```
pub fn settings_router() -> Router<AppState> {
    Router::new().route("/batch", put(settings::batch_update))
}
