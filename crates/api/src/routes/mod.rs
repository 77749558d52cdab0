pub mod artwork_images;
pub mod categories;
pub mod health;
pub mod settings;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /pages/{page}/sections                                   list section keys
/// /pages/{page}/sections/{section}/settings                list, create
/// /pages/{page}/sections/{section}/groups                  grouped projection
/// /pages/{page}/sections/{section}/groups/{kind}           add group (POST)
/// /pages/{page}/sections/{section}/groups/{kind}/{index}   remove group (DELETE)
/// /settings/batch                                          atomic value save (PUT)
///
/// /artworks/{artwork_id}/images                            list, upload (multipart)
/// /artworks/{artwork_id}/images/order                      reorder (PUT)
/// /artworks/{artwork_id}/images/{id}                       delete
/// /artworks/{artwork_id}/images/{id}/primary               set primary (PUT)
/// /artworks/{artwork_id}/images/{id}/category              assign category (PUT)
///
/// /categories                                              list, create
/// /categories/{name}                                       rename (PUT), delete
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/pages", settings::pages_router())
        .nest("/settings", settings::settings_router())
        .nest("/artworks", artwork_images::router())
        .nest("/categories", categories::router())
}
