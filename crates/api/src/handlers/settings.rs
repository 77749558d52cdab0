//! Handlers for page settings and the repeating groups derived from them.
//!
//! Settings are nested under pages and sections:
//! `/pages/{page}/sections/{section}/settings`. Value edits go through the
//! atomic batch endpoint; group add/remove are their own round trips.

use atelier_core::error::CoreError;
use atelier_core::groups::{self, GroupKind, ParsedSection};
use atelier_db::models::setting::{
    into_settings, BatchUpdateRequest, CreateSectionSetting, SiteSetting,
};
use atelier_db::repositories::SettingRepo;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/pages/{page}/sections
pub async fn list_sections(
    State(state): State<AppState>,
    Path(page): Path<String>,
) -> AppResult<Json<DataResponse<Vec<String>>>> {
    let sections = SettingRepo::list_sections(&state.pool, &page).await?;
    Ok(Json(DataResponse { data: sections }))
}

/// GET /api/v1/pages/{page}/sections/{section}/settings
///
/// Flat settings in creation order. An unknown section is empty, not 404.
pub async fn list_settings(
    State(state): State<AppState>,
    Path((page, section)): Path<(String, String)>,
) -> AppResult<Json<DataResponse<Vec<SiteSetting>>>> {
    let settings = SettingRepo::list_section(&state.pool, &page, &section).await?;
    Ok(Json(DataResponse { data: settings }))
}

/// POST /api/v1/pages/{page}/sections/{section}/settings
pub async fn create_setting(
    State(state): State<AppState>,
    Path((page, section)): Path<(String, String)>,
    Json(input): Json<CreateSectionSetting>,
) -> AppResult<(StatusCode, Json<DataResponse<SiteSetting>>)> {
    if input.key.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Setting key must not be empty".into(),
        )));
    }
    let setting = SettingRepo::create(&state.pool, &input.into_create(&page, &section)).await?;
    tracing::info!(
        setting_id = setting.id,
        page = %page,
        section = %section,
        key = %setting.key,
        "Setting created",
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: setting })))
}

/// GET /api/v1/pages/{page}/sections/{section}/groups
///
/// The section projected into repeating groups plus the residual settings.
pub async fn list_groups(
    State(state): State<AppState>,
    Path((page, section)): Path<(String, String)>,
) -> AppResult<Json<DataResponse<ParsedSection>>> {
    let rows = SettingRepo::list_section(&state.pool, &page, &section).await?;
    let settings = into_settings(rows)?;

    let duplicates = groups::duplicate_keys(&settings);
    if !duplicates.is_empty() {
        tracing::warn!(
            page = %page,
            section = %section,
            ?duplicates,
            "Section has duplicate group member keys; extras listed as other",
        );
    }

    Ok(Json(DataResponse {
        data: groups::parse_section(&settings),
    }))
}

/// POST /api/v1/pages/{page}/sections/{section}/groups/{kind}
///
/// Allocate the next index for `kind` and create its default fields.
pub async fn add_group(
    State(state): State<AppState>,
    Path((page, section, kind)): Path<(String, String, String)>,
) -> AppResult<(StatusCode, Json<DataResponse<Vec<SiteSetting>>>)> {
    let kind = GroupKind::parse(&kind)?;
    let created = SettingRepo::add_group(&state.pool, &page, &section, kind).await?;
    tracing::info!(
        page = %page,
        section = %section,
        kind = %kind,
        keys = ?created.iter().map(|s| s.key.as_str()).collect::<Vec<_>>(),
        "Group added",
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: created })))
}

/// DELETE /api/v1/pages/{page}/sections/{section}/groups/{kind}/{index}
///
/// Idempotent: removing an absent group still returns 204.
pub async fn remove_group(
    State(state): State<AppState>,
    Path((page, section, kind, index)): Path<(String, String, String, u32)>,
) -> AppResult<StatusCode> {
    let kind = GroupKind::parse(&kind)?;
    let removed = SettingRepo::remove_group(&state.pool, &page, &section, kind, index).await?;
    tracing::info!(
        page = %page,
        section = %section,
        kind = %kind,
        index,
        removed,
        "Group removed",
    );
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/settings/batch
///
/// Apply every `{id, value}` pair or none. A rejected batch answers 422
/// with one entry per failing id.
pub async fn batch_update(
    State(state): State<AppState>,
    Json(input): Json<BatchUpdateRequest>,
) -> AppResult<Json<DataResponse<Vec<SiteSetting>>>> {
    match SettingRepo::batch_update(&state.pool, &input.updates).await {
        Ok(saved) => {
            tracing::info!(count = saved.len(), "Settings batch saved");
            Ok(Json(DataResponse { data: saved }))
        }
        Err(e) => {
            tracing::warn!(count = input.updates.len(), error = %e, "Settings batch rejected");
            Err(e.into())
        }
    }
}
