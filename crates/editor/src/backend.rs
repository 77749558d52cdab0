//! Collaborator contracts the editors persist through.
//!
//! Implementations must be `Send + Sync` so an editor can be shared across
//! tasks; [`crate::http::HttpBackend`] is the production implementation.

use std::future::Future;

use atelier_core::assets::AssetRecord;
use atelier_core::groups::GroupKind;
use atelier_core::settings::{Setting, SettingUpdate};
use atelier_core::types::DbId;

use crate::error::EditorResult;

/// A file picked for upload.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// Category to tag the image with; `uncategorized` when absent.
    pub category: Option<String>,
}

/// Flat settings storage for page sections.
pub trait SettingsBackend: Send + Sync {
    fn list(
        &self,
        page_key: &str,
        section_key: &str,
    ) -> impl Future<Output = EditorResult<Vec<Setting>>> + Send;

    /// Save every update or none. Returns the stored settings.
    fn batch_update(
        &self,
        updates: &[SettingUpdate],
    ) -> impl Future<Output = EditorResult<Vec<Setting>>> + Send;

    /// Create the next group of `kind`. Returns its new settings.
    fn add_group_member(
        &self,
        page_key: &str,
        section_key: &str,
        kind: GroupKind,
    ) -> impl Future<Output = EditorResult<Vec<Setting>>> + Send;

    /// Delete group `(kind, index)`. Absent groups are not an error.
    fn remove_group_member(
        &self,
        page_key: &str,
        section_key: &str,
        kind: GroupKind,
        index: u32,
    ) -> impl Future<Output = EditorResult<()>> + Send;
}

/// Image storage for one artwork gallery per `artwork_id`.
pub trait AssetStore: Send + Sync {
    fn list(&self, artwork_id: DbId) -> impl Future<Output = EditorResult<Vec<AssetRecord>>> + Send;

    fn upload(
        &self,
        artwork_id: DbId,
        file: &UploadFile,
    ) -> impl Future<Output = EditorResult<AssetRecord>> + Send;

    fn delete(&self, artwork_id: DbId, id: DbId) -> impl Future<Output = EditorResult<()>> + Send;

    fn set_primary(
        &self,
        artwork_id: DbId,
        id: DbId,
    ) -> impl Future<Output = EditorResult<()>> + Send;

    /// Persist the complete order. Non-permutations are rejected.
    fn reorder(
        &self,
        artwork_id: DbId,
        ordered_ids: &[DbId],
    ) -> impl Future<Output = EditorResult<()>> + Send;

    fn assign_category(
        &self,
        artwork_id: DbId,
        id: DbId,
        category: &str,
    ) -> impl Future<Output = EditorResult<AssetRecord>> + Send;
}

/// The category registry. Every call answers with the full sorted names.
pub trait TaxonomyBackend: Send + Sync {
    fn list(&self) -> impl Future<Output = EditorResult<Vec<String>>> + Send;

    fn create(&self, name: &str) -> impl Future<Output = EditorResult<Vec<String>>> + Send;

    fn rename(
        &self,
        old_name: &str,
        new_name: &str,
    ) -> impl Future<Output = EditorResult<Vec<String>>> + Send;

    fn delete(&self, name: &str) -> impl Future<Output = EditorResult<Vec<String>>> + Send;
}
