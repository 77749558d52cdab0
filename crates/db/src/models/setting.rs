//! Site setting model.

use atelier_core::error::CoreError;
use atelier_core::settings::{Setting, SettingType, SettingUpdate};
use atelier_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `site_settings` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SiteSetting {
    pub id: DbId,
    pub page_key: String,
    pub section_key: String,
    pub key: String,
    pub setting_type: String,
    pub value: String,
    pub description: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl SiteSetting {
    /// Convert to the domain type. The `setting_type` column is constrained
    /// by a CHECK, so an unknown value means the schema and code disagree.
    pub fn into_setting(self) -> Result<Setting, CoreError> {
        Ok(Setting {
            id: self.id,
            page_key: self.page_key,
            section_key: self.section_key,
            key: self.key,
            setting_type: SettingType::parse(&self.setting_type)?,
            value: self.value,
            description: self.description,
        })
    }
}

/// Convert a list of rows, failing on the first bad type.
pub fn into_settings(rows: Vec<SiteSetting>) -> Result<Vec<Setting>, CoreError> {
    rows.into_iter().map(SiteSetting::into_setting).collect()
}

/// DTO for inserting a setting.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSiteSetting {
    pub page_key: String,
    pub section_key: String,
    pub key: String,
    pub setting_type: SettingType,
    pub value: String,
    pub description: Option<String>,
}

/// Request body for creating a setting inside a section; the page and
/// section come from the path.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSectionSetting {
    pub key: String,
    pub setting_type: SettingType,
    #[serde(default)]
    pub value: String,
    pub description: Option<String>,
}

impl CreateSectionSetting {
    pub fn into_create(self, page_key: &str, section_key: &str) -> CreateSiteSetting {
        CreateSiteSetting {
            page_key: page_key.to_string(),
            section_key: section_key.to_string(),
            key: self.key,
            setting_type: self.setting_type,
            value: self.value,
            description: self.description,
        }
    }
}

/// Request body for `PUT /settings/batch`.
#[derive(Debug, Deserialize)]
pub struct BatchUpdateRequest {
    pub updates: Vec<SettingUpdate>,
}

/// One rejected entry of a batch update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchItemError {
    pub id: DbId,
    pub error: String,
}
