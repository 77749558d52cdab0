//! Flat page settings: the `(page, section, key) -> value` records every
//! editable piece of page content is stored as.
//!
//! Values are always strings regardless of their declared type. Typed
//! access goes through [`Setting::as_bool`] / [`Setting::as_number`], and
//! writes go through [`normalize_value`] so booleans are stored uniformly.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Setting type
// ---------------------------------------------------------------------------

/// The declared type of a setting value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingType {
    Text,
    RichText,
    PlainText,
    Boolean,
    Number,
}

/// All valid setting type names, in database form.
pub const VALID_SETTING_TYPES: &[&str] = &["text", "richtext", "plaintext", "boolean", "number"];

impl SettingType {
    /// Parse from the database `setting_type` column.
    pub fn parse(name: &str) -> Result<Self, CoreError> {
        match name {
            "text" => Ok(Self::Text),
            "richtext" => Ok(Self::RichText),
            "plaintext" => Ok(Self::PlainText),
            "boolean" => Ok(Self::Boolean),
            "number" => Ok(Self::Number),
            other => Err(CoreError::Validation(format!(
                "Invalid setting type '{other}'. Must be one of: {}",
                VALID_SETTING_TYPES.join(", ")
            ))),
        }
    }

    /// String representation for display, logging, and database storage.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::RichText => "richtext",
            Self::PlainText => "plaintext",
            Self::Boolean => "boolean",
            Self::Number => "number",
        }
    }
}

impl std::fmt::Display for SettingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Setting
// ---------------------------------------------------------------------------

/// One stored setting. `(page_key, section_key, key)` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Setting {
    pub id: DbId,
    pub page_key: String,
    pub section_key: String,
    pub key: String,
    pub setting_type: SettingType,
    pub value: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Setting {
    /// Interpret the value as a boolean. Accepts `1/0/true/false`.
    ///
    /// Returns `None` when the stored value is not a recognised boolean.
    pub fn as_bool(&self) -> Option<bool> {
        parse_bool(&self.value)
    }

    /// Interpret the value as a number.
    pub fn as_number(&self) -> Option<f64> {
        self.value.trim().parse().ok()
    }
}

/// A single `{id, value}` pair in a batched settings save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingUpdate {
    pub id: DbId,
    pub value: String,
}

// ---------------------------------------------------------------------------
// Value normalization
// ---------------------------------------------------------------------------

/// Parse a boolean as stored on the wire (`"1"`, `"0"`, `"true"`, `"false"`).
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}

/// Normalize a value before it is written.
///
/// Booleans are canonicalised to `"1"` / `"0"`; an unrecognised boolean is
/// rejected. All other types are stored verbatim.
pub fn normalize_value(setting_type: SettingType, value: &str) -> Result<String, CoreError> {
    match setting_type {
        SettingType::Boolean => match parse_bool(value) {
            Some(true) => Ok("1".to_string()),
            Some(false) => Ok("0".to_string()),
            None => Err(CoreError::Validation(format!(
                "'{value}' is not a boolean. Use 1/0 or true/false"
            ))),
        },
        _ => Ok(value.to_string()),
    }
}
