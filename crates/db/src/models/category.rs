//! Category model.

use atelier_core::types::Timestamp;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `categories` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Category {
    pub name: String,
    pub created_at: Timestamp,
}

/// Request body for creating a category.
#[derive(Debug, Deserialize)]
pub struct CreateCategory {
    pub name: String,
}

/// Request body for renaming a category.
#[derive(Debug, Deserialize)]
pub struct RenameCategory {
    pub new_name: String,
}

/// Outcome of a registry mutation: the full sorted name list after the
/// change, and how many images were moved to another category by it.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryChange {
    pub names: Vec<String>,
    pub reassigned_images: u64,
}
