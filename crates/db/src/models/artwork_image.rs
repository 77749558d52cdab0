//! Artwork gallery image model.

use std::collections::BTreeMap;

use atelier_core::assets::AssetRecord;
use atelier_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

/// A row from the `artwork_images` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ArtworkImage {
    pub id: DbId,
    pub artwork_id: DbId,
    pub sort_order: i32,
    pub is_primary: bool,
    pub category: String,
    pub file_name: String,
    pub rendition_urls: Json<BTreeMap<String, String>>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ArtworkImage {
    pub fn to_record(&self) -> AssetRecord {
        AssetRecord {
            id: self.id,
            sort_order: self.sort_order,
            is_primary: self.is_primary,
            category: self.category.clone(),
            rendition_urls: self.rendition_urls.0.clone(),
        }
    }
}

/// DTO for registering an uploaded image.
#[derive(Debug, Clone)]
pub struct CreateArtworkImage {
    pub artwork_id: DbId,
    pub category: String,
    pub file_name: String,
    pub rendition_urls: BTreeMap<String, String>,
}

/// Request body for `PUT /artworks/{id}/images/order`.
#[derive(Debug, Deserialize)]
pub struct ReorderImagesRequest {
    pub image_ids: Vec<DbId>,
}

/// Request body for `PUT /artworks/{id}/images/{image_id}/category`.
#[derive(Debug, Deserialize)]
pub struct AssignCategoryRequest {
    pub category: String,
}
