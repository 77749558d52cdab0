//! Ordered artwork image collections.
//!
//! [`AssetCollection`] owns the image sequence and the primary designation
//! together. Order is the position in the sequence (so it is always dense
//! and duplicate-free) and the primary is a single position that every
//! mutating method updates in the same step. A non-empty collection without
//! exactly one primary cannot be constructed.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One image as exchanged with the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub id: DbId,
    pub sort_order: i32,
    pub is_primary: bool,
    pub category: String,
    /// Rendition name (e.g. `original`) to URL.
    #[serde(default)]
    pub rendition_urls: BTreeMap<String, String>,
}

/// An image inside a collection. Position and primary status are owned by
/// the collection, not the image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub id: DbId,
    pub category: String,
    pub rendition_urls: BTreeMap<String, String>,
}

impl From<AssetRecord> for Asset {
    fn from(r: AssetRecord) -> Self {
        Self {
            id: r.id,
            category: r.category,
            rendition_urls: r.rendition_urls,
        }
    }
}

// ---------------------------------------------------------------------------
// Permutation check
// ---------------------------------------------------------------------------

/// Verify `proposed` is a permutation of `existing`.
///
/// Missing, extra, and repeated ids are all rejected; a reorder must never
/// drop or invent images.
pub fn validate_permutation(existing: &[DbId], proposed: &[DbId]) -> Result<(), CoreError> {
    let existing_set: HashSet<DbId> = existing.iter().copied().collect();
    let mut seen = HashSet::with_capacity(proposed.len());

    for id in proposed {
        if !existing_set.contains(id) {
            return Err(CoreError::Validation(format!(
                "Image {id} is not part of this collection"
            )));
        }
        if !seen.insert(*id) {
            return Err(CoreError::Validation(format!(
                "Image {id} appears more than once in the new order"
            )));
        }
    }

    if seen.len() != existing_set.len() {
        let missing: Vec<String> = existing
            .iter()
            .filter(|id| !seen.contains(id))
            .map(ToString::to_string)
            .collect();
        return Err(CoreError::Validation(format!(
            "New order is missing images: {}",
            missing.join(", ")
        )));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Collection
// ---------------------------------------------------------------------------

/// An ordered image collection with exactly one primary when non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetCollection {
    items: Vec<Asset>,
    /// `None` iff `items` is empty.
    primary: Option<usize>,
}

impl AssetCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a collection from server records.
    ///
    /// Records are ordered by `sort_order`. The records must have distinct
    /// orders and exactly one primary (when non-empty); anything else is
    /// refused rather than repaired.
    pub fn from_records(mut records: Vec<AssetRecord>) -> Result<Self, CoreError> {
        records.sort_by_key(|r| r.sort_order);

        let mut orders = HashSet::with_capacity(records.len());
        let mut ids = HashSet::with_capacity(records.len());
        for r in &records {
            if !orders.insert(r.sort_order) {
                return Err(CoreError::InvariantViolation(format!(
                    "Duplicate sort_order {} in image collection",
                    r.sort_order
                )));
            }
            if !ids.insert(r.id) {
                return Err(CoreError::InvariantViolation(format!(
                    "Image {} appears twice in collection",
                    r.id
                )));
            }
        }

        let primaries: Vec<usize> = records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_primary)
            .map(|(i, _)| i)
            .collect();

        let primary = match (records.is_empty(), primaries.as_slice()) {
            (true, []) => None,
            (false, [only]) => Some(*only),
            (_, found) => {
                return Err(CoreError::InvariantViolation(format!(
                    "Collection of {} images has {} primaries",
                    records.len(),
                    found.len()
                )))
            }
        };

        Ok(Self {
            items: records.into_iter().map(Asset::from).collect(),
            primary,
        })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Asset> {
        self.items.iter()
    }

    pub fn ids(&self) -> Vec<DbId> {
        self.items.iter().map(|a| a.id).collect()
    }

    pub fn get(&self, id: DbId) -> Option<&Asset> {
        self.items.iter().find(|a| a.id == id)
    }

    pub fn position(&self, id: DbId) -> Option<usize> {
        self.items.iter().position(|a| a.id == id)
    }

    pub fn primary(&self) -> Option<&Asset> {
        self.primary.map(|i| &self.items[i])
    }

    pub fn primary_id(&self) -> Option<DbId> {
        self.primary().map(|a| a.id)
    }

    pub fn is_primary(&self, id: DbId) -> bool {
        self.primary_id() == Some(id)
    }

    /// Records reflecting current order and primary designation.
    pub fn records(&self) -> Vec<AssetRecord> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, a)| AssetRecord {
                id: a.id,
                sort_order: i as i32,
                is_primary: self.primary == Some(i),
                category: a.category.clone(),
                rendition_urls: a.rendition_urls.clone(),
            })
            .collect()
    }

    fn require(&self, id: DbId) -> Result<usize, CoreError> {
        self.position(id).ok_or(CoreError::NotFound {
            entity: "Image",
            id,
        })
    }

    /// Append an image at the end. The first image of an empty collection
    /// becomes primary.
    pub fn push(&mut self, asset: Asset) -> Result<(), CoreError> {
        if self.position(asset.id).is_some() {
            return Err(CoreError::Conflict(format!(
                "Image {} is already in the collection",
                asset.id
            )));
        }
        self.items.push(asset);
        if self.primary.is_none() {
            self.primary = Some(0);
        }
        Ok(())
    }

    /// Remove an image. If it was primary and images remain, the new first
    /// image is promoted.
    pub fn remove(&mut self, id: DbId) -> Result<Asset, CoreError> {
        let idx = self.require(id)?;
        let removed = self.items.remove(idx);
        self.primary = match self.primary {
            _ if self.items.is_empty() => None,
            Some(p) if p == idx => Some(0),
            Some(p) if p > idx => Some(p - 1),
            other => other,
        };
        Ok(removed)
    }

    /// Make `id` the single primary image.
    pub fn set_primary(&mut self, id: DbId) -> Result<(), CoreError> {
        let idx = self.require(id)?;
        self.primary = Some(idx);
        Ok(())
    }

    /// Reorder to exactly `ids`. The primary designation follows its image.
    pub fn reorder(&mut self, ids: &[DbId]) -> Result<(), CoreError> {
        validate_permutation(&self.ids(), ids)?;
        let primary_id = self.primary_id();

        let mut by_id: BTreeMap<DbId, Asset> =
            self.items.drain(..).map(|a| (a.id, a)).collect();
        self.items = ids.iter().filter_map(|id| by_id.remove(id)).collect();
        self.primary = primary_id.and_then(|pid| self.position(pid));
        Ok(())
    }

    /// Move `id` to the position currently held by `over`.
    ///
    /// This is the drag-over step of a reorder gesture.
    pub fn move_to(&mut self, id: DbId, over: DbId) -> Result<(), CoreError> {
        let from = self.require(id)?;
        let to = self.require(over)?;
        if from == to {
            return Ok(());
        }
        let primary_id = self.primary_id();
        let item = self.items.remove(from);
        self.items.insert(to, item);
        self.primary = primary_id.and_then(|pid| self.position(pid));
        Ok(())
    }

    /// Change an image's category label.
    pub fn set_category(&mut self, id: DbId, category: &str) -> Result<(), CoreError> {
        let idx = self.require(id)?;
        self.items[idx].category = category.to_string();
        Ok(())
    }
}
