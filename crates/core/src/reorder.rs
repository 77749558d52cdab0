//! Optimistic drag-to-reorder state for one image collection.
//!
//! [`GalleryOrder`] keeps two collections: `confirmed`, the last state the
//! server accepted, and `draft`, what is rendered. A drag gesture mutates
//! only the draft. On drop the draft's id sequence is handed out for
//! persisting; success collapses the draft into `confirmed`, failure keeps
//! the draft on screen and raises an error flag. Only one gesture or
//! persist may be active at a time.

use crate::assets::{Asset, AssetCollection};
use crate::error::CoreError;
use crate::types::DbId;

/// Where the reorder flow currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderPhase {
    Idle,
    Dragging { asset_id: DbId },
    Persisting,
}

/// Confirmed and draft views of one collection.
#[derive(Debug, Clone)]
pub struct GalleryOrder {
    confirmed: AssetCollection,
    draft: AssetCollection,
    phase: ReorderPhase,
    last_error: Option<String>,
}

impl GalleryOrder {
    pub fn new(collection: AssetCollection) -> Self {
        Self {
            draft: collection.clone(),
            confirmed: collection,
            phase: ReorderPhase::Idle,
            last_error: None,
        }
    }

    /// The collection to render.
    pub fn draft(&self) -> &AssetCollection {
        &self.draft
    }

    /// The last server-confirmed collection.
    pub fn confirmed(&self) -> &AssetCollection {
        &self.confirmed
    }

    pub fn phase(&self) -> ReorderPhase {
        self.phase
    }

    /// Error from the last failed persist, cleared by the next success.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Whether the draft differs from what the server has confirmed.
    pub fn has_unconfirmed_order(&self) -> bool {
        self.draft.ids() != self.confirmed.ids()
    }

    /// Whether a new gesture may start.
    pub fn can_drag(&self) -> bool {
        self.phase == ReorderPhase::Idle
    }

    /// Start dragging `asset_id`. Refused while another gesture or a
    /// persist is outstanding.
    pub fn begin_drag(&mut self, asset_id: DbId) -> Result<(), CoreError> {
        if !self.can_drag() {
            return Err(CoreError::Conflict(
                "A reorder is already in progress for this gallery".into(),
            ));
        }
        if self.draft.position(asset_id).is_none() {
            return Err(CoreError::NotFound {
                entity: "Image",
                id: asset_id,
            });
        }
        self.phase = ReorderPhase::Dragging { asset_id };
        Ok(())
    }

    /// The dragged image passes over `over_id`; the draft updates live.
    pub fn drag_over(&mut self, over_id: DbId) -> Result<(), CoreError> {
        let ReorderPhase::Dragging { asset_id } = self.phase else {
            return Err(CoreError::Validation("No drag gesture is active".into()));
        };
        self.draft.move_to(asset_id, over_id)
    }

    /// Abandon the gesture without persisting. The draft is left as is.
    pub fn cancel_drag(&mut self) {
        if matches!(self.phase, ReorderPhase::Dragging { .. }) {
            self.phase = ReorderPhase::Idle;
        }
    }

    /// End the gesture and return the complete id sequence to persist.
    pub fn drop_drag(&mut self) -> Result<Vec<DbId>, CoreError> {
        if !matches!(self.phase, ReorderPhase::Dragging { .. }) {
            return Err(CoreError::Validation("No drag gesture is active".into()));
        }
        self.phase = ReorderPhase::Persisting;
        Ok(self.draft.ids())
    }

    /// The server accepted the persisted order. If the draft no longer
    /// fits the confirmed collection the persist is treated as failed, so
    /// the gallery is never left stuck in `Persisting`.
    pub fn confirm(&mut self) -> Result<(), CoreError> {
        if let Err(e) = self.confirmed.reorder(&self.draft.ids()) {
            self.fail(e.to_string());
            return Err(e);
        }
        self.phase = ReorderPhase::Idle;
        self.last_error = None;
        Ok(())
    }

    /// The persist failed. The draft stays on screen; the error is kept
    /// for display and the user may retry.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.phase = ReorderPhase::Idle;
        self.last_error = Some(message.into());
    }

    /// The id sequence a manual retry should send.
    pub fn retry_ids(&self) -> Option<Vec<DbId>> {
        (self.last_error.is_some() && self.has_unconfirmed_order()).then(|| self.draft.ids())
    }

    /// Mark a retry as in flight.
    pub fn begin_retry(&mut self) -> Result<Vec<DbId>, CoreError> {
        if !self.can_drag() {
            return Err(CoreError::Conflict(
                "A reorder is already in progress for this gallery".into(),
            ));
        }
        let ids = self
            .retry_ids()
            .ok_or_else(|| CoreError::Validation("There is no failed reorder to retry".into()))?;
        self.phase = ReorderPhase::Persisting;
        Ok(ids)
    }

    // -- Server-confirmed changes are applied to both views. --

    pub fn apply_push(&mut self, asset: Asset) -> Result<(), CoreError> {
        self.confirmed.push(asset.clone())?;
        self.draft.push(asset)
    }

    /// Remove an image the server deleted. Promotion follows the server's
    /// (confirmed) order, so the draft takes its primary from `confirmed`.
    pub fn apply_remove(&mut self, id: DbId) -> Result<(), CoreError> {
        self.confirmed.remove(id)?;
        self.draft.remove(id)?;
        if let Some(primary) = self.confirmed.primary_id() {
            self.draft.set_primary(primary)?;
        }
        Ok(())
    }

    pub fn apply_set_primary(&mut self, id: DbId) -> Result<(), CoreError> {
        self.confirmed.set_primary(id)?;
        self.draft.set_primary(id)
    }

    pub fn apply_category(&mut self, id: DbId, category: &str) -> Result<(), CoreError> {
        self.confirmed.set_category(id, category)?;
        self.draft.set_category(id, category)
    }
}
