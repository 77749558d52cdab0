//! Editing session for one artwork's image gallery.
//!
//! Uploads, deletes, primary changes and category assignments are applied
//! locally only once the server confirms them. Reordering is optimistic:
//! the drag gesture reorders a draft that is rendered immediately, the drop
//! persists the complete order, and a failed persist leaves the draft on
//! screen with an error flag until the user retries.

use std::sync::Arc;

use atelier_core::assets::{Asset, AssetCollection};
use atelier_core::reorder::{GalleryOrder, ReorderPhase};
use atelier_core::types::DbId;
use tokio::sync::Mutex;

use crate::backend::{AssetStore, UploadFile};
use crate::error::{EditorError, EditorResult};
use crate::notify::{Notifier, Operation};

/// Editing session for the images of one artwork.
pub struct GalleryEditor<S: AssetStore> {
    store: Arc<S>,
    notifier: Notifier,
    artwork_id: DbId,
    order: Mutex<GalleryOrder>,
}

impl<S: AssetStore> std::fmt::Debug for GalleryEditor<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GalleryEditor")
            .field("artwork_id", &self.artwork_id)
            .finish_non_exhaustive()
    }
}

impl<S: AssetStore> GalleryEditor<S> {
    pub async fn load(store: Arc<S>, notifier: Notifier, artwork_id: DbId) -> EditorResult<Self> {
        let collection = Self::fetch(&store, artwork_id).await;
        let collection = notifier.report_failure(Operation::LoadGallery, collection)?;
        tracing::debug!(artwork_id, count = collection.len(), "Gallery loaded");
        Ok(Self {
            store,
            notifier,
            artwork_id,
            order: Mutex::new(GalleryOrder::new(collection)),
        })
    }

    async fn fetch(store: &S, artwork_id: DbId) -> EditorResult<AssetCollection> {
        let records = store.list(artwork_id).await?;
        Ok(AssetCollection::from_records(records)?)
    }

    pub fn artwork_id(&self) -> DbId {
        self.artwork_id
    }

    /// The collection to render (includes an unconfirmed reorder).
    pub async fn draft(&self) -> AssetCollection {
        self.order.lock().await.draft().clone()
    }

    /// The last server-confirmed collection.
    pub async fn confirmed(&self) -> AssetCollection {
        self.order.lock().await.confirmed().clone()
    }

    pub async fn phase(&self) -> ReorderPhase {
        self.order.lock().await.phase()
    }

    /// Error from the last failed reorder, until a persist succeeds.
    pub async fn reorder_error(&self) -> Option<String> {
        self.order.lock().await.last_error().map(str::to_string)
    }

    pub async fn can_drag(&self) -> bool {
        self.order.lock().await.can_drag()
    }

    /// Re-fetch the gallery, e.g. after a category rename elsewhere.
    /// Refused while a drag or persist is active.
    pub async fn reload(&self) -> EditorResult<()> {
        let result = self.reload_inner().await;
        self.notifier.report_failure(Operation::LoadGallery, result)
    }

    async fn reload_inner(&self) -> EditorResult<()> {
        if !self.can_drag().await {
            return Err(EditorError::Validation(
                "Cannot reload while a reorder is in progress".into(),
            ));
        }
        let collection = Self::fetch(&self.store, self.artwork_id).await?;

        let mut order = self.order.lock().await;
        if !order.can_drag() {
            return Err(EditorError::Validation(
                "Cannot reload while a reorder is in progress".into(),
            ));
        }
        *order = GalleryOrder::new(collection);
        Ok(())
    }

    /// Upload files one after another, appending each confirmed image.
    ///
    /// One notification covers the whole batch. Images uploaded before a
    /// failure stay in the gallery.
    pub async fn upload(&self, files: Vec<UploadFile>) -> EditorResult<Vec<DbId>> {
        let total = files.len();
        let mut uploaded = Vec::with_capacity(total);
        let mut failure = None;

        for file in &files {
            match self.upload_one(file).await {
                Ok(id) => uploaded.push(id),
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }

        match failure {
            None => {
                tracing::info!(artwork_id = self.artwork_id, count = total, "Images uploaded");
                self.notifier.success(
                    Operation::UploadImages,
                    format!("Uploaded {total} image(s)"),
                );
                Ok(uploaded)
            }
            Some(err) => {
                let err = match err {
                    EditorError::Validation(msg) if !uploaded.is_empty() => EditorError::Validation(
                        format!("Uploaded {} of {total} image(s): {msg}", uploaded.len()),
                    ),
                    other => other,
                };
                self.notifier.failure(Operation::UploadImages, &err);
                Err(err)
            }
        }
    }

    async fn upload_one(&self, file: &UploadFile) -> EditorResult<DbId> {
        let record = self.store.upload(self.artwork_id, file).await?;
        let id = record.id;
        let is_primary = record.is_primary;

        let mut order = self.order.lock().await;
        order.apply_push(Asset::from(record))?;
        if is_primary && order.confirmed().primary_id() != Some(id) {
            order.apply_set_primary(id)?;
        }
        Ok(id)
    }

    /// Delete an image. When the primary is deleted the new first image
    /// becomes primary, matching the server.
    pub async fn delete(&self, id: DbId) -> EditorResult<()> {
        let result = self.delete_inner(id).await;
        self.notifier
            .report(Operation::DeleteImage, result, |_| "Image deleted".to_string())
    }

    async fn delete_inner(&self, id: DbId) -> EditorResult<()> {
        self.require(id).await?;
        self.store.delete(self.artwork_id, id).await?;
        self.order.lock().await.apply_remove(id)?;
        tracing::info!(artwork_id = self.artwork_id, image_id = id, "Image deleted");
        Ok(())
    }

    pub async fn set_primary(&self, id: DbId) -> EditorResult<()> {
        let result = self.set_primary_inner(id).await;
        self.notifier
            .report(Operation::SetPrimary, result, |_| "Primary image updated".to_string())
    }

    async fn set_primary_inner(&self, id: DbId) -> EditorResult<()> {
        self.require(id).await?;
        self.store.set_primary(self.artwork_id, id).await?;
        self.order.lock().await.apply_set_primary(id)?;
        Ok(())
    }

    pub async fn assign_category(&self, id: DbId, category: &str) -> EditorResult<()> {
        let result = self.assign_category_inner(id, category).await;
        self.notifier
            .report(Operation::AssignCategory, result, |c| format!("Moved to {c}"))
            .map(|_| ())
    }

    async fn assign_category_inner(&self, id: DbId, category: &str) -> EditorResult<String> {
        self.require(id).await?;
        let record = self
            .store
            .assign_category(self.artwork_id, id, category)
            .await?;
        self.order
            .lock()
            .await
            .apply_category(id, &record.category)?;
        Ok(record.category)
    }

    // ---- reorder gesture ----

    /// Start dragging `id`. Refused while another gesture or persist is
    /// active; only a refusal is announced.
    pub async fn begin_drag(&self, id: DbId) -> EditorResult<()> {
        let result = self.order.lock().await.begin_drag(id).map_err(EditorError::from);
        self.notifier.report_failure(Operation::Reorder, result)
    }

    /// The dragged image is over `over_id`; the draft reorders live.
    pub async fn drag_over(&self, over_id: DbId) -> EditorResult<()> {
        Ok(self.order.lock().await.drag_over(over_id)?)
    }

    pub async fn cancel_drag(&self) {
        self.order.lock().await.cancel_drag();
    }

    /// End the gesture and persist the draft's complete order.
    pub async fn drop_drag(&self) -> EditorResult<()> {
        let ids = self.order.lock().await.drop_drag().map_err(EditorError::from);
        let ids = self.notifier.report_failure(Operation::Reorder, ids)?;
        self.persist(ids).await
    }

    /// Send the failed order again.
    pub async fn retry_reorder(&self) -> EditorResult<()> {
        let ids = self.order.lock().await.begin_retry().map_err(EditorError::from);
        let ids = self.notifier.report_failure(Operation::Reorder, ids)?;
        self.persist(ids).await
    }

    async fn persist(&self, ids: Vec<DbId>) -> EditorResult<()> {
        let result = self.store.reorder(self.artwork_id, &ids).await;

        let mut order = self.order.lock().await;
        let result = match result {
            Ok(()) => order.confirm().map_err(EditorError::from),
            Err(e) => {
                order.fail(e.to_string());
                Err(e)
            }
        };
        drop(order);

        if result.is_ok() {
            tracing::info!(artwork_id = self.artwork_id, count = ids.len(), "Gallery order saved");
        }
        self.notifier
            .report(Operation::Reorder, result, |_| "Order saved".to_string())
    }

    async fn require(&self, id: DbId) -> EditorResult<()> {
        if self.order.lock().await.confirmed().position(id).is_none() {
            return Err(EditorError::Validation(format!("Image {id} is not in this gallery")));
        }
        Ok(())
    }
}
