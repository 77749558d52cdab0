//! Editing session for the category registry.
//!
//! Name rules are checked locally before anything is sent, so an empty,
//! duplicate or protected name is reported without a round trip. After a
//! successful change the registry is replaced by the server's answer.

use std::sync::Arc;

use atelier_core::taxonomy::{CategoryLabel, Taxonomy};
use tokio::sync::Mutex;

use crate::backend::TaxonomyBackend;
use crate::error::EditorResult;
use crate::notify::{Notifier, Operation};

pub struct CategoryEditor<T: TaxonomyBackend> {
    backend: Arc<T>,
    notifier: Notifier,
    taxonomy: Mutex<Taxonomy>,
}

impl<T: TaxonomyBackend> CategoryEditor<T> {
    pub async fn load(backend: Arc<T>, notifier: Notifier) -> EditorResult<Self> {
        let result = backend.list().await;
        let names = notifier.report_failure(Operation::LoadCategories, result)?;
        Ok(Self {
            backend,
            notifier,
            taxonomy: Mutex::new(Taxonomy::from_names(names)),
        })
    }

    /// Sorted stored names.
    pub async fn names(&self) -> Vec<String> {
        self.taxonomy.lock().await.names()
    }

    pub async fn labels(&self) -> Vec<CategoryLabel> {
        self.taxonomy.lock().await.labels()
    }

    pub async fn display_names(&self) -> Vec<String> {
        self.labels().await.into_iter().map(|l| l.display_name).collect()
    }

    pub async fn contains(&self, name: &str) -> bool {
        self.taxonomy.lock().await.contains(name)
    }

    /// Re-fetch the registry.
    pub async fn reload(&self) -> EditorResult<()> {
        let result = self.backend.list().await;
        let names = self.notifier.report_failure(Operation::LoadCategories, result)?;
        *self.taxonomy.lock().await = Taxonomy::from_names(names);
        Ok(())
    }

    pub async fn add(&self, name: &str) -> EditorResult<String> {
        let result = self.add_inner(name).await;
        self.notifier
            .report(Operation::AddCategory, result, |n| format!("Added category {n}"))
    }

    async fn add_inner(&self, name: &str) -> EditorResult<String> {
        let normalized = self.taxonomy.lock().await.check_add(name)?;
        let names = self.backend.create(&normalized).await?;
        self.replace(names).await;
        tracing::info!(category = %normalized, "Category added");
        Ok(normalized)
    }

    /// Rename a category. Images tagged with the old name move with it on
    /// the server; open galleries should [`reload`](crate::gallery::GalleryEditor::reload).
    pub async fn rename(&self, old_name: &str, new_name: &str) -> EditorResult<String> {
        let result = self.rename_inner(old_name, new_name).await;
        self.notifier
            .report(Operation::RenameCategory, result, |n| format!("Renamed to {n}"))
    }

    async fn rename_inner(&self, old_name: &str, new_name: &str) -> EditorResult<String> {
        let (old, new) = self.taxonomy.lock().await.check_rename(old_name, new_name)?;
        if old == new {
            return Ok(new);
        }
        let names = self.backend.rename(&old, &new).await?;
        self.replace(names).await;
        tracing::info!(from = %old, to = %new, "Category renamed");
        Ok(new)
    }

    /// Remove a category. Its images fall back to `uncategorized`.
    pub async fn remove(&self, name: &str) -> EditorResult<String> {
        let result = self.remove_inner(name).await;
        self.notifier
            .report(Operation::RemoveCategory, result, |n| format!("Removed category {n}"))
    }

    async fn remove_inner(&self, name: &str) -> EditorResult<String> {
        let normalized = self.taxonomy.lock().await.check_remove(name)?;
        let names = self.backend.delete(&normalized).await?;
        self.replace(names).await;
        tracing::info!(category = %normalized, "Category removed");
        Ok(normalized)
    }

    async fn replace(&self, names: Vec<String>) {
        *self.taxonomy.lock().await = Taxonomy::from_names(names);
    }
}
