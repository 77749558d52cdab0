//! Repository for the `categories` table.
//!
//! Rename and delete cascade to `artwork_images.category` inside the same
//! transaction as the registry change, so no committed state has an image
//! pointing at a name the registry does not contain.

use atelier_core::taxonomy::{Taxonomy, UNCATEGORIZED};
use sqlx::{PgPool, Postgres, Transaction};

use crate::error::RepoError;
use crate::models::category::{Category, CategoryChange};

/// Provides registry operations for image categories.
pub struct CategoryRepo;

impl CategoryRepo {
    /// List all categories, ordered by name.
    pub async fn list(pool: &PgPool) -> Result<Vec<Category>, sqlx::Error> {
        sqlx::query_as::<_, Category>("SELECT name, created_at FROM categories ORDER BY name ASC")
            .fetch_all(pool)
            .await
    }

    /// List all category names, sorted.
    pub async fn list_names(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar("SELECT name FROM categories ORDER BY name ASC")
            .fetch_all(pool)
            .await
    }

    /// Whether a (normalized) name is registered.
    pub async fn exists(pool: &PgPool, name: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM categories WHERE name = $1)")
            .bind(name)
            .fetch_one(pool)
            .await
    }

    /// Take the registry write lock and load it. Readers are not blocked.
    async fn lock_registry(tx: &mut Transaction<'_, Postgres>) -> Result<Taxonomy, sqlx::Error> {
        sqlx::query("LOCK TABLE categories IN EXCLUSIVE MODE")
            .execute(&mut **tx)
            .await?;
        let names: Vec<String> = sqlx::query_scalar("SELECT name FROM categories")
            .fetch_all(&mut **tx)
            .await?;
        Ok(Taxonomy::from_names(names))
    }

    async fn names_in_tx(tx: &mut Transaction<'_, Postgres>) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar("SELECT name FROM categories ORDER BY name ASC")
            .fetch_all(&mut **tx)
            .await
    }

    /// Register a new category. A case-insensitive duplicate is a conflict.
    pub async fn create(pool: &PgPool, name: &str) -> Result<CategoryChange, RepoError> {
        let mut tx = pool.begin().await?;
        let registry = Self::lock_registry(&mut tx).await?;
        let name = registry.check_add(name)?;

        sqlx::query("INSERT INTO categories (name) VALUES ($1)")
            .bind(&name)
            .execute(&mut *tx)
            .await?;

        let names = Self::names_in_tx(&mut tx).await?;
        tx.commit().await?;
        Ok(CategoryChange {
            names,
            reassigned_images: 0,
        })
    }

    /// Rename a category and move every image tagged with it.
    pub async fn rename(pool: &PgPool, old: &str, new: &str) -> Result<CategoryChange, RepoError> {
        let mut tx = pool.begin().await?;
        let registry = Self::lock_registry(&mut tx).await?;
        let (old, new) = registry.check_rename(old, new)?;

        if old == new {
            let names = Self::names_in_tx(&mut tx).await?;
            tx.commit().await?;
            return Ok(CategoryChange {
                names,
                reassigned_images: 0,
            });
        }

        sqlx::query("INSERT INTO categories (name) VALUES ($1)")
            .bind(&new)
            .execute(&mut *tx)
            .await?;

        let moved = sqlx::query("UPDATE artwork_images SET category = $2 WHERE category = $1")
            .bind(&old)
            .bind(&new)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query("DELETE FROM categories WHERE name = $1")
            .bind(&old)
            .execute(&mut *tx)
            .await?;

        let names = Self::names_in_tx(&mut tx).await?;
        tx.commit().await?;
        Ok(CategoryChange {
            names,
            reassigned_images: moved,
        })
    }

    /// Delete a category, moving its images to `uncategorized` first.
    pub async fn delete(pool: &PgPool, name: &str) -> Result<CategoryChange, RepoError> {
        let mut tx = pool.begin().await?;
        let registry = Self::lock_registry(&mut tx).await?;
        let name = registry.check_remove(name)?;

        let moved = sqlx::query("UPDATE artwork_images SET category = $2 WHERE category = $1")
            .bind(&name)
            .bind(UNCATEGORIZED)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query("DELETE FROM categories WHERE name = $1")
            .bind(&name)
            .execute(&mut *tx)
            .await?;

        let names = Self::names_in_tx(&mut tx).await?;
        tx.commit().await?;
        Ok(CategoryChange {
            names,
            reassigned_images: moved,
        })
    }
}
