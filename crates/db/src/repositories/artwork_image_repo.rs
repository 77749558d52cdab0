//! Repository for the `artwork_images` table.
//!
//! Every mutation runs in a transaction holding a per-artwork advisory
//! lock, and leaves the artwork's images with dense `sort_order` values
//! (0..n-1) and exactly one primary whenever any image remains.

use atelier_core::assets::validate_permutation;
use atelier_core::types::DbId;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};

use crate::error::RepoError;
use crate::models::artwork_image::{ArtworkImage, CreateArtworkImage};

/// Column list for artwork_images queries.
const COLUMNS: &str = "id, artwork_id, sort_order, is_primary, category, file_name, \
    rendition_urls, created_at, updated_at";

/// Provides gallery operations for artwork images.
pub struct ArtworkImageRepo;

impl ArtworkImageRepo {
    /// List an artwork's images in display order.
    pub async fn list_for_artwork(
        pool: &PgPool,
        artwork_id: DbId,
    ) -> Result<Vec<ArtworkImage>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM artwork_images WHERE artwork_id = $1 ORDER BY sort_order ASC"
        );
        sqlx::query_as::<_, ArtworkImage>(&query)
            .bind(artwork_id)
            .fetch_all(pool)
            .await
    }

    /// Find one image of an artwork.
    pub async fn find(
        pool: &PgPool,
        artwork_id: DbId,
        id: DbId,
    ) -> Result<Option<ArtworkImage>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM artwork_images WHERE id = $1 AND artwork_id = $2");
        sqlx::query_as::<_, ArtworkImage>(&query)
            .bind(id)
            .bind(artwork_id)
            .fetch_optional(pool)
            .await
    }

    async fn lock_artwork(
        tx: &mut Transaction<'_, Postgres>,
        artwork_id: DbId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext('artwork_images/' || $1::text))")
            .bind(artwork_id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// Append an image at the end of the artwork's gallery. The first
    /// image of an empty gallery becomes primary.
    pub async fn create(
        pool: &PgPool,
        input: &CreateArtworkImage,
    ) -> Result<ArtworkImage, sqlx::Error> {
        let mut tx = pool.begin().await?;
        Self::lock_artwork(&mut tx, input.artwork_id).await?;

        let query = format!(
            "INSERT INTO artwork_images \
                (artwork_id, sort_order, is_primary, category, file_name, rendition_urls) \
             VALUES ( \
                $1, \
                (SELECT COALESCE(MAX(sort_order) + 1, 0) FROM artwork_images WHERE artwork_id = $1), \
                NOT EXISTS (SELECT 1 FROM artwork_images WHERE artwork_id = $1), \
                $2, $3, $4 \
             ) \
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, ArtworkImage>(&query)
            .bind(input.artwork_id)
            .bind(&input.category)
            .bind(&input.file_name)
            .bind(Json(&input.rendition_urls))
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(row)
    }

    /// Delete an image. Remaining images are renumbered densely and, if the
    /// deleted image was primary, the new first image is promoted.
    ///
    /// Returns the deleted row, or `None` if it did not exist.
    pub async fn delete(
        pool: &PgPool,
        artwork_id: DbId,
        id: DbId,
    ) -> Result<Option<ArtworkImage>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        Self::lock_artwork(&mut tx, artwork_id).await?;

        let query = format!(
            "DELETE FROM artwork_images WHERE id = $1 AND artwork_id = $2 RETURNING {COLUMNS}"
        );
        let deleted = sqlx::query_as::<_, ArtworkImage>(&query)
            .bind(id)
            .bind(artwork_id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(deleted) = deleted else {
            tx.rollback().await?;
            return Ok(None);
        };

        sqlx::query(
            "UPDATE artwork_images AS a SET sort_order = r.rn - 1 \
             FROM ( \
                SELECT id, (ROW_NUMBER() OVER (ORDER BY sort_order))::int AS rn \
                FROM artwork_images WHERE artwork_id = $1 \
             ) AS r \
             WHERE a.id = r.id AND a.sort_order <> r.rn - 1",
        )
        .bind(artwork_id)
        .execute(&mut *tx)
        .await?;

        if deleted.is_primary {
            sqlx::query(
                "UPDATE artwork_images SET is_primary = true \
                 WHERE artwork_id = $1 AND sort_order = 0",
            )
            .bind(artwork_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(Some(deleted))
    }

    /// Make `id` the artwork's only primary image.
    ///
    /// The old primary is cleared and the new one set inside one
    /// transaction, so no other reader sees zero or two primaries.
    pub async fn set_primary(
        pool: &PgPool,
        artwork_id: DbId,
        id: DbId,
    ) -> Result<Option<ArtworkImage>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        Self::lock_artwork(&mut tx, artwork_id).await?;

        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM artwork_images WHERE id = $1 AND artwork_id = $2)",
        )
        .bind(id)
        .bind(artwork_id)
        .fetch_one(&mut *tx)
        .await?;

        if !exists {
            tx.rollback().await?;
            return Ok(None);
        }

        sqlx::query(
            "UPDATE artwork_images SET is_primary = false \
             WHERE artwork_id = $1 AND is_primary AND id <> $2",
        )
        .bind(artwork_id)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let query = format!(
            "UPDATE artwork_images SET is_primary = true \
             WHERE id = $1 AND artwork_id = $2 \
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, ArtworkImage>(&query)
            .bind(id)
            .bind(artwork_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(row))
    }

    /// Rewrite the gallery order to exactly `image_ids`.
    ///
    /// The list must be a permutation of the artwork's current images;
    /// anything else is rejected without writing. Returns the reordered
    /// gallery.
    pub async fn reorder(
        pool: &PgPool,
        artwork_id: DbId,
        image_ids: &[DbId],
    ) -> Result<Vec<ArtworkImage>, RepoError> {
        let mut tx = pool.begin().await?;
        Self::lock_artwork(&mut tx, artwork_id).await?;

        let existing: Vec<DbId> = sqlx::query_scalar(
            "SELECT id FROM artwork_images WHERE artwork_id = $1 ORDER BY sort_order",
        )
        .bind(artwork_id)
        .fetch_all(&mut *tx)
        .await?;

        if let Err(e) = validate_permutation(&existing, image_ids) {
            tx.rollback().await?;
            return Err(e.into());
        }

        sqlx::query(
            "UPDATE artwork_images AS a SET sort_order = (o.ord - 1)::int \
             FROM UNNEST($2::bigint[]) WITH ORDINALITY AS o(id, ord) \
             WHERE a.id = o.id AND a.artwork_id = $1 AND a.sort_order <> (o.ord - 1)::int",
        )
        .bind(artwork_id)
        .bind(image_ids)
        .execute(&mut *tx)
        .await?;

        let query = format!(
            "SELECT {COLUMNS} FROM artwork_images WHERE artwork_id = $1 ORDER BY sort_order ASC"
        );
        let rows = sqlx::query_as::<_, ArtworkImage>(&query)
            .bind(artwork_id)
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(rows)
    }

    /// Assign an image to a category. The category must exist.
    pub async fn set_category(
        pool: &PgPool,
        artwork_id: DbId,
        id: DbId,
        category: &str,
    ) -> Result<Option<ArtworkImage>, sqlx::Error> {
        let query = format!(
            "UPDATE artwork_images SET category = $3 \
             WHERE id = $1 AND artwork_id = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ArtworkImage>(&query)
            .bind(id)
            .bind(artwork_id)
            .bind(category)
            .fetch_optional(pool)
            .await
    }
}
