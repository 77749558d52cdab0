//! Repository for the `site_settings` table.
//!
//! Beyond plain reads this implements the two write paths the editor uses:
//! the all-or-nothing batched value save, and group add/remove, which
//! allocate and release whole `{kind}{index}_*` key families.

use atelier_core::groups::{self, GroupKind};
use atelier_core::settings::{normalize_value, SettingType, SettingUpdate};
use atelier_core::types::DbId;
use sqlx::{PgPool, Postgres, Transaction};

use crate::error::RepoError;
use crate::models::setting::{into_settings, BatchItemError, CreateSiteSetting, SiteSetting};

/// Column list for site_settings queries.
const COLUMNS: &str =
    "id, page_key, section_key, key, setting_type, value, description, created_at, updated_at";

/// Provides data access for page settings.
pub struct SettingRepo;

impl SettingRepo {
    /// List the settings of one page section in creation order.
    pub async fn list_section(
        pool: &PgPool,
        page_key: &str,
        section_key: &str,
    ) -> Result<Vec<SiteSetting>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM site_settings \
             WHERE page_key = $1 AND section_key = $2 \
             ORDER BY id ASC"
        );
        sqlx::query_as::<_, SiteSetting>(&query)
            .bind(page_key)
            .bind(section_key)
            .fetch_all(pool)
            .await
    }

    /// List the distinct section keys of a page.
    pub async fn list_sections(pool: &PgPool, page_key: &str) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT section_key FROM site_settings \
             WHERE page_key = $1 ORDER BY section_key",
        )
        .bind(page_key)
        .fetch_all(pool)
        .await
    }

    /// Find a setting by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<SiteSetting>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM site_settings WHERE id = $1");
        sqlx::query_as::<_, SiteSetting>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Insert a setting. The value is normalized for its type first.
    pub async fn create(
        pool: &PgPool,
        input: &CreateSiteSetting,
    ) -> Result<SiteSetting, RepoError> {
        let mut tx = pool.begin().await?;
        let row = Self::insert(&mut tx, input).await?;
        tx.commit().await?;
        Ok(row)
    }

    async fn insert(
        tx: &mut Transaction<'_, Postgres>,
        input: &CreateSiteSetting,
    ) -> Result<SiteSetting, RepoError> {
        let value = normalize_value(input.setting_type, &input.value)?;
        let query = format!(
            "INSERT INTO site_settings (page_key, section_key, key, setting_type, value, description) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, SiteSetting>(&query)
            .bind(&input.page_key)
            .bind(&input.section_key)
            .bind(&input.key)
            .bind(input.setting_type.as_str())
            .bind(&value)
            .bind(&input.description)
            .fetch_one(&mut **tx)
            .await?;
        Ok(row)
    }

    /// Apply a batch of value updates atomically.
    ///
    /// Every referenced row is locked and every value checked before
    /// anything is written. If any entry fails, the transaction is rolled
    /// back and all failures are reported together.
    pub async fn batch_update(
        pool: &PgPool,
        updates: &[SettingUpdate],
    ) -> Result<Vec<SiteSetting>, RepoError> {
        let mut tx = pool.begin().await?;
        let mut planned: Vec<(DbId, String)> = Vec::with_capacity(updates.len());
        let mut failures = Vec::new();

        for update in updates {
            let setting_type: Option<String> = sqlx::query_scalar(
                "SELECT setting_type FROM site_settings WHERE id = $1 FOR UPDATE",
            )
            .bind(update.id)
            .fetch_optional(&mut *tx)
            .await?;

            let Some(setting_type) = setting_type else {
                failures.push(BatchItemError {
                    id: update.id,
                    error: "Setting not found".to_string(),
                });
                continue;
            };

            match SettingType::parse(&setting_type)
                .and_then(|t| normalize_value(t, &update.value))
            {
                Ok(value) => planned.push((update.id, value)),
                Err(e) => failures.push(BatchItemError {
                    id: update.id,
                    error: e.to_string(),
                }),
            }
        }

        if !failures.is_empty() {
            tx.rollback().await?;
            return Err(RepoError::BatchRejected(failures));
        }

        let query = format!("UPDATE site_settings SET value = $2 WHERE id = $1 RETURNING {COLUMNS}");
        let mut saved = Vec::with_capacity(planned.len());
        for (id, value) in &planned {
            let row = sqlx::query_as::<_, SiteSetting>(&query)
                .bind(id)
                .bind(value)
                .fetch_one(&mut *tx)
                .await?;
            saved.push(row);
        }

        tx.commit().await?;
        Ok(saved)
    }

    /// Serialize group add/remove per section for the rest of the
    /// transaction, so two concurrent adds cannot pick the same index.
    async fn lock_section(
        tx: &mut Transaction<'_, Postgres>,
        page_key: &str,
        section_key: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1 || '/' || $2))")
            .bind(page_key)
            .bind(section_key)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    async fn section_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        page_key: &str,
        section_key: &str,
    ) -> Result<Vec<SiteSetting>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM site_settings \
             WHERE page_key = $1 AND section_key = $2 \
             ORDER BY id ASC"
        );
        sqlx::query_as::<_, SiteSetting>(&query)
            .bind(page_key)
            .bind(section_key)
            .fetch_all(&mut **tx)
            .await
    }

    /// Create a new group of `kind` with its minimal field set.
    ///
    /// The index is one past the highest existing index of that kind;
    /// freed indices are never reused. Returns the created settings.
    pub async fn add_group(
        pool: &PgPool,
        page_key: &str,
        section_key: &str,
        kind: GroupKind,
    ) -> Result<Vec<SiteSetting>, RepoError> {
        let mut tx = pool.begin().await?;
        Self::lock_section(&mut tx, page_key, section_key).await?;

        let existing = into_settings(Self::section_in_tx(&mut tx, page_key, section_key).await?)?;
        let index = groups::next_index(&existing, kind)?;

        let mut created = Vec::with_capacity(kind.default_fields().len());
        for (field, setting_type) in kind.default_fields() {
            let input = CreateSiteSetting {
                page_key: page_key.to_string(),
                section_key: section_key.to_string(),
                key: groups::member_key(kind, index, field),
                setting_type: *setting_type,
                value: String::new(),
                description: Some(format!("{} {index} {field}", kind.as_str())),
            };
            created.push(Self::insert(&mut tx, &input).await?);
        }

        tx.commit().await?;
        Ok(created)
    }

    /// Delete every setting of group `(kind, index)`. Other groups keep
    /// their indices. Returns the number of settings removed (zero when
    /// the group does not exist).
    pub async fn remove_group(
        pool: &PgPool,
        page_key: &str,
        section_key: &str,
        kind: GroupKind,
        index: u32,
    ) -> Result<u64, RepoError> {
        let mut tx = pool.begin().await?;
        Self::lock_section(&mut tx, page_key, section_key).await?;

        let existing = into_settings(Self::section_in_tx(&mut tx, page_key, section_key).await?)?;
        let ids = groups::member_ids(&existing, kind, index);

        let removed = if ids.is_empty() {
            0
        } else {
            sqlx::query("DELETE FROM site_settings WHERE id = ANY($1)")
                .bind(&ids)
                .execute(&mut *tx)
                .await?
                .rows_affected()
        };

        tx.commit().await?;
        Ok(removed)
    }
}
