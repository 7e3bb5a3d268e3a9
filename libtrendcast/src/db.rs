//! Database operations for the scheduled post queue

use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use std::path::Path;

use crate::error::{DbError, Result, TrendcastError};
use crate::timeslot::HhMm;
use crate::types::{MediaRef, PlanItem};

/// Queue counters reported by `trend-queue stats`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueStats {
    pub pending: i64,
    pub done: i64,
}

#[derive(Clone)]
pub struct Database {
    pub(crate) pool: SqlitePool,
}

impl Database {
    /// Open (or create) the database at `db_path` and bring the schema up
    /// to date. Migrations are idempotent; running them against an
    /// already-initialized database is a no-op.
    pub async fn new(db_path: &str) -> Result<Self> {
        let expanded_path = shellexpand::tilde(db_path).to_string();
        let path = Path::new(&expanded_path);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(DbError::IoError)?;
        }

        // Forward slashes work on both Windows and Unix in a SQLite URL;
        // mode=rwc creates the file when it is missing.
        let db_url = format!("sqlite://{}?mode=rwc", expanded_path.replace('\\', "/"));

        let pool = SqlitePool::connect(&db_url)
            .await
            .map_err(DbError::SqlxError)?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(DbError::MigrationError)?;

        Ok(Self { pool })
    }

    /// Add a new plan item with `done = false`.
    ///
    /// Fails with [`DbError::DuplicateItem`] when the `(user_id, item_id)`
    /// pair is already taken.
    pub async fn insert_item(&self, item: &PlanItem) -> Result<()> {
        if item.text.trim().is_empty() {
            return Err(TrendcastError::InvalidInput(
                "Post text cannot be empty".to_string(),
            ));
        }

        let (media_file_id, media_type) = match &item.media {
            Some(m) => (Some(m.file_id.as_str()), Some(m.kind.as_str())),
            None => (None, None),
        };

        let result = sqlx::query(
            r#"
            INSERT INTO plan_items (user_id, item_id, text, when_hhmm, done, media_file_id, media_type)
            VALUES (?, ?, ?, ?, 0, ?, ?)
            "#,
        )
        .bind(item.user_id)
        .bind(item.item_id)
        .bind(&item.text)
        .bind(item.when_hhmm.as_str())
        .bind(media_file_id)
        .bind(media_type)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(DbError::DuplicateItem {
                    user_id: item.user_id,
                    item_id: item.item_id,
                }
                .into())
            }
            Err(e) => Err(DbError::SqlxError(e).into()),
        }
    }

    /// Pending items for `user_id` whose slot is at or before `now`,
    /// ascending by slot. Never returns done rows; a pure read.
    pub async fn due_items(&self, user_id: i64, now: &HhMm) -> Result<Vec<PlanItem>> {
        let rows = sqlx::query(
            r#"
            SELECT user_id, item_id, text, when_hhmm, done, media_file_id, media_type
            FROM plan_items
            WHERE user_id = ? AND done = 0 AND when_hhmm <= ?
            ORDER BY when_hhmm ASC, item_id ASC
            "#,
        )
        .bind(user_id)
        .bind(now.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        rows.iter().map(row_to_item).collect()
    }

    /// All items for `user_id`, pending and done, ascending by slot.
    pub async fn list_items(&self, user_id: i64) -> Result<Vec<PlanItem>> {
        let rows = sqlx::query(
            r#"
            SELECT user_id, item_id, text, when_hhmm, done, media_file_id, media_type
            FROM plan_items
            WHERE user_id = ?
            ORDER BY when_hhmm ASC, item_id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        rows.iter().map(row_to_item).collect()
    }

    /// Look up a single item by its identity pair.
    pub async fn get_item(&self, user_id: i64, item_id: i64) -> Result<Option<PlanItem>> {
        let row = sqlx::query(
            r#"
            SELECT user_id, item_id, text, when_hhmm, done, media_file_id, media_type
            FROM plan_items
            WHERE user_id = ? AND item_id = ?
            "#,
        )
        .bind(user_id)
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        row.as_ref().map(row_to_item).transpose()
    }

    /// Set `done = true` for the matching row.
    ///
    /// `done` is monotonic: this is the only write to the flag and it only
    /// ever sets it. Fails with [`DbError::ItemNotFound`] when no row
    /// matches.
    pub async fn mark_done(&self, user_id: i64, item_id: i64) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE plan_items SET done = 1 WHERE user_id = ? AND item_id = ?
            "#,
        )
        .bind(user_id)
        .bind(item_id)
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        if result.rows_affected() == 0 {
            return Err(DbError::ItemNotFound { user_id, item_id }.into());
        }

        Ok(())
    }

    /// Smallest unused item id for `user_id` (max + 1, starting at 1).
    pub async fn next_item_id(&self, user_id: i64) -> Result<i64> {
        let row = sqlx::query(
            r#"
            SELECT COALESCE(MAX(item_id), 0) + 1 AS next_id FROM plan_items WHERE user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(row.get("next_id"))
    }

    /// Pending/done counters for `user_id`.
    pub async fn stats(&self, user_id: i64) -> Result<QueueStats> {
        let row = sqlx::query(
            r#"
            SELECT
                COALESCE(SUM(done = 0), 0) AS pending,
                COALESCE(SUM(done != 0), 0) AS done
            FROM plan_items
            WHERE user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(QueueStats {
            pending: row.get("pending"),
            done: row.get("done"),
        })
    }
}

fn row_to_item(row: &SqliteRow) -> Result<PlanItem> {
    let when: String = row.get("when_hhmm");
    let when_hhmm = when.parse::<HhMm>()?;

    let media_file_id: Option<String> = row.get("media_file_id");
    let media_type: Option<String> = row.get("media_type");
    // A half-present pair can only come from writers bypassing this API;
    // treat it as no media.
    let media = match (media_file_id, media_type) {
        (Some(file_id), Some(kind)) => Some(MediaRef { file_id, kind }),
        _ => None,
    };

    Ok(PlanItem {
        user_id: row.get("user_id"),
        item_id: row.get("item_id"),
        text: row.get("text"),
        when_hhmm,
        done: row.get::<i64, _>("done") != 0,
        media,
    })
}
