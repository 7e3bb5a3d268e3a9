//! Duplicate-post suppression
//!
//! Fingerprints of published content live in the `post_history` table.
//! Before a due item goes out, its normalized text (and media reference,
//! when present) is hashed and checked against recent history; after a
//! successful publish the fingerprint is recorded.

use sha2::{Digest, Sha256};
use sqlx::Row;

use crate::db::Database;
use crate::error::{DbError, Result};

pub const DEFAULT_WINDOW_DAYS: u32 = 15;

/// A prior post that matches the candidate content.
#[derive(Debug, Clone)]
pub struct DuplicateHit {
    pub posted_at: i64,
    pub platform: Option<String>,
}

#[derive(Clone)]
pub struct Dedup {
    db: Database,
    window_days: u32,
}

impl Dedup {
    pub fn new(db: Database) -> Self {
        Self::with_window(db, DEFAULT_WINDOW_DAYS)
    }

    pub fn with_window(db: Database, window_days: u32) -> Self {
        Self { db, window_days }
    }

    /// Look for a matching post within the dedup window.
    ///
    /// Text matches on the normalized-text hash; media matches on the hash
    /// of the opaque media reference. Either match counts.
    pub async fn check(&self, text: &str, media_id: Option<&str>) -> Result<Option<DuplicateHit>> {
        let cutoff = chrono::Utc::now().timestamp() - i64::from(self.window_days) * 86_400;
        let text_hash = hash_text(text);
        let media_hash = media_id.map(|m| sha256_hex(m.as_bytes()));

        let row = sqlx::query(
            r#"
            SELECT created_at, platform
            FROM post_history
            WHERE created_at >= ?
              AND (
                    (text_hash IS NOT NULL AND text_hash = ?)
                 OR (media_hash IS NOT NULL AND media_hash = ?)
              )
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(cutoff)
        .bind(&text_hash)
        .bind(&media_hash)
        .fetch_optional(&self.db.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(row.map(|r| DuplicateHit {
            posted_at: r.get("created_at"),
            platform: r.get("platform"),
        }))
    }

    /// Record a published post's fingerprint.
    pub async fn record(&self, text: &str, media_id: Option<&str>, platform: &str) -> Result<()> {
        let text_hash = hash_text(text);
        let media_hash = media_id.map(|m| sha256_hex(m.as_bytes()));

        sqlx::query(
            r#"
            INSERT INTO post_history (created_at, text_hash, media_hash, platform)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(chrono::Utc::now().timestamp())
        .bind(&text_hash)
        .bind(&media_hash)
        .bind(platform)
        .execute(&self.db.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(())
    }
}

/// Lowercase and collapse whitespace, so cosmetic edits hash the same.
fn normalize_text(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn hash_text(text: &str) -> Option<String> {
    let normalized = normalize_text(text);
    if normalized.is_empty() {
        return None;
    }
    Some(sha256_hex(normalized.as_bytes()))
}

fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePool;

    async fn memory_db() -> Database {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        Database { pool }
    }

    #[test]
    fn test_normalize_collapses_whitespace_and_case() {
        assert_eq!(normalize_text("  BTC  to the\n Moon "), "btc to the moon");
        assert_eq!(normalize_text(""), "");
    }

    #[test]
    fn test_hash_text_is_stable_across_cosmetic_edits() {
        assert_eq!(hash_text("BTC pumping"), hash_text("  btc   PUMPING "));
        assert_ne!(hash_text("BTC pumping"), hash_text("ETH pumping"));
        assert!(hash_text("   ").is_none());
    }

    #[tokio::test]
    async fn test_record_then_check_hits() {
        let dedup = Dedup::new(memory_db().await);
        dedup.record("Bitcoin broke 100k", None, "telegram").await.unwrap();

        let hit = dedup.check("bitcoin  broke 100k", None).await.unwrap();
        let hit = hit.expect("expected a duplicate hit");
        assert_eq!(hit.platform.as_deref(), Some("telegram"));
    }

    #[tokio::test]
    async fn test_different_text_does_not_hit() {
        let dedup = Dedup::new(memory_db().await);
        dedup.record("Bitcoin broke 100k", None, "telegram").await.unwrap();

        let hit = dedup.check("Ethereum merge anniversary", None).await.unwrap();
        assert!(hit.is_none());
    }

    #[tokio::test]
    async fn test_media_reference_match_counts() {
        let dedup = Dedup::new(memory_db().await);
        dedup
            .record("caption one", Some("QmSameAsset"), "telegram")
            .await
            .unwrap();

        // Different text, same asset.
        let hit = dedup.check("caption two", Some("QmSameAsset")).await.unwrap();
        assert!(hit.is_some());
    }

    #[tokio::test]
    async fn test_old_entries_fall_out_of_window() {
        let db = memory_db().await;
        let dedup = Dedup::with_window(db.clone(), 15);

        // Plant an entry 16 days in the past.
        let old = chrono::Utc::now().timestamp() - 16 * 86_400;
        sqlx::query(
            "INSERT INTO post_history (created_at, text_hash, platform) VALUES (?, ?, 'telegram')",
        )
        .bind(old)
        .bind(hash_text("stale take").unwrap())
        .execute(&db.pool)
        .await
        .unwrap();

        assert!(dedup.check("stale take", None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_text_never_matches() {
        let dedup = Dedup::new(memory_db().await);
        dedup.record("real content", None, "telegram").await.unwrap();
        assert!(dedup.check("", None).await.unwrap().is_none());
    }
}
