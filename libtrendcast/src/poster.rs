//! Publishing engine
//!
//! Walks the due slice of a user's plan and publishes each item to every
//! configured platform concurrently, with retry logic for transient errors,
//! duplicate suppression, and done-flag bookkeeping.

use std::time::Duration;

use futures::future::join_all;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::db::Database;
use crate::dedup::Dedup;
use crate::error::{PlatformError, Result, TrendcastError};
use crate::platforms::Platform;
use crate::timeslot::HhMm;
use crate::types::{MediaRef, PlanItem};

/// Result of posting one item to a single platform
#[derive(Debug, Clone)]
pub struct PlatformOutcome {
    pub platform: String,
    pub success: bool,
    /// Platform-specific post ID (if successful)
    pub post_id: Option<String>,
    /// Error message (if failed)
    pub error: Option<String>,
}

/// Result of publishing one plan item
#[derive(Debug, Clone)]
pub struct PublishOutcome {
    pub user_id: i64,
    pub item_id: i64,
    /// True if the item was skipped because an equivalent post already
    /// went out within the dedup window. Skipped items are still marked
    /// done so they stop surfacing as due.
    pub skipped_duplicate: bool,
    pub results: Vec<PlatformOutcome>,
}

impl PublishOutcome {
    pub fn any_success(&self) -> bool {
        self.results.iter().any(|r| r.success)
    }
}

/// Check if an error is transient and should be retried
///
/// Network errors are retried; authentication, validation, and posting
/// rejections are permanent.
fn is_transient_error(error: &TrendcastError) -> bool {
    matches!(
        error,
        TrendcastError::Platform(PlatformError::Network(_))
    )
}

/// Post to a platform with retry logic and exponential backoff
///
/// Up to 3 attempts with 1s, 2s delays for transient errors. Returns the
/// platform post id on success, or the final error.
async fn post_with_retry(
    platform: &dyn Platform,
    text: &str,
    media: Option<&MediaRef>,
) -> Result<String> {
    let max_attempts = 3;
    let platform_name = platform.name().to_string();

    for attempt in 1..=max_attempts {
        match platform.post(text, media).await {
            Ok(post_id) => {
                if attempt > 1 {
                    info!(
                        "Successfully posted to {} on attempt {}",
                        platform_name, attempt
                    );
                }
                return Ok(post_id);
            }
            Err(e) => {
                if is_transient_error(&e) && attempt < max_attempts {
                    let delay_secs = 2_u64.pow(attempt - 1);
                    warn!(
                        "Transient error posting to {} (attempt {}/{}): {}. Retrying in {}s...",
                        platform_name, attempt, max_attempts, e, delay_secs
                    );
                    sleep(Duration::from_secs(delay_secs)).await;
                } else {
                    if attempt == max_attempts {
                        warn!(
                            "Failed to post to {} after {} attempts: {}",
                            platform_name, max_attempts, e
                        );
                    }
                    return Err(e);
                }
            }
        }
    }

    Err(PlatformError::Posting(format!(
        "Failed to post to {} after {} attempts",
        platform_name, max_attempts
    ))
    .into())
}

/// Publishes due plan items across all configured platforms
pub struct Poster {
    db: Database,
    dedup: Dedup,
    platforms: Vec<Box<dyn Platform>>,
}

impl Poster {
    pub fn new(db: Database, dedup: Dedup, platforms: Vec<Box<dyn Platform>>) -> Self {
        Self {
            db,
            dedup,
            platforms,
        }
    }

    /// Authenticate every configured platform
    ///
    /// Unconfigured platforms are skipped; the first authentication failure
    /// aborts, since a daemon with dead credentials should not silently
    /// drain the queue.
    pub async fn authenticate_all(&mut self) -> Result<()> {
        for platform in self.platforms.iter_mut() {
            if !platform.is_configured() {
                debug!("Skipping unconfigured platform: {}", platform.name());
                continue;
            }
            info!("Authenticating with {}", platform.name());
            platform.authenticate().await?;
        }
        Ok(())
    }

    /// Names of the platforms that are configured for posting
    pub fn configured_platforms(&self) -> Vec<&str> {
        self.platforms
            .iter()
            .filter(|p| p.is_configured())
            .map(|p| p.name())
            .collect()
    }

    /// Publish every item due at `now` for this user
    ///
    /// Items are processed oldest slot first. A failing item does not stop
    /// the rest of the batch: platform failures land in its outcome, and an
    /// item whose publish errors outright (storage, dedup) is logged and
    /// skipped, leaving it pending for the next poll.
    pub async fn process_due(&self, user_id: i64, now: &HhMm) -> Result<Vec<PublishOutcome>> {
        let due = self.db.due_items(user_id, now).await?;
        if due.is_empty() {
            debug!(user_id, slot = %now, "No items due");
            return Ok(Vec::new());
        }

        info!(user_id, slot = %now, count = due.len(), "Publishing due items");

        let mut outcomes = Vec::with_capacity(due.len());
        for item in &due {
            match self.publish(item).await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    error!(
                        user_id = item.user_id,
                        item_id = item.item_id,
                        "Failed to publish item: {}",
                        e
                    );
                }
            }
        }
        Ok(outcomes)
    }

    /// Publish a single plan item
    ///
    /// Checks the post history first; a hit within the dedup window marks
    /// the item done without posting. Otherwise posts to every configured
    /// platform concurrently, and marks the item done if at least one
    /// platform accepted it.
    pub async fn publish(&self, item: &PlanItem) -> Result<PublishOutcome> {
        let media_id = item.media.as_ref().map(|m| m.file_id.as_str());

        if let Some(hit) = self.dedup.check(&item.text, media_id).await? {
            warn!(
                user_id = item.user_id,
                item_id = item.item_id,
                posted_at = hit.posted_at,
                "Skipping duplicate of a recent post"
            );
            self.db.mark_done(item.user_id, item.item_id).await?;
            return Ok(PublishOutcome {
                user_id: item.user_id,
                item_id: item.item_id,
                skipped_duplicate: true,
                results: Vec::new(),
            });
        }

        let configured: Vec<&dyn Platform> = self
            .platforms
            .iter()
            .filter(|p| p.is_configured())
            .map(|p| p.as_ref())
            .collect();

        if configured.is_empty() {
            return Err(TrendcastError::InvalidInput(
                "No platforms are configured for posting".to_string(),
            ));
        }

        let futures: Vec<_> = configured
            .iter()
            .map(|platform| async move {
                let platform_name = platform.name().to_string();

                if let Err(e) = platform.validate_content(&item.text) {
                    warn!("Content rejected by {}: {}", platform_name, e);
                    return PlatformOutcome {
                        platform: platform_name,
                        success: false,
                        post_id: None,
                        error: Some(e.to_string()),
                    };
                }

                match post_with_retry(*platform, &item.text, item.media.as_ref()).await {
                    Ok(post_id) => {
                        info!("Posted to {}: {}", platform_name, post_id);
                        PlatformOutcome {
                            platform: platform_name,
                            success: true,
                            post_id: Some(post_id),
                            error: None,
                        }
                    }
                    Err(e) => {
                        warn!("Failed to post to {}: {}", platform_name, e);
                        PlatformOutcome {
                            platform: platform_name,
                            success: false,
                            post_id: None,
                            error: Some(e.to_string()),
                        }
                    }
                }
            })
            .collect();

        let results = join_all(futures).await;

        let outcome = PublishOutcome {
            user_id: item.user_id,
            item_id: item.item_id,
            skipped_duplicate: false,
            results,
        };

        if outcome.any_success() {
            let platforms = outcome
                .results
                .iter()
                .filter(|r| r.success)
                .map(|r| r.platform.as_str())
                .collect::<Vec<_>>()
                .join(",");
            self.dedup.record(&item.text, media_id, &platforms).await?;
            self.db.mark_done(item.user_id, item.item_id).await?;
        } else {
            warn!(
                user_id = item.user_id,
                item_id = item.item_id,
                "All platforms failed; item stays queued"
            );
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platforms::mock::MockPlatform;
    use tempfile::TempDir;

    async fn test_db(dir: &TempDir) -> Database {
        let path = dir.path().join("plan.db");
        Database::new(path.to_str().unwrap()).await.unwrap()
    }

    fn item(user_id: i64, item_id: i64, text: &str, slot: &str) -> PlanItem {
        PlanItem::new(user_id, item_id, text, slot.parse().unwrap())
    }

    #[tokio::test]
    async fn test_publish_marks_done_on_success() {
        let dir = TempDir::new().unwrap();
        let db = test_db(&dir).await;
        let dedup = Dedup::new(db.clone());

        let plan_item = item(1, 1, "morning update", "09:00");
        db.insert_item(&plan_item).await.unwrap();

        let poster = Poster::new(
            db.clone(),
            dedup,
            vec![Box::new(MockPlatform::success("mock"))],
        );
        let outcome = poster.publish(&plan_item).await.unwrap();

        assert!(outcome.any_success());
        assert!(!outcome.skipped_duplicate);
        assert!(db.get_item(1, 1).await.unwrap().unwrap().done);
    }

    #[tokio::test]
    async fn test_publish_leaves_item_queued_when_all_fail() {
        let dir = TempDir::new().unwrap();
        let db = test_db(&dir).await;
        let dedup = Dedup::new(db.clone());

        let plan_item = item(1, 1, "morning update", "09:00");
        db.insert_item(&plan_item).await.unwrap();

        let poster = Poster::new(
            db.clone(),
            dedup,
            vec![Box::new(MockPlatform::post_failure("mock", "flood wait"))],
        );
        let outcome = poster.publish(&plan_item).await.unwrap();

        assert!(!outcome.any_success());
        assert_eq!(outcome.results.len(), 1);
        assert!(!db.get_item(1, 1).await.unwrap().unwrap().done);
    }

    #[tokio::test]
    async fn test_publish_partial_success_marks_done() {
        let dir = TempDir::new().unwrap();
        let db = test_db(&dir).await;
        let dedup = Dedup::new(db.clone());

        let plan_item = item(1, 1, "midday update", "14:00");
        db.insert_item(&plan_item).await.unwrap();

        let poster = Poster::new(
            db.clone(),
            dedup,
            vec![
                Box::new(MockPlatform::success("alpha")),
                Box::new(MockPlatform::post_failure("beta", "down")),
            ],
        );
        let outcome = poster.publish(&plan_item).await.unwrap();

        assert!(outcome.any_success());
        assert_eq!(outcome.results.len(), 2);
        assert!(db.get_item(1, 1).await.unwrap().unwrap().done);
    }

    #[tokio::test]
    async fn test_publish_skips_recent_duplicate() {
        let dir = TempDir::new().unwrap();
        let db = test_db(&dir).await;
        let dedup = Dedup::new(db.clone());

        dedup.record("evening recap", None, "mock").await.unwrap();

        let plan_item = item(1, 7, "evening recap", "22:00");
        db.insert_item(&plan_item).await.unwrap();

        let mock = MockPlatform::success("mock");
        let posted = mock.config().posted.clone();

        let poster = Poster::new(db.clone(), dedup, vec![Box::new(mock)]);
        let outcome = poster.publish(&plan_item).await.unwrap();

        assert!(outcome.skipped_duplicate);
        assert!(outcome.results.is_empty());
        // Marked done without posting anything
        assert!(db.get_item(1, 7).await.unwrap().unwrap().done);
        assert!(posted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_publish_without_configured_platforms_errors() {
        let dir = TempDir::new().unwrap();
        let db = test_db(&dir).await;
        let dedup = Dedup::new(db.clone());

        let plan_item = item(1, 1, "unroutable", "09:00");
        let poster = Poster::new(
            db,
            dedup,
            vec![Box::new(MockPlatform::unconfigured("mock"))],
        );

        assert!(poster.publish(&plan_item).await.is_err());
    }

    #[tokio::test]
    async fn test_process_due_publishes_only_due_items() {
        let dir = TempDir::new().unwrap();
        let db = test_db(&dir).await;
        let dedup = Dedup::new(db.clone());

        db.insert_item(&item(1, 1, "first slot", "09:00")).await.unwrap();
        db.insert_item(&item(1, 2, "second slot", "14:00")).await.unwrap();
        db.insert_item(&item(1, 3, "third slot", "22:00")).await.unwrap();

        let mock = MockPlatform::success("mock");
        let posted = mock.config().posted.clone();

        let poster = Poster::new(db.clone(), dedup, vec![Box::new(mock)]);
        let now: HhMm = "14:00".parse().unwrap();
        let outcomes = poster.process_due(1, &now).await.unwrap();

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| o.any_success()));

        let texts: Vec<String> = posted.lock().unwrap().iter().map(|p| p.0.clone()).collect();
        assert_eq!(texts, vec!["first slot", "second slot"]);

        assert!(!db.get_item(1, 3).await.unwrap().unwrap().done);
    }

    #[tokio::test]
    async fn test_process_due_continues_past_failing_items() {
        let dir = TempDir::new().unwrap();
        let db = test_db(&dir).await;
        let dedup = Dedup::new(db.clone());

        db.insert_item(&item(1, 1, "first slot", "09:00")).await.unwrap();
        db.insert_item(&item(1, 2, "second slot", "10:00")).await.unwrap();

        // Publishing each item errors outright, but the batch still runs to
        // the end and both items stay pending.
        let poster = Poster::new(
            db.clone(),
            dedup,
            vec![Box::new(MockPlatform::unconfigured("mock"))],
        );
        let now: HhMm = "12:00".parse().unwrap();
        let outcomes = poster.process_due(1, &now).await.unwrap();

        assert!(outcomes.is_empty());
        assert!(!db.get_item(1, 1).await.unwrap().unwrap().done);
        assert!(!db.get_item(1, 2).await.unwrap().unwrap().done);
    }

    #[tokio::test]
    async fn test_process_due_empty_queue() {
        let dir = TempDir::new().unwrap();
        let db = test_db(&dir).await;
        let dedup = Dedup::new(db.clone());

        let poster = Poster::new(db, dedup, vec![Box::new(MockPlatform::success("mock"))]);
        let now: HhMm = "09:00".parse().unwrap();
        assert!(poster.process_due(1, &now).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_authenticate_all_skips_unconfigured() {
        let dir = TempDir::new().unwrap();
        let db = test_db(&dir).await;
        let dedup = Dedup::new(db.clone());

        let mut poster = Poster::new(
            db,
            dedup,
            vec![
                Box::new(MockPlatform::success("alpha")),
                Box::new(MockPlatform::unconfigured("beta")),
            ],
        );

        poster.authenticate_all().await.unwrap();
        assert_eq!(poster.configured_platforms(), vec!["alpha"]);
    }

    #[tokio::test]
    async fn test_authenticate_all_propagates_failure() {
        let dir = TempDir::new().unwrap();
        let db = test_db(&dir).await;
        let dedup = Dedup::new(db.clone());

        let mut poster = Poster::new(
            db,
            dedup,
            vec![Box::new(MockPlatform::auth_failure("mock", "bad token"))],
        );

        assert!(poster.authenticate_all().await.is_err());
    }
}
