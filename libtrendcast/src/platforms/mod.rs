//! Platform abstraction and implementations
//!
//! One trait for every publishing target. Each implementation handles its
//! own authentication, content validation, and posting; the engine in
//! [`crate::poster`] only talks to the trait.

use async_trait::async_trait;

use crate::error::{PlatformError, Result};
use crate::types::MediaRef;

pub mod telegram;

// Available outside tests so integration tests and dry runs can use it.
pub mod mock;

/// Unified interface to a social publishing target.
#[async_trait]
pub trait Platform: Send + Sync {
    /// Stable lowercase platform name, used in logs and post history.
    fn name(&self) -> &str;

    /// Whether configuration is complete enough to attempt posting.
    fn is_configured(&self) -> bool;

    /// Platform character limit, if it has one.
    fn character_limit(&self) -> Option<usize> {
        None
    }

    /// Check content against platform constraints without posting it.
    fn validate_content(&self, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Err(PlatformError::Validation(format!(
                "{}: content is empty",
                self.name()
            ))
            .into());
        }
        if let Some(limit) = self.character_limit() {
            let len = text.chars().count();
            if len > limit {
                return Err(PlatformError::Validation(format!(
                    "{}: content is {} characters, limit is {}",
                    self.name(),
                    len,
                    limit
                ))
                .into());
            }
        }
        Ok(())
    }

    /// Establish a session; must be called before [`Platform::post`].
    async fn authenticate(&mut self) -> Result<()>;

    /// Publish and return the platform-specific post id.
    async fn post(&self, text: &str, media: Option<&MediaRef>) -> Result<String>;
}
