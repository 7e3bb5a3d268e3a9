//! Mock platform for tests and dry runs
//!
//! Configurable success, failure, and delay behavior so multi-platform
//! publishing logic can be exercised without credentials or network.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

use crate::error::{PlatformError, Result};
use crate::platforms::Platform;
use crate::types::MediaRef;

#[derive(Debug, Clone)]
pub struct MockConfig {
    pub name: String,
    pub auth_succeeds: bool,
    pub post_succeeds: bool,
    pub auth_error: Option<String>,
    pub post_error: Option<String>,
    /// Simulated network latency.
    pub delay: Duration,
    pub character_limit: Option<usize>,
    pub is_configured: bool,
    pub auth_call_count: Arc<Mutex<usize>>,
    pub post_call_count: Arc<Mutex<usize>>,
    /// Everything posted, with its media reference, for verification.
    pub posted: Arc<Mutex<Vec<(String, Option<MediaRef>)>>>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            name: "mock".to_string(),
            auth_succeeds: true,
            post_succeeds: true,
            auth_error: None,
            post_error: None,
            delay: Duration::from_millis(0),
            character_limit: None,
            is_configured: true,
            auth_call_count: Arc::new(Mutex::new(0)),
            post_call_count: Arc::new(Mutex::new(0)),
            posted: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

pub struct MockPlatform {
    config: MockConfig,
    authenticated: bool,
}

impl MockPlatform {
    pub fn new(config: MockConfig) -> Self {
        Self {
            config,
            authenticated: false,
        }
    }

    /// A mock that always succeeds.
    pub fn success(name: &str) -> Self {
        Self::new(MockConfig {
            name: name.to_string(),
            ..Default::default()
        })
    }

    /// A mock whose `authenticate` fails.
    pub fn auth_failure(name: &str, error: &str) -> Self {
        Self::new(MockConfig {
            name: name.to_string(),
            auth_succeeds: false,
            auth_error: Some(error.to_string()),
            ..Default::default()
        })
    }

    /// A mock whose `post` fails.
    pub fn post_failure(name: &str, error: &str) -> Self {
        Self::new(MockConfig {
            name: name.to_string(),
            post_succeeds: false,
            post_error: Some(error.to_string()),
            ..Default::default()
        })
    }

    /// A mock that is not configured at all.
    pub fn unconfigured(name: &str) -> Self {
        Self::new(MockConfig {
            name: name.to_string(),
            is_configured: false,
            ..Default::default()
        })
    }

    pub fn config(&self) -> &MockConfig {
        &self.config
    }
}

#[async_trait]
impl Platform for MockPlatform {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn is_configured(&self) -> bool {
        self.config.is_configured
    }

    fn character_limit(&self) -> Option<usize> {
        self.config.character_limit
    }

    async fn authenticate(&mut self) -> Result<()> {
        sleep(self.config.delay).await;
        *self.config.auth_call_count.lock().unwrap() += 1;

        if self.config.auth_succeeds {
            self.authenticated = true;
            Ok(())
        } else {
            let message = self
                .config
                .auth_error
                .clone()
                .unwrap_or_else(|| "Mock authentication failure".to_string());
            Err(PlatformError::Authentication(message).into())
        }
    }

    async fn post(&self, text: &str, media: Option<&MediaRef>) -> Result<String> {
        sleep(self.config.delay).await;
        let count = {
            let mut guard = self.config.post_call_count.lock().unwrap();
            *guard += 1;
            *guard
        };

        if self.config.post_succeeds {
            self.config
                .posted
                .lock()
                .unwrap()
                .push((text.to_string(), media.cloned()));
            Ok(format!("{}-post-{}", self.config.name, count))
        } else {
            let message = self
                .config
                .post_error
                .clone()
                .unwrap_or_else(|| "Mock posting failure".to_string());
            Err(PlatformError::Posting(message).into())
        }
    }
}
