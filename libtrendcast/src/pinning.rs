//! Media pinning
//!
//! The queue only stores opaque content addresses; this is the seam to
//! whatever service actually holds the bytes. [`LocalPinner`] is the
//! filesystem implementation: content-addressed files under one directory,
//! the address being the SHA-256 of the bytes.

use std::path::PathBuf;

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::error::{Result, TrendcastError};

/// Stores media bytes somewhere durable and returns a content address.
#[async_trait]
pub trait MediaPinner: Send + Sync {
    async fn pin(&self, bytes: &[u8]) -> Result<String>;
}

pub struct LocalPinner {
    root: PathBuf,
}

impl LocalPinner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, address: &str) -> PathBuf {
        self.root.join(address)
    }
}

#[async_trait]
impl MediaPinner for LocalPinner {
    async fn pin(&self, bytes: &[u8]) -> Result<String> {
        if bytes.is_empty() {
            return Err(TrendcastError::Media(
                "Refusing to pin empty content".to_string(),
            ));
        }

        let address = hex::encode(Sha256::digest(bytes));
        let target = self.path_for(&address);

        std::fs::create_dir_all(&self.root)
            .map_err(|e| TrendcastError::Media(format!("Cannot create {}: {}", self.root.display(), e)))?;

        // Content-addressed, so an existing file is already the right bytes.
        if !target.exists() {
            std::fs::write(&target, bytes)
                .map_err(|e| TrendcastError::Media(format!("Cannot write {}: {}", target.display(), e)))?;
        }

        Ok(address)
    }
}
