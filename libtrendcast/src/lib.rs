//! Trendcast - scheduled social posting toolkit
//!
//! This library provides core functionality for maintaining a per-user
//! plan of scheduled posts in SQLite and publishing the due slice of the
//! plan to social platforms.

pub mod config;
pub mod db;
pub mod dedup;
pub mod error;
pub mod generate;
pub mod logging;
pub mod pinning;
pub mod platforms;
pub mod poster;
pub mod timeslot;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use db::{Database, QueueStats};
pub use dedup::Dedup;
pub use error::{Result, TrendcastError};
pub use poster::{Poster, PublishOutcome};
pub use timeslot::HhMm;
pub use types::{MediaRef, PlanItem};
