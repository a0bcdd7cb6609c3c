//! Domain services of quill: accounts and reset tokens, the follow/like graph
//! with its notification fan-out, blogs with comments, and direct messages.
//!
//! Every operation takes the acting username as a plain argument. Sessions,
//! HTTP and rendering belong to the caller.

pub mod accounts;
pub mod clock;
pub mod config;
pub mod content;
pub mod credentials;
pub mod error;
pub mod messaging;
pub mod notifications;
pub mod sanitize;
pub mod social;
pub mod storage;
pub mod validation;

mod records;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use quill_db::Database;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Config, HashParams};
pub use content::ImageUpload;
pub use error::{Error, ErrorKind, Result};
pub use storage::{DiskStore, FileStore, MemoryStore};

/// The service facade. Cheap to share behind an `Arc`; all state lives in the
/// database and the file store.
pub struct Core {
    db: Arc<Database>,
    clock: Arc<dyn Clock>,
    files: Arc<dyn FileStore>,
    hasher: credentials::Hasher,
    config: Config,
}

impl Core {
    pub fn new(
        db: Arc<Database>,
        clock: Arc<dyn Clock>,
        files: Arc<dyn FileStore>,
        config: Config,
    ) -> anyhow::Result<Self> {
        let hasher = credentials::Hasher::new(config.hash)?;
        Ok(Self {
            db,
            clock,
            files,
            hasher,
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}
