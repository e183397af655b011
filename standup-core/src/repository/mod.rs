//! Repository abstraction for report persistence.
//!
//! This module defines the `ReportRepository` trait that abstracts storage
//! of completed daily reports. Implementations can provide different
//! backends (in-memory, SQLite, etc.).

mod memory;
mod sqlite;

pub use memory::InMemoryRepository;
pub use sqlite::SqliteRepository;

use std::fmt;

use async_trait::async_trait;

use crate::report::Report;

/// Errors from a repository backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// The storage backend failed to perform an operation.
    Storage { operation: String, message: String },
    /// Persisted data could not be interpreted.
    Corruption { what: String },
}

impl RepositoryError {
    pub fn storage(operation: &str, message: impl Into<String>) -> Self {
        RepositoryError::Storage {
            operation: operation.to_string(),
            message: message.into(),
        }
    }

    pub fn corruption(what: &str) -> Self {
        RepositoryError::Corruption {
            what: what.to_string(),
        }
    }
}

impl fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepositoryError::Storage { operation, message } => {
                write!(f, "storage error during {}: {}", operation, message)
            }
            RepositoryError::Corruption { what } => {
                write!(f, "corrupt {} in database", what)
            }
        }
    }
}

impl std::error::Error for RepositoryError {}

/// Repository trait for persisting daily reports.
///
/// The store holds at most one report per user; `upsert` replaces any
/// existing report for the same user. Publishing consumes the store via
/// `take_all`, which snapshots and clears in a single atomic step so a
/// report submitted mid-publish is kept for the next cycle instead of
/// being deleted unseen.
#[async_trait]
pub trait ReportRepository: Send + Sync {
    /// Insert a report, replacing any existing report for the same user.
    async fn upsert(&self, report: Report) -> Result<(), RepositoryError>;

    /// All stored reports, ordered by submission time (then user id).
    async fn list(&self) -> Result<Vec<Report>, RepositoryError>;

    /// Atomically remove and return all stored reports, in `list` order.
    async fn take_all(&self) -> Result<Vec<Report>, RepositoryError>;
}
