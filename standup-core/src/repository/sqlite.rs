//! SQLite implementation of `ReportRepository`.
//!
//! This provides persistent storage that survives service restarts.
//!
//! # Schema Versioning
//!
//! The database has a `schema_version` table that tracks the schema version.
//! When the schema needs to change, increment `CURRENT_SCHEMA_VERSION` and add
//! a migration in `run_migrations()`. Migrations run sequentially from the
//! current version to the target version.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{error, warn};

use super::{ReportRepository, RepositoryError};
use crate::report::{Report, UserId};

/// Current schema version. Increment this when making schema changes and add
/// corresponding migration logic in `run_migrations()`.
const CURRENT_SCHEMA_VERSION: i64 = 1;

/// SQLite-backed report repository.
///
/// Stores reports in a SQLite database for persistence across restarts.
/// Uses `tokio::task::spawn_blocking` to run synchronous rusqlite operations
/// without blocking the async runtime.
pub struct SqliteRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteRepository {
    /// Create a new SQLite repository at the given path.
    ///
    /// Creates the database file and schema if they don't exist.
    /// Runs any pending migrations if the database exists but has an older schema.
    ///
    /// # Durability
    ///
    /// The database is configured with:
    /// - `journal_mode = WAL` for better concurrency and crash safety
    /// - `synchronous = FULL` for maximum durability (survives OS/power failure)
    /// - `busy_timeout = 5000ms` to handle concurrent access gracefully
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, RepositoryError> {
        let path_ref = path.as_ref();

        // Ensure parent directory exists (unless it's :memory: or empty path)
        let path_str = path_ref.to_string_lossy();
        if path_str != ":memory:" && !path_str.is_empty() {
            if let Some(parent) = path_ref.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        RepositoryError::storage(
                            "create database directory",
                            format!("{}: {}", parent.display(), e),
                        )
                    })?;

                    // Restrict the state directory (Unix only). This also covers
                    // the WAL/SHM files SQLite creates with default umask permissions.
                    #[cfg(unix)]
                    {
                        use std::os::unix::fs::PermissionsExt;
                        let dir_permissions = std::fs::Permissions::from_mode(0o700);
                        if let Err(e) = std::fs::set_permissions(parent, dir_permissions) {
                            warn!(
                                "Failed to set restrictive permissions on state directory: {}",
                                e
                            );
                        }
                    }
                }
            }
        }

        let conn = Connection::open(path_ref)
            .map_err(|e| RepositoryError::storage("open database", e.to_string()))?;

        // The database contains member-written report text; keep it private.
        #[cfg(unix)]
        if path_str != ":memory:" && !path_str.is_empty() {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            if let Err(e) = std::fs::set_permissions(path_ref, permissions) {
                warn!(
                    "Failed to set restrictive permissions on database file: {}",
                    e
                );
            }
        }

        // Configure durability settings.
        // We must verify WAL mode was actually enabled - SQLite can silently keep
        // DELETE mode on some filesystems (e.g., network filesystems that don't
        // support shared memory), which would violate our durability/concurrency
        // assumptions.
        //
        // For in-memory databases (:memory:), SQLite returns "memory" as the
        // journal mode, which is expected - in-memory databases are ephemeral
        // by design.
        let is_in_memory = path_str == ":memory:";
        let journal_mode: String = conn
            .query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))
            .map_err(|e| RepositoryError::storage("set journal_mode", e.to_string()))?;

        let journal_mode_ok = journal_mode.eq_ignore_ascii_case("wal")
            || (is_in_memory && journal_mode.eq_ignore_ascii_case("memory"));

        if !journal_mode_ok {
            return Err(RepositoryError::storage(
                "configure journal_mode",
                format!(
                    "Failed to enable WAL mode: SQLite returned '{}' instead of 'wal'. \
                     This can happen on filesystems that don't support shared memory \
                     (e.g., some network filesystems). The database requires WAL mode \
                     for durability and concurrency guarantees.",
                    journal_mode
                ),
            ));
        }

        conn.execute_batch(
            r#"
            PRAGMA synchronous = FULL;
            PRAGMA busy_timeout = 5000;
            "#,
        )
        .map_err(|e| RepositoryError::storage("configure pragmas", e.to_string()))?;

        // Create schema version table if it doesn't exist
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS schema_version (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                version INTEGER NOT NULL
            );
            "#,
        )
        .map_err(|e| RepositoryError::storage("create schema_version table", e.to_string()))?;

        // Get current version (0 if table is empty = fresh database)
        let current_version: i64 = conn
            .query_row(
                "SELECT version FROM schema_version WHERE id = 1",
                [],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| RepositoryError::storage("get schema version", e.to_string()))?
            .unwrap_or(0);

        Self::run_migrations(&conn, current_version)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run migrations from `from_version` to `CURRENT_SCHEMA_VERSION`.
    fn run_migrations(conn: &Connection, from_version: i64) -> Result<(), RepositoryError> {
        if from_version > CURRENT_SCHEMA_VERSION {
            return Err(RepositoryError::storage(
                "schema version",
                format!(
                    "Database schema version {} is newer than supported version {}. \
                     Please upgrade the application.",
                    from_version, CURRENT_SCHEMA_VERSION
                ),
            ));
        }

        if from_version == CURRENT_SCHEMA_VERSION {
            return Ok(());
        }

        // Migration from version 0 (fresh database) to version 1
        if from_version < 1 {
            conn.execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS reports (
                    user_id INTEGER PRIMARY KEY,
                    tasks_today TEXT NOT NULL,
                    blockers TEXT NOT NULL,
                    tasks_tomorrow TEXT NOT NULL,
                    created_at INTEGER NOT NULL
                );
                "#,
            )
            .map_err(|e| RepositoryError::storage("migration v1", e.to_string()))?;
        }

        // Update schema version
        conn.execute(
            "INSERT OR REPLACE INTO schema_version (id, version) VALUES (1, ?1)",
            params![CURRENT_SCHEMA_VERSION],
        )
        .map_err(|e| RepositoryError::storage("update schema version", e.to_string()))?;

        Ok(())
    }

    /// Create a new in-memory SQLite repository (for testing).
    pub fn new_in_memory() -> Result<Self, RepositoryError> {
        Self::new(":memory:")
    }
}

/// Convert a unix-seconds column value back to a timestamp.
///
/// Returns a corruption error for values outside chrono's representable
/// range, which would indicate a damaged row rather than anything this
/// code ever wrote.
fn secs_to_datetime(secs: i64) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::from_timestamp(secs, 0).ok_or_else(|| RepositoryError::corruption("created_at"))
}

type ReportRow = (i64, String, String, String, i64);

fn row_to_report(row: ReportRow) -> Result<Report, RepositoryError> {
    let (user_id, tasks_today, blockers, tasks_tomorrow, created_secs) = row;
    Ok(Report {
        user_id: UserId(user_id),
        tasks_today,
        blockers,
        tasks_tomorrow,
        created_at: secs_to_datetime(created_secs)?,
    })
}

/// Collect rows into reports, skipping corrupt rows with a warning so one
/// damaged record cannot take down a whole publish cycle.
fn collect_reports(
    rows: impl Iterator<Item = rusqlite::Result<ReportRow>>,
    operation: &'static str,
) -> Vec<Report> {
    let mut reports = Vec::new();
    for row in rows {
        let raw = match row {
            Ok(data) => data,
            Err(e) => {
                error!("Failed to read report row from SQLite in {}: {}", operation, e);
                continue;
            }
        };

        match row_to_report(raw) {
            Ok(report) => reports.push(report),
            Err(e) => {
                warn!(
                    "Skipping corrupt report row in {}: {}. \
                     This row may need manual investigation.",
                    operation, e
                );
            }
        }
    }

    reports.sort_by_key(|r| (r.created_at, r.user_id));
    reports
}

#[async_trait]
impl ReportRepository for SqliteRepository {
    async fn upsert(&self, report: Report) -> Result<(), RepositoryError> {
        let conn = self.conn.clone();
        let created_secs = report.created_at.timestamp();

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().unwrap();

            conn.execute(
                "INSERT INTO reports (user_id, tasks_today, blockers, tasks_tomorrow, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(user_id) DO UPDATE SET
                     tasks_today = excluded.tasks_today,
                     blockers = excluded.blockers,
                     tasks_tomorrow = excluded.tasks_tomorrow,
                     created_at = excluded.created_at",
                params![
                    report.user_id.0,
                    report.tasks_today,
                    report.blockers,
                    report.tasks_tomorrow,
                    created_secs
                ],
            )
            .map_err(|e| RepositoryError::storage("upsert", e.to_string()))?;

            Ok(())
        })
        .await
        .map_err(|e| RepositoryError::storage("upsert", e.to_string()))?
    }

    async fn list(&self) -> Result<Vec<Report>, RepositoryError> {
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().unwrap();

            let mut stmt = conn
                .prepare(
                    "SELECT user_id, tasks_today, blockers, tasks_tomorrow, created_at
                     FROM reports ORDER BY created_at, user_id",
                )
                .map_err(|e| RepositoryError::storage("list", e.to_string()))?;

            let rows = stmt
                .query_map([], |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, i64>(4)?,
                    ))
                })
                .map_err(|e| RepositoryError::storage("list", e.to_string()))?;

            Ok(collect_reports(rows, "list"))
        })
        .await
        .map_err(|e| RepositoryError::storage("list", e.to_string()))?
    }

    async fn take_all(&self) -> Result<Vec<Report>, RepositoryError> {
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().unwrap();

            // DELETE...RETURNING snapshots and clears in one statement, so a
            // report upserted after this point lands in the next cycle.
            let mut stmt = conn
                .prepare(
                    "DELETE FROM reports
                     RETURNING user_id, tasks_today, blockers, tasks_tomorrow, created_at",
                )
                .map_err(|e| RepositoryError::storage("take_all", e.to_string()))?;

            let rows = stmt
                .query_map([], |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, i64>(4)?,
                    ))
                })
                .map_err(|e| RepositoryError::storage("take_all", e.to_string()))?;

            Ok(collect_reports(rows, "take_all"))
        })
        .await
        .map_err(|e| RepositoryError::storage("take_all", e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn test_report(user_id: i64, seq: i64) -> Report {
        Report {
            user_id: UserId(user_id),
            tasks_today: format!("today {}", seq),
            blockers: format!("blockers {}", seq),
            tasks_tomorrow: format!("tomorrow {}", seq),
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
                + Duration::seconds(seq),
        }
    }

    #[tokio::test]
    async fn test_fresh_database_has_current_schema_version() {
        let repo = SqliteRepository::new_in_memory().unwrap();
        let version: i64 = {
            let conn = repo.conn.lock().unwrap();
            conn.query_row(
                "SELECT version FROM schema_version WHERE id = 1",
                [],
                |row| row.get(0),
            )
            .unwrap()
        };
        assert_eq!(version, CURRENT_SCHEMA_VERSION);
    }

    #[tokio::test]
    async fn test_upsert_then_list_round_trips() {
        let repo = SqliteRepository::new_in_memory().unwrap();
        repo.upsert(test_report(1, 0)).await.unwrap();

        let reports = repo.list().await.unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0], test_report(1, 0));
    }

    #[tokio::test]
    async fn test_upsert_replaces_existing_report_for_user() {
        let repo = SqliteRepository::new_in_memory().unwrap();
        repo.upsert(test_report(1, 0)).await.unwrap();
        repo.upsert(test_report(1, 7)).await.unwrap();

        let reports = repo.list().await.unwrap();
        assert_eq!(reports.len(), 1, "resubmission must replace, never append");
        assert_eq!(reports[0].tasks_today, "today 7");
    }

    #[tokio::test]
    async fn test_list_orders_by_submission_time() {
        let repo = SqliteRepository::new_in_memory().unwrap();
        repo.upsert(test_report(5, 2)).await.unwrap();
        repo.upsert(test_report(3, 0)).await.unwrap();
        repo.upsert(test_report(9, 1)).await.unwrap();

        let ids: Vec<i64> = repo
            .list()
            .await
            .unwrap()
            .iter()
            .map(|r| r.user_id.0)
            .collect();
        assert_eq!(ids, vec![3, 9, 5]);
    }

    #[tokio::test]
    async fn test_take_all_returns_everything_and_empties_store() {
        let repo = SqliteRepository::new_in_memory().unwrap();
        repo.upsert(test_report(1, 0)).await.unwrap();
        repo.upsert(test_report(2, 1)).await.unwrap();

        let taken = repo.take_all().await.unwrap();
        assert_eq!(taken.len(), 2);
        assert!(repo.list().await.unwrap().is_empty());
        assert!(repo.take_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_take_all_on_empty_store_is_empty() {
        let repo = SqliteRepository::new_in_memory().unwrap();
        assert!(repo.take_all().await.unwrap().is_empty());
    }

    /// A row with an out-of-range timestamp is skipped rather than failing
    /// the whole listing, so one damaged record cannot block publishing.
    #[tokio::test]
    async fn test_corrupt_created_at_row_is_skipped() {
        let repo = SqliteRepository::new_in_memory().unwrap();
        repo.upsert(test_report(1, 0)).await.unwrap();

        {
            let conn = repo.conn.lock().unwrap();
            conn.execute(
                "INSERT INTO reports (user_id, tasks_today, blockers, tasks_tomorrow, created_at)
                 VALUES (2, 'a', 'b', 'c', ?1)",
                params![i64::MAX],
            )
            .unwrap();
        }

        let reports = repo.list().await.unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].user_id, UserId(1));
    }
}
