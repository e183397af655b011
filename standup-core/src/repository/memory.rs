//! In-memory implementation of `ReportRepository`.
//!
//! Used by tests and by anything that wants store semantics without a
//! database file. All reports are lost on restart.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{ReportRepository, RepositoryError};
use crate::report::{Report, UserId};

/// In-memory report repository.
///
/// Stores reports in a `HashMap` keyed by user, protected by a `RwLock`.
pub struct InMemoryRepository {
    reports: RwLock<HashMap<UserId, Report>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self {
            reports: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn in_submission_order(reports: impl Iterator<Item = Report>) -> Vec<Report> {
    let mut out: Vec<Report> = reports.collect();
    out.sort_by_key(|r| (r.created_at, r.user_id));
    out
}

#[async_trait]
impl ReportRepository for InMemoryRepository {
    async fn upsert(&self, report: Report) -> Result<(), RepositoryError> {
        let mut reports = self.reports.write().await;
        reports.insert(report.user_id, report);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Report>, RepositoryError> {
        let reports = self.reports.read().await;
        Ok(in_submission_order(reports.values().cloned()))
    }

    async fn take_all(&self) -> Result<Vec<Report>, RepositoryError> {
        let mut reports = self.reports.write().await;
        Ok(in_submission_order(reports.drain().map(|(_, r)| r)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use proptest::prelude::*;

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
    async fn test_list_empty() {
        let repo = InMemoryRepository::new();
        assert!(repo.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upsert_then_list() {
        let repo = InMemoryRepository::new();
        repo.upsert(test_report(1, 0)).await.unwrap();

        let reports = repo.list().await.unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].user_id, UserId(1));
        assert_eq!(reports[0].tasks_today, "today 0");
    }

    #[tokio::test]
    async fn test_upsert_replaces_existing_report_for_user() {
        let repo = InMemoryRepository::new();
        repo.upsert(test_report(1, 0)).await.unwrap();
        repo.upsert(test_report(1, 1)).await.unwrap();

        let reports = repo.list().await.unwrap();
        assert_eq!(reports.len(), 1, "resubmission must replace, never append");
        assert_eq!(reports[0].tasks_today, "today 1");
    }

    #[tokio::test]
    async fn test_list_orders_by_submission_time() {
        let repo = InMemoryRepository::new();
        repo.upsert(test_report(5, 2)).await.unwrap();
        repo.upsert(test_report(3, 0)).await.unwrap();
        repo.upsert(test_report(9, 1)).await.unwrap();

        let reports = repo.list().await.unwrap();
        let ids: Vec<i64> = reports.iter().map(|r| r.user_id.0).collect();
        assert_eq!(ids, vec![3, 9, 5]);
    }

    #[tokio::test]
    async fn test_take_all_returns_everything_and_empties_store() {
        let repo = InMemoryRepository::new();
        repo.upsert(test_report(1, 0)).await.unwrap();
        repo.upsert(test_report(2, 1)).await.unwrap();

        let taken = repo.take_all().await.unwrap();
        assert_eq!(taken.len(), 2);
        assert!(repo.list().await.unwrap().is_empty());

        let second = repo.take_all().await.unwrap();
        assert!(second.is_empty());
    }

    // =========================================================================
    // Property-based tests
    // =========================================================================

    fn arb_text() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9 .,!?]{0,40}"
    }

    fn arb_submission() -> impl Strategy<Value = (i64, String, String, String)> {
        (1i64..50, arb_text(), arb_text(), arb_text())
    }

    proptest! {
        /// Property: after any sequence of upserts, the store contains exactly
        /// one report per distinct user, and it is the last one upserted.
        #[test]
        fn upsert_keeps_latest_report_per_user(submissions in proptest::collection::vec(arb_submission(), 0..40)) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            rt.block_on(async {
                let repo = InMemoryRepository::new();
                let base = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();

                let mut latest: HashMap<i64, String> = HashMap::new();
                for (seq, (user_id, today, blockers, tomorrow)) in submissions.iter().enumerate() {
                    let report = Report {
                        user_id: UserId(*user_id),
                        tasks_today: today.clone(),
                        blockers: blockers.clone(),
                        tasks_tomorrow: tomorrow.clone(),
                        created_at: base + Duration::seconds(seq as i64),
                    };
                    repo.upsert(report).await.unwrap();
                    latest.insert(*user_id, today.clone());
                }

                let stored = repo.list().await.unwrap();
                assert_eq!(stored.len(), latest.len());
                for report in &stored {
                    assert_eq!(&report.tasks_today, latest.get(&report.user_id.0).unwrap());
                }

                // take_all drains exactly what list reported
                let taken = repo.take_all().await.unwrap();
                assert_eq!(taken, stored);
                assert!(repo.list().await.unwrap().is_empty());
            });
        }
    }
}
