//! Admin account lifecycle for the super-admin panel.
//!
//! Lists are cached for a minute and dropped whenever an account changes.
//! Status changes are checked against the allowed transitions before any
//! request is made, and only one request per account may be in flight.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use aaa_core::admin::transition_notice;
use aaa_core::{AdminAction, AdminBuckets, AdminId, AdminStatus, AdminSummary, SummaryStats, TransitionError};
use moka::future::Cache;
use thiserror::Error;
use tracing::{info, instrument};

use crate::backend::{AccountApi, AnalyticsApi, BackendError};

/// How long admin lists and summary counts are reused.
pub const ADMIN_CACHE_TTL: Duration = Duration::from_secs(60);

/// Errors from account actions.
#[derive(Debug, Error)]
pub enum AccountError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// A request for this account has not finished yet.
    #[error("A request for admin {0} is already in progress")]
    Busy(AdminId),
}

/// Shared admin account state: list caches and the in-flight set.
///
/// Cheap to clone.
#[derive(Clone)]
pub struct AdminAccountService {
    inner: Arc<AdminAccountServiceInner>,
}

struct AdminAccountServiceInner {
    buckets: Cache<AdminStatus, Arc<Vec<AdminSummary>>>,
    summary: Cache<(), SummaryStats>,
    in_flight: Mutex<HashSet<AdminId>>,
}

/// Marks an account busy until dropped.
#[derive(Debug)]
pub struct InFlightGuard<'a> {
    set: &'a Mutex<HashSet<AdminId>>,
    id: AdminId,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}

impl Default for AdminAccountService {
    fn default() -> Self {
        Self::new(ADMIN_CACHE_TTL)
    }
}

impl AdminAccountService {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(AdminAccountServiceInner {
                buckets: Cache::builder()
                    .max_capacity(AdminStatus::ALL.len() as u64)
                    .time_to_live(ttl)
                    .build(),
                summary: Cache::builder().max_capacity(1).time_to_live(ttl).build(),
                in_flight: Mutex::new(HashSet::new()),
            }),
        }
    }

    /// All three status buckets, fetched in parallel on a cache miss.
    ///
    /// # Errors
    ///
    /// Returns the first backend error if any bucket fails to load.
    #[instrument(skip_all)]
    pub async fn buckets<A: AccountApi>(&self, api: &A) -> Result<AdminBuckets, BackendError> {
        let (pending, active, suspended) = tokio::try_join!(
            self.bucket(api, AdminStatus::PendingApproval),
            self.bucket(api, AdminStatus::Active),
            self.bucket(api, AdminStatus::Suspended),
        )?;

        Ok(AdminBuckets::from_lists(
            Vec::clone(&pending),
            Vec::clone(&active),
            Vec::clone(&suspended),
        ))
    }

    async fn bucket<A: AccountApi>(
        &self,
        api: &A,
        status: AdminStatus,
    ) -> Result<Arc<Vec<AdminSummary>>, BackendError> {
        if let Some(cached) = self.inner.buckets.get(&status).await {
            return Ok(cached);
        }

        let admins = Arc::new(api.list_admins(Some(status)).await?);
        self.inner.buckets.insert(status, Arc::clone(&admins)).await;
        Ok(admins)
    }

    /// The account's status as the backend has it now, bypassing the cache.
    ///
    /// # Errors
    ///
    /// Returns the backend error if any bucket fails to load.
    pub async fn current_status<A: AccountApi>(
        &self,
        api: &A,
        id: AdminId,
    ) -> Result<Option<AdminStatus>, BackendError> {
        self.invalidate().await;
        let buckets = self.buckets(api).await?;
        Ok(buckets.find(id).map(|a| a.status))
    }

    /// Dashboard summary counts.
    ///
    /// # Errors
    ///
    /// Returns the backend error on a cache miss that fails to load.
    #[instrument(skip_all)]
    pub async fn summary<A: AnalyticsApi>(&self, api: &A) -> Result<SummaryStats, BackendError> {
        if let Some(stats) = self.inner.summary.get(&()).await {
            return Ok(stats);
        }
        let stats = api.summary_stats().await?;
        self.inner.summary.insert((), stats).await;
        Ok(stats)
    }

    /// Accounts with a request in flight.
    #[must_use]
    pub fn busy_ids(&self) -> HashSet<AdminId> {
        self.inner
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Claim an account for one request.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::Busy` if another request holds it.
    pub fn begin(&self, id: AdminId) -> Result<InFlightGuard<'_>, AccountError> {
        let inserted = self
            .inner
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id);
        if inserted {
            Ok(InFlightGuard {
                set: &self.inner.in_flight,
                id,
            })
        } else {
            Err(AccountError::Busy(id))
        }
    }

    /// Apply a status action to an account currently in `current`.
    ///
    /// Returns the notice to show. Disallowed actions fail before any
    /// request is made.
    ///
    /// # Errors
    ///
    /// Returns `AccountError` if the action is not allowed, the account is
    /// busy, or the backend call fails.
    #[instrument(skip_all, fields(admin_id = %id, from = %current, action = %action))]
    pub async fn apply<A: AccountApi>(
        &self,
        api: &A,
        id: AdminId,
        current: AdminStatus,
        action: AdminAction,
    ) -> Result<String, AccountError> {
        let target = current.transition(action)?;
        let _guard = self.begin(id)?;

        api.update_admin_status(id, target).await?;
        info!(to = %target, "Admin status changed");

        self.invalidate().await;
        Ok(transition_notice(target))
    }

    /// Delete an account. Does nothing unless `confirmed`.
    ///
    /// # Errors
    ///
    /// Returns `AccountError` if the account is busy or the backend call fails.
    #[instrument(skip(self, api), fields(admin_id = %id))]
    pub async fn delete<A: AccountApi>(
        &self,
        api: &A,
        id: AdminId,
        confirmed: bool,
    ) -> Result<bool, AccountError> {
        if !confirmed {
            return Ok(false);
        }
        let _guard = self.begin(id)?;

        api.delete_admin(id).await?;
        info!("Admin deleted");

        self.invalidate().await;
        Ok(true)
    }

    /// Drop cached admin lists so the next view re-fetches every bucket.
    pub async fn invalidate(&self) {
        self.inner.buckets.invalidate_all();
        self.inner.buckets.run_pending_tasks().await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;

    #[derive(Default)]
    struct FakeAccounts {
        admins: Mutex<Vec<AdminSummary>>,
        list_calls: AtomicUsize,
        update_calls: AtomicUsize,
        delete_calls: AtomicUsize,
        summary_calls: AtomicUsize,
    }

    impl FakeAccounts {
        fn with(admins: Vec<AdminSummary>) -> Self {
            Self {
                admins: Mutex::new(admins),
                ..Self::default()
            }
        }
    }

    impl AccountApi for FakeAccounts {
        // Ignores the filter, like the real endpoint.
        async fn list_admins(&self, _status: Option<AdminStatus>) -> Result<Vec<AdminSummary>, BackendError> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.admins.lock().unwrap().clone())
        }

        async fn update_admin_status(&self, id: AdminId, status: AdminStatus) -> Result<(), BackendError> {
            self.update_calls.fetch_add(1, Ordering::SeqCst);
            let mut admins = self.admins.lock().unwrap();
            let admin = admins
                .iter_mut()
                .find(|a| a.id == id)
                .ok_or_else(|| BackendError::NotFound("User not found".to_string()))?;
            admin.status = status;
            Ok(())
        }

        async fn delete_admin(&self, id: AdminId) -> Result<(), BackendError> {
            self.delete_calls.fetch_add(1, Ordering::SeqCst);
            self.admins.lock().unwrap().retain(|a| a.id != id);
            Ok(())
        }
    }

    impl AnalyticsApi for FakeAccounts {
        async fn summary_stats(&self) -> Result<SummaryStats, BackendError> {
            self.summary_calls.fetch_add(1, Ordering::SeqCst);
            Ok(SummaryStats {
                inquiries: 3,
                ..SummaryStats::default()
            })
        }
    }

    fn admin(id: i64, status: &str) -> AdminSummary {
        serde_json::from_value(json!({
            "id": id,
            "email": format!("admin{id}@aaa-as.co.uk"),
            "status": status,
            "created_at": "2025-01-10T09:00:00Z",
        }))
        .unwrap()
    }

    fn fake() -> FakeAccounts {
        FakeAccounts::with(vec![
            admin(1, "pending_approval"),
            admin(2, "active"),
            admin(3, "suspended"),
            admin(4, "active"),
        ])
    }

    #[tokio::test]
    async fn test_buckets_refilter_each_status() {
        let api = fake();
        let service = AdminAccountService::default();

        let buckets = service.buckets(&api).await.unwrap();
        assert_eq!(buckets.pending_approval.len(), 1);
        assert_eq!(buckets.active.len(), 2);
        assert_eq!(buckets.suspended.len(), 1);
        assert_eq!(api.list_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_buckets_are_cached_until_a_transition() {
        let api = fake();
        let service = AdminAccountService::default();

        service.buckets(&api).await.unwrap();
        service.buckets(&api).await.unwrap();
        assert_eq!(api.list_calls.load(Ordering::SeqCst), 3);

        let notice = service
            .apply(&api, AdminId::new(1), AdminStatus::PendingApproval, AdminAction::Approve)
            .await
            .unwrap();
        assert_eq!(notice, "Admin activated");

        let buckets = service.buckets(&api).await.unwrap();
        assert_eq!(api.list_calls.load(Ordering::SeqCst), 6);
        assert!(buckets.pending_approval.is_empty());
        assert_eq!(buckets.active.len(), 3);
    }

    #[tokio::test]
    async fn test_current_status_ignores_stale_cache() {
        let api = fake();
        let service = AdminAccountService::default();
        service.buckets(&api).await.unwrap();

        // Moved elsewhere after the lists were cached.
        api.admins.lock().unwrap()[1].status = AdminStatus::Suspended;

        let current = service.current_status(&api, AdminId::new(2)).await.unwrap();
        assert_eq!(current, Some(AdminStatus::Suspended));
        assert_eq!(api.list_calls.load(Ordering::SeqCst), 6);
        assert_eq!(service.current_status(&api, AdminId::new(99)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_suspend_notice_names_bucket() {
        let api = fake();
        let service = AdminAccountService::default();
        let notice = service
            .apply(&api, AdminId::new(2), AdminStatus::Active, AdminAction::Suspend)
            .await
            .unwrap();
        assert_eq!(notice, "Admin moved to Suspended list");
    }

    #[tokio::test]
    async fn test_disallowed_transition_makes_no_call() {
        let api = fake();
        let service = AdminAccountService::default();

        let err = service
            .apply(&api, AdminId::new(2), AdminStatus::Active, AdminAction::Reinstate)
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::Transition(TransitionError::NotAllowed { .. })));

        let err = service
            .apply(&api, AdminId::new(2), AdminStatus::Active, AdminAction::Delete)
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::Transition(TransitionError::NotAStatusChange)));
        assert_eq!(api.update_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_in_flight_is_tracked_per_id() {
        let api = fake();
        let service = AdminAccountService::default();

        let guard = service.begin(AdminId::new(1)).unwrap();
        assert!(service.busy_ids().contains(&AdminId::new(1)));

        let err = service
            .apply(&api, AdminId::new(1), AdminStatus::PendingApproval, AdminAction::Approve)
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::Busy(id) if id == AdminId::new(1)));

        // A different account is not blocked.
        service
            .apply(&api, AdminId::new(3), AdminStatus::Suspended, AdminAction::Reinstate)
            .await
            .unwrap();

        drop(guard);
        assert!(service.busy_ids().is_empty());
        service
            .apply(&api, AdminId::new(1), AdminStatus::PendingApproval, AdminAction::Approve)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_delete_requires_confirmation() {
        let api = fake();
        let service = AdminAccountService::default();

        assert!(!service.delete(&api, AdminId::new(4), false).await.unwrap());
        assert_eq!(api.delete_calls.load(Ordering::SeqCst), 0);

        assert!(service.delete(&api, AdminId::new(4), true).await.unwrap());
        assert_eq!(api.delete_calls.load(Ordering::SeqCst), 1);
        assert!(service.busy_ids().is_empty());
    }

    #[tokio::test]
    async fn test_summary_is_cached() {
        let api = fake();
        let service = AdminAccountService::default();
        assert_eq!(service.summary(&api).await.unwrap().inquiries, 3);
        service.summary(&api).await.unwrap();
        assert_eq!(api.summary_calls.load(Ordering::SeqCst), 1);
    }
}
