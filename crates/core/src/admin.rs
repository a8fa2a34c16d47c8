//! Admin accounts as seen by the super-admin panel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{AdminId, AdminRole, AdminStatus};

/// Pending bucket size above which the panel flags a backlog.
pub const PENDING_HIGH_LOAD_THRESHOLD: usize = 5;

/// An admin account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminSummary {
    pub id: AdminId,
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    pub status: AdminStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub admin_type: Option<AdminRole>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl AdminSummary {
    /// "First Last", or the email when neither name is set.
    #[must_use]
    pub fn display_name(&self) -> String {
        let full = self.full_name();
        if full.is_empty() {
            self.email.clone()
        } else {
            full
        }
    }

    fn full_name(&self) -> String {
        [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Case-insensitive match on email, first name, last name, or full name.
    #[must_use]
    pub fn matches_search(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        let contains = |field: &str| field.to_lowercase().contains(&needle);
        contains(&self.email)
            || self.first_name.as_deref().is_some_and(contains)
            || self.last_name.as_deref().is_some_and(contains)
            || contains(&self.full_name())
    }
}

/// Admin accounts grouped by status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminBuckets {
    pub pending_approval: Vec<AdminSummary>,
    pub active: Vec<AdminSummary>,
    pub suspended: Vec<AdminSummary>,
}

impl AdminBuckets {
    /// Build buckets from three per-status fetches.
    ///
    /// Each list is filtered again by its own status: the backend's admin
    /// list endpoint returns every admin regardless of the filter it is given.
    #[must_use]
    pub fn from_lists(
        pending_approval: Vec<AdminSummary>,
        active: Vec<AdminSummary>,
        suspended: Vec<AdminSummary>,
    ) -> Self {
        let only = |list: Vec<AdminSummary>, status: AdminStatus| {
            list.into_iter()
                .filter(|admin| admin.status == status)
                .collect()
        };
        Self {
            pending_approval: only(pending_approval, AdminStatus::PendingApproval),
            active: only(active, AdminStatus::Active),
            suspended: only(suspended, AdminStatus::Suspended),
        }
    }

    #[must_use]
    pub fn get(&self, status: AdminStatus) -> &[AdminSummary] {
        match status {
            AdminStatus::PendingApproval => &self.pending_approval,
            AdminStatus::Active => &self.active,
            AdminStatus::Suspended => &self.suspended,
        }
    }

    /// Accounts in a bucket matching a search query.
    #[must_use]
    pub fn search(&self, status: AdminStatus, query: &str) -> Vec<&AdminSummary> {
        self.get(status)
            .iter()
            .filter(|admin| admin.matches_search(query))
            .collect()
    }

    #[must_use]
    pub fn find(&self, id: AdminId) -> Option<&AdminSummary> {
        AdminStatus::ALL
            .into_iter()
            .flat_map(|status| self.get(status))
            .find(|admin| admin.id == id)
    }

    #[must_use]
    pub fn kpis(&self) -> AdminKpis {
        AdminKpis {
            pending: self.pending_approval.len(),
            active: self.active.len(),
            suspended: self.suspended.len(),
        }
    }
}

/// Account counts shown on the super-admin cards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AdminKpis {
    pub pending: usize,
    pub active: usize,
    pub suspended: usize,
}

impl AdminKpis {
    #[must_use]
    pub const fn total(&self) -> usize {
        self.pending + self.active + self.suspended
    }

    #[must_use]
    pub const fn pending_is_high_load(&self) -> bool {
        self.pending > PENDING_HIGH_LOAD_THRESHOLD
    }
}

/// Notice shown after an account moves to `target`.
#[must_use]
pub fn transition_notice(target: AdminStatus) -> String {
    match target {
        AdminStatus::Active => "Admin activated".to_string(),
        other => format!("Admin moved to {} list", other.label()),
    }
}
