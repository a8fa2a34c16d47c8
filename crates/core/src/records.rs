//! Read-only records shown on the admin dashboard.
//!
//! The dashboard lists the newest contact inquiries and claims, and merges
//! both into one notification feed, newest first. The recent activity feed
//! comes from the analytics log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A contact inquiry as listed by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InquiryRecord {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub status: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// An accident claim as listed by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimRecord {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub vehicle_registration: String,
    #[serde(default)]
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl ClaimRecord {
    #[must_use]
    pub fn claimant(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }
}

/// One entry of the analytics activity log.
///
/// The log sends `text` as an alias of `description`; older entries carry
/// only one of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityItem {
    pub id: i64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub activity_label: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl ActivityItem {
    #[must_use]
    pub fn summary(&self) -> &str {
        [self.description.as_deref(), self.text.as_deref()]
            .into_iter()
            .flatten()
            .find(|s| !s.trim().is_empty())
            .unwrap_or("Activity recorded")
    }
}

/// What a notification points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    Inquiry,
    Claim,
}

impl NotificationKind {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Inquiry => "Inquiry",
            Self::Claim => "Claim",
        }
    }
}

/// One line of the dashboard's latest-notifications feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub subtitle: String,
    pub timestamp: DateTime<Utc>,
}

impl From<&InquiryRecord> for Notification {
    fn from(inquiry: &InquiryRecord) -> Self {
        let title = if inquiry.subject.trim().is_empty() {
            "New inquiry".to_string()
        } else {
            inquiry.subject.clone()
        };
        Self {
            kind: NotificationKind::Inquiry,
            title,
            subtitle: format!("{} • {}", inquiry.name, inquiry.email),
            timestamp: inquiry.created_at,
        }
    }
}

impl From<&ClaimRecord> for Notification {
    fn from(claim: &ClaimRecord) -> Self {
        Self {
            kind: NotificationKind::Claim,
            title: format!("Claim from {}", claim.claimant()),
            subtitle: format!("{} • {}", claim.vehicle_registration, claim.status),
            timestamp: claim.created_at,
        }
    }
}

/// Merge inquiries and claims into one feed, newest first, at most `limit`.
///
/// Equal timestamps keep inquiries ahead of claims.
#[must_use]
pub fn latest_notifications(
    inquiries: &[InquiryRecord],
    claims: &[ClaimRecord],
    limit: usize,
) -> Vec<Notification> {
    let mut feed: Vec<Notification> = inquiries
        .iter()
        .map(Notification::from)
        .chain(claims.iter().map(Notification::from))
        .collect();
    feed.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    feed.truncate(limit);
    feed
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use serde_json::json;

    use super::*;

    fn inquiry(id: i64, subject: &str, at: &str) -> InquiryRecord {
        serde_json::from_value(json!({
            "id": id,
            "name": "Amira Khan",
            "email": "amira@example.com",
            "subject": subject,
            "message": "Can you help with a hire car?",
            "created_at": at,
        }))
        .unwrap()
    }

    fn claim(id: i64, at: &str) -> ClaimRecord {
        serde_json::from_value(json!({
            "id": id,
            "first_name": "Tom",
            "last_name": "Reid",
            "vehicle_registration": "AB12 CDE",
            "status": "pending",
            "accident_details": "Rear-ended at lights",
            "created_at": at,
        }))
        .unwrap()
    }

    #[test]
    fn test_feed_is_newest_first_and_capped() {
        let inquiries = [
            inquiry(1, "Courtesy car", "2026-10-10T09:00:00Z"),
            inquiry(2, "Repairs", "2026-10-12T09:00:00Z"),
        ];
        let claims = [claim(7, "2026-10-11T09:00:00Z"), claim(8, "2026-10-09T09:00:00Z")];

        let feed = latest_notifications(&inquiries, &claims, 3);
        let titles: Vec<_> = feed.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, ["Repairs", "Claim from Tom Reid", "Courtesy car"]);
        assert_eq!(feed[1].kind, NotificationKind::Claim);
        assert_eq!(feed[1].subtitle, "AB12 CDE • pending");
        assert_eq!(feed[0].subtitle, "Amira Khan • amira@example.com");
    }

    #[test]
    fn test_blank_subject_gets_a_title() {
        let feed = latest_notifications(&[inquiry(1, " ", "2026-10-10T09:00:00Z")], &[], 3);
        assert_eq!(feed[0].title, "New inquiry");
        assert!(latest_notifications(&[], &[], 3).is_empty());
    }

    #[test]
    fn test_activity_prefers_description() {
        let item: ActivityItem = serde_json::from_value(json!({
            "id": 3,
            "activity_type": "inquiry_received",
            "activity_label": "Inquiry Received",
            "description": "New inquiry from Amira Khan",
            "text": "New inquiry from Amira Khan",
            "timestamp": "2026-10-12T09:00:00Z",
            "user_name": null,
        }))
        .unwrap();
        assert_eq!(item.summary(), "New inquiry from Amira Khan");

        let legacy: ActivityItem = serde_json::from_value(json!({"id": 4, "text": "Admin approved", "icon": "check"}))
            .unwrap();
        assert_eq!(legacy.summary(), "Admin approved");
        assert_eq!(legacy.timestamp, None);

        let empty: ActivityItem = serde_json::from_value(json!({"id": 5, "description": ""})).unwrap();
        assert_eq!(empty.summary(), "Activity recorded");
    }
}
