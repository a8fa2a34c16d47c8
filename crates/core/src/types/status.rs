//! Status enums for conversations, messages, and admin accounts.

use serde::{Deserialize, Serialize};

/// Chatbot conversation status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStatus {
    /// Visitor is still chatting. The only status that is polled.
    Active,
    /// Conversation has ended.
    Completed,
    /// Handed over to a human.
    Manual,
}

impl ConversationStatus {
    /// All statuses, in filter dropdown order.
    pub const ALL: [Self; 3] = [Self::Active, Self::Completed, Self::Manual];

    /// Backend query value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Manual => "manual",
        }
    }

    /// Human label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Completed => "Completed",
            Self::Manual => "Manual",
        }
    }

    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

impl std::fmt::Display for ConversationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ConversationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "manual" => Ok(Self::Manual),
            _ => Err(format!("invalid conversation status: {s}")),
        }
    }
}

/// Who authored a chatbot message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    User,
    Assistant,
    Admin,
}

/// Admin account status.
///
/// Transitions are driven by a super admin:
///
/// | From               | Action      | To          |
/// |--------------------|-------------|-------------|
/// | `pending_approval` | approve     | `active`    |
/// | `pending_approval` | suspend     | `suspended` |
/// | `active`           | suspend     | `suspended` |
/// | `suspended`        | reinstate   | `active`    |
///
/// Delete is offered from every status and removes the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminStatus {
    PendingApproval,
    Active,
    Suspended,
}

impl AdminStatus {
    /// All statuses, in bucket display order.
    pub const ALL: [Self; 3] = [Self::PendingApproval, Self::Active, Self::Suspended];

    /// Backend value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PendingApproval => "pending_approval",
            Self::Active => "active",
            Self::Suspended => "suspended",
        }
    }

    /// Short label used on tabs and notices.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::PendingApproval => "Pending",
            Self::Active => "Active",
            Self::Suspended => "Suspended",
        }
    }

    /// Actions a super admin may take on an account in this status.
    #[must_use]
    pub const fn available_actions(self) -> &'static [AdminAction] {
        match self {
            Self::PendingApproval => &[AdminAction::Approve, AdminAction::Suspend, AdminAction::Delete],
            Self::Active => &[AdminAction::Suspend, AdminAction::Delete],
            Self::Suspended => &[AdminAction::Reinstate, AdminAction::Delete],
        }
    }

    /// Apply a status-changing action.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::NotAllowed`] if the action is not offered
    /// for this status, or [`TransitionError::NotAStatusChange`] for delete.
    pub fn transition(self, action: AdminAction) -> Result<Self, TransitionError> {
        let target = action
            .target_status()
            .ok_or(TransitionError::NotAStatusChange)?;
        if self.available_actions().contains(&action) {
            Ok(target)
        } else {
            Err(TransitionError::NotAllowed { from: self, action })
        }
    }
}

impl std::fmt::Display for AdminStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AdminStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending_approval" | "pending" => Ok(Self::PendingApproval),
            "active" => Ok(Self::Active),
            "suspended" => Ok(Self::Suspended),
            _ => Err(format!("invalid admin status: {s}")),
        }
    }
}

/// Super-admin action on an admin account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminAction {
    Approve,
    Suspend,
    Reinstate,
    Delete,
}

impl AdminAction {
    /// The status this action moves an account into. `None` for delete.
    #[must_use]
    pub const fn target_status(self) -> Option<AdminStatus> {
        match self {
            Self::Approve | Self::Reinstate => Some(AdminStatus::Active),
            Self::Suspend => Some(AdminStatus::Suspended),
            Self::Delete => None,
        }
    }

    /// Form value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Suspend => "suspend",
            Self::Reinstate => "reinstate",
            Self::Delete => "delete",
        }
    }

    /// Button label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Approve => "Approve",
            Self::Suspend => "Suspend",
            Self::Reinstate => "Reinstate",
            Self::Delete => "Delete",
        }
    }

    #[must_use]
    pub const fn is_destructive(self) -> bool {
        matches!(self, Self::Suspend | Self::Delete)
    }
}

impl std::fmt::Display for AdminAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AdminAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approve" => Ok(Self::Approve),
            "suspend" => Ok(Self::Suspend),
            "reinstate" => Ok(Self::Reinstate),
            "delete" => Ok(Self::Delete),
            _ => Err(format!("invalid admin action: {s}")),
        }
    }
}

/// Rejected admin status change.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionError {
    #[error("cannot {action} an account that is {from}")]
    NotAllowed { from: AdminStatus, action: AdminAction },
    #[error("delete is not a status change")]
    NotAStatusChange,
}

/// Admin role with different permission levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    /// Manages other admin accounts in addition to everything an admin can do.
    SuperAdmin,
    /// Works the chatbot inbox and dashboards.
    Admin,
}

impl std::fmt::Display for AdminRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SuperAdmin => write!(f, "super_admin"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for AdminRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "super_admin" => Ok(Self::SuperAdmin),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("invalid admin role: {s}")),
        }
    }
}
