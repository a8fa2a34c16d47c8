//! Business logic services for admin.
//!
//! # Services
//!
//! - `viewer` - Chatbot session viewer with polling and manual replies
//! - `admin_accounts` - Admin account status workflow, caching and in-flight tracking

pub mod admin_accounts;
pub mod viewer;

pub use admin_accounts::{ADMIN_CACHE_TTL, AccountError, AdminAccountService, InFlightGuard};
pub use viewer::{PollHandle, SendOutcome, SessionViewer, SkipReason, UpdateSource, ViewerUpdate};
