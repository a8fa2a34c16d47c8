//! Session models for admin.

pub mod session;

pub use session::{BackendToken, CurrentAdmin, Flash, FlashKind, keys as session_keys};
