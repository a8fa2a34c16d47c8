//! AAA Core - Shared domain types.
//!
//! This crate provides the types used across all components:
//! - `site` - Public marketing site with the claim, contact and testimonial forms
//! - `admin` - Back-office for chatbot sessions and admin account management
//! - `cli` - Command-line tools for migrations and operator tasks
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. The backend REST API owns every entity; these types
//! are the shapes we consume from it and the normalization rules applied to
//! its responses.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, emails, and status enums
//! - [`conversation`] - Chatbot conversations, messages, and list pages
//! - [`admin`] - Admin accounts, status buckets, and KPI counts
//! - [`stats`] - Dashboard summary counts
//! - [`records`] - Latest inquiries, claims, and activity for the dashboard
//! - [`leads`] - Lead-capture form submissions
//! - [`secret`] - Placeholder and entropy checks for configured secrets
//! - [`api`] - The backend's `{success, message, data}` envelope and error bodies

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod admin;
pub mod api;
pub mod conversation;
pub mod leads;
pub mod records;
pub mod secret;
pub mod stats;
pub mod types;

pub use admin::{AdminBuckets, AdminKpis, AdminSummary};
pub use conversation::{Conversation, ConversationPage, Message, Page};
pub use leads::{ClaimSubmission, ContactInquiry, LeadError, LeadKind, Testimonial, TestimonialSubmission};
pub use records::{ActivityItem, ClaimRecord, InquiryRecord, Notification, NotificationKind};
pub use stats::SummaryStats;
pub use types::*;
