//! Services used by the site's route handlers.
//!
//! - [`leads`] - Backend client for claims, inquiries and testimonials
//! - [`whatsapp`] - Pre-filled WhatsApp handoff links

pub mod leads;
pub mod whatsapp;

pub use leads::{LeadsClient, LeadsError};
