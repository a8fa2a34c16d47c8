//! Lead-capture form submissions.
//!
//! Every submission carries a `honeypot` field. It is rendered hidden, so a
//! person never fills it in; bots usually do. We always forward it to the
//! backend unchanged and let the backend reject the submission, which keeps
//! the spam rule in one place.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{Email, EmailError, TestimonialId};

/// Errors raised while validating a lead form.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LeadError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),
    #[error("accident date must be a valid date (YYYY-MM-DD)")]
    InvalidDate,
    #[error("rating must be between 1 and 5")]
    InvalidRating,
}

impl LeadError {
    /// The form field the error belongs to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::MissingField(field) => field,
            Self::InvalidEmail(_) => "email",
            Self::InvalidDate => "accident_date",
            Self::InvalidRating => "rating",
        }
    }
}

/// Which form a lead came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadKind {
    Claim,
    Contact,
    Testimonial,
}

/// Accident claim for a replacement vehicle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaimSubmission {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    /// `YYYY-MM-DD`.
    pub accident_date: String,
    pub vehicle_registration: String,
    pub insurance_company: String,
    pub policy_number: String,
    pub notes: String,
    pub honeypot: String,
}

impl ClaimSubmission {
    /// Required fields in the order they appear on the form.
    const REQUIRED: [&'static str; 9] = [
        "first_name",
        "last_name",
        "email",
        "phone",
        "address",
        "accident_date",
        "vehicle_registration",
        "insurance_company",
        "policy_number",
    ];

    /// Trim every field and check required values.
    ///
    /// The honeypot is passed through untouched.
    ///
    /// # Errors
    ///
    /// Returns the first missing field, or an invalid email or date.
    pub fn validated(mut self) -> Result<Self, LeadError> {
        for field in [
            &mut self.first_name,
            &mut self.last_name,
            &mut self.email,
            &mut self.phone,
            &mut self.address,
            &mut self.accident_date,
            &mut self.vehicle_registration,
            &mut self.insurance_company,
            &mut self.policy_number,
            &mut self.notes,
        ] {
            trim_in_place(field);
        }

        let values = [
            &self.first_name,
            &self.last_name,
            &self.email,
            &self.phone,
            &self.address,
            &self.accident_date,
            &self.vehicle_registration,
            &self.insurance_company,
            &self.policy_number,
        ];
        if let Some((name, _)) = Self::REQUIRED
            .into_iter()
            .zip(values)
            .find(|(_, value)| value.is_empty())
        {
            return Err(LeadError::MissingField(name));
        }

        self.email = Email::parse(&self.email)?.into_inner();
        NaiveDate::parse_from_str(&self.accident_date, "%Y-%m-%d")
            .map_err(|_| LeadError::InvalidDate)?;
        self.vehicle_registration = self.vehicle_registration.to_uppercase();

        Ok(self)
    }

    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// General contact inquiry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactInquiry {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub subject: String,
    pub message: String,
    pub vehicle_interest: String,
    pub honeypot: String,
}

impl ContactInquiry {
    /// # Errors
    ///
    /// Returns the first missing required field or an invalid email.
    pub fn validated(mut self) -> Result<Self, LeadError> {
        for field in [
            &mut self.name,
            &mut self.email,
            &mut self.phone,
            &mut self.subject,
            &mut self.message,
            &mut self.vehicle_interest,
        ] {
            trim_in_place(field);
        }
        require("name", &self.name)?;
        require("email", &self.email)?;
        require("subject", &self.subject)?;
        require("message", &self.message)?;
        self.email = Email::parse(&self.email)?.into_inner();
        Ok(self)
    }
}

/// Customer testimonial.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestimonialSubmission {
    pub name: String,
    pub feedback: String,
    pub rating: u8,
    pub service_type: String,
    pub honeypot: String,
}

impl TestimonialSubmission {
    /// # Errors
    ///
    /// Returns a missing name/feedback or a rating outside 1..=5.
    pub fn validated(mut self) -> Result<Self, LeadError> {
        trim_in_place(&mut self.name);
        trim_in_place(&mut self.feedback);
        trim_in_place(&mut self.service_type);
        require("name", &self.name)?;
        require("feedback", &self.feedback)?;
        if !(1..=5).contains(&self.rating) {
            return Err(LeadError::InvalidRating);
        }
        Ok(self)
    }
}

/// A published testimonial as listed by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Testimonial {
    #[serde(default)]
    pub id: Option<TestimonialId>,
    pub name: String,
    #[serde(default)]
    pub feedback: String,
    #[serde(default = "default_rating")]
    pub rating: u8,
    #[serde(default)]
    pub service_type: Option<String>,
}

impl Testimonial {
    /// Rating clamped to 1..=5 for star rendering.
    #[must_use]
    pub fn stars(&self) -> u8 {
        self.rating.clamp(1, 5)
    }
}

const fn default_rating() -> u8 {
    5
}

fn require(name: &'static str, value: &str) -> Result<(), LeadError> {
    if value.is_empty() {
        Err(LeadError::MissingField(name))
    } else {
        Ok(())
    }
}

fn trim_in_place(value: &mut String) {
    let trimmed = value.trim();
    if trimmed.len() != value.len() {
        *value = trimmed.to_string();
    }
}
