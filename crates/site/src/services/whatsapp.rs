//! WhatsApp handoff links.
//!
//! Each form can be sent to our WhatsApp number instead of the backend. The
//! visitor's details are turned into a short pre-filled message and opened
//! through `wa.me`.

use aaa_core::{ClaimSubmission, ContactInquiry, LeadKind, TestimonialSubmission};

/// Longest free-text body copied into the message.
const MAX_BODY_CHARS: usize = 200;

/// A pre-filled WhatsApp message.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HandoffMessage<'a> {
    kind: Option<LeadKind>,
    name: &'a str,
    email: &'a str,
    phone: &'a str,
    subject: &'a str,
    body: &'a str,
    accident: Option<AccidentDetails<'a>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AccidentDetails<'a> {
    date: &'a str,
    registration: &'a str,
    insurer: &'a str,
}

impl<'a> HandoffMessage<'a> {
    /// A general enquiry with no form data.
    #[must_use]
    pub fn general() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_claim(claim: &'a ClaimSubmission) -> Self {
        Self {
            kind: Some(LeadKind::Claim),
            name: claim.first_name.as_str(),
            email: &claim.email,
            phone: &claim.phone,
            body: &claim.notes,
            accident: (!claim.accident_date.trim().is_empty()).then_some(AccidentDetails {
                date: &claim.accident_date,
                registration: &claim.vehicle_registration,
                insurer: &claim.insurance_company,
            }),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn from_inquiry(inquiry: &'a ContactInquiry) -> Self {
        Self {
            kind: Some(LeadKind::Contact),
            name: &inquiry.name,
            email: &inquiry.email,
            phone: &inquiry.phone,
            subject: &inquiry.subject,
            body: &inquiry.message,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn from_testimonial(testimonial: &'a TestimonialSubmission) -> Self {
        Self {
            kind: Some(LeadKind::Testimonial),
            name: &testimonial.name,
            body: &testimonial.feedback,
            ..Self::default()
        }
    }

    /// Override the display name (claims carry first and last name apart).
    #[must_use]
    pub const fn with_name(mut self, name: &'a str) -> Self {
        self.name = name;
        self
    }

    const fn greeting(&self) -> &'static str {
        match self.kind {
            Some(LeadKind::Contact) => "Hello! I would like to contact you.",
            Some(LeadKind::Claim) => "Hello! I would like to make a claim.",
            Some(LeadKind::Testimonial) => "Hello! I would like to submit a testimonial.",
            None => "Hello! I have an inquiry.",
        }
    }

    /// The message text, one detail per line.
    #[must_use]
    pub fn text(&self) -> String {
        let mut lines = vec![self.greeting().to_string(), String::new()];

        for (label, value) in [
            ("Name", self.name),
            ("Email", self.email),
            ("Phone", self.phone),
            ("Subject", self.subject),
        ] {
            let value = value.trim();
            if !value.is_empty() {
                lines.push(format!("{label}: {value}"));
            }
        }

        let body = self.body.trim();
        if !body.is_empty() {
            lines.push(String::new());
            lines.push(truncate(body));
        }

        if let Some(accident) = &self.accident {
            lines.push(String::new());
            lines.push("Accident Details:".to_string());
            lines.push(format!("Date: {}", accident.date.trim()));
            for (label, value) in [
                ("Vehicle Registration", accident.registration),
                ("Insurance", accident.insurer),
            ] {
                let value = value.trim();
                if !value.is_empty() {
                    lines.push(format!("{label}: {value}"));
                }
            }
        }

        lines.join("\n")
    }

    /// `wa.me` link that opens a chat with `number` and this message.
    #[must_use]
    pub fn url(&self, number: &str) -> String {
        handoff_url(number, &self.text())
    }
}

/// Build a `wa.me` link.
///
/// `wa.me` wants the international number as bare digits, so the `+`, the
/// `(0)` trunk prefix and any spacing are dropped.
#[must_use]
pub fn handoff_url(number: &str, message: &str) -> String {
    let number: String = number
        .replace("(0)", "")
        .chars()
        .filter(char::is_ascii_digit)
        .collect();
    format!("https://wa.me/{number}?text={}", urlencoding::encode(message))
}

fn truncate(text: &str) -> String {
    match text.char_indices().nth(MAX_BODY_CHARS) {
        Some((cut, _)) => format!("{}...", text.get(..cut).unwrap_or(text)),
        None => text.to_string(),
    }
}
