//! Dashboard summary counts.

use serde::{Deserialize, Serialize};

/// Aggregate counts from the analytics summary endpoint.
///
/// The endpoint has shipped both camelCase and snake_case keys; either is
/// accepted and a missing count reads as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryStats {
    #[serde(alias = "totalVehicles")]
    pub total_vehicles: u64,
    #[serde(alias = "totalBookings")]
    pub total_bookings: u64,
    pub inquiries: u64,
    pub testimonials: u64,
    #[serde(alias = "carListings")]
    pub car_listings: u64,
    #[serde(alias = "purchaseRequests")]
    pub purchase_requests: u64,
    #[serde(alias = "galleryImages")]
    pub gallery_images: u64,
    #[serde(alias = "newsletterSubscribers")]
    pub newsletter_subscribers: u64,
    #[serde(alias = "faqItems")]
    pub faq_items: u64,
}

impl SummaryStats {
    /// Label and value pairs in card order.
    #[must_use]
    pub const fn cards(&self) -> [(&'static str, u64); 9] {
        [
            ("Vehicles", self.total_vehicles),
            ("Bookings", self.total_bookings),
            ("Inquiries", self.inquiries),
            ("Testimonials", self.testimonials),
            ("Car listings", self.car_listings),
            ("Purchase requests", self.purchase_requests),
            ("Gallery images", self.gallery_images),
            ("Newsletter subscribers", self.newsletter_subscribers),
            ("FAQ items", self.faq_items),
        ]
    }
}
