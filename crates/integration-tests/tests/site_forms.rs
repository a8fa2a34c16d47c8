//! Lead form submissions through the site router.
//!
//! Forms post to the site, the site posts to the mocked backend, and the
//! visitor lands back on the form with a notice.

use aaa_integration_tests::spawn_site;
use reqwest::StatusCode;
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, ResponseTemplate};

fn claim_form(honeypot: &str) -> Vec<(&'static str, String)> {
    vec![
        ("first_name", "Aisha".to_string()),
        ("last_name", "Rahman".to_string()),
        ("email", "aisha.rahman@example.com".to_string()),
        ("phone", "07700 900456".to_string()),
        ("address", "12 Station Road, Croydon".to_string()),
        ("accident_date", "2026-10-01".to_string()),
        ("vehicle_registration", "ab12 cde".to_string()),
        ("insurance_company", "Admiral".to_string()),
        ("policy_number", "POL-778812".to_string()),
        ("notes", "Rear-ended at a red light.".to_string()),
        ("honeypot", honeypot.to_string()),
    ]
}

// =============================================================================
// Claim
// =============================================================================

#[tokio::test]
async fn test_claim_success_redirects_with_notice_and_empty_form() {
    let app = spawn_site().await;
    Mock::given(method("POST"))
        .and(path("/api/claims/"))
        .and(body_string_contains("vehicle_registration=AB12+CDE"))
        .and(body_string_contains("honeypot="))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 501})))
        .expect(1)
        .mount(&app.backend)
        .await;

    let resp = app
        .client
        .post(app.url("/make-claim"))
        .form(&claim_form(""))
        .send()
        .await
        .expect("Failed to submit claim");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let page = app.follow(&resp).await;
    assert_eq!(page.status(), StatusCode::OK);
    let body = page.text().await.expect("Failed to read response");
    assert!(body.contains("Claim submitted successfully"));
    assert!(body.contains("notice-success"));
    assert!(!body.contains("aisha.rahman@example.com"));

    // The notice is shown once
    let again = app
        .client
        .get(app.url("/make-claim"))
        .send()
        .await
        .expect("Failed to reload form")
        .text()
        .await
        .expect("Failed to read response");
    assert!(!again.contains("Claim submitted successfully"));
}

#[tokio::test]
async fn test_claim_honeypot_is_forwarded_and_rejection_surfaces() {
    let app = spawn_site().await;
    Mock::given(method("POST"))
        .and(path("/api/claims/"))
        .and(body_string_contains("honeypot=http%3A%2F%2Fspam.example"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"honeypot": ["Spam detected."]})),
        )
        .expect(1)
        .mount(&app.backend)
        .await;

    let resp = app
        .client
        .post(app.url("/make-claim"))
        .form(&claim_form("http://spam.example"))
        .send()
        .await
        .expect("Failed to submit claim");

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = resp.text().await.expect("Failed to read response");
    assert!(body.contains("Claim could not be submitted"));
    assert!(body.contains("Spam detected."));
    assert!(body.contains("Reference: "));
    // What they typed is kept
    assert!(body.contains("aisha.rahman@example.com"));
}

#[tokio::test]
async fn test_claim_missing_field_never_reaches_backend() {
    let app = spawn_site().await;
    Mock::given(method("POST"))
        .and(path("/api/claims/"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&app.backend)
        .await;

    let form: Vec<_> = claim_form("")
        .into_iter()
        .filter(|(name, _)| *name != "policy_number")
        .collect();
    let resp = app
        .client
        .post(app.url("/make-claim"))
        .form(&form)
        .send()
        .await
        .expect("Failed to submit claim");

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = resp.text().await.expect("Failed to read response");
    assert!(body.contains("Policy number is required."));
    assert!(body.contains("has-error"));
}

#[tokio::test]
async fn test_claim_backend_outage_is_bad_gateway() {
    let app = spawn_site().await;
    Mock::given(method("POST"))
        .and(path("/api/claims/"))
        .respond_with(ResponseTemplate::new(503).set_body_string("<html>down</html>"))
        .mount(&app.backend)
        .await;

    let resp = app
        .client
        .post(app.url("/make-claim"))
        .form(&claim_form(""))
        .send()
        .await
        .expect("Failed to submit claim");

    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let body = resp.text().await.expect("Failed to read response");
    assert!(body.contains("notice-error"));
    assert!(body.contains("We could not send your details right now."));
    assert!(!body.contains("html&gt;down"));
}

#[tokio::test]
async fn test_claim_whatsapp_handoff_skips_backend() {
    let app = spawn_site().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&app.backend)
        .await;

    let resp = app
        .client
        .post(app.url("/make-claim/whatsapp"))
        .form(&claim_form(""))
        .send()
        .await
        .expect("Failed to hand off claim");

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let location = resp
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .expect("redirect location");
    assert!(location.starts_with("https://wa.me/448000116197?text="));
    assert!(location.contains("Aisha%20Rahman"));
}

// =============================================================================
// Contact
// =============================================================================

#[tokio::test]
async fn test_contact_success() {
    let app = spawn_site().await;
    Mock::given(method("POST"))
        .and(path("/api/inquiries/"))
        .and(body_string_contains("subject=Courtesy+car"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&app.backend)
        .await;

    let resp = app
        .client
        .post(app.url("/contact"))
        .form(&[
            ("name", "Tom Birch"),
            ("email", "tom@example.com"),
            ("phone", ""),
            ("subject", "Courtesy car"),
            ("message", "Is a courtesy car included?"),
            ("honeypot", ""),
        ])
        .send()
        .await
        .expect("Failed to submit inquiry");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let body = app
        .follow(&resp)
        .await
        .text()
        .await
        .expect("Failed to read response");
    assert!(body.contains("Message sent successfully"));
}

#[tokio::test]
async fn test_contact_invalid_email() {
    let app = spawn_site().await;

    let resp = app
        .client
        .post(app.url("/contact"))
        .form(&[
            ("name", "Tom Birch"),
            ("email", "not-an-email"),
            ("subject", "Courtesy car"),
            ("message", "Hello"),
        ])
        .send()
        .await
        .expect("Failed to submit inquiry");

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = resp.text().await.expect("Failed to read response");
    assert!(body.contains("Please enter a valid email address."));
}

// =============================================================================
// Testimonials
// =============================================================================

#[tokio::test]
async fn test_testimonials_list_and_submit() {
    let app = spawn_site().await;
    Mock::given(method("GET"))
        .and(path("/api/testimonials/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 1,
            "next": null,
            "previous": null,
            "results": [{
                "id": 3,
                "name": "Grace Mensah",
                "feedback": "Had a replacement car the same afternoon.",
                "rating": 5,
                "service_type": "car_hire"
            }]
        })))
        .mount(&app.backend)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/testimonials/"))
        .and(body_string_contains("rating=4"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&app.backend)
        .await;

    let page = app
        .client
        .get(app.url("/testimonials"))
        .send()
        .await
        .expect("Failed to load testimonials");
    assert_eq!(page.status(), StatusCode::OK);
    let body = page.text().await.expect("Failed to read response");
    assert!(body.contains("Grace Mensah"));
    assert!(body.contains("Car Hire"));

    let resp = app
        .client
        .post(app.url("/testimonials"))
        .form(&[
            ("name", "Leo Grant"),
            ("feedback", "Claim handled without any fuss."),
            ("rating", "4"),
            ("service_type", "claims_management"),
            ("honeypot", ""),
        ])
        .send()
        .await
        .expect("Failed to submit testimonial");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let body = app
        .follow(&resp)
        .await
        .text()
        .await
        .expect("Failed to read response");
    assert!(body.contains("Thank you for your feedback!"));
}

#[tokio::test]
async fn test_testimonial_rating_out_of_range() {
    let app = spawn_site().await;

    let resp = app
        .client
        .post(app.url("/testimonials"))
        .form(&[
            ("name", "Leo Grant"),
            ("feedback", "Great"),
            ("rating", "0"),
        ])
        .send()
        .await
        .expect("Failed to submit testimonial");

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = resp.text().await.expect("Failed to read response");
    assert!(body.contains("Please choose a rating from 1 to 5 stars."));
}

// =============================================================================
// Rate limiting
// =============================================================================

#[tokio::test]
async fn test_submissions_are_rate_limited_per_ip() {
    let app = spawn_site().await;

    let mut statuses = Vec::new();
    for _ in 0..7 {
        let resp = app
            .client
            .post(app.url("/contact"))
            .header("x-forwarded-for", "203.0.113.50")
            .form(&[("name", "")])
            .send()
            .await
            .expect("Failed to submit inquiry");
        statuses.push(resp.status());
    }

    assert_eq!(statuses.first(), Some(&StatusCode::UNPROCESSABLE_ENTITY));
    assert_eq!(statuses.last(), Some(&StatusCode::TOO_MANY_REQUESTS));

    // Other visitors and the form page itself are unaffected
    let resp = app
        .client
        .post(app.url("/contact"))
        .header("x-forwarded-for", "198.51.100.9")
        .form(&[("name", "")])
        .send()
        .await
        .expect("Failed to submit inquiry");
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let resp = app
        .client
        .get(app.url("/contact"))
        .header("x-forwarded-for", "203.0.113.50")
        .send()
        .await
        .expect("Failed to load contact page");
    assert_eq!(resp.status(), StatusCode::OK);
}
