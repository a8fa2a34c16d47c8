//! Content pages, legacy redirects and response headers.

use aaa_integration_tests::spawn_site;
use reqwest::StatusCode;

#[tokio::test]
async fn test_health() {
    let app = spawn_site().await;

    let resp = app
        .client
        .get(app.url("/health"))
        .send()
        .await
        .expect("Failed to call health");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.expect("Failed to read response"), "ok");
}

#[tokio::test]
async fn test_home_sets_security_headers_and_nonce() {
    let app = spawn_site().await;

    let resp = app
        .client
        .get(app.url("/"))
        .send()
        .await
        .expect("Failed to load home page");
    assert_eq!(resp.status(), StatusCode::OK);

    let headers = resp.headers().clone();
    assert_eq!(
        headers.get("x-frame-options").and_then(|v| v.to_str().ok()),
        Some("DENY")
    );
    assert!(headers.contains_key("x-request-id"));
    let csp = headers
        .get("content-security-policy")
        .and_then(|v| v.to_str().ok())
        .expect("CSP header")
        .to_string();

    let body = resp.text().await.expect("Failed to read response");
    assert!(body.contains("Back on the road after an accident"));
    assert!(body.contains("application/ld+json"));

    // The nonce on the inline script is the one the CSP allows
    let nonce = csp
        .split("'nonce-")
        .nth(1)
        .and_then(|rest| rest.split('\'').next())
        .expect("nonce in CSP");
    assert!(body.contains(&format!("nonce=\"{nonce}\"")));
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = spawn_site().await;

    let resp = app
        .client
        .get(app.url("/faqs"))
        .header("x-request-id", "cf-7a1b2c3d")
        .send()
        .await
        .expect("Failed to load FAQs");
    assert_eq!(
        resp.headers().get("x-request-id").and_then(|v| v.to_str().ok()),
        Some("cf-7a1b2c3d")
    );
}

#[tokio::test]
async fn test_content_pages_render() {
    let app = spawn_site().await;

    for (path, expected) in [
        ("/about", "About Us"),
        ("/services", "Replacement Vehicle"),
        ("/services/replacement-vehicle", "Replacement Vehicle"),
        ("/faqs", "What is a claims management company?"),
        ("/blog", "What Is Credit Hire and Who Pays for It?"),
        ("/blog/what-is-credit-hire", "What Is Credit Hire and Who Pays for It?"),
        ("/terms-of-service", "Terms"),
        ("/privacy-policy", "Privacy"),
        ("/cookie-policy", "Cookie"),
        ("/make-claim", "Make a claim"),
        ("/contact", "Send via WhatsApp"),
    ] {
        let resp = app
            .client
            .get(app.url(path))
            .send()
            .await
            .expect("Failed to load page");
        assert_eq!(resp.status(), StatusCode::OK, "{path}");
        let body = resp.text().await.expect("Failed to read response");
        assert!(body.contains(expected), "{path} should mention {expected}");
    }
}

#[tokio::test]
async fn test_blog_tag_filter() {
    let app = spawn_site().await;

    let body = app
        .client
        .get(app.url("/blog?tag=credit+hire"))
        .send()
        .await
        .expect("Failed to load blog")
        .text()
        .await
        .expect("Failed to read response");
    assert!(body.contains("Posts tagged"));
    assert!(body.contains("What Is Credit Hire"));
}

#[tokio::test]
async fn test_unknown_paths_render_not_found() {
    let app = spawn_site().await;

    for path in ["/no-such-page", "/services/spaceship-hire", "/blog/missing-post"] {
        let resp = app
            .client
            .get(app.url(path))
            .send()
            .await
            .expect("Failed to load page");
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{path}");
        let body = resp.text().await.expect("Failed to read response");
        assert!(body.contains("Page not found"), "{path}");
    }
}

#[tokio::test]
async fn test_legacy_paths_redirect_permanently() {
    let app = spawn_site().await;

    for (from, to) in [
        ("/claim", "/make-claim"),
        ("/claims", "/make-claim"),
        ("/contact-us", "/contact"),
        ("/faq", "/faqs"),
        ("/terms", "/terms-of-service"),
        ("/privacy", "/privacy-policy"),
    ] {
        let resp = app
            .client
            .get(app.url(from))
            .send()
            .await
            .expect("Failed to request legacy path");
        assert_eq!(resp.status(), StatusCode::PERMANENT_REDIRECT, "{from}");
        assert_eq!(
            resp.headers()
                .get(reqwest::header::LOCATION)
                .and_then(|v| v.to_str().ok()),
            Some(to)
        );
    }
}
