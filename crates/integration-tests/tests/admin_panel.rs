//! Admin panel flows through the real router.

use aaa_integration_tests::fixtures::{admin, conversation, conversation_page, login, message};
use aaa_integration_tests::{TestApp, spawn_admin};
use reqwest::StatusCode;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, ResponseTemplate};

async fn sign_in(app: &TestApp, admin_type: &str) {
    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(login(admin_type)))
        .mount(&app.backend)
        .await;

    let resp = app
        .client
        .post(app.url("/auth/login"))
        .form(&[("email", "ops@aaa-as.co.uk"), ("password", "correct horse")])
        .send()
        .await
        .expect("Failed to log in");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), Some("/"));
}

fn location(resp: &reqwest::Response) -> Option<&str> {
    resp.headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
}

// =============================================================================
// Auth
// =============================================================================

#[tokio::test]
async fn test_pages_require_login() {
    let app = spawn_admin().await;

    let resp = app
        .client
        .get(app.url("/admin/dashboard/chatbot"))
        .send()
        .await
        .expect("Failed to load chatbot page");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), Some("/auth/login"));
}

#[tokio::test]
async fn test_bad_login_rerenders_form() {
    let app = spawn_admin().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .and(body_json(json!({"email": "ops@aaa-as.co.uk", "password": "wrong"})))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"detail": "No active account found with the given credentials"})),
        )
        .expect(1)
        .mount(&app.backend)
        .await;

    let resp = app
        .client
        .post(app.url("/auth/login"))
        .form(&[("email", "ops@aaa-as.co.uk"), ("password", "wrong")])
        .send()
        .await
        .expect("Failed to log in");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = resp.text().await.expect("Failed to read response");
    assert!(body.contains("No active account found with the given credentials"));
    assert!(body.contains("ops@aaa-as.co.uk"));
}

#[tokio::test]
async fn test_login_then_dashboard_shows_summary() {
    let app = spawn_admin().await;
    Mock::given(method("GET"))
        .and(path("/api/analytics/dashboard/summary/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {"totalBookings": 14, "inquiries": 6}
        })))
        .mount(&app.backend)
        .await;

    sign_in(&app, "admin").await;

    let resp = app
        .client
        .get(app.url("/"))
        .send()
        .await
        .expect("Failed to load dashboard");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.expect("Failed to read response");
    assert!(body.contains("Priya Shah"));
    assert!(body.contains("14"));
}

#[tokio::test]
async fn test_dashboard_panels_load_and_fail_independently() {
    let app = spawn_admin().await;
    Mock::given(method("GET"))
        .and(path("/api/analytics/dashboard/summary/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"inquiries": 6})))
        .mount(&app.backend)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/inquiries/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": 3,
            "name": "Amira Khan",
            "email": "amira@example.com",
            "subject": "Courtesy car after a collision",
            "message": "Is a like-for-like car available?",
            "created_at": "2026-10-12T10:00:00Z"
        }])))
        .mount(&app.backend)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/claims/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 1, "next": null, "previous": null,
            "results": [{
                "id": 9,
                "first_name": "Tom",
                "last_name": "Reid",
                "vehicle_registration": "AB12 CDE",
                "status": "pending",
                "created_at": "2026-10-11T08:00:00Z"
            }]
        })))
        .mount(&app.backend)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/analytics/dashboard/recent-activity/"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({"detail": "Activity log offline"})))
        .mount(&app.backend)
        .await;

    sign_in(&app, "admin").await;

    let resp = app
        .client
        .get(app.url("/"))
        .send()
        .await
        .expect("Failed to load dashboard");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.expect("Failed to read response");
    assert!(body.contains("Amira Khan"));
    assert!(body.contains("Courtesy car after a collision"));
    assert!(body.contains("Claim from Tom Reid"));
    assert!(body.contains("AB12 CDE • pending"));
    // The failed panel shows a banner; the rest of the page still renders.
    assert!(body.contains("Recent activity"));
    assert!(body.contains("banner-error"));
    assert!(body.contains("Inquiries"));
}

// =============================================================================
// Chatbot
// =============================================================================

#[tokio::test]
async fn test_chatbot_page_lists_and_opens_conversation() {
    let app = spawn_admin().await;
    Mock::given(method("GET"))
        .and(path("/api/chatbot/conversations/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(conversation_page(
            vec![conversation(21, "active", false, None)],
            None,
        )))
        .mount(&app.backend)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/chatbot/conversations/21/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(conversation(
            21,
            "active",
            false,
            Some(vec![aaa_integration_tests::fixtures::message(
                1,
                "user",
                "Someone drove into my parked car",
            )]),
        )))
        .mount(&app.backend)
        .await;

    sign_in(&app, "admin").await;

    let resp = app
        .client
        .get(app.url("/admin/dashboard/chatbot?open=21"))
        .send()
        .await
        .expect("Failed to load chatbot page");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.expect("Failed to read response");
    assert!(body.contains("conversation-row-21"));
    assert!(body.contains("Daniel Okafor"));
    assert!(body.contains("Someone drove into my parked car"));
}

#[tokio::test]
async fn test_backend_401_signs_admin_out() {
    let app = spawn_admin().await;
    Mock::given(method("GET"))
        .and(path("/api/chatbot/conversations/"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"detail": "Given token not valid"})),
        )
        .mount(&app.backend)
        .await;

    sign_in(&app, "admin").await;

    let resp = app
        .client
        .get(app.url("/admin/dashboard/chatbot"))
        .send()
        .await
        .expect("Failed to load chatbot page");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), Some("/auth/login?expired=1"));

    // The session is gone
    let resp = app
        .client
        .get(app.url("/admin/dashboard/chatbot"))
        .send()
        .await
        .expect("Failed to load chatbot page");
    assert_eq!(location(&resp), Some("/auth/login"));

    let body = app
        .client
        .get(app.url("/auth/login?expired=1"))
        .send()
        .await
        .expect("Failed to load login page")
        .text()
        .await
        .expect("Failed to read response");
    assert!(body.contains("Your session has expired."));
}

async fn mount_conversation(app: &TestApp, id: i64, status: &str, manual: bool) {
    Mock::given(method("GET"))
        .and(path(format!("/api/chatbot/conversations/{id}/")))
        .respond_with(ResponseTemplate::new(200).set_body_json(conversation(
            id,
            status,
            manual,
            Some(vec![message(1, "user", "The other driver admitted fault")]),
        )))
        .mount(&app.backend)
        .await;
}

#[tokio::test]
async fn test_chatbot_delete_returns_to_current_page() {
    let app = spawn_admin().await;
    Mock::given(method("DELETE"))
        .and(path("/api/chatbot/conversations/7/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&app.backend)
        .await;

    sign_in(&app, "admin").await;

    let resp = app
        .client
        .post(app.url("/admin/dashboard/chatbot/7/delete"))
        .form(&[("confirm", "yes"), ("status", "manual"), ("page", "2"), ("q", "")])
        .send()
        .await
        .expect("Failed to delete conversation");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&resp),
        Some("/admin/dashboard/chatbot?status=manual&page=2")
    );
}

#[tokio::test]
async fn test_chatbot_delete_needs_confirmation() {
    let app = spawn_admin().await;
    Mock::given(method("DELETE"))
        .and(path("/api/chatbot/conversations/7/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&app.backend)
        .await;

    sign_in(&app, "admin").await;

    let resp = app
        .client
        .post(app.url("/admin/dashboard/chatbot/7/delete"))
        .header("HX-Request", "true")
        .form(&[("status", "manual")])
        .send()
        .await
        .expect("Failed to delete conversation");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = resp.text().await.expect("Failed to read response");
    assert!(body.contains("Confirm the deletion to continue"));
}

#[tokio::test]
async fn test_detail_panel_remembers_list_filters() {
    let app = spawn_admin().await;
    mount_conversation(&app, 7, "active", false).await;

    sign_in(&app, "admin").await;

    let body = app
        .client
        .get(app.url("/admin/dashboard/chatbot/7"))
        .header("HX-Request", "true")
        .header(
            "HX-Current-URL",
            app.url("/admin/dashboard/chatbot?status=active&page=4"),
        )
        .send()
        .await
        .expect("Failed to load detail panel")
        .text()
        .await
        .expect("Failed to read response");
    assert!(body.contains(r#"name="status" value="active""#));
    assert!(body.contains(r#"name="page" value="4""#));
}

#[tokio::test]
async fn test_reply_without_manual_mode_is_rejected() {
    let app = spawn_admin().await;
    mount_conversation(&app, 8, "active", false).await;
    Mock::given(method("POST"))
        .and(path("/api/chatbot/conversations/8/send_manual_reply/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(0)
        .mount(&app.backend)
        .await;

    sign_in(&app, "admin").await;

    let resp = app
        .client
        .post(app.url("/admin/dashboard/chatbot/8/reply"))
        .header("HX-Request", "true")
        .form(&[("message", "We can help with a courtesy car")])
        .send()
        .await
        .expect("Failed to send reply");
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let trigger = resp
        .headers()
        .get("hx-trigger")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(trigger.contains("Reply not sent"));
    let body = resp.text().await.expect("Failed to read response");
    assert_eq!(body, "Enable manual reply before sending a message");
}

#[tokio::test]
async fn test_closing_manual_conversation_hands_back_to_bot() {
    let app = spawn_admin().await;
    mount_conversation(&app, 9, "active", true).await;
    Mock::given(method("POST"))
        .and(path("/api/chatbot/conversations/9/toggle_manual_reply/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "manual_reply_active": false,
            "message": "Bot replies resumed"
        })))
        .expect(1)
        .mount(&app.backend)
        .await;

    sign_in(&app, "admin").await;

    let resp = app
        .client
        .post(app.url("/admin/dashboard/chatbot/9/close"))
        .header("HX-Request", "true")
        .send()
        .await
        .expect("Failed to close conversation");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.expect("Failed to read response");
    assert!(body.contains("Select a conversation to view it."));
}

#[tokio::test]
async fn test_closing_auto_conversation_leaves_mode_alone() {
    let app = spawn_admin().await;
    mount_conversation(&app, 10, "active", false).await;
    Mock::given(method("POST"))
        .and(path("/api/chatbot/conversations/10/toggle_manual_reply/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"manual_reply_active": true})))
        .expect(0)
        .mount(&app.backend)
        .await;

    sign_in(&app, "admin").await;

    let resp = app
        .client
        .post(app.url("/admin/dashboard/chatbot/10/close"))
        .header("HX-Request", "true")
        .send()
        .await
        .expect("Failed to close conversation");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_events_stream_until_conversation_completes() {
    let app = spawn_admin().await;
    // Opening sees it active; the first poll finds it completed.
    Mock::given(method("GET"))
        .and(path("/api/chatbot/conversations/11/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(conversation(11, "active", false, Some(vec![]))))
        .up_to_n_times(1)
        .mount(&app.backend)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/chatbot/conversations/11/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(conversation(
            11,
            "completed",
            false,
            Some(vec![message(1, "assistant", "Thanks, a claims handler will call you")]),
        )))
        .mount(&app.backend)
        .await;

    sign_in(&app, "admin").await;

    let resp = app
        .client
        .get(app.url("/admin/dashboard/chatbot/11/events"))
        .send()
        .await
        .expect("Failed to open event stream");
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(
        resp.headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("text/event-stream"))
    );

    let body = tokio::time::timeout(std::time::Duration::from_secs(5), resp.text())
        .await
        .expect("Event stream did not end")
        .expect("Failed to read event stream");
    assert!(body.contains("event: conversation"));
    assert!(body.contains("Thanks, a claims handler will call you"));
    assert!(body.contains("event: row"));
    assert!(body.contains("conversation-row-11"));
    assert!(body.contains("event: closed\ndata: stopped"));
}

#[tokio::test]
async fn test_events_for_completed_conversation_close_at_once() {
    let app = spawn_admin().await;
    mount_conversation(&app, 12, "completed", false).await;

    sign_in(&app, "admin").await;

    let body = app
        .client
        .get(app.url("/admin/dashboard/chatbot/12/events"))
        .send()
        .await
        .expect("Failed to open event stream")
        .text()
        .await
        .expect("Failed to read event stream");
    assert!(body.contains("event: closed\ndata: completed"));
    assert!(!body.contains("event: conversation"));
}

// =============================================================================
// Super admin
// =============================================================================

#[tokio::test]
async fn test_super_admin_pages_forbidden_to_admins() {
    let app = spawn_admin().await;
    sign_in(&app, "admin").await;

    let resp = app
        .client
        .get(app.url("/super-admin/dashboard"))
        .send()
        .await
        .expect("Failed to load super admin page");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_super_admin_approves_pending_admin() {
    let app = spawn_admin().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/admins/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            admin(40, "new.hire@aaa-as.co.uk", "pending_approval"),
            admin(41, "ops2@aaa-as.co.uk", "active"),
        ])))
        .mount(&app.backend)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/auth/admins/40/status/"))
        .and(body_json(json!({"status": "active"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&app.backend)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/analytics/dashboard/summary/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"totalBookings": 3})))
        .mount(&app.backend)
        .await;

    sign_in(&app, "super_admin").await;

    let resp = app
        .client
        .post(app.url("/super-admin/admins/40/status"))
        .form(&[("action", "approve")])
        .send()
        .await
        .expect("Failed to approve admin");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&resp),
        Some("/super-admin/dashboard?status=pending_approval")
    );

    let body = app
        .follow(&resp)
        .await
        .text()
        .await
        .expect("Failed to read response");
    assert!(body.contains("Admin activated"));
}

#[tokio::test]
async fn test_status_change_uses_fresh_account_status() {
    let app = spawn_admin().await;
    // Suspended by someone else after this dashboard cached its lists.
    Mock::given(method("GET"))
        .and(path("/api/auth/admins/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            admin(41, "ops2@aaa-as.co.uk", "active"),
        ])))
        .up_to_n_times(3)
        .mount(&app.backend)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/auth/admins/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            admin(41, "ops2@aaa-as.co.uk", "suspended"),
        ])))
        .mount(&app.backend)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/auth/admins/41/status/"))
        .and(body_json(json!({"status": "active"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&app.backend)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/analytics/dashboard/summary/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"totalBookings": 3})))
        .mount(&app.backend)
        .await;

    sign_in(&app, "super_admin").await;

    let resp = app
        .client
        .get(app.url("/super-admin/dashboard?status=active"))
        .send()
        .await
        .expect("Failed to load super admin page");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .client
        .post(app.url("/super-admin/admins/41/status"))
        .form(&[("action", "reinstate")])
        .send()
        .await
        .expect("Failed to reinstate admin");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), Some("/super-admin/dashboard?status=suspended"));

    let body = app
        .follow(&resp)
        .await
        .text()
        .await
        .expect("Failed to read response");
    assert!(body.contains("Admin activated"));
}

#[tokio::test]
async fn test_super_admin_delete_needs_confirmation() {
    let app = spawn_admin().await;
    Mock::given(method("DELETE"))
        .and(path("/api/auth/users/41/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&app.backend)
        .await;

    sign_in(&app, "super_admin").await;

    let resp = app
        .client
        .post(app.url("/super-admin/admins/41/delete"))
        .form(&[("status", "active")])
        .send()
        .await
        .expect("Failed to delete admin");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), Some("/super-admin/dashboard?status=active"));
}
