//! Backend client, session viewer and account service over real HTTP.

use std::time::Duration;

use aaa_admin::backend::{AccountApi, BackendError, ConversationApi, ConversationQuery, RecordsApi};
use aaa_admin::config::ViewerConfig;
use aaa_admin::services::{
    AccountError, AdminAccountService, SendOutcome, SessionViewer, SkipReason, UpdateSource,
};
use aaa_core::{AdminAction, AdminId, AdminStatus, ConversationId, ConversationStatus};
use aaa_integration_tests::authorized_backend;
use aaa_integration_tests::fixtures::{
    ACCESS_TOKEN, admin, conversation, conversation_page, message,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn viewer_config() -> ViewerConfig {
    ViewerConfig {
        poll_interval: Duration::from_millis(50),
        reply_refetch_delay: Duration::from_millis(20),
    }
}

fn conversation_path(id: i64) -> String {
    format!("/api/chatbot/conversations/{id}/")
}

// =============================================================================
// Client
// =============================================================================

#[tokio::test]
async fn test_list_sends_token_and_filters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/chatbot/conversations/"))
        .and(header("authorization", format!("Bearer {ACCESS_TOKEN}").as_str()))
        .and(query_param("status", "active"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(conversation_page(
            vec![conversation(11, "active", false, None)],
            Some("http://backend/api/chatbot/conversations/?page=3&status=active"),
        )))
        .expect(1)
        .mount(&server)
        .await;

    let page = authorized_backend(&server)
        .list_conversations(ConversationQuery {
            status: Some(ConversationStatus::Active),
            page: 2,
            is_lead: None,
        })
        .await
        .expect("list should succeed");

    assert_eq!(page.results.len(), 1);
    assert_eq!(page.next_page(), Some(3));
    // List rows come without history
    assert!(page.results.iter().all(|c| c.messages.is_empty()));
}

#[tokio::test]
async fn test_list_accepts_wrapped_bare_array() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/chatbot/conversations/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [conversation(1, "completed", false, None), conversation(2, "manual", true, None)]
        })))
        .mount(&server)
        .await;

    let page = authorized_backend(&server)
        .list_conversations(ConversationQuery::default())
        .await
        .expect("list should succeed");

    assert_eq!(page.count, 2);
    assert!(page.next.is_none());
    assert_eq!(page.results.len(), 2);
}

#[tokio::test]
async fn test_record_feeds_are_capped_and_authorized() {
    let server = MockServer::start().await;
    let claims: Vec<_> = (1..=8)
        .map(|id| {
            json!({
                "id": id,
                "first_name": "Tom",
                "last_name": "Reid",
                "vehicle_registration": format!("AB{id:02} CDE"),
                "status": "pending",
                "created_at": "2026-10-12T09:00:00Z"
            })
        })
        .collect();
    Mock::given(method("GET"))
        .and(path("/api/claims/"))
        .and(header("authorization", format!("Bearer {ACCESS_TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 8, "next": null, "previous": null, "results": claims
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/analytics/dashboard/recent-activity/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Given token not valid"})))
        .mount(&server)
        .await;

    let api = authorized_backend(&server);
    let latest = api.latest_claims(5).await.expect("claims should load");
    assert_eq!(latest.len(), 5);
    assert_eq!(latest.first().map(|c| c.vehicle_registration.as_str()), Some("AB01 CDE"));

    let err = api.recent_activity(5).await.unwrap_err();
    assert!(err.is_unauthorized());
}

#[tokio::test]
async fn test_error_statuses_map_to_variants() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(conversation_path(1)))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"detail": "Token is invalid or expired"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(conversation_path(2)))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"detail": "Not allowed"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/chatbot/conversations/3/send_manual_reply/"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"error": "Manual reply is not active"})),
        )
        .mount(&server)
        .await;

    let api = authorized_backend(&server);

    let err = api
        .get_conversation(ConversationId::new(1))
        .await
        .expect_err("401 should fail");
    assert!(err.is_unauthorized());
    assert_eq!(err.user_message(), "Token is invalid or expired");

    let err = api
        .get_conversation(ConversationId::new(2))
        .await
        .expect_err("403 should fail");
    assert!(matches!(err, BackendError::Forbidden(_)));

    let err = api
        .send_manual_reply(ConversationId::new(3), "hello")
        .await
        .expect_err("400 should fail");
    assert!(matches!(err, BackendError::Api { status: 400, .. }));
    assert_eq!(err.user_message(), "Manual reply is not active");
}

// =============================================================================
// Viewer
// =============================================================================

#[tokio::test]
async fn test_opening_completed_conversation_never_polls() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(conversation_path(5)))
        .respond_with(ResponseTemplate::new(200).set_body_json(conversation(
            5,
            "completed",
            false,
            Some(vec![message(1, "user", "Hi"), message(2, "assistant", "Hello!")]),
        )))
        .expect(1)
        .mount(&server)
        .await;

    let mut viewer = SessionViewer::live(authorized_backend(&server), viewer_config());
    let opened = viewer
        .open(ConversationId::new(5))
        .await
        .expect("open should succeed");
    assert_eq!(opened.messages.len(), 2);

    assert!(!viewer.is_polling());
    assert!(viewer.next_update().await.is_none());
}

#[tokio::test]
async fn test_live_viewer_polls_until_conversation_ends() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(conversation_path(7)))
        .respond_with(ResponseTemplate::new(200).set_body_json(conversation(
            7,
            "active",
            false,
            Some(vec![message(1, "user", "My car was hit")]),
        )))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(conversation_path(7)))
        .respond_with(ResponseTemplate::new(200).set_body_json(conversation(
            7,
            "completed",
            false,
            Some(vec![
                message(1, "user", "My car was hit"),
                message(2, "assistant", "Sorry to hear that. Are you safe?"),
            ]),
        )))
        .mount(&server)
        .await;

    let mut viewer = SessionViewer::live(authorized_backend(&server), viewer_config());
    viewer
        .open(ConversationId::new(7))
        .await
        .expect("open should succeed");
    assert!(viewer.is_polling());

    let update = tokio::time::timeout(Duration::from_secs(5), viewer.next_update())
        .await
        .expect("poll should deliver")
        .expect("an update");
    assert_eq!(update.source, UpdateSource::Poll);
    assert_eq!(update.conversation.messages.len(), 2);
    assert_eq!(update.conversation.status, ConversationStatus::Completed);

    // A finished conversation stops the poll
    let done = tokio::time::timeout(Duration::from_secs(5), viewer.next_update())
        .await
        .expect("viewer should settle");
    assert!(done.is_none());
    assert!(!viewer.is_polling());
}

#[tokio::test]
async fn test_toggle_then_send_posts_one_reply_and_refetches() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(conversation_path(9)))
        .respond_with(ResponseTemplate::new(200).set_body_json(conversation(
            9,
            "active",
            false,
            Some(vec![message(1, "user", "Can someone call me?")]),
        )))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(conversation_path(9)))
        .respond_with(ResponseTemplate::new(200).set_body_json(conversation(
            9,
            "active",
            true,
            Some(vec![message(1, "user", "Can someone call me?")]),
        )))
        .expect(2..)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/chatbot/conversations/9/toggle_manual_reply/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "manual_reply_active": true,
            "message": "Manual reply mode activated"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/chatbot/conversations/9/send_manual_reply/"))
        .and(body_json(json!({"message": "Calling you now"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "message": "Reply sent",
            "manual_reply_active": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut viewer = SessionViewer::new(authorized_backend(&server), viewer_config());
    viewer
        .open(ConversationId::new(9))
        .await
        .expect("open should succeed");

    // Manual mode is off: nothing is sent
    let skipped = viewer.send_reply("Calling you now").await.expect("skip");
    assert_eq!(skipped, SendOutcome::Skipped(SkipReason::ManualReplyOff));

    let toggled = viewer
        .toggle_manual_reply()
        .await
        .expect("toggle should succeed")
        .expect("a conversation is open");
    assert_eq!(toggled.headline(), "Manual reply enabled");
    assert!(viewer.selected().is_some_and(|c| c.manual_reply_active));

    let empty = viewer.send_reply("   ").await.expect("skip");
    assert_eq!(empty, SendOutcome::Skipped(SkipReason::EmptyMessage));

    let sent = viewer
        .send_reply("  Calling you now  ")
        .await
        .expect("send should succeed");
    assert!(matches!(sent, SendOutcome::Sent(_)));
}

#[tokio::test]
async fn test_live_reply_schedules_followup_refetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(conversation_path(12)))
        .respond_with(ResponseTemplate::new(200).set_body_json(conversation(
            12,
            "manual",
            true,
            Some(vec![message(1, "user", "Hello?")]),
        )))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/chatbot/conversations/12/send_manual_reply/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"message": "Reply sent"})))
        .expect(1)
        .mount(&server)
        .await;

    let mut viewer = SessionViewer::live(authorized_backend(&server), viewer_config());
    viewer
        .open(ConversationId::new(12))
        .await
        .expect("open should succeed");
    assert!(!viewer.is_polling());

    viewer.send_reply("We're here").await.expect("send");

    let update = tokio::time::timeout(Duration::from_secs(5), viewer.next_update())
        .await
        .expect("follow-up should arrive")
        .expect("an update");
    assert_eq!(update.source, UpdateSource::ReplyFollowup);
}

#[tokio::test]
async fn test_delete_requires_confirmation() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(conversation_path(4)))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/chatbot/conversations/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(conversation_page(vec![], None)))
        .mount(&server)
        .await;

    let mut viewer = SessionViewer::new(authorized_backend(&server), viewer_config());

    assert!(!viewer
        .delete(ConversationId::new(4), false)
        .await
        .expect("unconfirmed delete is a no-op"));
    assert!(viewer
        .delete(ConversationId::new(4), true)
        .await
        .expect("delete should succeed"));
    assert!(viewer.list().is_some_and(|page| page.results.is_empty()));
}

#[tokio::test]
async fn test_search_filters_without_refetch() {
    let server = MockServer::start().await;
    let mut other = conversation(2, "active", false, None);
    other["user_name"] = json!("Mary Jones");
    other["user_email"] = json!("mary@example.com");
    Mock::given(method("GET"))
        .and(path("/api/chatbot/conversations/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(conversation_page(
            vec![conversation(1, "active", false, None), other],
            None,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let mut viewer = SessionViewer::new(authorized_backend(&server), viewer_config());
    viewer.load().await.expect("load should succeed");

    viewer.set_search("MARY");
    let ids: Vec<i64> = viewer.visible().iter().map(|c| c.id.as_i64()).collect();
    assert_eq!(ids, vec![2]);

    viewer.set_search("");
    assert_eq!(viewer.visible().len(), 2);
}

// =============================================================================
// Admin accounts
// =============================================================================

fn all_admins() -> serde_json::Value {
    json!([
        admin(1, "pending@aaa-as.co.uk", "pending_approval"),
        admin(2, "active@aaa-as.co.uk", "active"),
        admin(3, "suspended@aaa-as.co.uk", "suspended"),
    ])
}

#[tokio::test]
async fn test_buckets_refilter_unfiltered_backend_list() {
    let server = MockServer::start().await;
    // The backend ignores the status filter and returns everyone
    Mock::given(method("GET"))
        .and(path("/api/auth/admins/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(all_admins()))
        .expect(3)
        .mount(&server)
        .await;

    let service = AdminAccountService::default();
    let api = authorized_backend(&server);
    let buckets = service.buckets(&api).await.expect("buckets should load");

    assert_eq!(buckets.get(AdminStatus::PendingApproval).len(), 1);
    assert_eq!(buckets.get(AdminStatus::Active).len(), 1);
    assert_eq!(buckets.get(AdminStatus::Suspended).len(), 1);

    // Served from cache
    service.buckets(&api).await.expect("cached buckets");
}

#[tokio::test]
async fn test_approve_patches_status_and_invalidates_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/admins/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(all_admins()))
        .expect(6)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/auth/admins/1/status/"))
        .and(body_json(json!({"status": "active"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let service = AdminAccountService::default();
    let api = authorized_backend(&server);
    service.buckets(&api).await.expect("buckets should load");

    let notice = service
        .apply(&api, AdminId::new(1), AdminStatus::PendingApproval, AdminAction::Approve)
        .await
        .expect("approve should succeed");
    assert_eq!(notice, "Admin activated");

    // The cache was dropped, so every bucket is fetched again
    service.buckets(&api).await.expect("buckets should reload");
}

#[tokio::test]
async fn test_disallowed_transition_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let service = AdminAccountService::default();
    let api = authorized_backend(&server);

    let err = service
        .apply(&api, AdminId::new(2), AdminStatus::Active, AdminAction::Reinstate)
        .await
        .expect_err("reinstating an active admin is not allowed");
    assert!(matches!(err, AccountError::Transition(_)));

    let deleted = service
        .delete(&api, AdminId::new(2), false)
        .await
        .expect("unconfirmed delete is a no-op");
    assert!(!deleted);
}

#[tokio::test]
async fn test_delete_admin_calls_user_endpoint_once() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/auth/users/3/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let api = authorized_backend(&server);
    api.delete_admin(AdminId::new(3))
        .await
        .expect("delete should succeed");
}
