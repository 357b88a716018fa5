//! Integration tests per gli endpoints degli inviti
//!
//! Test per:
//! - POST /api/invitations/send
//! - GET /api/invitations
//! - GET /api/invitations/pending
//! - POST /api/invitations/accept/{token}
//! - POST /api/invitations/decline/{token}
//! - POST /api/invitations/{invite_id}/sms
//!
//! Girano sugli store in memoria con un provider email finto.

mod common;

#[cfg(test)]
mod invitation_tests {
    use super::common::*;
    use axum::http::HeaderName;
    use chrono::{Duration, Utc};
    use ratify_server::entities::{Invitation, InvitationStatus};
    use ratify_server::repositories::{Read, UserStore};
    use serde_json::{Value, json};

    fn auth() -> HeaderName {
        HeaderName::from_static("authorization")
    }

    // ============================================================
    // Test per POST /api/invitations/send - send_invitation
    // ============================================================

    #[tokio::test]
    async fn test_send_to_unregistered_email() {
        let app = create_test_app(true);
        let (_alice, token) = seed_user(&app, "Alice", "alice@x.com", None).await;

        let response = app
            .server
            .post("/api/invitations/send")
            .add_header(auth(), bearer(&token))
            .json(&json!({ "recipientEmail": "a@x.com", "message": "join me!" }))
            .await;

        response.assert_status(axum::http::StatusCode::CREATED);
        let body: Value = response.json();
        assert_eq!(body["delivered"], true);
        assert_eq!(body["provider"], "ethereal");
        assert_eq!(body["preview_url"], "https://ethereal.email/message/MSG1");
        assert!(body.get("delivery_warning").is_none());

        let invite_id = body["invitation_id"].as_i64().unwrap() as i32;
        let invitation = app.invitations.read(&invite_id).await.unwrap().unwrap();
        assert_eq!(invitation.status, InvitationStatus::Pending);
        assert_eq!(invitation.recipient_id, None);
        assert_eq!(invitation.message, "join me!");

        let sent = app.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "a@x.com");
        assert!(sent[0].text.contains(&format!(
            "{}/accept-invite/{}",
            FRONTEND_URL, invitation.invite_token
        )));
        assert!(sent[0].html.contains("join me!"));
    }

    #[tokio::test]
    async fn test_send_survives_delivery_failure() {
        let app = create_test_app(false);
        let (_alice, token) = seed_user(&app, "Alice", "alice@x.com", None).await;

        let response = app
            .server
            .post("/api/invitations/send")
            .add_header(auth(), bearer(&token))
            .json(&json!({ "recipient_email": "a@x.com" }))
            .await;

        response.assert_status(axum::http::StatusCode::CREATED);
        let body: Value = response.json();
        assert_eq!(body["delivered"], false);
        assert_eq!(
            body["delivery_warning"],
            "sandbox account unavailable: connection refused"
        );
        assert!(body["invitation_id"].as_i64().is_some());
    }

    #[tokio::test]
    async fn test_send_requires_a_contact() {
        let app = create_test_app(true);
        let (_alice, token) = seed_user(&app, "Alice", "alice@x.com", None).await;

        let response = app
            .server
            .post("/api/invitations/send")
            .add_header(auth(), bearer(&token))
            .json(&json!({ "recipientEmail": "  ", "message": "hi" }))
            .await;

        response.assert_status_bad_request();
        assert!(app.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_send_rejects_malformed_contacts() {
        let app = create_test_app(true);
        let (_alice, token) = seed_user(&app, "Alice", "alice@x.com", None).await;

        let response = app
            .server
            .post("/api/invitations/send")
            .add_header(auth(), bearer(&token))
            .json(&json!({ "recipientEmail": "not-an-email" }))
            .await;
        response.assert_status_bad_request();

        let response = app
            .server
            .post("/api/invitations/send")
            .add_header(auth(), bearer(&token))
            .json(&json!({ "recipientPhone": "call me" }))
            .await;
        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn test_send_without_token() {
        let app = create_test_app(true);

        let response = app
            .server
            .post("/api/invitations/send")
            .json(&json!({ "recipientEmail": "a@x.com" }))
            .await;

        response.assert_status_unauthorized();
    }

    // ============================================================
    // Test per accept / decline
    // ============================================================

    #[tokio::test]
    async fn test_accept_makes_users_friends() {
        let app = create_test_app(true);
        let (alice, alice_token) = seed_user(&app, "Alice", "alice@x.com", None).await;
        let (bob, bob_token) = seed_user(&app, "Bob", "bob@x.com", None).await;

        let body: Value = app
            .server
            .post("/api/invitations/send")
            .add_header(auth(), bearer(&alice_token))
            .json(&json!({ "recipientEmail": "bob@x.com" }))
            .await
            .json();
        let invite_id = body["invitation_id"].as_i64().unwrap() as i32;
        let invitation = app.invitations.read(&invite_id).await.unwrap().unwrap();
        assert_eq!(invitation.recipient_id, Some(bob.user_id));

        let response = app
            .server
            .post(&format!("/api/invitations/accept/{}", invitation.invite_token))
            .add_header(auth(), bearer(&bob_token))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["invitation"]["status"], "accepted");
        assert_eq!(body["friend"]["email"], "alice@x.com");
        assert!(body["friend"].get("password").is_none());
        assert!(body["invitation"].get("invite_token").is_none());

        assert_eq!(app.users.friend_ids(&alice.user_id).await.unwrap(), vec![bob.user_id]);
        assert_eq!(app.users.friend_ids(&bob.user_id).await.unwrap(), vec![alice.user_id]);

        let friends: Vec<Value> = app
            .server
            .get(&format!("/api/users/{}/friends", bob.user_id))
            .add_header(auth(), bearer(&bob_token))
            .await
            .json();
        assert_eq!(friends.len(), 1);
        assert_eq!(friends[0]["name"], "Alice");
    }

    #[tokio::test]
    async fn test_concurrent_accepts_are_idempotent() {
        let app = create_test_app(true);
        let (alice, alice_token) = seed_user(&app, "Alice", "alice@x.com", None).await;
        let (bob, bob_token) = seed_user(&app, "Bob", "bob@x.com", None).await;

        let body: Value = app
            .server
            .post("/api/invitations/send")
            .add_header(auth(), bearer(&alice_token))
            .json(&json!({ "recipientEmail": "bob@x.com" }))
            .await
            .json();
        let invite_id = body["invitation_id"].as_i64().unwrap() as i32;
        let token = app
            .invitations
            .read(&invite_id)
            .await
            .unwrap()
            .unwrap()
            .invite_token;
        let path = format!("/api/invitations/accept/{}", token);

        let (first, second) = tokio::join!(
            async { app.server.post(&path).add_header(auth(), bearer(&bob_token)).await },
            async { app.server.post(&path).add_header(auth(), bearer(&bob_token)).await }
        );

        first.assert_status_ok();
        second.assert_status_ok();
        assert_eq!(app.users.friend_ids(&alice.user_id).await.unwrap(), vec![bob.user_id]);
        assert_eq!(app.users.friend_ids(&bob.user_id).await.unwrap(), vec![alice.user_id]);
    }

    #[tokio::test]
    async fn test_accept_expired_is_gone() {
        let app = create_test_app(true);
        let (alice, _) = seed_user(&app, "Alice", "alice@x.com", None).await;
        let (bob, bob_token) = seed_user(&app, "Bob", "bob@x.com", None).await;

        let expires_at = Utc::now() - Duration::seconds(1);
        app.invitations
            .insert_raw(Invitation {
                invite_id: 500,
                sender_id: alice.user_id,
                recipient_email: Some("bob@x.com".to_string()),
                recipient_phone: None,
                recipient_id: Some(bob.user_id),
                status: InvitationStatus::Pending,
                message: String::new(),
                invite_token: "f".repeat(64),
                created_at: expires_at - Duration::days(7),
                expires_at,
            })
            .unwrap();

        let response = app
            .server
            .post(&format!("/api/invitations/accept/{}", "f".repeat(64)))
            .add_header(auth(), bearer(&bob_token))
            .await;

        response.assert_status(axum::http::StatusCode::GONE);
        assert!(app.users.friend_ids(&alice.user_id).await.unwrap().is_empty());
        assert!(app.users.friend_ids(&bob.user_id).await.unwrap().is_empty());

        // il rifiuto non guarda la scadenza
        let response = app
            .server
            .post(&format!("/api/invitations/decline/{}", "f".repeat(64)))
            .add_header(auth(), bearer(&bob_token))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], "declined");
    }

    #[tokio::test]
    async fn test_unknown_token_is_not_found() {
        let app = create_test_app(true);
        let (_bob, bob_token) = seed_user(&app, "Bob", "bob@x.com", None).await;

        let response = app
            .server
            .post("/api/invitations/accept/deadbeef")
            .add_header(auth(), bearer(&bob_token))
            .await;
        response.assert_status_not_found();
        let body: Value = response.json();
        assert_eq!(body["error"], "Invitation not found");

        let response = app
            .server
            .post("/api/invitations/decline/deadbeef")
            .add_header(auth(), bearer(&bob_token))
            .await;
        response.assert_status_not_found();
    }

    // ============================================================
    // Test per GET /api/invitations e /api/invitations/pending
    // ============================================================

    #[tokio::test]
    async fn test_pending_matches_email_of_late_registration() {
        let app = create_test_app(true);
        let (_alice, alice_token) = seed_user(&app, "Alice", "alice@x.com", None).await;

        app.server
            .post("/api/invitations/send")
            .add_header(auth(), bearer(&alice_token))
            .json(&json!({ "recipientEmail": "carol@x.com" }))
            .await
            .assert_status(axum::http::StatusCode::CREATED);

        let (_carol, carol_token) = seed_user(&app, "Carol", "carol@x.com", None).await;

        let response = app
            .server
            .get("/api/invitations/pending")
            .add_header(auth(), bearer(&carol_token))
            .await;

        response.assert_status_ok();
        let pending: Vec<Value> = response.json();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0]["recipient_email"], "carol@x.com");
        assert_eq!(pending[0]["sender"]["name"], "Alice");
        assert!(pending[0]["recipient"].is_null());
        assert!(pending[0].get("invite_token").is_none());
    }

    #[tokio::test]
    async fn test_list_embeds_sender_and_recipient_profiles() {
        let app = create_test_app(true);
        let (_alice, alice_token) = seed_user(&app, "Alice", "alice@x.com", None).await;
        let (bob, _bob_token) = seed_user(&app, "Bob", "bob@x.com", None).await;

        app.server
            .post("/api/invitations/send")
            .add_header(auth(), bearer(&alice_token))
            .json(&json!({ "recipientEmail": "bob@x.com" }))
            .await
            .assert_status(axum::http::StatusCode::CREATED);

        let all: Vec<Value> = app
            .server
            .get("/api/invitations")
            .add_header(auth(), bearer(&alice_token))
            .await
            .json();

        assert_eq!(all.len(), 1);
        assert_eq!(all[0]["sender"]["name"], "Alice");
        assert_eq!(all[0]["recipient"]["id"], bob.user_id);
        assert_eq!(all[0]["recipient"]["name"], "Bob");
        assert!(all[0]["recipient"].get("password").is_none());
    }

    #[tokio::test]
    async fn test_list_all_is_newest_first() {
        let app = create_test_app(true);
        let (_alice, alice_token) = seed_user(&app, "Alice", "alice@x.com", None).await;

        for email in ["one@x.com", "two@x.com"] {
            app.server
                .post("/api/invitations/send")
                .add_header(auth(), bearer(&alice_token))
                .json(&json!({ "recipientEmail": email }))
                .await
                .assert_status(axum::http::StatusCode::CREATED);
        }

        let all: Vec<Value> = app
            .server
            .get("/api/invitations")
            .add_header(auth(), bearer(&alice_token))
            .await
            .json();

        assert_eq!(all.len(), 2);
        assert_eq!(all[0]["recipient_email"], "two@x.com");
        assert_eq!(all[1]["recipient_email"], "one@x.com");
    }

    // ============================================================
    // Test per POST /api/invitations/{invite_id}/sms
    // ============================================================

    #[tokio::test]
    async fn test_sms_without_twilio_is_unavailable() {
        let app = create_test_app(true);
        let (_alice, alice_token) = seed_user(&app, "Alice", "alice@x.com", None).await;
        let (_bob, bob_token) = seed_user(&app, "Bob", "bob@x.com", None).await;

        let body: Value = app
            .server
            .post("/api/invitations/send")
            .add_header(auth(), bearer(&alice_token))
            .json(&json!({ "recipientPhone": "+393331234567" }))
            .await
            .json();
        let invite_id = body["invitation_id"].as_i64().unwrap();
        assert_eq!(body["delivered"], false);

        app.server
            .post(&format!("/api/invitations/{}/sms", invite_id))
            .add_header(auth(), bearer(&bob_token))
            .await
            .assert_status_forbidden();

        app.server
            .post(&format!("/api/invitations/{}/sms", invite_id))
            .add_header(auth(), bearer(&alice_token))
            .await
            .assert_status(axum::http::StatusCode::SERVICE_UNAVAILABLE);
    }
}
