//! Integration tests per gli endpoints degli utenti
//!
//! Test per:
//! - GET /api/users?search=name
//! - GET /api/users/{user_id}
//! - GET /api/users/{user_id}/friends
//! - GET /, GET /api/health

mod common;

#[cfg(test)]
mod user_tests {
    use super::common::*;
    use axum::http::HeaderName;
    use serde_json::Value;

    fn auth() -> HeaderName {
        HeaderName::from_static("authorization")
    }

    #[tokio::test]
    async fn test_root_and_health() {
        let app = create_test_app(true);

        app.server.get("/").await.assert_status_ok();

        let health: Value = app.server.get("/api/health").await.json();
        assert_eq!(health["status"], "OK");
    }

    #[tokio::test]
    async fn test_search_by_name_prefix() {
        let app = create_test_app(true);
        let (_alice, token) = seed_user(&app, "Alice", "alice@x.com", None).await;
        seed_user(&app, "Alfred", "alfred@x.com", None).await;
        seed_user(&app, "Bob", "bob@x.com", None).await;

        let response = app
            .server
            .get("/api/users")
            .add_query_param("search", "al")
            .add_header(auth(), bearer(&token))
            .await;

        response.assert_status_ok();
        let users: Vec<Value> = response.json();
        let names: Vec<&str> = users.iter().filter_map(|u| u["name"].as_str()).collect();
        assert_eq!(names, vec!["Alice", "Alfred"]);
    }

    #[tokio::test]
    async fn test_get_user_by_id() {
        let app = create_test_app(true);
        let (alice, token) = seed_user(&app, "Alice", "alice@x.com", Some("+393331234567")).await;

        let response = app
            .server
            .get(&format!("/api/users/{}", alice.user_id))
            .add_header(auth(), bearer(&token))
            .await;

        response.assert_status_ok();
        let user: Value = response.json();
        assert_eq!(user["id"], alice.user_id);
        assert_eq!(user["phone"], "+393331234567");
        assert!(user.get("password").is_none());

        app.server
            .get("/api/users/999")
            .add_header(auth(), bearer(&token))
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn test_friends_of_unknown_user() {
        let app = create_test_app(true);
        let (alice, token) = seed_user(&app, "Alice", "alice@x.com", None).await;

        let friends: Vec<Value> = app
            .server
            .get(&format!("/api/users/{}/friends", alice.user_id))
            .add_header(auth(), bearer(&token))
            .await
            .json();
        assert!(friends.is_empty());

        app.server
            .get("/api/users/999/friends")
            .add_header(auth(), bearer(&token))
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn test_users_require_token() {
        let app = create_test_app(true);

        app.server
            .get("/api/users/1")
            .await
            .assert_status_unauthorized();
    }
}
