mod common;

use syntaxly_gateway::types::{LoginRequest, RegisterRequest};
use syntaxly_gateway::{Error, RequestOptions};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn login_request() -> LoginRequest {
    LoginRequest {
        login: "ada".into(),
        password: "secret".into(),
    }
}

async fn mount_login(server: &MockServer, token: &str) {
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_partial_json(serde_json::json!({ "login": "ada" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "accessToken": token,
            "user": { "id": 5, "login": "ada", "full_name": "Ada Lovelace", "role": "user" }
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn restore_adopts_refreshed_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "accessToken": "R1",
            "user": { "id": 5, "full_name": "Ada Lovelace" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (session, _navigator) = common::session(&server);
    assert!(session.restore().await);
    assert_eq!(session.access_token().await.as_deref(), Some("R1"));
    assert_eq!(session.user().await.map(|u| u.id), Some(5));
}

#[tokio::test]
async fn restore_without_cookie_stays_signed_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let (session, navigator) = common::session(&server);
    assert!(!session.restore().await);
    assert!(session.snapshot().await.is_none());
    assert!(navigator.routes().is_empty(), "restore never redirects");
}

#[tokio::test]
async fn login_failure_surfaces_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(serde_json::json!({ "message": "Invalid credentials" })),
        )
        .mount(&server)
        .await;

    let (session, _navigator) = common::session(&server);
    match session.login(&login_request()).await {
        Err(Error::Auth(msg)) => assert_eq!(msg, "Invalid credentials"),
        other => panic!("expected auth error, got {:?}", other.map(|_| ())),
    }
    assert!(session.access_token().await.is_none());
}

#[tokio::test]
async fn session_requests_adopt_refreshed_credential() {
    let server = MockServer::start().await;
    mount_login(&server, "L1").await;

    Mock::given(method("POST"))
        .and(path("/posts/9/vote"))
        .and(header("Authorization", "Bearer L1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/posts/9/vote"))
        .and(header("Authorization", "Bearer L2"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/notifications"))
        .and(header("Authorization", "Bearer L2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "accessToken": "L2" })))
        .expect(1)
        .mount(&server)
        .await;

    let (session, _navigator) = common::session(&server);
    session.login(&login_request()).await.expect("login succeeds");
    assert_eq!(session.access_token().await.as_deref(), Some("L1"));

    let options = RequestOptions::new(reqwest::Method::POST)
        .json(&serde_json::json!({ "type": "like" }))
        .unwrap();
    let resp = session.request("/posts/9/vote", options).await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(session.access_token().await.as_deref(), Some("L2"));

    let notifications: Vec<serde_json::Value> = session.get_json("/notifications").await.unwrap();
    assert!(notifications.is_empty());
}

#[tokio::test]
async fn expired_session_is_cleared() {
    let server = MockServer::start().await;
    mount_login(&server, "L1").await;

    Mock::given(method("GET"))
        .and(path("/users/me/favorites"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let (session, navigator) = common::session(&server);
    session.login(&login_request()).await.unwrap();
    let err = session
        .request("/users/me/favorites", RequestOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::SessionExpired));
    assert!(session.snapshot().await.is_none());
    assert_eq!(navigator.routes(), vec!["/auth/login".to_string()]);
}

#[tokio::test]
async fn logout_clears_state_even_when_server_fails() {
    let server = MockServer::start().await;
    mount_login(&server, "L1").await;
    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let (session, _navigator) = common::session(&server);
    session.login(&login_request()).await.unwrap();
    session.logout().await;
    assert!(session.snapshot().await.is_none());
}

#[tokio::test]
async fn register_sends_full_name() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/register"))
        .and(body_partial_json(serde_json::json!({
            "login": "ada",
            "full_name": "Ada Lovelace"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({ "message": "check your email" })))
        .expect(1)
        .mount(&server)
        .await;

    let (session, _navigator) = common::session(&server);
    let body = session
        .register(&RegisterRequest {
            login: "ada".into(),
            email: "ada@example.com".into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            password: "secret".into(),
            confirm_password: "secret".into(),
        })
        .await
        .unwrap();
    assert_eq!(body["message"], "check your email");
}

#[tokio::test]
async fn fetch_user_refreshes_own_profile() {
    let server = MockServer::start().await;
    mount_login(&server, "L1").await;
    Mock::given(method("GET"))
        .and(path("/users/5"))
        .and(header("Authorization", "Bearer L1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "user": { "id": 5, "full_name": "Ada King", "rating": 42 }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/404"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let (session, _navigator) = common::session(&server);
    session.login(&login_request()).await.unwrap();

    let fetched = session.fetch_user("5").await.expect("user exists");
    assert_eq!(fetched.rating, Some(42));
    assert_eq!(
        session.user().await.and_then(|u| u.full_name).as_deref(),
        Some("Ada King")
    );
    assert!(session.fetch_user("404").await.is_none());
}

#[tokio::test]
async fn session_wrappers_carry_body_and_adopt_refresh() {
    let server = MockServer::start().await;
    mount_login(&server, "L1").await;

    Mock::given(method("PUT"))
        .and(path("/users/5"))
        .and(header("Authorization", "Bearer L1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/users/5"))
        .and(header("Authorization", "Bearer L2"))
        .and(body_partial_json(serde_json::json!({ "full_name": "Ada King" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/subscriptions/12"))
        .and(header("Authorization", "Bearer L2"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "accessToken": "L2" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (session, _navigator) = common::session(&server);
    session.login(&login_request()).await.unwrap();

    let resp = session
        .put("/users/5", &serde_json::json!({ "full_name": "Ada King" }))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(session.access_token().await.as_deref(), Some("L2"));

    let resp = session.delete("/subscriptions/12").await.unwrap();
    assert_eq!(resp.status(), 204);
}

#[tokio::test]
async fn session_wrapper_without_login_clears_and_redirects() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/posts"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let (session, navigator) = common::session(&server);
    let err = session
        .post("/posts", &serde_json::json!({ "title": "t" }))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::AuthenticationRequired));
    assert!(session.snapshot().await.is_none());
    assert_eq!(navigator.routes(), vec!["/auth/login".to_string()]);
}
