use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use bungie_link::build_app;
use tower::ServiceExt;

use crate::common::{
    AUTHORIZE_PATH, Harness, mount_memberships, mount_profile, mount_token_grant, profile_body,
    steam_membership,
};

async fn get(h: &Harness, uri: &str) -> Response {
    build_app(h.state.clone())
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

#[tokio::test]
async fn test_login_redirects_to_authorize() {
    let h = Harness::start().await;

    let response = get(&h, "/login").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let prefix = format!(
        "{}{}?client_id=50382&response_type=code&state=",
        h.server.uri(),
        AUTHORIZE_PATH
    );
    let target = location(&response).to_string();
    let state = target.strip_prefix(&prefix).unwrap();
    assert_eq!(state.len(), 16);
    assert!(state.chars().all(|c| c.is_ascii_alphanumeric()));
    assert_eq!(h.session.take_state().unwrap().as_deref(), Some(state));
}

#[tokio::test]
async fn test_response_carries_request_id() {
    let h = Harness::start().await;
    let response = get(&h, "/health").await;
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_callback_completes_and_strips_query() {
    let h = Harness::start().await;
    mount_token_grant(&h.server, 1).await;
    mount_memberships(&h.server, steam_membership(), 1).await;
    mount_profile(&h.server, profile_body(), 1).await;
    h.session.store_state("abcdefgh12345678").unwrap();

    let response = get(&h, "/?code=C&state=abcdefgh12345678").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    assert_eq!(h.session.membership_id().unwrap().as_deref(), Some("M"));
}

#[tokio::test]
async fn test_callback_route_path_is_preserved() {
    let h = Harness::start().await;
    mount_token_grant(&h.server, 1).await;
    mount_memberships(&h.server, steam_membership(), 1).await;
    mount_profile(&h.server, profile_body(), 1).await;
    h.session.store_state("abcdefgh12345678").unwrap();

    let response = get(&h, "/callback?code=C&state=abcdefgh12345678").await;
    assert_eq!(location(&response), "/callback");
}

#[tokio::test]
async fn test_empty_code_renders_landing_page() {
    let h = Harness::start().await;
    mount_token_grant(&h.server, 0).await;
    h.session.store_state("abcdefgh12345678").unwrap();

    let response = get(&h, "/?code=&state=abcdefgh12345678").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("login-button"));
    assert!(h.request_paths().await.is_empty());
    assert_eq!(
        h.session.take_state().unwrap().as_deref(),
        Some("abcdefgh12345678")
    );
}

#[tokio::test]
async fn test_callback_state_mismatch_renders_error() {
    let h = Harness::start().await;
    mount_token_grant(&h.server, 0).await;
    h.session.store_state("abcdefgh12345678").unwrap();

    let response = get(&h, "/callback?code=C&state=zzzzzzzzzzzzzzzz").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let html = body_text(response).await;
    assert!(html.contains("State token mismatch"));
    assert!(h.request_paths().await.is_empty());
}

#[tokio::test]
async fn test_callback_denied_renders_description() {
    let h = Harness::start().await;
    h.session.store_state("abcdefgh12345678").unwrap();

    let response = get(
        &h,
        "/?error=access_denied&error_description=User+declined&state=abcdefgh12345678",
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let html = body_text(response).await;
    assert!(html.contains("User declined"));
    assert!(h.request_paths().await.is_empty());
}

#[tokio::test]
async fn test_index_signed_out() {
    let h = Harness::start().await;
    let response = get(&h, "/").await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("login-button"));
}

#[tokio::test]
async fn test_index_signed_in_shows_class_selection() {
    let h = Harness::start().await;
    h.sign_in();
    let html = body_text(get(&h, "/").await).await;
    assert!(html.contains("name=\"character-class\""));
    assert!(html.contains("id=\"titan\""));
}

#[tokio::test]
async fn test_profile_requires_sign_in() {
    let h = Harness::start().await;
    let response = get(&h, "/api/profile?class=hunter").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["error"]["type"], "authentication_error");
    assert!(h.request_paths().await.is_empty());
}

#[tokio::test]
async fn test_profile_rejects_unknown_class() {
    let h = Harness::start().await;
    h.sign_in();
    let response = get(&h, "/api/profile?class=gardener").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(h.request_paths().await.is_empty());
}

#[tokio::test]
async fn test_profile_selection_reruns_pipeline() {
    let h = Harness::start().await;
    h.sign_in();
    mount_memberships(&h.server, steam_membership(), 2).await;
    mount_profile(&h.server, profile_body(), 2).await;

    for class in ["titan", "warlock"] {
        let response = get(&h, &format!("/api/profile?class={class}")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["class"], class);
        assert_eq!(json["profile"]["profileInventory"]["privacy"], 1);
    }
}

#[tokio::test]
async fn test_profile_upstream_error_maps_to_bad_gateway() {
    let h = Harness::start().await;
    h.sign_in();
    wiremock::Mock::given(wiremock::matchers::method("GET"))
        .respond_with(wiremock::ResponseTemplate::new(503).set_body_string("Maintenance"))
        .mount(&h.server)
        .await;

    let response = get(&h, "/api/profile").await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_logout_clears_credentials() {
    let h = Harness::start().await;
    h.sign_in();

    let response = get(&h, "/logout").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    assert!(h.session.access_token().unwrap().is_none());
    assert!(h.session.persistent().keys().unwrap().is_empty());
}

#[tokio::test]
async fn test_health_reports_session() {
    let h = Harness::start().await;
    let response = get(&h, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["signed_in"], false);
    assert_eq!(json["pipeline"], "idle");
    assert_eq!(json["storage"], "memory");
}
