use bungie_link::oauth::{CallbackOutcome, CallbackParams, OAuthError};
use bungie_link::storage::CREDENTIAL_KEYS;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::common::{
    Harness, TOKEN_PATH, mount_memberships, mount_profile, mount_token_grant, profile_body,
    steam_membership,
};

fn callback(code: &str, state: &str) -> CallbackParams {
    CallbackParams {
        code: Some(code.to_string()),
        state: Some(state.to_string()),
        ..CallbackParams::default()
    }
}

#[tokio::test]
async fn test_login_round_trip() {
    let h = Harness::start().await;
    mount_token_grant(&h.server, 1).await;
    mount_memberships(&h.server, steam_membership(), 1).await;
    mount_profile(&h.server, profile_body(), 1).await;

    let request = h.state.dispatcher.dispatch(&h.session).unwrap();
    assert!(request.url.contains(&format!(
        "client_id=50382&response_type=code&state={}",
        request.state
    )));
    assert_eq!(request.state.len(), 16);

    let outcome = h
        .state
        .callback
        .handle(&callback("C", &request.state), &h.session)
        .await;

    let CallbackOutcome::Completed {
        credentials,
        profile,
    } = outcome
    else {
        panic!("expected a completed login, got {outcome:?}");
    };
    assert_eq!(credentials.access_token, "T");
    assert_eq!(credentials.expires_in, 3600);
    assert_eq!(credentials.membership_id, "M");

    let profile = profile.unwrap();
    assert_eq!(profile.response["profileInventory"]["privacy"], 1);

    let store = h.session.persistent();
    let mut keys = store.keys().unwrap();
    keys.sort();
    let mut expected: Vec<String> = CREDENTIAL_KEYS.iter().map(|k| k.to_string()).collect();
    expected.sort();
    assert_eq!(keys, expected);
    assert_eq!(store.get("bungie_access_token").unwrap().as_deref(), Some("T"));
    assert_eq!(store.get("bungie_expires_in").unwrap().as_deref(), Some("3600"));
    assert_eq!(store.get("bungie_membership_id").unwrap().as_deref(), Some("M"));

    assert_eq!(
        h.request_paths().await,
        vec![
            TOKEN_PATH.to_string(),
            crate::common::MEMBERSHIPS_PATH.to_string(),
            crate::common::PROFILE_PATH.to_string(),
        ]
    );
    // The state token is single use.
    assert!(h.session.take_state().unwrap().is_none());
}

#[tokio::test]
async fn test_state_mismatch_never_exchanges() {
    let h = Harness::start().await;
    mount_token_grant(&h.server, 0).await;

    h.state.dispatcher.dispatch(&h.session).unwrap();
    let outcome = h
        .state
        .callback
        .handle(&callback("C", "forgedforgedforg"), &h.session)
        .await;

    assert!(matches!(
        outcome,
        CallbackOutcome::Failed(OAuthError::StateMismatch)
    ));
    assert!(h.request_paths().await.is_empty());
    assert!(h.session.persistent().keys().unwrap().is_empty());
}

#[tokio::test]
async fn test_replayed_callback_is_rejected() {
    let h = Harness::start().await;
    mount_token_grant(&h.server, 1).await;
    mount_memberships(&h.server, steam_membership(), 1).await;
    mount_profile(&h.server, profile_body(), 1).await;

    let request = h.state.dispatcher.dispatch(&h.session).unwrap();
    let params = callback("C", &request.state);

    let first = h.state.callback.handle(&params, &h.session).await;
    assert!(matches!(first, CallbackOutcome::Completed { .. }));

    let second = h.state.callback.handle(&params, &h.session).await;
    assert!(matches!(
        second,
        CallbackOutcome::Failed(OAuthError::StateMismatch)
    ));
}

#[tokio::test]
async fn test_token_error_writes_nothing() {
    let h = Harness::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "AuthorizationCodeInvalid"
        })))
        .expect(1)
        .mount(&h.server)
        .await;
    mount_memberships(&h.server, steam_membership(), 0).await;

    let request = h.state.dispatcher.dispatch(&h.session).unwrap();
    let outcome = h
        .state
        .callback
        .handle(&callback("C", &request.state), &h.session)
        .await;

    match outcome {
        CallbackOutcome::Failed(OAuthError::Provider { error, description }) => {
            assert_eq!(error, "invalid_grant");
            assert_eq!(description.as_deref(), Some("AuthorizationCodeInvalid"));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(h.session.persistent().keys().unwrap().is_empty());
}

#[tokio::test]
async fn test_token_endpoint_non_json_is_decode_error() {
    let h = Harness::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .expect(1)
        .mount(&h.server)
        .await;

    let request = h.state.dispatcher.dispatch(&h.session).unwrap();
    let outcome = h
        .state
        .callback
        .handle(&callback("C", &request.state), &h.session)
        .await;

    assert!(matches!(
        outcome,
        CallbackOutcome::Failed(OAuthError::Decode(_))
    ));
    assert!(h.session.persistent().keys().unwrap().is_empty());
}

#[tokio::test]
async fn test_profile_failure_still_completes_login() {
    let h = Harness::start().await;
    mount_token_grant(&h.server, 1).await;
    mount_memberships(&h.server, json!([]), 1).await;

    let request = h.state.dispatcher.dispatch(&h.session).unwrap();
    let outcome = h
        .state
        .callback
        .handle(&callback("C", &request.state), &h.session)
        .await;

    match outcome {
        CallbackOutcome::Completed { profile, .. } => {
            assert!(matches!(
                profile,
                Err(bungie_link::bungie::PipelineError::NoLinkedProfiles)
            ));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(h.session.persistent().keys().unwrap().len(), 3);
}
