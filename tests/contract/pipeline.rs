use std::time::Duration;

use bungie_link::bungie::{PipelineError, PipelineState};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::common::{
    Harness, MEMBERSHIPS_PATH, PROFILE_PATH, forbid_profile, mount_memberships, mount_profile,
    profile_body, steam_membership,
};

#[tokio::test]
async fn test_pipeline_happy_path() {
    let h = Harness::start().await;
    h.sign_in();
    mount_memberships(&h.server, steam_membership(), 1).await;
    mount_profile(&h.server, profile_body(), 1).await;

    let snapshot = h.state.pipeline.run(&h.session).await.unwrap();
    assert!(snapshot.response.get("characterEquipment").is_some());
    assert_eq!(h.state.pipeline.last_state(), PipelineState::Completed);
}

#[tokio::test]
async fn test_missing_credentials_issue_no_request() {
    let h = Harness::start().await;

    let err = h.state.pipeline.run(&h.session).await.unwrap_err();
    assert!(matches!(err, PipelineError::MissingCredentials));
    assert!(h.request_paths().await.is_empty());
}

#[tokio::test]
async fn test_lookup_failure_reads_text_and_stops() {
    let h = Harness::start().await;
    h.sign_in();
    Mock::given(method("GET"))
        .and(path(MEMBERSHIPS_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .expect(1)
        .mount(&h.server)
        .await;
    forbid_profile(&h.server).await;

    let err = h.state.pipeline.run(&h.session).await.unwrap_err();
    match err {
        PipelineError::Status {
            operation,
            status,
            body,
        } => {
            assert_eq!(operation, "GetMembershipsById");
            assert_eq!(status, 500);
            assert_eq!(body, "Internal Server Error");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(h.state.pipeline.last_state(), PipelineState::Failed);
}

#[tokio::test]
async fn test_empty_membership_list_skips_profile() {
    let h = Harness::start().await;
    h.sign_in();
    mount_memberships(&h.server, json!([]), 1).await;
    forbid_profile(&h.server).await;

    let err = h.state.pipeline.run(&h.session).await.unwrap_err();
    assert!(matches!(err, PipelineError::NoLinkedProfiles));
}

#[tokio::test]
async fn test_absent_response_skips_profile() {
    let h = Harness::start().await;
    h.sign_in();
    Mock::given(method("GET"))
        .and(path(MEMBERSHIPS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ErrorCode": 99,
            "ErrorStatus": "WebAuthRequired"
        })))
        .expect(1)
        .mount(&h.server)
        .await;
    forbid_profile(&h.server).await;

    let err = h.state.pipeline.run(&h.session).await.unwrap_err();
    assert!(matches!(err, PipelineError::NoLinkedProfiles));
}

#[tokio::test]
async fn test_first_membership_wins() {
    let h = Harness::start().await;
    h.sign_in();
    mount_memberships(
        &h.server,
        json!([
            { "membershipType": 3, "membershipId": "D1" },
            { "membershipType": 2, "membershipId": "D2" }
        ]),
        1,
    )
    .await;
    mount_profile(&h.server, profile_body(), 1).await;

    h.state.pipeline.run(&h.session).await.unwrap();
    assert_eq!(
        h.request_paths().await,
        vec![MEMBERSHIPS_PATH.to_string(), PROFILE_PATH.to_string()]
    );
}

#[tokio::test]
async fn test_profile_without_response_is_malformed() {
    let h = Harness::start().await;
    h.sign_in();
    mount_memberships(&h.server, steam_membership(), 1).await;
    mount_profile(&h.server, json!({ "ErrorCode": 1 }), 1).await;

    let err = h.state.pipeline.run(&h.session).await.unwrap_err();
    assert!(matches!(err, PipelineError::MalformedResponse("GetProfile")));
}

#[tokio::test]
async fn test_undecodable_lookup_body() {
    let h = Harness::start().await;
    h.sign_in();
    Mock::given(method("GET"))
        .and(path(MEMBERSHIPS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .expect(1)
        .mount(&h.server)
        .await;
    forbid_profile(&h.server).await;

    let err = h.state.pipeline.run(&h.session).await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Decode {
            operation: "GetMembershipsById",
            ..
        }
    ));
}

#[tokio::test]
async fn test_repeated_runs_repeat_both_requests() {
    let h = Harness::start().await;
    h.sign_in();
    mount_memberships(&h.server, steam_membership(), 2).await;
    mount_profile(&h.server, profile_body(), 2).await;

    let first = h.state.pipeline.run(&h.session).await.unwrap();
    let second = h.state.pipeline.run(&h.session).await.unwrap();
    assert_eq!(first, second);

    assert_eq!(
        h.request_paths().await,
        vec![
            MEMBERSHIPS_PATH.to_string(),
            PROFILE_PATH.to_string(),
            MEMBERSHIPS_PATH.to_string(),
            PROFILE_PATH.to_string(),
        ]
    );
}

#[tokio::test]
async fn test_last_state_follows_latest_finished_run() {
    let h = Harness::start().await;
    assert_eq!(h.state.pipeline.last_state(), PipelineState::Idle);

    h.state.pipeline.run(&h.session).await.unwrap_err();
    assert_eq!(h.state.pipeline.last_state(), PipelineState::Failed);

    h.sign_in();
    mount_memberships(&h.server, steam_membership(), 1).await;
    mount_profile(&h.server, profile_body(), 1).await;
    h.state.pipeline.run(&h.session).await.unwrap();
    assert_eq!(h.state.pipeline.last_state(), PipelineState::Completed);
}

#[tokio::test]
async fn test_in_flight_run_does_not_replace_last_outcome() {
    let h = Harness::start().await;
    h.sign_in();
    Mock::given(method("GET"))
        .and(path(MEMBERSHIPS_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({
                    "Response": { "destinyMemberships": steam_membership() },
                    "ErrorCode": 1
                }))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&h.server)
        .await;
    mount_profile(&h.server, profile_body(), 1).await;

    let observe = async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        h.state.pipeline.last_state()
    };
    let (result, observed) = tokio::join!(h.state.pipeline.run(&h.session), observe);

    result.unwrap();
    assert_eq!(observed, PipelineState::Idle);
    assert_eq!(h.state.pipeline.last_state(), PipelineState::Completed);
}
