//! Permission coordinator tests

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;

use geotrace::{
    InProcessTransport, PermissionConfig, PermissionCoordinator, PermissionState, TrackerError,
};

fn coordinator_over(transport: &Arc<InProcessTransport>) -> PermissionCoordinator {
    PermissionCoordinator::new(transport.clone(), PermissionConfig::default())
}

#[tokio::test]
async fn test_already_granted_skips_native_request() {
    let transport = Arc::new(InProcessTransport::new());
    let coordinator = coordinator_over(&transport);

    let handle = tokio::spawn(async move { coordinator.request_permission().await });
    sleep(Duration::from_millis(50)).await;
    transport.emit_permission_code(1);

    let state = handle.await.unwrap().unwrap();
    assert_eq!(state, PermissionState::Granted);

    // No prompt was ever issued
    assert!(transport
        .calls()
        .iter()
        .all(|(name, _)| name != "requestPermission"));
}

#[tokio::test]
async fn test_denied_then_granted_resolves_granted() {
    let transport = Arc::new(InProcessTransport::new());
    let coordinator = coordinator_over(&transport);

    let handle = tokio::spawn(async move { coordinator.request_permission().await });
    sleep(Duration::from_millis(50)).await;

    // Current state: denied, so the coordinator prompts
    transport.emit_permission_code(3);
    sleep(Duration::from_millis(50)).await;

    // Post-request: a replay of the old state, then the user's answer
    transport.emit_permission_code(3);
    transport.emit_permission_code(1);

    let state = handle.await.unwrap().unwrap();
    assert_eq!(state, PermissionState::Granted);

    let prompts = transport
        .calls()
        .iter()
        .filter(|(name, _)| name == "requestPermission")
        .count();
    assert_eq!(prompts, 1);
}

#[tokio::test]
async fn test_second_post_request_state_wins() {
    let transport = Arc::new(InProcessTransport::new());
    let coordinator = coordinator_over(&transport);

    let handle = tokio::spawn(async move { coordinator.request_permission().await });
    sleep(Duration::from_millis(50)).await;

    transport.emit_permission_code(2);
    sleep(Duration::from_millis(50)).await;
    transport.emit_permission_code(1);
    transport.emit_permission_code(3);

    // The first post-request value is skipped as a possible replay
    let state = handle.await.unwrap().unwrap();
    assert_eq!(state, PermissionState::Denied);
}

#[tokio::test]
async fn test_times_out_when_second_event_never_arrives() {
    let transport = Arc::new(InProcessTransport::new());
    let coordinator = coordinator_over(&transport);

    let handle = tokio::spawn(async move {
        coordinator
            .request_permission_with_timeout(Duration::from_millis(200))
            .await
    });
    sleep(Duration::from_millis(50)).await;

    transport.emit_permission_code(3);
    sleep(Duration::from_millis(50)).await;
    transport.emit_permission_code(3);
    // The second post-request event never arrives

    let result = handle.await.unwrap();
    assert!(matches!(result, Err(TrackerError::PermissionTimeout(_))));
}

#[tokio::test]
async fn test_times_out_with_no_state_at_all() {
    let transport = Arc::new(InProcessTransport::new());
    let coordinator = coordinator_over(&transport);

    let result = coordinator
        .request_permission_with_timeout(Duration::from_millis(100))
        .await;
    assert!(matches!(result, Err(TrackerError::PermissionTimeout(_))));
}

#[tokio::test]
async fn test_stream_decodes_all_states() {
    let transport = Arc::new(InProcessTransport::new());
    let coordinator = coordinator_over(&transport);

    let mut stream = coordinator.permission_state_stream();
    transport.emit_permission_code(1);
    transport.emit_permission_code(2);
    transport.emit_permission_code(3);

    assert_eq!(
        stream.next().await.unwrap().unwrap(),
        PermissionState::Granted
    );
    assert_eq!(
        stream.next().await.unwrap().unwrap(),
        PermissionState::Partial
    );
    assert_eq!(
        stream.next().await.unwrap().unwrap(),
        PermissionState::Denied
    );
}

#[tokio::test]
async fn test_stream_surfaces_decode_errors_and_continues() {
    let transport = Arc::new(InProcessTransport::new());
    let coordinator = coordinator_over(&transport);

    let mut stream = coordinator.permission_state_stream();
    transport.emit_permission_code(7);
    transport.emit_permission_code(1);

    let bad = stream.next().await.unwrap();
    assert!(matches!(bad, Err(TrackerError::Decode(_))));

    // The stream outlives the bad delivery
    assert_eq!(
        stream.next().await.unwrap().unwrap(),
        PermissionState::Granted
    );
}

#[tokio::test]
async fn test_stream_ends_when_transport_drops() {
    let transport = Arc::new(InProcessTransport::new());
    let coordinator = coordinator_over(&transport);

    let mut stream = coordinator.permission_state_stream();
    drop(coordinator);
    drop(transport);

    assert!(stream.next().await.is_none());
}
