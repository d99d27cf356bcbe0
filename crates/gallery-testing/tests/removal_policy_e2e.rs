//! What happens to an App when its devices disconnect

use gallery_config::AppRemovalPolicy;
use gallery_core::AppEventKind;
use gallery_testing::{fixtures, wait_until, RecordingAppService, ToolHarness};
use std::sync::Arc;
use std::time::Duration;

async fn connect(tool: &ToolHarness) -> gallery_app::ToolingClient {
    tool.connect_app(
        fixtures::sample_identity(),
        fixtures::sample_catalog(),
        Arc::new(RecordingAppService::new()),
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn test_immediate_policy_removes_app() {
    let mut tool = ToolHarness::with_policy(AppRemovalPolicy::Immediate, 0).await.unwrap();
    let client = connect(&tool).await;
    tool.wait_for_event(AppEventKind::AppAdded).await.unwrap();

    client.close().await;
    let removed = tool.wait_for_event(AppEventKind::AppRemoved).await.unwrap();
    assert_eq!(&removed.app_id, client.app_id());
    assert!(tool.apps().is_empty());
    tool.shutdown().await;
}

#[tokio::test]
async fn test_app_survives_while_any_device_remains() {
    let mut tool = ToolHarness::with_policy(AppRemovalPolicy::Immediate, 0).await.unwrap();
    let first = connect(&tool).await;
    let second = connect(&tool).await;
    assert!(wait_until(|| tool
        .apps()
        .app(first.app_id())
        .is_some_and(|app| app.connection_count() == 2))
    .await);

    first.close().await;
    let closed = tool.wait_for_event(AppEventKind::ConnectionClosed).await.unwrap();
    assert_eq!(closed.connection_id, Some(first.connection_id()));

    let app = tool.apps().require_app(second.app_id()).unwrap();
    assert!(app.is_active());
    assert_eq!(app.connection_count(), 1);
    assert_eq!(app.connections()[0].id(), second.connection_id());
    tool.shutdown().await;
}

#[tokio::test]
async fn test_retain_policy_keeps_stale_app() {
    let mut tool = ToolHarness::with_policy(AppRemovalPolicy::Retain, 0).await.unwrap();
    let client = connect(&tool).await;
    tool.wait_for_event(AppEventKind::CatalogUpdated).await.unwrap();
    let app_id = client.app_id().clone();

    client.close().await;
    tool.wait_for_event(AppEventKind::AppInactive).await.unwrap();

    let app = tool.apps().require_app(&app_id).unwrap();
    assert!(!app.is_active());
    // The last catalog stays browsable
    assert_eq!(app.catalog().current().len(), 4);

    // The device comes back and joins the same App
    let again = connect(&tool).await;
    let event = tool
        .wait_for_event(AppEventKind::ConnectionRegistered)
        .await
        .unwrap();
    assert_eq!(event.connection_id, Some(again.connection_id()));
    assert_eq!(tool.apps().len(), 1);
    assert!(app.is_active());
    tool.shutdown().await;
}

#[tokio::test]
async fn test_grace_period_removes_idle_app() {
    let mut tool = ToolHarness::with_policy(AppRemovalPolicy::GracePeriod, 100)
        .await
        .unwrap();
    let client = connect(&tool).await;
    tool.wait_for_event(AppEventKind::AppAdded).await.unwrap();

    client.close().await;
    tool.wait_for_event(AppEventKind::AppInactive).await.unwrap();
    assert_eq!(tool.apps().len(), 1);

    tool.wait_for_event(AppEventKind::AppRemoved).await.unwrap();
    assert!(tool.apps().is_empty());
    tool.shutdown().await;
}

#[tokio::test]
async fn test_reconnect_within_grace_period_keeps_app() {
    let mut tool = ToolHarness::with_policy(AppRemovalPolicy::GracePeriod, 300)
        .await
        .unwrap();
    let client = connect(&tool).await;
    tool.wait_for_event(AppEventKind::AppAdded).await.unwrap();

    client.close().await;
    tool.wait_for_event(AppEventKind::AppInactive).await.unwrap();
    let again = connect(&tool).await;

    tokio::time::sleep(Duration::from_millis(600)).await;
    let app = tool.apps().require_app(again.app_id()).unwrap();
    assert!(app.is_active());
    tool.shutdown().await;
}
