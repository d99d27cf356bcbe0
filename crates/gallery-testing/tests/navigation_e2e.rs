//! Tool -> app commands over real TCP

use gallery_core::{AppEventKind, Error};
use gallery_testing::fixtures::{self, LOGIN_DEFAULT, LOGIN_ERROR, LOGIN_PAGE, PRODUCT_CARD};
use gallery_testing::{Navigation, RecordingAppService, ToolHarness};
use std::sync::Arc;

#[tokio::test]
async fn test_navigation_fans_out_to_every_device() {
    let mut tool = ToolHarness::start().await.unwrap();
    let desktop = Arc::new(RecordingAppService::new());
    let emulator = Arc::new(RecordingAppService::new());

    let a = tool
        .connect_app(fixtures::sample_identity(), fixtures::sample_catalog(), desktop.clone())
        .await
        .unwrap();
    tool.wait_for_event(AppEventKind::CatalogUpdated).await.unwrap();
    let b = tool
        .connect_app(fixtures::sample_identity(), fixtures::sample_catalog(), emulator.clone())
        .await
        .unwrap();
    tool.wait_for_event(AppEventKind::CatalogUpdated).await.unwrap();

    let app = tool.apps().require_app(a.app_id()).unwrap();
    let outcome = app.navigate_to_preview(LOGIN_PAGE, "Default").await.unwrap();
    assert!(outcome.is_complete_success());
    let mut succeeded = outcome.succeeded.clone();
    succeeded.sort();
    let mut expected = vec![a.connection_id(), b.connection_id()];
    expected.sort();
    assert_eq!(succeeded, expected);

    let navigation = Navigation {
        component: LOGIN_PAGE.to_string(),
        preview: LOGIN_DEFAULT.to_string(),
    };
    assert_eq!(desktop.navigations(), vec![navigation.clone()]);
    assert_eq!(emulator.navigations(), vec![navigation]);
    tool.shutdown().await;
}

#[tokio::test]
async fn test_unknown_component_fails_without_navigation() {
    let mut tool = ToolHarness::start().await.unwrap();
    let service = Arc::new(RecordingAppService::new());
    let client = tool
        .connect_app(fixtures::sample_identity(), fixtures::sample_catalog(), service.clone())
        .await
        .unwrap();
    tool.wait_for_event(AppEventKind::CatalogUpdated).await.unwrap();
    let app = tool.apps().require_app(client.app_id()).unwrap();

    let err = app
        .navigate_to_preview("MyApp.MissingPage", "Default")
        .await
        .unwrap_err();
    assert_eq!(err, Error::ComponentNotFound("MyApp.MissingPage".into()));

    let err = app.navigate_to_preview(LOGIN_PAGE, "Dark").await.unwrap_err();
    assert_eq!(err, Error::preview_not_found(LOGIN_PAGE, "Dark"));

    assert_eq!(service.navigation_count(), 0);
    tool.shutdown().await;
}

#[tokio::test]
async fn test_parameterized_preview_fails_fast_on_the_app() {
    let mut tool = ToolHarness::start().await.unwrap();
    let service = Arc::new(RecordingAppService::new());
    let client = tool
        .connect_app(
            fixtures::sample_identity(),
            fixtures::parameterized_catalog(),
            service.clone(),
        )
        .await
        .unwrap();
    tool.wait_for_event(AppEventKind::CatalogUpdated).await.unwrap();
    let app = tool.apps().require_app(client.app_id()).unwrap();

    let err = app.navigate_to_preview(LOGIN_PAGE, "WithUser").await.unwrap_err();
    assert_eq!(
        err,
        Error::PreviewParametersNotSupported {
            preview: "MyApp.LoginPreviews.WithUser".into(),
            count: 1,
        }
    );
    assert_eq!(service.navigation_count(), 0);
    tool.shutdown().await;
}

#[tokio::test]
async fn test_partial_failure_is_reported_per_connection() {
    let mut tool = ToolHarness::start().await.unwrap();
    let healthy = Arc::new(RecordingAppService::new());
    let broken = Arc::new(RecordingAppService::failing(Error::Internal(
        "renderer crashed".into(),
    )));

    let good = tool
        .connect_app(fixtures::sample_identity(), fixtures::sample_catalog(), healthy.clone())
        .await
        .unwrap();
    tool.wait_for_event(AppEventKind::CatalogUpdated).await.unwrap();
    let bad = tool
        .connect_app(fixtures::sample_identity(), fixtures::sample_catalog(), broken)
        .await
        .unwrap();
    tool.wait_for_event(AppEventKind::CatalogUpdated).await.unwrap();

    let app = tool.apps().require_app(good.app_id()).unwrap();
    let outcome = app.navigate_to_preview(LOGIN_PAGE, LOGIN_ERROR).await.unwrap();
    assert!(!outcome.is_complete_success());
    assert_eq!(outcome.succeeded, vec![good.connection_id()]);
    assert_eq!(outcome.failed.len(), 1);
    assert_eq!(outcome.failed[0].0, bad.connection_id());
    assert!(matches!(
        &outcome.failed[0].1,
        Error::Internal(msg) if msg.contains("renderer crashed")
    ));
    assert_eq!(healthy.navigation_count(), 1);
    tool.shutdown().await;
}

#[tokio::test]
async fn test_previews_and_snapshots_over_the_wire() {
    let mut tool = ToolHarness::start().await.unwrap();
    let service = Arc::new(RecordingAppService::with_snapshots());
    let client = tool
        .connect_app(fixtures::sample_identity(), fixtures::sample_catalog(), service.clone())
        .await
        .unwrap();
    tool.wait_for_event(AppEventKind::CatalogUpdated).await.unwrap();
    let app = tool.apps().require_app(client.app_id()).unwrap();

    let previews = app.get_previews_for_component(LOGIN_PAGE).await.unwrap();
    assert_eq!(previews, vec![LOGIN_DEFAULT, LOGIN_ERROR]);

    let err = app
        .get_previews_for_component("MyApp.MissingPage")
        .await
        .unwrap_err();
    assert_eq!(err, Error::ComponentNotFound("MyApp.MissingPage".into()));

    let image = app.get_preview_snapshot(PRODUCT_CARD, PRODUCT_CARD).await.unwrap();
    assert_eq!(image, PRODUCT_CARD.as_bytes());
    assert_eq!(service.snapshot_count(), 1);
    tool.shutdown().await;
}

#[tokio::test]
async fn test_snapshot_unsupported_by_app() {
    let mut tool = ToolHarness::start().await.unwrap();
    let client = tool
        .connect_app(
            fixtures::sample_identity(),
            fixtures::sample_catalog(),
            Arc::new(RecordingAppService::new()),
        )
        .await
        .unwrap();
    tool.wait_for_event(AppEventKind::CatalogUpdated).await.unwrap();
    let app = tool.apps().require_app(client.app_id()).unwrap();

    let err = app
        .get_preview_snapshot(LOGIN_PAGE, "Default")
        .await
        .unwrap_err();
    assert_eq!(err, Error::SnapshotNotSupported);
    tool.shutdown().await;
}
