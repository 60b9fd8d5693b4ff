/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

use std::sync::Arc;
use std::time::Duration;

use herald_reactive::headers;
use herald_reactive::prelude::*;
use herald_test::{RecordingCatalogClient, RecordingPresenter, RecordingTransport};
use tempfile::TempDir;

use crate::setup::{initialize_tracing, modal, Harness};

mod setup;

/// The first fetch after identification carries the session's identity.
#[tokio::test]
async fn test_identify_fetches_the_user_queue() -> anyhow::Result<()> {
    initialize_tracing();
    let harness = Harness::launch().await;
    harness
        .identify_with("user-1", "Home", CatalogResponse::with_status(204))
        .await?;

    let requests = harness.catalog.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.user_token, "user-1");
    assert!(!request.anonymous);
    assert_eq!(request.site_id, "site-id");
    assert_eq!(request.data_center, "us");
    assert_eq!(request.session_id, harness.state().session_id);
    assert!(request
        .headers()
        .contains(&(headers::ENCODED_USER_TOKEN, "dXNlci0x".to_string())));
    harness.runtime.shutdown().await;
    Ok(())
}

/// Server hints in the response adjust polling and realtime settings.
#[tokio::test]
async fn test_response_headers_update_session() -> anyhow::Result<()> {
    initialize_tracing();
    let harness = Harness::launch().await;
    let response = CatalogResponse::ok(Vec::new())
        .with_header(headers::QUEUE_POLLING_INTERVAL, "30")
        .with_header(headers::USE_SSE, "true");
    harness.identify_with("user-1", "Home", response).await?;

    let state = harness.state();
    assert_eq!(state.poll_interval_ms, 30_000);
    assert!(state.sse_enabled);
    assert!(state.should_use_sse());
    harness.runtime.shutdown().await;
    Ok(())
}

/// Failed statuses clear the queue; failed fetches leave it alone.
#[tokio::test]
async fn test_failures_and_the_queue() -> anyhow::Result<()> {
    initialize_tracing();
    let harness = Harness::launch().await;
    let later = modal("later", "q1", "Checkout");
    harness
        .identify_with("user-1", "Home", CatalogResponse::ok(vec![later.clone()]))
        .await?;
    assert_eq!(harness.state().messages_in_queue.to_vec(), vec![later.clone()]);

    harness.catalog.push_failure("connection reset");
    let fetches = harness.catalog.requests().len() + 1;
    harness.runtime.refresh_handle().request_refresh();
    crate::setup::wait_for(|| harness.catalog.requests().len() >= fetches).await?;
    harness.settle().await;
    assert_eq!(harness.state().messages_in_queue.to_vec(), vec![later]);

    harness
        .fetch_with(CatalogResponse::with_status(500), |runtime| {
            runtime.refresh_handle().request_refresh();
        })
        .await?;
    assert!(harness.state().messages_in_queue.is_empty());
    harness.runtime.shutdown().await;
    Ok(())
}

/// Broadcast caps decide which broadcasts reach the queue.
///
/// **Scenario:** a broadcast that may be shown once is displayed, then the
/// same catalog arrives again.
///
/// **Verification:** the second response no longer queues it, while a
/// regular message in the same response is still queued.
#[tokio::test]
async fn test_broadcast_shown_once_is_not_queued_again() -> anyhow::Result<()> {
    initialize_tracing();
    let harness = Harness::launch().await;
    let broadcast = Message::new("announcement")
        .with_queue_id("qb")
        .with_frequency(1, 0, false);
    let regular = modal("regular", "qr", "Elsewhere");
    let catalog = CatalogResponse::ok(vec![broadcast.clone(), regular.clone()]);

    harness.identify_with("user-1", "Home", catalog.clone()).await?;
    assert_eq!(harness.presenter.presented_ids(), vec!["announcement".to_string()]);

    let controller = harness.runtime.modal_controller(broadcast.clone());
    controller.on_route_loaded();
    harness.settle().await;
    let record = harness.runtime.broadcast_engine().record("qb");
    assert_eq!(record.times_shown, 1);
    assert!(record.dismissed);

    harness.runtime.catalog_sync().apply(&catalog);
    harness.settle().await;
    assert_eq!(harness.state().messages_in_queue.to_vec(), vec![regular]);
    controller.detach();
    harness.runtime.shutdown().await;
    Ok(())
}

/// Delayed broadcasts come back once their window has passed.
#[tokio::test]
async fn test_broadcast_delay_window() -> anyhow::Result<()> {
    initialize_tracing();
    let harness = Harness::launch().await;
    let broadcast = Message::new("tip").with_queue_id("qt").with_frequency(0, 5, true);
    let catalog = CatalogResponse::ok(vec![broadcast.clone()]);
    harness.identify_with("user-1", "Home", catalog).await?;

    let controller = harness.runtime.modal_controller(broadcast.clone());
    controller.on_route_loaded();
    harness.settle().await;
    harness.runtime.dismiss_message();
    harness.settle().await;
    controller.detach();

    let engine = harness.runtime.broadcast_engine();
    assert!(!engine.record("qt").dismissed);
    assert!(engine.eligible_messages(Some("user-1")).is_empty());
    harness.clock.advance(5_001);
    assert_eq!(engine.eligible_messages(Some("user-1")), vec![broadcast]);
    harness.runtime.shutdown().await;
    Ok(())
}

/// Anonymous visitors are served anonymous messages.
#[tokio::test]
async fn test_anonymous_visitor_receives_anonymous_messages() -> anyhow::Result<()> {
    initialize_tracing();
    let harness = Harness::launch().await;
    let welcome = Message::new("welcome")
        .with_queue_id("qa")
        .with_frequency(0, 0, true)
        .with_anonymous(true);
    harness.runtime.initialize("site-id", "us", Environment::Dev);
    harness.runtime.set_route("Home");
    harness
        .fetch_with(CatalogResponse::ok(vec![welcome.clone()]), |runtime| {
            runtime.set_anonymous_id("anon-1");
        })
        .await?;

    let request = &harness.catalog.requests()[0];
    assert!(request.anonymous);
    assert_eq!(request.user_token, "anon-1");
    assert_eq!(harness.presenter.presented_ids(), vec!["welcome".to_string()]);
    assert_eq!(
        harness.runtime.anonymous_engine().eligible_messages(Some("anon-1")),
        vec![welcome]
    );
    assert!(harness.runtime.broadcast_engine().eligible_messages(Some("anon-1")).is_empty());
    harness.runtime.shutdown().await;
    Ok(())
}

/// The poller stands down while realtime updates are in use.
#[tokio::test]
async fn test_polling_pauses_for_realtime() -> anyhow::Result<()> {
    initialize_tracing();
    let harness = Harness::launch().await;
    let response = CatalogResponse::ok(Vec::new()).with_header(headers::USE_SSE, "true");
    harness.identify_with("user-1", "Home", response).await?;

    harness.runtime.refresh_handle().request_refresh();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(harness.catalog.requests().len(), 1);
    harness.runtime.shutdown().await;
    Ok(())
}

/// Frequency records survive a restart when the preference store does.
#[tokio::test]
async fn test_caps_survive_restart() -> anyhow::Result<()> {
    initialize_tracing();
    let preferences = Arc::new(MemoryPreferenceStore::new());
    let broadcast = Message::new("once").with_queue_id("qo").with_frequency(1, 0, false);
    let catalog = CatalogResponse::ok(vec![broadcast.clone()]);

    let first = Harness::launch_with(HeraldConfig::default(), Arc::clone(&preferences)).await;
    first.identify_with("user-1", "Home", catalog.clone()).await?;
    first.runtime.modal_controller(broadcast).on_route_loaded();
    first.settle().await;
    first.runtime.shutdown().await;

    let second = Harness::launch_with(HeraldConfig::default(), preferences).await;
    second.identify_with("user-1", "Home", catalog).await?;
    assert!(second.presenter.presented().is_empty());
    assert!(second.state().messages_in_queue.is_empty());
    second.runtime.shutdown().await;
    Ok(())
}

async fn launch_over(
    config: &HeraldConfig,
) -> (HeraldRuntime, Arc<RecordingCatalogClient>, Arc<RecordingPresenter>) {
    let catalog = Arc::new(RecordingCatalogClient::new());
    let presenter = Arc::new(RecordingPresenter::new());
    let runtime = HeraldApp::new(
        Arc::clone(&catalog) as Arc<dyn CatalogClient>,
        Arc::clone(&presenter) as Arc<dyn SurfacePresenter>,
        Arc::new(RecordingTransport::new()),
    )
    .with_config(config.clone())
    .with_poster(Arc::new(InlinePoster))
    .launch_async()
    .await;
    (runtime, catalog, presenter)
}

async fn identify(
    runtime: &HeraldRuntime,
    catalog: &RecordingCatalogClient,
    response: CatalogResponse,
) -> anyhow::Result<()> {
    catalog.push_response(response);
    runtime.initialize("site-id", "us", Environment::Dev);
    runtime.set_route("Home");
    runtime.identify("user-1");
    crate::setup::wait_for(|| !catalog.requests().is_empty()).await?;
    runtime.settle().await;
    Ok(())
}

/// Without a host preference store, caps are kept in the configured data
/// directory and outlive the engine.
#[tokio::test]
async fn test_default_preferences_persist_in_data_directory() -> anyhow::Result<()> {
    initialize_tracing();
    let temp_dir = TempDir::new()?;
    let mut config = HeraldConfig::default();
    config.paths.data_directory = temp_dir.path().display().to_string();
    let broadcast = Message::new("once").with_queue_id("qo").with_frequency(1, 0, false);
    let catalog_response = CatalogResponse::ok(vec![broadcast.clone()]);

    let (first, catalog, presenter) = launch_over(&config).await;
    identify(&first, &catalog, catalog_response.clone()).await?;
    assert_eq!(presenter.presented_ids(), vec!["once".to_string()]);
    let controller = first.modal_controller(broadcast);
    controller.on_route_loaded();
    first.settle().await;
    controller.detach();
    first.shutdown().await;
    assert!(temp_dir.path().join("preferences.json").exists());

    let (second, catalog, presenter) = launch_over(&config).await;
    identify(&second, &catalog, catalog_response).await?;
    assert!(presenter.presented().is_empty());
    assert!(second.broadcast_engine().record("qo").dismissed);
    second.shutdown().await;

    temp_dir.close()?;
    Ok(())
}
