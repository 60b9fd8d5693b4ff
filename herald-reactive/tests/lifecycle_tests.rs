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

use herald_reactive::prelude::*;
use herald_test::{RecordingTransport, TransportCall};

use crate::setup::initialize_tracing;

mod setup;

fn manager_over(
    store: &MessageStore,
    transport: &Arc<RecordingTransport>,
) -> ConnectionLifecycleManager {
    ConnectionLifecycleManager::new(
        store.clone(),
        Arc::clone(transport) as Arc<dyn SseTransport>,
        Arc::new(InlinePoster),
    )
}

async fn realtime_user(store: &MessageStore) {
    store.dispatch(Action::SetUserIdentifier { user_id: "user".into() });
    store.dispatch(Action::SetSseEnabled { enabled: true });
    store.settle().await;
}

/// Repeated foreground and background signals reach the transport once.
#[tokio::test]
async fn test_start_and_stop_are_idempotent() -> anyhow::Result<()> {
    initialize_tracing();
    let store = MessageStore::launch(Vec::new());
    let transport = Arc::new(RecordingTransport::new());
    let manager = manager_over(&store, &transport);
    realtime_user(&store).await;
    assert!(transport.calls().is_empty());

    manager.on_foreground();
    manager.on_foreground();
    assert_eq!(transport.starts(), 1);
    assert!(manager.is_connected());

    manager.on_background();
    manager.on_background();
    assert_eq!(transport.calls(), vec![TransportCall::Start, TransportCall::Stop]);
    assert!(!manager.is_connected());
    assert!(!manager.is_foregrounded());
    manager.detach();
    Ok(())
}

/// The realtime flag opens and closes the channel while foregrounded.
#[tokio::test]
async fn test_flag_changes_follow_the_store() -> anyhow::Result<()> {
    initialize_tracing();
    let store = MessageStore::launch(Vec::new());
    let transport = Arc::new(RecordingTransport::new());
    let manager = manager_over(&store, &transport);
    store.dispatch(Action::SetUserIdentifier { user_id: "user".into() });
    store.settle().await;

    manager.on_foreground();
    assert!(transport.calls().is_empty());

    store.dispatch(Action::SetSseEnabled { enabled: true });
    store.settle().await;
    assert_eq!(transport.calls(), vec![TransportCall::Start]);

    store.dispatch(Action::SetSseEnabled { enabled: true });
    store.dispatch(Action::SetSseEnabled { enabled: false });
    store.settle().await;
    assert_eq!(transport.calls(), vec![TransportCall::Start, TransportCall::Stop]);
    manager.detach();
    Ok(())
}

/// Anonymous visitors never open the realtime channel.
#[tokio::test]
async fn test_anonymous_visitors_keep_polling() -> anyhow::Result<()> {
    initialize_tracing();
    let store = MessageStore::launch(Vec::new());
    let transport = Arc::new(RecordingTransport::new());
    let manager = manager_over(&store, &transport);
    store.dispatch(Action::SetAnonymousIdentifier {
        anonymous_id: "anon".into(),
    });
    store.dispatch(Action::SetSseEnabled { enabled: true });
    store.settle().await;

    manager.on_foreground();
    assert!(transport.calls().is_empty());

    store.dispatch(Action::SetUserIdentifier { user_id: "user".into() });
    store.settle().await;
    assert_eq!(transport.calls(), vec![TransportCall::Start]);
    manager.detach();
    Ok(())
}

/// Changes while backgrounded are ignored until the app returns.
#[tokio::test]
async fn test_background_changes_wait_for_foreground() -> anyhow::Result<()> {
    initialize_tracing();
    let store = MessageStore::launch(Vec::new());
    let transport = Arc::new(RecordingTransport::new());
    let manager = manager_over(&store, &transport);
    realtime_user(&store).await;
    manager.on_foreground();
    manager.on_background();

    store.dispatch(Action::SetSseEnabled { enabled: false });
    store.dispatch(Action::SetSseEnabled { enabled: true });
    store.settle().await;
    assert_eq!(transport.calls(), vec![TransportCall::Start, TransportCall::Stop]);

    manager.on_foreground();
    assert_eq!(
        transport.calls(),
        vec![TransportCall::Start, TransportCall::Stop, TransportCall::Start]
    );
    manager.detach();
    Ok(())
}

/// Session reset drops the identity and closes the channel. The realtime
/// flag survives, so the next user is back on the channel at once.
#[tokio::test]
async fn test_store_reset_stops_the_channel() -> anyhow::Result<()> {
    initialize_tracing();
    let store = MessageStore::launch(Vec::new());
    let transport = Arc::new(RecordingTransport::new());
    let manager = manager_over(&store, &transport);
    realtime_user(&store).await;
    manager.on_foreground();

    store.dispatch(Action::reset());
    store.settle().await;
    assert_eq!(transport.calls(), vec![TransportCall::Start, TransportCall::Stop]);
    assert!(store.current_state().sse_enabled);

    store.dispatch(Action::SetUserIdentifier { user_id: "next".into() });
    store.settle().await;
    assert_eq!(
        transport.calls(),
        vec![TransportCall::Start, TransportCall::Stop, TransportCall::Start]
    );
    manager.detach();
    Ok(())
}

/// A reconnect closes the channel and opens it again.
#[tokio::test]
async fn test_reconnect_restarts_the_channel() -> anyhow::Result<()> {
    initialize_tracing();
    let store = MessageStore::launch(Vec::new());
    let transport = Arc::new(RecordingTransport::new());
    let manager = manager_over(&store, &transport);
    realtime_user(&store).await;
    manager.on_foreground();

    manager.reconnect();
    assert_eq!(
        transport.calls(),
        vec![TransportCall::Start, TransportCall::Stop, TransportCall::Start]
    );

    manager.on_background();
    manager.reset();
    assert_eq!(transport.stops(), 2);
    assert_eq!(transport.starts(), 2);
    manager.detach();
    Ok(())
}

/// With a task poster, decisions run on the worker in posting order.
#[tokio::test]
async fn test_task_poster_serializes_decisions() -> anyhow::Result<()> {
    initialize_tracing();
    let store = MessageStore::launch(Vec::new());
    let transport = Arc::new(RecordingTransport::new());
    let (poster, worker) = TaskPoster::spawn();
    let manager = ConnectionLifecycleManager::new(
        store.clone(),
        Arc::clone(&transport) as Arc<dyn SseTransport>,
        Arc::new(poster.clone()),
    );
    realtime_user(&store).await;

    for _ in 0..3 {
        manager.on_foreground();
        manager.on_background();
    }
    manager.on_foreground();
    poster.flush().await;

    let calls = transport.calls();
    assert_eq!(calls.len(), 7);
    let alternating: Vec<TransportCall> = (0..7)
        .map(|index| {
            if index % 2 == 0 {
                TransportCall::Start
            } else {
                TransportCall::Stop
            }
        })
        .collect();
    assert_eq!(calls, alternating);
    assert!(manager.is_connected());

    manager.detach();
    worker.abort();
    Ok(())
}

/// The runtime wires the lifecycle to host foreground signals.
#[tokio::test]
async fn test_runtime_foreground_opens_channel() -> anyhow::Result<()> {
    initialize_tracing();
    let harness = crate::setup::Harness::launch().await;
    let response =
        CatalogResponse::ok(Vec::new()).with_header(herald_reactive::headers::USE_SSE, "true");
    harness.identify_with("user-1", "Home", response).await?;
    assert!(harness.transport.calls().is_empty());

    harness.runtime.on_foreground();
    harness.settle().await;
    assert_eq!(harness.transport.starts(), 1);
    assert!(harness.runtime.lifecycle().is_connected());

    harness.runtime.reset().await;
    harness.settle().await;
    assert_eq!(
        harness.transport.calls(),
        vec![TransportCall::Start, TransportCall::Stop]
    );

    harness.runtime.on_background();
    assert_eq!(harness.transport.stops(), 1);
    harness.runtime.shutdown().await;
    Ok(())
}
