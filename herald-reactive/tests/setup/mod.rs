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

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use herald_reactive::prelude::*;
use herald_test::{
    ManualClock, RecordingCatalogClient, RecordingListener, RecordingPresenter, RecordingTransport,
};
use parking_lot::Mutex;

pub use herald_test::initialize_tracing;

/// A launched engine wired to recording collaborators.
pub struct Harness {
    pub runtime: HeraldRuntime,
    pub catalog: Arc<RecordingCatalogClient>,
    pub presenter: Arc<RecordingPresenter>,
    pub transport: Arc<RecordingTransport>,
    pub listener: Arc<RecordingListener>,
    pub clock: Arc<ManualClock>,
    pub preferences: Arc<MemoryPreferenceStore>,
}

impl Harness {
    /// Launches an engine with default configuration and an inline poster.
    pub async fn launch() -> Self {
        Self::launch_with(HeraldConfig::default(), Arc::new(MemoryPreferenceStore::new())).await
    }

    /// Launches an engine over `preferences`.
    pub async fn launch_with(
        config: HeraldConfig,
        preferences: Arc<MemoryPreferenceStore>,
    ) -> Self {
        let catalog = Arc::new(RecordingCatalogClient::new());
        let presenter = Arc::new(RecordingPresenter::new());
        let transport = Arc::new(RecordingTransport::new());
        let listener = Arc::new(RecordingListener::new());
        let clock = Arc::new(ManualClock::new(1_700_000_000_000));

        let runtime = HeraldApp::new(
            Arc::clone(&catalog) as Arc<dyn CatalogClient>,
            Arc::clone(&presenter) as Arc<dyn SurfacePresenter>,
            Arc::clone(&transport) as Arc<dyn SseTransport>,
        )
        .with_config(config)
        .with_listener(Arc::clone(&listener) as Arc<dyn InAppListener>)
        .with_preferences(Arc::clone(&preferences) as Arc<dyn PreferenceStore>)
        .with_poster(Arc::new(InlinePoster))
        .with_clock(Arc::clone(&clock) as Arc<dyn Clock>)
        .launch_async()
        .await;

        Self {
            runtime,
            catalog,
            presenter,
            transport,
            listener,
            clock,
            preferences,
        }
    }

    /// Initializes a dev session for `user_id` on `route`, after queueing
    /// `response` as the answer to the first catalog fetch.
    pub async fn identify_with(
        &self,
        user_id: &str,
        route: &str,
        response: CatalogResponse,
    ) -> anyhow::Result<()> {
        self.runtime.initialize("site-id", "us", Environment::Dev);
        self.runtime.set_route(route);
        self.fetch_with(response, |runtime| runtime.identify(user_id)).await
    }

    /// Runs `trigger`, which must cause one catalog fetch, and waits until
    /// `response` to that fetch has been applied.
    pub async fn fetch_with<F>(&self, response: CatalogResponse, trigger: F) -> anyhow::Result<()>
    where
        F: FnOnce(&HeraldRuntime),
    {
        self.catalog.push_response(response);
        let fetches = self.catalog.requests().len() + 1;
        trigger(&self.runtime);
        wait_for(|| self.catalog.requests().len() >= fetches).await?;
        self.settle().await;
        Ok(())
    }

    pub async fn settle(&self) {
        self.runtime.settle().await;
    }

    pub fn state(&self) -> Arc<InAppMessagingState> {
        self.runtime.store().current_state()
    }
}

/// Polls `condition` until it holds, giving the engine's tasks time to run.
pub async fn wait_for<F>(mut condition: F) -> anyhow::Result<()>
where
    F: FnMut() -> bool,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .map_err(|_| anyhow::anyhow!("condition not reached in time"))
}

/// Records every action that enters the pipeline.
#[derive(Debug, Default)]
pub struct ActionRecorder {
    actions: Mutex<Vec<Action>>,
}

impl ActionRecorder {
    pub fn names(&self) -> Vec<&'static str> {
        self.actions.lock().iter().map(Action::name).collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.actions
            .lock()
            .iter()
            .filter_map(|action| match action {
                Action::ReportError { message } => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn actions(&self) -> Vec<Action> {
        self.actions.lock().clone()
    }
}

/// Pipeline head forwarding to an [`ActionRecorder`].
pub struct Recording(pub Arc<ActionRecorder>);

impl Middleware for Recording {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn handle(

        &self,

        store: &mut StoreContext<'_>,

        action: Action,

        next: Next,

    ) -> anyhow::Result<()> {
        self.0.actions.lock().push(action.clone());
        next.run(store, action);
        Ok(())
    }
}

/// A store running the standard pipeline behind an [`ActionRecorder`].
pub struct PipelineFixture {
    pub store: MessageStore,
    pub recorder: Arc<ActionRecorder>,
    pub catalog: Arc<RecordingCatalogClient>,
    pub presenter: Arc<RecordingPresenter>,
    pub listener: Arc<RecordingListener>,
}

impl PipelineFixture {
    pub fn launch() -> Self {
        let catalog = Arc::new(RecordingCatalogClient::new());
        let presenter = Arc::new(RecordingPresenter::new());
        let listener = Arc::new(RecordingListener::new());
        let preferences: Arc<dyn PreferenceStore> = Arc::new(MemoryPreferenceStore::new());
        let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(0));
        let recorder = Arc::new(ActionRecorder::default());

        let mut pipeline: Vec<Arc<dyn Middleware>> =
            vec![Arc::new(Recording(Arc::clone(&recorder)))];
        pipeline.extend(default_pipeline(PipelineParts {
            catalog: Arc::clone(&catalog) as Arc<dyn CatalogClient>,
            presenter: Arc::clone(&presenter) as Arc<dyn SurfacePresenter>,
            listener: Some(Arc::clone(&listener) as Arc<dyn InAppListener>),
            broadcast: Arc::new(EligibilityEngine::broadcast(
                Arc::clone(&preferences),
                Arc::clone(&clock),
            )),
            anonymous: Arc::new(EligibilityEngine::anonymous(preferences, clock)),
            refresh: RefreshHandle::new(),
        }));

        Self {
            store: MessageStore::launch(pipeline),
            recorder,
            catalog,
            presenter,
            listener,
        }
    }
}

/// A modal message bound to `route`.
pub fn modal(id: &str, queue_id: &str, route: &str) -> Message {
    Message::new(id).with_queue_id(queue_id).with_route_rule(route)
}
