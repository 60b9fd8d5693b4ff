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

use herald_core::prelude::{
    Clock, EligibilityClass, EligibilityEngine, FilePreferenceStore, HeraldConfig,
    MemoryPreferenceStore, PreferenceStore, SystemClock,
};
use tokio_util::sync::CancellationToken;
use tracing::{trace, warn};

use crate::catalog::{CatalogPoller, CatalogSync, RefreshHandle};
use crate::common::HeraldRuntime;
use crate::lifecycle::{ConnectionLifecycleManager, TaskPoster};
use crate::middleware::{default_pipeline, PipelineParts};
use crate::store::MessageStore;
use crate::traits::{
    CatalogClient, InAppListener, MainThreadPoster, SseTransport, SurfacePresenter,
};

/// Assembles a running engine from the host's collaborators.
///
/// The three required collaborators are given up front; everything else has a
/// default:
///
/// - preferences: `preferences.json` in the configured data directory, or
///   an in-memory store if that file cannot be opened
/// - poster: a [`TaskPoster`] on the current runtime
/// - clock: the system clock
/// - listener: none
/// - configuration: the loaded [`HeraldConfig`]
///
/// # Example
///
/// ```rust,ignore
/// use herald_reactive::prelude::*;
///
/// let runtime = HeraldApp::new(catalog, presenter, transport)
///     .with_listener(listener)
///     .launch_async()
///     .await;
/// runtime.initialize("site", "us", Environment::Prod);
/// runtime.identify("user-1");
/// ```
pub struct HeraldApp {
    config: HeraldConfig,
    catalog: Arc<dyn CatalogClient>,
    presenter: Arc<dyn SurfacePresenter>,
    transport: Arc<dyn SseTransport>,
    listener: Option<Arc<dyn InAppListener>>,
    preferences: Option<Arc<dyn PreferenceStore>>,
    poster: Option<Arc<dyn MainThreadPoster>>,
    clock: Arc<dyn Clock>,
}

impl HeraldApp {
    /// Starts building an engine.
    pub fn new(
        catalog: Arc<dyn CatalogClient>,
        presenter: Arc<dyn SurfacePresenter>,
        transport: Arc<dyn SseTransport>,
    ) -> Self {
        Self {
            config: HeraldConfig::load(),
            catalog,
            presenter,
            transport,
            listener: None,
            preferences: None,
            poster: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Uses `config` instead of the configuration file.
    #[must_use]
    pub fn with_config(mut self, config: HeraldConfig) -> Self {
        self.config = config;
        self
    }

    /// Registers host callbacks.
    #[must_use]
    pub fn with_listener(mut self, listener: Arc<dyn InAppListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Persists frequency caps in `preferences`.
    #[must_use]
    pub fn with_preferences(mut self, preferences: Arc<dyn PreferenceStore>) -> Self {
        self.preferences = Some(preferences);
        self
    }

    /// Runs lifecycle and surface work on `poster`.
    #[must_use]
    pub fn with_poster(mut self, poster: Arc<dyn MainThreadPoster>) -> Self {
        self.poster = Some(poster);
        self
    }

    /// Reads time from `clock`.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Starts the engine on the current Tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub async fn launch_async(self) -> HeraldRuntime {
        trace!("Starting Herald initialization");
        let Self {
            config,
            catalog,
            presenter,
            transport,
            listener,
            preferences,
            poster,
            clock,
        } = self;

        let preferences = preferences.unwrap_or_else(|| default_preferences(&config));
        let (poster, poster_task) = match poster {
            Some(poster) => (poster, None),
            None => {
                let (poster, worker) = TaskPoster::spawn();
                (Arc::new(poster) as Arc<dyn MainThreadPoster>, Some(worker))
            }
        };

        let broadcast = Arc::new(
            EligibilityEngine::broadcast(Arc::clone(&preferences), Arc::clone(&clock))
                .with_snapshot_ttl(config.eligibility.snapshot_ttl(EligibilityClass::Broadcast)),
        );
        let anonymous = Arc::new(
            EligibilityEngine::anonymous(Arc::clone(&preferences), Arc::clone(&clock))
                .with_snapshot_ttl(config.eligibility.snapshot_ttl(EligibilityClass::Anonymous)),
        );
        let refresh = RefreshHandle::new();

        let store = MessageStore::launch(default_pipeline(PipelineParts {
            catalog: Arc::clone(&catalog),
            presenter: Arc::clone(&presenter),
            listener,
            broadcast: Arc::clone(&broadcast),
            anonymous: Arc::clone(&anonymous),
            refresh: refresh.clone(),
        }));

        let lifecycle =
            ConnectionLifecycleManager::new(store.clone(), transport, Arc::clone(&poster));
        let sync =
            CatalogSync::new(store.clone(), Arc::clone(&broadcast), Arc::clone(&anonymous));

        let cancellation_token = CancellationToken::new();
        let poller = CatalogPoller::new(
            catalog,
            sync.clone(),
            store.clone(),
            config.client.clone(),
            refresh.clone(),
        )
        .spawn(cancellation_token.child_token());

        store.settle().await;
        trace!("Herald initialization complete");

        HeraldRuntime {
            config,
            store,
            lifecycle,
            sync,
            refresh,
            broadcast,
            anonymous,
            presenter,
            poster,
            cancellation_token,
            poller,
            poster_task,
        }
    }
}

fn default_preferences(config: &HeraldConfig) -> Arc<dyn PreferenceStore> {
    match FilePreferenceStore::open_in(&config.paths) {
        Ok(store) => {
            trace!(path = %store.path().display(), "persisting frequency caps");
            Arc::new(store)
        }
        Err(error) => {
            warn!("frequency caps will not survive a restart: {error:#}");
            Arc::new(MemoryPreferenceStore::new())
        }
    }
}
