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

use herald_core::config::ClientConfig;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{instrument, trace};

use super::{CatalogRequest, CatalogSync};
use crate::store::MessageStore;
use crate::traits::CatalogClient;

/// Wakes the catalog poller ahead of its next tick.
#[derive(Debug, Clone, Default)]
pub struct RefreshHandle {
    notify: Arc<Notify>,
}

impl RefreshHandle {
    /// Creates a handle not yet bound to a poller.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Asks for a fetch as soon as possible. Requests made while a fetch is
    /// running collapse into one follow-up fetch.
    pub fn request_refresh(&self) {
        trace!("catalog refresh requested");
        self.notify.notify_one();
    }

    async fn requested(&self) {
        self.notify.notified().await;
    }
}

/// Fetches the user's queue on the store's polling cadence.
///
/// Polling pauses while realtime updates are in use and while nobody is
/// identified.
pub struct CatalogPoller {
    client: Arc<dyn CatalogClient>,
    sync: CatalogSync,
    store: MessageStore,
    client_config: ClientConfig,
    refresh: RefreshHandle,
}

impl CatalogPoller {
    /// Creates a poller woken by `refresh`.
    pub fn new(
        client: Arc<dyn CatalogClient>,
        sync: CatalogSync,
        store: MessageStore,
        client_config: ClientConfig,
        refresh: RefreshHandle,
    ) -> Self {
        Self {
            client,
            sync,
            store,
            client_config,
            refresh,
        }
    }

    /// Runs the poller on the current runtime until `cancellation_token`
    /// fires.
    pub fn spawn(self, cancellation_token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancellation_token))
    }

    #[instrument(skip_all)]
    async fn run(self, cancellation_token: CancellationToken) {
        loop {
            self.poll_once().await;
            let interval = Duration::from_millis(self.store.current_state().poll_interval_ms);
            tokio::select! {
                () = cancellation_token.cancelled() => {
                    trace!("catalog poller cancelled");
                    break;
                }
                () = self.refresh.requested() => {}
                () = tokio::time::sleep(interval) => {}
            }
        }
    }

    /// Performs one fetch if the session currently polls.
    pub async fn poll_once(&self) {
        self.store.settle().await;
        let state = self.store.current_state();
        if state.should_use_sse() {
            trace!("realtime updates active, skipping fetch");
            return;
        }
        let Some(request) = CatalogRequest::from_state(&state, &self.client_config) else {
            trace!("no user token, skipping fetch");
            return;
        };

        match self.client.fetch_messages(&request).await {
            Ok(response) => self.sync.apply(&response),
            Err(failure) => self.sync.apply_failure(&failure),
        }
    }
}
