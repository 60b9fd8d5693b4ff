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

use herald_core::prelude::{Action, EligibilityEngine, Environment, HeraldConfig, Message};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::catalog::{CatalogSync, RefreshHandle};
use crate::lifecycle::ConnectionLifecycleManager;
use crate::sse::{SseRequest, SseRequestError, SseSession};
use crate::store::MessageStore;
use crate::surface::{InlineSurfaceController, ModalSurfaceController};
use crate::traits::{InlineSurfaceView, MainThreadPoster, SurfacePresenter};

/// A running engine, as returned by [`HeraldApp::launch_async`](super::HeraldApp::launch_async).
///
/// Host-facing calls queue actions and return immediately.
pub struct HeraldRuntime {
    pub(crate) config: HeraldConfig,
    pub(crate) store: MessageStore,
    pub(crate) lifecycle: ConnectionLifecycleManager,
    pub(crate) sync: CatalogSync,
    pub(crate) refresh: RefreshHandle,
    pub(crate) broadcast: Arc<EligibilityEngine>,
    pub(crate) anonymous: Arc<EligibilityEngine>,
    pub(crate) presenter: Arc<dyn SurfacePresenter>,
    pub(crate) poster: Arc<dyn MainThreadPoster>,
    pub(crate) cancellation_token: CancellationToken,
    pub(crate) poller: JoinHandle<()>,
    pub(crate) poster_task: Option<JoinHandle<()>>,
}

impl HeraldRuntime {
    /// Starts a session for a workspace.
    pub fn initialize(&self, site_id: &str, data_center: &str, environment: Environment) {
        self.store.dispatch(Action::initialize(site_id, data_center, environment));
    }

    /// Identifies the user and fetches their queue.
    pub fn identify(&self, user_id: &str) {
        self.store.dispatch(Action::SetUserIdentifier {
            user_id: user_id.to_string(),
        });
        self.refresh.request_refresh();
    }

    /// Sets the identifier used before the user identifies and fetches the
    /// anonymous queue.
    pub fn set_anonymous_id(&self, anonymous_id: &str) {
        self.store.dispatch(Action::SetAnonymousIdentifier {
            anonymous_id: anonymous_id.to_string(),
        });
        self.refresh.request_refresh();
    }

    /// The host navigated to `route`.
    pub fn set_route(&self, route: &str) {
        self.store.dispatch(Action::SetPageRoute {
            route: route.to_string(),
        });
    }

    /// Closes the modal message on screen, if any, as if the user closed it.
    pub fn dismiss_message(&self) {
        let state = self.store.current_state();
        if let Some(message) = state.modal_message_state.active_message() {
            self.store.dispatch(Action::dismiss(message.clone()));
        }
    }

    /// The host app came to the foreground.
    pub fn on_foreground(&self) {
        self.lifecycle.on_foreground();
        self.refresh.request_refresh();
    }

    /// The host app went to the background.
    pub fn on_background(&self) {
        self.lifecycle.on_background();
    }

    /// Forgets the user and starts a new session, then re-evaluates the
    /// realtime channel against the cleared state.
    pub async fn reset(&self) {
        debug!("resetting session");
        self.store.dispatch(Action::reset());
        self.store.settle().await;
        self.lifecycle.reset();
    }

    /// Describes the realtime subscription for the current session.
    ///
    /// # Errors
    ///
    /// Fails while the session has no user token.
    pub fn sse_request(&self) -> Result<SseRequest, SseRequestError> {
        SseRequest::build(&self.store.current_state(), &self.config)
    }

    /// A session policy for the host's realtime transport.
    #[must_use]
    pub fn sse_session(&self) -> SseSession {
        SseSession::new(self.store.clone(), Arc::new(self.lifecycle.clone()), &self.config)
    }

    /// A controller for a modal message the presenter was asked to show.
    #[must_use]
    pub fn modal_controller(&self, message: Message) -> ModalSurfaceController {
        ModalSurfaceController::attach(
            self.store.clone(),
            message,
            Arc::clone(&self.presenter),
            Arc::clone(&self.poster),
        )
    }

    /// A controller binding `view` to the inline element `element_id`.
    #[must_use]
    pub fn inline_controller(
        &self,
        element_id: &str,
        view: Arc<dyn InlineSurfaceView>,
    ) -> InlineSurfaceController {
        InlineSurfaceController::attach(
            self.store.clone(),
            element_id,
            view,
            Arc::clone(&self.poster),
        )
    }

    /// Resolves once every action queued so far has been processed.
    pub async fn settle(&self) {
        self.store.settle().await;
    }

    /// The message store.
    #[must_use]
    pub const fn store(&self) -> &MessageStore {
        &self.store
    }

    /// The realtime lifecycle manager.
    #[must_use]
    pub const fn lifecycle(&self) -> &ConnectionLifecycleManager {
        &self.lifecycle
    }

    /// Applies catalog responses obtained outside the poller.
    #[must_use]
    pub const fn catalog_sync(&self) -> &CatalogSync {
        &self.sync
    }

    /// Wakes the catalog poller.
    #[must_use]
    pub const fn refresh_handle(&self) -> &RefreshHandle {
        &self.refresh
    }

    /// Frequency caps for broadcast messages.
    #[must_use]
    pub const fn broadcast_engine(&self) -> &Arc<EligibilityEngine> {
        &self.broadcast
    }

    /// Frequency caps for anonymous messages.
    #[must_use]
    pub const fn anonymous_engine(&self) -> &Arc<EligibilityEngine> {
        &self.anonymous
    }

    /// The configuration the engine runs with.
    #[must_use]
    pub const fn config(&self) -> &HeraldConfig {
        &self.config
    }

    /// Stops every task the engine started.
    pub async fn shutdown(self) {
        trace!("shutting down Herald");
        self.lifecycle.detach();
        self.cancellation_token.cancel();
        let _ = self.poller.await;
        self.store.shutdown();
        if let Some(poster_task) = self.poster_task {
            poster_task.abort();
        }
        trace!("Herald stopped");
    }
}
