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

use herald_core::prelude::{Action, EligibilityClass, EligibilityEngine, Message};
use tracing::debug;

use super::Middleware;
use crate::catalog::RefreshHandle;
use crate::store::{Next, StoreContext};
use crate::traits::CatalogClient;

/// Reports message views and keeps frequency caps up to date.
///
/// A view is reported once per message: when a regular message is displayed,
/// or when the user closes a persistent one.
pub struct ViewTelemetryMiddleware {
    catalog: Arc<dyn CatalogClient>,
    broadcast: Arc<EligibilityEngine>,
    anonymous: Arc<EligibilityEngine>,
    refresh: RefreshHandle,
}

impl ViewTelemetryMiddleware {
    /// Creates the middleware.
    pub fn new(
        catalog: Arc<dyn CatalogClient>,
        broadcast: Arc<EligibilityEngine>,
        anonymous: Arc<EligibilityEngine>,
        refresh: RefreshHandle,
    ) -> Self {
        Self {
            catalog,
            broadcast,
            anonymous,
            refresh,
        }
    }

    fn engine_for(&self, message: &Message) -> Option<&EligibilityEngine> {
        [&self.broadcast, &self.anonymous]
            .into_iter()
            .find(|engine| engine.class().includes(message))
            .map(|engine| &**engine)
    }

    /// Anonymous messages are dismissed however they went away. Broadcasts
    /// only count a close by the user.
    fn record_dismissal(&self, store: &StoreContext<'_>, message: &Message, closed_by_user: bool) {
        let Some(engine) = self.engine_for(message) else {
            return;
        };
        let Some(queue_id) = message.queue_id.as_deref() else {
            return;
        };
        if closed_by_user || engine.class() == EligibilityClass::Anonymous {
            engine.mark_dismissed(store.state().user_token(), queue_id);
        }
    }

    fn log_view_if_needed(&self, store: &StoreContext<'_>, action: &Action, message: &Message) {
        if action.should_mark_message_as_shown() {
            debug!(message = message.tracking_id(), "logging view");
            self.catalog.log_view(message, &store.state().session_id);
        }
    }
}

impl Middleware for ViewTelemetryMiddleware {
    fn name(&self) -> &'static str {
        "view_telemetry"
    }

    fn handle(
        &self,
        store: &mut StoreContext<'_>,
        action: Action,
        next: Next,
    ) -> anyhow::Result<()> {
        match &action {
            Action::DisplayMessage { message } => {
                self.log_view_if_needed(store, &action, message);
                if let (Some(engine), Some(queue_id)) =
                    (self.engine_for(message), message.queue_id.as_deref())
                {
                    engine.mark_seen(store.state().user_token(), queue_id);
                }
                next.run(store, action);
            }
            Action::DismissMessage {
                message,
                should_log,
                via_close_action,
            } => {
                self.log_view_if_needed(store, &action, message);
                let closed_by_user = *should_log && *via_close_action;
                self.record_dismissal(store, message, closed_by_user);
                if closed_by_user && message.is_persistent() {
                    self.refresh.request_refresh();
                }

                next.run(store, action);

                let state = store.state();
                if state.should_use_sse() {
                    debug!("realtime session active, selecting the next message");
                    store.dispatch(Action::ProcessMessageQueue {
                        messages: state.messages_in_queue.to_vec(),
                    });
                }
            }
            _ => next.run(store, action),
        }
        Ok(())
    }
}
