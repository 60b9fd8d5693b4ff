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

use herald_core::prelude::{Action, EligibilityEngine};
use tracing::{debug, error, instrument};

use super::{CatalogOutcome, CatalogResponse};
use crate::store::MessageStore;

/// Turns catalog responses into store actions.
///
/// Broadcast and anonymous messages are not taken from the response directly:
/// the response refreshes their local snapshots and the currently eligible
/// ones are read back, so frequency caps apply.
#[derive(Debug, Clone)]
pub struct CatalogSync {
    store: MessageStore,
    broadcast: Arc<EligibilityEngine>,
    anonymous: Arc<EligibilityEngine>,
}

impl CatalogSync {
    /// Creates a sync bound to `store`.
    pub fn new(
        store: MessageStore,
        broadcast: Arc<EligibilityEngine>,
        anonymous: Arc<EligibilityEngine>,
    ) -> Self {
        Self {
            store,
            broadcast,
            anonymous,
        }
    }

    /// Applies a fetched response.
    #[instrument(skip_all, fields(status = response.status))]
    pub fn apply(&self, response: &CatalogResponse) {
        let state = self.store.current_state();
        let user_token = state.user_token();

        match response.outcome() {
            CatalogOutcome::NoContent => {
                debug!("No messages found for user with response code: {}", response.status);
                self.store.dispatch(Action::ClearMessageQueue);
            }
            CatalogOutcome::Failed(status) => {
                error!("Failed to fetch messages: {status}");
                self.store.dispatch(Action::ClearMessageQueue);
            }
            CatalogOutcome::Messages(messages) => {
                self.broadcast.update_local_store(user_token, messages);
                self.anonymous.update_local_store(user_token, messages);

                let eligible_broadcasts = self.broadcast.eligible_messages(user_token);
                let eligible_anonymous = self.anonymous.eligible_messages(user_token);
                let regular: Vec<_> = messages
                    .iter()
                    .filter(|message| !message.is_broadcast() && !message.is_anonymous())
                    .cloned()
                    .collect();
                debug!(
                    regular = regular.len(),
                    broadcast = eligible_broadcasts.len(),
                    anonymous = eligible_anonymous.len(),
                    "processing catalog messages"
                );

                let mut queue = regular;
                queue.extend(eligible_broadcasts);
                queue.extend(eligible_anonymous);
                self.store.dispatch(Action::ProcessMessageQueue { messages: queue });
            }
        }

        if let Some(interval_ms) = response.polling_interval_ms() {
            if interval_ms != state.poll_interval_ms {
                debug!(interval_ms, "polling interval changed");
                self.store.dispatch(Action::SetPollingInterval { interval_ms });
            }
        }

        if let Some(enabled) = response.use_sse() {
            if enabled != state.sse_enabled {
                debug!(enabled, "realtime preference changed");
                self.store.dispatch(Action::SetSseEnabled { enabled });
            }
        }
    }

    /// Records a fetch that produced no response. The queue is left alone.
    pub fn apply_failure(&self, failure: &anyhow::Error) {
        debug!("Error fetching messages: {failure:#}");
    }
}
