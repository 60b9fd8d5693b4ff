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

use herald_core::prelude::Action;
use tracing::debug;

use super::Middleware;
use crate::selector::MessageSelector;
use crate::store::{Next, StoreContext};

/// Picks what to show whenever a new queue arrives.
///
/// The queue reaching the reducer is reduced to trackable, unseen messages in
/// priority order. Inline picks are embedded in one action; the modal pick is
/// loaded only when the modal surface is free.
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectionMiddleware;

impl Middleware for SelectionMiddleware {
    fn name(&self) -> &'static str {
        "selection"
    }

    fn handle(

        &self,

        store: &mut StoreContext<'_>,

        action: Action,

        next: Next,

    ) -> anyhow::Result<()> {
        let selection = match &action {
            Action::ProcessMessageQueue { messages } if !messages.is_empty() => {
                MessageSelector::select(&store.state(), messages)
            }
            _ => {
                next.run(store, action);
                return Ok(());
            }
        };

        debug!(candidates = selection.queue.len(), "processing message queue");
        next.run(
            store,
            Action::ProcessMessageQueue {
                messages: selection.queue,
            },
        );

        if !selection.inline.is_empty() {
            debug!(count = selection.inline.len(), "embedding inline messages");
            store.dispatch(Action::EmbedMessages {
                messages: selection.inline,
            });
        }

        match selection.modal {
            Some(message) if !store.state().modal_message_state.is_active() => {
                debug!(message = message.tracking_id(), "loading modal message");
                store.dispatch(Action::load(message));
            }
            Some(message) => {
                debug!(
                    message = message.tracking_id(),
                    "modal surface busy, keeping message queued"
                );
            }
            None => debug!("No message matched the criteria."),
        }
        Ok(())
    }
}
