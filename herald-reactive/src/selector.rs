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

//! Decides which queued messages go on screen.

use std::collections::{BTreeSet, HashSet};

use herald_core::prelude::{InAppMessagingState, Message};

/// Outcome of running selection over a catalog response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// Trackable messages not shown yet, in selection order.
    pub queue: Vec<Message>,
    /// The modal message to load, if any matches the route.
    pub modal: Option<Message>,
    /// Inline messages to hand to their elements.
    pub inline: Vec<Message>,
}

/// Message selection rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageSelector;

impl MessageSelector {
    /// Messages that can still be shown, in the order they should be tried.
    ///
    /// Drops untracked messages and those already shown, keeps the first
    /// message for each queue id, then orders by ascending priority with
    /// unprioritised messages last. Ties keep their catalog order.
    #[must_use]
    pub fn candidates(messages: &[Message], shown: &BTreeSet<String>) -> Vec<Message> {
        let mut seen = HashSet::new();
        let mut candidates: Vec<Message> = messages
            .iter()
            .filter(|message| {
                message
                    .queue_id
                    .as_deref()
                    .is_some_and(|queue_id| !shown.contains(queue_id) && seen.insert(queue_id))
            })
            .cloned()
            .collect();
        candidates.sort_by_key(|message| (message.priority.is_none(), message.priority));
        candidates
    }

    /// The first modal candidate allowed on `route`.
    #[must_use]
    pub fn modal_candidate<'a>(
        candidates: &'a [Message],
        route: Option<&str>,
    ) -> Option<&'a Message> {
        candidates
            .iter()
            .filter(|message| !message.is_embedded())
            .find(|message| message.matches_route(route))
    }

    /// Inline candidates allowed on `route` whose element does not already
    /// show a message. The first candidate wins for each element.
    #[must_use]
    pub fn inline_candidates(candidates: &[Message], state: &InAppMessagingState) -> Vec<Message> {
        let route = state.current_route.as_deref();
        let mut claimed = HashSet::new();
        candidates
            .iter()
            .filter(|message| message.matches_route(route))
            .filter(|message| {
                message.element_id().is_some_and(|element_id| {
                    let busy = state
                        .queued_inline_messages_state
                        .get(element_id)
                        .is_some_and(|inline| inline.is_embedded());
                    !busy && claimed.insert(element_id)
                })
            })
            .cloned()
            .collect()
    }

    /// Runs every selection rule for `messages` against `state`.
    #[must_use]
    pub fn select(state: &InAppMessagingState, messages: &[Message]) -> Selection {
        let queue = Self::candidates(messages, &state.shown_message_queue_ids);
        let modal = Self::modal_candidate(&queue, state.current_route.as_deref()).cloned();
        let inline = Self::inline_candidates(&queue, state);
        Selection { queue, modal, inline }
    }
}
