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

use std::collections::BTreeMap;

use crate::model::Message;

/// Lifecycle of one inline element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlineMessageState {
    /// Selected for the element but not yet shown by it.
    ReadyToEmbed {
        /// The selected message.
        message: Message,
        /// Target element.
        element_id: String,
    },
    /// Shown by the element.
    Embedded {
        /// The shown message.
        message: Message,
        /// Target element.
        element_id: String,
    },
    /// Removed from the element.
    Dismissed {
        /// The removed message.
        message: Message,
    },
}

impl InlineMessageState {
    /// The message the element is tied to.
    #[must_use]
    pub const fn message(&self) -> &Message {
        match self {
            Self::ReadyToEmbed { message, .. }
            | Self::Embedded { message, .. }
            | Self::Dismissed { message } => message,
        }
    }

    /// Whether the element currently shows its message.
    #[must_use]
    pub const fn is_embedded(&self) -> bool {
        matches!(self, Self::Embedded { .. })
    }
}

/// Inline state for every element id the engine knows about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueuedInlineMessagesState {
    messages: BTreeMap<String, InlineMessageState>,
}

impl QueuedInlineMessagesState {
    /// Queues `message` for `element_id`, replacing whatever the element held.
    #[must_use]
    pub fn add_message(&self, message: Message, element_id: &str) -> Self {
        let mut messages = self.messages.clone();
        messages.insert(
            element_id.to_string(),
            InlineMessageState::ReadyToEmbed {
                message,
                element_id: element_id.to_string(),
            },
        );
        Self { messages }
    }

    /// Replaces the entry whose message carries `queue_id`.
    ///
    /// Unknown queue ids leave the state untouched.
    #[must_use]
    pub fn update_message_state(&self, queue_id: &str, new_state: InlineMessageState) -> Self {
        let key = self
            .messages
            .iter()
            .find(|(_, state)| state.message().queue_id.as_deref() == Some(queue_id))
            .map(|(key, _)| key.clone());

        let mut messages = self.messages.clone();
        if let Some(key) = key {
            messages.insert(key, new_state);
        }
        Self { messages }
    }

    /// State of a single element.
    #[must_use]
    pub fn get(&self, element_id: &str) -> Option<&InlineMessageState> {
        self.messages.get(element_id)
    }

    /// Iterates over elements in element id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &InlineMessageState)> {
        self.messages.iter().map(|(key, state)| (key.as_str(), state))
    }

    /// Number of tracked elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// `true` when no element is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adding_replaces_the_element_entry() {
        let first = Message::new("one").with_queue_id("q1").with_element_id("banner");
        let second = Message::new("two").with_queue_id("q2").with_element_id("banner");

        let state = QueuedInlineMessagesState::default()
            .add_message(first, "banner")
            .add_message(second.clone(), "banner");

        assert_eq!(state.len(), 1);
        assert_eq!(state.get("banner").map(InlineMessageState::message), Some(&second));
    }

    #[test]
    fn updates_are_keyed_by_queue_id() {
        let message = Message::new("one").with_queue_id("q1").with_element_id("banner");
        let state = QueuedInlineMessagesState::default().add_message(message.clone(), "banner");

        let embedded = state.update_message_state(
            "q1",
            InlineMessageState::Embedded {
                message: message.clone(),
                element_id: "banner".into(),
            },
        );
        assert!(embedded.get("banner").is_some_and(InlineMessageState::is_embedded));

        let untouched =
            embedded.update_message_state("unknown", InlineMessageState::Dismissed { message });
        assert_eq!(untouched, embedded);
    }
}
