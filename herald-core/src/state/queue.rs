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

use crate::model::Message;

/// The catalog messages waiting to be shown.
///
/// Holds distinct messages; duplicates are dropped on construction and the
/// first occurrence keeps its position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageQueue {
    messages: Vec<Message>,
}

impl MessageQueue {
    /// Builds a queue from `messages`, dropping exact duplicates.
    #[must_use]
    pub fn from_messages(messages: &[Message]) -> Self {
        let mut distinct: Vec<Message> = Vec::with_capacity(messages.len());
        for message in messages {
            if !distinct.contains(message) {
                distinct.push(message.clone());
            }
        }
        Self { messages: distinct }
    }

    /// A copy without any message carrying `queue_id`.
    #[must_use]
    pub fn without_queue_id(&self, queue_id: &str) -> Self {
        Self {
            messages: self
                .messages
                .iter()
                .filter(|message| message.queue_id.as_deref() != Some(queue_id))
                .cloned()
                .collect(),
        }
    }

    /// Whether `message` is queued.
    #[must_use]
    pub fn contains(&self, message: &Message) -> bool {
        self.messages.contains(message)
    }

    /// Iterates over the queued messages.
    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    /// The queued messages as a list.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Message> {
        self.messages.clone()
    }

    /// Number of queued messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// `true` when nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl<'a> IntoIterator for &'a MessageQueue {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}
