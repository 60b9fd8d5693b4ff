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

use herald_core::prelude::Message;

/// Receives the terminal events of message delivery.
///
/// Every method has an empty default so hosts implement only what they need.
/// Calls arrive on the store task.
pub trait InAppListener: Send + Sync + 'static {
    /// A message finished loading on its surface.
    fn on_message_shown(&self, _message: &Message) {}

    /// A message left its surface.
    fn on_message_dismissed(&self, _message: &Message) {}

    /// A message failed to load.
    fn on_error(&self, _message: &Message) {}

    /// The user tapped an action inside a message.
    fn on_action(&self, _message: &Message, _route: &str, _action: &str, _name: &str) {}

    /// An inline message is ready for the element `element_id`.
    fn embed_message(&self, _message: &Message, _element_id: &str) {}
}
