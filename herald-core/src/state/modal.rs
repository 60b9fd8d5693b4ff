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

/// Lifecycle of the single modal surface.
///
/// `Initial → Loading → Displayed → Dismissed`, after which a new load starts
/// the cycle again. A reset returns to `Initial`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ModalMessageState {
    /// Nothing has been presented since the session started.
    #[default]
    Initial,
    /// The presenter was asked to open the message.
    Loading(Message),
    /// The message content reported that it finished loading.
    Displayed(Message),
    /// The message was closed or failed to load.
    Dismissed(Message),
}

impl ModalMessageState {
    /// The message the surface is tied to, if any.
    #[must_use]
    pub const fn message(&self) -> Option<&Message> {
        match self {
            Self::Initial => None,
            Self::Loading(message) | Self::Displayed(message) | Self::Dismissed(message) => {
                Some(message)
            }
        }
    }

    /// `true` while a message is on screen.
    #[must_use]
    pub const fn is_displayed(&self) -> bool {
        matches!(self, Self::Displayed(_))
    }

    /// `true` while a message occupies the surface, loaded or not.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Loading(_) | Self::Displayed(_))
    }

    /// The message currently occupying the surface.
    #[must_use]
    pub const fn active_message(&self) -> Option<&Message> {
        match self {
            Self::Loading(message) | Self::Displayed(message) => Some(message),
            Self::Initial | Self::Dismissed(_) => None,
        }
    }

    /// Short label used in logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Initial => "Initial",
            Self::Loading(_) => "Loading",
            Self::Displayed(_) => "Displayed",
            Self::Dismissed(_) => "Dismissed",
        }
    }
}
