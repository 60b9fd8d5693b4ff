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

//! The closed set of actions the message store understands.

use uuid::Uuid;

use crate::model::{Message, MessagePosition};
use crate::state::Environment;

/// Every event that can change the engine's state.
///
/// The reducer and each middleware match on it exhaustively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Starts a session for a workspace.
    Initialize {
        /// Workspace site id.
        site_id: String,
        /// Data center of the workspace.
        data_center: String,
        /// Backend environment.
        environment: Environment,
        /// Fresh session identifier.
        session_id: String,
    },
    /// Changes the catalog polling cadence.
    SetPollingInterval {
        /// New interval in milliseconds.
        interval_ms: u64,
    },
    /// The host navigated to a new screen.
    SetPageRoute {
        /// Route name.
        route: String,
    },
    /// A named user identified.
    SetUserIdentifier {
        /// User id.
        user_id: String,
    },
    /// An anonymous identifier became available.
    SetAnonymousIdentifier {
        /// Anonymous id.
        anonymous_id: String,
    },
    /// The server switched realtime updates on or off.
    SetSseEnabled {
        /// New flag value.
        enabled: bool,
    },
    /// Asks the modal surface to open a message.
    LoadMessage {
        /// Message to open.
        message: Message,
        /// Anchor override.
        position: Option<MessagePosition>,
    },
    /// Queues messages for their inline elements.
    EmbedMessages {
        /// Messages carrying element ids.
        messages: Vec<Message>,
    },
    /// Replaces the queue with a catalog response and runs selection.
    ProcessMessageQueue {
        /// Catalog messages.
        messages: Vec<Message>,
    },
    /// A surface finished loading a message.
    DisplayMessage {
        /// The shown message.
        message: Message,
    },
    /// A message left its surface.
    DismissMessage {
        /// The removed message.
        message: Message,
        /// Whether the dismissal should be reported.
        should_log: bool,
        /// Whether the user pressed the close affordance.
        via_close_action: bool,
    },
    /// Surfaces an error to the host log.
    ReportError {
        /// Human readable description.
        message: String,
    },
    /// Empties the queue.
    ClearMessageQueue,
    /// Forgets the user and everything shown in the session.
    Reset {
        /// Identifier of the session that starts now.
        session_id: String,
    },
    /// The user tapped an action inside a message.
    Tap {
        /// Message the tap happened in.
        message: Message,
        /// Route at the time of the tap.
        route: String,
        /// Action name.
        name: String,
        /// Action payload.
        action: String,
    },
    /// A surface could not load a message.
    MessageLoadingFailed {
        /// The failed message.
        message: Message,
    },
}

impl Action {
    /// Starts a session with a freshly generated session id.
    pub fn initialize(
        site_id: impl Into<String>,
        data_center: impl Into<String>,
        environment: Environment,
    ) -> Self {
        Self::Initialize {
            site_id: site_id.into(),
            data_center: data_center.into(),
            environment,
            session_id: new_session_id(),
        }
    }

    /// Resets the session, generating the next session id.
    #[must_use]
    pub fn reset() -> Self {
        Self::Reset {
            session_id: new_session_id(),
        }
    }

    /// Loads `message` at its own anchor.
    #[must_use]
    pub const fn load(message: Message) -> Self {
        Self::LoadMessage {
            message,
            position: None,
        }
    }

    /// A user-initiated close.
    #[must_use]
    pub const fn dismiss(message: Message) -> Self {
        Self::DismissMessage {
            message,
            should_log: true,
            via_close_action: true,
        }
    }

    /// An engine-initiated close that must not be reported as a view.
    #[must_use]
    pub const fn dismiss_without_logging(message: Message) -> Self {
        Self::DismissMessage {
            message,
            should_log: false,
            via_close_action: true,
        }
    }

    /// An error for the host log.
    pub fn report_error(message: impl Into<String>) -> Self {
        Self::ReportError {
            message: message.into(),
        }
    }

    /// The variant name, for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Initialize { .. } => "Initialize",
            Self::SetPollingInterval { .. } => "SetPollingInterval",
            Self::SetPageRoute { .. } => "SetPageRoute",
            Self::SetUserIdentifier { .. } => "SetUserIdentifier",
            Self::SetAnonymousIdentifier { .. } => "SetAnonymousIdentifier",
            Self::SetSseEnabled { .. } => "SetSseEnabled",
            Self::LoadMessage { .. } => "LoadMessage",
            Self::EmbedMessages { .. } => "EmbedMessages",
            Self::ProcessMessageQueue { .. } => "ProcessMessageQueue",
            Self::DisplayMessage { .. } => "DisplayMessage",
            Self::DismissMessage { .. } => "DismissMessage",
            Self::ReportError { .. } => "ReportError",
            Self::ClearMessageQueue => "ClearMessageQueue",
            Self::Reset { .. } => "Reset",
            Self::Tap { .. } => "Tap",
            Self::MessageLoadingFailed { .. } => "MessageLoadingFailed",
        }
    }

    /// The single message an action is about, if any.
    #[must_use]
    pub const fn message(&self) -> Option<&Message> {
        match self {
            Self::LoadMessage { message, .. }
            | Self::DisplayMessage { message }
            | Self::DismissMessage { message, .. }
            | Self::Tap { message, .. }
            | Self::MessageLoadingFailed { message } => Some(message),
            Self::Initialize { .. }
            | Self::SetPollingInterval { .. }
            | Self::SetPageRoute { .. }
            | Self::SetUserIdentifier { .. }
            | Self::SetAnonymousIdentifier { .. }
            | Self::SetSseEnabled { .. }
            | Self::EmbedMessages { .. }
            | Self::ProcessMessageQueue { .. }
            | Self::ReportError { .. }
            | Self::ClearMessageQueue
            | Self::Reset { .. } => None,
        }
    }

    /// Whether the action counts as the one view of its message.
    ///
    /// A display counts unless the message is persistent. A persistent
    /// message counts when the user closes it through the close affordance.
    #[must_use]
    pub fn should_mark_message_as_shown(&self) -> bool {
        match self {
            Self::DisplayMessage { message } => !message.is_persistent(),
            Self::DismissMessage {
                message,
                should_log,
                via_close_action,
            } => message.is_persistent() && *should_log && *via_close_action,
            _ => false,
        }
    }
}

/// Generates a random version 4 UUID string.
#[must_use]
pub fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ids_look_like_uuids() {
        let id = new_session_id();
        assert_eq!(id.len(), 36);
        assert_eq!(Uuid::parse_str(&id).map(|uuid| uuid.get_version_num()).ok(), Some(4));
        assert_ne!(id, new_session_id());
    }

    #[test]
    fn shown_marking_depends_on_persistence() {
        let regular = Message::new("regular").with_queue_id("q1");
        let persistent = Message::new("sticky").with_queue_id("q2").with_persistent(true);

        assert!(Action::DisplayMessage { message: regular.clone() }.should_mark_message_as_shown());
        assert!(!Action::DisplayMessage {
            message: persistent.clone()
        }
        .should_mark_message_as_shown());
        assert!(!Action::dismiss(regular).should_mark_message_as_shown());
        assert!(Action::dismiss(persistent.clone()).should_mark_message_as_shown());
        assert!(
            !Action::dismiss_without_logging(persistent.clone()).should_mark_message_as_shown()
        );
        assert!(!Action::DismissMessage {
            message: persistent,
            should_log: true,
            via_close_action: false,
        }
        .should_mark_message_as_shown());
    }
}
