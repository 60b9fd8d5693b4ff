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

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use static_assertions::assert_impl_all;

pub use inline::{InlineMessageState, QueuedInlineMessagesState};
pub use modal::ModalMessageState;
pub use queue::MessageQueue;

mod inline;
mod modal;
mod queue;

/// Default catalog polling cadence.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 600_000;

/// Backend environment the session talks to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Production.
    #[default]
    Prod,
    /// Development.
    Dev,
    /// A locally running backend.
    Local,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Prod => "prod",
            Self::Dev => "dev",
            Self::Local => "local",
        };
        f.write_str(name)
    }
}

/// Immutable snapshot of everything the engine knows about the session.
///
/// Only the reducer produces new snapshots; everyone else reads them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InAppMessagingState {
    /// Workspace site id.
    pub site_id: String,
    /// Data center the workspace lives in.
    pub data_center: String,
    /// Backend environment.
    pub environment: Environment,
    /// Catalog polling cadence in milliseconds.
    pub poll_interval_ms: u64,
    /// Identifier of the current session, regenerated on reset.
    pub session_id: String,
    /// Route the host reported last.
    pub current_route: Option<String>,
    /// Identified user.
    pub user_id: Option<String>,
    /// Identifier used before the user identifies.
    pub anonymous_id: Option<String>,
    /// Whether the server asked for realtime updates.
    pub sse_enabled: bool,
    /// Catalog messages waiting to be shown.
    pub messages_in_queue: MessageQueue,
    /// Queue ids already shown in this session.
    pub shown_message_queue_ids: BTreeSet<String>,
    /// The single modal surface.
    pub modal_message_state: ModalMessageState,
    /// Inline surfaces keyed by element id.
    pub queued_inline_messages_state: QueuedInlineMessagesState,
}

assert_impl_all!(InAppMessagingState: Send, Sync);

impl Default for InAppMessagingState {
    fn default() -> Self {
        Self {
            site_id: String::new(),
            data_center: String::new(),
            environment: Environment::default(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            session_id: String::new(),
            current_route: None,
            user_id: None,
            anonymous_id: None,
            sse_enabled: false,
            messages_in_queue: MessageQueue::default(),
            shown_message_queue_ids: BTreeSet::new(),
            modal_message_state: ModalMessageState::default(),
            queued_inline_messages_state: QueuedInlineMessagesState::default(),
        }
    }
}

/// One field that differs between two snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateChange {
    /// Field name.
    pub field: &'static str,
    /// Debug rendering of the old value.
    pub before: String,
    /// Debug rendering of the new value.
    pub after: String,
}

impl fmt::Display for StateChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} -> {}", self.field, self.before, self.after)
    }
}

macro_rules! collect_changes {
    ($old:expr, $new:expr, [$($field:ident),* $(,)?]) => {{
        let mut changes = Vec::new();
        $(
            if $old.$field != $new.$field {
                changes.push(StateChange {
                    field: stringify!($field),
                    before: format!("{:?}", $old.$field),
                    after: format!("{:?}", $new.$field),
                });
            }
        )*
        changes
    }};
}

impl InAppMessagingState {
    /// The token persisted eligibility data is scoped to: the user id when
    /// identified, otherwise the anonymous id.
    #[must_use]
    pub fn user_token(&self) -> Option<&str> {
        self.user_id.as_deref().or(self.anonymous_id.as_deref())
    }

    /// Whether a named user is known.
    #[must_use]
    pub const fn is_user_identified(&self) -> bool {
        self.user_id.is_some()
    }

    /// Whether any identity, named or anonymous, is known.
    #[must_use]
    pub const fn has_identity(&self) -> bool {
        self.user_id.is_some() || self.anonymous_id.is_some()
    }

    /// Realtime updates replace polling only for identified users.
    #[must_use]
    pub const fn should_use_sse(&self) -> bool {
        self.sse_enabled && self.is_user_identified()
    }

    /// Lists the fields that differ from `other`.
    #[must_use]
    pub fn diff(&self, other: &Self) -> Vec<StateChange> {
        collect_changes!(
            self,
            other,
            [
                site_id,
                data_center,
                environment,
                poll_interval_ms,
                session_id,
                current_route,
                user_id,
                anonymous_id,
                sse_enabled,
                messages_in_queue,
                shown_message_queue_ids,
                modal_message_state,
                queued_inline_messages_state,
            ]
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn realtime_requires_an_identified_user() {
        let mut state = InAppMessagingState {
            sse_enabled: true,
            anonymous_id: Some("anon".into()),
            ..InAppMessagingState::default()
        };
        assert!(!state.should_use_sse());
        assert_eq!(state.user_token(), Some("anon"));

        state.user_id = Some("user".into());
        assert!(state.should_use_sse());
        assert_eq!(state.user_token(), Some("user"));
    }

    #[test]
    fn diff_lists_changed_fields() {
        let before = InAppMessagingState::default();
        let after = InAppMessagingState {
            current_route: Some("Home".into()),
            sse_enabled: true,
            ..before.clone()
        };

        let changes = before.diff(&after);
        let fields: Vec<_> = changes.iter().map(|change| change.field).collect();
        assert_eq!(fields, vec!["current_route", "sse_enabled"]);
        assert!(before.diff(&before).is_empty());
    }
}
