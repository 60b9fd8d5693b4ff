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

//! The pure state transition function.

use crate::action::Action;
use crate::model::Message;
use crate::state::{
    InAppMessagingState, InlineMessageState, MessageQueue, ModalMessageState,
    QueuedInlineMessagesState,
};

/// Computes the state that follows `state` once `action` is applied.
///
/// Performs no I/O and never fails; actions that do not apply to the current
/// state return an unchanged copy.
#[must_use]
pub fn reduce(state: &InAppMessagingState, action: &Action) -> InAppMessagingState {
    match action {
        Action::Initialize {
            site_id,
            data_center,
            environment,
            session_id,
        } => InAppMessagingState {
            site_id: site_id.clone(),
            data_center: data_center.clone(),
            environment: *environment,
            session_id: session_id.clone(),
            ..state.clone()
        },
        Action::SetPollingInterval { interval_ms } => InAppMessagingState {
            poll_interval_ms: *interval_ms,
            ..state.clone()
        },
        Action::SetPageRoute { route } => InAppMessagingState {
            current_route: Some(route.clone()),
            ..state.clone()
        },
        Action::SetUserIdentifier { user_id } => InAppMessagingState {
            user_id: Some(user_id.clone()),
            ..state.clone()
        },
        Action::SetAnonymousIdentifier { anonymous_id } => InAppMessagingState {
            anonymous_id: Some(anonymous_id.clone()),
            ..state.clone()
        },
        Action::SetSseEnabled { enabled } => InAppMessagingState {
            sse_enabled: *enabled,
            ..state.clone()
        },
        Action::LoadMessage { message, .. } => InAppMessagingState {
            modal_message_state: ModalMessageState::Loading(message.clone()),
            ..state.clone()
        },
        Action::EmbedMessages { messages } => {
            let queued_inline_messages_state = messages.iter().fold(
                state.queued_inline_messages_state.clone(),
                |inline, message| match message.element_id() {
                    Some(element_id) => inline.add_message(message.clone(), element_id),
                    None => inline,
                },
            );
            InAppMessagingState {
                queued_inline_messages_state,
                ..state.clone()
            }
        }
        Action::ProcessMessageQueue { messages } => InAppMessagingState {
            messages_in_queue: MessageQueue::from_messages(messages),
            ..state.clone()
        },
        Action::ClearMessageQueue => InAppMessagingState {
            messages_in_queue: MessageQueue::default(),
            ..state.clone()
        },
        Action::DisplayMessage { message } => with_message_displayed(state, action, message),
        Action::DismissMessage { message, .. } => with_message_dismissed(state, action, message),
        Action::MessageLoadingFailed { message } => with_message_dismissed(state, action, message),
        Action::Reset { session_id } => InAppMessagingState {
            user_id: None,
            current_route: None,
            session_id: session_id.clone(),
            messages_in_queue: MessageQueue::default(),
            shown_message_queue_ids: Default::default(),
            modal_message_state: ModalMessageState::Initial,
            queued_inline_messages_state: QueuedInlineMessagesState::default(),
            ..state.clone()
        },
        Action::ReportError { .. } | Action::Tap { .. } => state.clone(),
    }
}

fn with_message_displayed(
    state: &InAppMessagingState,
    action: &Action,
    message: &Message,
) -> InAppMessagingState {
    let mut next = state.clone();

    if let Some(queue_id) = message.queue_id.as_deref() {
        if action.should_mark_message_as_shown() {
            next.shown_message_queue_ids.insert(queue_id.to_string());
        }
        next.messages_in_queue = state.messages_in_queue.without_queue_id(queue_id);
    }

    match (message.element_id(), message.queue_id.as_deref()) {
        (Some(element_id), Some(queue_id)) => {
            next.queued_inline_messages_state =
                state.queued_inline_messages_state.update_message_state(
                    queue_id,
                    InlineMessageState::Embedded {
                        message: message.clone(),
                        element_id: element_id.to_string(),
                    },
                );
        }
        (Some(_), None) => {}
        (None, _) => next.modal_message_state = ModalMessageState::Displayed(message.clone()),
    }
    next
}

fn with_message_dismissed(
    state: &InAppMessagingState,
    action: &Action,
    message: &Message,
) -> InAppMessagingState {
    let mut next = state.clone();

    if let Some(queue_id) = message.queue_id.as_deref() {
        if action.should_mark_message_as_shown() {
            next.shown_message_queue_ids.insert(queue_id.to_string());
        }
    }

    if message.is_embedded() {
        if let Some(queue_id) = message.queue_id.as_deref() {
            next.queued_inline_messages_state =
                state.queued_inline_messages_state.update_message_state(
                    queue_id,
                    InlineMessageState::Dismissed {
                        message: message.clone(),
                    },
                );
        }
    } else {
        next.modal_message_state = ModalMessageState::Dismissed(message.clone());
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Environment;

    fn identified() -> InAppMessagingState {
        reduce(
            &InAppMessagingState::default(),
            &Action::SetUserIdentifier {
                user_id: "user".into(),
            },
        )
    }

    #[test]
    fn initialize_sets_workspace_and_session() {
        let state = reduce(
            &InAppMessagingState::default(),
            &Action::Initialize {
                site_id: "site".into(),
                data_center: "us".into(),
                environment: Environment::Dev,
                session_id: "session".into(),
            },
        );
        assert_eq!(state.site_id, "site");
        assert_eq!(state.data_center, "us");
        assert_eq!(state.environment, Environment::Dev);
        assert_eq!(state.session_id, "session");
    }

    #[test]
    fn modal_cycle() {
        let message = Message::new("m").with_queue_id("q1");
        let queued = reduce(
            &identified(),
            &Action::ProcessMessageQueue {
                messages: vec![message.clone()],
            },
        );
        let loading = reduce(&queued, &Action::load(message.clone()));
        assert_eq!(loading.modal_message_state, ModalMessageState::Loading(message.clone()));

        let displayed = reduce(&loading, &Action::DisplayMessage { message: message.clone() });
        assert_eq!(displayed.modal_message_state, ModalMessageState::Displayed(message.clone()));
        assert!(displayed.shown_message_queue_ids.contains("q1"));
        assert!(displayed.messages_in_queue.is_empty());

        let dismissed = reduce(&displayed, &Action::dismiss(message.clone()));
        assert_eq!(dismissed.modal_message_state, ModalMessageState::Dismissed(message));
    }

    #[test]
    fn persistent_messages_are_marked_on_close() {
        let message = Message::new("m").with_queue_id("q1").with_persistent(true);
        let displayed = reduce(&identified(), &Action::DisplayMessage { message: message.clone() });
        assert!(displayed.shown_message_queue_ids.is_empty());

        let closed = reduce(&displayed, &Action::dismiss(message));
        assert!(closed.shown_message_queue_ids.contains("q1"));
    }

    #[test]
    fn inline_cycle_is_keyed_by_queue_id() {
        let message = Message::new("m").with_queue_id("q1").with_element_id("banner");
        let ready = reduce(
            &identified(),
            &Action::EmbedMessages {
                messages: vec![message.clone()],
            },
        );
        assert!(matches!(
            ready.queued_inline_messages_state.get("banner"),
            Some(InlineMessageState::ReadyToEmbed { .. })
        ));

        let embedded = reduce(&ready, &Action::DisplayMessage { message: message.clone() });
        assert!(embedded
            .queued_inline_messages_state
            .get("banner")
            .is_some_and(InlineMessageState::is_embedded));
        assert_eq!(embedded.modal_message_state, ModalMessageState::Initial);

        let dismissed = reduce(&embedded, &Action::dismiss(message.clone()));
        assert_eq!(
            dismissed.queued_inline_messages_state.get("banner"),
            Some(&InlineMessageState::Dismissed { message })
        );
    }

    #[test]
    fn untracked_inline_dismissal_changes_nothing() {
        let message = Message::new("m").with_element_id("banner");
        let state = identified();
        assert_eq!(reduce(&state, &Action::dismiss(message)), state);
    }

    #[test]
    fn loading_failure_dismisses_the_modal() {
        let message = Message::new("m").with_queue_id("q1");
        let loading = reduce(&identified(), &Action::load(message.clone()));
        let failed = reduce(&loading, &Action::MessageLoadingFailed { message: message.clone() });
        assert_eq!(failed.modal_message_state, ModalMessageState::Dismissed(message));
        assert!(failed.shown_message_queue_ids.is_empty());
    }

    #[test]
    fn reset_forgets_the_session() {
        let message = Message::new("m").with_queue_id("q1");
        let mut state = identified();
        for action in [
            Action::SetPageRoute { route: "Home".into() },
            Action::SetSseEnabled { enabled: true },
            Action::ProcessMessageQueue {
                messages: vec![message.clone()],
            },
            Action::load(message.clone()),
            Action::DisplayMessage { message },
        ] {
            state = reduce(&state, &action);
        }

        let reset = reduce(
            &state,
            &Action::Reset {
                session_id: "next".into(),
            },
        );
        assert_eq!(reset.user_id, None);
        assert_eq!(reset.current_route, None);
        assert_eq!(reset.session_id, "next");
        assert!(reset.sse_enabled);
        assert!(!reset.should_use_sse());
        assert!(reset.shown_message_queue_ids.is_empty());
        assert!(reset.messages_in_queue.is_empty());
        assert_eq!(reset.modal_message_state, ModalMessageState::Initial);
    }

    #[test]
    fn informational_actions_leave_state_alone() {
        let state = identified();
        assert_eq!(reduce(&state, &Action::report_error("boom")), state);
        assert_eq!(
            reduce(
                &state,
                &Action::Tap {
                    message: Message::new("m"),
                    route: "Home".into(),
                    name: "cta".into(),
                    action: "open".into(),
                }
            ),
            state
        );
    }
}
