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

use herald_core::prelude::{Action, InlineMessageState, Message};
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::store::{MessageStore, Subscription};
use crate::traits::{InlineSurfaceView, MainThreadPoster};

/// Drives the host view behind one inline element.
pub struct InlineSurfaceController {
    store: MessageStore,
    element_id: String,
    attached: Arc<Mutex<Option<Message>>>,
    subscription: Option<Subscription>,
}

impl InlineSurfaceController {
    /// Binds `view` to the inline state of `element_id`.
    pub fn attach(
        store: MessageStore,
        element_id: impl Into<String>,
        view: Arc<dyn InlineSurfaceView>,
        poster: Arc<dyn MainThreadPoster>,
    ) -> Self {
        let element_id = element_id.into();
        let attached = Arc::new(Mutex::new(None));

        let subscription = {
            let element_id = element_id.clone();
            let attached = Arc::clone(&attached);
            store.subscribe_to_attribute(
                move |state| state.queued_inline_messages_state.get(&element_id).cloned(),
                move |inline: Option<InlineMessageState>| {
                    let Some(inline) = inline else {
                        return;
                    };
                    let view = Arc::clone(&view);
                    let attached = Arc::clone(&attached);
                    poster.post(Box::new(move || apply(&*view, &attached, inline)));
                },
            )
        };

        Self {
            store,
            element_id,
            attached,
            subscription: Some(subscription),
        }
    }

    /// The element this controller drives.
    #[must_use]
    pub fn element_id(&self) -> &str {
        &self.element_id
    }

    /// The message currently shown in the element.
    #[must_use]
    pub fn attached_message(&self) -> Option<Message> {
        self.attached.lock().clone()
    }

    /// The embedded content finished loading.
    pub fn on_route_loaded(&self) {
        if let Some(message) = self.attached_message() {
            self.store.dispatch(Action::DisplayMessage { message });
        }
    }

    /// The user closed the embedded message.
    pub fn on_close(&self) {
        if let Some(message) = self.attached_message() {
            self.store.dispatch(Action::dismiss(message));
        }
    }

    /// The user tapped an action inside the embedded message.
    pub fn on_tap(&self, route: &str, name: &str, action: &str) {
        if let Some(message) = self.attached_message() {
            self.store.dispatch(Action::Tap {
                message,
                route: route.to_string(),
                name: name.to_string(),
                action: action.to_string(),
            });
        }
    }

    /// The host view was destroyed. Whatever it showed is dismissed without
    /// counting as a user close.
    pub fn detach(mut self) {
        self.unsubscribe();
        if let Some(message) = self.attached.lock().take() {
            debug!(element_id = %self.element_id, "inline surface destroyed");
            self.store.dispatch(Action::DismissMessage {
                message,
                should_log: false,
                via_close_action: false,
            });
        }
    }

    /// The host view went away but the element lives on, for example across
    /// a configuration change. The inline state is left as it is, so a
    /// controller attached later to the same element embeds the message
    /// again.
    pub fn release(mut self) {
        trace!(element_id = %self.element_id, "inline surface released");
        self.unsubscribe();
    }

    fn unsubscribe(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
    }
}

fn apply(
    view: &dyn InlineSurfaceView,
    attached: &Mutex<Option<Message>>,
    inline: InlineMessageState,
) {
    let mut attached = attached.lock();
    match inline {
        InlineMessageState::ReadyToEmbed { message, .. } => {
            trace!(message = message.tracking_id(), "embedding");
            view.embed(&message);
            *attached = Some(message);
        }
        InlineMessageState::Embedded { message, .. } if attached.is_none() => {
            trace!(message = message.tracking_id(), "re-embedding");
            view.embed(&message);
            *attached = Some(message);
        }
        InlineMessageState::Embedded { .. } => {}
        InlineMessageState::Dismissed { .. } => {
            view.clear();
            *attached = None;
        }
    }
}
