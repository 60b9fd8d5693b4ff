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

use herald_core::prelude::{Action, Message};
use tracing::debug;

use crate::store::{MessageStore, Subscription};
use crate::traits::{MainThreadPoster, SurfacePresenter};

/// Connects one presented modal message to the store.
///
/// The host creates a controller when `present_modal` is called and forwards
/// the rendered content's callbacks to it. The presenter is torn down once
/// the store no longer shows the message.
pub struct ModalSurfaceController {
    store: MessageStore,
    message: Message,
    subscription: Option<Subscription>,
}

impl ModalSurfaceController {
    /// Starts watching the modal state for `message`.
    pub fn attach(
        store: MessageStore,
        message: Message,
        presenter: Arc<dyn SurfacePresenter>,
        poster: Arc<dyn MainThreadPoster>,
    ) -> Self {
        let watched = message.clone();
        let mut was_active = false;
        let subscription = store.subscribe_to_attribute(
            move |state| state.modal_message_state.active_message() == Some(&watched),
            move |active| {
                if active {
                    was_active = true;
                } else if was_active {
                    was_active = false;
                    debug!("modal message left the screen, tearing down");
                    let presenter = Arc::clone(&presenter);
                    poster.post(Box::new(move || presenter.teardown_modal()));
                }
            },
        );

        Self {
            store,
            message,
            subscription: Some(subscription),
        }
    }

    /// The message this controller is bound to.
    #[must_use]
    pub const fn message(&self) -> &Message {
        &self.message
    }

    /// The content finished loading.
    pub fn on_route_loaded(&self) {
        self.store.dispatch(Action::DisplayMessage {
            message: self.message.clone(),
        });
    }

    /// The user closed the message.
    pub fn on_close(&self) {
        self.store.dispatch(Action::dismiss(self.message.clone()));
    }

    /// The content could not be loaded.
    pub fn on_load_failed(&self) {
        self.store.dispatch(Action::MessageLoadingFailed {
            message: self.message.clone(),
        });
    }

    /// The user tapped an action inside the message.
    pub fn on_tap(&self, route: &str, name: &str, action: &str) {
        self.store.dispatch(Action::Tap {
            message: self.message.clone(),
            route: route.to_string(),
            name: name.to_string(),
            action: action.to_string(),
        });
    }

    /// Stops watching the store.
    pub fn detach(mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
    }
}
