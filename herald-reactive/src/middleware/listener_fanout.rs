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

use herald_core::prelude::Action;

use super::Middleware;
use crate::store::{Next, StoreContext};
use crate::traits::InAppListener;

/// Forwards delivery events to the host listener after the reducer ran.
pub struct ListenerFanoutMiddleware {
    listener: Option<Arc<dyn InAppListener>>,
}

impl ListenerFanoutMiddleware {
    /// Creates the middleware. Without a listener it only forwards actions.
    pub fn new(listener: Option<Arc<dyn InAppListener>>) -> Self {
        Self { listener }
    }

    fn notify(listener: &dyn InAppListener, action: &Action) {
        match action {
            Action::DisplayMessage { message } => listener.on_message_shown(message),
            Action::DismissMessage { message, .. } => listener.on_message_dismissed(message),
            Action::MessageLoadingFailed { message } => listener.on_error(message),
            Action::Tap {
                message,
                route,
                name,
                action,
            } => listener.on_action(message, route, action, name),
            Action::EmbedMessages { messages } => {
                for message in messages {
                    if let Some(element_id) = message.element_id() {
                        listener.embed_message(message, element_id);
                    }
                }
            }
            _ => {}
        }
    }
}

impl Middleware for ListenerFanoutMiddleware {
    fn name(&self) -> &'static str {
        "listener_fanout"
    }

    fn handle(

        &self,

        store: &mut StoreContext<'_>,

        action: Action,

        next: Next,

    ) -> anyhow::Result<()> {
        let Some(listener) = self.listener.as_deref() else {
            next.run(store, action);
            return Ok(());
        };
        let notification = action.clone();
        next.run(store, action);
        Self::notify(listener, &notification);
        Ok(())
    }
}
