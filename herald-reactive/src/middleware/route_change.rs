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

use herald_core::prelude::Action;
use tracing::debug;

use super::Middleware;
use crate::store::{Next, StoreContext};

/// Re-evaluates the screen after the host navigates.
///
/// A modal message whose route rule no longer matches is closed without
/// reporting a view, then selection runs again over the queue.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteChangeMiddleware;

impl Middleware for RouteChangeMiddleware {
    fn name(&self) -> &'static str {
        "route_change"
    }

    fn handle(

        &self,

        store: &mut StoreContext<'_>,

        action: Action,

        next: Next,

    ) -> anyhow::Result<()> {
        let route = match &action {
            Action::SetPageRoute { route } => route.clone(),
            _ => {
                next.run(store, action);
                return Ok(());
            }
        };
        next.run(store, action);

        let state = store.state();
        if let Some(message) = state.modal_message_state.active_message() {
            if !message.still_matches_route(&route) {
                debug!(
                    message = message.tracking_id(),
                    %route,
                    "route no longer matches, dismissing"
                );
                store.dispatch(Action::dismiss_without_logging(message.clone()));
            }
        }

        let queue = store.state().messages_in_queue.to_vec();
        store.dispatch(Action::ProcessMessageQueue { messages: queue });
        Ok(())
    }
}
