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
use tracing::debug;

use super::Middleware;
use crate::store::{Next, StoreContext};
use crate::traits::SurfacePresenter;

pub(crate) const MODAL_BUSY: &str = "A message is already being shown or cancelled";

/// Opens the modal surface for `LoadMessage` actions.
///
/// Only one modal can be on screen; a load while another message is displayed
/// is rejected.
pub struct ModalActivationMiddleware {
    presenter: Arc<dyn SurfacePresenter>,
}

impl ModalActivationMiddleware {
    /// Creates the middleware.
    pub fn new(presenter: Arc<dyn SurfacePresenter>) -> Self {
        Self { presenter }
    }
}

impl Middleware for ModalActivationMiddleware {
    fn name(&self) -> &'static str {
        "modal_activation"
    }

    fn handle(

        &self,

        store: &mut StoreContext<'_>,

        action: Action,

        next: Next,

    ) -> anyhow::Result<()> {
        if let Action::LoadMessage { message, position } = &action {
            if !message.is_embedded() {
                if store.state().modal_message_state.is_displayed() {
                    store.dispatch(Action::report_error(MODAL_BUSY));
                    return Ok(());
                }
                let position = position.unwrap_or_else(|| message.position());
                debug!(message = message.tracking_id(), ?position, "presenting modal");
                self.presenter.present_modal(message, position);
            }
        }
        next.run(store, action);
        Ok(())
    }
}
