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

use super::Middleware;
use crate::store::{Next, StoreContext};

pub(crate) const USER_NOT_SET: &str = "User is not set.";

/// Drops message actions until the user has an identity.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserGuardMiddleware;

impl UserGuardMiddleware {
    const fn allowed_without_identity(action: &Action) -> bool {
        matches!(
            action,
            Action::Initialize { .. }
                | Action::SetUserIdentifier { .. }
                | Action::SetAnonymousIdentifier { .. }
                | Action::SetPageRoute { .. }
                | Action::SetSseEnabled { .. }
                | Action::SetPollingInterval { .. }
                | Action::Reset { .. }
                | Action::ReportError { .. }
        )
    }
}

impl Middleware for UserGuardMiddleware {
    fn name(&self) -> &'static str {
        "user_guard"
    }

    fn handle(

        &self,

        store: &mut StoreContext<'_>,

        action: Action,

        next: Next,

    ) -> anyhow::Result<()> {
        if Self::allowed_without_identity(&action) || store.state().has_identity() {
            next.run(store, action);
        } else {
            store.dispatch(Action::report_error(USER_NOT_SET));
        }
        Ok(())
    }
}
