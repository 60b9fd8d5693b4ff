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
use tracing::error;

use super::Middleware;
use crate::store::{Next, StoreContext};

/// Surfaces `ReportError` actions in the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorReportingMiddleware;

impl Middleware for ErrorReportingMiddleware {
    fn name(&self) -> &'static str {
        "error_reporting"
    }

    fn handle(

        &self,

        store: &mut StoreContext<'_>,

        action: Action,

        next: Next,

    ) -> anyhow::Result<()> {
        if let Action::ReportError { message } = &action {
            error!("{message}");
        }
        next.run(store, action);
        Ok(())
    }
}
