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

//! The fixed middleware pipeline every action passes through before the
//! reducer.

use std::sync::Arc;

use herald_core::prelude::{Action, EligibilityEngine};

use crate::catalog::RefreshHandle;
use crate::store::{Next, StoreContext};
use crate::traits::{CatalogClient, InAppListener, SurfacePresenter};

pub use error_report::ErrorReportingMiddleware;
pub use listener_fanout::ListenerFanoutMiddleware;
pub use logging::LoggingMiddleware;
pub use modal_activation::ModalActivationMiddleware;
pub use route_change::RouteChangeMiddleware;
pub use selection::SelectionMiddleware;
pub use user_guard::UserGuardMiddleware;
pub use view_telemetry::ViewTelemetryMiddleware;

mod error_report;
mod listener_fanout;
mod logging;
mod modal_activation;
mod route_change;
mod selection;
mod user_guard;
mod view_telemetry;

/// One stage of the pipeline.
///
/// A middleware either forwards the action with [`Next::run`], possibly
/// changed, or drops it by returning without calling `next`. It may dispatch
/// follow-up actions through the context at any point; those run through the
/// whole pipeline before `dispatch` returns.
///
/// Returning an error reports it as a `ReportError` action. The error does
/// not undo anything already forwarded.
pub trait Middleware: Send + Sync + 'static {
    /// Short name used in logs and error reports.
    fn name(&self) -> &'static str;

    /// Handles `action`.
    ///
    /// # Errors
    ///
    /// Any error is logged and reported through a `ReportError` action.
    fn handle(
        &self,
        store: &mut StoreContext<'_>,
        action: Action,
        next: Next,
    ) -> anyhow::Result<()>;
}

/// Collaborators the standard pipeline needs.
#[derive(Clone)]
pub struct PipelineParts {
    /// Receives view reports.
    pub catalog: Arc<dyn CatalogClient>,
    /// Opens the modal surface.
    pub presenter: Arc<dyn SurfacePresenter>,
    /// Host callbacks, if the host registered any.
    pub listener: Option<Arc<dyn InAppListener>>,
    /// Frequency caps for broadcast messages.
    pub broadcast: Arc<EligibilityEngine>,
    /// Frequency caps for anonymous messages.
    pub anonymous: Arc<EligibilityEngine>,
    /// Wakes the catalog poller.
    pub refresh: RefreshHandle,
}

/// Builds the standard pipeline in its fixed order.
#[must_use]
pub fn default_pipeline(parts: PipelineParts) -> Vec<Arc<dyn Middleware>> {
    let PipelineParts {
        catalog,
        presenter,
        listener,
        broadcast,
        anonymous,
        refresh,
    } = parts;

    vec![
        Arc::new(LoggingMiddleware),
        Arc::new(ErrorReportingMiddleware),
        Arc::new(ViewTelemetryMiddleware::new(catalog, broadcast, anonymous, refresh)),
        Arc::new(ModalActivationMiddleware::new(presenter)),
        Arc::new(UserGuardMiddleware),
        Arc::new(RouteChangeMiddleware),
        Arc::new(SelectionMiddleware),
        Arc::new(ListenerFanoutMiddleware::new(listener)),
    ]
}
