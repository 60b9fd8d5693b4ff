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

#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Herald Reactive
//!
//! The running side of the Herald in-app message engine, built on Tokio. It
//! takes the pure model from `herald-core` and gives it a single writer,
//! collaborators and time.
//!
//! ## Key Concepts
//!
//! - **Store (`MessageStore`)**: one task owns the session state; actions are
//!   queued from anywhere and processed strictly in order.
//! - **Middleware**: a fixed pipeline (logging, error surfacing, view
//!   telemetry, modal activation, user guard, route change, selection,
//!   listener fan-out) runs before the reducer and may dispatch follow-ups.
//! - **Selection (`MessageSelector`)**: picks the modal and inline messages
//!   for the current route.
//! - **Catalog (`CatalogSync`, `CatalogPoller`)**: applies catalog responses
//!   and polls on the server's cadence.
//! - **Realtime (`SseSession`, `ConnectionLifecycleManager`)**: event codec,
//!   reconnect policy and the rules for when the channel is open.
//! - **Collaborators (`traits`)**: everything host-specific, from HTTP to UI,
//!   sits behind small traits.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use herald_reactive::prelude::*;
//!
//! let runtime = HeraldApp::new(catalog, presenter, transport).launch_async().await;
//! runtime.initialize("site-id", "us", Environment::Prod);
//! runtime.identify("user-1");
//! runtime.set_route("Dashboard");
//! ```

/// Catalog requests, responses and polling.
pub mod catalog;

/// Engine assembly and shared helpers.
pub(crate) mod common;

/// Realtime connection lifecycle.
pub(crate) mod lifecycle;

/// Tracing setup.
pub mod logging;

/// The middleware pipeline.
pub mod middleware;

/// Message selection rules.
pub(crate) mod selector;

/// The realtime channel.
pub mod sse;

/// The single-writer store.
pub(crate) mod store;

/// Headless surface controllers.
pub(crate) mod surface;

/// Collaborator interfaces implemented by the host.
pub(crate) mod traits;

/// Header names shared by catalog and realtime requests.
pub mod headers {
    pub use crate::common::headers::*;
}

/// A prelude module for conveniently importing the most commonly used items.
///
/// Re-exports the `herald-core` prelude alongside this crate's types, plus
/// [`async_trait`](https://docs.rs/async-trait) for implementing
/// [`CatalogClient`](crate::traits::CatalogClient).
pub mod prelude {
    pub use async_trait::async_trait;
    pub use herald_core::prelude::*;

    pub use crate::catalog::{
        CatalogOutcome, CatalogPoller, CatalogRequest, CatalogResponse, CatalogSync, RefreshHandle,
    };
    pub use crate::common::{HeraldApp, HeraldRuntime};
    pub use crate::lifecycle::{ConnectionLifecycleManager, InlinePoster, TaskPoster};
    pub use crate::logging::init_tracing;
    pub use crate::middleware::{default_pipeline, Middleware, PipelineParts};
    pub use crate::selector::{MessageSelector, Selection};
    pub use crate::sse::{
        decode_lines, RetryConfig, RetryDecision, RetryPolicy, SessionEnd, SseError, SseEvent,
        SseRequest, SseRequestError, SseSession,
    };
    pub use crate::store::{
        MessageStore, Next, StoreContext, StoreStats, Subscription, SubscriptionId,
    };
    pub use crate::surface::{InlineSurfaceController, ModalSurfaceController};
    pub use crate::traits::{
        CatalogClient, InAppListener, InlineSurfaceView, MainThreadPoster, PostedTask, Reconnect,
        SseTransport, SurfacePresenter,
    };
}
