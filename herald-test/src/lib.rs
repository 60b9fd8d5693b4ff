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

//! Test support for Herald: recording collaborators, a manual clock and a
//! one-time tracing setup.
//!
//! Every fake records what it was asked to do behind a `parking_lot` mutex so
//! tests can assert on it from any task.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Once;

use async_trait::async_trait;
use herald_core::prelude::{Clock, Message, MessagePosition};
use herald_reactive::prelude::{
    CatalogClient, CatalogRequest, CatalogResponse, InAppListener, InlineSurfaceView, Reconnect,
    SseTransport, SurfacePresenter,
};
use parking_lot::Mutex;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

static INIT: Once = Once::new();

/// Initializes the global tracing subscriber for tests, once per process.
///
/// Output goes to `logs/herald_tests.log`; `RUST_LOG` overrides the default
/// `trace` filter.
pub fn initialize_tracing() {
    INIT.call_once(|| {
        if std::fs::create_dir_all("logs").is_err() {
            return;
        }
        let file_appender = RollingFileAppender::new(Rotation::NEVER, "logs", "herald_tests.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        // Leak the guard so the writer outlives every test.
        Box::leak(Box::new(guard));

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("trace"));
        let subscriber = FmtSubscriber::builder()
            .with_span_events(FmtSpan::NONE)
            .compact()
            .with_line_number(true)
            .without_time()
            .with_target(true)
            .with_ansi(false)
            .with_env_filter(filter)
            .with_writer(non_blocking)
            .finish();

        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: AtomicI64,
}

impl ManualClock {
    /// Creates a clock reading `start_ms`.
    #[must_use]
    pub const fn new(start_ms: i64) -> Self {
        Self {
            now_ms: AtomicI64::new(start_ms),
        }
    }

    /// Moves the clock forward by `ms`.
    pub fn advance(&self, ms: i64) {
        self.now_ms.fetch_add(ms, Ordering::SeqCst);
    }

    /// Sets the clock to `ms`.
    pub fn set(&self, ms: i64) {
        self.now_ms.store(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

/// A catalog backend answering from a script.
///
/// Scripted responses are served in order; once they run out every fetch
/// answers `204`.
#[derive(Debug, Default)]
pub struct RecordingCatalogClient {
    responses: Mutex<VecDeque<Result<CatalogResponse, String>>>,
    requests: Mutex<Vec<CatalogRequest>>,
    views: Mutex<Vec<(Message, String)>>,
}

impl RecordingCatalogClient {
    /// Creates a client with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response.
    pub fn push_response(&self, response: CatalogResponse) {
        self.responses.lock().push_back(Ok(response));
    }

    /// Queues a fetch failure.
    pub fn push_failure(&self, reason: &str) {
        self.responses.lock().push_back(Err(reason.to_string()));
    }

    /// Requests received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<CatalogRequest> {
        self.requests.lock().clone()
    }

    /// Messages reported as viewed, in order.
    #[must_use]
    pub fn viewed(&self) -> Vec<Message> {
        self.views.lock().iter().map(|(message, _)| message.clone()).collect()
    }

    /// Session ids that views were reported for, in order.
    #[must_use]
    pub fn view_sessions(&self) -> Vec<String> {
        self.views.lock().iter().map(|(_, session)| session.clone()).collect()
    }
}

#[async_trait]
impl CatalogClient for RecordingCatalogClient {
    async fn fetch_messages(&self, request: &CatalogRequest) -> anyhow::Result<CatalogResponse> {
        self.requests.lock().push(request.clone());
        let next = self.responses.lock().pop_front();
        match next {
            Some(Ok(response)) => Ok(response),
            Some(Err(reason)) => Err(anyhow::anyhow!(reason)),
            None => Ok(CatalogResponse::with_status(204)),
        }
    }

    fn log_view(&self, message: &Message, session_id: &str) {
        self.views.lock().push((message.clone(), session_id.to_string()));
    }
}

/// Records modal presentations.
#[derive(Debug, Default)]
pub struct RecordingPresenter {
    presented: Mutex<Vec<(Message, MessagePosition)>>,
    teardowns: AtomicUsize,
}

impl RecordingPresenter {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages presented so far, with their anchors.
    #[must_use]
    pub fn presented(&self) -> Vec<(Message, MessagePosition)> {
        self.presented.lock().clone()
    }

    /// Template ids of the presented messages, in order.
    #[must_use]
    pub fn presented_ids(&self) -> Vec<String> {
        self.presented.lock().iter().map(|(message, _)| message.message_id.clone()).collect()
    }

    /// Number of teardowns.
    #[must_use]
    pub fn teardowns(&self) -> usize {
        self.teardowns.load(Ordering::SeqCst)
    }
}

impl SurfacePresenter for RecordingPresenter {
    fn present_modal(&self, message: &Message, position: MessagePosition) {
        self.presented.lock().push((message.clone(), position));
    }

    fn teardown_modal(&self) {
        self.teardowns.fetch_add(1, Ordering::SeqCst);
    }
}

/// One host listener callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenerEvent {
    /// `on_message_shown`.
    Shown(Message),
    /// `on_message_dismissed`.
    Dismissed(Message),
    /// `on_error`.
    Error(Message),
    /// `on_action`.
    Action {
        /// The message.
        message: Message,
        /// Route of the tap.
        route: String,
        /// Action payload.
        action: String,
        /// Action name.
        name: String,
    },
    /// `embed_message`.
    Embed {
        /// The message.
        message: Message,
        /// Target element.
        element_id: String,
    },
}

/// Records listener callbacks.
#[derive(Debug, Default)]
pub struct RecordingListener {
    events: Mutex<Vec<ListenerEvent>>,
}

impl RecordingListener {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Callbacks received so far.
    #[must_use]
    pub fn events(&self) -> Vec<ListenerEvent> {
        self.events.lock().clone()
    }
}

impl InAppListener for RecordingListener {
    fn on_message_shown(&self, message: &Message) {
        self.events.lock().push(ListenerEvent::Shown(message.clone()));
    }

    fn on_message_dismissed(&self, message: &Message) {
        self.events.lock().push(ListenerEvent::Dismissed(message.clone()));
    }

    fn on_error(&self, message: &Message) {
        self.events.lock().push(ListenerEvent::Error(message.clone()));
    }

    fn on_action(&self, message: &Message, route: &str, action: &str, name: &str) {
        self.events.lock().push(ListenerEvent::Action {
            message: message.clone(),
            route: route.to_string(),
            action: action.to_string(),
            name: name.to_string(),
        });
    }

    fn embed_message(&self, message: &Message, element_id: &str) {
        self.events.lock().push(ListenerEvent::Embed {
            message: message.clone(),
            element_id: element_id.to_string(),
        });
    }
}

/// One transport call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportCall {
    /// `start_connection`.
    Start,
    /// `stop_connection`.
    Stop,
}

/// Records realtime transport calls.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    calls: Mutex<Vec<TransportCall>>,
}

impl RecordingTransport {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls received so far.
    #[must_use]
    pub fn calls(&self) -> Vec<TransportCall> {
        self.calls.lock().clone()
    }

    /// Number of `start_connection` calls.
    #[must_use]
    pub fn starts(&self) -> usize {
        self.count(TransportCall::Start)
    }

    /// Number of `stop_connection` calls.
    #[must_use]
    pub fn stops(&self) -> usize {
        self.count(TransportCall::Stop)
    }

    fn count(&self, kind: TransportCall) -> usize {
        self.calls.lock().iter().filter(|call| **call == kind).count()
    }
}

impl SseTransport for RecordingTransport {
    fn start_connection(&self) {
        self.calls.lock().push(TransportCall::Start);
    }

    fn stop_connection(&self) {
        self.calls.lock().push(TransportCall::Stop);
    }
}

/// Counts reconnect requests.
#[derive(Debug, Default)]
pub struct RecordingReconnect {
    reconnects: AtomicUsize,
}

impl RecordingReconnect {
    /// Creates a counter at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconnects requested so far.
    #[must_use]
    pub fn reconnects(&self) -> usize {
        self.reconnects.load(Ordering::SeqCst)
    }
}

impl Reconnect for RecordingReconnect {
    fn reconnect(&self) {
        self.reconnects.fetch_add(1, Ordering::SeqCst);
    }
}

/// Records what an inline element was asked to show.
#[derive(Debug, Default)]
pub struct RecordingInlineView {
    embedded: Mutex<Vec<Message>>,
    clears: AtomicUsize,
}

impl RecordingInlineView {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages embedded so far, in order.
    #[must_use]
    pub fn embedded(&self) -> Vec<Message> {
        self.embedded.lock().clone()
    }

    /// Number of clears.
    #[must_use]
    pub fn clears(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }
}

impl InlineSurfaceView for RecordingInlineView {
    fn embed(&self, message: &Message) {
        self.embedded.lock().push(message.clone());
    }

    fn clear(&self) {
        self.clears.fetch_add(1, Ordering::SeqCst);
    }
}
