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
use std::time::Duration;

use futures::{Stream, StreamExt};
use herald_core::prelude::{Action, HeraldConfig};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, trace};

use super::{HeartbeatTimer, RetryConfig, RetryDecision, RetryPolicy, SseError, SseEvent};
use crate::store::MessageStore;
use crate::traits::Reconnect;

/// Why a connection stopped being consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// A reconnect was requested.
    Reconnecting,
    /// Realtime updates were switched off in favour of polling.
    FellBack,
    /// The session was cancelled from outside.
    Cancelled,
}

/// Applies the realtime channel's events to the store.
///
/// One session outlives individual connections: the retry budget carries
/// over from one connection to the next until a connection succeeds.
pub struct SseSession {
    store: MessageStore,
    reconnect: Arc<dyn Reconnect>,
    retry: RetryPolicy,
    heartbeat: HeartbeatTimer,
    default_heartbeat: Duration,
}

impl SseSession {
    /// Creates a session using the timings in `config`.
    pub fn new(store: MessageStore, reconnect: Arc<dyn Reconnect>, config: &HeraldConfig) -> Self {
        let retry = RetryConfig::new(config.sse.max_retry_count, config.sse.retry_delay());
        Self {
            store,
            reconnect,
            retry: RetryPolicy::new(retry),
            heartbeat: HeartbeatTimer::new(Duration::from_millis(config.sse.heartbeat_buffer_ms)),
            default_heartbeat: Duration::from_millis(config.sse.default_heartbeat_timeout_ms),
        }
    }

    /// Retry attempts used since the last successful connection.
    #[must_use]
    pub const fn retry_attempts(&self) -> u32 {
        self.retry.attempts()
    }

    /// Consumes one connection's events until it ends.
    #[instrument(skip_all)]
    pub async fn consume<S>(
        &mut self,
        events: S,
        cancellation_token: &CancellationToken,
    ) -> SessionEnd
    where
        S: Stream<Item = Result<SseEvent, SseError>> + Unpin,
    {
        let mut events = events;
        self.heartbeat.disarm();
        loop {
            let failure = tokio::select! {
                () = cancellation_token.cancelled() => {
                    self.heartbeat.disarm();
                    return SessionEnd::Cancelled;
                }
                () = self.heartbeat.expired() => {
                    info!("heartbeat missed, reconnecting");
                    self.reconnect.reconnect();
                    return SessionEnd::Reconnecting;
                }
                event = events.next() => match event {
                    Some(Ok(event)) => match self.on_event(event) {
                        Some(end) => return end,
                        None => continue,
                    },
                    Some(Err(failure)) => failure,
                    None => SseError::UnknownError("stream closed".to_string()),
                },
            };

            self.heartbeat.disarm();
            return self.on_failure(&failure, cancellation_token).await;
        }
    }

    fn on_event(&mut self, event: SseEvent) -> Option<SessionEnd> {
        match event {
            SseEvent::Connected => {
                debug!("realtime channel connected");
                self.retry.reset();
                self.heartbeat.arm(self.default_heartbeat);
            }
            SseEvent::Heartbeat { timeout_ms } => {
                trace!(timeout_ms, "heartbeat");
                self.heartbeat.arm(Duration::from_millis(timeout_ms));
            }
            SseEvent::Messages(messages) if messages.is_empty() => {
                trace!("empty messages event");
            }
            SseEvent::Messages(messages) => {
                debug!(count = messages.len(), "messages received over realtime channel");
                self.store.dispatch(Action::ProcessMessageQueue { messages });
            }
            SseEvent::TtlExceeded => {
                info!("realtime subscription expired, reconnecting");
                self.heartbeat.disarm();
                self.reconnect.reconnect();
                return Some(SessionEnd::Reconnecting);
            }
            SseEvent::Unknown(name) => debug!(event = %name, "ignoring unknown event"),
        }
        None
    }

    async fn on_failure(
        &mut self,
        failure: &SseError,
        cancellation_token: &CancellationToken,
    ) -> SessionEnd {
        debug!("realtime channel failed: {failure}");
        match self.retry.on_failure(failure) {
            RetryDecision::RetryNow { delay, .. } => {
                if !delay.is_zero() {
                    tokio::select! {
                        () = cancellation_token.cancelled() => return SessionEnd::Cancelled,
                        () = tokio::time::sleep(delay) => {}
                    }
                }
                self.reconnect.reconnect();
                SessionEnd::Reconnecting
            }
            decision @ (RetryDecision::MaxRetriesReached | RetryDecision::RetryNotPossible) => {
                info!("{decision}, switching to polling");
                self.store.dispatch(Action::SetSseEnabled { enabled: false });
                SessionEnd::FellBack
            }
        }
    }
}
