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

use futures::{future, Stream, StreamExt};
use herald_core::prelude::{Message, CONFIG};
use serde::Deserialize;
use tracing::debug;

use super::SseError;

/// Event names the server sends.
pub mod names {
    /// The subscription is live.
    pub const CONNECTED: &str = "connected";
    /// Keep-alive carrying the next heartbeat deadline.
    pub const HEARTBEAT: &str = "heartbeat";
    /// The user's current queue.
    pub const MESSAGES: &str = "messages";
    /// The server closed the subscription because it lived too long.
    pub const TTL_EXCEEDED: &str = "ttl_exceeded";
}

/// One event as framed on the wire, before interpretation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerEvent {
    /// Value of the `event:` field; `message` when absent.
    pub event_type: String,
    /// The `data:` lines joined with newlines.
    pub data: String,
}

impl ServerEvent {
    /// Creates an event.
    pub fn new(event_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            data: data.into(),
        }
    }
}

/// Assembles `text/event-stream` lines into events.
#[derive(Debug, Default)]
pub struct SseLineDecoder {
    event_type: Option<String>,
    data: Vec<String>,
}

impl SseLineDecoder {
    /// Creates an empty decoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one line without its terminator. A blank line completes the
    /// pending event.
    pub fn push_line(&mut self, line: &str) -> Option<ServerEvent> {
        if line.is_empty() {
            return self.flush();
        }
        if line.starts_with(':') {
            return None;
        }
        let (field, value) = line.split_once(':').unwrap_or((line, ""));
        let value = value.strip_prefix(' ').unwrap_or(value);
        match field {
            "event" => self.event_type = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            _ => {}
        }
        None
    }

    fn flush(&mut self) -> Option<ServerEvent> {
        if self.event_type.is_none() && self.data.is_empty() {
            return None;
        }
        let event_type = self.event_type.take().unwrap_or_else(|| "message".to_string());
        let data = std::mem::take(&mut self.data).join("\n");
        Some(ServerEvent { event_type, data })
    }
}

/// Turns a stream of `text/event-stream` lines into interpreted events.
///
/// Read failures pass through as [`SseError::NetworkError`].
pub fn decode_lines<S>(lines: S) -> impl Stream<Item = Result<SseEvent, SseError>>
where
    S: Stream<Item = std::io::Result<String>>,
{
    let mut decoder = SseLineDecoder::new();
    lines.filter_map(move |line| {
        let decoded = match line {
            Ok(line) => decoder
                .push_line(line.trim_end_matches('\r'))
                .map(|event| Ok(SseEvent::from_server_event(&event))),
            Err(e) => Some(Err(SseError::from(e))),
        };
        future::ready(decoded)
    })
}

/// A server event after interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    /// The subscription is live.
    Connected,
    /// The server promises another heartbeat within `timeout_ms`.
    Heartbeat {
        /// Milliseconds until the next heartbeat is due.
        timeout_ms: u64,
    },
    /// The user's current queue.
    Messages(Vec<Message>),
    /// The server ended the subscription.
    TtlExceeded,
    /// An event this client does not know.
    Unknown(String),
}

#[derive(Deserialize)]
struct HeartbeatPayload {
    heartbeat: Option<u64>,
}

impl SseEvent {
    /// Interprets a framed event. Never fails: bad payloads decode to safe
    /// defaults.
    #[must_use]
    pub fn from_server_event(event: &ServerEvent) -> Self {
        match event.event_type.as_str() {
            names::CONNECTED => Self::Connected,
            names::HEARTBEAT => Self::Heartbeat {
                timeout_ms: parse_heartbeat_timeout(&event.data),
            },
            names::MESSAGES => Self::Messages(parse_messages(&event.data)),
            names::TTL_EXCEEDED => Self::TtlExceeded,
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// Decodes a `messages` payload; blank or malformed data yields no messages.
#[must_use]
pub fn parse_messages(data: &str) -> Vec<Message> {
    if data.trim().is_empty() {
        debug!("received blank message data");
        return Vec::new();
    }
    serde_json::from_str(data).unwrap_or_else(|e| {
        debug!("failed to parse messages: {e}");
        Vec::new()
    })
}

/// Decodes a heartbeat payload (`{"heartbeat": seconds}`) into milliseconds,
/// falling back to the configured default.
#[must_use]
pub fn parse_heartbeat_timeout(data: &str) -> u64 {
    let fallback = CONFIG.sse.default_heartbeat_timeout_ms;
    if data.trim().is_empty() {
        return fallback;
    }
    match serde_json::from_str::<HeartbeatPayload>(data) {
        Ok(HeartbeatPayload {
            heartbeat: Some(seconds),
        }) => seconds.saturating_mul(1000),
        Ok(_) => fallback,
        Err(e) => {
            debug!("failed to parse heartbeat: {e}");
            fallback
        }
    }
}
