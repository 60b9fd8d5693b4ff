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

//! The realtime channel: request description, event codec, failure
//! classification and the session policy that drives reconnects.
//!
//! Opening the HTTP stream is the host's job (see
//! [`SseTransport`](crate::traits::SseTransport)); the host feeds the
//! stream's lines through [`decode_lines`] into an [`SseSession`].

pub use error::SseError;
pub use event::{
    decode_lines, names, parse_heartbeat_timeout, parse_messages, ServerEvent, SseEvent,
    SseLineDecoder,
};
pub use heartbeat::HeartbeatTimer;
pub use request::{SseRequest, SseRequestError};
pub use retry::{RetryConfig, RetryDecision, RetryPolicy};
pub use session::{SessionEnd, SseSession};

mod error;
mod event;
mod heartbeat;
mod request;
mod retry;
mod session;
