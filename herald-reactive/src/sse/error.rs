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

use std::fmt;

/// A realtime channel failure, classified for the retry policy.
#[derive(Debug)]
pub enum SseError {
    /// The connection could not be made or broke mid-stream.
    NetworkError(std::io::Error),
    /// The server answered with a status other than `200`.
    ServerError {
        /// HTTP status.
        status: u16,
        /// Whether reconnecting can help.
        should_retry: bool,
    },
    /// The transport failed without saying why.
    UnknownError(String),
}

impl SseError {
    /// Classifies a transport failure from what the transport knows about it.
    ///
    /// An I/O error always means the network. A status of `408`, `429` or
    /// `5xx` is transient; any other `4xx` is not; other statuses are
    /// retried. Without either the failure is unknown and retried.
    #[must_use]
    pub fn classify(io: Option<std::io::Error>, status: Option<u16>, detail: &str) -> Self {
        if let Some(io) = io {
            return Self::NetworkError(io);
        }
        match status {
            Some(status) => Self::ServerError {
                status,
                should_retry: Self::is_retryable_status(status),
            },
            None => Self::UnknownError(detail.to_string()),
        }
    }

    /// Whether a response with `status` is worth reconnecting for.
    #[must_use]
    pub const fn is_retryable_status(status: u16) -> bool {
        match status {
            408 | 429 | 500..=599 => true,
            400..=499 => false,
            _ => true,
        }
    }

    /// Whether reconnecting can help.
    #[must_use]
    pub const fn should_retry(&self) -> bool {
        match self {
            Self::NetworkError(_) | Self::UnknownError(_) => true,
            Self::ServerError { should_retry, .. } => *should_retry,
        }
    }
}

impl fmt::Display for SseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NetworkError(e) => write!(f, "network error: {e}"),
            Self::ServerError { status, .. } => write!(f, "server responded with {status}"),
            Self::UnknownError(detail) => write!(f, "unknown error: {detail}"),
        }
    }
}

impl std::error::Error for SseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::NetworkError(e) => Some(e),
            Self::ServerError { .. } | Self::UnknownError(_) => None,
        }
    }
}

impl From<std::io::Error> for SseError {
    fn from(e: std::io::Error) -> Self {
        Self::NetworkError(e)
    }
}
