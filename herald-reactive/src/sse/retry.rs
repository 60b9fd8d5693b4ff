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

//! Reconnection budget for the realtime channel.
//!
//! The first reconnection after a failure is immediate, later ones wait a
//! fixed delay, and once the budget is spent the session falls back to
//! polling. A successful connection restores the full budget.

use std::fmt;
use std::time::Duration;

use herald_core::prelude::CONFIG;
use tracing::{error, info, trace};

use super::SseError;

/// Configuration for reconnection attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Attempts allowed between two successful connections.
    pub max_attempts: u32,
    /// Wait before every attempt after the first.
    pub delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: CONFIG.sse.max_retry_count,
            delay: CONFIG.sse.retry_delay(),
        }
    }
}

impl RetryConfig {
    /// Creates a configuration with the given budget.
    #[must_use]
    pub const fn new(max_attempts: u32, delay: Duration) -> Self {
        Self { max_attempts, delay }
    }
}

/// What to do after a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Reconnect after `delay`; `attempt` counts from one.
    RetryNow {
        /// Attempt number.
        attempt: u32,
        /// Wait before reconnecting.
        delay: Duration,
    },
    /// The budget is spent.
    MaxRetriesReached,
    /// The failure cannot be fixed by reconnecting.
    RetryNotPossible,
}

impl RetryDecision {
    /// Whether the decision gives up on the realtime channel.
    #[must_use]
    pub const fn is_fallback(&self) -> bool {
        matches!(self, Self::MaxRetriesReached | Self::RetryNotPossible)
    }
}

impl fmt::Display for RetryDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RetryNow { attempt, delay } => write!(f, "retry #{attempt} in {delay:?}"),
            Self::MaxRetriesReached => write!(f, "max retries reached"),
            Self::RetryNotPossible => write!(f, "retry not possible"),
        }
    }
}

/// Counts reconnection attempts.
#[derive(Debug, Clone, Default)]
pub struct RetryPolicy {
    config: RetryConfig,
    attempts: u32,
}

impl RetryPolicy {
    /// Creates a policy with a full budget.
    #[must_use]
    pub const fn new(config: RetryConfig) -> Self {
        Self { config, attempts: 0 }
    }

    /// Decides how to react to `failure`, consuming one attempt when
    /// reconnecting.
    pub fn on_failure(&mut self, failure: &SseError) -> RetryDecision {
        if !failure.should_retry() {
            info!("non-retryable realtime failure ({failure}), falling back to polling");
            return RetryDecision::RetryNotPossible;
        }
        if self.attempts >= self.config.max_attempts {
            error!(
                "Max retries exceeded ({}/{}), falling back to polling",
                self.attempts, self.config.max_attempts
            );
            return RetryDecision::MaxRetriesReached;
        }
        self.attempts += 1;
        let delay = if self.attempts == 1 {
            Duration::ZERO
        } else {
            self.config.delay
        };
        trace!(attempt = self.attempts, ?delay, "scheduling reconnect");
        RetryDecision::RetryNow {
            attempt: self.attempts,
            delay,
        }
    }

    /// Restores the full budget.
    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    /// Attempts used since the last reset.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn network() -> SseError {
        SseError::UnknownError("closed".into())
    }

    #[test]
    fn first_retry_is_immediate_then_delayed() {
        let mut policy = RetryPolicy::new(RetryConfig::new(3, Duration::from_secs(5)));
        assert_eq!(
            policy.on_failure(&network()),
            RetryDecision::RetryNow {
                attempt: 1,
                delay: Duration::ZERO
            }
        );
        for attempt in 2..=3 {
            assert_eq!(
                policy.on_failure(&network()),
                RetryDecision::RetryNow {
                    attempt,
                    delay: Duration::from_secs(5)
                }
            );
        }
        assert_eq!(policy.on_failure(&network()), RetryDecision::MaxRetriesReached);
        assert_eq!(policy.attempts(), 3);

        policy.reset();
        assert!(matches!(
            policy.on_failure(&network()),
            RetryDecision::RetryNow { attempt: 1, .. }
        ));
    }

    #[test]
    fn permanent_failures_do_not_consume_attempts() {
        let mut policy = RetryPolicy::default();
        let forbidden = SseError::classify(None, Some(403), "");
        assert_eq!(policy.on_failure(&forbidden), RetryDecision::RetryNotPossible);
        assert!(policy.on_failure(&forbidden).is_fallback());
        assert_eq!(policy.attempts(), 0);
    }
}
