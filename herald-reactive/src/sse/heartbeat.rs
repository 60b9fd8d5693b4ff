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

use std::future;
use std::pin::Pin;
use std::time::Duration;

use tokio::time::{Instant, Sleep};
use tracing::trace;

/// Deadline for the next heartbeat.
///
/// Every arm replaces the previous deadline. While disarmed the timer never
/// fires.
#[derive(Debug)]
pub struct HeartbeatTimer {
    sleep: Pin<Box<Sleep>>,
    buffer: Duration,
    armed: bool,
}

impl HeartbeatTimer {
    /// Creates a disarmed timer that adds `buffer` to every timeout.
    ///
    /// # Panics
    ///
    /// Panics outside a Tokio runtime with timers enabled.
    #[must_use]
    pub fn new(buffer: Duration) -> Self {
        Self {
            sleep: Box::pin(tokio::time::sleep(Duration::ZERO)),
            buffer,
            armed: false,
        }
    }

    /// Expects the next heartbeat within `timeout` plus the buffer.
    pub fn arm(&mut self, timeout: Duration) {
        let window = timeout.saturating_add(self.buffer);
        trace!(?window, "heartbeat timer armed");
        self.sleep.as_mut().reset(Instant::now() + window);
        self.armed = true;
    }

    /// Stops waiting for heartbeats.
    pub fn disarm(&mut self) {
        self.armed = false;
    }

    /// Whether a deadline is pending.
    #[must_use]
    pub const fn is_armed(&self) -> bool {
        self.armed
    }

    /// Resolves when the deadline passes. Pending forever while disarmed.
    pub async fn expired(&mut self) {
        if !self.armed {
            future::pending::<()>().await;
        }
        self.sleep.as_mut().await;
        self.armed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn fires_after_timeout_plus_buffer() {
        let mut timer = HeartbeatTimer::new(Duration::from_secs(5));
        timer.arm(Duration::from_secs(10));
        let started = Instant::now();
        timer.expired().await;
        assert_eq!(started.elapsed(), Duration::from_secs(15));
        assert!(!timer.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn rearming_pushes_the_deadline() {
        let mut timer = HeartbeatTimer::new(Duration::from_secs(5));
        timer.arm(Duration::from_secs(10));
        tokio::time::advance(Duration::from_secs(12)).await;
        timer.arm(Duration::from_secs(10));
        let rearmed = Instant::now();
        timer.expired().await;
        assert_eq!(rearmed.elapsed(), Duration::from_secs(15));
    }

    #[tokio::test(start_paused = true)]
    async fn disarmed_timer_never_fires() {
        let mut timer = HeartbeatTimer::new(Duration::from_secs(5));
        timer.arm(Duration::from_secs(1));
        timer.disarm();
        let fired = tokio::time::timeout(Duration::from_secs(60), timer.expired()).await;
        assert!(fired.is_err());
    }
}
