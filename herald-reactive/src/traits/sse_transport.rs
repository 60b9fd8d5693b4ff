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

/// Opens and closes the realtime channel.
///
/// The lifecycle manager guarantees calls alternate: `start_connection` is
/// never called twice without a `stop_connection` in between, and the reverse.
pub trait SseTransport: Send + Sync + 'static {
    /// Opens the channel.
    fn start_connection(&self);

    /// Closes the channel.
    fn stop_connection(&self);
}

/// Forces the realtime channel to reconnect from scratch.
pub trait Reconnect: Send + Sync + 'static {
    /// Closes the current channel and opens a new one if it should be open.
    fn reconnect(&self);
}
