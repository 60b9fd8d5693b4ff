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

/// Work queued onto a poster.
pub type PostedTask = Box<dyn FnOnce() + Send + 'static>;

/// Runs tasks one at a time, in posting order, on a single logical thread.
///
/// Components that touch host UI or keep unsynchronised bookkeeping hand
/// their work to a poster instead of running it on the caller's thread.
pub trait MainThreadPoster: Send + Sync + 'static {
    /// Queues `task` behind every previously posted task.
    fn post(&self, task: PostedTask);
}
