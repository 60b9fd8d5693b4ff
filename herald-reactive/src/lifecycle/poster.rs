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

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{instrument, trace, warn};

use crate::traits::{MainThreadPoster, PostedTask};

/// Runs posted tasks one at a time on a dedicated Tokio task.
#[derive(Debug, Clone)]
pub struct TaskPoster {
    outbox: mpsc::UnboundedSender<PostedTask>,
}

impl TaskPoster {
    /// Starts the worker on the current runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn spawn() -> (Self, JoinHandle<()>) {
        let (outbox, inbox) = mpsc::unbounded_channel();
        let worker = tokio::spawn(Self::run(inbox));
        (Self { outbox }, worker)
    }

    #[instrument(skip_all)]
    async fn run(mut inbox: mpsc::UnboundedReceiver<PostedTask>) {
        while let Some(task) = inbox.recv().await {
            task();
        }
        trace!("poster stopped");
    }

    /// Resolves once every task posted before this call has run.
    pub async fn flush(&self) {
        let (done, finished) = oneshot::channel();
        self.post(Box::new(move || {
            let _ = done.send(());
        }));
        let _ = finished.await;
    }
}

impl MainThreadPoster for TaskPoster {
    fn post(&self, task: PostedTask) {
        if self.outbox.send(task).is_err() {
            warn!("poster stopped, dropping task");
        }
    }
}

/// Runs every task immediately on the posting thread.
///
/// Suitable when the caller already is the single logical thread, such as in
/// tests or hosts without a UI thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlinePoster;

impl MainThreadPoster for InlinePoster {
    fn post(&self, task: PostedTask) {
        task();
    }
}
