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

use std::sync::atomic::Ordering;
use std::sync::Arc;

use herald_core::prelude::{reduce, Action, InAppMessagingState};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{error, instrument, trace, warn};

use super::subscription::Subscriber;
use super::{StoreCommand, StoreStats};
use crate::middleware::Middleware;

/// Nested dispatches deeper than this are dropped.
pub(crate) const MAX_DISPATCH_DEPTH: usize = 64;

/// State owned by the store task.
pub(crate) struct StoreRunner {
    state: Arc<InAppMessagingState>,
    middlewares: Vec<Arc<dyn Middleware>>,
    subscribers: Vec<Subscriber>,
    publisher: watch::Sender<Arc<InAppMessagingState>>,
    stats: Arc<StoreStats>,
    depth: usize,
}

impl StoreRunner {
    pub(crate) fn new(
        state: Arc<InAppMessagingState>,
        middlewares: Vec<Arc<dyn Middleware>>,
        publisher: watch::Sender<Arc<InAppMessagingState>>,
        stats: Arc<StoreStats>,
    ) -> Self {
        Self {
            state,
            middlewares,
            subscribers: Vec::new(),
            publisher,
            stats,
            depth: 0,
        }
    }

    #[instrument(skip_all)]
    pub(crate) async fn wake(
        mut self,
        mut inbox: mpsc::UnboundedReceiver<StoreCommand>,
        cancellation_token: CancellationToken,
    ) {
        loop {
            tokio::select! {
                () = cancellation_token.cancelled() => {
                    trace!("store cancelled");
                    break;
                }
                command = inbox.recv() => {
                    let Some(command) = command else {
                        trace!("every store handle dropped");
                        break;
                    };
                    self.handle_command(command);
                }
            }
        }
        inbox.close();
        trace!(
            processed = self.stats.actions_processed.load(Ordering::Relaxed),
            "store stopped"
        );
    }

    fn handle_command(&mut self, command: StoreCommand) {
        match command {
            StoreCommand::Dispatch(action) => self.process(action),
            StoreCommand::Subscribe { mut subscriber, prime } => {
                trace!(id = %subscriber.id, prime, "adding subscriber");
                if prime {
                    subscriber.notify(&self.state);
                }
                self.subscribers.push(subscriber);
            }
            StoreCommand::Unsubscribe(id) => {
                trace!(%id, "removing subscriber");
                self.subscribers.retain(|subscriber| subscriber.id != id);
            }
            StoreCommand::Barrier(done) => {
                let _ = done.send(());
            }
        }
    }

    /// Runs `action` through the whole pipeline.
    pub(crate) fn process(&mut self, action: Action) {
        if self.depth >= MAX_DISPATCH_DEPTH {
            error!(action = action.name(), "dispatch depth exceeded, dropping action");
            return;
        }
        self.depth += 1;
        self.run_stage(0, action);
        self.depth -= 1;
    }

    /// Runs `action` from the middleware at `index`, ending in the reducer.
    pub(crate) fn run_stage(&mut self, index: usize, action: Action) {
        let Some(middleware) = self.middlewares.get(index).cloned() else {
            self.commit(&action);
            return;
        };

        let action_name = action.name();
        let reporting_error = matches!(action, Action::ReportError { .. });
        let result = middleware.handle(
            &mut StoreContext { runner: &mut *self },
            action,
            Next { index: index + 1 },
        );

        if let Err(failure) = result {
            self.stats.errors_reported.fetch_add(1, Ordering::Relaxed);
            if reporting_error {
                error!(
                    middleware = middleware.name(),
                    "failed while reporting an error: {failure:#}"
                );
            } else {
                warn!(middleware = middleware.name(), action = action_name, "{failure:#}");
                self.process(Action::report_error(format!("{}: {failure:#}", middleware.name())));
            }
        }
    }

    fn commit(&mut self, action: &Action) {
        let next = Arc::new(reduce(&self.state, action));
        for change in self.state.diff(&next) {
            trace!(action = action.name(), %change, "state changed");
        }

        self.state = Arc::clone(&next);
        self.publisher.send_replace(Arc::clone(&next));
        self.stats.actions_processed.fetch_add(1, Ordering::Relaxed);

        for subscriber in &mut self.subscribers {
            subscriber.notify(&next);
        }
    }
}

/// The store as seen from inside a middleware.
pub struct StoreContext<'a> {
    runner: &'a mut StoreRunner,
}

impl StoreContext<'_> {
    /// The latest committed state.
    #[must_use]
    pub fn state(&self) -> Arc<InAppMessagingState> {
        Arc::clone(&self.runner.state)
    }

    /// Runs `action` through the whole pipeline before returning.
    ///
    /// The follow-up action completes, including its own follow-ups, before
    /// the calling middleware continues.
    pub fn dispatch(&mut self, action: Action) {
        self.runner.process(action);
    }
}

/// The remainder of the pipeline after the current middleware.
#[derive(Debug)]
pub struct Next {
    index: usize,
}

impl Next {
    /// Passes `action` to the next middleware, or to the reducer after the
    /// last one.
    pub fn run(self, store: &mut StoreContext<'_>, action: Action) {
        store.runner.run_stage(self.index, action);
    }
}
