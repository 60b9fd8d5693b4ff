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

//! The single-writer message store.
//!
//! One Tokio task owns the session state. Everything else talks to it through
//! a cheap, cloneable [`MessageStore`] handle:
//!
//! - `dispatch` queues an action; actions are processed strictly one at a time
//!   in the order they were queued, whichever thread queued them.
//! - `current_state` reads the latest committed snapshot without waiting for
//!   the task.
//! - `subscribe` and `subscribe_to_attribute` register listeners that run on
//!   the store task after each reducer run.

use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use herald_core::prelude::{Action, InAppMessagingState};
use static_assertions::assert_impl_all;
use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;
use tracing::{trace, warn};

pub use runner::{Next, StoreContext};
pub use subscription::{Subscription, SubscriptionId};

use crate::middleware::Middleware;
use runner::StoreRunner;
use subscription::{distinct_until_changed, Subscriber};

mod runner;
mod subscription;

pub(crate) enum StoreCommand {
    Dispatch(Action),
    Subscribe { subscriber: Subscriber, prime: bool },
    Unsubscribe(SubscriptionId),
    Barrier(oneshot::Sender<()>),
}

impl fmt::Debug for StoreCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dispatch(action) => f.debug_tuple("Dispatch").field(&action.name()).finish(),
            Self::Subscribe { subscriber, prime } => f
                .debug_struct("Subscribe")
                .field("id", &subscriber.id)
                .field("prime", prime)
                .finish(),
            Self::Unsubscribe(id) => f.debug_tuple("Unsubscribe").field(id).finish(),
            Self::Barrier(_) => f.write_str("Barrier"),
        }
    }
}

/// Counters describing the store's activity.
#[derive(Debug, Default)]
pub struct StoreStats {
    /// Actions that reached the reducer.
    pub actions_processed: AtomicUsize,
    /// Middleware failures turned into error reports.
    pub errors_reported: AtomicUsize,
}

/// Handle to the running message store.
///
/// Clones share the same store. The store stops when [`MessageStore::shutdown`]
/// is called or when every handle is dropped.
#[derive(Clone)]
pub struct MessageStore {
    outbox: mpsc::UnboundedSender<StoreCommand>,
    state: watch::Receiver<Arc<InAppMessagingState>>,
    next_subscription: Arc<AtomicU64>,
    stats: Arc<StoreStats>,
    cancellation_token: CancellationToken,
}

assert_impl_all!(MessageStore: Send, Sync, Clone);

impl fmt::Debug for MessageStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageStore")
            .field("stats", &self.stats)
            .field("cancelled", &self.cancellation_token.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl MessageStore {
    /// Starts a store with the default state on the current Tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn launch(middlewares: Vec<Arc<dyn Middleware>>) -> Self {
        Self::launch_with_state(InAppMessagingState::default(), middlewares)
    }

    /// Starts a store from `initial` on the current Tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn launch_with_state(
        initial: InAppMessagingState,
        middlewares: Vec<Arc<dyn Middleware>>,
    ) -> Self {
        let initial = Arc::new(initial);
        let (publisher, state) = watch::channel(Arc::clone(&initial));
        let (outbox, inbox) = mpsc::unbounded_channel();
        let stats = Arc::new(StoreStats::default());
        let cancellation_token = CancellationToken::new();

        trace!(middlewares = middlewares.len(), "launching message store");
        let runner = StoreRunner::new(initial, middlewares, publisher, Arc::clone(&stats));
        tokio::spawn(runner.wake(inbox, cancellation_token.clone()));

        Self {
            outbox,
            state,
            next_subscription: Arc::new(AtomicU64::new(1)),
            stats,
            cancellation_token,
        }
    }

    /// Queues `action`. Never blocks and never fails; actions sent after
    /// shutdown are dropped.
    pub fn dispatch(&self, action: Action) {
        let name = action.name();
        if self.outbox.send(StoreCommand::Dispatch(action)).is_err() {
            warn!(action = name, "store stopped, dropping action");
        }
    }

    /// The latest committed snapshot.
    #[must_use]
    pub fn current_state(&self) -> Arc<InAppMessagingState> {
        Arc::clone(&self.state.borrow())
    }

    /// Calls `listener` with the new state after every reducer run, in
    /// registration order.
    pub fn subscribe<L>(&self, listener: L) -> Subscription
    where
        L: FnMut(&InAppMessagingState) + Send + 'static,
    {
        self.register(Box::new(listener), false)
    }

    /// Calls `listener` whenever `selector` yields a value different from the
    /// previous one, starting with the current value.
    pub fn subscribe_to_attribute<T, S, L>(&self, selector: S, listener: L) -> Subscription
    where
        T: Clone + PartialEq + Send + 'static,
        S: Fn(&InAppMessagingState) -> T + Send + 'static,
        L: FnMut(T) + Send + 'static,
    {
        self.subscribe_to_attribute_with(selector, <T as PartialEq>::eq, listener)
    }

    /// Like [`MessageStore::subscribe_to_attribute`] with a custom equality.
    pub fn subscribe_to_attribute_with<T, S, E, L>(
        &self,
        selector: S,
        equality: E,
        listener: L,
    ) -> Subscription
    where
        T: Clone + Send + 'static,
        S: Fn(&InAppMessagingState) -> T + Send + 'static,
        E: Fn(&T, &T) -> bool + Send + 'static,
        L: FnMut(T) + Send + 'static,
    {
        self.register(distinct_until_changed(selector, equality, listener), true)
    }

    /// Resolves once every command queued before this call has been handled.
    pub async fn settle(&self) {
        let (done, finished) = oneshot::channel();
        if self.outbox.send(StoreCommand::Barrier(done)).is_ok() {
            let _ = finished.await;
        }
    }

    /// Stops the store task. Queued commands are discarded.
    pub fn shutdown(&self) {
        self.cancellation_token.cancel();
    }

    /// Activity counters.
    #[must_use]
    pub fn stats(&self) -> &StoreStats {
        &self.stats
    }

    /// Number of actions that reached the reducer so far.
    #[must_use]
    pub fn actions_processed(&self) -> usize {
        self.stats.actions_processed.load(Ordering::Relaxed)
    }

    fn register(&self, listener: subscription::Listener, prime: bool) -> Subscription {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        let subscriber = Subscriber::new(id, listener);
        if self
            .outbox
            .send(StoreCommand::Subscribe { subscriber, prime })
            .is_err()
        {
            warn!(%id, "store stopped, subscription ignored");
        }
        Subscription::new(id, self.outbox.clone())
    }
}
