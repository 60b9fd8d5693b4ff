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

use herald_core::prelude::InAppMessagingState;
use tokio::sync::mpsc;
use tracing::trace;

use super::StoreCommand;

pub(crate) type Listener = Box<dyn FnMut(&InAppMessagingState) + Send>;

/// Identifies one registration with the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub(crate) u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "subscription-{}", self.0)
    }
}

pub(crate) struct Subscriber {
    pub(crate) id: SubscriptionId,
    listener: Listener,
}

impl Subscriber {
    pub(crate) fn new(id: SubscriptionId, listener: Listener) -> Self {
        Self { id, listener }
    }

    pub(crate) fn notify(&mut self, state: &InAppMessagingState) {
        (self.listener)(state);
    }
}

/// Wraps `listener` so it only sees values that differ from the last one it
/// received.
pub(crate) fn distinct_until_changed<T, S, E, L>(
    selector: S,
    equality: E,
    mut listener: L,
) -> Listener
where
    T: Clone + Send + 'static,
    S: Fn(&InAppMessagingState) -> T + Send + 'static,
    E: Fn(&T, &T) -> bool + Send + 'static,
    L: FnMut(T) + Send + 'static,
{
    let mut last: Option<T> = None;
    Box::new(move |state| {
        let value = selector(state);
        if last.as_ref().is_some_and(|previous| equality(previous, &value)) {
            return;
        }
        last = Some(value.clone());
        listener(value);
    })
}

/// Handle returned by the store's subscribe calls.
///
/// Dropping the handle keeps the listener registered; call
/// [`Subscription::unsubscribe`] to remove it.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    outbox: mpsc::UnboundedSender<StoreCommand>,
}

impl Subscription {
    pub(crate) fn new(id: SubscriptionId, outbox: mpsc::UnboundedSender<StoreCommand>) -> Self {
        Self { id, outbox }
    }

    /// The registration id.
    #[must_use]
    pub const fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Stops further notifications. Takes effect after every command queued
    /// before it has been processed.
    pub fn unsubscribe(self) {
        if self.outbox.send(StoreCommand::Unsubscribe(self.id)).is_err() {
            trace!(id = %self.id, "store already stopped");
        }
    }
}
