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
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::store::{MessageStore, Subscription};
use crate::traits::{MainThreadPoster, Reconnect, SseTransport};

/// Keeps the realtime channel open exactly while the app is in the
/// foreground, realtime updates are enabled and a named user is identified.
///
/// Every decision runs on the poster, which is the only writer of the
/// connection flags, so start and stop calls reach the transport strictly
/// alternating.
#[derive(Clone)]
pub struct ConnectionLifecycleManager {
    inner: Arc<LifecycleInner>,
}

struct LifecycleInner {
    store: MessageStore,
    transport: Arc<dyn SseTransport>,
    poster: Arc<dyn MainThreadPoster>,
    is_foregrounded: AtomicBool,
    is_connected: AtomicBool,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl fmt::Debug for ConnectionLifecycleManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionLifecycleManager")
            .field("is_foregrounded", &self.is_foregrounded())
            .field("is_connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

impl ConnectionLifecycleManager {
    /// Creates a manager and starts watching the store.
    ///
    /// The app is assumed to be in the background until
    /// [`on_foreground`](Self::on_foreground) is called.
    pub fn new(
        store: MessageStore,
        transport: Arc<dyn SseTransport>,
        poster: Arc<dyn MainThreadPoster>,
    ) -> Self {
        let manager = Self {
            inner: Arc::new(LifecycleInner {
                store,
                transport,
                poster,
                is_foregrounded: AtomicBool::new(false),
                is_connected: AtomicBool::new(false),
                subscriptions: Mutex::new(Vec::new()),
            }),
        };
        manager.watch_store();
        manager
    }

    fn watch_store(&self) {
        let store = &self.inner.store;

        let sse_flag = {
            let manager = self.clone();
            store.subscribe_to_attribute(
                |state| state.sse_enabled,
                move |enabled| manager.post(move |inner| inner.on_sse_flag_changed(enabled)),
            )
        };
        let identification = {
            let manager = self.clone();
            store.subscribe_to_attribute(
                |state| state.is_user_identified(),
                move |identified| {
                    manager.post(move |inner| inner.on_identification_changed(identified));
                },
            )
        };

        self.inner.subscriptions.lock().extend([sse_flag, identification]);
    }

    fn post<F>(&self, work: F)
    where
        F: FnOnce(&LifecycleInner) + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        self.inner.poster.post(Box::new(move || work(&inner)));
    }

    /// The host app came to the foreground.
    pub fn on_foreground(&self) {
        self.post(LifecycleInner::on_foreground);
    }

    /// The host app went to the background.
    pub fn on_background(&self) {
        self.post(LifecycleInner::on_background);
    }

    /// Closes the channel and reopens it if it should be open.
    pub fn reset(&self) {
        self.post(LifecycleInner::reset);
    }

    /// Stops watching the store. The channel is left as it is.
    pub fn detach(&self) {
        for subscription in self.inner.subscriptions.lock().drain(..) {
            subscription.unsubscribe();
        }
    }

    /// Whether the app is in the foreground, as last seen by the poster.
    #[must_use]
    pub fn is_foregrounded(&self) -> bool {
        self.inner.is_foregrounded.load(Ordering::Acquire)
    }

    /// Whether the channel is open, as last seen by the poster.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.inner.is_connected.load(Ordering::Acquire)
    }
}

impl Reconnect for ConnectionLifecycleManager {
    fn reconnect(&self) {
        self.reset();
    }
}

impl LifecycleInner {
    fn should_use_sse(&self) -> bool {
        self.store.current_state().should_use_sse()
    }

    fn start(&self) {
        if self.is_connected.swap(true, Ordering::AcqRel) {
            trace!("already connected");
            return;
        }
        debug!("starting realtime connection");
        self.transport.start_connection();
    }

    fn stop(&self) {
        if !self.is_connected.swap(false, Ordering::AcqRel) {
            trace!("already stopped");
            return;
        }
        debug!("stopping realtime connection");
        self.transport.stop_connection();
    }

    fn on_foreground(&self) {
        if self.is_foregrounded.swap(true, Ordering::AcqRel) {
            return;
        }
        if self.should_use_sse() {
            debug!("app foregrounded");
            self.start();
        } else {
            debug!("app foregrounded, realtime updates not in use");
        }
    }

    fn on_background(&self) {
        if !self.is_foregrounded.swap(false, Ordering::AcqRel) {
            return;
        }
        debug!("app backgrounded");
        self.stop();
    }

    fn on_sse_flag_changed(&self, enabled: bool) {
        if !self.is_foregrounded.load(Ordering::Acquire) {
            trace!(enabled, "realtime flag changed while backgrounded");
            return;
        }
        if self.should_use_sse() {
            self.start();
        } else if !enabled {
            self.stop();
        } else {
            debug!("realtime updates enabled but the user is anonymous");
        }
    }

    fn on_identification_changed(&self, identified: bool) {
        if !self.is_foregrounded.load(Ordering::Acquire) {
            return;
        }
        if self.should_use_sse() {
            self.start();
        } else if !identified {
            self.stop();
        }
    }

    fn reset(&self) {
        if !self.is_foregrounded.load(Ordering::Acquire) {
            return;
        }
        self.stop();
        if self.should_use_sse() {
            debug!("restarting realtime connection after reset");
            self.start();
        }
    }
}
