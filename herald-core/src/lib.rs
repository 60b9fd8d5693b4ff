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

#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Herald Core
//!
//! The synchronous heart of the Herald in-app message delivery engine. This
//! crate holds everything that can be reasoned about without a runtime:
//!
//! - **Model (`Message`)**: catalog entries as they arrive on the wire, plus
//!   route rule matching.
//! - **Actions (`Action`)**: the closed vocabulary of events that change the
//!   engine's state.
//! - **State (`InAppMessagingState`)**: the immutable session snapshot,
//!   including the modal and inline surface state machines.
//! - **Reducer (`reduce`)**: the pure transition function.
//! - **Eligibility (`EligibilityEngine`)**: persisted frequency caps for
//!   broadcast and anonymous messages, over a `PreferenceStore`.
//! - **Configuration (`HeraldConfig`)**: TOML configuration loaded from XDG
//!   directories.
//!
//! The running system (store task, middleware, realtime channel) lives in
//! `herald-reactive`.

/// The action vocabulary.
pub(crate) mod action;

/// Wall-clock abstraction.
pub(crate) mod clock;

/// Configuration loading.
pub mod config;

/// Persisted frequency capping.
pub(crate) mod eligibility;

/// Catalog message model and route rules.
pub(crate) mod model;

/// Key/value persistence.
pub(crate) mod preferences;

/// The pure reducer.
pub(crate) mod reducer;

/// Session state.
pub(crate) mod state;

/// A prelude module for conveniently importing the most commonly used items.
pub mod prelude {
    pub use crate::action::{new_session_id, Action};
    pub use crate::clock::{Clock, SystemClock};
    pub use crate::config::{HeraldConfig, CONFIG};
    pub use crate::eligibility::{
        decode_snapshot, encode_snapshot, EligibilityClass, EligibilityEngine, EligibilityRecord,
        SnapshotError, SNAPSHOT_VERSION,
    };
    pub use crate::model::{
        evaluate_route_rule, BroadcastSettings, FrequencyCap, FrequencySettings, GistProperties,
        Message, MessagePosition, MessageProperties, RouteMatch,
    };
    pub use crate::preferences::{
        FilePreferenceStore, MemoryPreferenceStore, PreferenceStore, PreferenceStoreExt,
    };
    pub use crate::reducer::reduce;
    pub use crate::state::{
        Environment, InAppMessagingState, InlineMessageState, MessageQueue, ModalMessageState,
        QueuedInlineMessagesState, StateChange, DEFAULT_POLL_INTERVAL_MS,
    };
}
