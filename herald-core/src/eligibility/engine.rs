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

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use derive_new::new;
use tracing::{debug, trace, warn};

use super::schema::{decode_snapshot, encode_snapshot};
use super::EligibilityClass;
use crate::clock::Clock;
use crate::config::CONFIG;
use crate::model::{FrequencyCap, Message};
use crate::preferences::{PreferenceStore, PreferenceStoreExt};

/// Tracking data kept for one queue id.
#[derive(Debug, Clone, Default, PartialEq, Eq, new)]
pub struct EligibilityRecord {
    /// How many times the message was shown.
    pub times_shown: u32,
    /// Whether the message was dismissed for good.
    pub dismissed: bool,
    /// Earliest time the message may be shown again.
    pub next_eligible_at_ms: Option<i64>,
}

/// Persisted frequency capping for one class of sticky messages.
///
/// Every operation is scoped to a user token; without one, reads return
/// nothing and writes are skipped. The engine keeps the last catalog members
/// of its class as a snapshot with an expiry, and per queue id counters that
/// outlive the snapshot.
pub struct EligibilityEngine {
    class: EligibilityClass,
    preferences: Arc<dyn PreferenceStore>,
    clock: Arc<dyn Clock>,
    snapshot_ttl: Duration,
}

impl fmt::Debug for EligibilityEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EligibilityEngine")
            .field("class", &self.class)
            .field("snapshot_ttl", &self.snapshot_ttl)
            .finish_non_exhaustive()
    }
}

impl EligibilityEngine {
    /// Creates an engine for `class` using the configured snapshot lifetime.
    pub fn new(
        class: EligibilityClass,
        preferences: Arc<dyn PreferenceStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            class,
            preferences,
            clock,
            snapshot_ttl: CONFIG.eligibility.snapshot_ttl(class),
        }
    }

    /// Engine for broadcast messages.
    pub fn broadcast(preferences: Arc<dyn PreferenceStore>, clock: Arc<dyn Clock>) -> Self {
        Self::new(EligibilityClass::Broadcast, preferences, clock)
    }

    /// Engine for anonymous messages.
    pub fn anonymous(preferences: Arc<dyn PreferenceStore>, clock: Arc<dyn Clock>) -> Self {
        Self::new(EligibilityClass::Anonymous, preferences, clock)
    }

    /// Overrides how long a stored snapshot stays valid.
    #[must_use]
    pub fn with_snapshot_ttl(mut self, ttl: Duration) -> Self {
        self.snapshot_ttl = ttl;
        self
    }

    /// The class this engine tracks.
    #[must_use]
    pub const fn class(&self) -> EligibilityClass {
        self.class
    }

    /// Stores the members of this class found in `catalog`.
    ///
    /// Tracking data for queue ids that left the catalog is removed. A
    /// catalog without any member of the class clears everything stored for
    /// the class.
    pub fn update_local_store(&self, user_token: Option<&str>, catalog: &[Message]) {
        if user_token.is_none() {
            debug!(class = %self.class, "no user token, skipping catalog update");
            return;
        }

        let members: Vec<Message> = catalog
            .iter()
            .filter(|message| self.class.includes(message))
            .cloned()
            .collect();

        if members.is_empty() {
            debug!(class = %self.class, "no members in catalog, clearing stored data");
            self.clear_all();
            return;
        }

        let retained: BTreeSet<&str> = members
            .iter()
            .filter_map(|message| message.queue_id.as_deref())
            .collect();
        for stale in self
            .decode_stored()
            .iter()
            .filter_map(|message| message.queue_id.as_deref())
            .filter(|queue_id| !retained.contains(queue_id))
        {
            trace!(class = %self.class, queue_id = stale, "removing stale tracking data");
            self.remove_record(stale);
        }

        match encode_snapshot(&members) {
            Ok(encoded) => {
                let ttl_ms = i64::try_from(self.snapshot_ttl.as_millis()).unwrap_or(i64::MAX);
                let expires_at = self.clock.now_ms().saturating_add(ttl_ms);
                self.preferences.set(&self.key("messages_json"), &encoded);
                self.preferences.set_display(&self.key("expires_at_ms"), expires_at);
                debug!(
                    class = %self.class,
                    count = members.len(),
                    expires_at,
                    "stored catalog members"
                );
            }
            Err(error) => warn!(class = %self.class, %error, "could not encode catalog members"),
        }
    }

    /// Stored members that may be shown now.
    #[must_use]
    pub fn eligible_messages(&self, user_token: Option<&str>) -> Vec<Message> {
        if user_token.is_none() {
            debug!(class = %self.class, "no user token, nothing is eligible");
            return Vec::new();
        }

        let now = self.clock.now_ms();
        self.stored_messages()
            .into_iter()
            .filter(|message| self.is_eligible(message, now))
            .collect()
    }

    /// Records one view of `queue_id`.
    ///
    /// A message capped at one view is dismissed for good. Otherwise a
    /// positive delay postpones the next view.
    pub fn mark_seen(&self, user_token: Option<&str>, queue_id: &str) {
        if user_token.is_none() {
            return;
        }
        let Some(frequency) = self.frequency_for(queue_id) else {
            trace!(class = %self.class, queue_id, "no frequency rule, not tracking view");
            return;
        };

        let times_shown = self.record(queue_id).times_shown.saturating_add(1);
        self.preferences
            .set_display(&self.record_key("times_shown", queue_id), times_shown);

        if frequency.count == 1 {
            self.preferences
                .set_display(&self.record_key("dismissed", queue_id), true);
        } else if frequency.delay_secs > 0 {
            let next = self.clock.now_ms().saturating_add(frequency.delay_ms());
            self.preferences
                .set_display(&self.record_key("next_eligible_at_ms", queue_id), next);
        }
        debug!(class = %self.class, queue_id, times_shown, "recorded view");
    }

    /// Records that the user closed `queue_id`.
    pub fn mark_dismissed(&self, user_token: Option<&str>, queue_id: &str) {
        if user_token.is_none() {
            return;
        }
        let Some(frequency) = self.frequency_for(queue_id) else {
            return;
        };
        if frequency.ignore_dismiss {
            trace!(class = %self.class, queue_id, "dismissal ignored by frequency rule");
            return;
        }
        self.preferences
            .set_display(&self.record_key("dismissed", queue_id), true);
        debug!(class = %self.class, queue_id, "recorded dismissal");
    }

    /// Tracking data stored for `queue_id`.
    #[must_use]
    pub fn record(&self, queue_id: &str) -> EligibilityRecord {
        EligibilityRecord::new(
            self.preferences
                .get_parsed(&self.record_key("times_shown", queue_id))
                .unwrap_or(0),
            self.preferences
                .get_parsed(&self.record_key("dismissed", queue_id))
                .unwrap_or(false),
            self.preferences
                .get_parsed(&self.record_key("next_eligible_at_ms", queue_id)),
        )
    }

    /// Removes every stored key of this class.
    pub fn clear_all(&self) {
        self.preferences.remove_prefixed(&self.class.key_prefix());
    }

    fn is_eligible(&self, message: &Message, now: i64) -> bool {
        let Some(queue_id) = message.queue_id.as_deref() else {
            return false;
        };
        let Some(frequency) = message.frequency().filter(FrequencyCap::is_valid) else {
            return false;
        };

        let record = self.record(queue_id);
        if record.dismissed && !frequency.ignore_dismiss {
            return false;
        }
        if record.next_eligible_at_ms.is_some_and(|next| next > 0 && now < next) {
            return false;
        }
        frequency.is_unlimited() || i64::from(record.times_shown) < frequency.count
    }

    fn frequency_for(&self, queue_id: &str) -> Option<FrequencyCap> {
        self.stored_messages()
            .iter()
            .find(|message| message.queue_id.as_deref() == Some(queue_id))
            .and_then(Message::frequency)
    }

    fn stored_messages(&self) -> Vec<Message> {
        let expires_at: i64 = self
            .preferences
            .get_parsed(&self.key("expires_at_ms"))
            .unwrap_or(0);
        if expires_at > 0 && self.clock.now_ms() > expires_at {
            debug!(class = %self.class, expires_at, "stored catalog members expired");
            self.preferences.remove(&self.key("messages_json"));
            self.preferences.remove(&self.key("expires_at_ms"));
            return Vec::new();
        }
        self.decode_stored()
    }

    fn decode_stored(&self) -> Vec<Message> {
        let Some(raw) = self.preferences.get(&self.key("messages_json")) else {
            return Vec::new();
        };
        decode_snapshot(&raw).unwrap_or_else(|error| {
            warn!(class = %self.class, %error, "treating stored catalog members as empty");
            Vec::new()
        })
    }

    fn remove_record(&self, queue_id: &str) {
        for field in ["times_shown", "dismissed", "next_eligible_at_ms"] {
            self.preferences.remove(&self.record_key(field, queue_id));
        }
    }

    fn key(&self, field: &str) -> String {
        format!("{}{field}", self.class.key_prefix())
    }

    fn record_key(&self, field: &str, queue_id: &str) -> String {
        format!("{}{field}.{queue_id}", self.class.key_prefix())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicI64, Ordering};

    use super::*;
    use crate::preferences::MemoryPreferenceStore;

    const TOKEN: Option<&str> = Some("user-1");

    #[derive(Default)]
    struct StepClock(AtomicI64);

    impl Clock for StepClock {
        fn now_ms(&self) -> i64 {
            self.0.load(Ordering::SeqCst)
        }
    }

    fn engine() -> (EligibilityEngine, Arc<MemoryPreferenceStore>, Arc<StepClock>) {
        let preferences = Arc::new(MemoryPreferenceStore::new());
        let clock = Arc::new(StepClock(AtomicI64::new(1_000_000)));
        let engine = EligibilityEngine::broadcast(preferences.clone(), clock.clone())
            .with_snapshot_ttl(Duration::from_secs(3600));
        (engine, preferences, clock)
    }

    fn sticky(count: i64, delay_secs: i64) -> Message {
        Message::new("m")
            .with_queue_id("q1")
            .with_frequency(count, delay_secs, false)
    }

    fn queue_ids(messages: &[Message]) -> Vec<&str> {
        messages.iter().filter_map(|m| m.queue_id.as_deref()).collect()
    }

    #[test]
    fn unlimited_messages_stay_eligible() {
        let (engine, _, _) = engine();
        engine.update_local_store(TOKEN, &[sticky(0, 0)]);

        for _ in 0..5 {
            engine.mark_seen(TOKEN, "q1");
        }
        assert_eq!(engine.record("q1").times_shown, 5);
        assert_eq!(queue_ids(&engine.eligible_messages(TOKEN)), vec!["q1"]);
    }

    #[test]
    fn single_view_messages_are_dismissed_for_good() {
        let (engine, preferences, _) = engine();
        engine.update_local_store(TOKEN, &[sticky(1, 0)]);

        engine.mark_seen(TOKEN, "q1");
        assert!(engine.record("q1").dismissed);
        assert!(engine.eligible_messages(TOKEN).is_empty());

        preferences.remove("herald.broadcast.dismissed.q1");
        assert!(!engine.record("q1").dismissed);
        assert!(engine.eligible_messages(TOKEN).is_empty());
    }

    #[test]
    fn delay_postpones_the_next_view() {
        let (engine, _, clock) = engine();
        engine.update_local_store(TOKEN, &[sticky(0, 5)]);

        engine.mark_seen(TOKEN, "q1");
        assert!(engine.eligible_messages(TOKEN).is_empty());

        clock.0.fetch_add(5_001, Ordering::SeqCst);
        assert_eq!(queue_ids(&engine.eligible_messages(TOKEN)), vec!["q1"]);
    }

    #[test]
    fn count_caps_views() {
        let (engine, _, _) = engine();
        engine.update_local_store(TOKEN, &[sticky(2, 0)]);

        engine.mark_seen(TOKEN, "q1");
        assert_eq!(engine.eligible_messages(TOKEN).len(), 1);
        engine.mark_seen(TOKEN, "q1");
        assert!(engine.eligible_messages(TOKEN).is_empty());
    }

    #[test]
    fn ignore_dismiss_keeps_messages_eligible() {
        let (engine, _, _) = engine();
        engine.update_local_store(
            TOKEN,
            &[
                Message::new("a").with_queue_id("q1").with_frequency(0, 0, true),
                Message::new("b").with_queue_id("q2").with_frequency(0, 0, false),
            ],
        );

        engine.mark_dismissed(TOKEN, "q1");
        engine.mark_dismissed(TOKEN, "q2");
        assert!(!engine.record("q1").dismissed);
        assert_eq!(queue_ids(&engine.eligible_messages(TOKEN)), vec!["q1"]);
    }

    #[test]
    fn empty_catalog_clears_the_class() {
        let (engine, preferences, _) = engine();
        let catalog: Vec<Message> = (1..=3)
            .map(|n| {
                Message::new(format!("m{n}"))
                    .with_queue_id(format!("q{n}"))
                    .with_frequency(0, 10, false)
            })
            .collect();
        engine.update_local_store(TOKEN, &catalog);
        for n in 1..=3 {
            engine.mark_seen(TOKEN, &format!("q{n}"));
        }
        assert!(preferences.len() > 2);

        engine.update_local_store(TOKEN, &[]);
        assert!(preferences.is_empty());
        for n in 1..=3 {
            assert_eq!(engine.record(&format!("q{n}")), EligibilityRecord::default());
        }
    }

    #[test]
    fn departed_messages_lose_their_tracking_data() {
        let (engine, _, _) = engine();
        let kept = Message::new("a").with_queue_id("q1").with_frequency(0, 0, false);
        let departed = Message::new("b").with_queue_id("q2").with_frequency(0, 0, false);
        engine.update_local_store(TOKEN, &[kept.clone(), departed]);
        engine.mark_seen(TOKEN, "q1");
        engine.mark_seen(TOKEN, "q2");

        engine.update_local_store(TOKEN, &[kept]);
        assert_eq!(engine.record("q1").times_shown, 1);
        assert_eq!(engine.record("q2").times_shown, 0);
    }

    #[test]
    fn snapshots_expire_but_counters_remain() {
        let (engine, _, clock) = engine();
        engine.update_local_store(TOKEN, &[sticky(0, 0)]);
        engine.mark_seen(TOKEN, "q1");

        clock.0.fetch_add(3_600_001, Ordering::SeqCst);
        assert!(engine.eligible_messages(TOKEN).is_empty());
        assert_eq!(engine.record("q1").times_shown, 1);
    }

    #[test]
    fn malformed_snapshots_read_as_empty() {
        let (engine, preferences, _) = engine();
        preferences.set("herald.broadcast.messages_json", "{broken");
        assert!(engine.eligible_messages(TOKEN).is_empty());
        engine.mark_seen(TOKEN, "q1");
        assert_eq!(engine.record("q1").times_shown, 0);
    }

    #[test]
    fn nothing_happens_without_a_token() {
        let (engine, preferences, _) = engine();
        engine.update_local_store(None, &[sticky(0, 0)]);
        assert!(preferences.is_empty());
        assert!(engine.eligible_messages(None).is_empty());
    }

    #[test]
    fn only_members_of_the_class_are_stored() {
        let (engine, _, _) = engine();
        let anonymous = Message::new("anon")
            .with_queue_id("q1")
            .with_frequency(0, 0, false)
            .with_anonymous(true);
        engine.update_local_store(
            TOKEN,
            &[
                Message::new("plain").with_queue_id("q0"),
                anonymous,
                Message::new("broadcast").with_queue_id("q2").with_frequency(0, 0, false),
            ],
        );
        assert_eq!(queue_ids(&engine.eligible_messages(TOKEN)), vec!["q2"]);
    }

    #[test]
    fn invalid_frequencies_are_never_eligible() {
        let (engine, _, _) = engine();
        engine.update_local_store(TOKEN, &[
            Message::new("negative").with_queue_id("q1").with_frequency(-1, 0, false),
            Message::new("untracked").with_frequency(0, 0, false),
        ]);
        assert!(engine.eligible_messages(TOKEN).is_empty());
    }
}
