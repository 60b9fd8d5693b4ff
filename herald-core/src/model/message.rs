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

use serde::{Deserialize, Serialize};

/// Screen anchor used when a message is presented on the modal surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessagePosition {
    /// Anchored to the top edge.
    #[serde(alias = "TOP", alias = "Top")]
    Top,
    /// Vertically centered.
    #[default]
    #[serde(alias = "CENTER", alias = "Center")]
    Center,
    /// Anchored to the bottom edge.
    #[serde(alias = "BOTTOM", alias = "Bottom")]
    Bottom,
}

/// Frequency block as it arrives from the catalog.
///
/// Every field is optional on the wire; use [`Message::frequency`] to obtain a
/// validated [`FrequencyCap`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrequencySettings {
    /// Maximum number of views, `0` meaning unlimited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<i64>,
    /// Seconds to wait between two views.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<i64>,
    /// When set, closing the message does not stop it from coming back.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_dismiss: Option<bool>,
}

/// The `broadcast` block of a sticky message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BroadcastSettings {
    /// Frequency rules for the message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<FrequencySettings>,
}

/// Delivery properties the catalog attaches to a message under `properties.gist`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GistProperties {
    /// Regular expression matched against the whole current route.
    #[serde(
        rename = "routeRuleAndroid",
        alias = "routeRule",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub route_rule: Option<String>,
    /// Inline element the message is meant for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_id: Option<String>,
    /// Campaign the message belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campaign_id: Option<String>,
    /// Modal anchor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<MessagePosition>,
    /// Persistent messages are only marked shown when closed explicitly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persistent: Option<bool>,
    /// Backdrop color for the modal surface.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlay_color: Option<String>,
    /// Marks a sticky message as meant for users who have not identified yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anonymous: Option<bool>,
    /// Present on sticky (broadcast or anonymous) messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub broadcast: Option<BroadcastSettings>,
}

/// Container for the vendor-specific property blocks of a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageProperties {
    /// Delivery properties.
    #[serde(default)]
    pub gist: GistProperties,
}

/// A validated frequency rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrequencyCap {
    /// Maximum number of views, `0` meaning unlimited.
    pub count: i64,
    /// Seconds between two views.
    pub delay_secs: i64,
    /// Whether dismissal is ignored.
    pub ignore_dismiss: bool,
}

impl FrequencyCap {
    /// Negative counts or delays make a rule unusable.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.count >= 0 && self.delay_secs >= 0
    }

    /// A count of zero places no limit on views.
    #[must_use]
    pub const fn is_unlimited(&self) -> bool {
        self.count == 0
    }

    /// The delay expressed in milliseconds.
    #[must_use]
    pub const fn delay_ms(&self) -> i64 {
        self.delay_secs.saturating_mul(1000)
    }
}

/// A catalog entry.
///
/// Two messages are the same message when every field is equal. The
/// `queue_id` is the tracking key: without one a message can be shown once
/// through a manual load but never counted, capped, or selected from a
/// catalog response.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Template identifier.
    #[serde(default)]
    pub message_id: String,
    /// Lower values are selected first; messages without a priority go last.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    /// Server-assigned tracking key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_id: Option<String>,
    /// Delivery properties.
    #[serde(default)]
    pub properties: MessageProperties,
}

impl Message {
    /// Creates a bare message with the given template id.
    pub fn new(message_id: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            priority: None,
            queue_id: None,
            properties: MessageProperties::default(),
        }
    }

    /// Sets the tracking key.
    #[must_use]
    pub fn with_queue_id(mut self, queue_id: impl Into<String>) -> Self {
        self.queue_id = Some(queue_id.into());
        self
    }

    /// Sets the priority.
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Sets the route rule.
    #[must_use]
    pub fn with_route_rule(mut self, rule: impl Into<String>) -> Self {
        self.properties.gist.route_rule = Some(rule.into());
        self
    }

    /// Targets an inline element, making the message an embedded one.
    #[must_use]
    pub fn with_element_id(mut self, element_id: impl Into<String>) -> Self {
        self.properties.gist.element_id = Some(element_id.into());
        self
    }

    /// Sets the modal anchor.
    #[must_use]
    pub fn with_position(mut self, position: MessagePosition) -> Self {
        self.properties.gist.position = Some(position);
        self
    }

    /// Sets the persistent flag.
    #[must_use]
    pub fn with_persistent(mut self, persistent: bool) -> Self {
        self.properties.gist.persistent = Some(persistent);
        self
    }

    /// Sets the anonymous flag.
    #[must_use]
    pub fn with_anonymous(mut self, anonymous: bool) -> Self {
        self.properties.gist.anonymous = Some(anonymous);
        self
    }

    /// Attaches a frequency rule, turning the message into a sticky one.
    #[must_use]
    pub fn with_frequency(mut self, count: i64, delay_secs: i64, ignore_dismiss: bool) -> Self {
        self.properties.gist.broadcast = Some(BroadcastSettings {
            frequency: Some(FrequencySettings {
                count: Some(count),
                delay: Some(delay_secs),
                ignore_dismiss: Some(ignore_dismiss),
            }),
        });
        self
    }

    /// Delivery properties.
    #[must_use]
    pub const fn gist(&self) -> &GistProperties {
        &self.properties.gist
    }

    /// The route rule, if any.
    #[must_use]
    pub fn route_rule(&self) -> Option<&str> {
        self.gist().route_rule.as_deref()
    }

    /// The inline element id, if any.
    #[must_use]
    pub fn element_id(&self) -> Option<&str> {
        self.gist().element_id.as_deref()
    }

    /// Embedded messages carry an element id.
    #[must_use]
    pub fn is_embedded(&self) -> bool {
        self.gist().element_id.is_some()
    }

    /// Whether the message survives display without being marked shown.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        self.gist().persistent.unwrap_or(false)
    }

    /// Modal anchor, `Center` when unspecified.
    #[must_use]
    pub fn position(&self) -> MessagePosition {
        self.gist().position.unwrap_or_default()
    }

    /// The frequency rule, if the message carries a complete one.
    ///
    /// A rule missing either `count` or `delay` is unusable and yields `None`.
    #[must_use]
    pub fn frequency(&self) -> Option<FrequencyCap> {
        let settings = self.gist().broadcast.as_ref()?.frequency.as_ref()?;
        Some(FrequencyCap {
            count: settings.count?,
            delay_secs: settings.delay?,
            ignore_dismiss: settings.ignore_dismiss.unwrap_or(false),
        })
    }

    /// Sticky messages for identified users.
    #[must_use]
    pub fn is_broadcast(&self) -> bool {
        self.gist().broadcast.is_some() && !self.gist().anonymous.unwrap_or(false)
    }

    /// Sticky messages for users who have not identified yet.
    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.gist().broadcast.is_some() && self.gist().anonymous.unwrap_or(false)
    }

    /// Identifier reported when the message is viewed: the queue id when
    /// present, otherwise the template id.
    #[must_use]
    pub fn tracking_id(&self) -> &str {
        self.queue_id.as_deref().unwrap_or(&self.message_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_catalog_entry() {
        let json = r#"{
            "messageId": "welcome",
            "priority": 2,
            "queueId": "q-1",
            "properties": {
                "gist": {
                    "routeRuleAndroid": "^Home$",
                    "elementId": "banner",
                    "position": "BOTTOM",
                    "persistent": true,
                    "broadcast": {
                        "frequency": { "count": 3, "delay": 10, "ignoreDismiss": true }
                    },
                    "unknownKey": 12
                },
                "other": {}
            }
        }"#;
        let message: Message = serde_json::from_str(json).unwrap();
        assert_eq!(message.queue_id.as_deref(), Some("q-1"));
        assert_eq!(message.route_rule(), Some("^Home$"));
        assert_eq!(message.element_id(), Some("banner"));
        assert_eq!(message.position(), MessagePosition::Bottom);
        assert!(message.is_persistent());
        assert!(message.is_embedded());
        assert!(message.is_broadcast());
        assert!(!message.is_anonymous());
        assert_eq!(
            message.frequency(),
            Some(FrequencyCap {
                count: 3,
                delay_secs: 10,
                ignore_dismiss: true
            })
        );
    }

    #[test]
    fn incomplete_frequency_is_not_usable() {
        let json =
            r#"{"messageId":"m","properties":{"gist":{"broadcast":{"frequency":{"count":1}}}}}"#;
        let message: Message = serde_json::from_str(json).unwrap();
        assert!(message.is_broadcast());
        assert_eq!(message.frequency(), None);
    }

    #[test]
    fn defaults_for_sparse_messages() {
        let message: Message = serde_json::from_str(r#"{"messageId":"plain"}"#).unwrap();
        assert_eq!(message.position(), MessagePosition::Center);
        assert!(!message.is_persistent());
        assert!(!message.is_embedded());
        assert!(!message.is_broadcast());
        assert_eq!(message.tracking_id(), "plain");
    }

    #[test]
    fn anonymous_flag_splits_sticky_classes() {
        let message = Message::new("m").with_frequency(0, 0, false).with_anonymous(true);
        assert!(message.is_anonymous());
        assert!(!message.is_broadcast());
    }
}
