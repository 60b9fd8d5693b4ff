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

//! Frequency capping for sticky message classes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::Message;

pub use engine::{EligibilityEngine, EligibilityRecord};
pub use schema::{decode_snapshot, encode_snapshot, SnapshotError, SNAPSHOT_VERSION};

mod engine;
mod schema;

/// The two sticky message classes. They share rules and differ in storage
/// keys and defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EligibilityClass {
    /// Sticky messages for identified users.
    Broadcast,
    /// Sticky messages for users who have not identified yet.
    Anonymous,
}

impl EligibilityClass {
    /// Lowercase class name used in keys and logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Broadcast => "broadcast",
            Self::Anonymous => "anonymous",
        }
    }

    /// Whether `message` belongs to this class.
    #[must_use]
    pub fn includes(self, message: &Message) -> bool {
        match self {
            Self::Broadcast => message.is_broadcast(),
            Self::Anonymous => message.is_anonymous(),
        }
    }

    /// Prefix shared by every persisted key of the class.
    #[must_use]
    pub fn key_prefix(self) -> String {
        format!("herald.{}.", self.name())
    }
}

impl fmt::Display for EligibilityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
