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

//! Versioned encoding of persisted eligibility snapshots.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::Message;

/// Version written by [`encode_snapshot`].
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize)]
struct SnapshotRef<'a> {
    version: u32,
    messages: &'a [Message],
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredSnapshot {
    Versioned { version: u32, messages: Vec<Message> },
    Legacy(Vec<Message>),
}

/// Why a persisted snapshot could not be decoded.
#[derive(Debug)]
pub enum SnapshotError {
    /// The document is not a snapshot of any known shape.
    Malformed(serde_json::Error),
    /// The document was written by a newer schema.
    UnsupportedVersion(u32),
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed(error) => write!(f, "malformed eligibility snapshot: {error}"),
            Self::UnsupportedVersion(version) => {
                write!(f, "unsupported eligibility snapshot version {version}")
            }
        }
    }
}

impl std::error::Error for SnapshotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Malformed(error) => Some(error),
            Self::UnsupportedVersion(_) => None,
        }
    }
}

impl From<serde_json::Error> for SnapshotError {
    fn from(error: serde_json::Error) -> Self {
        Self::Malformed(error)
    }
}

/// Encodes `messages` as the current snapshot version.
///
/// # Errors
///
/// Returns an error if a message cannot be serialized.
pub fn encode_snapshot(messages: &[Message]) -> Result<String, SnapshotError> {
    Ok(serde_json::to_string(&SnapshotRef {
        version: SNAPSHOT_VERSION,
        messages,
    })?)
}

/// Decodes a snapshot written by any known version.
///
/// A bare JSON array is accepted as the unversioned legacy layout.
///
/// # Errors
///
/// Returns an error for malformed documents and future versions.
pub fn decode_snapshot(raw: &str) -> Result<Vec<Message>, SnapshotError> {
    match serde_json::from_str::<StoredSnapshot>(raw)? {
        StoredSnapshot::Versioned { version, messages } if version <= SNAPSHOT_VERSION => {
            Ok(messages)
        }
        StoredSnapshot::Versioned { version, .. } => {
            Err(SnapshotError::UnsupportedVersion(version))
        }
        StoredSnapshot::Legacy(messages) => Ok(messages),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_what_it_writes() {
        let messages = vec![
            Message::new("a").with_queue_id("q1").with_frequency(1, 0, false),
            Message::new("b").with_queue_id("q2"),
        ];
        let encoded = encode_snapshot(&messages).unwrap();
        assert!(encoded.starts_with(r#"{"version":1"#));
        assert_eq!(decode_snapshot(&encoded).unwrap(), messages);
    }

    #[test]
    fn accepts_the_legacy_layout() {
        let decoded = decode_snapshot(r#"[{"messageId":"a","queueId":"q1"}]"#).unwrap();
        assert_eq!(decoded, vec![Message::new("a").with_queue_id("q1")]);
    }

    #[test]
    fn rejects_garbage_and_future_versions() {
        assert!(matches!(decode_snapshot("not json"), Err(SnapshotError::Malformed(_))));
        assert!(matches!(
            decode_snapshot(r#"{"version":9,"messages":[]}"#),
            Err(SnapshotError::UnsupportedVersion(9))
        ));
    }
}
