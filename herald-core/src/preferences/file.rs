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

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{error, trace, warn};

use super::PreferenceStore;
use crate::config::PathsConfig;

const PREFERENCES_FILE: &str = "preferences.json";

/// Preferences kept in a JSON document on disk.
///
/// Reads are served from memory. Every write rewrites the document through a
/// temporary file and a rename, so a crash leaves either the old or the new
/// document behind. Write failures are logged and the in-memory value is
/// kept.
#[derive(Debug)]
pub struct FilePreferenceStore {
    path: PathBuf,
    values: DashMap<String, String>,
    write_lock: Mutex<()>,
}

impl FilePreferenceStore {
    /// Opens the document at `path`, creating it on first write.
    ///
    /// A document that cannot be parsed is ignored and replaced on the next
    /// write.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub fn open(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let values = DashMap::new();

        if path.exists() {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("reading preferences from {}", path.display()))?;
            match serde_json::from_str::<BTreeMap<String, String>>(&raw) {
                Ok(stored) => {
                    for (key, value) in stored {
                        values.insert(key, value);
                    }
                }
                Err(error) => {
                    warn!(path = %path.display(), %error, "discarding unreadable preferences");
                }
            }
        }

        trace!(path = %path.display(), keys = values.len(), "opened preference store");
        Ok(Self {
            path,
            values,
            write_lock: Mutex::new(()),
        })
    }

    /// Opens `preferences.json` in the configured data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub fn open_in(paths: &PathsConfig) -> anyhow::Result<Self> {
        Self::open(paths.data_directory().join(PREFERENCES_FILE))
    }

    /// Location of the backing document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) {
        let _guard = self.write_lock.lock();
        let snapshot: BTreeMap<String, String> = self
            .values
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        if let Err(error) = self.write_document(&snapshot) {
            error!(path = %self.path.display(), "failed to persist preferences: {error:#}");
        }
    }

    fn write_document(&self, snapshot: &BTreeMap<String, String>) -> anyhow::Result<()> {
        let encoded = serde_json::to_string_pretty(snapshot)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, encoded)?;
        fs::rename(&staging, &self.path)?;
        Ok(())
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).map(|value| value.value().clone())
    }

    fn set(&self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
        self.flush();
    }

    fn remove(&self, key: &str) {
        if self.values.remove(key).is_some() {
            self.flush();
        }
    }

    fn keys(&self) -> Vec<String> {
        self.values.iter().map(|entry| entry.key().clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_survive_reopening() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nested").join(PREFERENCES_FILE);

        let store = FilePreferenceStore::open(&path)?;
        store.set("herald.broadcast.times_shown.q1", "2");
        store.set("herald.broadcast.dismissed.q1", "true");
        store.remove("herald.broadcast.dismissed.q1");

        let reopened = FilePreferenceStore::open(&path)?;
        assert_eq!(reopened.get("herald.broadcast.times_shown.q1").as_deref(), Some("2"));
        assert_eq!(reopened.get("herald.broadcast.dismissed.q1"), None);
        Ok(())
    }

    #[test]
    fn configured_data_directory_holds_the_document() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let paths = PathsConfig {
            data_directory: dir.path().join("data").display().to_string(),
            ..PathsConfig::default()
        };

        let store = FilePreferenceStore::open_in(&paths)?;
        store.set("herald.anonymous.dismissed.q1", "true");

        assert_eq!(store.path(), dir.path().join("data").join(PREFERENCES_FILE));
        assert!(store.path().exists());
        Ok(())
    }

    #[test]
    fn corrupt_documents_start_empty() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join(PREFERENCES_FILE);
        fs::write(&path, "{not json")?;

        let store = FilePreferenceStore::open(&path)?;
        assert!(store.keys().is_empty());
        store.set("key", "value");
        assert_eq!(FilePreferenceStore::open(&path)?.get("key").as_deref(), Some("value"));
        Ok(())
    }
}
