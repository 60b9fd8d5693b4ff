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

//! Synchronous key/value persistence for eligibility data.
//!
//! Calls happen on the store's pipeline, so implementations must be fast and
//! must not block on the network.

use std::str::FromStr;

pub use file::FilePreferenceStore;
pub use memory::MemoryPreferenceStore;

mod file;
mod memory;

/// A string key/value store that survives process restarts.
pub trait PreferenceStore: Send + Sync {
    /// Reads a value.
    fn get(&self, key: &str) -> Option<String>;
    /// Writes a value.
    fn set(&self, key: &str, value: &str);
    /// Deletes a value; missing keys are ignored.
    fn remove(&self, key: &str);
    /// Lists every stored key.
    fn keys(&self) -> Vec<String>;
}

/// Typed helpers over [`PreferenceStore`].
pub trait PreferenceStoreExt: PreferenceStore {
    /// Reads and parses a value, treating unparsable values as absent.
    fn get_parsed<T: FromStr>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(|raw| raw.trim().parse().ok())
    }

    /// Formats and writes a value.
    fn set_display<T: ToString>(&self, key: &str, value: T) {
        self.set(key, &value.to_string());
    }

    /// Deletes every key starting with `prefix`.
    fn remove_prefixed(&self, prefix: &str) {
        for key in self.keys().into_iter().filter(|key| key.starts_with(prefix)) {
            self.remove(&key);
        }
    }
}

impl<T: PreferenceStore + ?Sized> PreferenceStoreExt for T {}
