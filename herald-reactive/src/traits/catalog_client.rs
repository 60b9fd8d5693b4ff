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

use async_trait::async_trait;
use herald_core::prelude::Message;

use crate::catalog::{CatalogRequest, CatalogResponse};

/// The host's connection to the message catalog backend.
///
/// Transport concerns (HTTP, retries, TLS) stay on the host side; the engine
/// only consumes results.
#[async_trait]
pub trait CatalogClient: Send + Sync + 'static {
    /// Fetches the messages queued for the user described by `request`.
    ///
    /// # Errors
    ///
    /// Returns an error when no response could be obtained. Responses with an
    /// unsuccessful status are returned as `Ok` and carry the status.
    async fn fetch_messages(&self, request: &CatalogRequest) -> anyhow::Result<CatalogResponse>;

    /// Reports that `message` was viewed in `session_id`.
    ///
    /// Called on the store task; implementations should hand the work off
    /// rather than block.
    fn log_view(&self, message: &Message, session_id: &str);
}
