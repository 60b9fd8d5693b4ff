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

//! Catalog fetches: what the engine asks for, what it gets back, and how the
//! answer reaches the store.

use herald_core::config::ClientConfig;
use herald_core::prelude::{Environment, InAppMessagingState, Message};

use crate::common::headers;

pub use poller::{CatalogPoller, RefreshHandle};
pub use sync::CatalogSync;

mod poller;
mod sync;

/// Everything a host needs to fetch the user's message queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRequest {
    /// Workspace site id.
    pub site_id: String,
    /// Workspace data center.
    pub data_center: String,
    /// Backend environment.
    pub environment: Environment,
    /// Current session.
    pub session_id: String,
    /// User id, or the anonymous id before identification.
    pub user_token: String,
    /// Whether `user_token` is an anonymous id.
    pub anonymous: bool,
    /// Client platform reported to the backend.
    pub client_platform: String,
    /// Client version reported to the backend.
    pub client_version: String,
}

impl CatalogRequest {
    /// Describes a fetch for the session in `state`, or `None` while the user
    /// has no token.
    #[must_use]
    pub fn from_state(state: &InAppMessagingState, client: &ClientConfig) -> Option<Self> {
        let user_token = state.user_token()?.to_string();
        Some(Self {
            site_id: state.site_id.clone(),
            data_center: state.data_center.clone(),
            environment: state.environment,
            session_id: state.session_id.clone(),
            user_token,
            anonymous: !state.is_user_identified(),
            client_platform: client.platform.clone(),
            client_version: client.version.clone(),
        })
    }

    /// Headers the request carries.
    #[must_use]
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        vec![
            (headers::SITE_ID, self.site_id.clone()),
            (headers::DATACENTER, self.data_center.clone()),
            (headers::CLIENT_PLATFORM, self.client_platform.clone()),
            (headers::CLIENT_VERSION, self.client_version.clone()),
            (headers::USER_ANONYMOUS, self.anonymous.to_string()),
            (headers::ENCODED_USER_TOKEN, headers::encode_user_token(&self.user_token)),
            ("Cache-Control", "no-cache".to_string()),
        ]
    }
}

/// A catalog answer as the host received it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogResponse {
    /// HTTP status.
    pub status: u16,
    /// Decoded body. Empty unless the fetch succeeded with content.
    pub messages: Vec<Message>,
    /// Response headers.
    pub headers: Vec<(String, String)>,
}

impl CatalogResponse {
    /// A `200` carrying `messages`.
    #[must_use]
    pub fn ok(messages: Vec<Message>) -> Self {
        Self {
            status: 200,
            messages,
            headers: Vec::new(),
        }
    }

    /// A bodiless response with `status`.
    #[must_use]
    pub fn with_status(status: u16) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    /// Adds a response header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Classifies the response.
    #[must_use]
    pub fn outcome(&self) -> CatalogOutcome<'_> {
        match self.status {
            204 | 304 => CatalogOutcome::NoContent,
            200..=299 => CatalogOutcome::Messages(&self.messages),
            status => CatalogOutcome::Failed(status),
        }
    }

    /// Server polling cadence in milliseconds, when announced and positive.
    #[must_use]
    pub fn polling_interval_ms(&self) -> Option<u64> {
        headers::find(&self.headers, headers::QUEUE_POLLING_INTERVAL)?
            .parse::<u64>()
            .ok()
            .filter(|seconds| *seconds > 0)
            .map(|seconds| seconds.saturating_mul(1000))
    }

    /// Whether the server asked for realtime updates, when it said so.
    #[must_use]
    pub fn use_sse(&self) -> Option<bool> {
        headers::find(&self.headers, headers::USE_SSE)
            .map(|value| value.eq_ignore_ascii_case("true"))
    }
}

/// How a catalog response should be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogOutcome<'a> {
    /// The user has nothing queued.
    NoContent,
    /// The user's current queue.
    Messages(&'a [Message]),
    /// The fetch failed with this status.
    Failed(u16),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_requires_a_token() {
        let client = ClientConfig::default();
        assert!(CatalogRequest::from_state(&InAppMessagingState::default(), &client).is_none());

        let state = InAppMessagingState {
            site_id: "site".into(),
            anonymous_id: Some("anon".into()),
            ..InAppMessagingState::default()
        };
        let request = CatalogRequest::from_state(&state, &client).expect("anonymous token");
        assert!(request.anonymous);
        assert!(request
            .headers()
            .contains(&(headers::ENCODED_USER_TOKEN, "YW5vbg==".to_string())));
    }

    #[test]
    fn classifies_statuses() {
        assert_eq!(CatalogResponse::with_status(204).outcome(), CatalogOutcome::NoContent);
        assert_eq!(CatalogResponse::with_status(304).outcome(), CatalogOutcome::NoContent);
        assert_eq!(CatalogResponse::with_status(500).outcome(), CatalogOutcome::Failed(500));
        let ok = CatalogResponse::ok(vec![Message::new("m")]);
        assert!(matches!(ok.outcome(), CatalogOutcome::Messages(messages) if messages.len() == 1));
    }

    #[test]
    fn reads_server_hints() {
        let response = CatalogResponse::ok(Vec::new())
            .with_header(headers::QUEUE_POLLING_INTERVAL, "30")
            .with_header(headers::USE_SSE, "TRUE");
        assert_eq!(response.polling_interval_ms(), Some(30_000));
        assert_eq!(response.use_sse(), Some(true));

        let zero =
            CatalogResponse::ok(Vec::new()).with_header(headers::QUEUE_POLLING_INTERVAL, "0");
        assert_eq!(zero.polling_interval_ms(), None);
        assert_eq!(zero.use_sse(), None);
    }
}
