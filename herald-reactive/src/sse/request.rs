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
use std::time::Duration;

use herald_core::prelude::{HeraldConfig, InAppMessagingState};
use url::Url;

use crate::common::headers;

/// Why a realtime request could not be built.
#[derive(Debug)]
pub enum SseRequestError {
    /// The session has no user token to subscribe with.
    MissingUserToken,
    /// The configured endpoint is not a valid URL.
    InvalidEndpoint(url::ParseError),
}

impl fmt::Display for SseRequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingUserToken => {
                write!(f, "cannot open the realtime channel without a user token")
            }
            Self::InvalidEndpoint(e) => write!(f, "invalid realtime endpoint: {e}"),
        }
    }
}

impl std::error::Error for SseRequestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::MissingUserToken => None,
            Self::InvalidEndpoint(e) => Some(e),
        }
    }
}

/// A fully described realtime subscription request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseRequest {
    /// Endpoint with the query string applied.
    pub url: Url,
    /// Request headers.
    pub headers: Vec<(&'static str, String)>,
    /// How long the stream may stay silent before the read fails.
    pub read_timeout: Duration,
}

impl SseRequest {
    /// Describes the subscription for the session in `state`.
    ///
    /// # Errors
    ///
    /// Fails when the session has no user token or the endpoint configured
    /// for the session's environment does not parse.
    pub fn build(
        state: &InAppMessagingState,
        config: &HeraldConfig,
    ) -> Result<Self, SseRequestError> {
        let token = state.user_token().ok_or(SseRequestError::MissingUserToken)?;
        let encoded_token = headers::encode_user_token(token);

        let mut url = Url::parse(config.sse.endpoint(state.environment))
            .map_err(SseRequestError::InvalidEndpoint)?;
        url.query_pairs_mut()
            .append_pair("sessionId", &state.session_id)
            .append_pair("siteId", &state.site_id)
            .append_pair("userToken", &encoded_token);

        let headers = vec![
            (headers::SITE_ID, state.site_id.clone()),
            (headers::DATACENTER, state.data_center.clone()),
            (headers::CLIENT_PLATFORM, config.client.platform.clone()),
            (headers::CLIENT_VERSION, config.client.version.clone()),
            (headers::USER_ANONYMOUS, (!state.is_user_identified()).to_string()),
            (headers::ENCODED_USER_TOKEN, encoded_token),
            ("Accept", "text/event-stream".to_string()),
            ("Cache-Control", "no-cache".to_string()),
        ];

        Ok(Self {
            url,
            headers,
            read_timeout: config.sse.read_timeout(),
        })
    }

    /// Value of the header `name`, if present.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}
