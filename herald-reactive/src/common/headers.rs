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

//! Header names shared by the catalog and realtime requests.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// Workspace site id.
pub const SITE_ID: &str = "X-CIO-Site-Id";
/// Workspace data center.
pub const DATACENTER: &str = "X-CIO-Datacenter";
/// Client platform.
pub const CLIENT_PLATFORM: &str = "X-CIO-Client-Platform";
/// Client version.
pub const CLIENT_VERSION: &str = "X-CIO-Client-Version";
/// `"true"` when the token is an anonymous id.
pub const USER_ANONYMOUS: &str = "X-Gist-User-Anonymous";
/// Base64 of the user token.
pub const ENCODED_USER_TOKEN: &str = "X-Gist-Encoded-User-Token";
/// Server polling cadence in seconds, on catalog responses.
pub const QUEUE_POLLING_INTERVAL: &str = "X-Gist-Queue-Polling-Interval";
/// Whether the server wants realtime updates, on catalog responses.
pub const USE_SSE: &str = "X-CIO-Use-SSE";

/// Base64 form of a user token, as the backend expects it.
#[must_use]
pub fn encode_user_token(token: &str) -> String {
    STANDARD.encode(token.as_bytes())
}

/// Case-insensitive header lookup.
#[must_use]
pub fn find<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_tokens_as_standard_base64() {
        assert_eq!(encode_user_token("user-1"), "dXNlci0x");
    }

    #[test]
    fn header_lookup_ignores_case() {
        let headers = vec![("x-gist-queue-polling-interval".to_string(), " 30 ".to_string())];
        assert_eq!(find(&headers, QUEUE_POLLING_INTERVAL), Some("30"));
        assert_eq!(find(&headers, USE_SSE), None);
    }
}
