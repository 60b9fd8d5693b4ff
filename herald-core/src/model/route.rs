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

use regex::Regex;
use tracing::warn;

use crate::model::Message;

/// Outcome of testing a route rule against a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteMatch {
    /// The rule matches the whole route.
    Matched,
    /// The rule is valid but does not match.
    Mismatched,
    /// The rule is not a valid regular expression.
    InvalidRule,
}

/// Tests `rule` against the entire `route` string.
///
/// Rules are anchored on both ends, so `Dash` does not match `Dashboard`.
#[must_use]
pub fn evaluate_route_rule(rule: &str, route: &str) -> RouteMatch {
    match Regex::new(&format!("^(?:{rule})$")) {
        Ok(regex) if regex.is_match(route) => RouteMatch::Matched,
        Ok(_) => RouteMatch::Mismatched,
        Err(error) => {
            warn!(rule, %error, "route rule is not a valid regular expression");
            RouteMatch::InvalidRule
        }
    }
}

impl Message {
    /// Whether the message may be picked while `route` is current.
    ///
    /// Messages without a rule match everywhere. A message with a rule never
    /// matches an unknown route, and an invalid rule never matches.
    #[must_use]
    pub fn matches_route(&self, route: Option<&str>) -> bool {
        match (self.route_rule(), route) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(rule), Some(route)) => evaluate_route_rule(rule, route) == RouteMatch::Matched,
        }
    }

    /// Whether a message already on screen may stay there after navigating
    /// to `route`.
    ///
    /// Fails open: a missing or invalid rule keeps the message visible.
    #[must_use]
    pub fn still_matches_route(&self, route: &str) -> bool {
        self.route_rule()
            .map_or(true, |rule| evaluate_route_rule(rule, route) != RouteMatch::Mismatched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rules_match_the_whole_route() {
        assert_eq!(evaluate_route_rule("Dashboard", "Dashboard"), RouteMatch::Matched);
        assert_eq!(evaluate_route_rule("Dash", "Dashboard"), RouteMatch::Mismatched);
        assert_eq!(evaluate_route_rule("Dash.*", "Dashboard"), RouteMatch::Matched);
        assert_eq!(evaluate_route_rule("a|b", "b"), RouteMatch::Matched);
        assert_eq!(evaluate_route_rule("(", "("), RouteMatch::InvalidRule);
    }

    #[test]
    fn selection_skips_unknown_routes_and_bad_rules() {
        let unrestricted = Message::new("a");
        let restricted = Message::new("b").with_route_rule("Home");
        let broken = Message::new("c").with_route_rule("[");

        assert!(unrestricted.matches_route(None));
        assert!(!restricted.matches_route(None));
        assert!(restricted.matches_route(Some("Home")));
        assert!(!broken.matches_route(Some("Home")));
    }

    #[test]
    fn retention_fails_open() {
        let broken = Message::new("c").with_route_rule("[");
        let restricted = Message::new("b").with_route_rule("Dashboard");

        assert!(broken.still_matches_route("Settings"));
        assert!(Message::new("a").still_matches_route("Settings"));
        assert!(!restricted.still_matches_route("Settings"));
        assert!(restricted.still_matches_route("Dashboard"));
    }
}
