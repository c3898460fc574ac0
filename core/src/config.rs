//! Settings for the bundled `UreqTransport`.
//!
//! Values come from `Default` or from `COURIER_*` environment variables.
//! Malformed variables are logged and ignored.

use std::str::FromStr;

use tracing::warn;

/// Transport-wide settings. Per-request settings live on `Request`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    pub user_agent: String,
    /// When false, 3xx responses are returned to the classifier as-is.
    pub follow_redirects: bool,
    pub max_redirects: u32,
    /// Upper bound on the number of body bytes read from one response.
    pub max_body_size: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("courier/", env!("CARGO_PKG_VERSION")).to_string(),
            follow_redirects: true,
            max_redirects: 10,
            max_body_size: 10 * 1024 * 1024,
        }
    }
}

impl TransportConfig {
    /// Defaults overridden by `COURIER_USER_AGENT`, `COURIER_FOLLOW_REDIRECTS`,
    /// `COURIER_MAX_REDIRECTS` and `COURIER_MAX_BODY_BYTES`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            user_agent: lookup("COURIER_USER_AGENT").unwrap_or(defaults.user_agent),
            follow_redirects: parse_or(
                &lookup,
                "COURIER_FOLLOW_REDIRECTS",
                defaults.follow_redirects,
            ),
            max_redirects: parse_or(&lookup, "COURIER_MAX_REDIRECTS", defaults.max_redirects),
            max_body_size: parse_or(&lookup, "COURIER_MAX_BODY_BYTES", defaults.max_body_size),
        }
    }

    pub fn with_follow_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = follow;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_max_body_size(mut self, bytes: u64) -> Self {
        self.max_body_size = bytes;
        self
    }

    /// Redirect limit handed to the HTTP agent; 0 disables following.
    pub(crate) fn effective_max_redirects(&self) -> u32 {
        if self.follow_redirects {
            self.max_redirects
        } else {
            0
        }
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!(key, value = %raw, "ignoring malformed configuration value");
                default
            }
        },
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        assert_eq!(TransportConfig::from_lookup(lookup(&[])), TransportConfig::default());
    }

    #[test]
    fn overrides_from_environment() {
        let config = TransportConfig::from_lookup(lookup(&[
            ("COURIER_USER_AGENT", "tests/1.0"),
            ("COURIER_FOLLOW_REDIRECTS", "false"),
            ("COURIER_MAX_REDIRECTS", "3"),
            ("COURIER_MAX_BODY_BYTES", "1024"),
        ]));
        assert_eq!(config.user_agent, "tests/1.0");
        assert!(!config.follow_redirects);
        assert_eq!(config.max_redirects, 3);
        assert_eq!(config.max_body_size, 1024);
        assert_eq!(config.effective_max_redirects(), 0);
    }

    #[test]
    fn malformed_values_keep_defaults() {
        let config = TransportConfig::from_lookup(lookup(&[
            ("COURIER_FOLLOW_REDIRECTS", "sometimes"),
            ("COURIER_MAX_REDIRECTS", "-1"),
        ]));
        assert!(config.follow_redirects);
        assert_eq!(config.max_redirects, 10);
        assert_eq!(config.effective_max_redirects(), 10);
    }
}
