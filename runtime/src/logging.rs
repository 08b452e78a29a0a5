//! Structured logging setup and redaction.
//!
//! Every Paybridge binary logs through `tracing`. This module installs the
//! subscriber (plain text for local development, JSON for log shippers) and
//! provides [`redact`] / [`mask_token`] for scrubbing payloads before they
//! are attached to a log event.
//!
//! # Example
//!
//! ```
//! use paybridge_runtime::logging::redact;
//! use serde_json::json;
//!
//! let payload = json!({
//!     "user": "u1",
//!     "authToken": "eyJhbGciOi...",
//!     "bank": { "bank_account": "062-000 1234 5678" }
//! });
//!
//! let safe = redact(&payload);
//! assert_eq!(safe["user"], "u1");
//! assert_eq!(safe["authToken"], "[REDACTED]");
//! assert_eq!(safe["bank"]["bank_account"], "[REDACTED]");
//! ```

use serde_json::{Map, Value};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Replacement written over sensitive values.
pub const REDACTED: &str = "[REDACTED]";

/// Key names that mark a field as sensitive, as word sequences.
///
/// Keys are split on separators and camel-case humps before matching, so
/// `bankAccount`, `bank_account` and `BANK-ACCOUNT` all match `bank account`
/// while `business_name` does not match `ssn`.
const SENSITIVE_KEYS: &[&[&str]] = &[
    &["token"],
    &["password"],
    &["secret"],
    &["authorization"],
    &["cookie"],
    &["api", "key"],
    &["private", "key"],
    &["session", "id"],
    &["ssn"],
    &["tax", "file", "number"],
    &["tfn"],
    &["bank", "account"],
    &["account", "number"],
    &["bsb"],
    &["credit", "card"],
];

/// Words that stay sensitive when run together with others (`accesstoken`, `apikey`).
const SENSITIVE_FRAGMENTS: &[&str] = &["token", "password", "secret", "apikey", "cookie"];

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Default filter directive when `RUST_LOG` is unset (e.g. `"info"`).
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl LogConfig {
    /// Create a configuration with the given default level.
    #[must_use]
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            json: false,
        }
    }

    /// Switch to JSON output.
    #[must_use]
    pub const fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    /// Read `LOG_LEVEL` and `LOG_FORMAT` from the environment.
    ///
    /// `LOG_FORMAT=json` enables JSON output; any other value keeps plain text.
    #[must_use]
    pub fn from_env() -> Self {
        let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let json = std::env::var("LOG_FORMAT")
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        Self { level, json }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::new("info")
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `config.level`. Returns `false` when a
/// subscriber was already installed, in which case nothing changes.
pub fn init_tracing(config: &LogConfig) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let registry = tracing_subscriber::registry().with(filter);

    let installed = if config.json {
        registry
            .with(fmt::layer().json().with_current_span(true))
            .try_init()
    } else {
        registry.with(fmt::layer().with_target(false)).try_init()
    };

    installed.is_ok()
}

/// Split a field name into lowercase words.
fn key_words(key: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;

    for c in key.chars() {
        if !c.is_ascii_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if c.is_ascii_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
        current.push(c.to_ascii_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Returns `true` if a field named `key` must not be logged verbatim.
#[must_use]
pub fn is_sensitive_key(key: &str) -> bool {
    let words = key_words(key);

    let sequence_match = SENSITIVE_KEYS.iter().any(|needle| {
        words
            .windows(needle.len())
            .any(|window| window.iter().zip(needle.iter()).all(|(w, n)| w == n))
    });

    sequence_match
        || words
            .iter()
            .any(|word| SENSITIVE_FRAGMENTS.iter().any(|fragment| word.contains(fragment)))
}

/// Return a copy of `value` with every sensitive field replaced by [`REDACTED`].
///
/// Objects are walked recursively, including objects nested inside arrays.
/// Non-object values are returned unchanged.
#[must_use]
pub fn redact(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, inner) in map {
                let replaced = if is_sensitive_key(key) {
                    Value::String(REDACTED.to_string())
                } else {
                    redact(inner)
                };
                out.insert(key.clone(), replaced);
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(redact).collect()),
        other => other.clone(),
    }
}

/// Mask a credential for log correlation, keeping only a short prefix.
///
/// Values of eight characters or fewer are fully masked.
#[must_use]
pub fn mask_token(token: &str) -> String {
    const VISIBLE: usize = 6;
    if token.chars().count() <= 8 {
        return "***".to_string();
    }
    let prefix: String = token.chars().take(VISIBLE).collect();
    format!("{prefix}***")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_sensitive_keys_detected_case_insensitively() {
        assert!(is_sensitive_key("Authorization"));
        assert!(is_sensitive_key("x-hasura-admin-secret"));
        assert!(is_sensitive_key("refreshToken"));
        assert!(is_sensitive_key("bankAccount"));
        assert!(!is_sensitive_key("email_domain"));
        assert!(!is_sensitive_key("payroll_id"));
    }

    #[test]
    fn test_redact_nested_arrays() {
        let payload = json!({
            "staff": [
                { "name": "A. Nguyen", "tax_file_number": "123 456 789" },
                { "name": "B. Smith", "password": "hunter2" }
            ],
            "count": 2
        });

        let safe = redact(&payload);

        assert_eq!(safe["count"], 2);
        assert_eq!(safe["staff"][0]["name"], "A. Nguyen");
        assert_eq!(safe["staff"][0]["tax_file_number"], REDACTED);
        assert_eq!(safe["staff"][1]["password"], REDACTED);
    }

    #[test]
    fn test_ordinary_payroll_fields_are_not_sensitive() {
        for key in ["business_name", "businessName", "class_name", "session_count"] {
            assert!(!is_sensitive_key(key), "{key}");
        }
        assert!(is_sensitive_key("employee_ssn"));
        assert!(is_sensitive_key("TFN"));
        assert!(is_sensitive_key("bsbNumber"));
        assert!(is_sensitive_key("sessionId"));
        assert!(is_sensitive_key("accesstoken"));
        assert!(is_sensitive_key("creditCardNumber"));
    }

    #[test]
    fn test_redact_replaces_whole_sensitive_subtree() {
        let payload = json!({ "credentials": { "api_key": { "id": "k1", "value": "v" } } });
        assert_eq!(redact(&payload)["credentials"]["api_key"], REDACTED);
    }

    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token("eyJhbGciOiJIUzI1NiJ9.payload.sig"), "eyJhbG***");
        assert_eq!(mask_token("short"), "***");
    }

    #[test]
    fn test_log_config_builder() {
        let config = LogConfig::new("debug").with_json(true);
        assert_eq!(config.level, "debug");
        assert!(config.json);
        assert_eq!(LogConfig::default().level, "info");
    }

    proptest! {
        #[test]
        fn redact_never_leaks_sensitive_values(secret in "[a-zA-Z0-9]{12,32}") {
            let payload = json!({
                "outer": { "apiKey": secret.clone(), "visible": "ok" },
                "list": [ { "token": secret.clone() } ]
            });
            let rendered = redact(&payload).to_string();
            prop_assert!(!rendered.contains(&secret));
            prop_assert!(rendered.contains("ok"));
        }
    }
}
