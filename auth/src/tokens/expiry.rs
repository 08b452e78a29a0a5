//! Token expiry derivation.
//!
//! Identity-provider session tokens are JWTs. The cache only needs the `exp`
//! claim to schedule refreshes, so the payload is decoded without verifying
//! the signature; verification is the API's job.

use base64::{
    Engine as _,
    engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD},
};
use serde_json::Value;
use std::time::Duration;

/// Read the `exp` claim of a JWT as epoch milliseconds.
///
/// Returns `None` if the token is not a three-part JWT, the payload is not
/// base64url JSON, or `exp` is missing or not a number.
#[must_use]
pub fn jwt_expiry_millis(token: &str) -> Option<i64> {
    let mut parts = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return None;
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .or_else(|_| URL_SAFE.decode(payload))
        .ok()?;
    let claims: Value = serde_json::from_slice(&bytes).ok()?;

    let exp = claims.get("exp")?;
    #[allow(clippy::cast_possible_truncation)]
    let seconds = exp.as_i64().or_else(|| exp.as_f64().map(|f| f as i64))?;

    seconds.checked_mul(1000)
}

/// Expiry for a freshly fetched token.
///
/// Uses the embedded `exp` claim when readable, otherwise
/// `now_millis + default_lifetime`.
#[must_use]
pub fn token_expiry_millis(token: &str, now_millis: i64, default_lifetime: Duration) -> i64 {
    jwt_expiry_millis(token).unwrap_or_else(|| {
        tracing::debug!("Token has no readable exp claim, using default lifetime");
        let lifetime = i64::try_from(default_lifetime.as_millis()).unwrap_or(i64::MAX);
        now_millis.saturating_add(lifetime)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jwt(claims: &str) -> String {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims);
        format!("{header}.{payload}.signature")
    }

    #[test]
    fn test_reads_exp_claim() {
        let token = jwt(r#"{"sub":"user_1","exp":1735689600}"#);
        assert_eq!(jwt_expiry_millis(&token), Some(1_735_689_600_000));
    }

    #[test]
    fn test_accepts_float_exp() {
        let token = jwt(r#"{"exp":1735689600.0}"#);
        assert_eq!(jwt_expiry_millis(&token), Some(1_735_689_600_000));
    }

    #[test]
    fn test_accepts_padded_payload() {
        let header = URL_SAFE.encode("{}");
        let payload = URL_SAFE.encode(r#"{"exp":10}"#);
        let token = format!("{header}.{payload}.sig");
        assert_eq!(jwt_expiry_millis(&token), Some(10_000));
    }

    #[test]
    fn test_missing_exp() {
        assert_eq!(jwt_expiry_millis(&jwt(r#"{"sub":"user_1"}"#)), None);
        assert_eq!(jwt_expiry_millis(&jwt(r#"{"exp":"soon"}"#)), None);
    }

    #[test]
    fn test_not_a_jwt() {
        assert_eq!(jwt_expiry_millis("opaque-token"), None);
        assert_eq!(jwt_expiry_millis("a.b"), None);
        assert_eq!(jwt_expiry_millis("a.b.c.d"), None);
        assert_eq!(jwt_expiry_millis("a.!!!.c"), None);
    }

    #[test]
    fn test_default_lifetime_fallback() {
        let now = 1_000_000;
        let expiry = token_expiry_millis("opaque", now, Duration::from_secs(55 * 60));
        assert_eq!(expiry, now + 55 * 60 * 1000);
    }
}
