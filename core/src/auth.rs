//! Client configuration carried inside the host-supplied JWT.
//!
//! The signature is not verified here; the backend does that on every
//! request. The payload only tells the client where to send requests and
//! when the token stops being usable.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// A token this close to `exp` is treated as expired.
pub const STALE_PERIOD: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(rename = "sub")]
    pub user_token: String,
    #[serde(rename = "iat")]
    pub created_on: u64,
    #[serde(rename = "exp")]
    pub expires_on: u64,
    #[serde(rename = "aud")]
    pub program_token: String,
    #[serde(rename = "iss")]
    pub issuer: String,
    #[serde(rename = "rest-uri")]
    pub rest_uri: String,
    #[serde(rename = "graphql-uri")]
    pub graphql_uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    #[serde(default, rename = "program-model", skip_serializing_if = "Option::is_none")]
    pub program_model: Option<String>,
    #[serde(skip)]
    token: String,
}

impl Configuration {
    /// Decode the payload segment of `token`.
    pub fn from_token(token: &str) -> Result<Self, ApiError> {
        let segments: Vec<&str> = token.split('.').collect();
        let [_, payload, _] = segments.as_slice() else {
            return Err(ApiError::InvalidToken(format!(
                "expected 3 segments, found {}",
                segments.len()
            )));
        };
        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| ApiError::InvalidToken(format!("payload is not base64url: {e}")))?;
        let mut configuration: Configuration = serde_json::from_slice(&bytes)
            .map_err(|e| ApiError::InvalidToken(format!("payload is not a claim set: {e}")))?;
        configuration.token = token.to_string();
        tracing::debug!(
            issuer = %configuration.issuer,
            expires_on = configuration.expires_on,
            "parsed authentication token"
        );
        Ok(configuration)
    }

    /// The raw token, sent as the bearer credential.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// True once `now` is within `STALE_PERIOD` of expiry.
    pub fn is_stale_at(&self, now: SystemTime) -> bool {
        let now = now.duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0);
        self.expires_on.saturating_sub(STALE_PERIOD.as_secs()) <= now
    }

    pub fn is_stale(&self) -> bool {
        self.is_stale_at(SystemTime::now())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn token_with(claims: serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
        format!("{header}.{payload}.sig")
    }

    pub(crate) fn sample_token(expires_on: u64) -> String {
        token_with(serde_json::json!({
            "sub": "usr-f9154016-94e8-4686-a840-075688ac07b5",
            "iat": 1_000,
            "exp": expires_on,
            "aud": "prg-83836cdf-2ce2-4696-8bc5-f1b86077238c",
            "iss": "prg-83836cdf-2ce2-4696-8bc5-f1b86077238c",
            "rest-uri": "https://api.example.com/rest/v3/",
            "graphql-uri": "https://api.example.com/graphql",
            "environment": "UAT",
            "program-model": "WALLET_MODEL"
        }))
    }

    #[test]
    fn claims_map_to_fields() {
        let token = sample_token(2_000);
        let config = Configuration::from_token(&token).unwrap();
        assert_eq!(config.user_token, "usr-f9154016-94e8-4686-a840-075688ac07b5");
        assert_eq!(config.created_on, 1_000);
        assert_eq!(config.expires_on, 2_000);
        assert_eq!(config.rest_uri, "https://api.example.com/rest/v3/");
        assert_eq!(config.graphql_uri, "https://api.example.com/graphql");
        assert_eq!(config.environment.as_deref(), Some("UAT"));
        assert_eq!(config.program_model.as_deref(), Some("WALLET_MODEL"));
        assert_eq!(config.token(), token);
    }

    #[test]
    fn padded_payload_is_tolerated() {
        let token = sample_token(2_000);
        let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
        while parts[1].len() % 4 != 0 {
            parts[1].push('=');
        }
        assert!(Configuration::from_token(&parts.join(".")).is_ok());
    }

    #[test]
    fn staleness_uses_grace_period() {
        let config = Configuration::from_token(&sample_token(2_000)).unwrap();
        let at = |secs| UNIX_EPOCH + Duration::from_secs(secs);
        assert!(!config.is_stale_at(at(1_969)));
        assert!(config.is_stale_at(at(1_970)));
        assert!(config.is_stale_at(at(2_500)));
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        for token in ["", "a.b", "a.b.c.d", "a.!!!.c"] {
            let err = Configuration::from_token(token).unwrap_err();
            assert!(matches!(err, ApiError::InvalidToken(_)), "{token}");
        }
        let missing_claim = token_with(serde_json::json!({"sub": "usr-1"}));
        assert!(matches!(
            Configuration::from_token(&missing_claim),
            Err(ApiError::InvalidToken(_))
        ));
    }
}
