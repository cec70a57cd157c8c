//! Service-account token exchange.
//!
//! The credential blob is a Google service-account key. A short-lived RS256
//! assertion signed with its private key is traded at `token_uri` for a
//! bearer token scoped to read spreadsheets.

use jsonwebtoken::{encode, get_current_timestamp, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, TranslatorError};
use crate::req::{Method, ReqClient};

pub const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/spreadsheets.readonly",
    "https://www.googleapis.com/auth/drive.readonly",
];

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: u64 = 3600;

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

/// The fields of a service-account key this crate needs; others are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl ServiceAccountKey {
    pub fn from_json(blob: &str) -> Result<Self> {
        serde_json::from_str(blob).map_err(|e| {
            TranslatorError::Authentication(format!("malformed service-account key: {}", e))
        })
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct Claims<'a> {
    iss: &'a str,
    scope: String,
    aud: &'a str,
    iat: u64,
    exp: u64,
}

impl<'a> Claims<'a> {
    fn new(key: &'a ServiceAccountKey, now: u64) -> Self {
        Claims {
            iss: &key.client_email,
            scope: SCOPES.join(" "),
            aud: &key.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        }
    }
}

fn signed_assertion(key: &ServiceAccountKey, now: u64) -> Result<String> {
    let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes()).map_err(|e| {
        TranslatorError::Authentication(format!("invalid private key for {}: {}", key.client_email, e))
    })?;
    encode(&Header::new(Algorithm::RS256), &Claims::new(key, now), &signing_key)
        .map_err(|e| TranslatorError::Authentication(format!("cannot sign assertion: {}", e)))
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Exchange the key for a bearer token.
pub async fn fetch_access_token(http: &ReqClient, key: &ServiceAccountKey) -> Result<String> {
    let assertion = signed_assertion(key, get_current_timestamp())?;
    debug!("requesting access token for {}", key.client_email);

    let resp = http
        .prepare(Method::POST, key.token_uri.as_str())
        .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
        .send()
        .await
        .map_err(|e| TranslatorError::Authentication(format!("token request failed: {}", e)))?;

    let status = resp.status();
    if !status.is_success() {
        let detail = resp.text().await.unwrap_or_default();
        return Err(TranslatorError::Authentication(format!(
            "token endpoint rejected {} ({}): {}",
            key.client_email, status, detail
        )));
    }

    let token: TokenResponse = resp.json().await.map_err(|e| {
        TranslatorError::Authentication(format!("unexpected token response: {}", e))
    })?;
    Ok(token.access_token)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> ServiceAccountKey {
        ServiceAccountKey::from_json(
            r#"{
                "type": "service_account",
                "project_id": "translator",
                "client_email": "reader@translator.iam.gserviceaccount.com",
                "private_key": "not a key"
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn key_ignores_extra_fields_and_defaults_token_uri() {
        let key = key();
        assert_eq!(key.client_email, "reader@translator.iam.gserviceaccount.com");
        assert_eq!(key.token_uri, "https://oauth2.googleapis.com/token");
    }

    #[test]
    fn malformed_blob_is_an_authentication_error() {
        let err = ServiceAccountKey::from_json(r#"{"client_email": 1}"#).unwrap_err();
        assert!(matches!(err, TranslatorError::Authentication(_)));
    }

    #[test]
    fn claims_cover_one_hour() {
        let key = key();
        let claims = Claims::new(&key, 1_700_000_000);
        assert_eq!(claims.iss, key.client_email);
        assert_eq!(claims.aud, key.token_uri);
        assert_eq!(claims.exp - claims.iat, 3600);
        assert!(claims.scope.contains("spreadsheets.readonly"));
    }

    #[test]
    fn unusable_private_key_is_an_authentication_error() {
        let err = signed_assertion(&key(), 1_700_000_000).unwrap_err();
        assert!(matches!(err, TranslatorError::Authentication(_)));
    }
}
