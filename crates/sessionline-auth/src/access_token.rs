//! Local access-token verification.
//!
//! Access tokens are RS256 JWTs signed by the core. The public half of the
//! signing key comes from the handshake, usually as the base64 body of an
//! X.509 `SubjectPublicKeyInfo` without PEM armour. Every failure here means
//! "this token cannot be trusted locally" and is reported as
//! [`Error::TryRefreshToken`].

use crate::error::{Error, Result, try_refresh};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sessionline_api::JsonMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenClaims {
    pub session_handle: String,
    pub user_id: String,
    #[serde(rename = "refreshTokenHash1")]
    pub refresh_token_hash: String,
    /// Present only on tokens minted right after a refresh whose new refresh
    /// token the core has not yet seen used.
    #[serde(rename = "parentRefreshTokenHash1", default)]
    pub parent_refresh_token_hash: Option<String>,
    #[serde(default)]
    pub user_data: JsonMap,
    #[serde(default)]
    pub anti_csrf_token: Option<String>,
    /// Epoch milliseconds.
    pub expiry_time: u64,
    /// Epoch milliseconds.
    pub time_created: u64,
}

/// Verify `token` against `public_key` using the current time.
pub fn verify_access_token(
    token: &str,
    public_key: &str,
    require_anti_csrf: bool,
) -> Result<AccessTokenClaims> {
    verify_access_token_at(token, public_key, require_anti_csrf, now_epoch_ms())
}

/// Verify `token` against `public_key` as of `now_ms`.
///
/// Pure: no I/O, and the same inputs always give the same answer.
pub fn verify_access_token_at(
    token: &str,
    public_key: &str,
    require_anti_csrf: bool,
    now_ms: u64,
) -> Result<AccessTokenClaims> {
    let header = jsonwebtoken::decode_header(token)
        .map_err(|e| try_refresh(format!("failed to decode access token header: {e}")))?;
    if header.alg != Algorithm::RS256 {
        return Err(try_refresh(format!(
            "unsupported access token algorithm: {:?}",
            header.alg
        )));
    }

    let key = decoding_key(public_key)?;

    // Expiry is a millisecond claim of its own, checked below.
    let mut validation = Validation::new(Algorithm::RS256);
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data = jsonwebtoken::decode::<Value>(token, &key, &validation)
        .map_err(|e| try_refresh(format!("access token verification failed: {e}")))?;

    let claims: AccessTokenClaims = serde_json::from_value(data.claims)
        .map_err(|e| try_refresh(format!("access token claims malformed: {e}")))?;

    if claims.session_handle.is_empty() || claims.user_id.is_empty() {
        return Err(try_refresh("access token has empty session handle or user id"));
    }
    if require_anti_csrf && claims.anti_csrf_token.is_none() {
        return Err(try_refresh("access token does not carry an anti-csrf token"));
    }
    if claims.expiry_time < now_ms {
        return Err(try_refresh("access token expired"));
    }

    Ok(claims)
}

fn decoding_key(public_key: &str) -> Result<DecodingKey> {
    let pem = if public_key.trim_start().starts_with("-----BEGIN") {
        public_key.to_string()
    } else {
        spki_pem(public_key)?
    };
    DecodingKey::from_rsa_pem(pem.as_bytes())
        .map_err(|e| try_refresh(format!("unusable signing key: {e}")))
}

/// Wrap a bare base64 `SubjectPublicKeyInfo` in PEM armour.
fn spki_pem(base64_der: &str) -> Result<String> {
    let compact: String = base64_der.split_whitespace().collect();
    let der = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| Error::TryRefreshToken(format!("signing key is not base64: {e}")))?;
    let body = STANDARD.encode(der);

    let mut pem = String::from("-----BEGIN PUBLIC KEY-----\n");
    let mut rest = body.as_str();
    while !rest.is_empty() {
        let (line, tail) = rest.split_at(rest.len().min(64));
        pem.push_str(line);
        pem.push('\n');
        rest = tail;
    }
    pem.push_str("-----END PUBLIC KEY-----\n");
    Ok(pem)
}

pub(crate) fn now_epoch_ms() -> u64 {
    let ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::from_secs(0))
        .as_millis();
    u64::try_from(ms).unwrap_or(u64::MAX)
}
