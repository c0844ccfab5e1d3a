use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON object used for JWT payloads and session data.
pub type JsonMap = serde_json::Map<String, Value>;

/// Status code the core asks clients to use for expired sessions.
pub const DEFAULT_SESSION_EXPIRED_STATUS: u16 = 440;

/// SameSite cookie attribute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SameSite {
    /// SameSite=Strict
    #[serde(alias = "Strict")]
    Strict,
    /// SameSite=Lax
    #[default]
    #[serde(alias = "Lax")]
    Lax,
    /// SameSite=None
    #[serde(alias = "None")]
    None,
}

impl SameSite {
    pub fn as_str(self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

/// One issued token (access, refresh or id-refresh) with its cookie attributes.
///
/// Tokens are never mutated; rotation issues new ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    /// Opaque token value.
    #[serde(rename = "token")]
    pub value: String,
    /// Expiry, epoch milliseconds.
    #[serde(rename = "expiry")]
    pub expires_at: u64,
    /// Creation time, epoch milliseconds.
    #[serde(rename = "createdTime")]
    pub created_at: u64,
    pub cookie_path: String,
    #[serde(rename = "domain", default)]
    pub cookie_domain: Option<String>,
    pub cookie_secure: bool,
    #[serde(default)]
    pub same_site: SameSite,
}

/// Outcome of a create, verify, refresh or regenerate call.
///
/// Token fields are `None` when nothing was reissued, which is always the
/// case for a session accepted on the local fast path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionRecord {
    pub handle: String,
    pub user_id: String,
    pub jwt_payload: JsonMap,
    pub access_token: Option<Token>,
    pub refresh_token: Option<Token>,
    pub id_refresh_token: Option<Token>,
    pub anti_csrf_token: Option<String>,
}

impl SessionRecord {
    /// A session confirmed without any token being reissued.
    pub fn unchanged(handle: String, user_id: String, jwt_payload: JsonMap) -> Self {
        Self {
            handle,
            user_id,
            jwt_payload,
            access_token: None,
            refresh_token: None,
            id_refresh_token: None,
            anti_csrf_token: None,
        }
    }

    /// True if the record carries a complete new token triple.
    pub fn has_full_triple(&self) -> bool {
        self.access_token.is_some() && self.refresh_token.is_some() && self.id_refresh_token.is_some()
    }
}

/// Cached metadata about the core: signing key and feature flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandshakeInfo {
    #[serde(rename = "jwtSigningPublicKey")]
    pub signing_public_key: String,
    /// Epoch milliseconds after which the key must not be trusted locally.
    #[serde(rename = "jwtSigningPublicKeyExpiryTime")]
    pub signing_public_key_expiry: u64,
    #[serde(rename = "enableAntiCsrf")]
    pub anti_csrf_enabled: bool,
    pub access_token_blacklisting_enabled: bool,
    #[serde(default = "default_true")]
    pub session_data_in_database: bool,
    #[serde(default)]
    pub cookie_domain: Option<String>,
    pub cookie_secure: bool,
    pub access_token_path: String,
    pub refresh_token_path: String,
    pub id_refresh_token_path: String,
    #[serde(default)]
    pub cookie_same_site: SameSite,
    #[serde(default = "default_session_expired_status")]
    pub session_expired_status_code: u16,
}

impl HandshakeInfo {
    /// True while the cached signing key may be used for local verification.
    pub fn signing_key_valid_at(&self, now_ms: u64) -> bool {
        self.signing_public_key_expiry > now_ms
    }
}

fn default_true() -> bool {
    true
}

fn default_session_expired_status() -> u16 {
    DEFAULT_SESSION_EXPIRED_STATUS
}
