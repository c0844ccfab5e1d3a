//! Session verification: local fast path, remote slow path.
//!
//! A request is accepted locally only when the cached signing key is fresh,
//! the access token verifies, and none of the trust rules below asks for the
//! core. Every rule that fires sends the request to the core instead; none of
//! them rejects on its own.

use crate::access_token::{AccessTokenClaims, now_epoch_ms, verify_access_token_at};
use crate::error::{Error, Result};
use crate::handshake::HandshakeCache;

use sessionline_api::{CoreStatus, HandshakeInfo, RemoteCore, SessionRecord, VerifySessionRequest};
use std::sync::Arc;
use tracing::debug;

/// Why a request could not be settled locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteReason {
    /// The cached signing key is past its expiry.
    SigningKeyExpired,
    /// Local verification failed in a way a refresh could fix.
    TokenNeedsRefresh,
    /// Anti-CSRF is required and the tokens are missing or differ.
    AntiCsrfUnconfirmed,
    /// Only the core knows whether the token was blacklisted.
    BlacklistingEnabled,
    /// The token descends from a refresh the core has not confirmed.
    LineageUnconfirmed,
}

/// Outcome of the local stage.
#[derive(Debug, Clone, PartialEq)]
pub enum FastPath {
    Accepted(SessionRecord),
    Rejected(RemoteReason),
}

/// What the trust rules look at.
#[derive(Debug, Clone, Copy)]
pub struct TrustInputs<'a> {
    pub claims: &'a AccessTokenClaims,
    pub anti_csrf_enabled: bool,
    pub blacklisting_enabled: bool,
    pub do_anti_csrf_check: bool,
    pub supplied_anti_csrf: Option<&'a str>,
}

type TrustRule = fn(&TrustInputs<'_>) -> bool;

/// Evaluated in order; the first rule that fires decides.
const TRUST_RULES: [(RemoteReason, TrustRule); 3] = [
    (RemoteReason::AntiCsrfUnconfirmed, anti_csrf_unconfirmed),
    (RemoteReason::BlacklistingEnabled, blacklisting_enabled),
    (RemoteReason::LineageUnconfirmed, lineage_unconfirmed),
];

fn anti_csrf_unconfirmed(inputs: &TrustInputs<'_>) -> bool {
    if !(inputs.anti_csrf_enabled && inputs.do_anti_csrf_check) {
        return false;
    }
    match (inputs.supplied_anti_csrf, inputs.claims.anti_csrf_token.as_deref()) {
        (Some(supplied), Some(embedded)) => supplied != embedded,
        _ => true,
    }
}

fn blacklisting_enabled(inputs: &TrustInputs<'_>) -> bool {
    inputs.blacklisting_enabled
}

fn lineage_unconfirmed(inputs: &TrustInputs<'_>) -> bool {
    inputs.claims.parent_refresh_token_hash.is_some()
}

/// Run the trust rules against decoded claims.
///
/// `None` means the token can be trusted without asking the core.
pub fn evaluate_trust(inputs: &TrustInputs<'_>) -> Option<RemoteReason> {
    TRUST_RULES
        .iter()
        .find(|(_, fires)| fires(inputs))
        .map(|(reason, _)| *reason)
}

/// Decides per request between local acceptance and a call to the core.
pub struct SessionVerifier {
    core: Arc<dyn RemoteCore>,
    handshake: Arc<HandshakeCache>,
}

impl SessionVerifier {
    pub fn new(core: Arc<dyn RemoteCore>, handshake: Arc<HandshakeCache>) -> Self {
        Self { core, handshake }
    }

    /// Verify a session from its access token.
    ///
    /// Fails with [`Error::Unauthorized`] or [`Error::TryRefreshToken`]; a
    /// transport failure surfaces as [`Error::CoreUnreachable`].
    pub async fn verify_session(
        &self,
        access_token: &str,
        anti_csrf_token: Option<&str>,
        do_anti_csrf_check: bool,
    ) -> Result<SessionRecord> {
        self.verify_session_at(access_token, anti_csrf_token, do_anti_csrf_check, now_epoch_ms())
            .await
    }

    pub(crate) async fn verify_session_at(
        &self,
        access_token: &str,
        anti_csrf_token: Option<&str>,
        do_anti_csrf_check: bool,
        now_ms: u64,
    ) -> Result<SessionRecord> {
        let info = self.handshake.get(self.core.as_ref()).await?;

        match fast_path(&info, access_token, anti_csrf_token, do_anti_csrf_check, now_ms)? {
            FastPath::Accepted(record) => {
                debug!(
                    target: "sessionline::verify",
                    session = %record.handle,
                    "session accepted locally"
                );
                return Ok(record);
            }
            FastPath::Rejected(reason) => {
                debug!(target: "sessionline::verify", ?reason, "verifying with core");
            }
        }

        self.verify_remotely(access_token, anti_csrf_token, do_anti_csrf_check)
            .await
    }

    async fn verify_remotely(
        &self,
        access_token: &str,
        anti_csrf_token: Option<&str>,
        do_anti_csrf_check: bool,
    ) -> Result<SessionRecord> {
        let req = VerifySessionRequest {
            access_token: access_token.to_string(),
            anti_csrf_token: anti_csrf_token.map(str::to_string),
            do_anti_csrf_check,
        };
        let resp = self.core.verify_session(&req).await?;

        match resp.status {
            CoreStatus::Ok => {
                if let (Some(key), Some(expiry)) = (
                    resp.jwt_signing_public_key.as_deref(),
                    resp.jwt_signing_public_key_expiry_time,
                ) {
                    self.handshake.update_signing_key(key, expiry)?;
                }
                resp.into_record()
            }
            CoreStatus::Unauthorised => Err(Error::Unauthorized(
                resp.message_or("session is not valid"),
            )),
            _ => Err(Error::TryRefreshToken(
                resp.message_or("access token needs refresh"),
            )),
        }
    }
}

/// The local stage of verification. Never performs I/O.
pub fn fast_path(
    info: &HandshakeInfo,
    access_token: &str,
    anti_csrf_token: Option<&str>,
    do_anti_csrf_check: bool,
    now_ms: u64,
) -> Result<FastPath> {
    if !info.signing_key_valid_at(now_ms) {
        return Ok(FastPath::Rejected(RemoteReason::SigningKeyExpired));
    }

    let require_anti_csrf = info.anti_csrf_enabled && do_anti_csrf_check;
    let claims = match verify_access_token_at(
        access_token,
        &info.signing_public_key,
        require_anti_csrf,
        now_ms,
    ) {
        Ok(claims) => claims,
        Err(e) if e.is_try_refresh() => {
            return Ok(FastPath::Rejected(RemoteReason::TokenNeedsRefresh));
        }
        Err(e) => return Err(e),
    };

    let inputs = TrustInputs {
        claims: &claims,
        anti_csrf_enabled: info.anti_csrf_enabled,
        blacklisting_enabled: info.access_token_blacklisting_enabled,
        do_anti_csrf_check,
        supplied_anti_csrf: anti_csrf_token,
    };
    if let Some(reason) = evaluate_trust(&inputs) {
        return Ok(FastPath::Rejected(reason));
    }

    Ok(FastPath::Accepted(SessionRecord::unchanged(
        claims.session_handle,
        claims.user_id,
        claims.user_data,
    )))
}
