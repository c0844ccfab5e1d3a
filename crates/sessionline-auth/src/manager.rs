//! Request-level session API.
//!
//! [`SessionManager`] wires the engines to one core, one handshake cache and
//! one cookie projection. Operations that end in a response return the
//! header mutations to apply alongside the record; failures go through
//! [`SessionManager::handle_error`], which is the only place cookies are
//! cleared.

use crate::cookie::{CookieProjection, HeaderMutations, RequestTokens};
use crate::data::SessionDataClient;
use crate::error::{Error, ErrorKind, Result, try_refresh};
use crate::handlers::{ErrorHandlers, ErrorOutcome};
use crate::handshake::HandshakeCache;
use crate::rotation::SessionRotator;
use crate::verify::SessionVerifier;

use sessionline_api::{HandshakeInfo, JsonMap, RemoteCore, SessionRecord};
use std::sync::Arc;
use tracing::warn;

/// A session together with the headers that carry it back to the client.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOutcome {
    pub record: SessionRecord,
    pub mutations: HeaderMutations,
}

pub struct SessionManager {
    core: Arc<dyn RemoteCore>,
    handshake: Arc<HandshakeCache>,
    verifier: SessionVerifier,
    rotator: SessionRotator,
    data: SessionDataClient,
    cookies: CookieProjection,
    handlers: ErrorHandlers,
}

impl SessionManager {
    pub fn new(core: Arc<dyn RemoteCore>, cookies: CookieProjection) -> Self {
        let handshake = Arc::new(HandshakeCache::new());
        Self {
            verifier: SessionVerifier::new(Arc::clone(&core), Arc::clone(&handshake)),
            rotator: SessionRotator::new(Arc::clone(&core)),
            data: SessionDataClient::new(Arc::clone(&core)),
            core,
            handshake,
            cookies,
            handlers: ErrorHandlers::default(),
        }
    }

    /// Connect to the core described by `config` over HTTP.
    #[cfg(feature = "fetch-reqwest")]
    pub fn from_config(config: &sessionline_config::SessionlineConfig) -> Result<Self> {
        let core = crate::querier::HttpCoreClient::from_config(config)?;
        Ok(Self::new(
            Arc::new(core),
            CookieProjection::new(config.cookies.clone()),
        ))
    }

    /// Share a handshake cache, e.g. between managers or with a pre-seeded
    /// value.
    #[must_use]
    pub fn with_handshake_cache(mut self, handshake: Arc<HandshakeCache>) -> Self {
        self.verifier = SessionVerifier::new(Arc::clone(&self.core), Arc::clone(&handshake));
        self.handshake = handshake;
        self
    }

    #[must_use]
    pub fn with_error_handlers(mut self, handlers: ErrorHandlers) -> Self {
        self.handlers = handlers;
        self
    }

    pub fn cookies(&self) -> &CookieProjection {
        &self.cookies
    }

    pub async fn handshake(&self) -> Result<Arc<HandshakeInfo>> {
        self.handshake.get(self.core.as_ref()).await
    }

    /// Re-fetch the handshake, e.g. after the core changed its feature flags.
    pub async fn refresh_handshake(&self) -> Result<Arc<HandshakeInfo>> {
        self.handshake.refresh(self.core.as_ref()).await
    }

    /// Create a session and the cookies for its token triple.
    pub async fn create_session(
        &self,
        user_id: &str,
        jwt_payload: Option<JsonMap>,
        session_data: Option<JsonMap>,
    ) -> Result<SessionOutcome> {
        let record = self
            .rotator
            .create_session(user_id, jwt_payload, session_data)
            .await?;
        let mutations = self.cookies.full_triple_headers(&record)?;
        Ok(SessionOutcome { record, mutations })
    }

    pub async fn verify_session(
        &self,
        access_token: &str,
        anti_csrf_token: Option<&str>,
        do_anti_csrf_check: bool,
    ) -> Result<SessionRecord> {
        self.verifier
            .verify_session(access_token, anti_csrf_token, do_anti_csrf_check)
            .await
    }

    pub async fn refresh_session(
        &self,
        refresh_token: &str,
        anti_csrf_token: Option<&str>,
    ) -> Result<SessionRecord> {
        self.rotator
            .refresh_session(refresh_token, anti_csrf_token)
            .await
    }

    /// Verify the session a request carries.
    ///
    /// A missing access token is [`Error::TryRefreshToken`]: the client may
    /// still hold a refresh token.
    pub async fn get_session(
        &self,
        tokens: &RequestTokens,
        do_anti_csrf_check: bool,
    ) -> Result<SessionOutcome> {
        let Some(access_token) = tokens.access_token.as_deref() else {
            return Err(try_refresh("access token missing in cookies"));
        };
        let record = self
            .verifier
            .verify_session(
                access_token,
                tokens.anti_csrf_token.as_deref(),
                do_anti_csrf_check,
            )
            .await?;
        let mutations = match &record.access_token {
            Some(token) => self.cookies.access_token_headers(token)?,
            None => HeaderMutations::new(),
        };
        Ok(SessionOutcome { record, mutations })
    }

    /// Rotate the refresh token a request carries.
    pub async fn refresh_from_request(&self, tokens: &RequestTokens) -> Result<SessionOutcome> {
        let Some(refresh_token) = tokens.refresh_token.as_deref() else {
            return Err(Error::Unauthorized(
                "refresh token missing in cookies; check the refresh API path".to_string(),
            ));
        };
        let record = self
            .rotator
            .refresh_session(refresh_token, tokens.anti_csrf_token.as_deref())
            .await?;
        let mutations = self.cookies.full_triple_headers(&record)?;
        Ok(SessionOutcome { record, mutations })
    }

    /// Mint a new access token with `jwt_payload` for the session behind
    /// `access_token`.
    pub async fn regenerate_session(
        &self,
        access_token: &str,
        jwt_payload: Option<JsonMap>,
    ) -> Result<SessionOutcome> {
        let record = self
            .rotator
            .regenerate_session(access_token, jwt_payload)
            .await?;
        let mutations = self.cookies.session_headers(&record)?;
        Ok(SessionOutcome { record, mutations })
    }

    pub async fn revoke_session(&self, session_handle: &str) -> Result<bool> {
        self.rotator.revoke_session(session_handle).await
    }

    pub async fn revoke_multiple_sessions(&self, session_handles: &[String]) -> Result<Vec<String>> {
        self.rotator.revoke_multiple_sessions(session_handles).await
    }

    pub async fn revoke_all_sessions_for_user(&self, user_id: &str) -> Result<Vec<String>> {
        self.rotator.revoke_all_sessions_for_user(user_id).await
    }

    pub async fn list_session_handles_for_user(&self, user_id: &str) -> Result<Vec<String>> {
        self.rotator.list_session_handles_for_user(user_id).await
    }

    pub async fn get_session_data(&self, session_handle: &str) -> Result<JsonMap> {
        self.data.get_session_data(session_handle).await
    }

    pub async fn update_session_data(&self, session_handle: &str, data: JsonMap) -> Result<()> {
        self.data.update_session_data(session_handle, data).await
    }

    pub async fn get_jwt_payload(&self, session_handle: &str) -> Result<JsonMap> {
        self.data.get_jwt_payload(session_handle).await
    }

    pub async fn update_jwt_payload(&self, session_handle: &str, payload: JsonMap) -> Result<()> {
        self.data.update_jwt_payload(session_handle, payload).await
    }

    /// Headers for a CORS pre-flight response.
    pub fn options_headers(&self) -> HeaderMutations {
        self.cookies.options_headers()
    }

    /// Turn a failed operation into a response.
    ///
    /// Theft revokes the session first. Unauthorized and theft clear the
    /// session cookies; nothing else touches them.
    pub async fn handle_error(&self, error: &Error) -> ErrorOutcome {
        if let Error::TokenTheftDetected {
            session_handle,
            user_id,
        } = error
        {
            warn!(
                target: "sessionline::manager",
                session = %session_handle,
                user = %user_id,
                "token theft detected, revoking session"
            );
            if let Err(e) = self.rotator.revoke_session(session_handle).await {
                warn!(target: "sessionline::manager", session = %session_handle, error = %e, "revocation after theft failed");
            }
        }

        if error.kind() == ErrorKind::General {
            return self.general_outcome(error);
        }

        let info = match self.handshake.get(self.core.as_ref()).await {
            Ok(info) => info,
            Err(e) => return self.general_outcome(&e),
        };
        let mutations = if error.clears_session() {
            match self.cookies.clear_headers(&info) {
                Ok(m) => m,
                Err(e) => return self.general_outcome(&e),
            }
        } else {
            HeaderMutations::new()
        };

        ErrorOutcome {
            response: self
                .handlers
                .dispatch(error, Some(info.session_expired_status_code)),
            mutations,
        }
    }

    fn general_outcome(&self, error: &Error) -> ErrorOutcome {
        ErrorOutcome {
            response: self.handlers.dispatch(error, None),
            mutations: HeaderMutations::new(),
        }
    }
}
