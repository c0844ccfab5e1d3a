//! sessionline-api
//!
//! Shared vocabulary for the sessionline crates: token and session types, the
//! wire shapes exchanged with the session core, the [`SessionError`] taxonomy,
//! and the trait seams ([`RemoteCore`] and the error-handler capabilities)
//! that the engines are written against.

mod handlers;
mod types;
mod wire;

use async_trait::async_trait;

pub use handlers::{
    DefaultErrorHandlers, ErrorResponse, GeneralErrorHandler, TheftHandler, TryRefreshHandler,
    UnauthorizedHandler,
};
pub use types::{
    DEFAULT_SESSION_EXPIRED_STATUS, HandshakeInfo, JsonMap, SameSite, SessionRecord, Token,
};
pub use wire::{
    CoreStatus, CreateSessionRequest, JwtPayloadResponse, RefreshSessionRequest,
    RegenerateSessionRequest, RemoveSessionsRequest, RemoveSessionsResponse, SessionDataResponse,
    SessionDescriptor, SessionHandlesResponse, SessionResponse, StatusResponse,
    UpdateJwtPayloadRequest, UpdateSessionDataRequest, VerifySessionRequest,
};

/// Errors surfaced by session operations.
///
/// Only [`SessionError::Unauthorized`] and [`SessionError::TokenTheftDetected`]
/// mean the session is over; everything else leaves cookies untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The access token is not currently valid but a refresh may recover it.
    #[error("try refresh token: {0}")]
    TryRefreshToken(String),
    /// The session is invalid, revoked or expired at the core.
    #[error("unauthorised: {0}")]
    Unauthorized(String),
    /// A rotated-past refresh token was presented again.
    #[error("token theft detected for session {session_handle} (user {user_id})")]
    TokenTheftDetected {
        session_handle: String,
        user_id: String,
    },
    /// Transport failure or timeout talking to the core.
    #[error("core unreachable: {0}")]
    CoreUnreachable(String),
    /// The core answered with something we could not use.
    #[error("core error: {0}")]
    Core(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("internal error: {0}")]
    Internal(String),
}

/// Coarse classification used to pick an error handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    TryRefreshToken,
    Unauthorized,
    TokenTheftDetected,
    General,
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SessionError::TryRefreshToken(_) => ErrorKind::TryRefreshToken,
            SessionError::Unauthorized(_) => ErrorKind::Unauthorized,
            SessionError::TokenTheftDetected { .. } => ErrorKind::TokenTheftDetected,
            SessionError::CoreUnreachable(_)
            | SessionError::Core(_)
            | SessionError::Config(_)
            | SessionError::Internal(_) => ErrorKind::General,
        }
    }

    /// True if the surrounding layer must clear the session cookies.
    pub fn clears_session(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Unauthorized | ErrorKind::TokenTheftDetected
        )
    }

    pub fn is_try_refresh(&self) -> bool {
        matches!(self, SessionError::TryRefreshToken(_))
    }
}

/// A core reply that does not decode into the expected shape.
impl From<serde_json::Error> for SessionError {
    fn from(e: serde_json::Error) -> Self {
        SessionError::Core(format!("malformed core response: {e}"))
    }
}

/// The authoritative session core.
///
/// Implementations own the transport; they return the core's structured
/// answer and leave status interpretation to the engines. A transport
/// failure must surface as [`SessionError::CoreUnreachable`].
#[async_trait]
pub trait RemoteCore: Send + Sync {
    async fn handshake(&self) -> Result<HandshakeInfo, SessionError>;

    async fn create_session(
        &self,
        req: &CreateSessionRequest,
    ) -> Result<SessionResponse, SessionError>;

    async fn verify_session(
        &self,
        req: &VerifySessionRequest,
    ) -> Result<SessionResponse, SessionError>;

    async fn refresh_session(
        &self,
        req: &RefreshSessionRequest,
    ) -> Result<SessionResponse, SessionError>;

    async fn regenerate_session(
        &self,
        req: &RegenerateSessionRequest,
    ) -> Result<SessionResponse, SessionError>;

    async fn remove_sessions(
        &self,
        req: &RemoveSessionsRequest,
    ) -> Result<RemoveSessionsResponse, SessionError>;

    async fn session_handles_for_user(
        &self,
        user_id: &str,
    ) -> Result<SessionHandlesResponse, SessionError>;

    async fn session_data(&self, session_handle: &str)
    -> Result<SessionDataResponse, SessionError>;

    async fn update_session_data(
        &self,
        req: &UpdateSessionDataRequest,
    ) -> Result<StatusResponse, SessionError>;

    async fn jwt_payload(&self, session_handle: &str) -> Result<JwtPayloadResponse, SessionError>;

    async fn update_jwt_payload(
        &self,
        req: &UpdateJwtPayloadRequest,
    ) -> Result<StatusResponse, SessionError>;
}
