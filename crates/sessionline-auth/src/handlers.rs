//! Error handler dispatch.

use crate::cookie::HeaderMutations;
use crate::error::{Error, ErrorKind};

use sessionline_api::{
    DEFAULT_SESSION_EXPIRED_STATUS, DefaultErrorHandlers, ErrorResponse, GeneralErrorHandler,
    TheftHandler, TryRefreshHandler, UnauthorizedHandler,
};
use std::sync::Arc;

/// One handler per error kind, fixed at construction.
#[derive(Clone)]
pub struct ErrorHandlers {
    try_refresh: Arc<dyn TryRefreshHandler>,
    unauthorized: Arc<dyn UnauthorizedHandler>,
    theft: Arc<dyn TheftHandler>,
    general: Arc<dyn GeneralErrorHandler>,
}

impl Default for ErrorHandlers {
    fn default() -> Self {
        let defaults = Arc::new(DefaultErrorHandlers);
        Self {
            try_refresh: defaults.clone(),
            unauthorized: defaults.clone(),
            theft: defaults.clone(),
            general: defaults,
        }
    }
}

impl std::fmt::Debug for ErrorHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorHandlers").finish_non_exhaustive()
    }
}

impl ErrorHandlers {
    #[must_use]
    pub fn with_try_refresh(mut self, handler: Arc<dyn TryRefreshHandler>) -> Self {
        self.try_refresh = handler;
        self
    }

    #[must_use]
    pub fn with_unauthorized(mut self, handler: Arc<dyn UnauthorizedHandler>) -> Self {
        self.unauthorized = handler;
        self
    }

    #[must_use]
    pub fn with_theft(mut self, handler: Arc<dyn TheftHandler>) -> Self {
        self.theft = handler;
        self
    }

    #[must_use]
    pub fn with_general(mut self, handler: Arc<dyn GeneralErrorHandler>) -> Self {
        self.general = handler;
        self
    }

    /// Route `error` to the handler for its kind.
    ///
    /// `status` is the session-expired status code; general errors choose
    /// their own.
    pub fn dispatch(&self, error: &Error, status: Option<u16>) -> ErrorResponse {
        let status = status.unwrap_or(DEFAULT_SESSION_EXPIRED_STATUS);
        match error {
            Error::TryRefreshToken(msg) => self.try_refresh.on_try_refresh(msg, status),
            Error::Unauthorized(msg) => self.unauthorized.on_unauthorized(msg, status),
            Error::TokenTheftDetected {
                session_handle,
                user_id,
            } => self.theft.on_token_theft(session_handle, user_id, status),
            other => {
                debug_assert_eq!(other.kind(), ErrorKind::General);
                self.general.on_general_error(other)
            }
        }
    }
}

/// What to send back for a failed session operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorOutcome {
    pub response: ErrorResponse,
    /// Cookie clearing, when the error ends the session.
    pub mutations: HeaderMutations,
}
