//! Error-handler capabilities.
//!
//! The host application supplies one implementation per error kind to shape
//! the HTTP answer. Cookie clearing and revocation are done by the session
//! manager before a handler runs, so handlers only decide status and body.

use serde::Serialize;

use crate::SessionError;

/// Status and body to send back for a session error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    pub status: u16,
    pub body: String,
}

pub trait TryRefreshHandler: Send + Sync {
    /// `status` is the core's configured session-expired status code.
    fn on_try_refresh(&self, message: &str, status: u16) -> ErrorResponse;
}

pub trait UnauthorizedHandler: Send + Sync {
    fn on_unauthorized(&self, message: &str, status: u16) -> ErrorResponse;
}

pub trait TheftHandler: Send + Sync {
    fn on_token_theft(&self, session_handle: &str, user_id: &str, status: u16) -> ErrorResponse;
}

pub trait GeneralErrorHandler: Send + Sync {
    fn on_general_error(&self, error: &SessionError) -> ErrorResponse;
}

/// Built-in behaviour for every error kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultErrorHandlers;

impl TryRefreshHandler for DefaultErrorHandlers {
    fn on_try_refresh(&self, _message: &str, status: u16) -> ErrorResponse {
        ErrorResponse {
            status,
            body: "try refresh token".to_string(),
        }
    }
}

impl UnauthorizedHandler for DefaultErrorHandlers {
    fn on_unauthorized(&self, _message: &str, status: u16) -> ErrorResponse {
        ErrorResponse {
            status,
            body: "unauthorised".to_string(),
        }
    }
}

impl TheftHandler for DefaultErrorHandlers {
    fn on_token_theft(&self, _session_handle: &str, _user_id: &str, status: u16) -> ErrorResponse {
        ErrorResponse {
            status,
            body: "token theft detected".to_string(),
        }
    }
}

impl GeneralErrorHandler for DefaultErrorHandlers {
    fn on_general_error(&self, error: &SessionError) -> ErrorResponse {
        ErrorResponse {
            status: 500,
            body: error.to_string(),
        }
    }
}
