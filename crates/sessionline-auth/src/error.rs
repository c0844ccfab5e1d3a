//! Error types.

pub use sessionline_api::{ErrorKind, SessionError as Error};

/// Crate result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Map a transport error from the HTTP client.
///
/// Connect failures and timeouts mean the core could not be reached; the
/// session state is unknown, so these never become session errors.
#[cfg(feature = "fetch-reqwest")]
pub(crate) fn from_reqwest(e: &reqwest::Error) -> Error {
    if e.is_builder() {
        Error::Config(format!("invalid core request: {e}"))
    } else if e.is_timeout() || e.is_connect() {
        Error::CoreUnreachable(e.to_string())
    } else if e.is_decode() || e.is_body() {
        Error::Core(format!("malformed core response: {e}"))
    } else {
        Error::CoreUnreachable(e.to_string())
    }
}

pub(crate) fn try_refresh(msg: impl Into<String>) -> Error {
    Error::TryRefreshToken(msg.into())
}
