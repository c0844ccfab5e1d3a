//! sessionline-auth
//!
//! Client-side session management against a remote session core.
//! It focuses on four recurring problems:
//!
//! - **Verifying access tokens locally** when the cached signing key and the
//!   trust rules allow it, and asking the core otherwise
//! - **Rotating refresh tokens** and reporting reuse as token theft
//! - **Projecting tokens onto cookies and headers** as complete batches
//! - **Revoking sessions** and reading or updating per-session data
//!
//! The entry point is `SessionManager`, built from a `RemoteCore` (usually
//! the HTTP `HttpCoreClient`) and a `CookieProjection`.
//!
//! ## Quick start
//! ```no_run
//! use sessionline_auth::SessionManager;
//! use sessionline_config::SessionlineConfig;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = SessionManager::from_config(&SessionlineConfig::default())?;
//! let tokens = manager
//!     .cookies()
//!     .read_request(Some("sAccessToken=eyJ..."), [("anti-csrf", "...")]);
//!
//! match manager.get_session(&tokens, true).await {
//!     Ok(session) => println!("user={}", session.record.user_id),
//!     Err(err) => {
//!         let outcome = manager.handle_error(&err).await;
//!         println!("{} {}", outcome.response.status, outcome.response.body);
//!     }
//! }
//! # Ok(()) }
//! ```

#![forbid(unsafe_code)]

mod access_token;
mod cookie;
mod data;
mod error;
mod handlers;
mod handshake;
mod manager;
#[cfg(feature = "fetch-reqwest")]
mod querier;
mod rotation;
mod verify;

#[cfg(test)]
mod testing;

pub use access_token::{AccessTokenClaims, verify_access_token, verify_access_token_at};
pub use cookie::{
    ALLOW_CREDENTIALS, ALLOW_HEADERS, CookieOptions, CookieProjection, EXPOSE_HEADERS,
    HeaderMutations, ID_REFRESH_REMOVED, RequestTokens, SET_COOKIE, build_clear_cookie,
    build_set_cookie, parse_cookie_header,
};
pub use data::SessionDataClient;
pub use error::{Error, ErrorKind, Result};
pub use handlers::{ErrorHandlers, ErrorOutcome};
pub use handshake::HandshakeCache;
pub use manager::{SessionManager, SessionOutcome};
#[cfg(feature = "fetch-reqwest")]
pub use querier::HttpCoreClient;
pub use rotation::SessionRotator;
pub use verify::{FastPath, RemoteReason, SessionVerifier, TrustInputs, evaluate_trust, fast_path};
