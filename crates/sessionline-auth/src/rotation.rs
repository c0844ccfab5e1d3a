//! Session creation, refresh-token rotation and revocation.

use crate::error::{Error, Result};

use sessionline_api::{
    CoreStatus, CreateSessionRequest, JsonMap, RefreshSessionRequest, RegenerateSessionRequest,
    RemoteCore, RemoveSessionsRequest, SessionRecord,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Drives the core's refresh and revocation endpoints.
pub struct SessionRotator {
    core: Arc<dyn RemoteCore>,
}

impl SessionRotator {
    pub fn new(core: Arc<dyn RemoteCore>) -> Self {
        Self { core }
    }

    /// Create a session and return its initial token triple.
    pub async fn create_session(
        &self,
        user_id: &str,
        jwt_payload: Option<JsonMap>,
        session_data: Option<JsonMap>,
    ) -> Result<SessionRecord> {
        let req = CreateSessionRequest {
            user_id: user_id.to_string(),
            jwt_payload: jwt_payload.unwrap_or_default(),
            session_data: session_data.unwrap_or_default(),
        };
        let resp = self.core.create_session(&req).await?;
        if resp.status != CoreStatus::Ok {
            return Err(Error::Core(resp.message_or("session creation failed")));
        }
        let record = resp.into_record()?;
        if !record.has_full_triple() {
            return Err(Error::Core("new session is missing tokens".to_string()));
        }
        info!(target: "sessionline::rotation", session = %record.handle, user = %record.user_id, "session created");
        Ok(record)
    }

    /// Exchange a refresh token for a new token triple.
    ///
    /// Reuse of a refresh token the core has already rotated past surfaces as
    /// [`Error::TokenTheftDetected`].
    pub async fn refresh_session(
        &self,
        refresh_token: &str,
        anti_csrf_token: Option<&str>,
    ) -> Result<SessionRecord> {
        let req = RefreshSessionRequest {
            refresh_token: refresh_token.to_string(),
            anti_csrf_token: anti_csrf_token.map(str::to_string),
        };
        let resp = self.core.refresh_session(&req).await?;

        match resp.status {
            CoreStatus::Ok => {
                let record = resp.into_record()?;
                if !record.has_full_triple() {
                    return Err(Error::Core("refresh response is missing tokens".to_string()));
                }
                info!(target: "sessionline::rotation", session = %record.handle, "session refreshed");
                Ok(record)
            }
            CoreStatus::Unauthorised => Err(Error::Unauthorized(
                resp.message_or("refresh token is not valid"),
            )),
            _ => {
                let Some(session) = resp.session else {
                    return Err(Error::Core(format!(
                        "refresh failed with {:?} and no session descriptor",
                        resp.status
                    )));
                };
                warn!(
                    target: "sessionline::rotation",
                    session = %session.handle,
                    user = %session.user_id,
                    "refresh token reuse detected"
                );
                Err(Error::TokenTheftDetected {
                    session_handle: session.handle,
                    user_id: session.user_id,
                })
            }
        }
    }

    /// Mint a new access token carrying `jwt_payload` for the same session.
    pub async fn regenerate_session(
        &self,
        access_token: &str,
        jwt_payload: Option<JsonMap>,
    ) -> Result<SessionRecord> {
        let req = RegenerateSessionRequest {
            access_token: access_token.to_string(),
            jwt_payload: jwt_payload.unwrap_or_default(),
        };
        let resp = self.core.regenerate_session(&req).await?;
        match resp.status {
            CoreStatus::Ok => resp.into_record(),
            CoreStatus::Unauthorised => Err(Error::Unauthorized(
                resp.message_or("session is not valid"),
            )),
            other => Err(Error::Core(format!("regenerate failed with {other:?}"))),
        }
    }

    /// Revoke one session. `false` if it was unknown or already revoked.
    pub async fn revoke_session(&self, session_handle: &str) -> Result<bool> {
        let revoked = self
            .revoke_multiple_sessions(&[session_handle.to_string()])
            .await?;
        Ok(revoked.iter().any(|h| h == session_handle))
    }

    /// Revoke several sessions, returning the handles actually revoked.
    pub async fn revoke_multiple_sessions(&self, session_handles: &[String]) -> Result<Vec<String>> {
        if session_handles.is_empty() {
            return Ok(Vec::new());
        }
        self.remove(RemoveSessionsRequest::ByHandles {
            session_handles: session_handles.to_vec(),
        })
        .await
    }

    pub async fn revoke_all_sessions_for_user(&self, user_id: &str) -> Result<Vec<String>> {
        self.remove(RemoveSessionsRequest::ByUser {
            user_id: user_id.to_string(),
        })
        .await
    }

    pub async fn list_session_handles_for_user(&self, user_id: &str) -> Result<Vec<String>> {
        let resp = self.core.session_handles_for_user(user_id).await?;
        if resp.status != CoreStatus::Ok {
            return Err(Error::Core(format!("listing sessions failed with {:?}", resp.status)));
        }
        Ok(resp.session_handles)
    }

    async fn remove(&self, req: RemoveSessionsRequest) -> Result<Vec<String>> {
        let resp = self.core.remove_sessions(&req).await?;
        if resp.status != CoreStatus::Ok {
            return Err(Error::Core(format!("revocation failed with {:?}", resp.status)));
        }
        info!(target: "sessionline::rotation", revoked = resp.session_handles_revoked.len(), "sessions revoked");
        Ok(resp.session_handles_revoked)
    }
}
