//! Request and response bodies exchanged with the session core.

use serde::{Deserialize, Serialize};

use crate::types::{JsonMap, SessionRecord, Token};
use crate::SessionError;

/// `status` field carried by every core response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CoreStatus {
    Ok,
    Unauthorised,
    TryRefreshToken,
    TokenTheftDetected,
    #[serde(other)]
    Other,
}

/// Session identity embedded in core responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDescriptor {
    pub handle: String,
    pub user_id: String,
    #[serde(rename = "userDataInJWT", default)]
    pub user_data_in_jwt: JsonMap,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub user_id: String,
    #[serde(rename = "userDataInJWT")]
    pub jwt_payload: JsonMap,
    #[serde(rename = "userDataInDatabase")]
    pub session_data: JsonMap,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifySessionRequest {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anti_csrf_token: Option<String>,
    pub do_anti_csrf_check: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshSessionRequest {
    pub refresh_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anti_csrf_token: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegenerateSessionRequest {
    pub access_token: String,
    #[serde(rename = "userDataInJWT")]
    pub jwt_payload: JsonMap,
}

/// Revoke by explicit handles, or every session of one user.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum RemoveSessionsRequest {
    ByHandles {
        #[serde(rename = "sessionHandles")]
        session_handles: Vec<String>,
    },
    ByUser {
        #[serde(rename = "userId")]
        user_id: String,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSessionDataRequest {
    pub session_handle: String,
    #[serde(rename = "userDataInDatabase")]
    pub session_data: JsonMap,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateJwtPayloadRequest {
    pub session_handle: String,
    #[serde(rename = "userDataInJWT")]
    pub jwt_payload: JsonMap,
}

/// Shared body of the create/verify/refresh/regenerate responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub status: CoreStatus,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub session: Option<SessionDescriptor>,
    #[serde(default)]
    pub access_token: Option<Token>,
    #[serde(default)]
    pub refresh_token: Option<Token>,
    #[serde(default)]
    pub id_refresh_token: Option<Token>,
    #[serde(default)]
    pub anti_csrf_token: Option<String>,
    #[serde(default)]
    pub jwt_signing_public_key: Option<String>,
    #[serde(default)]
    pub jwt_signing_public_key_expiry_time: Option<u64>,
}

impl SessionResponse {
    /// A bare response carrying only a status, as the core sends for failures.
    pub fn with_status(status: CoreStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: Some(message.into()),
            session: None,
            access_token: None,
            refresh_token: None,
            id_refresh_token: None,
            anti_csrf_token: None,
            jwt_signing_public_key: None,
            jwt_signing_public_key_expiry_time: None,
        }
    }

    pub fn message_or(&self, fallback: &str) -> String {
        self.message.clone().unwrap_or_else(|| fallback.to_string())
    }

    /// Convert a successful response into a record.
    ///
    /// Rejects responses whose session descriptor is missing or has an empty
    /// handle or user id.
    pub fn into_record(self) -> Result<SessionRecord, SessionError> {
        let session = self
            .session
            .ok_or_else(|| SessionError::Core("response missing session".to_string()))?;
        if session.handle.is_empty() || session.user_id.is_empty() {
            return Err(SessionError::Core(
                "response session has empty handle or userId".to_string(),
            ));
        }
        Ok(SessionRecord {
            handle: session.handle,
            user_id: session.user_id,
            jwt_payload: session.user_data_in_jwt,
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            id_refresh_token: self.id_refresh_token,
            anti_csrf_token: self.anti_csrf_token,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveSessionsResponse {
    pub status: CoreStatus,
    #[serde(default)]
    pub session_handles_revoked: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionHandlesResponse {
    pub status: CoreStatus,
    #[serde(default)]
    pub session_handles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDataResponse {
    pub status: CoreStatus,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(rename = "userDataInDatabase", default)]
    pub session_data: Option<JsonMap>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JwtPayloadResponse {
    pub status: CoreStatus,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(rename = "userDataInJWT", default)]
    pub jwt_payload: Option<JsonMap>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub status: CoreStatus,
    #[serde(default)]
    pub message: Option<String>,
}
