//! Session data and JWT payload accessors.
//!
//! Handle-keyed pass-throughs to the core. Nothing is cached locally; a
//! payload update only reaches clients once their access token is reissued.

use crate::error::{Error, Result};

use sessionline_api::{
    CoreStatus, JsonMap, RemoteCore, UpdateJwtPayloadRequest, UpdateSessionDataRequest,
};
use std::sync::Arc;

pub struct SessionDataClient {
    core: Arc<dyn RemoteCore>,
}

impl SessionDataClient {
    pub fn new(core: Arc<dyn RemoteCore>) -> Self {
        Self { core }
    }

    pub async fn get_session_data(&self, session_handle: &str) -> Result<JsonMap> {
        let resp = self.core.session_data(session_handle).await?;
        check(resp.status, resp.message.as_deref())?;
        Ok(resp.session_data.unwrap_or_default())
    }

    pub async fn update_session_data(&self, session_handle: &str, data: JsonMap) -> Result<()> {
        let req = UpdateSessionDataRequest {
            session_handle: session_handle.to_string(),
            session_data: data,
        };
        let resp = self.core.update_session_data(&req).await?;
        check(resp.status, resp.message.as_deref())
    }

    pub async fn get_jwt_payload(&self, session_handle: &str) -> Result<JsonMap> {
        let resp = self.core.jwt_payload(session_handle).await?;
        check(resp.status, resp.message.as_deref())?;
        Ok(resp.jwt_payload.unwrap_or_default())
    }

    pub async fn update_jwt_payload(&self, session_handle: &str, payload: JsonMap) -> Result<()> {
        let req = UpdateJwtPayloadRequest {
            session_handle: session_handle.to_string(),
            jwt_payload: payload,
        };
        let resp = self.core.update_jwt_payload(&req).await?;
        check(resp.status, resp.message.as_deref())
    }
}

fn check(status: CoreStatus, message: Option<&str>) -> Result<()> {
    match status {
        CoreStatus::Ok => Ok(()),
        CoreStatus::Unauthorised => Err(Error::Unauthorized(
            message.unwrap_or("session does not exist").to_string(),
        )),
        other => Err(Error::Core(format!(
            "unexpected status {other:?}: {}",
            message.unwrap_or("no message")
        ))),
    }
}
