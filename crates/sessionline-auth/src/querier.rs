//! HTTP implementation of [`RemoteCore`].
//!
//! Hosts are tried round-robin, starting one further along on every call.
//! A host that cannot be reached hands the call to the next one; once every
//! host has failed the call reports [`Error::CoreUnreachable`]. Nothing is
//! retried against the same host.

use crate::error::{Error, Result, from_reqwest};

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use sessionline_api::{
    CreateSessionRequest, HandshakeInfo, JwtPayloadResponse, RefreshSessionRequest,
    RegenerateSessionRequest, RemoteCore, RemoveSessionsRequest, RemoveSessionsResponse,
    SessionDataResponse, SessionHandlesResponse, SessionResponse, StatusResponse,
    UpdateJwtPayloadRequest, UpdateSessionDataRequest, VerifySessionRequest,
};
use sessionline_config::{SessionlineConfig, validate_config};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

const CDI_VERSION_HEADER: &str = "cdi-version";
const API_KEY_HEADER: &str = "api-key";

pub struct HttpCoreClient {
    hosts: Vec<String>,
    cursor: AtomicUsize,
    api_key: Option<String>,
    cdi_version: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for HttpCoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpCoreClient")
            .field("hosts", &self.hosts)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("cdi_version", &self.cdi_version)
            .finish_non_exhaustive()
    }
}

impl HttpCoreClient {
    /// Build a client from validated configuration.
    pub fn from_config(config: &SessionlineConfig) -> Result<Self> {
        validate_config(config)?;
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_millis(config.core.connect_timeout_ms))
            .timeout(Duration::from_millis(config.core.request_timeout_ms))
            .build()
            .map_err(|e| from_reqwest(&e))?;
        Self::new(
            config.core.hosts.clone(),
            config.api_key()?,
            config.core.cdi_version.clone(),
            client,
        )
    }

    pub fn new(
        hosts: Vec<String>,
        api_key: Option<String>,
        cdi_version: String,
        client: reqwest::Client,
    ) -> Result<Self> {
        if hosts.is_empty() {
            return Err(Error::Config("at least one core host is required".to_string()));
        }
        Ok(Self {
            hosts,
            cursor: AtomicUsize::new(0),
            api_key,
            cdi_version,
            client,
        })
    }

    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        self.dispatch(path, |client, url| client.post(url).json(body))
            .await
    }

    async fn put<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        self.dispatch(path, |client, url| client.put(url).json(body))
            .await
    }

    async fn get<T>(&self, path: &str, query: &[(&str, &str)]) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.dispatch(path, |client, url| client.get(url).query(query))
            .await
    }

    async fn dispatch<T, F>(&self, path: &str, build: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: Fn(&reqwest::Client, &str) -> reqwest::RequestBuilder + Send + Sync,
    {
        let start = self.cursor.fetch_add(1, Ordering::Relaxed);
        let mut last_failure = None;

        for index in host_order(start, self.hosts.len()) {
            let url = format!("{}{path}", self.hosts[index]);
            let mut req = build(&self.client, &url).header(CDI_VERSION_HEADER, &self.cdi_version);
            if let Some(key) = &self.api_key {
                req = req.header(API_KEY_HEADER, key);
            }

            debug!(target: "sessionline::querier", %url, "core request");
            match req.send().await {
                Ok(resp) => return read_response(resp).await,
                Err(e) => {
                    let err = from_reqwest(&e);
                    if !matches!(err, Error::CoreUnreachable(_)) {
                        return Err(err);
                    }
                    warn!(target: "sessionline::querier", %url, error = %e, "core host unreachable");
                    last_failure = Some(err);
                }
            }
        }

        Err(last_failure
            .unwrap_or_else(|| Error::Config("at least one core host is required".to_string())))
    }
}

/// Host indices for one call, beginning at the rotating cursor.
fn host_order(start: usize, len: usize) -> impl Iterator<Item = usize> {
    (0..len).map(move |i| (start.wrapping_add(i)) % len)
}

async fn read_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
    let status = resp.status();
    let text = resp.text().await.map_err(|e| from_reqwest(&e))?;
    if !status.is_success() {
        return Err(Error::Core(format!("core returned {status}: {text}")));
    }
    Ok(serde_json::from_str(&text)?)
}

#[async_trait]
impl RemoteCore for HttpCoreClient {
    async fn handshake(&self) -> Result<HandshakeInfo> {
        self.post("/handshake", &json!({})).await
    }

    async fn create_session(&self, req: &CreateSessionRequest) -> Result<SessionResponse> {
        self.post("/session", req).await
    }

    async fn verify_session(&self, req: &VerifySessionRequest) -> Result<SessionResponse> {
        self.post("/session/verify", req).await
    }

    async fn refresh_session(&self, req: &RefreshSessionRequest) -> Result<SessionResponse> {
        self.post("/session/refresh", req).await
    }

    async fn regenerate_session(&self, req: &RegenerateSessionRequest) -> Result<SessionResponse> {
        self.post("/session/regenerate", req).await
    }

    async fn remove_sessions(&self, req: &RemoveSessionsRequest) -> Result<RemoveSessionsResponse> {
        self.post("/session/remove", req).await
    }

    async fn session_handles_for_user(&self, user_id: &str) -> Result<SessionHandlesResponse> {
        self.get("/session/user", &[("userId", user_id)]).await
    }

    async fn session_data(&self, session_handle: &str) -> Result<SessionDataResponse> {
        self.get("/session/data", &[("sessionHandle", session_handle)])
            .await
    }

    async fn update_session_data(&self, req: &UpdateSessionDataRequest) -> Result<StatusResponse> {
        self.put("/session/data", req).await
    }

    async fn jwt_payload(&self, session_handle: &str) -> Result<JwtPayloadResponse> {
        self.get("/jwt/data", &[("sessionHandle", session_handle)])
            .await
    }

    async fn update_jwt_payload(&self, req: &UpdateJwtPayloadRequest) -> Result<StatusResponse> {
        self.put("/jwt/data", req).await
    }
}
