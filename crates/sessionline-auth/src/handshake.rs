//! Cached handshake metadata.
//!
//! Readers take an `Arc` snapshot of a complete [`HandshakeInfo`]; writers
//! build a new struct and swap it in under the write lock, so nobody sees a
//! half-applied update. Network fetches are serialised through an async
//! mutex: callers that queue behind an in-flight fetch reuse its result.

use crate::error::{Error, Result};

use sessionline_api::{HandshakeInfo, RemoteCore};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

/// Process-wide handshake state, shared by the engines through an `Arc`.
#[derive(Debug, Default)]
pub struct HandshakeCache {
    current: RwLock<Option<Arc<HandshakeInfo>>>,
    fetch_lock: tokio::sync::Mutex<()>,
    fetches: AtomicU64,
}

impl HandshakeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cache that starts out populated.
    pub fn with_info(info: HandshakeInfo) -> Self {
        Self {
            current: RwLock::new(Some(Arc::new(info))),
            ..Self::default()
        }
    }

    /// Current value without touching the network.
    pub fn snapshot(&self) -> Result<Option<Arc<HandshakeInfo>>> {
        let guard = self
            .current
            .read()
            .map_err(|_| Error::Internal("handshake cache poisoned".to_string()))?;
        Ok(guard.clone())
    }

    /// Cached value, fetching it from the core on first use.
    pub async fn get(&self, core: &dyn RemoteCore) -> Result<Arc<HandshakeInfo>> {
        if let Some(info) = self.snapshot()? {
            return Ok(info);
        }

        let _fetching = self.fetch_lock.lock().await;
        if let Some(info) = self.snapshot()? {
            return Ok(info);
        }
        self.fetch(core).await
    }

    /// Fetch a fresh handshake even if one is cached.
    ///
    /// Callers that were waiting on someone else's fetch get that result.
    pub async fn refresh(&self, core: &dyn RemoteCore) -> Result<Arc<HandshakeInfo>> {
        let seen = self.fetches.load(Ordering::Acquire);
        let _fetching = self.fetch_lock.lock().await;
        if self.fetches.load(Ordering::Acquire) != seen {
            if let Some(info) = self.snapshot()? {
                return Ok(info);
            }
        }
        self.fetch(core).await
    }

    /// Record a signing key reported by the core.
    ///
    /// The key is only replaced when `expiry` is not older than the cached
    /// one. Returns whether the cache changed.
    pub fn update_signing_key(&self, key: &str, expiry: u64) -> Result<bool> {
        let mut guard = self
            .current
            .write()
            .map_err(|_| Error::Internal("handshake cache poisoned".to_string()))?;
        let Some(current) = guard.as_ref() else {
            // Nothing to update yet; the first get() will fetch everything.
            return Ok(false);
        };
        if expiry < current.signing_public_key_expiry {
            warn!(
                target: "sessionline::handshake",
                cached_expiry = current.signing_public_key_expiry,
                offered_expiry = expiry,
                "ignoring older signing key"
            );
            return Ok(false);
        }
        if expiry == current.signing_public_key_expiry && key == current.signing_public_key {
            return Ok(false);
        }

        let mut next = HandshakeInfo::clone(current);
        next.signing_public_key = key.to_string();
        next.signing_public_key_expiry = expiry;
        *guard = Some(Arc::new(next));
        debug!(target: "sessionline::handshake", expiry, "signing key updated");
        Ok(true)
    }

    async fn fetch(&self, core: &dyn RemoteCore) -> Result<Arc<HandshakeInfo>> {
        let fetched = core.handshake().await?;
        let installed = self.install(fetched)?;
        self.fetches.fetch_add(1, Ordering::AcqRel);
        Ok(installed)
    }

    /// Swap in a fetched handshake, keeping the cached key if it is newer.
    fn install(&self, mut fetched: HandshakeInfo) -> Result<Arc<HandshakeInfo>> {
        let mut guard = self
            .current
            .write()
            .map_err(|_| Error::Internal("handshake cache poisoned".to_string()))?;
        if let Some(current) = guard.as_ref() {
            if current.signing_public_key_expiry > fetched.signing_public_key_expiry {
                fetched
                    .signing_public_key
                    .clone_from(&current.signing_public_key);
                fetched.signing_public_key_expiry = current.signing_public_key_expiry;
            }
        }
        let info = Arc::new(fetched);
        *guard = Some(Arc::clone(&info));
        debug!(
            target: "sessionline::handshake",
            key_expiry = info.signing_public_key_expiry,
            anti_csrf = info.anti_csrf_enabled,
            blacklisting = info.access_token_blacklisting_enabled,
            "handshake installed"
        );
        Ok(info)
    }
}
