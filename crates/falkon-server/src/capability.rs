//! Startup capability gating.
//!
//! Two external credentials are optional: the auth publishable key and the
//! data-service URL. Each is probed exactly once at startup and turned into
//! one of two statically typed implementations, which [`AppState`] then
//! carries to every handler:
//!
//! | Setting           | Usable                  | Missing or malformed   |
//! |-------------------|-------------------------|------------------------|
//! | publishable key   | [`PublishableKeyAuth`]  | [`AnonymousAuth`]      |
//! | data URL          | [`MessageStore`]        | [`DetachedMessages`]   |
//!
//! Nothing here is fatal. Degradation is logged and the server keeps going.
//!
//! [`AppState`]: crate::state::AppState

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use falkon_core::service::{DetachedMessages, MessageService};
use falkon_core::store::MessageStore;
use falkon_storage::{MemoryBackend, StorageBackend};
use tracing::{error, info, warn};

use crate::auth::{AnonymousAuth, AuthProvider, PublishableKeyAuth};

/// The sample key shipped in environment templates. Treated as absent.
pub const PLACEHOLDER_PUBLISHABLE_KEY: &str =
    "pk_test_XXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXX";

/// Required prefix of every publishable key.
const PUBLISHABLE_KEY_PREFIX: &str = "pk_";

/// Why a publishable key was not used.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyRejection {
    #[error("auth publishable key not set")]
    Missing,
    #[error("auth publishable key is still the placeholder value")]
    Placeholder,
    #[error("auth publishable key does not start with 'pk_'")]
    BadPrefix,
}

/// Validate a raw publishable key.
///
/// # Errors
///
/// Returns the [`KeyRejection`] describing why the key is unusable.
pub fn parse_publishable_key(raw: Option<&str>) -> Result<String, KeyRejection> {
    let key = raw.map(str::trim).filter(|k| !k.is_empty());
    match key {
        None => Err(KeyRejection::Missing),
        Some(PLACEHOLDER_PUBLISHABLE_KEY) => Err(KeyRejection::Placeholder),
        Some(k) if !k.starts_with(PUBLISHABLE_KEY_PREFIX) => Err(KeyRejection::BadPrefix),
        Some(k) => Ok(k.to_owned()),
    }
}

/// A parsed `FALKON_DATA_URL`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataUrl {
    /// `memory:`: in-process, lost on restart.
    Memory,
    /// `redb://<path>`: redb database file.
    Redb(PathBuf),
    /// `rocksdb://<path>`: `RocksDB` directory.
    RocksDb(PathBuf),
}

/// Why a data URL could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DataUrlError {
    #[error("data URL is not a valid URL: {reason}")]
    Invalid { reason: String },
    #[error("unsupported data URL scheme '{scheme}' (expected memory, redb, or rocksdb)")]
    UnknownScheme { scheme: String },
    #[error("data URL for '{scheme}' has no path")]
    MissingPath { scheme: String },
}

impl FromStr for DataUrl {
    type Err = DataUrlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let url = url::Url::parse(s.trim()).map_err(|e| DataUrlError::Invalid {
            reason: e.to_string(),
        })?;

        let scheme = url.scheme().to_owned();
        if scheme == "memory" {
            return Ok(Self::Memory);
        }
        if scheme != "redb" && scheme != "rocksdb" {
            return Err(DataUrlError::UnknownScheme { scheme });
        }

        // `redb:///abs/path` has no host; `redb://data/file.redb` puts the
        // first relative segment in the host position.
        let raw_path = match url.host_str() {
            Some(host) => format!("{host}{}", url.path()),
            None => url.path().to_owned(),
        };
        let path = urlencoding::decode(&raw_path)
            .map_err(|e| DataUrlError::Invalid {
                reason: e.to_string(),
            })?
            .into_owned();
        if path.is_empty() || path == "/" {
            return Err(DataUrlError::MissingPath { scheme });
        }

        let path = PathBuf::from(path);
        Ok(if scheme == "redb" {
            Self::Redb(path)
        } else {
            Self::RocksDb(path)
        })
    }
}

/// Open the backend named by a data URL.
///
/// # Errors
///
/// Returns a description of the failure if the backend cannot be opened or
/// was not compiled in.
fn open_backend(url: &DataUrl) -> Result<Arc<dyn StorageBackend>, String> {
    match url {
        DataUrl::Memory => Ok(Arc::new(MemoryBackend::new())),
        #[cfg(feature = "redb-backend")]
        DataUrl::Redb(path) => falkon_storage::RedbBackend::open(path)
            .map(|b| Arc::new(b) as Arc<dyn StorageBackend>)
            .map_err(|e| e.to_string()),
        #[cfg(not(feature = "redb-backend"))]
        DataUrl::Redb(_) => Err("redb backend requested but feature 'redb-backend' is not enabled".to_owned()),
        #[cfg(feature = "rocksdb-backend")]
        DataUrl::RocksDb(path) => falkon_storage::RocksDbBackend::open(path)
            .map(|b| Arc::new(b) as Arc<dyn StorageBackend>)
            .map_err(|e| e.to_string()),
        #[cfg(not(feature = "rocksdb-backend"))]
        DataUrl::RocksDb(_) => Err(
            "RocksDB backend requested but feature 'rocksdb-backend' is not enabled".to_owned(),
        ),
    }
}

/// The implementations selected at startup.
pub struct Capabilities {
    pub auth: Arc<dyn AuthProvider>,
    pub messages: Arc<dyn MessageService>,
}

impl std::fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capabilities")
            .field("auth", &self.auth.mode())
            .field("attached", &self.messages.is_attached())
            .finish()
    }
}

impl Capabilities {
    /// Probe both settings and select implementations.
    #[must_use]
    pub fn detect(publishable_key: Option<&str>, data_url: Option<&str>) -> Self {
        Self {
            auth: detect_auth(publishable_key),
            messages: detect_messages(data_url),
        }
    }
}

/// Select the auth provider for a raw publishable key.
#[must_use]
pub fn detect_auth(raw: Option<&str>) -> Arc<dyn AuthProvider> {
    match parse_publishable_key(raw) {
        Ok(key) => {
            let provider = PublishableKeyAuth::new(key);
            info!(environment = ?provider.environment(), "publishable key auth enabled");
            Arc::new(provider)
        }
        Err(reason) => {
            warn!(%reason, "running without authentication");
            Arc::new(AnonymousAuth)
        }
    }
}

/// Select the message service for a raw data URL.
#[must_use]
pub fn detect_messages(raw: Option<&str>) -> Arc<dyn MessageService> {
    let Some(raw) = raw.map(str::trim).filter(|u| !u.is_empty()) else {
        warn!("data URL not set, running without message storage");
        return Arc::new(DetachedMessages);
    };

    let url = match raw.parse::<DataUrl>() {
        Ok(url) => url,
        Err(e) => {
            warn!(error = %e, "invalid data URL, running without message storage");
            return Arc::new(DetachedMessages);
        }
    };

    match open_backend(&url) {
        Ok(storage) => {
            info!(backend = ?url, "message storage attached");
            Arc::new(MessageStore::new(storage))
        }
        Err(reason) => {
            error!(backend = ?url, %reason, "failed to open message storage, running without it");
            Arc::new(DetachedMessages)
        }
    }
}
