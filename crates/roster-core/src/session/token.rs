//! Session token and its durable storage
//!
//! Exactly one session is persisted at a time. The stored record carries the
//! token and the identity it was issued for, so a restart can present the
//! user as signed in before the service has been asked.

use crate::model::UserIdentity;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Opaque bearer token
///
/// JWT-shaped tokens have their `exp` claim read so expiry can be checked
/// without a round trip. Anything else never expires client-side.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct SessionToken {
    raw: String,
    expires_at: Option<DateTime<Utc>>,
}

impl SessionToken {
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let expires_at = jwt_expiry(&raw);
        Self { raw, expires_at }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }
}

impl From<String> for SessionToken {
    fn from(raw: String) -> Self {
        Self::parse(raw)
    }
}

impl From<SessionToken> for String {
    fn from(token: SessionToken) -> Self {
        token.raw
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionToken")
            .field("raw", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

fn jwt_expiry(raw: &str) -> Option<DateTime<Utc>> {
    let mut parts = raw.split('.');
    let (_header, payload, _signature) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    let exp = claims.get("exp")?.as_i64()?;
    Utc.timestamp_opt(exp, 0).single()
}

/// What survives a restart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedSession {
    pub token: SessionToken,
    pub identity: UserIdentity,
    pub saved_at: DateTime<Utc>,
}

impl PersistedSession {
    pub fn new(token: SessionToken, identity: UserIdentity) -> Self {
        Self {
            token,
            identity,
            saved_at: Utc::now(),
        }
    }
}

/// Token storage errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenStorageError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Durable home of the persisted session
pub trait TokenStorage: Send + Sync {
    fn load(&self) -> Result<Option<PersistedSession>, TokenStorageError>;

    fn store(&self, session: &PersistedSession) -> Result<(), TokenStorageError>;

    /// Remove the persisted session; clearing an empty storage is not an error
    fn clear(&self) -> Result<(), TokenStorageError>;
}

const SESSION_FILE: &str = "session.json";

/// File-based storage under a private directory
#[derive(Debug, Clone)]
pub struct FileTokenStorage {
    base_path: PathBuf,
}

impl FileTokenStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// `~/.roster`
    pub fn default_location() -> Result<Self, TokenStorageError> {
        let home = dirs::home_dir()
            .ok_or_else(|| TokenStorageError::Storage("Cannot find home directory".into()))?;
        Ok(Self::new(home.join(".roster")))
    }

    pub fn path(&self) -> PathBuf {
        self.base_path.join(SESSION_FILE)
    }

    fn ensure_dir(&self) -> Result<(), TokenStorageError> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::{DirBuilderExt, PermissionsExt};
            std::fs::DirBuilder::new()
                .recursive(true)
                .mode(0o700)
                .create(&self.base_path)
                .map_err(|e| TokenStorageError::Io(e.to_string()))?;

            let mode = std::fs::metadata(&self.base_path)
                .map_err(|e| TokenStorageError::Io(e.to_string()))?
                .permissions()
                .mode()
                & 0o777;
            if mode != 0o700 {
                tracing::warn!(
                    "Session directory has permissions {:o}, tightening to 0700",
                    mode
                );
                std::fs::set_permissions(&self.base_path, std::fs::Permissions::from_mode(0o700))
                    .map_err(|e| TokenStorageError::Io(e.to_string()))?;
            }
        }

        #[cfg(not(unix))]
        {
            std::fs::create_dir_all(&self.base_path)
                .map_err(|e| TokenStorageError::Io(e.to_string()))?;
        }

        Ok(())
    }
}

fn write_private(path: &Path, contents: &[u8]) -> Result<(), TokenStorageError> {
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, contents).map_err(|e| TokenStorageError::Io(e.to_string()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o600))
            .map_err(|e| TokenStorageError::Io(e.to_string()))?;
    }

    std::fs::rename(&tmp, path).map_err(|e| TokenStorageError::Io(e.to_string()))
}

impl TokenStorage for FileTokenStorage {
    fn load(&self) -> Result<Option<PersistedSession>, TokenStorageError> {
        let path = self.path();
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(TokenStorageError::Io(e.to_string())),
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| TokenStorageError::Serialization(e.to_string()))
    }

    fn store(&self, session: &PersistedSession) -> Result<(), TokenStorageError> {
        self.ensure_dir()?;
        let json = serde_json::to_vec_pretty(session)
            .map_err(|e| TokenStorageError::Serialization(e.to_string()))?;
        write_private(&self.path(), &json)
    }

    fn clear(&self) -> Result<(), TokenStorageError> {
        match std::fs::remove_file(self.path()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(TokenStorageError::Io(e.to_string())),
        }
    }
}

/// In-process storage; nothing survives the process
#[derive(Debug, Default)]
pub struct MemoryTokenStorage {
    slot: Mutex<Option<PersistedSession>>,
    fail_writes: Mutex<bool>,
}

impl MemoryTokenStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: PersistedSession) -> Self {
        Self {
            slot: Mutex::new(Some(session)),
            fail_writes: Mutex::new(false),
        }
    }

    /// Make subsequent `store` calls fail, e.g. to simulate a full disk
    pub fn set_fail_writes(&self, fail: bool) {
        *self.fail_writes.lock() = fail;
    }

    pub fn snapshot(&self) -> Option<PersistedSession> {
        self.slot.lock().clone()
    }
}

impl TokenStorage for MemoryTokenStorage {
    fn load(&self) -> Result<Option<PersistedSession>, TokenStorageError> {
        Ok(self.slot.lock().clone())
    }

    fn store(&self, session: &PersistedSession) -> Result<(), TokenStorageError> {
        if *self.fail_writes.lock() {
            return Err(TokenStorageError::Storage("storage is read-only".into()));
        }
        *self.slot.lock() = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), TokenStorageError> {
        *self.slot.lock() = None;
        Ok(())
    }
}

/// Build an unsigned JWT-shaped token with the given `exp`, for tests
#[cfg(any(test, feature = "test-support"))]
pub fn jwt_with_expiry(exp: DateTime<Utc>) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"1","exp":{}}}"#, exp.timestamp()));
    format!("{}.{}.sig", header, payload)
}
