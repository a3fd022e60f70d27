//! Durable checkpoints for in-flight signing sessions.
//!
//! A coordinator round trip can outlive the requesting process (wallet
//! redirects, page reloads, crashes). The session store persists exactly one
//! pending request per signer scope so the response can be matched back to
//! the transaction it signs after a restart.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::{Error, Result};
use crate::types::DerivationPath;

/// The durable record of an in-flight signing request.
///
/// Holds everything needed to finish the flow later: the derivation path
/// the payload was signed under and the exact unsigned transaction bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningSession {
    pub path: DerivationPath,
    /// Type-prefixed RLP of the unsigned transaction.
    pub transaction: Vec<u8>,
}

impl SigningSession {
    pub fn new(path: DerivationPath, transaction: Vec<u8>) -> Self {
        Self { path, transaction }
    }
}

/// Storage for the single pending session of one signer scope.
///
/// `checkpoint` always replaces the previous record; there is never more
/// than one pending session per scope.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn checkpoint(&self, session: &SigningSession) -> Result<()>;

    /// The pending session, if any. Reading does not consume it.
    async fn resume(&self) -> Result<Option<SigningSession>>;

    /// Remove the pending session. Clearing an empty store is not an error.
    async fn clear(&self) -> Result<()>;
}

// ============ Memory Store ============

/// In-process session store for tests and short-lived tools.
#[derive(Clone, Default)]
pub struct MemorySessionStore {
    slot: Arc<RwLock<Option<SigningSession>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn checkpoint(&self, session: &SigningSession) -> Result<()> {
        *self.slot.write().await = Some(session.clone());
        Ok(())
    }

    async fn resume(&self) -> Result<Option<SigningSession>> {
        Ok(self.slot.read().await.clone())
    }

    async fn clear(&self) -> Result<()> {
        *self.slot.write().await = None;
        Ok(())
    }
}

// ============ File Store ============

/// Session store backed by one JSON file per signer scope.
pub struct FileSessionStore {
    base_path: PathBuf,
    scope: String,
}

impl FileSessionStore {
    pub fn new(base_path: impl Into<PathBuf>, scope: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            scope: scope.into(),
        }
    }

    fn session_path(&self) -> PathBuf {
        // Sanitize the scope so it cannot escape the base directory.
        let safe = self.scope.replace(['/', '\\', '.', '~'], "_");
        self.base_path.join(format!("{}.session.json", safe))
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn checkpoint(&self, session: &SigningSession) -> Result<()> {
        tokio::fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| Error::Storage(format!("failed to create session directory: {}", e)))?;

        let data = serde_json::to_vec(session)?;
        let path = self.session_path();
        let tmp = path.with_extension(format!("tmp-{}", rand::random::<u64>()));

        tokio::fs::write(&tmp, &data)
            .await
            .map_err(|e| Error::Storage(format!("failed to write session checkpoint: {}", e)))?;
        // Rename within one directory is atomic, so a crash mid-checkpoint
        // leaves either the old record or the new one, never a torn file.
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| Error::Storage(format!("failed to commit session checkpoint: {}", e)))?;
        Ok(())
    }

    async fn resume(&self) -> Result<Option<SigningSession>> {
        let data = match tokio::fs::read(self.session_path()).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(Error::Storage(format!(
                    "failed to read session checkpoint: {}",
                    e
                )))
            }
        };
        let session = serde_json::from_slice(&data)
            .map_err(|e| Error::Deserialization(format!("corrupt session checkpoint: {}", e)))?;
        Ok(Some(session))
    }

    async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(self.session_path()).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Storage(format!(
                "failed to clear session checkpoint: {}",
                e
            ))),
        }
    }
}
