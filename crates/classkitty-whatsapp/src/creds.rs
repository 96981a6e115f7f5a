// SPDX-FileCopyrightText: 2026 Classkitty Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Filesystem-backed credential store.
//!
//! Credentials live in a single `creds.json` inside the session directory.
//! Writes go to a temp file in the same directory followed by a rename, so
//! a crash mid-write never leaves a truncated blob behind. A corrupt or
//! unreadable file is treated as "no session": the manager falls back to
//! fresh QR pairing rather than refusing to start.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, warn};

use classkitty_core::error::ClasskittyError;
use classkitty_core::traits::CredentialStore;
use classkitty_core::types::SessionCredentials;

const CREDS_FILE: &str = "creds.json";
const CREDS_TMP_FILE: &str = "creds.json.tmp";

/// Credential store rooted at the configured session directory.
///
/// The directory is exclusively owned by one Classkitty process; no file
/// locking is done.
pub struct FsCredentialStore {
    dir: PathBuf,
}

impl FsCredentialStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn creds_path(&self) -> PathBuf {
        self.dir.join(CREDS_FILE)
    }
}

#[async_trait]
impl CredentialStore for FsCredentialStore {
    async fn load(&self) -> Option<SessionCredentials> {
        let path = self.creds_path();
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no stored credentials");
                return None;
            }
            Err(error) => {
                warn!(%error, path = %path.display(), "failed to read stored credentials");
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(blob) => Some(SessionCredentials::new(blob)),
            Err(error) => {
                warn!(%error, path = %path.display(), "stored credentials are corrupt; ignoring");
                None
            }
        }
    }

    async fn save(&self, creds: &SessionCredentials) -> Result<(), ClasskittyError> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| ClasskittyError::Credential { source: e.into() })?;

        let bytes = serde_json::to_vec(&creds.blob)
            .map_err(|e| ClasskittyError::Credential { source: e.into() })?;

        let tmp = self.dir.join(CREDS_TMP_FILE);
        fs::write(&tmp, &bytes)
            .await
            .map_err(|e| ClasskittyError::Credential { source: e.into() })?;
        fs::rename(&tmp, self.creds_path())
            .await
            .map_err(|e| ClasskittyError::Credential { source: e.into() })?;

        debug!(bytes = bytes.len(), "session credentials persisted");
        Ok(())
    }

    async fn clear(&self) -> Result<(), ClasskittyError> {
        match fs::remove_dir_all(&self.dir).await {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
            Err(error) => Err(ClasskittyError::Credential {
                source: error.into(),
            }),
        }
    }
}
