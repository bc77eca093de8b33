use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockWriteGuard};

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use super::store::CredentialStore;
use super::vault;

/// Session file name in cache directory
pub const SESSION_FILE: &str = "session.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData {
    pub access_token: String,
    pub refresh_token: String,
    pub stored_at: DateTime<Utc>,
}

impl SessionData {
    pub fn new(access: &str, refresh: &str) -> Self {
        Self {
            access_token: access.to_string(),
            refresh_token: refresh.to_string(),
            stored_at: Utc::now(),
        }
    }

    pub fn age(&self) -> Duration {
        Utc::now() - self.stored_at
    }
}

/// Token storage in a JSON session file, optionally sealed with a passphrase.
///
/// The file is read once on open. Each write goes to its own temp file that
/// is renamed over the session file; on Unix the file is readable by the
/// owner only.
pub struct FileCredentialStore {
    path: PathBuf,
    passphrase: Option<String>,
    data: RwLock<Option<SessionData>>,
}

impl FileCredentialStore {
    /// Open the session file in `cache_dir`, loading any saved tokens.
    pub fn open(cache_dir: &Path) -> Result<Self> {
        Self::open_at(cache_dir.join(SESSION_FILE), None)
    }

    /// Open a session file sealed with `passphrase`.
    pub fn open_sealed(cache_dir: &Path, passphrase: &str) -> Result<Self> {
        Self::open_at(cache_dir.join(SESSION_FILE), Some(passphrase.to_string()))
    }

    pub fn open_at(path: PathBuf, passphrase: Option<String>) -> Result<Self> {
        let data = Self::load(&path, passphrase.as_deref())?;
        Ok(Self {
            path,
            passphrase,
            data: RwLock::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Saved session data, if any
    pub fn session(&self) -> Option<SessionData> {
        match self.data.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn load(path: &Path, passphrase: Option<&str>) -> Result<Option<SessionData>> {
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read(path).context("Failed to read session file")?;

        let contents = match (vault::is_sealed(&raw), passphrase) {
            (true, Some(passphrase)) => match vault::open(passphrase, &raw) {
                Ok(plain) => plain,
                Err(e) => {
                    warn!(error = %e, "Ignoring unreadable session file");
                    return Ok(None);
                }
            },
            (true, None) => {
                warn!("Session file is sealed but no passphrase was given");
                return Ok(None);
            }
            (false, _) => raw,
        };

        match serde_json::from_slice::<SessionData>(&contents) {
            Ok(data) => {
                debug!(age_minutes = data.age().num_minutes(), "Loaded saved session");
                Ok(Some(data))
            }
            Err(e) => {
                warn!(error = %e, "Ignoring corrupt session file");
                Ok(None)
            }
        }
    }

    fn save(&self, data: &SessionData) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).context("Failed to create session directory")?;
        let json = serde_json::to_vec_pretty(data)?;
        let contents = match self.passphrase {
            Some(ref passphrase) => vault::seal(passphrase, &json)?,
            None => json,
        };

        // Unique temp file per write, owner-only, renamed over the session file
        let mut tmp = NamedTempFile::new_in(dir).context("Failed to create session file")?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tmp.as_file()
                .set_permissions(std::fs::Permissions::from_mode(0o600))
                .context("Failed to restrict session file permissions")?;
        }
        tmp.write_all(&contents).context("Failed to write session file")?;
        tmp.as_file().sync_all().context("Failed to write session file")?;
        tmp.persist(&self.path)
            .map_err(|e| e.error)
            .context("Failed to replace session file")?;
        Ok(())
    }

    fn lock(&self) -> RwLockWriteGuard<'_, Option<SessionData>> {
        match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl CredentialStore for FileCredentialStore {
    fn access_token(&self) -> Option<String> {
        self.session().map(|d| d.access_token)
    }

    fn refresh_token(&self) -> Option<String> {
        self.session().map(|d| d.refresh_token)
    }

    // Writers hold the lock across the file write so memory and disk agree
    fn set(&self, access: &str, refresh: &str) -> Result<()> {
        let mut guard = self.lock();
        let data = SessionData::new(access, refresh);
        self.save(&data)?;
        *guard = Some(data);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut guard = self.lock();
        *guard = None;
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).context("Failed to remove session file"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::open(dir.path()).unwrap();
        assert_eq!(store.access_token(), None);

        store.set("access", "refresh").unwrap();
        assert_eq!(store.access_token().as_deref(), Some("access"));
        assert!(dir.path().join(SESSION_FILE).exists());

        store.clear().unwrap();
        assert_eq!(store.access_token(), None);
        assert!(!dir.path().join(SESSION_FILE).exists());
    }

    #[test]
    fn test_tokens_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        FileCredentialStore::open(dir.path())
            .unwrap()
            .set("access", "refresh")
            .unwrap();

        let reopened = FileCredentialStore::open(dir.path()).unwrap();
        assert_eq!(reopened.access_token().as_deref(), Some("access"));
        assert_eq!(reopened.refresh_token().as_deref(), Some("refresh"));
        assert!(reopened.session().unwrap().age() < Duration::minutes(1));
    }

    #[test]
    fn test_sealed_store() {
        let dir = tempfile::tempdir().unwrap();
        FileCredentialStore::open_sealed(dir.path(), "pass")
            .unwrap()
            .set("access", "refresh")
            .unwrap();

        let raw = std::fs::read(dir.path().join(SESSION_FILE)).unwrap();
        assert!(vault::is_sealed(&raw));

        let reopened = FileCredentialStore::open_sealed(dir.path(), "pass").unwrap();
        assert_eq!(reopened.access_token().as_deref(), Some("access"));

        let wrong = FileCredentialStore::open_sealed(dir.path(), "nope").unwrap();
        assert_eq!(wrong.access_token(), None);

        let unsealed = FileCredentialStore::open(dir.path()).unwrap();
        assert_eq!(unsealed.access_token(), None);
    }

    #[test]
    fn test_concurrent_writers_keep_memory_and_disk_in_step() {
        let dir = tempfile::tempdir().unwrap();
        let store = std::sync::Arc::new(FileCredentialStore::open(dir.path()).unwrap());

        let writers: Vec<_> = (0..8)
            .map(|writer| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for round in 0..50 {
                        let access = format!("acc-{}-{}", writer, round);
                        let refresh = format!("ref-{}-{}", writer, round);
                        store.set(&access, &refresh).unwrap();
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        let on_disk = FileCredentialStore::open(dir.path()).unwrap();
        assert_eq!(on_disk.access_token(), store.access_token());
        assert_eq!(on_disk.refresh_token(), store.refresh_token());

        // Only the session file is left behind
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_session_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::open(dir.path()).unwrap();
        store.set("access", "refresh").unwrap();

        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_clear_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::open(dir.path()).unwrap();
        assert!(store.clear().is_ok());
    }

    #[test]
    fn test_corrupt_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SESSION_FILE), "not json").unwrap();
        let store = FileCredentialStore::open(dir.path()).unwrap();
        assert_eq!(store.access_token(), None);
    }
}
