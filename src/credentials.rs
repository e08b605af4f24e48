// Durable credential store (the `userData` record)
//
// The single cross-restart artifact the client keeps: one JSON-encoded
// Credential. Reads go through an in-memory cache so the request pipeline
// can ask for the token on every call without touching disk.
use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::types::{Credential, Profile, Role};

const CREDENTIAL_FILE: &str = "userData.json";

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("invalid credential: {0}")]
    Invalid(String),
}

pub struct CredentialStore {
    dir: PathBuf,
    cached: RwLock<Option<Credential>>,
}

impl CredentialStore {
    /// Open the store at the default location and hydrate the cache.
    /// A corrupt or missing record is treated as "not authenticated".
    pub fn open() -> Result<Self, CredentialError> {
        let dir = default_dir()?;
        Ok(Self::at(dir))
    }

    /// Open the store rooted at an explicit directory (tests)
    pub fn at(dir: PathBuf) -> Self {
        let store = Self {
            dir,
            cached: RwLock::new(None),
        };
        let loaded = store.read_from_disk();
        *store.cached.write().unwrap_or_else(|e| e.into_inner()) = loaded;
        store
    }

    /// Re-read the durable record into the cache, returning the result.
    /// Never errors: a value that fails to parse counts as absent.
    pub fn load(&self) -> Option<Credential> {
        let loaded = self.read_from_disk();
        *self.cached.write().unwrap_or_else(|e| e.into_inner()) = loaded.clone();
        loaded
    }

    pub fn save(&self, credential: &Credential) -> Result<(), CredentialError> {
        if !credential.is_valid() {
            return Err(CredentialError::Invalid(
                "access token must be non-empty".to_string(),
            ));
        }

        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)?;
        }
        let content = serde_json::to_string_pretty(credential)?;
        fs::write(self.file_path(), content)?;

        *self.cached.write().unwrap_or_else(|e| e.into_inner()) = Some(credential.clone());
        Ok(())
    }

    /// Drop the credential from cache and disk. Called on logout and on any
    /// 401 from the pipeline; missing file is not an error.
    pub fn clear(&self) {
        *self.cached.write().unwrap_or_else(|e| e.into_inner()) = None;
        let path = self.file_path();
        if path.exists() {
            if let Err(e) = fs::remove_file(&path) {
                tracing::warn!("failed to remove credential file {}: {}", path.display(), e);
            }
        }
    }

    pub fn get(&self) -> Option<Credential> {
        self.cached
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn get_token(&self) -> Option<String> {
        self.get().map(|c| c.access_token)
    }

    pub fn get_role(&self) -> Option<Role> {
        self.get().map(|c| c.profile.role)
    }

    pub fn get_profile(&self) -> Option<Profile> {
        self.get().map(|c| c.profile)
    }

    pub fn is_authenticated(&self) -> bool {
        self.get_token().is_some()
    }

    fn file_path(&self) -> PathBuf {
        self.dir.join(CREDENTIAL_FILE)
    }

    fn read_from_disk(&self) -> Option<Credential> {
        let path = self.file_path();
        if !path.exists() {
            return None;
        }

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("failed to read credential file {}: {}", path.display(), e);
                return None;
            }
        };

        match serde_json::from_str::<Credential>(&content) {
            Ok(cred) if cred.is_valid() => Some(cred),
            Ok(_) => {
                tracing::warn!("stored credential has empty access token, ignoring");
                None
            }
            Err(e) => {
                tracing::warn!("stored credential is corrupt, ignoring: {}", e);
                None
            }
        }
    }
}

fn default_dir() -> Result<PathBuf, CredentialError> {
    if let Ok(custom_dir) = std::env::var("QUIZHUB_CONFIG_DIR") {
        return Ok(PathBuf::from(custom_dir));
    }
    let home = std::env::var("HOME").map_err(|_| {
        CredentialError::Invalid("HOME environment variable not set".to_string())
    })?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("quizhub")
        .join("client"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Profile;

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "quizhub-cred-{}-{}",
            tag,
            uuid::Uuid::new_v4().simple()
        ));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn credential(token: &str) -> Credential {
        Credential {
            access_token: token.to_string(),
            refresh_token: None,
            profile: Profile {
                id: "u1".into(),
                first_name: "Sam".into(),
                last_name: "Lee".into(),
                email: "sam@example.com".into(),
                role: Role::Student,
            },
        }
    }

    #[test]
    fn save_then_load_roundtrips() {
        let dir = temp_dir("roundtrip");
        let store = CredentialStore::at(dir.clone());
        store.save(&credential("T")).unwrap();

        // A fresh store over the same dir sees the persisted record
        let fresh = CredentialStore::at(dir);
        assert_eq!(fresh.get_token().as_deref(), Some("T"));
        assert_eq!(fresh.get_role(), Some(Role::Student));
    }

    #[test]
    fn clear_removes_record() {
        let dir = temp_dir("clear");
        let store = CredentialStore::at(dir.clone());
        store.save(&credential("T")).unwrap();
        store.clear();
        assert_eq!(store.get_token(), None);
        assert!(!dir.join(CREDENTIAL_FILE).exists());
    }

    #[test]
    fn corrupt_record_reads_as_unauthenticated() {
        let dir = temp_dir("corrupt");
        fs::write(dir.join(CREDENTIAL_FILE), "{not json").unwrap();
        let store = CredentialStore::at(dir);
        assert_eq!(store.get(), None);
        assert!(!store.is_authenticated());
    }

    #[test]
    fn empty_token_is_rejected_on_save_and_load() {
        let dir = temp_dir("empty");
        let store = CredentialStore::at(dir.clone());
        assert!(store.save(&credential("")).is_err());

        // A record with an empty token on disk is ignored too
        let mut cred = credential("T");
        store.save(&cred).unwrap();
        cred.access_token = String::new();
        fs::write(
            dir.join(CREDENTIAL_FILE),
            serde_json::to_string(&cred).unwrap(),
        )
        .unwrap();
        assert_eq!(store.load(), None);
    }

    #[test]
    fn missing_clear_is_harmless() {
        let store = CredentialStore::at(temp_dir("missing"));
        store.clear();
        store.clear();
        assert_eq!(store.get(), None);
    }
}
