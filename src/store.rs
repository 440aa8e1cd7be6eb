//! JSON file profile storage

use crate::error::{AutofillError, Result};
use crate::profile::{Profile, StoredProfile};
use crate::service::{ProfileStore, UserId};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

type ProfileMap = BTreeMap<String, StoredProfile>;

/// All profiles in one JSON object keyed by user id
#[derive(Debug, Clone)]
pub struct JsonProfileStore {
    path: PathBuf,
}

impl JsonProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<ProfileMap> {
        if !self.path.exists() {
            return Ok(ProfileMap::new());
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|e| AutofillError::Storage(e.to_string()))?;

        serde_json::from_str(&content).map_err(|e| {
            warn!("Profile store {} is unreadable: {}", self.path.display(), e);
            AutofillError::Storage(e.to_string())
        })
    }

    fn write_all(&self, profiles: &ProfileMap) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir).map_err(|e| AutofillError::Storage(e.to_string()))?;
            }
        }

        let content = serde_json::to_string_pretty(profiles)
            .map_err(|e| AutofillError::Storage(e.to_string()))?;

        fs::write(&self.path, content).map_err(|e| AutofillError::Storage(e.to_string()))
    }

    /// Remove a user's profile; missing profiles are not an error
    pub fn delete_profile(&self, user: &UserId) -> Result<()> {
        let mut profiles = self.read_all()?;
        if profiles.remove(user.as_str()).is_some() {
            self.write_all(&profiles)?;
        }
        Ok(())
    }
}

impl ProfileStore for JsonProfileStore {
    fn load_profile(&self, user: &UserId) -> Result<Option<Profile>> {
        let mut profiles = self.read_all()?;

        let Some(stored) = profiles.remove(user.as_str()) else {
            return Ok(None);
        };

        let profile = Profile::from(stored);
        profile.validate()?;
        Ok(Some(profile))
    }

    fn save_profile(&self, user: &UserId, profile: &Profile) -> Result<()> {
        profile.validate()?;

        let mut profiles = self.read_all()?;
        profiles.insert(user.to_string(), StoredProfile::from(profile));
        self.write_all(&profiles)?;

        debug!("Saved profile for user {} to {}", user, self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_missing_file_is_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonProfileStore::new(dir.path().join("profiles.json"));
        assert!(store.load_profile(&UserId::new("u1")).unwrap().is_none());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonProfileStore::new(dir.path().join("nested").join("profiles.json"));
        let user = UserId::new("u1");

        let profile = Profile::new("a@b.com", "my name is Sam").with_api_key("sk-1");
        store.save_profile(&user, &profile).unwrap();
        store
            .save_profile(&UserId::new("u2"), &Profile::new("", "other"))
            .unwrap();

        let loaded = store.load_profile(&user).unwrap().unwrap();
        assert_eq!(loaded.email, "a@b.com");
        assert_eq!(loaded.raw_profile_data, "my name is Sam");
        assert_eq!(loaded.api_key.unwrap().expose_secret(), "sk-1");

        let raw = fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"rawProfileData\""));
    }

    #[test]
    fn test_invalid_profile_is_rejected_both_ways() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profiles.json");
        let store = JsonProfileStore::new(&path);

        let err = store
            .save_profile(&UserId::new("u1"), &Profile::new("broken", ""))
            .unwrap_err();
        assert!(matches!(err, AutofillError::InvalidProfile(_)));

        fs::write(&path, r#"{"u1":{"email":"a@@b","rawProfileData":""}}"#).unwrap();
        let err = store.load_profile(&UserId::new("u1")).unwrap_err();
        assert!(matches!(err, AutofillError::InvalidProfile(_)));
    }

    #[test]
    fn test_corrupt_file_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profiles.json");
        fs::write(&path, "not json").unwrap();

        let err = JsonProfileStore::new(&path)
            .load_profile(&UserId::new("u1"))
            .unwrap_err();
        assert!(matches!(err, AutofillError::Storage(_)));
    }

    #[test]
    fn test_delete_profile() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonProfileStore::new(dir.path().join("profiles.json"));
        let user = UserId::new("u1");

        store.delete_profile(&user).unwrap();
        store.save_profile(&user, &Profile::new("", "")).unwrap();
        store.delete_profile(&user).unwrap();
        assert!(store.load_profile(&user).unwrap().is_none());
    }
}
