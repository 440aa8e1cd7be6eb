//! User profile record
//!
//! The one schema shared by the store, the orchestrator and the filler.

use crate::error::{AutofillError, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// Profile supplied to the filler for a single fill request
#[derive(Debug, Clone)]
pub struct Profile {
    /// Address written into email controls (may be empty)
    pub email: String,
    /// Free text entered by the user; never mutated by the filler
    pub raw_profile_data: String,
    pub api_key: Option<SecretString>,
}

impl Profile {
    pub fn new(email: impl Into<String>, raw_profile_data: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            raw_profile_data: raw_profile_data.into(),
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = normalize_api_key(api_key.into());
        self
    }

    /// Validate the record at the storage boundary
    ///
    /// An empty email is allowed. A non-empty one must have exactly one `@`
    /// with something on both sides.
    pub fn validate(&self) -> Result<()> {
        if self.email.is_empty() {
            return Ok(());
        }

        let mut parts = self.email.split('@');
        let valid = match (parts.next(), parts.next(), parts.next()) {
            (Some(local), Some(domain), None) => !local.is_empty() && !domain.is_empty(),
            _ => false,
        };

        if !valid {
            return Err(AutofillError::InvalidProfile(format!(
                "malformed email address '{}'",
                self.email
            )));
        }

        Ok(())
    }
}

fn normalize_api_key(key: String) -> Option<SecretString> {
    if key.trim().is_empty() {
        None
    } else {
        Some(SecretString::from(key))
    }
}

/// On-disk shape of a profile
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StoredProfile {
    email: String,
    #[serde(default)]
    raw_profile_data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    api_key: Option<String>,
}

impl From<&Profile> for StoredProfile {
    fn from(profile: &Profile) -> Self {
        Self {
            email: profile.email.clone(),
            raw_profile_data: profile.raw_profile_data.clone(),
            api_key: profile
                .api_key
                .as_ref()
                .map(|key| key.expose_secret().to_string()),
        }
    }
}

impl From<StoredProfile> for Profile {
    fn from(stored: StoredProfile) -> Self {
        Self {
            email: stored.email,
            raw_profile_data: stored.raw_profile_data,
            api_key: stored.api_key.and_then(normalize_api_key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_empty_email() {
        assert!(Profile::new("", "").validate().is_ok());
        assert!(Profile::new("a@b.com", "bio").validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_malformed_email() {
        for email in ["plain", "@b.com", "a@", "a@b@c"] {
            let err = Profile::new(email, "").validate().unwrap_err();
            assert!(matches!(err, AutofillError::InvalidProfile(_)), "{email}");
        }
    }

    #[test]
    fn test_blank_api_key_is_dropped() {
        assert!(Profile::new("", "").with_api_key("   ").api_key.is_none());
        let profile = Profile::new("", "").with_api_key("sk-123");
        assert_eq!(profile.api_key.unwrap().expose_secret(), "sk-123");
    }

    #[test]
    fn test_stored_profile_uses_camel_case() {
        let stored: StoredProfile = serde_json::from_str(
            r#"{"email":"a@b.com","rawProfileData":"my name is Sam","apiKey":""}"#,
        )
        .unwrap();
        let profile = Profile::from(stored);
        assert_eq!(profile.email, "a@b.com");
        assert_eq!(profile.raw_profile_data, "my name is Sam");
        assert!(profile.api_key.is_none());

        let json = serde_json::to_string(&StoredProfile::from(&profile)).unwrap();
        assert!(json.contains("\"rawProfileData\""));
        assert!(!json.contains("apiKey"));
    }

    #[test]
    fn test_missing_email_is_rejected() {
        let parsed = serde_json::from_str::<StoredProfile>(r#"{"rawProfileData":"x"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let profile = Profile::new("a@b.com", "").with_api_key("sk-secret");
        assert!(!format!("{:?}", profile).contains("sk-secret"));
    }
}
