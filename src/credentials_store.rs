//! OS keyring session storage

use crate::error::{AutofillError, Result};
use crate::service::{AuthClient, UserId};
use serde::{Deserialize, Serialize};
use tracing::info;

const KEYRING_SERVICE: &str = "profile-autofill";
const KEYRING_USERNAME: &str = "session";

#[derive(Debug, Serialize, Deserialize)]
struct StoredSession {
    user_id: String,
}

/// Signed-in identity persisted in the OS credential store
#[derive(Debug, Clone)]
pub struct KeyringAuth {
    service: String,
}

impl KeyringAuth {
    pub fn new() -> Self {
        Self::with_service(KEYRING_SERVICE)
    }

    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self) -> Result<keyring::Entry> {
        keyring::Entry::new(&self.service, KEYRING_USERNAME)
            .map_err(|e| AutofillError::KeyringError(e.to_string()))
    }

    pub fn sign_in(&self, user: &UserId) -> Result<()> {
        let payload = serde_json::to_string(&StoredSession {
            user_id: user.to_string(),
        })
        .map_err(|e| AutofillError::KeyringError(e.to_string()))?;

        self.entry()?
            .set_password(&payload)
            .map_err(|e| AutofillError::KeyringError(e.to_string()))?;

        info!("Signed in as {}", user);
        Ok(())
    }

    pub fn sign_out(&self) -> Result<()> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(AutofillError::KeyringError(e.to_string())),
        }
    }
}

impl Default for KeyringAuth {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthClient for KeyringAuth {
    fn current_user(&self) -> Result<Option<UserId>> {
        match self.entry()?.get_password() {
            Ok(payload) => {
                let stored: StoredSession = serde_json::from_str(&payload)
                    .map_err(|e| AutofillError::KeyringError(e.to_string()))?;
                Ok(Some(UserId::new(stored.user_id)))
            }
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(AutofillError::KeyringError(e.to_string())),
        }
    }
}
