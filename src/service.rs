//! Autofill Service
//!
//! Wires the injected collaborators (who is signed in, where profiles live)
//! to the [`FormFiller`] and turns every outcome into a [`Notification`].
//! The filler only runs once a signed-in user with a stored profile is known.

use crate::dom::FormDocument;
use crate::error::{AutofillError, Result};
use crate::filler::{FillResult, FormFiller};
use crate::profile::Profile;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::{debug, error, info, warn};

/// Identifier of an authenticated user
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source of the signed-in identity
pub trait AuthClient {
    /// `Ok(None)` when nobody is signed in
    fn current_user(&self) -> Result<Option<UserId>>;
}

/// Profile persistence
pub trait ProfileStore {
    /// `Ok(None)` when the user has no stored profile
    fn load_profile(&self, user: &UserId) -> Result<Option<Profile>>;

    fn save_profile(&self, user: &UserId, profile: &Profile) -> Result<()>;
}

/// User-facing outcome of one autofill request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    LoggedOut,
    ProfileMissing,
    Filled { count: usize },
    NoMatches,
    Failure { message: String },
}

impl Notification {
    pub fn message(&self) -> String {
        match self {
            Notification::LoggedOut => {
                "Please sign in to fill forms from your profile.".to_string()
            }
            Notification::ProfileMissing => {
                "No profile found. Save your profile in the settings first.".to_string()
            }
            Notification::Filled { count } if *count == 1 => "Filled 1 field.".to_string(),
            Notification::Filled { count } => format!("Filled {} fields.", count),
            Notification::NoMatches => "No matching fields found on this page.".to_string(),
            Notification::Failure { message } => format!("Autofill failed: {}", message),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Notification::Filled { .. })
    }
}

impl From<FillResult> for Notification {
    fn from(result: FillResult) -> Self {
        if result.is_empty() {
            Notification::NoMatches
        } else {
            Notification::Filled {
                count: result.filled_count,
            }
        }
    }
}

/// Orchestrates one fill request against injected collaborators
pub struct AutofillService<A, S> {
    auth: A,
    store: S,
    filler: FormFiller,
}

impl<A: AuthClient, S: ProfileStore> AutofillService<A, S> {
    pub fn new(auth: A, store: S) -> Self {
        Self::with_filler(auth, store, FormFiller::new())
    }

    pub fn with_filler(auth: A, store: S, filler: FormFiller) -> Self {
        Self {
            auth,
            store,
            filler,
        }
    }

    /// Resolve the signed-in user's profile
    pub fn active_profile(&self) -> Result<Profile> {
        let user = self.auth.current_user()?.ok_or(AutofillError::NotSignedIn)?;
        debug!("Loading profile for user {}", user);

        self.store
            .load_profile(&user)?
            .ok_or_else(|| AutofillError::ProfileMissing(user.to_string()))
    }

    /// Fill `document` for the signed-in user
    ///
    /// Missing identity or profile become prompts; collaborator and document
    /// failures are returned as errors.
    pub fn try_run<D: FormDocument>(&self, document: &D) -> Result<Notification> {
        let profile = match self.active_profile() {
            Ok(profile) => profile,
            Err(e) if e.is_recoverable() => {
                info!("Autofill not possible yet: {}", e);
                return Ok(prompt_for(&e));
            }
            Err(e) => {
                error!("Failed to load profile: {}", e);
                return Err(e);
            }
        };

        let result = self.filler.fill(&profile, document).map_err(|e| {
            warn!("Fill pass aborted: {}", e);
            e
        })?;
        Ok(result.into())
    }

    /// Fill `document` for the signed-in user, reporting every outcome
    pub fn run<D: FormDocument>(&self, document: &D) -> Notification {
        self.try_run(document)
            .unwrap_or_else(|e| Notification::Failure {
                message: e.to_string(),
            })
    }
}

/// Prompt shown for an error the user can resolve
fn prompt_for(error: &AutofillError) -> Notification {
    match error {
        AutofillError::NotSignedIn => Notification::LoggedOut,
        _ => Notification::ProfileMissing,
    }
}

/// Fixed identity, for tests and embedding
#[derive(Debug, Clone, Default)]
pub struct StaticAuth {
    user: Option<UserId>,
}

impl StaticAuth {
    pub fn signed_in(user: impl Into<String>) -> Self {
        Self {
            user: Some(UserId::new(user)),
        }
    }

    pub fn signed_out() -> Self {
        Self::default()
    }
}

impl AuthClient for StaticAuth {
    fn current_user(&self) -> Result<Option<UserId>> {
        Ok(self.user.clone())
    }
}

/// Profiles kept in process memory
#[derive(Debug, Default)]
pub struct MemoryProfileStore {
    profiles: RwLock<HashMap<UserId, Profile>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProfileStore for MemoryProfileStore {
    fn load_profile(&self, user: &UserId) -> Result<Option<Profile>> {
        let profiles = self
            .profiles
            .read()
            .map_err(|e| AutofillError::Storage(e.to_string()))?;
        Ok(profiles.get(user).cloned())
    }

    fn save_profile(&self, user: &UserId, profile: &Profile) -> Result<()> {
        profile.validate()?;
        let mut profiles = self
            .profiles
            .write()
            .map_err(|e| AutofillError::Storage(e.to_string()))?;
        profiles.insert(user.clone(), profile.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::memory::{ElementSpec, MemoryDocument, MemoryElement};
    use std::cell::Cell;

    fn document() -> MemoryDocument {
        let doc = MemoryDocument::new();
        let form = doc.append(doc.root(), ElementSpec::new("form"));
        doc.append(form, ElementSpec::new("input").attr("type", "email").attr("id", "e"));
        doc.append(form, ElementSpec::new("input").attr("name", "full_name").attr("id", "n"));
        doc
    }

    fn store_with(user: &str, profile: Profile) -> MemoryProfileStore {
        let store = MemoryProfileStore::new();
        store.save_profile(&UserId::new(user), &profile).unwrap();
        store
    }

    #[test]
    fn test_signed_out_user_gets_prompt() {
        let service = AutofillService::new(StaticAuth::signed_out(), MemoryProfileStore::new());
        assert_eq!(service.run(&document()), Notification::LoggedOut);
    }

    #[test]
    fn test_missing_profile() {
        let service = AutofillService::new(StaticAuth::signed_in("u1"), MemoryProfileStore::new());
        assert_eq!(service.run(&document()), Notification::ProfileMissing);
    }

    #[test]
    fn test_successful_fill_reports_count() {
        let store = store_with("u1", Profile::new("a@b.com", "Hi, my name is Sam Lee, thanks."));
        let service = AutofillService::new(StaticAuth::signed_in("u1"), store);

        let notification = service.run(&document());
        assert_eq!(notification, Notification::Filled { count: 2 });
        assert!(notification.is_success());
        assert_eq!(notification.message(), "Filled 2 fields.");
    }

    #[test]
    fn test_no_matches_is_informational() {
        let store = store_with("u1", Profile::new("", ""));
        let service = AutofillService::new(StaticAuth::signed_in("u1"), store);

        let notification = service.run(&document());
        assert_eq!(notification, Notification::NoMatches);
        assert!(!notification.is_success());
    }

    struct FailingStore;

    impl ProfileStore for FailingStore {
        fn load_profile(&self, _user: &UserId) -> Result<Option<Profile>> {
            Err(AutofillError::Storage("backend unavailable".to_string()))
        }

        fn save_profile(&self, _user: &UserId, _profile: &Profile) -> Result<()> {
            Err(AutofillError::Storage("backend unavailable".to_string()))
        }
    }

    struct CountingDocument {
        queries: Cell<usize>,
    }

    impl FormDocument for CountingDocument {
        type Control = MemoryElement;

        fn query_all(&self, _selector: &str) -> Result<Vec<MemoryElement>> {
            self.queries.set(self.queries.get() + 1);
            Err(AutofillError::Document("frame detached".to_string()))
        }
    }

    #[test]
    fn test_store_failure_skips_filler() {
        let service = AutofillService::new(StaticAuth::signed_in("u1"), FailingStore);
        let doc = CountingDocument {
            queries: Cell::new(0),
        };

        let notification = service.run(&doc);
        assert!(matches!(notification, Notification::Failure { .. }));
        assert_eq!(doc.queries.get(), 0);
    }

    #[test]
    fn test_document_failure_is_reported() {
        let store = store_with("u1", Profile::new("a@b.com", ""));
        let service = AutofillService::new(StaticAuth::signed_in("u1"), store);
        let doc = CountingDocument {
            queries: Cell::new(0),
        };

        let notification = service.run(&doc);
        assert_eq!(doc.queries.get(), 1);
        assert_eq!(
            notification.message(),
            "Autofill failed: Document error: frame detached"
        );
    }

    #[test]
    fn test_try_run_separates_prompts_from_failures() {
        let signed_out = AutofillService::new(StaticAuth::signed_out(), MemoryProfileStore::new());
        assert_eq!(signed_out.try_run(&document()).unwrap(), Notification::LoggedOut);

        let no_profile =
            AutofillService::new(StaticAuth::signed_in("u1"), MemoryProfileStore::new());
        assert_eq!(no_profile.try_run(&document()).unwrap(), Notification::ProfileMissing);

        let broken_store = AutofillService::new(StaticAuth::signed_in("u1"), FailingStore);
        let err = broken_store.try_run(&document()).unwrap_err();
        assert!(matches!(err, AutofillError::Storage(_)));
        assert!(!err.is_recoverable());

        let store = store_with("u1", Profile::new("a@b.com", ""));
        let service = AutofillService::new(StaticAuth::signed_in("u1"), store);
        let doc = CountingDocument {
            queries: Cell::new(0),
        };
        assert!(matches!(service.try_run(&doc), Err(AutofillError::Document(_))));
    }

    #[test]
    fn test_memory_store_validates_on_save() {
        let store = MemoryProfileStore::new();
        let err = store
            .save_profile(&UserId::new("u1"), &Profile::new("not-an-email", ""))
            .unwrap_err();
        assert!(matches!(err, AutofillError::InvalidProfile(_)));
        assert!(store.load_profile(&UserId::new("u1")).unwrap().is_none());
    }

    #[test]
    fn test_notification_messages() {
        assert_eq!(Notification::Filled { count: 1 }.message(), "Filled 1 field.");
        assert!(Notification::LoggedOut.message().contains("sign in"));
        let json = serde_json::to_string(&Notification::Filled { count: 3 }).unwrap();
        assert_eq!(json, r#"{"kind":"filled","count":3}"#);
    }
}
