//! Error Types for Profile Autofill
//!
//! Every fallible operation in the crate returns [`AutofillError`].

use thiserror::Error;

/// Result type alias using our error type
pub type Result<T> = std::result::Result<T, AutofillError>;

/// Main error type for the application
#[derive(Error, Debug)]
pub enum AutofillError {
    // ===== Document Errors =====
    /// The document could not be queried or mutated
    #[error("Document error: {0}")]
    Document(String),

    // ===== Collaborator Errors =====
    /// No signed-in user
    #[error("Not signed in")]
    NotSignedIn,

    /// Signed in, but no profile stored for the user
    #[error("No profile stored for user: {0}")]
    ProfileMissing(String),

    /// Profile record failed validation
    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    /// Profile storage could not be read or written
    #[error("Storage error: {0}")]
    Storage(String),

    // ===== Configuration Errors =====
    /// Configuration could not be located, read or written
    #[error("Config error: {0}")]
    Config(String),

    // ===== I/O Errors =====
    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    // ===== Keyring Errors =====
    /// Keyring/credential storage error
    #[error("Keyring error: {0}")]
    KeyringError(String),
}

impl AutofillError {
    /// Check if this error asks the user to sign in or set up a profile
    /// rather than signalling a fault
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AutofillError::NotSignedIn | AutofillError::ProfileMissing(_)
        )
    }
}
