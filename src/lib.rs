//! Profile Autofill
//!
//! Copies a user's stored profile into the form controls of a page.
//!
//! ## Features
//! - Scans `input`, `textarea` and `select` controls of any [`dom::FormDocument`]
//! - Ordered, extensible fill rules (email address, person name)
//! - Fires bubbling `input` and `change` events after every write
//! - Reports the outcome as a user-facing notification
//!
//! ## Architecture
//! - `dom` - document query interface and the in-memory document
//! - `rules` - exclusion filter and value-derivation rules
//! - `filler` - the fill pass
//! - `service` - auth/profile collaborators and the orchestrator
//! - `store` / `credentials_store` - JSON profile store, keyring session

pub mod config;
pub mod credentials_store;
pub mod dom;
pub mod error;
pub mod filler;
pub mod profile;
pub mod rules;
pub mod service;
pub mod store;

pub use error::{AutofillError, Result};
pub use filler::{FillResult, FormFiller};
pub use profile::Profile;
