//! Document Query Interface
//!
//! The filler only needs a way to enumerate form controls and, per control,
//! read a few attributes, write the value and dispatch an event. Anything that
//! implements [`FormDocument`] can be filled: a live page behind a bridge, or
//! the [`memory::MemoryDocument`] used by the binary and the tests.

pub mod memory;

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Tags enumerated on every fill pass
pub const FORM_CONTROL_SELECTOR: &str = "input, textarea, select";

/// Control type assumed when the `type` attribute is missing or blank
pub const DEFAULT_CONTROL_TYPE: &str = "text";

/// A queryable document
pub trait FormDocument {
    type Control: FormControl;

    /// All elements matching a comma-separated tag list, in document order
    fn query_all(&self, selector: &str) -> Result<Vec<Self::Control>>;
}

/// Handle to one element owned by a document
///
/// Handles write through `&self`; the document owns the mutable state.
pub trait FormControl {
    fn tag_name(&self) -> Result<String>;

    /// Raw attribute value, `None` when absent
    fn attribute(&self, name: &str) -> Result<Option<String>>;

    fn value(&self) -> Result<String>;

    fn set_value(&self, value: &str) -> Result<()>;

    fn dispatch(&self, event: &FillEvent) -> Result<()>;
}

/// Notification kinds fired after a programmatic write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Input,
    Change,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Input => "input",
            EventKind::Change => "change",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillEvent {
    pub kind: EventKind,
    pub bubbles: bool,
}

impl FillEvent {
    pub fn bubbling(kind: EventKind) -> Self {
        Self {
            kind,
            bubbles: true,
        }
    }
}

/// Lower-cased descriptors the rules match against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlDescriptor {
    pub tag: String,
    pub name: String,
    pub id: String,
    pub control_type: String,
}

impl ControlDescriptor {
    /// Read descriptors from a live control
    pub fn read<C: FormControl>(control: &C) -> Result<Self> {
        let lowered = |value: Option<String>| value.unwrap_or_default().to_lowercase();

        let control_type = lowered(control.attribute("type")?);
        let control_type = if control_type.trim().is_empty() {
            DEFAULT_CONTROL_TYPE.to_string()
        } else {
            control_type
        };

        Ok(Self {
            tag: control.tag_name()?.to_lowercase(),
            name: lowered(control.attribute("name")?),
            id: lowered(control.attribute("id")?),
            control_type,
        })
    }

    #[cfg(test)]
    pub(crate) fn for_test(name: &str, id: &str, control_type: &str) -> Self {
        Self {
            tag: "input".to_string(),
            name: name.to_string(),
            id: id.to_string(),
            control_type: control_type.to_string(),
        }
    }
}
