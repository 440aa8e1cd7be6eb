//! Form Filler
//!
//! One synchronous pass over a document's form controls. Each control is
//! handled on its own:
//! 1. controls of an excluded type are skipped
//! 2. the rule set derives a value
//! 3. values that trim to nothing are discarded
//! 4. the trimmed value is written, then bubbling `input` and `change`
//!    events are dispatched
//! 5. the control is counted
//!
//! Document errors propagate as they occur; controls already written stay
//! written.

use crate::dom::{
    ControlDescriptor, EventKind, FillEvent, FormControl, FormDocument, FORM_CONTROL_SELECTOR,
};
use crate::error::Result;
use crate::profile::Profile;
use crate::rules::{is_excluded, RuleSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Events fired after every write, in order
const FILL_EVENTS: [EventKind; 2] = [EventKind::Input, EventKind::Change];

/// Outcome of one fill pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillResult {
    pub filled_count: usize,
}

impl FillResult {
    pub fn is_empty(&self) -> bool {
        self.filled_count == 0
    }
}

/// Stateless filler; holds only its rule set
#[derive(Debug, Default)]
pub struct FormFiller {
    rules: RuleSet,
}

impl FormFiller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(rules: RuleSet) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Fill every matching control of `root` from `profile`
    pub fn fill<D: FormDocument>(&self, profile: &Profile, root: &D) -> Result<FillResult> {
        let controls = root.query_all(FORM_CONTROL_SELECTOR)?;
        debug!("Found {} form controls", controls.len());

        let mut result = FillResult::default();
        for control in &controls {
            if self.fill_control(profile, control)? {
                result.filled_count += 1;
            }
        }

        info!(
            "Filled {} of {} form controls",
            result.filled_count,
            controls.len()
        );
        Ok(result)
    }

    /// Returns whether the control was written
    fn fill_control<C: FormControl>(&self, profile: &Profile, control: &C) -> Result<bool> {
        let desc = ControlDescriptor::read(control)?;
        if is_excluded(&desc) {
            return Ok(false);
        }

        let Some(derived) = self.rules.derive(&desc, profile) else {
            return Ok(false);
        };

        let value = derived.value.trim();
        if value.is_empty() {
            debug!(
                "Rule '{}' matched <{} name='{}' id='{}'> but derived nothing",
                derived.rule, desc.tag, desc.name, desc.id
            );
            return Ok(false);
        }

        control.set_value(value)?;
        for kind in FILL_EVENTS {
            control.dispatch(&FillEvent::bubbling(kind))?;
        }

        debug!(
            "Rule '{}' filled <{} name='{}' id='{}'>",
            derived.rule, desc.tag, desc.name, desc.id
        );
        Ok(true)
    }
}
