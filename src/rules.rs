//! Fill Rules
//!
//! Decides which profile value, if any, belongs in a control. Rules are kept
//! in an ordered list of `(predicate, extractor)` pairs; the first rule whose
//! predicate accepts a control produces its value and no later rule is asked.

use crate::dom::ControlDescriptor;
use crate::profile::Profile;
use once_cell::sync::Lazy;
use regex::Regex;

/// Control types never read, written or counted
pub const EXCLUDED_TYPES: &[&str] = &["hidden", "submit", "button"];

/// Captures the letters and whitespace following "name is "
static NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"name is ([\p{L}\s]+)").expect("valid name pattern"));

/// Whether the filler must skip a control entirely
pub fn is_excluded(desc: &ControlDescriptor) -> bool {
    EXCLUDED_TYPES.contains(&desc.control_type.as_str())
}

/// A single value-derivation rule
pub trait FillRule: Send + Sync {
    /// Short label used in logs and [`Derived::rule`]
    fn name(&self) -> &'static str;

    /// Predicate: whether this rule owns the control
    fn applies(&self, desc: &ControlDescriptor) -> bool;

    /// Extractor: the raw derived value, possibly empty
    ///
    /// Only called when [`FillRule::applies`] accepted the control. The filler
    /// trims the result and skips the write when nothing is left.
    fn derive(&self, desc: &ControlDescriptor, profile: &Profile) -> String;
}

/// Rule A: email controls receive the profile's address
#[derive(Debug, Default, Clone, Copy)]
pub struct EmailRule;

impl FillRule for EmailRule {
    fn name(&self) -> &'static str {
        "email"
    }

    fn applies(&self, desc: &ControlDescriptor) -> bool {
        desc.control_type == "email"
    }

    fn derive(&self, _desc: &ControlDescriptor, profile: &Profile) -> String {
        profile.email.clone()
    }
}

/// Rule B: name-like controls receive a person name found in the free text
#[derive(Debug, Default, Clone, Copy)]
pub struct NameRule;

impl FillRule for NameRule {
    fn name(&self) -> &'static str {
        "name"
    }

    fn applies(&self, desc: &ControlDescriptor) -> bool {
        desc.name.contains("name") || desc.id.contains("name")
    }

    fn derive(&self, _desc: &ControlDescriptor, profile: &Profile) -> String {
        extract_person_name(&profile.raw_profile_data).unwrap_or_default()
    }
}

/// Text captured after the first "name is ", up to the first character that
/// is neither a letter nor whitespace
pub fn extract_person_name(text: &str) -> Option<String> {
    NAME_PATTERN
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Value chosen for a control, tagged with the rule that chose it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Derived {
    pub rule: &'static str,
    pub value: String,
}

/// Ordered rule list
pub struct RuleSet {
    rules: Vec<Box<dyn FillRule>>,
}

impl RuleSet {
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Email rule, then name rule
    pub fn standard() -> Self {
        Self::empty().with(EmailRule).with(NameRule)
    }

    pub fn with(mut self, rule: impl FillRule + 'static) -> Self {
        self.push(rule);
        self
    }

    /// Append a rule after every existing one
    pub fn push(&mut self, rule: impl FillRule + 'static) {
        self.rules.push(Box::new(rule));
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    /// Run the first applicable rule; `None` when no rule applies
    pub fn derive(&self, desc: &ControlDescriptor, profile: &Profile) -> Option<Derived> {
        self.rules
            .iter()
            .find(|rule| rule.applies(desc))
            .map(|rule| Derived {
                rule: rule.name(),
                value: rule.derive(desc, profile),
            })
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleSet")
            .field("rules", &self.rule_names())
            .finish()
    }
}
