//! Result types for classification and rule evaluation.

use std::borrow::Cow;

use pgaudit_config::{AuditClass, AuditLogLevel};
use serde::Serialize;

/// The class assigned to an event plus the text to display for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification<'a> {
    /// Single-bit class.
    pub class: AuditClass,
    pub class_name: &'static str,
    /// Statement text (redacted when it carried a password) or message text.
    /// Borrowed from the event unless redaction produced a new string.
    pub display_text: Option<Cow<'a, str>>,
}

/// Outcome of evaluating one event against every rule section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EvalResult {
    /// At least one rule section matched.
    pub matched: bool,
    /// One entry per rule section, in configuration order.
    pub per_rule: Vec<bool>,
}

impl EvalResult {
    /// Index of the first matching rule section.
    pub fn first_match(&self) -> Option<usize> {
        self.per_rule.iter().position(|&m| m)
    }

    /// Indices of all matching rule sections, in order.
    pub fn matched_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.per_rule
            .iter()
            .enumerate()
            .filter_map(|(i, &m)| m.then_some(i))
    }
}

/// Everything produced for one audited event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditRecord {
    pub class: AuditClass,
    pub class_name: &'static str,
    /// Severity the lines should be emitted at.
    pub level: AuditLogLevel,
    pub matched: bool,
    pub per_rule: Vec<bool>,
    /// Logged as a single object audit line instead of per-rule lines.
    pub object_audit: bool,
    /// Rendered audit lines, one per matching rule section.
    pub lines: Vec<String>,
}
