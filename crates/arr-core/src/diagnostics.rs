//! Non-fatal issue accumulation for the sizing preprocessor and friends.
//!
//! Mirrors the severity/category/entity shape used elsewhere in this
//! workspace for validation reporting: hard failures still return
//! [`crate::ArrangementError`], but observations that are worth surfacing
//! without aborting the solve accumulate here.

use std::fmt;

/// Severity of a single diagnostic issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A single diagnostic issue, optionally tied to an entity name.
#[derive(Debug, Clone)]
pub struct DiagnosticIssue {
    pub severity: Severity,
    pub category: String,
    pub message: String,
    pub entity: Option<String>,
}

impl DiagnosticIssue {
    pub fn new(severity: Severity, category: &str, message: &str) -> Self {
        Self {
            severity,
            category: category.to_string(),
            message: message.to_string(),
            entity: None,
        }
    }

    pub fn with_entity(mut self, entity: &str) -> Self {
        self.entity = Some(entity.to_string());
        self
    }
}

impl fmt::Display for DiagnosticIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.entity {
            Some(entity) => write!(
                f,
                "[{}] {} ({}): {}",
                self.severity, self.category, entity, self.message
            ),
            None => write!(f, "[{}] {}: {}", self.severity, self.category, self.message),
        }
    }
}

/// An accumulator of non-fatal issues raised while preparing a solve.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    issues: Vec<DiagnosticIssue>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_warning(&mut self, category: &str, message: &str) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Warning, category, message));
    }

    pub fn add_warning_with_entity(&mut self, category: &str, message: &str, entity: &str) {
        self.issues.push(
            DiagnosticIssue::new(Severity::Warning, category, message).with_entity(entity),
        );
    }

    pub fn add_error(&mut self, category: &str, message: &str) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Error, category, message));
    }

    pub fn add_error_with_entity(&mut self, category: &str, message: &str, entity: &str) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Error, category, message).with_entity(entity));
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &DiagnosticIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &DiagnosticIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
    }

    pub fn merge(&mut self, other: Diagnostics) {
        self.issues.extend(other.issues);
    }

    pub fn summary(&self) -> String {
        let warnings = self.warnings().count();
        let errors = self.errors().count();
        match (warnings, errors) {
            (0, 0) => "no issues".to_string(),
            (w, 0) => format!("{w} warning{}", if w == 1 { "" } else { "s" }),
            (0, e) => format!("{e} error{}", if e == 1 { "" } else { "s" }),
            (w, e) => format!(
                "{w} warning{}, {e} error{}",
                if w == 1 { "" } else { "s" },
                if e == 1 { "" } else { "s" }
            ),
        }
    }
}
