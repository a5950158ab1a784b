//! Diagnostics emitted while classifying records and filling report sheets
//!
//! Nothing in the engine logs through a global: every stage that can drop data or
//! detect drift receives a `&mut dyn DiagnosticEmitter` and reports through it.
//! Output (terminal, JSON) is the caller's concern.
//!
//! ## Codes
//!
//! | Code | Severity | Meaning |
//! |------|----------|---------|
//! | W001 | warning | record does not resolve against the topology |
//! | W002 | warning | count or form entry has no slot in the template |
//! | W003 | warning | Control slot has no SEI counterpart |
//! | W004 | warning | SEI form wing missing from topology or overflowing the form |
//! | W005 | warning | unit produced no classified records and was skipped |
//! | E001 | error | requested unit is not configured |
//! | E002 | error | topology document is invalid |
//! | E003 | error | no unit produced report data |
//! | I001 | info | per-unit processing summary |

use serde::Serialize;

/// Diagnostic severity
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Hint,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Hint => "hint",
            Severity::Info => "info",
        }
    }
}

/// Stable diagnostic codes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticCode {
    W001UnresolvedRecord,
    W002TemplateDrift,
    W003UnmirroredSlot,
    W004FormDrift,
    W005EmptyUnit,
    E001UnknownUnit,
    E002InvalidTopology,
    E003NoReportData,
    I001UnitSummary,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticCode::W001UnresolvedRecord => "W001",
            DiagnosticCode::W002TemplateDrift => "W002",
            DiagnosticCode::W003UnmirroredSlot => "W003",
            DiagnosticCode::W004FormDrift => "W004",
            DiagnosticCode::W005EmptyUnit => "W005",
            DiagnosticCode::E001UnknownUnit => "E001",
            DiagnosticCode::E002InvalidTopology => "E002",
            DiagnosticCode::E003NoReportData => "E003",
            DiagnosticCode::I001UnitSummary => "I001",
        }
    }

    pub fn default_severity(&self) -> Severity {
        match self.as_str().as_bytes().first() {
            Some(b'E') => Severity::Error,
            Some(b'W') => Severity::Warning,
            Some(b'H') => Severity::Hint,
            _ => Severity::Info,
        }
    }
}

/// A single diagnostic message
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub severity: Severity,
    pub message: String,
    /// Unit the diagnostic refers to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub notes: Vec<String>,
    pub hints: Vec<String>,
}

impl Diagnostic {
    pub fn new(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            code,
            severity: code.default_severity(),
            message: message.into(),
            unit: None,
            notes: Vec::new(),
            hints: Vec::new(),
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hints.push(hint.into());
        self
    }
}

/// Sink for diagnostics
pub trait DiagnosticEmitter {
    fn emit(&mut self, diagnostic: Diagnostic);
}

/// Emitter that keeps every diagnostic in memory
#[derive(Debug, Default)]
pub struct CollectingEmitter {
    pub diagnostics: Vec<Diagnostic>,
}

impl CollectingEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Diagnostics with the given code
    pub fn with_code(&self, code: DiagnosticCode) -> Vec<&Diagnostic> {
        self.diagnostics.iter().filter(|d| d.code == code).collect()
    }

    pub fn count(&self, code: DiagnosticCode) -> usize {
        self.diagnostics.iter().filter(|d| d.code == code).count()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }
}

impl DiagnosticEmitter for CollectingEmitter {
    fn emit(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}
