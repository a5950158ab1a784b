//! Diagnostic output for the `censo` binary
//!
//! Two emitters share one reporting [`Policy`]:
//! - [`TerminalEmitter`] prints rustc-style blocks as diagnostics arrive
//! - [`JsonEmitter`] buffers them into the run document printed at the end
//!
//! `--strict` raises warnings to errors and hints to warnings. `--quiet` hides
//! everything below error. Exit status:
//!
//! | Status | When |
//! |--------|------|
//! | 0 | no error after policy (warnings, hints and unit summaries are fine) |
//! | 1 | at least one error after policy, or the workbook could not be written |
//!
//! Hidden diagnostics are still tallied, so `--quiet` never changes the status.

use std::io::Write;
use std::process;

use censo_core::{Diagnostic, DiagnosticEmitter, Severity};
use serde::Serialize;

// ============================================================================
// Exit status
// ============================================================================

/// Process exit status of a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    Failure = 1,
}

impl ExitCode {
    pub fn is_success(self) -> bool {
        self == ExitCode::Success
    }
}

impl From<ExitCode> for process::ExitCode {
    fn from(code: ExitCode) -> Self {
        process::ExitCode::from(code as u8)
    }
}

// ============================================================================
// Policy
// ============================================================================

/// How diagnostics are escalated and filtered
#[derive(Debug, Clone, Copy, Default)]
pub struct Policy {
    pub strict: bool,
    pub quiet: bool,
}

impl Policy {
    /// Severity after `--strict`
    pub fn severity(&self, native: Severity) -> Severity {
        match (self.strict, native) {
            (true, Severity::Warning) => Severity::Error,
            (true, Severity::Hint) => Severity::Warning,
            (_, severity) => severity,
        }
    }

    /// Whether a diagnostic of this effective severity is printed
    pub fn shows(&self, effective: Severity) -> bool {
        !self.quiet || effective == Severity::Error
    }
}

/// Running count of effective errors and warnings
#[derive(Debug, Clone, Copy, Default)]
pub struct Tally {
    pub errors: usize,
    pub warnings: usize,
}

impl Tally {
    fn record(&mut self, effective: Severity) {
        match effective {
            Severity::Error => self.errors += 1,
            Severity::Warning => self.warnings += 1,
            Severity::Hint | Severity::Info => {}
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        if self.errors == 0 {
            ExitCode::Success
        } else {
            ExitCode::Failure
        }
    }
}

// ============================================================================
// Terminal
// ============================================================================

/// Prints each diagnostic as a block:
///
/// ```text
/// warning[W001]: location '99/1' does not match the topology
///   --> unit PAMC
///    |
///    = 2 record(s) dropped
///    = hint: wing '99' is not configured for this unit
/// ```
pub struct TerminalEmitter<W: Write> {
    out: W,
    policy: Policy,
    tally: Tally,
}

impl<W: Write> TerminalEmitter<W> {
    pub fn new(out: W, policy: Policy) -> Self {
        Self {
            out,
            policy,
            tally: Tally::default(),
        }
    }

    pub fn tally(&self) -> Tally {
        self.tally
    }

    pub fn exit_code(&self) -> ExitCode {
        self.tally.exit_code()
    }

    fn print(&mut self, effective: Severity, diagnostic: &Diagnostic) -> std::io::Result<()> {
        let out = &mut self.out;
        writeln!(
            out,
            "{}[{}]: {}",
            effective.as_str(),
            diagnostic.code.as_str(),
            diagnostic.message
        )?;
        if let Some(unit) = &diagnostic.unit {
            writeln!(out, "  --> unit {unit}")?;
        }
        if !diagnostic.notes.is_empty() || !diagnostic.hints.is_empty() {
            writeln!(out, "   |")?;
        }
        for note in &diagnostic.notes {
            writeln!(out, "   = {note}")?;
        }
        for hint in &diagnostic.hints {
            writeln!(out, "   = hint: {hint}")?;
        }
        writeln!(out)
    }
}

impl<W: Write> DiagnosticEmitter for TerminalEmitter<W> {
    fn emit(&mut self, diagnostic: Diagnostic) {
        let effective = self.policy.severity(diagnostic.severity);
        self.tally.record(effective);
        if self.policy.shows(effective) {
            // Nothing useful to do when stderr is gone.
            let _ = self.print(effective, &diagnostic);
        }
    }
}

// ============================================================================
// JSON
// ============================================================================

/// One diagnostic in the JSON run document
#[derive(Debug, Serialize)]
pub struct JsonDiagnostic {
    pub code: &'static str,
    pub severity: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hints: Vec<String>,
}

/// Buffers diagnostics for the JSON run document
#[derive(Debug, Default)]
pub struct JsonEmitter {
    policy: Policy,
    tally: Tally,
    buffered: Vec<JsonDiagnostic>,
}

impl JsonEmitter {
    pub fn new(policy: Policy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn buffered(&self) -> &[JsonDiagnostic] {
        &self.buffered
    }

    pub fn exit_code(&self) -> ExitCode {
        self.tally.exit_code()
    }

    /// Attach the buffered diagnostics to a run document under `"diagnostics"`
    pub fn finish(self, mut document: serde_json::Value) -> serde_json::Value {
        if let Some(map) = document.as_object_mut() {
            let diagnostics = serde_json::to_value(&self.buffered).unwrap_or_default();
            map.insert("diagnostics".into(), diagnostics);
        }
        document
    }
}

impl DiagnosticEmitter for JsonEmitter {
    fn emit(&mut self, diagnostic: Diagnostic) {
        let effective = self.policy.severity(diagnostic.severity);
        self.tally.record(effective);
        if !self.policy.shows(effective) {
            return;
        }
        self.buffered.push(JsonDiagnostic {
            code: diagnostic.code.as_str(),
            severity: effective.as_str(),
            message: diagnostic.message,
            unit: diagnostic.unit,
            notes: diagnostic.notes,
            hints: diagnostic.hints,
        });
    }
}
