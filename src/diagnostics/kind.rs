//! Diagnostic severities, the diagnostic value type, and the code table.
//!
//! Severities and prefixes follow rustc's vocabulary so reports read
//! like compiler output.

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// Contract violation. The crate panics right after emitting these.
    Error,
    /// Degraded but recoverable outcome.
    Warning,
    /// Extra context attached to another diagnostic.
    Note,
    /// Actionable suggestion attached to another diagnostic.
    Help,
}

impl DiagnosticKind {
    /// Display prefix, e.g. `warning` in `[readback][RB102] warning: ...`.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Note => "note",
            Self::Help => "help",
        }
    }
}

/// One coded diagnostic, built as a `const` and emitted by reference.
///
/// Code ranges:
/// - `RB0xx` - API contract violations
/// - `RB1xx` - Transfer lifecycle issues
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Stable code, e.g. "RB001".
    pub code: &'static str,
    /// Severity.
    pub kind: DiagnosticKind,
    /// Primary message.
    pub message: &'static str,
    /// Extra context, if any.
    pub note: Option<&'static str>,
    /// Fix suggestion, if any.
    pub help: Option<&'static str>,
}

impl Diagnostic {
    const fn new(kind: DiagnosticKind, code: &'static str, message: &'static str) -> Self {
        Self {
            code,
            kind,
            message,
            note: None,
            help: None,
        }
    }

    /// Define an error diagnostic.
    pub const fn error(code: &'static str, message: &'static str) -> Self {
        Self::new(DiagnosticKind::Error, code, message)
    }

    /// Define a warning diagnostic.
    pub const fn warning(code: &'static str, message: &'static str) -> Self {
        Self::new(DiagnosticKind::Warning, code, message)
    }

    /// Attach a note.
    pub const fn with_note(mut self, note: &'static str) -> Self {
        self.note = Some(note);
        self
    }

    /// Attach a fix suggestion.
    pub const fn with_help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }
}

// =============================================================================
// Predefined diagnostics (RB0xx - API contract violations)
// =============================================================================

/// RB001: Readback used without a registered render scheduler.
pub const RB001: Diagnostic = Diagnostic::error(
    "RB001",
    "readback used without a registered render scheduler"
).with_note("requests cannot reach the render thread until a scheduler bridge is installed")
 .with_help("call set_scheduler() before creating or updating requests");

/// RB002: Blocking wait issued from inside a render pass.
pub const RB002: Diagnostic = Diagnostic::error(
    "RB002",
    "wait_for_completion called from inside a render pass"
).with_note("the wait would block the thread that must run the scheduled advance callbacks")
 .with_help("wait from a control or worker thread, or poll is_done() instead");

// =============================================================================
// Predefined diagnostics (RB1xx - Transfer lifecycle)
// =============================================================================

/// RB101: Transfer failed to start.
pub const RB101: Diagnostic = Diagnostic::warning(
    "RB101",
    "transfer failed to start"
).with_note("the backend rejected resource introspection or the staging copy")
 .with_help("check that the resource handle is valid and its format has a byte-addressable layout");

/// RB102: Result truncated to the caller-supplied buffer.
pub const RB102: Diagnostic = Diagnostic::warning(
    "RB102",
    "readback result truncated to the caller-supplied buffer"
).with_note("the backend produced more bytes than the destination can hold; the copy was clamped")
 .with_help("size the destination as width * height * depth * bytes_per_pixel for the requested mip level");

/// RB103: Completion fence lost during polling.
pub const RB103: Diagnostic = Diagnostic::warning(
    "RB103",
    "completion fence lost before the copy finished"
).with_note("the fence or mapping failed while the transfer was still in flight")
 .with_help("the request is marked failed; check for device loss or resource destruction");
