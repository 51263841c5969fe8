//! Diagnostic routing.
//!
//! One entry point per call shape: [`emit`] for a bare diagnostic,
//! [`emit_with_context`] when the caller has request-specific detail to
//! attach. Routing: through the `log` crate when that feature is
//! enabled, otherwise to stderr in debug builds or under the
//! `diagnostics` feature, otherwise compiled out. Tests toggle
//! [`suppress_diagnostics`] around scenarios that provoke warnings on
//! purpose.

use std::sync::atomic::{AtomicBool, Ordering};

use super::kind::{Diagnostic, DiagnosticKind};

static SUPPRESSED: AtomicBool = AtomicBool::new(false);
static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Silence diagnostic output process-wide.
pub fn suppress_diagnostics(suppress: bool) {
    SUPPRESSED.store(suppress, Ordering::Relaxed);
}

/// Append a backtrace hint to error diagnostics.
pub fn set_verbose(verbose: bool) {
    VERBOSE.store(verbose, Ordering::Relaxed);
}

/// Check whether diagnostic output is currently suppressed.
pub fn is_suppressed() -> bool {
    SUPPRESSED.load(Ordering::Relaxed)
}

/// Emit a diagnostic.
pub fn emit(diag: &Diagnostic) {
    dispatch(diag, None);
}

/// Emit a diagnostic with request-specific context appended.
pub fn emit_with_context(diag: &Diagnostic, context: &str) {
    dispatch(diag, Some(context));
}

fn dispatch(diag: &Diagnostic, context: Option<&str>) {
    if is_suppressed() {
        return;
    }

    #[cfg(feature = "log")]
    to_log(diag, context);

    #[cfg(all(not(feature = "log"), any(debug_assertions, feature = "diagnostics")))]
    eprint!("{}", render(diag, context));

    #[cfg(not(any(feature = "log", debug_assertions, feature = "diagnostics")))]
    let _ = (diag, context);
}

/// Format the full stderr report, trailing blank line included. Built
/// as one string so concurrent reports don't interleave line by line.
#[cfg(all(not(feature = "log"), any(debug_assertions, feature = "diagnostics")))]
fn render(diag: &Diagnostic, context: Option<&str>) -> String {
    use std::fmt::Write;

    let mut out = String::new();
    let _ = writeln!(
        out,
        "[readback][{}] {}: {}",
        diag.code,
        diag.kind.prefix(),
        diag.message
    );
    if let Some(context) = context {
        let _ = writeln!(out, "  context: {}", context);
    }
    if let Some(note) = diag.note {
        let _ = writeln!(out, "  note: {}", note);
    }
    if let Some(help) = diag.help {
        let _ = writeln!(out, "  help: {}", help);
    }
    if diag.kind == DiagnosticKind::Error && VERBOSE.load(Ordering::Relaxed) {
        let _ = writeln!(out, "  hint: set RUST_BACKTRACE=1 for a backtrace");
    }
    out.push('\n');
    out
}

#[cfg(feature = "log")]
fn to_log(diag: &Diagnostic, context: Option<&str>) {
    match diag.kind {
        DiagnosticKind::Error => log::error!("[{}] {}", diag.code, diag.message),
        DiagnosticKind::Warning => log::warn!("[{}] {}", diag.code, diag.message),
        DiagnosticKind::Note | DiagnosticKind::Help => {
            log::info!("[{}] {}", diag.code, diag.message)
        }
    }
    if let Some(context) = context {
        log::info!("  context: {}", context);
    }
    if let Some(note) = diag.note {
        log::info!("  note: {}", note);
    }
    if let Some(help) = diag.help {
        log::info!("  help: {}", help);
    }
}

/// Pluggable receiver for diagnostics, e.g. a test harness or an
/// engine-side overlay.
pub trait DiagnosticSink: Send + Sync {
    /// Handle one diagnostic.
    fn emit(&self, diag: &Diagnostic);
}

/// Sink that keeps every diagnostic it receives, for assertions.
#[derive(Default)]
pub struct CollectingSink {
    collected: std::sync::Mutex<Vec<Diagnostic>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything received so far.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.collected.lock().unwrap().clone()
    }

    /// Check whether any error-severity diagnostic came through.
    pub fn has_errors(&self) -> bool {
        self.collected
            .lock()
            .unwrap()
            .iter()
            .any(|d| d.kind == DiagnosticKind::Error)
    }

    /// Drop everything received so far.
    pub fn clear(&self) {
        self.collected.lock().unwrap().clear();
    }
}

impl DiagnosticSink for CollectingSink {
    fn emit(&self, diag: &Diagnostic) {
        self.collected.lock().unwrap().push(diag.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::kind::{RB001, RB102};

    #[test]
    fn test_collecting_sink() {
        let sink = CollectingSink::new();
        sink.emit(&RB001);
        sink.emit(&RB102);

        assert_eq!(sink.diagnostics().len(), 2);
        assert!(sink.has_errors());

        sink.clear();
        assert_eq!(sink.diagnostics().len(), 0);
        assert!(!sink.has_errors());
    }
}
