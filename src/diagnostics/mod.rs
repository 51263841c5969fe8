//! Runtime diagnostics with stable codes.
//!
//! Misuse of the readback API and degraded transfer outcomes are reported
//! through coded diagnostics rather than panics wherever the service can
//! keep going. Output goes to stderr in debug builds, through the log
//! crate when the `log` feature is enabled, or nowhere in plain release
//! builds (enable the `diagnostics` feature to keep them).
//!
//! ## Diagnostic Codes
//!
//! | Code  | Meaning                        |
//! |-------|--------------------------------|
//! | RB0xx | API contract violations        |
//! | RB1xx | Transfer lifecycle issues      |

// Core diagnostic types
pub mod emit;
pub mod kind;

// Re-export core types
pub use emit::{
    emit, emit_with_context, set_verbose, suppress_diagnostics, CollectingSink, DiagnosticSink,
};
pub use kind::{Diagnostic, DiagnosticKind};

// Re-export predefined diagnostics
pub use kind::{RB001, RB002, RB101, RB102, RB103};
