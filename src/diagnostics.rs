//! Diagnostic sink for non-fatal misuse reports.

use std::fmt;

/// A non-fatal report raised by the set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Diagnostic {
    /// A mutator ran while an event listener was executing. The mutation
    /// still happens, but the resulting event order depends on listener order.
    ReentrantMutation { operation: &'static str },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::ReentrantMutation { operation } => write!(
                f,
                "reentrant mutation `{}` while an event listener is running",
                operation
            ),
        }
    }
}

/// Receiver for [`Diagnostic`]s, injected through `SetConfig`.
pub trait DiagnosticSink {
    fn warn(&self, diagnostic: &Diagnostic);
}

/// Discards every diagnostic. The default sink.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopDiagnostics;

impl DiagnosticSink for NoopDiagnostics {
    fn warn(&self, _diagnostic: &Diagnostic) {}
}

/// Forwards diagnostics to `tracing` at WARN level.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingDiagnostics;

impl DiagnosticSink for TracingDiagnostics {
    fn warn(&self, diagnostic: &Diagnostic) {
        match diagnostic {
            Diagnostic::ReentrantMutation { operation } => {
                tracing::warn!(operation = *operation, "{}", diagnostic);
            }
        }
    }
}

impl<F> DiagnosticSink for F
where
    F: Fn(&Diagnostic),
{
    fn warn(&self, diagnostic: &Diagnostic) {
        self(diagnostic)
    }
}
