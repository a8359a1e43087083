//! Event sink for the non-fatal things that happen during a call.
//!
//! The library never prints. By default events go to the `log` facade, which
//! stays silent until the application installs a logger.

use crate::error::{InlineError, QueryError};
use std::fmt;
use std::sync::{Mutex, PoisonError};

#[derive(Debug)]
pub enum Diagnostic<'a> {
    /// A rule matched nothing because its selector could not be compiled.
    RuleSkipped {
        selectors: &'a str,
        error: &'a QueryError,
    },
    SelectorRewritten {
        original: &'a str,
        rewritten: &'a str,
    },
    SelectorDropped { selector: &'a str },
    HtmlParseError { message: &'a str },
    /// Full inlining failed; falling back to stripping `<style>` elements.
    InlineFailed { error: &'a InlineError },
    /// Stripping failed too; the input is returned unchanged.
    StripFailed { error: &'a InlineError },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    RuleSkipped,
    SelectorRewritten,
    SelectorDropped,
    HtmlParseError,
    InlineFailed,
    StripFailed,
}

impl Diagnostic<'_> {
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            Diagnostic::RuleSkipped { .. } => DiagnosticKind::RuleSkipped,
            Diagnostic::SelectorRewritten { .. } => DiagnosticKind::SelectorRewritten,
            Diagnostic::SelectorDropped { .. } => DiagnosticKind::SelectorDropped,
            Diagnostic::HtmlParseError { .. } => DiagnosticKind::HtmlParseError,
            Diagnostic::InlineFailed { .. } => DiagnosticKind::InlineFailed,
            Diagnostic::StripFailed { .. } => DiagnosticKind::StripFailed,
        }
    }
}

impl fmt::Display for Diagnostic<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::RuleSkipped { selectors, error } => {
                write!(f, "skipping rule `{selectors}`: {error}")
            }
            Diagnostic::SelectorRewritten { original, rewritten } => {
                write!(f, "rewrote selector `{original}` as `{rewritten}`")
            }
            Diagnostic::SelectorDropped { selector } => {
                write!(f, "dropped unsupported selector `{selector}`")
            }
            Diagnostic::HtmlParseError { message } => write!(f, "HTML parse error: {message}"),
            Diagnostic::InlineFailed { error } => {
                write!(f, "inlining failed, stripping <style> elements instead: {error}")
            }
            Diagnostic::StripFailed { error } => {
                write!(f, "fallback failed, returning input unchanged: {error}")
            }
        }
    }
}

pub trait Diagnostics: Send + Sync {
    fn emit(&self, diagnostic: &Diagnostic<'_>);
}

/// Forwards every event to `log` under the `blazeinline` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn emit(&self, diagnostic: &Diagnostic<'_>) {
        let level = match diagnostic.kind() {
            DiagnosticKind::SelectorRewritten
            | DiagnosticKind::SelectorDropped
            | DiagnosticKind::HtmlParseError => log::Level::Debug,
            DiagnosticKind::RuleSkipped | DiagnosticKind::InlineFailed => log::Level::Warn,
            DiagnosticKind::StripFailed => log::Level::Error,
        };
        log::log!(target: "blazeinline", level, "{}", diagnostic);
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SilentDiagnostics;

impl Diagnostics for SilentDiagnostics {
    fn emit(&self, _diagnostic: &Diagnostic<'_>) {}
}

/// Keeps every event in memory, in emission order.
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    events: Mutex<Vec<(DiagnosticKind, String)>>,
}

impl RecordingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<(DiagnosticKind, String)> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn kinds(&self) -> Vec<DiagnosticKind> {
        self.events().into_iter().map(|(kind, _)| kind).collect()
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn emit(&self, diagnostic: &Diagnostic<'_>) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((diagnostic.kind(), diagnostic.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueryErrorKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn recording_keeps_order_and_messages() {
        let diagnostics = RecordingDiagnostics::new();
        let error = QueryError {
            selector: "a:hover".to_string(),
            kind: QueryErrorKind::UnsupportedPseudo("hover".to_string()),
        };
        diagnostics.emit(&Diagnostic::SelectorDropped { selector: "a[href]" });
        diagnostics.emit(&Diagnostic::RuleSkipped {
            selectors: "a:hover",
            error: &error,
        });

        assert_eq!(
            diagnostics.kinds(),
            vec![DiagnosticKind::SelectorDropped, DiagnosticKind::RuleSkipped]
        );
        let (_, message) = &diagnostics.events()[1];
        assert!(message.starts_with("skipping rule `a:hover`: cannot compile selector"));
    }

    #[test]
    fn sinks_are_shareable() {
        fn assert_sink<T: Diagnostics + 'static>() {}
        assert_sink::<LogDiagnostics>();
        assert_sink::<SilentDiagnostics>();
        assert_sink::<RecordingDiagnostics>();
    }
}
