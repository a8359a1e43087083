//! Moves `<style>` rules into per-element `style` attributes.
//!
//! ```
//! let html = "<style>.title { font-weight: bold; }</style><h1 class=\"title\">Hi</h1>";
//! let out = blazeinline_lib::inline_styles(html).unwrap();
//! assert!(out.contains("<h1 class=\"title\" style=\"font-weight: bold;\">Hi</h1>"));
//! assert!(!out.contains("<style>"));
//! ```
//!
//! [`Inliner`] carries the options and the diagnostics sink; the free
//! functions below use its defaults.

pub mod blaze_inline;
pub mod diagnostics;
pub mod dom;
pub mod error;
pub mod options;
pub mod parser;
pub mod style;

pub use blaze_inline::{InlineReport, InlinedDocument, Inliner, RuleOutcome};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, LogDiagnostics, SilentDiagnostics};
pub use error::{InlineError, ParseError, QueryError};
pub use options::{ApplyOrder, InlineOptions, MediaPolicy, RuleSource};
pub use style::css_rules::CssRule;

pub fn inline_styles(html: &str) -> Result<String, InlineError> {
    Inliner::default().inline(html)
}

/// Like [`inline_styles`] but never fails. See [`Inliner::inline_safe`].
pub fn inline_styles_safe(html: &str) -> String {
    Inliner::default().inline_safe(html)
}

pub fn strip_style_tags(html: &str) -> Result<String, InlineError> {
    Inliner::default().strip_style_tags(html)
}

pub fn remove_tags_keep_content(html: &str, tag: &str) -> Result<String, InlineError> {
    Inliner::default().remove_tags_keep_content(html, tag)
}

pub fn inline_batch_safe<S: AsRef<str> + Sync>(documents: &[S]) -> Vec<String> {
    Inliner::default().inline_batch_safe(documents)
}
