use crate::diagnostics::{Diagnostic, Diagnostics, LogDiagnostics};
use crate::dom::dom_tree::{self, Document, NodeRef};
use crate::error::{InlineError, QueryError};
use crate::options::{InlineOptions, RuleSource};
use crate::parser::blaze_html::create_dom_tree;
use crate::style::applicator::apply_rule;
use crate::style::blaze_css::parse_css_rules_lightning;
use crate::style::css_matcher;
use crate::style::css_rules::{parse_css_rules, CssRule};
use crate::style::specificity::rank_rules;
use rayon::prelude::*;
use std::sync::Arc;

/// What happened to one rule during application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleOutcome {
    pub rule: CssRule,
    /// Number of elements styled, or why the selector was skipped.
    pub result: Result<usize, QueryError>,
}

/// Per-rule outcomes in application order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineReport {
    pub outcomes: Vec<RuleOutcome>,
}

impl InlineReport {
    pub fn styled_elements(&self) -> usize {
        self.outcomes
            .iter()
            .filter_map(|outcome| outcome.result.as_ref().ok())
            .sum()
    }

    pub fn skipped(&self) -> impl Iterator<Item = (&CssRule, &QueryError)> {
        self.outcomes
            .iter()
            .filter_map(|outcome| outcome.result.as_ref().err().map(|e| (&outcome.rule, e)))
    }
}

#[derive(Debug, Clone)]
pub struct InlinedDocument {
    pub html: String,
    pub report: InlineReport,
}

/// Runs inlining calls with one set of options and one diagnostics sink.
///
/// Every call parses its own document, so an `Inliner` can be shared across
/// threads.
#[derive(Clone)]
pub struct Inliner {
    options: InlineOptions,
    diagnostics: Arc<dyn Diagnostics>,
}

impl Default for Inliner {
    fn default() -> Self {
        Self::new(InlineOptions::default())
    }
}

impl Inliner {
    pub fn new(options: InlineOptions) -> Self {
        Inliner {
            options,
            diagnostics: Arc::new(LogDiagnostics),
        }
    }

    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn options(&self) -> &InlineOptions {
        &self.options
    }

    /// Inlines every `<style>` rule and returns the serialized document.
    pub fn inline(&self, html: &str) -> Result<String, InlineError> {
        self.inline_with_report(html).map(|inlined| inlined.html)
    }

    pub fn inline_with_report(&self, html: &str) -> Result<InlinedDocument, InlineError> {
        let document = self.parse(html)?;
        let style_tags = style_elements(&document);
        let rules = self.collect_rules(&style_tags)?;

        let outcomes = rank_rules(rules, self.options.apply_order)
            .into_iter()
            .map(|rule| {
                let result = apply_rule(&document, &rule, self.diagnostics.as_ref());
                if let Err(error) = &result {
                    self.diagnostics.emit(&Diagnostic::RuleSkipped {
                        selectors: rule.selectors(),
                        error,
                    });
                }
                RuleOutcome { rule, result }
            })
            .collect();

        if self.options.remove_style_tags {
            style_tags.iter().for_each(dom_tree::detach);
        }

        log::debug!(target: "blazeinline", "inlined {} style elements", style_tags.len());
        Ok(InlinedDocument {
            html: document.html()?,
            report: InlineReport { outcomes },
        })
    }

    /// Inlines if possible, otherwise strips `<style>` elements, otherwise
    /// returns `html` untouched. Never fails.
    pub fn inline_safe(&self, html: &str) -> String {
        match self.inline(html) {
            Ok(inlined) => inlined,
            Err(error) => {
                self.diagnostics.emit(&Diagnostic::InlineFailed { error: &error });
                self.strip_style_tags(html).unwrap_or_else(|error| {
                    self.diagnostics.emit(&Diagnostic::StripFailed { error: &error });
                    html.to_string()
                })
            }
        }
    }

    /// Removes every `<style>` element without inlining anything.
    pub fn strip_style_tags(&self, html: &str) -> Result<String, InlineError> {
        let document = self.parse(html)?;
        style_elements(&document).iter().for_each(dom_tree::detach);
        Ok(document.html()?)
    }

    /// Removes every element matching `tag` but keeps its children in place.
    pub fn remove_tags_keep_content(&self, html: &str, tag: &str) -> Result<String, InlineError> {
        let document = self.parse(html)?;
        match css_matcher::select(&document.root, tag) {
            Ok(elements) => elements.iter().for_each(dom_tree::unwrap),
            Err(error) => self.diagnostics.emit(&Diagnostic::RuleSkipped {
                selectors: tag,
                error: &error,
            }),
        }
        Ok(document.html()?)
    }

    /// `inline_safe` over independent documents in parallel, preserving order.
    pub fn inline_batch_safe<S>(&self, documents: &[S]) -> Vec<String>
    where
        S: AsRef<str> + Sync,
    {
        documents
            .par_iter()
            .map(|html| self.inline_safe(html.as_ref()))
            .collect()
    }

    fn parse(&self, html: &str) -> Result<Document, InlineError> {
        let document = create_dom_tree(html, &self.options)?;
        for message in &document.parse_errors {
            self.diagnostics
                .emit(&Diagnostic::HtmlParseError { message });
        }
        Ok(document)
    }

    fn collect_rules(&self, style_tags: &[NodeRef]) -> Result<Vec<CssRule>, InlineError> {
        let stylesheets: Vec<String> = style_tags.iter().map(dom_tree::text_content).collect();

        if let Some(limit) = self.options.max_stylesheet_bytes {
            let len = stylesheets.iter().map(String::len).sum();
            if len > limit {
                return Err(InlineError::StylesheetTooLarge { len, limit });
            }
        }

        let mut rules = Vec::new();
        for css in &stylesheets {
            match self.options.rule_source {
                RuleSource::Scanner => rules.extend(parse_css_rules(css, self.options.media)),
                RuleSource::Lightning => {
                    rules.extend(parse_css_rules_lightning(css, self.options.media)?)
                }
            }
        }
        Ok(rules)
    }
}

/// All `<style>` elements, in document order.
fn style_elements(document: &Document) -> Vec<NodeRef> {
    let mut found = Vec::new();
    let mut stack = vec![document.root.clone()];
    while let Some(node) = stack.pop() {
        if dom_tree::is_element_named(&node, "style") {
            found.push(node.clone());
        }
        stack.extend(node.borrow().children.iter().rev().cloned());
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{DiagnosticKind, RecordingDiagnostics};
    use pretty_assertions::assert_eq;

    fn recorded(options: InlineOptions) -> (Inliner, Arc<RecordingDiagnostics>) {
        let diagnostics = Arc::new(RecordingDiagnostics::new());
        let inliner = Inliner::new(options).with_diagnostics(diagnostics.clone());
        (inliner, diagnostics)
    }

    #[test]
    fn report_counts_and_skips() {
        let (inliner, diagnostics) = recorded(InlineOptions::default());
        let html = "<style>p { a: b } a:hover { c: d } .x { e: f }</style><p class=\"x\">1</p><p>2</p>";
        let inlined = inliner.inline_with_report(html).unwrap();

        assert_eq!(inlined.report.outcomes.len(), 3);
        assert_eq!(inlined.report.styled_elements(), 3);
        let skipped: Vec<&str> = inlined
            .report
            .skipped()
            .map(|(rule, _)| rule.selectors())
            .collect();
        assert_eq!(skipped, vec!["a:hover"]);
        assert!(diagnostics.kinds().contains(&DiagnosticKind::RuleSkipped));
    }

    #[test]
    fn outcomes_follow_ranked_order() {
        let html = "<style>p { a: b } #i { c: d } .x { e: f }</style><p id=\"i\" class=\"x\">1</p>";
        let order = |inliner: Inliner| {
            inliner
                .inline_with_report(html)
                .unwrap()
                .report
                .outcomes
                .iter()
                .map(|outcome| outcome.rule.selectors().to_string())
                .collect::<Vec<_>>()
        };
        assert_eq!(order(Inliner::default()), vec!["#i", ".x", "p"]);
        assert_eq!(
            order(Inliner::new(
                InlineOptions::default().apply_order(crate::options::ApplyOrder::LeastSpecificFirst)
            )),
            vec!["p", ".x", "#i"]
        );
    }

    #[test]
    fn stylesheet_limit_falls_back_to_stripping() {
        let (inliner, diagnostics) = recorded(InlineOptions::default().max_stylesheet_bytes(8));
        let html = "<style>p { color: red; }</style><p>x</p>";
        assert!(matches!(
            inliner.inline(html),
            Err(InlineError::StylesheetTooLarge { limit: 8, .. })
        ));
        assert_eq!(
            inliner.inline_safe(html),
            "<html><head></head><body><p>x</p></body></html>"
        );
        assert!(diagnostics.kinds().contains(&DiagnosticKind::InlineFailed));
    }

    #[test]
    fn keeps_style_tags_when_asked() {
        let inliner = Inliner::new(InlineOptions::default().remove_style_tags(false));
        let out = inliner
            .inline("<style>p { color: red; }</style><p>x</p>")
            .unwrap();
        assert!(out.contains("<style>p { color: red; }</style>"));
        assert!(out.contains("<p style=\"color: red;\">x</p>"));
    }

    #[test]
    fn invalid_unwrap_selector_leaves_document_alone() {
        let inliner = Inliner::default();
        let out = inliner
            .remove_tags_keep_content("<p><b>x</b></p>", "b:first-child")
            .unwrap();
        assert_eq!(out, "<html><head></head><body><p><b>x</b></p></body></html>");
    }
}
