use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::dom::dom_tree::{self, Document, NodeRef};
use crate::error::QueryError;
use crate::style::css_matcher;
use crate::style::css_rules::CssRule;
use crate::style::sanitize::sanitize_selector;

/// Writes `rule` into the `style` attribute of every element it matches.
///
/// Returns how many elements were styled, or the error for a selector that
/// still does not compile after sanitizing.
pub fn apply_rule(
    document: &Document,
    rule: &CssRule,
    diagnostics: &dyn Diagnostics,
) -> Result<usize, QueryError> {
    let elements = select_rule_targets(document, rule.selectors(), diagnostics)?;
    for element in &elements {
        apply_styles(element, rule.styles());
    }
    Ok(elements.len())
}

/// Sanitizes `selectors` and queries the document with what is left.
pub fn select_rule_targets(
    document: &Document,
    selectors: &str,
    diagnostics: &dyn Diagnostics,
) -> Result<Vec<NodeRef>, QueryError> {
    let mut sanitized = Vec::new();
    for fragment in selectors.split(',').map(str::trim) {
        match sanitize_selector(fragment) {
            Some(rewritten) => {
                if rewritten != fragment {
                    diagnostics.emit(&Diagnostic::SelectorRewritten {
                        original: fragment,
                        rewritten: &rewritten,
                    });
                }
                sanitized.push(rewritten);
            }
            None if !fragment.is_empty() => {
                diagnostics.emit(&Diagnostic::SelectorDropped { selector: fragment });
            }
            None => {}
        }
    }

    if sanitized.is_empty() {
        return Ok(Vec::new());
    }
    css_matcher::select(&document.root, &sanitized.join(", "))
}

/// Appends `styles` to the element's inline style.
pub fn apply_styles(element: &NodeRef, styles: &str) {
    let current = dom_tree::attr(element, "style");
    dom_tree::set_attr(element, "style", merge_styles(&current, styles));
}

/// Appends `styles` after `current`, keeping the result a valid declaration
/// list. Repeated properties are kept; the later one wins in the browser.
pub fn merge_styles(current: &str, styles: &str) -> String {
    let current = current.trim_end();
    if current.trim_start().is_empty() {
        styles.to_string()
    } else if current.ends_with(';') {
        format!("{current} {styles}")
    } else {
        format!("{current}; {styles}")
    }
}
