//! Brace scanner turning `<style>` text into selector/declaration pairs.
//!
//! This is deliberately not a CSS tokenizer: it splits on `{`, `}`, `,` and
//! `;`. `blaze_css` provides the lightningcss-backed alternative behind the
//! same `CssRule` output.

use crate::options::MediaPolicy;
use std::fmt;

/// One selector group with its declaration block, both normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssRule {
    selectors: String,
    styles: String,
}

impl CssRule {
    /// Normalizes a selector segment and a declaration segment.
    ///
    /// Selectors are trimmed and joined with `, `. Declarations are written
    /// as `name: value;` and joined with a single space. Returns `None` when
    /// either side ends up empty.
    pub fn new(selectors: &str, declarations: &str) -> Option<Self> {
        let selectors = selectors
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", ");

        let styles = declarations
            .split(';')
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(normalize_declaration)
            .collect::<Vec<_>>()
            .join(" ");

        if selectors.is_empty() || styles.is_empty() {
            return None;
        }
        Some(CssRule { selectors, styles })
    }

    pub fn selectors(&self) -> &str {
        &self.selectors
    }

    pub fn styles(&self) -> &str {
        &self.styles
    }
}

impl fmt::Display for CssRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {{ {} }}", self.selectors, self.styles)
    }
}

/// `color:blue` becomes `color: blue;`. Text without a colon is kept as is.
fn normalize_declaration(declaration: &str) -> String {
    match declaration.split_once(':') {
        Some((name, value)) => format!("{}: {};", name.trim(), value.trim()),
        None => format!("{declaration};"),
    }
}

/// Extracts rules from raw stylesheet text, in source order.
///
/// Malformed blocks are skipped, never reported.
pub fn parse_css_rules(css: &str, media: MediaPolicy) -> Vec<CssRule> {
    let without_comments = strip_comments(css);
    let cleaned = resolve_at_rules(&without_comments, media);

    let mut blocks: Vec<&str> = cleaned.split('}').collect();
    // Whatever follows the last `}` was never closed.
    blocks.pop();

    blocks
        .into_iter()
        .filter_map(|block| {
            let mut parts = block.split('{');
            let selectors = parts.next()?;
            let declarations = parts.next()?;
            if parts.next().is_some() {
                return None;
            }
            CssRule::new(selectors, declarations)
        })
        .collect()
}

/// Removes `/* ... */` comments. Comments do not nest; an unterminated one
/// runs to the end of the input.
pub fn strip_comments(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut rest = css;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(end) => rest = &rest[start + 2 + end + 2..],
            None => return out,
        }
    }
    out.push_str(rest);
    out
}

/// Drops top-level at-rules, handling `@media` per `media`.
fn resolve_at_rules(css: &str, media: MediaPolicy) -> String {
    let bytes = css.as_bytes();
    let mut out = String::with_capacity(css.len());
    let mut depth = 0usize;
    let mut copied = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'{' => depth += 1,
            b'}' => depth = depth.saturating_sub(1),
            b'@' if depth == 0 => {
                out.push_str(&css[copied..i]);
                let at_rule = &css[i..];
                let is_media = at_rule_name(at_rule).eq_ignore_ascii_case("media");
                if is_media && media == MediaPolicy::Truncate {
                    return out;
                }
                let Some(stop) = at_rule.find(|c: char| c == '{' || c == ';') else {
                    return out;
                };
                if at_rule.as_bytes()[stop] == b';' {
                    i += stop + 1;
                } else {
                    let (inner_end, block_end) = matching_brace(at_rule, stop);
                    if is_media && media == MediaPolicy::Flatten {
                        out.push_str(&resolve_at_rules(&at_rule[stop + 1..inner_end], media));
                        out.push('\n');
                    }
                    i += block_end;
                }
                copied = i;
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    out.push_str(&css[copied..]);
    out
}

/// Name of the at-rule `at_rule` starts with, without the `@`.
fn at_rule_name(at_rule: &str) -> &str {
    let name = &at_rule[1..];
    let end = name
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
        .unwrap_or(name.len());
    &name[..end]
}

/// For the `{` at `open`, returns the offset of its matching `}` and the
/// offset just past it. Unbalanced blocks run to the end of `css`.
fn matching_brace(css: &str, open: usize) -> (usize, usize) {
    let mut depth = 0usize;
    for (offset, byte) in css.bytes().enumerate().skip(open) {
        match byte {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return (offset, offset + 1);
                }
            }
            _ => {}
        }
    }
    (css.len(), css.len())
}
