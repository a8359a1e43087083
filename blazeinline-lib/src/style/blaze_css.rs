use crate::error::InlineError;
use crate::options::MediaPolicy;
use crate::style::css_rules::CssRule;
use lightningcss::declaration::DeclarationBlock;
use lightningcss::printer::PrinterOptions;
use lightningcss::rules::{style::StyleRule, CssRule as LightningRule};
use lightningcss::stylesheet::{ParserOptions, StyleSheet as LightningStyleSheet};
use lightningcss::traits::ToCss;

/// Parse a stylesheet with LightningCSS and flatten it into `CssRule`s.
///
/// Error recovery is on, so invalid rules are skipped the same way the
/// scanner skips them. Values come back in lightningcss's canonical form
/// (`blue` prints as `#00f`).
pub fn parse_css_rules_lightning(css: &str, media: MediaPolicy) -> Result<Vec<CssRule>, InlineError> {
    let parser_opts = ParserOptions {
        error_recovery: true,
        ..ParserOptions::default()
    };
    let sheet = LightningStyleSheet::parse(css, parser_opts)
        .map_err(|e| InlineError::Stylesheet(e.to_string()))?;

    let mut rules = Vec::new();
    for rule in &sheet.rules.0 {
        match rule {
            LightningRule::Style(style_rule) => rules.extend(convert_style_rule(style_rule)),
            LightningRule::Media(media_rule) => match media {
                MediaPolicy::Truncate => break,
                MediaPolicy::Skip => {}
                MediaPolicy::Flatten => {
                    for inner_rule in &media_rule.rules.0 {
                        if let LightningRule::Style(style_rule) = inner_rule {
                            rules.extend(convert_style_rule(style_rule));
                        }
                    }
                }
            },
            // @font-face, @keyframes and friends cannot be inlined.
            _ => {}
        }
    }
    Ok(rules)
}

/// Copies a StyleRule's selectors and declarations into a `CssRule`.
fn convert_style_rule(style_rule: &StyleRule<'_>) -> Option<CssRule> {
    let selectors = style_rule
        .selectors
        .0
        .iter()
        .filter_map(|selector| selector.to_css_string(PrinterOptions::default()).ok())
        .collect::<Vec<_>>()
        .join(", ");

    CssRule::new(&selectors, &declarations_to_string(&style_rule.declarations))
}

fn declarations_to_string(block: &DeclarationBlock<'_>) -> String {
    let normal = block.declarations.iter().map(|property| (property, false));
    let important = block
        .important_declarations
        .iter()
        .map(|property| (property, true));

    normal
        .chain(important)
        .filter_map(|(property, is_important)| {
            let name = property.property_id().name().to_string();
            let value = property
                .value_to_css_string(PrinterOptions::default())
                .ok()?;
            Some(if is_important {
                format!("{name}: {value} !important")
            } else {
                format!("{name}: {value}")
            })
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rules(css: &str, media: MediaPolicy) -> Vec<String> {
        parse_css_rules_lightning(css, media)
            .unwrap()
            .iter()
            .map(CssRule::to_string)
            .collect()
    }

    #[test]
    fn converts_style_rules() {
        assert_eq!(
            rules(".a, p { margin: 10px; font-size: 20px }", MediaPolicy::Skip),
            vec![".a, p { margin: 10px; font-size: 20px; }"]
        );
    }

    #[test]
    fn keeps_important() {
        assert_eq!(
            rules("p { margin: 0 !important; font-size: 12px }", MediaPolicy::Skip),
            vec!["p { font-size: 12px; margin: 0 !important; }"]
        );
    }

    #[test]
    fn honors_media_policy() {
        let css = "p { margin: 1px } @media print { i { margin: 2px } } b { margin: 3px }";
        assert_eq!(
            rules(css, MediaPolicy::Truncate),
            vec!["p { margin: 1px; }"]
        );
        assert_eq!(
            rules(css, MediaPolicy::Skip),
            vec!["p { margin: 1px; }", "b { margin: 3px; }"]
        );
        assert_eq!(
            rules(css, MediaPolicy::Flatten),
            vec!["p { margin: 1px; }", "i { margin: 2px; }", "b { margin: 3px; }"]
        );
    }

    #[test]
    fn skips_non_style_rules() {
        let css = "@font-face { font-family: X; src: url(x.woff) } p { margin: 0 }";
        assert_eq!(rules(css, MediaPolicy::Skip), vec!["p { margin: 0; }"]);
    }
}
