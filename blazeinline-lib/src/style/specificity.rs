use crate::options::ApplyOrder;
use crate::style::css_rules::CssRule;
use std::cmp::Reverse;

/// Rough specificity of a whole selector group.
///
/// Counts characters rather than parsing: 100 per `#`, 10 per `.`, `[` or
/// `:`, plus one per space-separated piece. Pseudo-elements count like
/// pseudo-classes and `a, b` counts as two pieces.
pub fn specificity(selectors: &str) -> usize {
    let count = |needle: char| selectors.matches(needle).count();
    let ids = count('#');
    let classes = count('.') + count('[') + count(':');
    let pieces = selectors.split(' ').count();
    ids * 100 + classes * 10 + pieces
}

/// Orders rules for application. The sort is stable, so rules with equal
/// scores keep their extraction order.
pub fn rank_rules(mut rules: Vec<CssRule>, order: ApplyOrder) -> Vec<CssRule> {
    match order {
        ApplyOrder::MostSpecificFirst => {
            rules.sort_by_key(|rule| Reverse(specificity(rule.selectors())))
        }
        ApplyOrder::LeastSpecificFirst => rules.sort_by_key(|rule| specificity(rule.selectors())),
    }
    rules
}
