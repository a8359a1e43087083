pub mod applicator;
pub mod blaze_css;
pub mod css_matcher;
pub mod css_rules;
pub mod sanitize;
pub mod specificity;
