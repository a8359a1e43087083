//! Knobs for a single inlining call.

/// What to do with `@media` blocks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MediaPolicy {
    /// Ignore everything from the first `@media` onwards.
    Truncate,
    /// Drop each `@media` block and keep the rules after it.
    #[default]
    Skip,
    /// Treat the rules inside `@media` blocks as unconditional.
    Flatten,
}

/// Which parser turns `<style>` text into rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RuleSource {
    /// Built-in brace scanner; declarations are rewritten as `name: value;`.
    #[default]
    Scanner,
    /// lightningcss; declarations come back normalized.
    Lightning,
}

/// Order in which ranked rules are written into `style` attributes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ApplyOrder {
    /// Highest specificity first, so its declarations come earliest in the attribute.
    #[default]
    MostSpecificFirst,
    /// Highest specificity last, so its declarations win under "last one wins".
    LeastSpecificFirst,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineOptions {
    pub media: MediaPolicy,
    pub rule_source: RuleSource,
    pub apply_order: ApplyOrder,
    /// Remove the `<style>` elements once their rules are inlined.
    pub remove_style_tags: bool,
    /// Reject documents html5ever reports parse errors for.
    pub strict_html: bool,
    pub max_input_bytes: Option<usize>,
    /// Cap on the combined text of all `<style>` elements.
    pub max_stylesheet_bytes: Option<usize>,
}

impl Default for InlineOptions {
    fn default() -> Self {
        InlineOptions {
            media: MediaPolicy::default(),
            rule_source: RuleSource::default(),
            apply_order: ApplyOrder::default(),
            remove_style_tags: true,
            strict_html: false,
            max_input_bytes: None,
            max_stylesheet_bytes: None,
        }
    }
}

impl InlineOptions {
    pub fn media(mut self, media: MediaPolicy) -> Self {
        self.media = media;
        self
    }

    pub fn rule_source(mut self, rule_source: RuleSource) -> Self {
        self.rule_source = rule_source;
        self
    }

    pub fn apply_order(mut self, apply_order: ApplyOrder) -> Self {
        self.apply_order = apply_order;
        self
    }

    pub fn remove_style_tags(mut self, remove: bool) -> Self {
        self.remove_style_tags = remove;
        self
    }

    pub fn strict_html(mut self, strict: bool) -> Self {
        self.strict_html = strict;
        self
    }

    pub fn max_input_bytes(mut self, limit: usize) -> Self {
        self.max_input_bytes = Some(limit);
        self
    }

    pub fn max_stylesheet_bytes(mut self, limit: usize) -> Self {
        self.max_stylesheet_bytes = Some(limit);
        self
    }
}
