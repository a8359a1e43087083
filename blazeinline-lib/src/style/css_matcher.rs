use crate::dom::dom_tree::{self, ElementNode, NodeRef};
use crate::error::{QueryError, QueryErrorKind};
use std::rc::Rc;

/// ------------------------------
/// 1. Selector Parsing
/// ------------------------------

/// Supported attribute selector operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeOperator {
    /// [attr="value"]
    Exact,
    /// [attr~="value"]
    Includes,
    /// [attr|="value"]
    DashMatch,
    /// [attr^="value"]
    Prefix,
    /// [attr$="value"]
    Suffix,
    /// [attr*="value"]
    Substring,
}

/// Represents one attribute condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSelector {
    pub name: String,
    /// `None` means only an existence check.
    pub operator: Option<AttributeOperator>,
    pub value: String,
}

/// An optional tag plus any number of id, class and attribute conditions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompoundSelector {
    pub tag: Option<String>,
    pub ids: Vec<String>,
    pub classes: Vec<String>,
    pub attributes: Vec<AttributeSelector>,
}

/// A complex selector composed of a key compound selector and a list of ancestor parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexSelector {
    pub key: CompoundSelector,
    /// Each entry is the combinator to the left of the previous part and the
    /// compound it leads to, walking right to left from the key.
    pub ancestors: Vec<(Combinator, CompoundSelector)>,
}

/// Supported combinators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// Descendant combinator (a space).
    Descendant,
    /// Child combinator (`>`).
    Child,
    /// Adjacent sibling combinator (`+`).
    AdjacentSibling,
    /// General sibling combinator (`~`).
    GeneralSibling,
}

/// Parses a comma separated selector group.
pub fn parse_selector_list(selector: &str) -> Result<Vec<ComplexSelector>, QueryError> {
    let mut parser = SelectorParser { input: selector, pos: 0 };
    let mut list = Vec::new();
    loop {
        list.push(parser.parse_complex()?);
        parser.skip_whitespace();
        let offset = parser.pos;
        match parser.bump() {
            None => break,
            Some(',') => {}
            Some(ch) => return Err(parser.error(QueryErrorKind::UnexpectedCharacter { ch, offset })),
        }
    }
    Ok(list)
}

struct SelectorParser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> SelectorParser<'a> {
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    /// Returns whether any whitespace was consumed.
    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
        self.pos > start
    }

    fn error(&self, kind: QueryErrorKind) -> QueryError {
        QueryError {
            selector: self.input.to_string(),
            kind,
        }
    }

    fn unexpected(&self) -> QueryError {
        match self.peek() {
            Some(ch) => self.error(QueryErrorKind::UnexpectedCharacter {
                ch,
                offset: self.pos,
            }),
            None => self.error(QueryErrorKind::ExpectedSelector { offset: self.pos }),
        }
    }

    fn parse_complex(&mut self) -> Result<ComplexSelector, QueryError> {
        self.skip_whitespace();
        let mut compounds = vec![self.parse_compound()?];
        let mut combinators = Vec::new();

        loop {
            let had_whitespace = self.skip_whitespace();
            let combinator = match self.peek() {
                None | Some(',') => break,
                Some('>') => Combinator::Child,
                Some('+') => Combinator::AdjacentSibling,
                Some('~') => Combinator::GeneralSibling,
                Some(_) if had_whitespace => Combinator::Descendant,
                Some(_) => return Err(self.unexpected()),
            };
            if combinator != Combinator::Descendant {
                let symbol = self.bump().unwrap_or(' ');
                self.skip_whitespace();
                if matches!(self.peek(), None | Some(',')) {
                    return Err(self.error(QueryErrorKind::DanglingCombinator(symbol)));
                }
            }
            combinators.push(combinator);
            compounds.push(self.parse_compound()?);
        }

        let mut compounds = compounds.into_iter().rev();
        let key = compounds.next().unwrap_or_default();
        let ancestors = combinators.into_iter().rev().zip(compounds).collect();
        Ok(ComplexSelector { key, ancestors })
    }

    /// Parse a compound selector, e.g. `div.red#header[data-type~="main"]`.
    fn parse_compound(&mut self) -> Result<CompoundSelector, QueryError> {
        let start = self.pos;
        let mut compound = CompoundSelector::default();

        match self.peek() {
            Some('*') => {
                self.bump();
            }
            Some(ch) if is_ident_char(ch) => {
                compound.tag = Some(self.parse_ident()?.to_ascii_lowercase());
            }
            _ => {}
        }

        loop {
            match self.peek() {
                Some('#') => {
                    self.bump();
                    compound.ids.push(self.parse_ident()?);
                }
                Some('.') => {
                    self.bump();
                    compound.classes.push(self.parse_ident()?);
                }
                Some('[') => {
                    self.bump();
                    compound.attributes.push(self.parse_attribute()?);
                }
                Some(':') => {
                    let rest = &self.input[self.pos..];
                    let end = rest
                        .find(|c: char| c.is_whitespace() || c == ',')
                        .unwrap_or(rest.len());
                    return Err(self.error(QueryErrorKind::UnsupportedPseudo(rest[..end].to_string())));
                }
                Some('\\') => return Err(self.error(QueryErrorKind::UnsupportedEscape)),
                _ => break,
            }
        }

        if self.pos == start {
            return Err(self.unexpected());
        }
        Ok(compound)
    }

    fn parse_ident(&mut self) -> Result<String, QueryError> {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_char) {
            self.bump();
        }
        if self.peek() == Some('\\') {
            return Err(self.error(QueryErrorKind::UnsupportedEscape));
        }
        if self.pos == start {
            return Err(self.error(QueryErrorKind::ExpectedIdentifier { offset: start }));
        }
        Ok(self.input[start..self.pos].to_string())
    }

    /// Parses the inside of `[...]`; the opening bracket is already consumed.
    fn parse_attribute(&mut self) -> Result<AttributeSelector, QueryError> {
        self.skip_whitespace();
        let name = self.parse_ident()?.to_ascii_lowercase();
        self.skip_whitespace();

        let operator = match self.peek() {
            None => return Err(self.error(QueryErrorKind::UnterminatedAttribute)),
            Some(']') => {
                self.bump();
                return Ok(AttributeSelector {
                    name,
                    operator: None,
                    value: String::new(),
                });
            }
            Some('=') => {
                self.bump();
                AttributeOperator::Exact
            }
            Some(ch @ ('~' | '|' | '^' | '$' | '*')) => {
                self.bump();
                if self.peek() != Some('=') {
                    return Err(self.unexpected());
                }
                self.bump();
                match ch {
                    '~' => AttributeOperator::Includes,
                    '|' => AttributeOperator::DashMatch,
                    '^' => AttributeOperator::Prefix,
                    '$' => AttributeOperator::Suffix,
                    _ => AttributeOperator::Substring,
                }
            }
            Some(_) => return Err(self.unexpected()),
        };

        self.skip_whitespace();
        let value = match self.peek() {
            None => return Err(self.error(QueryErrorKind::UnterminatedAttribute)),
            Some(quote @ ('"' | '\'')) => {
                self.bump();
                self.parse_string(quote)?
            }
            Some(_) => self.parse_ident()?,
        };
        self.skip_whitespace();

        match self.peek() {
            Some(']') => {
                self.bump();
                Ok(AttributeSelector {
                    name,
                    operator: Some(operator),
                    value,
                })
            }
            None => Err(self.error(QueryErrorKind::UnterminatedAttribute)),
            Some(_) => Err(self.unexpected()),
        }
    }

    /// Reads a quoted string up to `quote`, resolving CSS escapes.
    fn parse_string(&mut self, quote: char) -> Result<String, QueryError> {
        let mut value = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error(QueryErrorKind::UnterminatedString)),
                Some(ch) if ch == quote => return Ok(value),
                Some('\\') => match self.peek() {
                    None => return Err(self.error(QueryErrorKind::UnterminatedString)),
                    Some('\n') => {
                        self.bump();
                    }
                    Some(ch) if ch.is_ascii_hexdigit() => {
                        let mut code = 0u32;
                        let mut digits = 0;
                        while digits < 6 {
                            match self.peek().and_then(|c| c.to_digit(16)) {
                                Some(digit) => {
                                    code = code * 16 + digit;
                                    digits += 1;
                                    self.bump();
                                }
                                None => break,
                            }
                        }
                        if self.peek().is_some_and(char::is_whitespace) {
                            self.bump();
                        }
                        let decoded = match char::from_u32(code) {
                            Some(c) if code != 0 => c,
                            _ => char::REPLACEMENT_CHARACTER,
                        };
                        value.push(decoded);
                    }
                    Some(ch) => {
                        self.bump();
                        value.push(ch);
                    }
                },
                Some(ch) => value.push(ch),
            }
        }
    }
}

fn is_ident_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || !ch.is_ascii()
}

/// ------------------------------
/// 2. Selector Matching
/// ------------------------------

/// Returns every element under `root` matching `selector`, in document order.
pub fn select(root: &NodeRef, selector: &str) -> Result<Vec<NodeRef>, QueryError> {
    let selectors = parse_selector_list(selector)?;
    Ok(select_parsed(root, &selectors))
}

pub fn select_parsed(root: &NodeRef, selectors: &[ComplexSelector]) -> Vec<NodeRef> {
    let mut matched = Vec::new();
    let mut stack: Vec<NodeRef> = root.borrow().children.iter().rev().cloned().collect();
    while let Some(node) = stack.pop() {
        if selectors
            .iter()
            .any(|selector| matches_complex_selector(&node, selector))
        {
            matched.push(Rc::clone(&node));
        }
        stack.extend(node.borrow().children.iter().rev().cloned());
    }
    matched
}

/// Returns true if the given ElementNode matches the CompoundSelector.
/// Checks tag, ids, classes, and attribute conditions.
pub fn matches_compound(elem: &ElementNode, compound: &CompoundSelector) -> bool {
    if let Some(ref tag) = compound.tag {
        if !elem.tag.eq_ignore_ascii_case(tag) {
            return false;
        }
    }
    if !compound
        .ids
        .iter()
        .all(|id| elem.attribute("id") == Some(id.as_str()))
    {
        return false;
    }
    if !compound.classes.iter().all(|class| elem.has_class(class)) {
        return false;
    }
    compound
        .attributes
        .iter()
        .all(|attr_sel| matches_attribute(elem, attr_sel))
}

fn matches_attribute(elem: &ElementNode, attr_sel: &AttributeSelector) -> bool {
    let Some(actual) = elem.attribute(&attr_sel.name) else {
        return false;
    };
    let expected = attr_sel.value.as_str();
    match attr_sel.operator {
        None => true,
        Some(AttributeOperator::Exact) => actual == expected,
        Some(AttributeOperator::Includes) => {
            !expected.is_empty()
                && !expected.contains(char::is_whitespace)
                && actual.split_whitespace().any(|word| word == expected)
        }
        Some(AttributeOperator::DashMatch) => {
            actual == expected
                || actual
                    .strip_prefix(expected)
                    .is_some_and(|rest| rest.starts_with('-'))
        }
        Some(AttributeOperator::Prefix) => !expected.is_empty() && actual.starts_with(expected),
        Some(AttributeOperator::Suffix) => !expected.is_empty() && actual.ends_with(expected),
        Some(AttributeOperator::Substring) => !expected.is_empty() && actual.contains(expected),
    }
}

/// Matches a ComplexSelector against a candidate node, right to left.
pub fn matches_complex_selector(candidate: &NodeRef, complex: &ComplexSelector) -> bool {
    let key_matches = candidate
        .borrow()
        .as_element()
        .is_some_and(|elem| matches_compound(elem, &complex.key));
    key_matches && matches_ancestors(candidate, complex, 0)
}

fn matches_ancestors(node: &NodeRef, complex: &ComplexSelector, index: usize) -> bool {
    let Some((combinator, compound)) = complex.ancestors.get(index) else {
        return true;
    };
    let matches_here = |other: &NodeRef| {
        other
            .borrow()
            .as_element()
            .is_some_and(|elem| matches_compound(elem, compound))
            && matches_ancestors(other, complex, index + 1)
    };

    match combinator {
        Combinator::Child => parent_element(node).is_some_and(|parent| matches_here(&parent)),
        Combinator::Descendant => {
            let mut ancestor = parent_element(node);
            while let Some(current) = ancestor {
                if matches_here(&current) {
                    return true;
                }
                ancestor = parent_element(&current);
            }
            false
        }
        Combinator::AdjacentSibling => previous_element_siblings(node)
            .first()
            .is_some_and(|sibling| matches_here(sibling)),
        Combinator::GeneralSibling => previous_element_siblings(node).iter().any(matches_here),
    }
}

/// Helper: parent of a node, if it is an element.
fn parent_element(node: &NodeRef) -> Option<NodeRef> {
    dom_tree::parent_of(node).filter(dom_tree::is_element)
}

/// Helper: element siblings before `node`, nearest first.
fn previous_element_siblings(node: &NodeRef) -> Vec<NodeRef> {
    let Some(parent) = dom_tree::parent_of(node) else {
        return Vec::new();
    };
    let parent_node = parent.borrow();
    let mut siblings: Vec<NodeRef> = parent_node
        .children
        .iter()
        .take_while(|child| !Rc::ptr_eq(child, node))
        .filter(|child| dom_tree::is_element(child))
        .cloned()
        .collect();
    siblings.reverse();
    siblings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::InlineOptions;
    use crate::parser::blaze_html::create_dom_tree;
    use pretty_assertions::assert_eq;

    const PAGE: &str = r#"<html><body>
        <div id="main" class="red box">
          <p class="lead">one</p>
          <p>two</p>
          <span lang="en-US" data-x="alpha beta">three</span>
        </div>
        <p class="after">four</p>
      </body></html>"#;

    fn texts(selector: &str) -> Vec<String> {
        let document = create_dom_tree(PAGE, &InlineOptions::default()).unwrap();
        select(&document.root, selector)
            .unwrap()
            .iter()
            .map(dom_tree::text_content)
            .map(|text| text.split_whitespace().next().unwrap_or_default().to_string())
            .collect()
    }

    fn error_kind(selector: &str) -> QueryErrorKind {
        parse_selector_list(selector).unwrap_err().kind
    }

    #[test]
    fn parses_compound_selector() {
        let list = parse_selector_list("DIV.red#main[data-x~=\"beta\"]").unwrap();
        assert_eq!(list.len(), 1);
        let key = &list[0].key;
        assert_eq!(key.tag.as_deref(), Some("div"));
        assert_eq!(key.ids, vec!["main".to_string()]);
        assert_eq!(key.classes, vec!["red".to_string()]);
        assert_eq!(
            key.attributes,
            vec![AttributeSelector {
                name: "data-x".to_string(),
                operator: Some(AttributeOperator::Includes),
                value: "beta".to_string(),
            }]
        );
        assert!(list[0].ancestors.is_empty());
    }

    #[test]
    fn ancestors_run_right_to_left() {
        let list = parse_selector_list("div > p.lead + span").unwrap();
        let complex = &list[0];
        assert_eq!(complex.key.tag.as_deref(), Some("span"));
        assert_eq!(complex.ancestors[0].0, Combinator::AdjacentSibling);
        assert_eq!(complex.ancestors[0].1.classes, vec!["lead".to_string()]);
        assert_eq!(complex.ancestors[1].0, Combinator::Child);
        assert_eq!(complex.ancestors[1].1.tag.as_deref(), Some("div"));
    }

    #[test]
    fn selects_in_document_order() {
        assert_eq!(texts("p"), vec!["one", "two", "four"]);
        assert_eq!(texts(".after, .lead"), vec!["one", "four"]);
        assert_eq!(texts("*#main span"), vec!["three"]);
    }

    #[test]
    fn combinators() {
        assert_eq!(texts("div p"), vec!["one", "two"]);
        assert_eq!(texts("body > p"), vec!["four"]);
        assert_eq!(texts(".lead + p"), vec!["two"]);
        assert_eq!(texts(".lead ~ span"), vec!["three"]);
        assert_eq!(texts("div ~ p"), vec!["four"]);
        assert_eq!(texts("html div > p.lead"), vec!["one"]);
    }

    #[test]
    fn attribute_operators() {
        assert_eq!(texts("[lang]"), vec!["three"]);
        assert_eq!(texts("[lang|=en]"), vec!["three"]);
        assert_eq!(texts("[data-x^='alp']"), vec!["three"]);
        assert_eq!(texts("[data-x$=\"eta\"]"), vec!["three"]);
        assert_eq!(texts("[class*=\"ead\"]"), vec!["one"]);
        assert_eq!(texts("[class~=\"box\"]"), vec!["one"]);
        assert!(texts("[data-x*=\"\"]").is_empty());
    }

    #[test]
    fn quoted_values_resolve_escapes() {
        let list = parse_selector_list(r#"[class~="sm\:p-4"], [title="\41 b"]"#).unwrap();
        assert_eq!(list[0].key.attributes[0].value, "sm:p-4");
        assert_eq!(list[1].key.attributes[0].value, "Ab");
    }

    #[test]
    fn rejects_unsupported_syntax() {
        assert_eq!(
            error_kind("a:hover"),
            QueryErrorKind::UnsupportedPseudo(":hover".to_string())
        );
        assert_eq!(error_kind(".sm\\:flex"), QueryErrorKind::UnsupportedEscape);
        assert_eq!(error_kind("div >"), QueryErrorKind::DanglingCombinator('>'));
        assert_eq!(error_kind("[href"), QueryErrorKind::UnterminatedAttribute);
        assert_eq!(error_kind("[title=\"x]"), QueryErrorKind::UnterminatedString);
        assert_eq!(error_kind(""), QueryErrorKind::ExpectedSelector { offset: 0 });
        assert_eq!(
            error_kind("@font-face"),
            QueryErrorKind::UnexpectedCharacter { ch: '@', offset: 0 }
        );
        assert_eq!(
            error_kind("a,,b"),
            QueryErrorKind::UnexpectedCharacter { ch: ',', offset: 2 }
        );
    }

    #[test]
    fn error_carries_selector() {
        let err = select(&dom_tree::new_document().root, "p::before").unwrap_err();
        assert_eq!(err.selector, "p::before");
    }
}
