//! This module parses HTML into the `crate::dom::dom_tree` representation.
//!
//! html5ever does the tokenizing and tree construction; `BlazeTreeSink`
//! receives its callbacks and builds the owned tree.

use crate::dom::dom_tree::{self, Doctype, ElementNode, Node, NodeData, NodeRef};
use crate::error::ParseError;
use crate::options::InlineOptions;
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::{
    interface::{ElemName, NodeOrText, QuirksMode, TreeSink},
    Attribute, LocalName, Namespace, QualName,
};
use std::borrow::Cow;
use std::cell::RefCell;
use std::rc::Rc;

/// Parses `html_content` into a document.
///
/// html5ever recovers from almost anything, so the only failures are the
/// input size limit and, with `strict_html`, any reported parse error.
pub fn create_dom_tree(
    html_content: &str,
    options: &InlineOptions,
) -> Result<dom_tree::Document, ParseError> {
    if let Some(limit) = options.max_input_bytes {
        if html_content.len() > limit {
            return Err(ParseError::InputTooLarge {
                len: html_content.len(),
                limit,
            });
        }
    }

    let tree_sink = BlazeTreeSink::new();
    let document = html5ever::parse_document(tree_sink, Default::default()).one(html_content);

    if options.strict_html {
        if let Some(first) = document.parse_errors.first() {
            return Err(ParseError::Malformed {
                first: first.clone(),
                count: document.parse_errors.len(),
            });
        }
    }
    Ok(document)
}

/// TreeSink building a `dom_tree::Document`.
pub struct BlazeTreeSink {
    root: NodeRef,
    errors: RefCell<Vec<String>>,
}

impl BlazeTreeSink {
    pub fn new() -> Self {
        Self {
            root: dom_tree::new_document().root,
            errors: RefCell::new(Vec::new()),
        }
    }
}

impl Default for BlazeTreeSink {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct BlazeElemName {
    ns: Namespace,
    local: LocalName,
}

impl ElemName for BlazeElemName {
    fn local_name(&self) -> &LocalName {
        &self.local
    }

    fn ns(&self) -> &Namespace {
        &self.ns
    }
}

impl TreeSink for BlazeTreeSink {
    type Handle = NodeRef;
    type Output = dom_tree::Document;
    type ElemName<'a>
        = BlazeElemName
    where
        Self: 'a;

    fn finish(self) -> Self::Output {
        dom_tree::Document {
            root: self.root,
            parse_errors: self.errors.into_inner(),
        }
    }

    fn parse_error(&self, msg: Cow<'static, str>) {
        self.errors.borrow_mut().push(msg.into_owned());
    }

    fn get_document(&self) -> Self::Handle {
        self.root.clone()
    }

    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> Self::ElemName<'a> {
        match target.borrow().as_element() {
            Some(elem) => BlazeElemName {
                ns: elem.qual_name.ns.clone(),
                local: elem.qual_name.local.clone(),
            },
            None => panic!("elem_name called on non-element node"),
        }
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<Attribute>,
        _flags: html5ever::interface::ElementFlags,
    ) -> Self::Handle {
        let attributes = attrs
            .into_iter()
            .map(|attr| (attr.name, attr.value.to_string()))
            .collect();
        Node::new(NodeData::Element(ElementNode::new(name, attributes)))
    }

    fn create_comment(&self, text: StrTendril) -> Self::Handle {
        Node::new(NodeData::Comment(text.to_string()))
    }

    /// Processing instructions only occur in XML; keep them as comments.
    fn create_pi(&self, target: StrTendril, data: StrTendril) -> Self::Handle {
        Node::new(NodeData::Comment(format!("?{} {}?", target, data)))
    }

    fn append(&self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        match child {
            NodeOrText::AppendNode(node) => dom_tree::append_child(parent, node),
            NodeOrText::AppendText(text) => dom_tree::append_text(parent, &text),
        }
    }

    fn append_based_on_parent_node(
        &self,
        element: &Self::Handle,
        prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) {
        if dom_tree::parent_of(element).is_some() {
            self.append_before_sibling(element, child);
        } else {
            self.append(prev_element, child);
        }
    }

    fn append_doctype_to_document(
        &self,
        name: StrTendril,
        public_id: StrTendril,
        system_id: StrTendril,
    ) {
        let doctype = Node::new(NodeData::Doctype(Doctype {
            name: name.to_string(),
            public_id: public_id.to_string(),
            system_id: system_id.to_string(),
        }));
        dom_tree::append_child(&self.root, doctype);
    }

    fn mark_script_already_started(&self, _node: &Self::Handle) {}

    fn pop(&self, _node: &Self::Handle) {}

    /// Template contents live directly under the template element.
    fn get_template_contents(&self, target: &Self::Handle) -> Self::Handle {
        target.clone()
    }

    fn same_node(&self, x: &Self::Handle, y: &Self::Handle) -> bool {
        Rc::ptr_eq(x, y)
    }

    /// Serialization copies the doctype verbatim, so the mode itself is not kept.
    fn set_quirks_mode(&self, _mode: QuirksMode) {}

    fn append_before_sibling(&self, sibling: &Self::Handle, child: NodeOrText<Self::Handle>) {
        match child {
            NodeOrText::AppendNode(node) => dom_tree::insert_before(sibling, node),
            NodeOrText::AppendText(text) => dom_tree::insert_text_before(sibling, &text),
        }
    }

    fn add_attrs_if_missing(&self, target: &Self::Handle, attrs: Vec<Attribute>) {
        let mut target_node = target.borrow_mut();
        if let Some(elem) = target_node.as_element_mut() {
            for attr in attrs {
                if elem.attribute(&attr.name.local).is_none() {
                    elem.attributes.push((attr.name, attr.value.to_string()));
                }
            }
        }
    }

    fn remove_from_parent(&self, target: &Self::Handle) {
        dom_tree::detach(target);
    }

    fn reparent_children(&self, node: &Self::Handle, new_parent: &Self::Handle) {
        dom_tree::reparent_children(node, new_parent);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn round_trips_simple_document() {
        let html = "<!DOCTYPE html><html><head><title>T</title></head><body><p class=\"a\">Hi &amp; bye</p></body></html>";
        let document = create_dom_tree(html, &InlineOptions::default()).unwrap();
        assert_eq!(document.html().unwrap(), html);
    }

    #[test]
    fn legacy_doctype_keeps_public_and_system_ids() {
        let html = "<!DOCTYPE html PUBLIC \"-//W3C//DTD XHTML 1.0 Transitional//EN\" \"http://www.w3.org/TR/xhtml1/DTD/xhtml1-transitional.dtd\"><html><head></head><body><p>x</p></body></html>";
        let document = create_dom_tree(html, &InlineOptions::default()).unwrap();
        assert_eq!(document.html().unwrap(), html);

        let system_only = "<!DOCTYPE html SYSTEM \"about:legacy-compat\"><html><head></head><body></body></html>";
        let document = create_dom_tree(system_only, &InlineOptions::default()).unwrap();
        assert_eq!(document.html().unwrap(), system_only);
    }

    #[test]
    fn fragments_get_html_head_and_body() {
        let document = create_dom_tree("<p>Txt</p>", &InlineOptions::default()).unwrap();
        assert_eq!(
            document.html().unwrap(),
            "<html><head></head><body><p>Txt</p></body></html>"
        );
    }

    #[test]
    fn foster_parented_text_lands_before_table() {
        let document =
            create_dom_tree("<table>oops<tr><td>x</td></tr></table>", &InlineOptions::default())
                .unwrap();
        assert_eq!(
            document.html().unwrap(),
            "<html><head></head><body>oops<table><tbody><tr><td>x</td></tr></tbody></table></body></html>"
        );
    }

    #[test]
    fn style_text_is_not_escaped() {
        let html = "<html><head><style>a > b { color: red; }</style></head><body></body></html>";
        let document = create_dom_tree(html, &InlineOptions::default()).unwrap();
        assert_eq!(document.html().unwrap(), html);
    }

    #[test]
    fn input_limit_is_enforced() {
        let options = InlineOptions::default().max_input_bytes(4);
        assert_eq!(
            create_dom_tree("<p>long</p>", &options).unwrap_err(),
            ParseError::InputTooLarge { len: 11, limit: 4 }
        );
    }

    #[test]
    fn strict_mode_rejects_parse_errors() {
        let options = InlineOptions::default().strict_html(true);
        let err = create_dom_tree("<p>no doctype</span>", &options).unwrap_err();
        assert!(matches!(err, ParseError::Malformed { count, .. } if count >= 1));
    }

    #[test]
    fn lenient_mode_records_parse_errors() {
        let document = create_dom_tree("<p>no doctype</span>", &InlineOptions::default()).unwrap();
        assert!(!document.parse_errors.is_empty());
    }
}
