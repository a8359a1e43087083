use html5ever::serialize::{serialize, Serialize, SerializeOpts, Serializer, TraversalScope};
use html5ever::{LocalName, Namespace, QualName};
use std::cell::RefCell;
use std::io;
use std::rc::{Rc, Weak};

pub mod dom_tree {
    use super::*;

    /// Shared handle to a node in the tree.
    pub type NodeRef = Rc<RefCell<Node>>;

    #[derive(Debug)]
    pub struct Node {
        pub parent: Option<Weak<RefCell<Node>>>,
        pub children: Vec<NodeRef>,
        pub data: NodeData,
    }

    #[derive(Debug, Clone)]
    pub enum NodeData {
        DocumentRoot,
        Doctype(Doctype),
        Element(ElementNode),
        Text(String),
        Comment(String),
    }

    #[derive(Debug, Clone)]
    pub struct ElementNode {
        pub tag: String,
        pub qual_name: QualName,
        /// Attributes in source order.
        pub attributes: Vec<(QualName, String)>,
    }

    #[derive(Debug, Clone)]
    pub struct Doctype {
        pub name: String,
        pub public_id: String,
        pub system_id: String,
    }

    impl Doctype {
        /// Text between `<!DOCTYPE ` and `>`, including public and system ids.
        pub fn declaration(&self) -> String {
            match (self.public_id.is_empty(), self.system_id.is_empty()) {
                (true, true) => self.name.clone(),
                (true, false) => format!("{} SYSTEM \"{}\"", self.name, self.system_id),
                (false, true) => format!("{} PUBLIC \"{}\"", self.name, self.public_id),
                (false, false) => format!(
                    "{} PUBLIC \"{}\" \"{}\"",
                    self.name, self.public_id, self.system_id
                ),
            }
        }
    }

    /// A parsed HTML document.
    #[derive(Debug)]
    pub struct Document {
        pub root: NodeRef,
        /// Parse errors html5ever reported while building the tree.
        pub parse_errors: Vec<String>,
    }

    impl Node {
        pub fn new(data: NodeData) -> NodeRef {
            Rc::new(RefCell::new(Node {
                parent: None,
                children: Vec::new(),
                data,
            }))
        }

        pub fn as_element(&self) -> Option<&ElementNode> {
            match &self.data {
                NodeData::Element(elem) => Some(elem),
                _ => None,
            }
        }

        pub fn as_element_mut(&mut self) -> Option<&mut ElementNode> {
            match &mut self.data {
                NodeData::Element(elem) => Some(elem),
                _ => None,
            }
        }
    }

    impl ElementNode {
        pub fn new(qual_name: QualName, attributes: Vec<(QualName, String)>) -> Self {
            ElementNode {
                tag: qual_name.local.to_string(),
                qual_name,
                attributes,
            }
        }

        /// Looks up an attribute by local name, ignoring ASCII case.
        pub fn attribute(&self, name: &str) -> Option<&str> {
            self.attributes
                .iter()
                .find(|(key, _)| (*key.local).eq_ignore_ascii_case(name))
                .map(|(_, value)| value.as_str())
        }

        /// Creates the attribute or overwrites its value.
        pub fn set_attribute(&mut self, name: &str, value: String) {
            match self
                .attributes
                .iter_mut()
                .find(|(key, _)| (*key.local).eq_ignore_ascii_case(name))
            {
                Some((_, existing)) => *existing = value,
                None => self.attributes.push((
                    QualName::new(None, Namespace::from(""), LocalName::from(name)),
                    value,
                )),
            }
        }

        pub fn has_class(&self, class_name: &str) -> bool {
            self.attribute("class")
                .is_some_and(|classes| classes.split_whitespace().any(|c| c == class_name))
        }
    }

    impl Document {
        /// Serializes the whole document back to HTML.
        pub fn html(&self) -> io::Result<String> {
            let mut bytes = Vec::new();
            serialize(
                &mut bytes,
                &SerializableNode(&self.root),
                SerializeOpts::default(),
            )?;
            String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
        }
    }

    pub fn new_document() -> Document {
        Document {
            root: Node::new(NodeData::DocumentRoot),
            parse_errors: Vec::new(),
        }
    }

    pub fn parent_of(node: &NodeRef) -> Option<NodeRef> {
        node.borrow().parent.as_ref().and_then(Weak::upgrade)
    }

    pub fn is_element(node: &NodeRef) -> bool {
        matches!(node.borrow().data, NodeData::Element(_))
    }

    pub fn is_element_named(node: &NodeRef, tag: &str) -> bool {
        node.borrow()
            .as_element()
            .is_some_and(|elem| elem.tag.eq_ignore_ascii_case(tag))
    }

    /// Removes `node` from its parent. The node keeps its own children.
    pub fn detach(node: &NodeRef) {
        let parent = node.borrow_mut().parent.take().and_then(|weak| weak.upgrade());
        if let Some(parent) = parent {
            parent
                .borrow_mut()
                .children
                .retain(|child| !Rc::ptr_eq(child, node));
        }
    }

    pub fn append_child(parent: &NodeRef, child: NodeRef) {
        detach(&child);
        child.borrow_mut().parent = Some(Rc::downgrade(parent));
        parent.borrow_mut().children.push(child);
    }

    /// Appends text, merging into a trailing text node when there is one.
    pub fn append_text(parent: &NodeRef, text: &str) {
        let mut parent_node = parent.borrow_mut();
        if let Some(last) = parent_node.children.last() {
            if let NodeData::Text(existing) = &mut last.borrow_mut().data {
                existing.push_str(text);
                return;
            }
        }
        let node = Node::new(NodeData::Text(text.to_string()));
        node.borrow_mut().parent = Some(Rc::downgrade(parent));
        parent_node.children.push(node);
    }

    /// Inserts `child` immediately before `sibling`. No-op if `sibling` is detached.
    pub fn insert_before(sibling: &NodeRef, child: NodeRef) {
        detach(&child);
        let Some(parent) = parent_of(sibling) else {
            return;
        };
        child.borrow_mut().parent = Some(Rc::downgrade(&parent));
        let mut parent_node = parent.borrow_mut();
        let index = position_in(&parent_node.children, sibling);
        parent_node.children.insert(index, child);
    }

    pub fn insert_text_before(sibling: &NodeRef, text: &str) {
        let Some(parent) = parent_of(sibling) else {
            return;
        };
        let mut parent_node = parent.borrow_mut();
        let index = position_in(&parent_node.children, sibling);
        if index > 0 {
            if let NodeData::Text(existing) = &mut parent_node.children[index - 1].borrow_mut().data
            {
                existing.push_str(text);
                return;
            }
        }
        let node = Node::new(NodeData::Text(text.to_string()));
        node.borrow_mut().parent = Some(Rc::downgrade(&parent));
        parent_node.children.insert(index, node);
    }

    /// Moves every child of `node` to the end of `new_parent`.
    pub fn reparent_children(node: &NodeRef, new_parent: &NodeRef) {
        let children = std::mem::take(&mut node.borrow_mut().children);
        for child in &children {
            child.borrow_mut().parent = Some(Rc::downgrade(new_parent));
        }
        new_parent.borrow_mut().children.extend(children);
    }

    /// Replaces `node` with its children, in place.
    pub fn unwrap(node: &NodeRef) {
        let Some(parent) = parent_of(node) else {
            return;
        };
        let children = std::mem::take(&mut node.borrow_mut().children);
        for child in &children {
            child.borrow_mut().parent = Some(Rc::downgrade(&parent));
        }
        {
            let mut parent_node = parent.borrow_mut();
            if let Some(index) = parent_node
                .children
                .iter()
                .position(|child| Rc::ptr_eq(child, node))
            {
                parent_node.children.splice(index..=index, children);
            }
        }
        node.borrow_mut().parent = None;
    }

    /// Value of attribute `name`, or an empty string when absent.
    pub fn attr(node: &NodeRef, name: &str) -> String {
        node.borrow()
            .as_element()
            .and_then(|elem| elem.attribute(name))
            .unwrap_or_default()
            .to_string()
    }

    pub fn set_attr(node: &NodeRef, name: &str, value: String) {
        if let Some(elem) = node.borrow_mut().as_element_mut() {
            elem.set_attribute(name, value);
        }
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(node: &NodeRef) -> String {
        let mut text = String::new();
        collect_text(node, &mut text);
        text
    }

    fn collect_text(node: &NodeRef, out: &mut String) {
        let node = node.borrow();
        if let NodeData::Text(text) = &node.data {
            out.push_str(text);
        }
        for child in &node.children {
            collect_text(child, out);
        }
    }

    fn position_in(children: &[NodeRef], node: &NodeRef) -> usize {
        children
            .iter()
            .position(|child| Rc::ptr_eq(child, node))
            .unwrap_or(children.len())
    }

    struct SerializableNode<'a>(&'a NodeRef);

    impl Serialize for SerializableNode<'_> {
        fn serialize<S>(&self, serializer: &mut S, traversal_scope: TraversalScope) -> io::Result<()>
        where
            S: Serializer,
        {
            let node = self.0.borrow();
            if let TraversalScope::IncludeNode = traversal_scope {
                match &node.data {
                    NodeData::Element(elem) => {
                        serializer.start_elem(
                            elem.qual_name.clone(),
                            elem.attributes
                                .iter()
                                .map(|(name, value)| (name, value.as_str())),
                        )?;
                        for child in &node.children {
                            SerializableNode(child)
                                .serialize(serializer, TraversalScope::IncludeNode)?;
                        }
                        return serializer.end_elem(elem.qual_name.clone());
                    }
                    NodeData::Doctype(doctype) => {
                        return serializer.write_doctype(&doctype.declaration())
                    }
                    NodeData::Text(text) => return serializer.write_text(text),
                    NodeData::Comment(text) => return serializer.write_comment(text),
                    NodeData::DocumentRoot => {}
                }
            }
            for child in &node.children {
                SerializableNode(child).serialize(serializer, TraversalScope::IncludeNode)?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::dom_tree::*;
    use html5ever::{LocalName, Namespace, QualName};

    fn element(tag: &str) -> NodeRef {
        let name = QualName::new(None, Namespace::from("http://www.w3.org/1999/xhtml"), LocalName::from(tag));
        Node::new(NodeData::Element(ElementNode::new(name, Vec::new())))
    }

    #[test]
    fn unwrap_splices_children_at_former_position() {
        let parent = element("div");
        let before = element("i");
        let wrapper = element("b");
        let after = element("u");
        append_child(&parent, before.clone());
        append_child(&parent, wrapper.clone());
        append_child(&parent, after.clone());
        append_text(&wrapper, "one");
        append_child(&wrapper, element("em"));

        unwrap(&wrapper);

        let parent_node = parent.borrow();
        let children = &parent_node.children;
        assert_eq!(children.len(), 4);
        assert!(std::rc::Rc::ptr_eq(&children[0], &before));
        assert!(matches!(children[1].borrow().data, NodeData::Text(ref t) if t == "one"));
        assert!(is_element_named(&children[2], "em"));
        assert!(std::rc::Rc::ptr_eq(&children[3], &after));
        assert!(parent_of(&children[2]).is_some());
        assert!(parent_of(&wrapper).is_none());
    }

    #[test]
    fn adjacent_text_is_merged() {
        let parent = element("p");
        append_text(&parent, "Hello");
        append_text(&parent, ", world");
        assert_eq!(parent.borrow().children.len(), 1);
        assert_eq!(text_content(&parent), "Hello, world");
    }

    #[test]
    fn attr_is_empty_when_absent_and_overwritten_when_set() {
        let node = element("p");
        assert_eq!(attr(&node, "style"), "");
        set_attr(&node, "style", "color: red;".to_string());
        set_attr(&node, "STYLE", "color: blue;".to_string());
        assert_eq!(attr(&node, "style"), "color: blue;");
        assert_eq!(node.borrow().as_element().map(|e| e.attributes.len()), Some(1));
    }

    #[test]
    fn detach_removes_only_the_target() {
        let parent = element("ul");
        let first = element("li");
        let second = element("li");
        append_child(&parent, first.clone());
        append_child(&parent, second.clone());
        detach(&first);
        assert_eq!(parent.borrow().children.len(), 1);
        assert!(std::rc::Rc::ptr_eq(&parent.borrow().children[0], &second));
    }
}
