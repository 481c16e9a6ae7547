//! Arena-based document tree.
//!
//! The assembled book lives in one arena for the whole reading session. The
//! segmenter and the tokenizer mutate it in place, so beside the building
//! operations html5ever needs, the arena supports detaching nodes and
//! document-order traversal.

use html5ever::{LocalName, QualName, ns};

/// Unique identifier for a node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Sentinel value for no node.
    pub const NONE: NodeId = NodeId(u32::MAX);

    pub fn is_some(&self) -> bool {
        self.0 != u32::MAX
    }

    pub fn is_none(&self) -> bool {
        self.0 == u32::MAX
    }
}

/// Node type in the arena.
#[derive(Debug, Clone)]
pub enum NodeData {
    Document,
    Element {
        name: QualName,
        attrs: Vec<Attribute>,
    },
    Text(String),
    Comment(String),
    Doctype {
        name: String,
    },
}

/// Element attribute.
#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: QualName,
    pub value: String,
}

impl Attribute {
    /// An unprefixed, namespace-less attribute.
    pub fn new(name: &str, value: impl Into<String>) -> Self {
        Self {
            name: QualName::new(None, ns!(), LocalName::from(name)),
            value: value.into(),
        }
    }
}

/// A node in the arena.
#[derive(Debug)]
pub struct Node {
    pub data: NodeData,
    pub parent: NodeId,
    pub first_child: NodeId,
    pub last_child: NodeId,
    pub prev_sibling: NodeId,
    pub next_sibling: NodeId,
}

impl Node {
    fn new(data: NodeData) -> Self {
        Self {
            data,
            parent: NodeId::NONE,
            first_child: NodeId::NONE,
            last_child: NodeId::NONE,
            prev_sibling: NodeId::NONE,
            next_sibling: NodeId::NONE,
        }
    }
}

/// Arena-based document tree.
///
/// All nodes are stored in a contiguous vector; parent/child/sibling links
/// are indices into it. Detached nodes stay allocated but unreachable.
pub struct Dom {
    nodes: Vec<Node>,
    document: NodeId,
}

impl Dom {
    /// Create a new empty tree with a document root.
    pub fn new() -> Self {
        let mut dom = Self {
            nodes: Vec::new(),
            document: NodeId::NONE,
        };
        dom.document = dom.alloc(Node::new(NodeData::Document));
        dom
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn document(&self) -> NodeId {
        self.document
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        if id.is_none() {
            return None;
        }
        self.nodes.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        if id.is_none() {
            return None;
        }
        self.nodes.get_mut(id.0 as usize)
    }

    pub fn create_element(&mut self, name: QualName, attrs: Vec<Attribute>) -> NodeId {
        self.alloc(Node::new(NodeData::Element { name, attrs }))
    }

    /// Create an HTML-namespace element.
    pub fn create_html_element(&mut self, tag: &str, attrs: Vec<Attribute>) -> NodeId {
        let name = QualName::new(None, ns!(html), LocalName::from(tag));
        self.create_element(name, attrs)
    }

    pub fn create_text(&mut self, text: String) -> NodeId {
        self.alloc(Node::new(NodeData::Text(text)))
    }

    pub fn create_comment(&mut self, text: String) -> NodeId {
        self.alloc(Node::new(NodeData::Comment(text)))
    }

    pub fn create_doctype(&mut self, name: String) -> NodeId {
        self.alloc(Node::new(NodeData::Doctype { name }))
    }

    /// Append a child to a parent node.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        let last_child = self
            .get(parent)
            .map(|n| n.last_child)
            .unwrap_or(NodeId::NONE);

        if let Some(child_node) = self.get_mut(child) {
            child_node.parent = parent;
            child_node.prev_sibling = last_child;
            child_node.next_sibling = NodeId::NONE;
        }

        if let Some(last_node) = self.get_mut(last_child) {
            last_node.next_sibling = child;
        }

        if let Some(parent_node) = self.get_mut(parent) {
            if parent_node.first_child.is_none() {
                parent_node.first_child = child;
            }
            parent_node.last_child = child;
        }
    }

    /// Insert a node before a sibling.
    pub fn insert_before(&mut self, sibling: NodeId, new_node: NodeId) {
        let (parent, prev) = match self.get(sibling) {
            Some(n) => (n.parent, n.prev_sibling),
            None => return,
        };

        if let Some(new) = self.get_mut(new_node) {
            new.parent = parent;
            new.prev_sibling = prev;
            new.next_sibling = sibling;
        }

        if let Some(sib) = self.get_mut(sibling) {
            sib.prev_sibling = new_node;
        }

        if prev.is_some() {
            if let Some(p) = self.get_mut(prev) {
                p.next_sibling = new_node;
            }
        } else if let Some(par) = self.get_mut(parent) {
            par.first_child = new_node;
        }
    }

    /// Unlink a node from its parent and siblings. Its own subtree is kept.
    pub fn detach(&mut self, target: NodeId) {
        let (parent, prev, next) = match self.get(target) {
            Some(n) => (n.parent, n.prev_sibling, n.next_sibling),
            None => return,
        };

        if prev.is_some() {
            if let Some(p) = self.get_mut(prev) {
                p.next_sibling = next;
            }
        } else if let Some(p) = self.get_mut(parent) {
            p.first_child = next;
        }

        if next.is_some() {
            if let Some(n) = self.get_mut(next) {
                n.prev_sibling = prev;
            }
        } else if let Some(p) = self.get_mut(parent) {
            p.last_child = prev;
        }

        if let Some(node) = self.get_mut(target) {
            node.parent = NodeId::NONE;
            node.prev_sibling = NodeId::NONE;
            node.next_sibling = NodeId::NONE;
        }
    }

    /// Append text to an existing trailing text node, or create a new one.
    pub fn append_text(&mut self, parent: NodeId, text: &str) {
        let last_child = self
            .get(parent)
            .map(|n| n.last_child)
            .unwrap_or(NodeId::NONE);

        if let Some(last) = self.get_mut(last_child)
            && let NodeData::Text(ref mut existing) = last.data
        {
            existing.push_str(text);
            return;
        }

        let text_node = self.create_text(text.to_string());
        self.append(parent, text_node);
    }

    /// Number of allocated nodes, detached ones included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the tree is empty (only has the document root).
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).map(|n| n.parent).filter(NodeId::is_some)
    }

    /// Iterate over children of a node.
    pub fn children(&self, parent: NodeId) -> ChildrenIter<'_> {
        let first = self
            .get(parent)
            .map(|n| n.first_child)
            .unwrap_or(NodeId::NONE);
        ChildrenIter {
            dom: self,
            current: first,
        }
    }

    /// Iterate over the element ancestors of a node, nearest first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&n| self.parent(n))
    }

    /// Is `ancestor` a proper ancestor of `id`?
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        self.ancestors(id).any(|a| a == ancestor)
    }

    /// Next node in document (pre-)order within `root`'s subtree.
    ///
    /// With `descend == false` the children of `id` are skipped.
    pub fn next_in_order(&self, id: NodeId, root: NodeId, descend: bool) -> Option<NodeId> {
        if descend {
            let first = self.get(id)?.first_child;
            if first.is_some() {
                return Some(first);
            }
        }
        let mut current = id;
        loop {
            if current == root {
                return None;
            }
            let node = self.get(current)?;
            if node.next_sibling.is_some() {
                return Some(node.next_sibling);
            }
            current = node.parent;
            if current.is_none() {
                return None;
            }
        }
    }

    /// Previous node in document (pre-)order within `root`'s subtree.
    pub fn prev_in_order(&self, id: NodeId, root: NodeId) -> Option<NodeId> {
        if id == root {
            return None;
        }
        let node = self.get(id)?;
        if node.prev_sibling.is_some() {
            // Deepest last descendant of the previous sibling
            let mut current = node.prev_sibling;
            while let Some(n) = self.get(current)
                && n.last_child.is_some()
            {
                current = n.last_child;
            }
            return Some(current);
        }
        self.parent(id)
    }

    /// All nodes of `root`'s subtree in document order, `root` included.
    pub fn descendants(&self, root: NodeId) -> Descendants<'_> {
        Descendants {
            dom: self,
            root,
            next: if self.get(root).is_some() {
                Some(root)
            } else {
                None
            },
        }
    }

    /// Find the first node matching a predicate (document order).
    pub fn find<F>(&self, predicate: F) -> Option<NodeId>
    where
        F: Fn(&Node) -> bool,
    {
        self.descendants(self.document)
            .find(|&id| self.get(id).is_some_and(&predicate))
    }

    /// Find element by tag name (first match).
    pub fn find_by_tag(&self, tag: &str) -> Option<NodeId> {
        self.find(|node| match &node.data {
            NodeData::Element { name, .. } => name.local.as_ref() == tag,
            _ => false,
        })
    }

    /// Concatenated text of every text node under `root`.
    pub fn collect_text(&self, root: NodeId) -> String {
        let mut out = String::new();
        for id in self.descendants(root) {
            if let Some(text) = self.text_content(id) {
                out.push_str(text);
            }
        }
        out
    }
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over children of a node.
pub struct ChildrenIter<'a> {
    dom: &'a Dom,
    current: NodeId,
}

impl Iterator for ChildrenIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current.is_none() {
            return None;
        }
        let id = self.current;
        self.current = self
            .dom
            .get(id)
            .map(|n| n.next_sibling)
            .unwrap_or(NodeId::NONE);
        Some(id)
    }
}

/// Pre-order iterator over a subtree.
pub struct Descendants<'a> {
    dom: &'a Dom,
    root: NodeId,
    next: Option<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.dom.next_in_order(current, self.root, true);
        Some(current)
    }
}

/// Convenience methods for element nodes.
impl Dom {
    /// Get element's local name (tag).
    pub fn element_name(&self, id: NodeId) -> Option<&LocalName> {
        self.get(id).and_then(|n| match &n.data {
            NodeData::Element { name, .. } => Some(&name.local),
            _ => None,
        })
    }

    /// Is this an element with the given local name?
    pub fn is_tag(&self, id: NodeId, tag: &str) -> bool {
        self.element_name(id).is_some_and(|n| n.as_ref() == tag)
    }

    pub fn get_attr(&self, id: NodeId, attr_name: &str) -> Option<&str> {
        self.get(id).and_then(|n| match &n.data {
            NodeData::Element { attrs, .. } => attrs
                .iter()
                .find(|a| a.name.local.as_ref() == attr_name)
                .map(|a| a.value.as_str()),
            _ => None,
        })
    }

    /// Set an attribute, replacing any attribute with the same local name.
    pub fn set_attr(&mut self, id: NodeId, attr_name: &str, value: impl Into<String>) {
        if let Some(node) = self.get_mut(id)
            && let NodeData::Element { attrs, .. } = &mut node.data
        {
            let value = value.into();
            match attrs.iter_mut().find(|a| a.name.local.as_ref() == attr_name) {
                Some(existing) => existing.value = value,
                None => attrs.push(Attribute::new(attr_name, value)),
            }
        }
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.get_attr(id, "class")
            .is_some_and(|v| v.split_ascii_whitespace().any(|c| c == class))
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.get(id)
            .is_some_and(|n| matches!(n.data, NodeData::Element { .. }))
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        self.get(id)
            .is_some_and(|n| matches!(n.data, NodeData::Text(_)))
    }

    /// Get text content of a text node.
    pub fn text_content(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.data {
            NodeData::Text(s) => Some(s.as_str()),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build() -> (Dom, NodeId, NodeId, NodeId) {
        let mut dom = Dom::new();
        let div = dom.create_html_element("div", vec![Attribute::new("class", "a b")]);
        let p1 = dom.create_html_element("p", vec![]);
        let p2 = dom.create_html_element("p", vec![]);
        dom.append(dom.document(), div);
        dom.append(div, p1);
        dom.append(div, p2);
        dom.append_text(p1, "Hello, ");
        dom.append_text(p1, "World!");
        dom.append_text(p2, "Second");
        (dom, div, p1, p2)
    }

    #[test]
    fn test_append_and_text_merging() {
        let (dom, div, p1, _) = build();
        assert_eq!(dom.children(div).count(), 2);
        let children: Vec<_> = dom.children(p1).collect();
        assert_eq!(children.len(), 1);
        assert_eq!(dom.text_content(children[0]), Some("Hello, World!"));
        assert!(dom.has_class(div, "b"));
        assert!(!dom.has_class(div, "c"));
    }

    #[test]
    fn test_document_order_traversal() {
        let (dom, div, p1, p2) = build();
        let order: Vec<_> = dom.descendants(div).collect();
        assert_eq!(order[0], div);
        assert_eq!(order[1], p1);
        assert_eq!(order[3], p2);
        assert_eq!(order.len(), 5);

        let last = *order.last().unwrap();
        assert_eq!(dom.prev_in_order(last, div), Some(p2));
        assert_eq!(dom.prev_in_order(p2, div), Some(order[2]));
        assert_eq!(dom.next_in_order(p1, div, false), Some(p2));
        assert_eq!(dom.next_in_order(last, div, true), None);
    }

    #[test]
    fn test_detach_and_insert_before() {
        let (mut dom, div, p1, p2) = build();
        let hr = dom.create_html_element("hr", vec![]);
        dom.insert_before(p2, hr);
        assert_eq!(dom.children(div).collect::<Vec<_>>(), vec![p1, hr, p2]);

        dom.detach(p1);
        assert_eq!(dom.children(div).collect::<Vec<_>>(), vec![hr, p2]);
        assert_eq!(dom.parent(p1), None);

        dom.detach(p2);
        assert_eq!(dom.children(div).collect::<Vec<_>>(), vec![hr]);
        assert_eq!(dom.get(div).unwrap().last_child, hr);
    }

    #[test]
    fn test_ancestors_and_collect_text() {
        let (dom, div, p1, _) = build();
        let text = dom.children(p1).next().unwrap();
        let ancestors: Vec<_> = dom.ancestors(text).collect();
        assert_eq!(ancestors, vec![p1, div, dom.document()]);
        assert!(dom.is_ancestor(div, text));
        assert_eq!(dom.collect_text(div), "Hello, World!Second");
    }

    #[test]
    fn test_set_attr_replaces() {
        let (mut dom, div, _, _) = build();
        dom.set_attr(div, "class", "z");
        dom.set_attr(div, "data-x", "1");
        assert_eq!(dom.get_attr(div, "class"), Some("z"));
        assert_eq!(dom.get_attr(div, "data-x"), Some("1"));
        assert_eq!(dom.find_by_tag("p").map(|p| dom.is_tag(p, "p")), Some(true));
    }
}
