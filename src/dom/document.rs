//! The document: root node plus `head` and `body`.

use super::node::Node;

/// An in-memory document.
///
/// Components mount into elements found with
/// [`query_selector`](Document::query_selector); component styles go into
/// [`head`](Document::head).
#[derive(Clone)]
pub struct Document {
    root: Node,
    head: Node,
    body: Node,
}

impl Document {
    /// An empty `<html><head></head><body></body></html>` document.
    pub fn new() -> Self {
        let root = Node::document();
        let html = Node::element("html");
        let head = Node::element("head");
        let body = Node::element("body");
        root.append_child(&html);
        html.append_child(&head);
        html.append_child(&body);
        Self { root, head, body }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn head(&self) -> &Node {
        &self.head
    }

    pub fn body(&self) -> &Node {
        &self.body
    }

    pub fn create_element(&self, tag: &str) -> Node {
        Node::element(tag)
    }

    pub fn create_text_node(&self, content: &str) -> Node {
        Node::text(content)
    }

    pub fn query_selector(&self, selector: &str) -> Option<Node> {
        self.root.query_selector(selector)
    }

    pub fn query_selector_all(&self, selector: &str) -> Vec<Node> {
        self.root.query_selector_all(selector)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.root.outer_html())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_document_is_connected() {
        let doc = Document::new();
        let host = doc.create_element("app-root");
        doc.body().append_child(&host);

        assert!(host.is_connected());
        assert!(doc.query_selector("app-root").is_some_and(|n| n.ptr_eq(&host)));

        host.remove();
        assert!(!host.is_connected());
        assert!(doc.query_selector("app-root").is_none());
    }
}
