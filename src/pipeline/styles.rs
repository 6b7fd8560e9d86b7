//! Component style sheets.
//!
//! Each mounted instance with styles gets one `<style data-component="id">`
//! element in the document head, removed when the instance is destroyed.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::dom::Node;

#[derive(Debug)]
pub struct StyleManager {
    head: Node,
    sheets: RefCell<HashMap<String, Node>>,
}

impl StyleManager {
    pub fn new(head: Node) -> Self {
        Self { head, sheets: RefCell::new(HashMap::new()) }
    }

    /// Install (or replace) the styles of instance `id`. Returns false when
    /// there is nothing to install.
    pub fn add(&self, id: &str, styles: &[String]) -> bool {
        if styles.is_empty() {
            return false;
        }
        let content = styles.join("\n");

        let mut sheets = self.sheets.borrow_mut();
        let sheet = sheets.entry(id.to_string()).or_insert_with(|| {
            let sheet = Node::element("style");
            sheet.set_attribute("data-component", id);
            self.head.append_child(&sheet);
            sheet
        });
        sheet.clear_children();
        sheet.append_child(&Node::text(content));
        true
    }

    pub fn remove(&self, id: &str) {
        let removed = self.sheets.borrow_mut().remove(id);
        if let Some(sheet) = removed {
            sheet.remove();
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sheets.borrow().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.sheets.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.borrow().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_remove() {
        let head = Node::element("head");
        let styles = StyleManager::new(head.clone());

        assert!(!styles.add("app-a-1", &[]));
        assert!(styles.add("app-a-1", &["p { margin: 0 }".into(), "b { color: red }".into()]));
        assert!(styles.add("app-a-1", &["p { margin: 1px }".into()]), "re-adding replaces");

        assert_eq!(head.child_count(), 1);
        let sheet = head.first_child().unwrap();
        assert_eq!(sheet.attribute("data-component").as_deref(), Some("app-a-1"));
        assert_eq!(sheet.text_content(), "p { margin: 1px }");

        styles.remove("app-a-1");
        assert_eq!(head.child_count(), 0);
        assert!(styles.is_empty());
    }
}
