//! Tabbable node computation
//!
//! Finds the elements below a root that sequential keyboard navigation can
//! reach, in the order Tab visits them: elements with a positive `tabindex`
//! first (by tabindex, then document order), followed by everything else in
//! document order.

use rustc_hash::FxHashMap;
use veil_core::{Document, NodeId};

const NATIVE_CANDIDATES: [&str; 5] = ["input", "select", "textarea", "button", "a"];

/// Ordered tabbable descendants of `root` (the root itself is not included)
pub fn tabbable_nodes(document: &Document, root: NodeId) -> Vec<NodeId> {
    let mut availability = Availability::new(document);
    let mut ordered: Vec<(i32, usize, NodeId)> = Vec::new();
    let mut natural: Vec<NodeId> = Vec::new();

    for (position, node) in document.descendants(root).into_iter().enumerate() {
        if !is_candidate(document, node) {
            continue;
        }
        let tab_index = document.tab_index(node);
        if tab_index < 0 || is_hidden_input(document, node) || document.is_disabled(node) {
            continue;
        }
        if availability.is_unavailable(node) {
            continue;
        }
        if tab_index == 0 {
            natural.push(node);
        } else {
            ordered.push((tab_index, position, node));
        }
    }

    ordered.sort_by_key(|&(tab_index, position, _)| (tab_index, position));
    ordered
        .into_iter()
        .map(|(_, _, node)| node)
        .chain(natural)
        .collect()
}

/// Whether a single node is currently tabbable
pub fn is_tabbable(document: &Document, node: NodeId) -> bool {
    is_candidate(document, node)
        && document.tab_index(node) >= 0
        && !is_hidden_input(document, node)
        && !document.is_disabled(node)
        && !Availability::new(document).is_unavailable(node)
}

fn is_candidate(document: &Document, node: NodeId) -> bool {
    if document.has_attribute(node, "tabindex") {
        return true;
    }
    match document.tag(node).as_deref() {
        Some("a") => document.has_attribute(node, "href"),
        Some(tag) => NATIVE_CANDIDATES.contains(&tag),
        None => false,
    }
}

fn is_hidden_input(document: &Document, node: NodeId) -> bool {
    document.tag(node).as_deref() == Some("input")
        && document.attribute(node, "type").as_deref() == Some("hidden")
}

/// Display/visibility checks for one pass
///
/// `display: none` is not inherited through computed style, so each node's
/// ancestors are walked; the results are cached for the pass only since the
/// tree may change between passes.
struct Availability<'a> {
    document: &'a Document,
    off: FxHashMap<NodeId, bool>,
}

impl<'a> Availability<'a> {
    fn new(document: &'a Document) -> Self {
        Self {
            document,
            off: FxHashMap::default(),
        }
    }

    fn is_unavailable(&mut self, node: NodeId) -> bool {
        if node == self.document.document_element() {
            return false;
        }
        self.is_off(node) || self.document.computed_visibility(node) == "hidden"
    }

    fn is_off(&mut self, node: NodeId) -> bool {
        // Collect the uncached part of the ancestor chain, then resolve it
        // top-down so every visited node lands in the cache
        let mut chain = Vec::new();
        let mut current = Some(node);
        let mut inherited = false;
        while let Some(id) = current {
            if id == self.document.document_element() {
                break;
            }
            if let Some(&cached) = self.off.get(&id) {
                inherited = cached;
                break;
            }
            chain.push(id);
            current = self.document.parent(id);
        }

        for id in chain.into_iter().rev() {
            let off = inherited || self.document.style(id, "display").as_deref() == Some("none");
            self.off.insert(id, off);
            inherited = off;
        }
        inherited
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (Document, NodeId) {
        let doc = Document::new();
        let root = doc.create_element("div");
        doc.append_child(doc.body(), root);
        (doc, root)
    }

    fn add(doc: &Document, parent: NodeId, tag: &str) -> NodeId {
        let node = doc.create_element(tag);
        doc.append_child(parent, node);
        node
    }

    #[test]
    fn test_natural_order() {
        let (doc, root) = fixture();
        let a = add(&doc, root, "button");
        let wrapper = add(&doc, root, "div");
        let b = add(&doc, wrapper, "input");
        let c = add(&doc, root, "textarea");
        assert_eq!(tabbable_nodes(&doc, root), vec![a, b, c]);
    }

    #[test]
    fn test_positive_tabindex_first() {
        let (doc, root) = fixture();
        let a = add(&doc, root, "button");
        let b = add(&doc, root, "button");
        doc.set_attribute(b, "tabindex", "2");
        let c = add(&doc, root, "div");
        doc.set_attribute(c, "tabindex", "1");
        let d = add(&doc, root, "span");
        doc.set_attribute(d, "tabindex", "2");
        assert_eq!(tabbable_nodes(&doc, root), vec![c, b, d, a]);
    }

    #[test]
    fn test_exclusions() {
        let (doc, root) = fixture();
        let negative = add(&doc, root, "button");
        doc.set_attribute(negative, "tabindex", "-1");
        let hidden_input = add(&doc, root, "input");
        doc.set_attribute(hidden_input, "type", "hidden");
        let disabled = add(&doc, root, "button");
        doc.set_attribute(disabled, "disabled", "");
        let bare_link = add(&doc, root, "a");
        let plain_div = add(&doc, root, "div");
        let link = add(&doc, root, "a");
        doc.set_attribute(link, "href", "#");

        assert_eq!(tabbable_nodes(&doc, root), vec![link]);
        assert!(!is_tabbable(&doc, bare_link));
        assert!(!is_tabbable(&doc, plain_div));
        assert!(is_tabbable(&doc, link));
    }

    #[test]
    fn test_display_none_ancestor() {
        let (doc, root) = fixture();
        let section = add(&doc, root, "section");
        doc.set_style(section, "display", "none");
        let inner = add(&doc, section, "div");
        let hidden = add(&doc, inner, "button");
        let visible = add(&doc, root, "button");
        assert_eq!(tabbable_nodes(&doc, root), vec![visible]);
        assert!(!is_tabbable(&doc, hidden));

        doc.set_style(section, "display", "block");
        assert_eq!(tabbable_nodes(&doc, root), vec![hidden, visible]);
    }

    #[test]
    fn test_visibility_hidden_is_inherited_but_overridable() {
        let (doc, root) = fixture();
        let panel = add(&doc, root, "div");
        doc.set_style(panel, "visibility", "hidden");
        let hidden = add(&doc, panel, "button");
        let shown = add(&doc, panel, "button");
        doc.set_style(shown, "visibility", "visible");
        assert_eq!(tabbable_nodes(&doc, root), vec![shown]);
        assert!(!is_tabbable(&doc, hidden));
    }

    #[test]
    fn test_root_excluded() {
        let (doc, _) = fixture();
        let root = add(&doc, doc.body(), "button");
        let inner = add(&doc, root, "input");
        assert_eq!(tabbable_nodes(&doc, root), vec![inner]);
    }
}
