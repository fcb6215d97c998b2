//! Sidebar navigation derived from the directory structure.

use crate::slug::display_name;
use crate::tree::{FileTree, NodeId, NodeKind, TreeError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One sidebar entry: a link to a document, or a titled group of entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NavEntry {
    Section { text: String, items: Vec<NavEntry> },
    Leaf { text: String, link: String },
}

impl NavEntry {
    pub fn text(&self) -> &str {
        match self {
            NavEntry::Section { text, .. } | NavEntry::Leaf { text, .. } => text,
        }
    }
}

/// Sections already derived during one run, keyed by the depth-1 node.
#[derive(Debug, Default)]
pub struct NavigationCache {
    sections: HashMap<NodeId, NavEntry>,
}

impl NavigationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// Derive the navigation entry for `id` and everything below it.
///
/// Markdown files become leaves, directories become sections of their
/// non-empty children. Branches without any markdown file yield `None`.
pub fn derive_section(tree: &FileTree, id: NodeId) -> Option<NavEntry> {
    let node = tree.node(id);
    match node.kind() {
        NodeKind::File => {
            if !node.is_markdown() {
                return None;
            }
            Some(NavEntry::Leaf {
                text: display_name(node.stem()),
                link: document_link(tree, id),
            })
        }
        NodeKind::Directory { children } => {
            let items: Vec<NavEntry> = children
                .iter()
                .filter_map(|&child| derive_section(tree, child))
                .collect();
            if items.is_empty() {
                None
            } else {
                Some(NavEntry::Section {
                    text: display_name(node.name()),
                    items,
                })
            }
        }
    }
}

/// Route of a document: `/` + its tree path, extension stripped, always
/// separated by forward slashes.
pub fn document_link(tree: &FileTree, id: NodeId) -> String {
    let segments = tree.segments(id);
    let mut link = String::new();
    for (idx, segment) in segments.iter().enumerate() {
        link.push('/');
        if idx + 1 == segments.len() {
            link.push_str(tree.node(id).stem());
        } else {
            link.push_str(segment);
        }
    }
    link
}

/// Navigation shown next to the document `id`: the section of its depth-1
/// ancestor. Documents at the root get none.
///
/// Each depth-1 section is derived at most once per cache; branches that
/// produce nothing are not cached and get re-derived on the next call.
pub fn resolve_for_document<'c>(
    tree: &FileTree,
    id: NodeId,
    cache: &'c mut NavigationCache,
) -> Result<Option<&'c NavEntry>, TreeError> {
    let Some(section) = tree.section_of(id)? else {
        return Ok(None);
    };

    if !cache.sections.contains_key(&section) {
        match derive_section(tree, section) {
            Some(entry) => {
                tracing::debug!("Derived navigation for section '{}'", entry.text());
                cache.sections.insert(section, entry);
            }
            None => return Ok(None),
        }
    }
    Ok(cache.sections.get(&section))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(text: &str, link: &str) -> NavEntry {
        NavEntry::Leaf {
            text: text.to_string(),
            link: link.to_string(),
        }
    }

    fn doc_tree() -> (FileTree, NodeId, NodeId) {
        let mut tree = FileTree::directory("doc");
        let root = tree.root();
        tree.add_file(root, "file1-intro.md").unwrap();
        tree.add_file(root, "file2.md").unwrap();
        let guide = tree.add_directory(root, "guide").unwrap();
        let file3 = tree.add_file(guide, "file3.md").unwrap();
        (tree, guide, file3)
    }

    #[test]
    fn test_empty_directory_has_no_section() {
        let tree = FileTree::directory("doc");
        assert_eq!(derive_section(&tree, tree.root()), None);
    }

    #[test]
    fn test_directory_without_markdown_has_no_section() {
        let mut tree = FileTree::directory("doc");
        let root = tree.root();
        tree.add_file(root, "file1.jpg").unwrap();
        tree.add_file(root, "file2.png").unwrap();
        assert_eq!(derive_section(&tree, root), None);
    }

    #[test]
    fn test_directory_with_markdown() {
        let (tree, _, _) = doc_tree();
        let section = derive_section(&tree, tree.root()).unwrap();
        assert_eq!(
            section,
            NavEntry::Section {
                text: "doc".into(),
                items: vec![
                    leaf("file1 intro", "/doc/file1-intro"),
                    leaf("file2", "/doc/file2"),
                    NavEntry::Section {
                        text: "guide".into(),
                        items: vec![leaf("file3", "/doc/guide/file3")],
                    },
                ],
            }
        );
    }

    #[test]
    fn test_branches_without_markdown_are_pruned() {
        let mut tree = FileTree::directory("doc");
        let root = tree.root();
        tree.add_file(root, "index.md").unwrap();
        let images = tree.add_directory(root, "images").unwrap();
        tree.add_file(images, "pic.jpg").unwrap();
        let empty = tree.add_directory(root, "empty-dir").unwrap();
        tree.add_directory(empty, "also-empty").unwrap();

        assert_eq!(derive_section(&tree, images), None);
        assert_eq!(derive_section(&tree, empty), None);
        assert_eq!(
            derive_section(&tree, root),
            Some(NavEntry::Section {
                text: "doc".into(),
                items: vec![leaf("index", "/doc/index")],
            })
        );
    }

    #[test]
    fn test_leaf_link_derivation() {
        let mut tree = FileTree::directory("guide");
        let root = tree.root();
        let part = tree.add_file(root, "part1.md").unwrap();
        assert_eq!(derive_section(&tree, part), Some(leaf("part1", "/guide/part1")));
    }

    #[test]
    fn test_section_text_replaces_hyphens() {
        let mut tree = FileTree::directory("doc");
        let root = tree.root();
        let dir = tree.add_directory(root, "getting-started").unwrap();
        tree.add_file(dir, "first-steps.md").unwrap();

        assert_eq!(
            derive_section(&tree, dir),
            Some(NavEntry::Section {
                text: "getting started".into(),
                items: vec![leaf("first steps", "/doc/getting-started/first-steps")],
            })
        );
    }

    #[test]
    fn test_resolve_for_root_is_none() {
        let (tree, _, _) = doc_tree();
        let mut cache = NavigationCache::new();
        assert_eq!(resolve_for_document(&tree, tree.root(), &mut cache).unwrap(), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_resolve_for_depth_one_and_deeper() {
        let (tree, guide, file3) = doc_tree();
        let expected = NavEntry::Section {
            text: "guide".into(),
            items: vec![leaf("file3", "/doc/guide/file3")],
        };

        let mut cache = NavigationCache::new();
        assert_eq!(
            resolve_for_document(&tree, guide, &mut cache).unwrap(),
            Some(&expected)
        );
        assert_eq!(
            resolve_for_document(&tree, file3, &mut cache).unwrap(),
            Some(&expected)
        );
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_resolve_for_top_level_document_is_leaf() {
        let (tree, _, _) = doc_tree();
        let intro = tree.child(tree.root(), "file2.md").unwrap();
        let mut cache = NavigationCache::new();
        assert_eq!(
            resolve_for_document(&tree, intro, &mut cache).unwrap(),
            Some(&leaf("file2", "/doc/file2"))
        );
    }

    #[test]
    fn test_cache_is_keyed_by_identity() {
        let mut tree = FileTree::directory("doc");
        let root = tree.root();
        let a = tree.add_directory(root, "a").unwrap();
        let a_doc = tree.add_file(a, "one.md").unwrap();
        let b = tree.add_directory(root, "b").unwrap();
        let b_doc = tree.add_file(b, "two.md").unwrap();

        let mut cache = NavigationCache::new();
        let first = resolve_for_document(&tree, a_doc, &mut cache)
            .unwrap()
            .cloned();
        let second = resolve_for_document(&tree, b_doc, &mut cache)
            .unwrap()
            .cloned();
        assert_eq!(first.unwrap().text(), "a");
        assert_eq!(second.unwrap().text(), "b");
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_empty_sections_are_not_cached() {
        let mut tree = FileTree::directory("doc");
        let root = tree.root();
        let assets = tree.add_directory(root, "assets").unwrap();
        let pic = tree.add_file(assets, "pic.png").unwrap();

        let mut cache = NavigationCache::new();
        assert_eq!(resolve_for_document(&tree, pic, &mut cache).unwrap(), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_serializes_like_sidebar_config() {
        let (tree, guide, _) = doc_tree();
        let json = serde_json::to_value(derive_section(&tree, guide)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "text": "guide",
                "items": [{ "text": "file3", "link": "/doc/guide/file3" }]
            })
        );
    }
}
