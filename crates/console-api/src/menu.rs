//! Backoffice menu tree and its expansion state.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One node of the per-user menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission: Option<String>,
    #[serde(default, alias = "sortOrder", skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<MenuItem>,
}

impl MenuItem {
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

/// A node together with its depth, as yielded by [`flatten`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlatItem<'a> {
    pub depth: usize,
    pub item: &'a MenuItem,
}

/// Sort siblings by `sort_order`, recursively. Items without an order go last;
/// ties keep their server order.
pub fn sort_tree(items: &mut [MenuItem]) {
    items.sort_by_key(|item| item.sort_order.unwrap_or(i32::MAX));
    for item in items.iter_mut() {
        sort_tree(&mut item.children);
    }
}

pub fn find<'a>(items: &'a [MenuItem], id: &str) -> Option<&'a MenuItem> {
    items.iter().find_map(|item| {
        if item.id == id {
            Some(item)
        } else {
            find(&item.children, id)
        }
    })
}

pub fn find_by_path<'a>(items: &'a [MenuItem], path: &str) -> Option<&'a MenuItem> {
    items.iter().find_map(|item| {
        if item.path.as_deref() == Some(path) {
            Some(item)
        } else {
            find_by_path(&item.children, path)
        }
    })
}

/// Ids of the ancestors of `id`, root first. Empty when `id` is a root or
/// not in the tree.
pub fn ancestors_of(items: &[MenuItem], id: &str) -> Vec<String> {
    let mut trail = Vec::new();
    if collect_ancestors(items, id, &mut trail) {
        trail
    } else {
        Vec::new()
    }
}

fn collect_ancestors(items: &[MenuItem], id: &str, trail: &mut Vec<String>) -> bool {
    for item in items {
        if item.id == id {
            return true;
        }
        trail.push(item.id.clone());
        if collect_ancestors(&item.children, id, trail) {
            return true;
        }
        trail.pop();
    }
    false
}

/// Depth-first walk of the tree.
pub fn flatten(items: &[MenuItem]) -> Vec<FlatItem<'_>> {
    let mut out = Vec::new();
    flatten_into(items, 0, &mut out);
    out
}

fn flatten_into<'a>(items: &'a [MenuItem], depth: usize, out: &mut Vec<FlatItem<'a>>) {
    for item in items {
        out.push(FlatItem { depth, item });
        flatten_into(&item.children, depth + 1, out);
    }
}

/// Which menu nodes are expanded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuState {
    expanded: BTreeSet<String>,
}

impl MenuState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle(&mut self, id: &str) {
        if !self.expanded.remove(id) {
            self.expanded.insert(id.to_string());
        }
    }

    pub fn expand(&mut self, id: &str) {
        self.expanded.insert(id.to_string());
    }

    pub fn collapse(&mut self, id: &str) {
        self.expanded.remove(id);
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.expanded.contains(id)
    }

    pub fn clear(&mut self) {
        self.expanded.clear();
    }

    pub fn expanded(&self) -> impl Iterator<Item = &str> {
        self.expanded.iter().map(String::as_str)
    }

    /// Expand every ancestor of the item routed at `path`.
    ///
    /// Returns false when no item has that path.
    pub fn reveal(&mut self, items: &[MenuItem], path: &str) -> bool {
        let Some(item) = find_by_path(items, path) else {
            return false;
        };
        for id in ancestors_of(items, &item.id) {
            self.expanded.insert(id);
        }
        true
    }
}
