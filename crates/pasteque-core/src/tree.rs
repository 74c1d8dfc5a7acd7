//! # Category Tree Builder
//!
//! Rebuilds the category forest from the flat list the server returns.
//!
//! ## Algorithm
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Two-Pass Tree Building                             │
//! │                                                                         │
//! │  PASS 1: group by declared parent                                      │
//! │  ──────────────────────────────────                                    │
//! │  [A(-), B(A), C(A), D(B), E(Z)]                                         │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  None → [A]    "A" → [B, C]    "B" → [D]    "Z" → [E]                  │
//! │                                                                         │
//! │  PASS 2: attach children recursively, starting at every root           │
//! │  ─────────────────────────────────────────────────────────────         │
//! │  A                                                                      │
//! │  ├── B                                                                  │
//! │  │   └── D                                                              │
//! │  └── C                                                                  │
//! │                                                                         │
//! │  E is never reached: its parent "Z" is not in the input, so it is      │
//! │  dropped rather than promoted to a root.                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The index is built once and only read during recursion. Each descent
//! tracks the ids on the current path; revisiting one means the data is
//! cyclic and the build fails with [`CoreError::CategoryCycle`].

use std::collections::{HashMap, HashSet};

use crate::error::{CoreError, CoreResult};
use crate::types::Category;

/// Categories grouped by declared parent id. `None` holds the roots.
#[derive(Debug, Default)]
pub struct ParentIndex {
    buckets: HashMap<Option<String>, Vec<Category>>,
}

impl ParentIndex {
    /// Groups categories by their `parent_id`, keeping input order per bucket.
    pub fn from_categories(categories: impl IntoIterator<Item = Category>) -> Self {
        let mut buckets: HashMap<Option<String>, Vec<Category>> = HashMap::new();
        for category in categories {
            buckets
                .entry(category.parent_id.clone())
                .or_default()
                .push(category);
        }
        ParentIndex { buckets }
    }

    /// Categories without a parent, in input order.
    pub fn roots(&self) -> &[Category] {
        self.children_of(None)
    }

    /// Categories declared under `parent`.
    pub fn children_of(&self, parent: Option<&str>) -> &[Category] {
        self.buckets
            .get(&parent.map(str::to_owned))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Attaches every indexed descendant of `node` under it.
    pub fn attach_subcategories(&self, node: &mut Category) -> CoreResult<()> {
        let mut path = HashSet::new();
        self.attach(node, &mut path)
    }

    fn attach(&self, node: &mut Category, path: &mut HashSet<String>) -> CoreResult<()> {
        if !path.insert(node.id.clone()) {
            return Err(CoreError::CategoryCycle {
                id: node.id.clone(),
            });
        }

        for child in self.children_of(Some(&node.id)) {
            let mut child = child.clone();
            self.attach(&mut child, path)?;
            node.add_subcategory(child);
        }

        path.remove(&node.id);
        Ok(())
    }
}

/// Builds the rooted forest from a flat category list.
///
/// Roots keep their input order, as do siblings. Categories whose declared
/// parent is missing from the input are left out of the result.
pub fn build_forest(categories: Vec<Category>) -> CoreResult<Vec<Category>> {
    let index = ParentIndex::from_categories(categories);

    index
        .roots()
        .iter()
        .map(|root| {
            let mut root = root.clone();
            index.attach_subcategories(&mut root)?;
            Ok(root)
        })
        .collect()
}

/// Total node count of a forest.
pub fn forest_size(roots: &[Category]) -> usize {
    roots.iter().map(Category::node_count).sum()
}
