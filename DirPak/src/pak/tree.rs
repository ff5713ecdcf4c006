//! SPDX-FileCopyrightText: 2025 CyberDeco
//!
//! SPDX-License-Identifier: MIT
//!
//! In-memory directory tree rebuilt from the entry table
//!
//! The entry table is the preorder serialization of the tree where each
//! directory only stores its direct child count. Decoding keeps a stack of
//! directories that still expect children; nesting depth lives in that stack
//! and nothing else, so arbitrarily deep archives decode without recursion.
//!
//! Nodes live in an arena indexed by [`NodeId`]. The synthetic root is always
//! `NodeId(0)` and the node for entry `i` is `NodeId(i + 1)`.

use super::format::{EntryKind, PakEntry, string_at};
use crate::error::{Error, Result};

/// Index of a node in a [`PakTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// The synthetic root
    pub const ROOT: Self = Self(0);

    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// A reconstructed file or directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub name: String,
    pub is_dir: bool,
    /// Index into the entry table, `None` for the root
    pub entry: Option<usize>,
    pub parent: Option<NodeId>,
    pub first_child: Option<NodeId>,
    pub next_sibling: Option<NodeId>,
}

impl Node {
    fn root() -> Self {
        Self {
            name: String::new(),
            is_dir: true,
            entry: None,
            parent: None,
            first_child: None,
            next_sibling: None,
        }
    }
}

/// A directory still waiting for children during decoding
struct OpenDir {
    node: NodeId,
    /// Entry index, `None` for the root
    entry: Option<usize>,
    expected: u64,
    remaining: u64,
}

/// Arena of nodes reconstructed from an archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PakTree {
    nodes: Vec<Node>,
}

impl Default for PakTree {
    fn default() -> Self {
        Self {
            nodes: vec![Node::root()],
        }
    }
}

impl PakTree {
    /// Rebuild the tree from a decoded entry table and its string blob.
    ///
    /// Top-level subtrees are consumed until the table ends.
    ///
    /// # Errors
    /// [`Error::EntryTableExhausted`] if a directory declares more children
    /// than remain, [`Error::InvalidEntry`] for a bad name offset or a
    /// directory whose first child is not the entry right after it.
    pub fn from_entries(entries: &[PakEntry], strings: &[u8]) -> Result<Self> {
        Self::decode(entries, strings, None)
    }

    /// Rebuild a tree whose root holds exactly `top_level` subtrees.
    ///
    /// # Errors
    /// In addition to the errors of [`PakTree::from_entries`], entries left
    /// after the last top-level subtree are [`Error::EntryTableRemainder`].
    pub fn from_forest(entries: &[PakEntry], strings: &[u8], top_level: u64) -> Result<Self> {
        Self::decode(entries, strings, Some(top_level))
    }

    fn decode(entries: &[PakEntry], strings: &[u8], top_level: Option<u64>) -> Result<Self> {
        let mut tree = Self {
            nodes: Vec::with_capacity(entries.len() + 1),
        };
        tree.nodes.push(Node::root());

        // Last linked child per node, for O(1) sibling linking
        let mut tails: Vec<Option<NodeId>> = Vec::with_capacity(entries.len() + 1);
        tails.push(None);

        let root_budget = top_level.unwrap_or(u64::MAX);
        let mut open = vec![OpenDir {
            node: NodeId::ROOT,
            entry: None,
            expected: root_budget,
            remaining: root_budget,
        }];

        let mut index = 0;
        loop {
            while open.len() > 1 && open.last().is_some_and(|dir| dir.remaining == 0) {
                open.pop();
            }
            let Some(parent) = open.last_mut() else {
                break;
            };

            if parent.remaining == 0 {
                // Only the bounded root can get here
                if index < entries.len() {
                    return Err(Error::EntryTableRemainder {
                        remaining: entries.len() - index,
                    });
                }
                break;
            }

            if index == entries.len() {
                return match parent.entry {
                    Some(directory) => Err(Error::EntryTableExhausted {
                        directory,
                        expected: parent.expected,
                    }),
                    None if top_level.is_some() => Err(Error::Truncated {
                        section: "entry table",
                        expected: parent.expected,
                        found: parent.expected - parent.remaining,
                    }),
                    None => Ok(tree),
                };
            }

            parent.remaining -= 1;
            let parent = parent.node;

            let entry = &entries[index];
            let id = NodeId(tree.nodes.len());
            tree.nodes.push(Node {
                name: string_at(strings, entry.string_offset, index)?.into_owned(),
                is_dir: entry.is_dir(),
                entry: Some(index),
                parent: Some(parent),
                first_child: None,
                next_sibling: None,
            });
            tails.push(None);

            match tails[parent.0] {
                Some(prev) => tree.nodes[prev.0].next_sibling = Some(id),
                None => tree.nodes[parent.0].first_child = Some(id),
            }
            tails[parent.0] = Some(id);

            if let EntryKind::Directory {
                first_child,
                child_count,
            } = entry.kind
            {
                let linked = if child_count == 0 { 0 } else { index as u64 + 1 };
                if first_child != linked {
                    return Err(Error::InvalidEntry {
                        index,
                        message: format!(
                            "directory with {child_count} children points at entry {first_child}, expected {linked}"
                        ),
                    });
                }
                if child_count > 0 {
                    open.push(OpenDir {
                        node: id,
                        entry: Some(index),
                        expected: child_count,
                        remaining: child_count,
                    });
                }
            }

            index += 1;
        }

        Ok(tree)
    }

    #[must_use]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Number of nodes, the root included
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree holds nothing but the root
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// # Panics
    /// Panics if `id` does not belong to this tree.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// Immediate children of `id` in archive order
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            tree: self,
            next: self.get(id).and_then(|n| n.first_child),
        }
    }

    /// Every node except the root, in preorder
    pub fn walk(&self) -> impl Iterator<Item = NodeId> + '_ {
        (1..self.nodes.len()).map(NodeId)
    }

    /// Depth of a node below the root (top-level nodes are at depth 1)
    #[must_use]
    pub fn depth(&self, id: NodeId) -> usize {
        std::iter::successors(self.parent(id), |&p| self.parent(p)).count()
    }

    /// '/'-joined names from the root down to `id`. The root itself is "/".
    #[must_use]
    pub fn full_path(&self, id: NodeId) -> String {
        let mut names: Vec<&str> = std::iter::successors(Some(id), |&n| self.parent(n))
            .take_while(|&n| n != NodeId::ROOT)
            .map(|n| self.node(n).name.as_str())
            .collect();
        if names.is_empty() {
            return "/".to_string();
        }
        names.reverse();

        let mut path = String::new();
        for name in names {
            path.push('/');
            path.push_str(name);
        }
        path
    }
}

/// Iterator over the immediate children of a node
pub struct Children<'a> {
    tree: &'a PakTree,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.node(current).next_sibling;
        Some(current)
    }
}
