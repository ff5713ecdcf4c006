//! SPDX-FileCopyrightText: 2025 CyberDeco
//!
//! SPDX-License-Identifier: MIT
//!
//! Path lookup over a [`PakTree`]
//!
//! Paths are '/'-delimited and compared verbatim against each node's full
//! path: no normalization of `.`, `..` or repeated separators. Duplicate
//! paths resolve to the first match in preorder.

use super::tree::{NodeId, PakTree};

/// Which kind of node a lookup accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    File,
    Directory,
    Any,
}

impl Lookup {
    fn accepts(self, is_dir: bool) -> bool {
        match self {
            Self::File => !is_dir,
            Self::Directory => is_dir,
            Self::Any => true,
        }
    }
}

/// Outcome of [`PakTree::lookup`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Found(NodeId),
    /// The path exists but names the other kind of node
    WrongKind(NodeId),
    NotFound,
}

impl Resolution {
    #[must_use]
    pub fn found(self) -> Option<NodeId> {
        match self {
            Self::Found(id) => Some(id),
            Self::WrongKind(_) | Self::NotFound => None,
        }
    }
}

impl PakTree {
    /// First node in preorder whose full path equals `path` and whose kind
    /// `lookup` accepts. `"/"` names the root directory.
    #[must_use]
    pub fn resolve(&self, path: &str, lookup: Lookup) -> Option<NodeId> {
        self.lookup(path, lookup).found()
    }

    /// Like [`PakTree::resolve`], but tells a kind mismatch apart from a
    /// missing path.
    #[must_use]
    pub fn lookup(&self, path: &str, lookup: Lookup) -> Resolution {
        if path == "/" {
            return if lookup.accepts(true) {
                Resolution::Found(self.root())
            } else {
                Resolution::WrongKind(self.root())
            };
        }

        let mut mismatch = None;
        let mut stack: Vec<(NodeId, String)> = self.top_level_rev();

        while let Some((id, candidate)) = stack.pop() {
            let node = self.node(id);
            if candidate == path {
                if lookup.accepts(node.is_dir) {
                    return Resolution::Found(id);
                }
                mismatch.get_or_insert(id);
            }

            if node.is_dir {
                let mut children: Vec<_> = self
                    .children(id)
                    .map(|child| (child, format!("{candidate}/{}", self.node(child).name)))
                    .collect();
                children.reverse();
                stack.extend(children);
            }
        }

        mismatch.map_or(Resolution::NotFound, Resolution::WrongKind)
    }

    fn top_level_rev(&self) -> Vec<(NodeId, String)> {
        let mut top: Vec<_> = self
            .children(self.root())
            .map(|id| (id, format!("/{}", self.node(id).name)))
            .collect();
        top.reverse();
        top
    }

    #[must_use]
    pub fn find_file(&self, path: &str) -> Option<NodeId> {
        self.resolve(path, Lookup::File)
    }

    #[must_use]
    pub fn find_dir(&self, path: &str) -> Option<NodeId> {
        self.resolve(path, Lookup::Directory)
    }

    #[must_use]
    pub fn find(&self, path: &str) -> Option<NodeId> {
        self.resolve(path, Lookup::Any)
    }
}
