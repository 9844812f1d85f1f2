//! Defines the edits a page accepts. An operation addresses a node by its path from the
//! root: the child offset at each level, so `[]` is the root and `[0, 2]` is the third
//! child of the first child.

use crate::predicate::JsonMap;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct Path(Vec<usize>);

impl Path {
    pub fn new(offsets: Vec<usize>) -> Self {
        Path(offsets)
    }

    pub fn root() -> Self {
        Path(vec![])
    }

    pub fn offsets(&self) -> &[usize] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// The path of the parent, `None` for the root
    pub fn parent(&self) -> Option<Path> {
        self.0
            .split_last()
            .map(|(_, parent)| Path(parent.to_vec()))
    }

    /// The offset of the node among its siblings, `None` for the root
    pub fn offset(&self) -> Option<usize> {
        self.0.last().copied()
    }

    pub fn child(&self, offset: usize) -> Path {
        let mut offsets = self.0.clone();
        offsets.push(offset);
        Path(offsets)
    }

    /// Stable key used to deduplicate paths, `0/2` for `[0, 2]`
    pub fn key(&self) -> String {
        self.0
            .iter()
            .map(|o| o.to_string())
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl From<Vec<usize>> for Path {
    fn from(offsets: Vec<usize>) -> Self {
        Path(offsets)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}]", self.key().replace('/', ", "))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
    /// Inserts a node representation, children included, at `path`
    InsertNode { path: Path, node: JsonMap },
    RemoveNode {
        path: Path,
    },
    /// `new_path` addresses the destination in the tree before the move
    MoveNode {
        path: Path,
        #[serde(alias = "newPath")]
        new_path: Path,
    },
    SplitNode {
        path: Path,
        position: usize,
        #[serde(default)]
        properties: JsonMap,
    },
    /// Merges the node at `path` with its next sibling
    MergeNode {
        path: Path,
    },
    SetNode {
        path: Path,
        #[serde(alias = "newProperties")]
        properties: JsonMap,
    },
    InsertText {
        path: Path,
        offset: usize,
        text: String,
    },
    /// Removes as many characters as `text` holds
    RemoveText {
        path: Path,
        offset: usize,
        text: String,
    },
}

impl Operation {
    pub fn path(&self) -> &Path {
        match self {
            Operation::InsertNode { path, .. }
            | Operation::RemoveNode { path }
            | Operation::MoveNode { path, .. }
            | Operation::SplitNode { path, .. }
            | Operation::MergeNode { path }
            | Operation::SetNode { path, .. }
            | Operation::InsertText { path, .. }
            | Operation::RemoveText { path, .. } => path,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operation::InsertNode { .. } => "insert_node",
            Operation::RemoveNode { .. } => "remove_node",
            Operation::MoveNode { .. } => "move_node",
            Operation::SplitNode { .. } => "split_node",
            Operation::MergeNode { .. } => "merge_node",
            Operation::SetNode { .. } => "set_node",
            Operation::InsertText { .. } => "insert_text",
            Operation::RemoveText { .. } => "remove_text",
        }
    }
}
