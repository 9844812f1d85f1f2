//! Defines the tree shape of a page. Every subject is a node of one of three classes;
//! roots and branches own an ordered list of child ids, leaves own text.
//!
//! The children list is the source of order. The `firstChild`/`next` properties are
//! derived from it by [`Graph::relink`] and read back into it by
//! [`Graph::rebuild_children`] when a page is loaded or rolled back.

use crate::consts::{CHILDREN_KEY, FIRST_CHILD, ID_KEY, NEXT, TEXT, TYPE};
use crate::errors::{Error, Result};
use crate::graph::Graph;
use crate::predicate::{JsonMap, Value};
use log::{debug, warn};
use oxigraph::model::NamedNodeRef;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashSet;
use std::fmt;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum NodeClass {
    Root,
    Branch,
    Leaf,
}

impl fmt::Display for NodeClass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            NodeClass::Root => write!(f, "root"),
            NodeClass::Branch => write!(f, "branch"),
            NodeClass::Leaf => write!(f, "leaf"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Root { children: Vec<String> },
    Branch { children: Vec<String> },
    Leaf,
}

impl NodeKind {
    pub fn new(class: NodeClass) -> Self {
        match class {
            NodeClass::Root => NodeKind::Root { children: vec![] },
            NodeClass::Branch => NodeKind::Branch { children: vec![] },
            NodeClass::Leaf => NodeKind::Leaf,
        }
    }

    pub fn class(&self) -> NodeClass {
        match self {
            NodeKind::Root { .. } => NodeClass::Root,
            NodeKind::Branch { .. } => NodeClass::Branch,
            NodeKind::Leaf => NodeClass::Leaf,
        }
    }

    /// The ordered child ids, or `None` for a leaf
    pub fn children(&self) -> Option<&[String]> {
        match self {
            NodeKind::Root { children } | NodeKind::Branch { children } => Some(children),
            NodeKind::Leaf => None,
        }
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut Vec<String>> {
        match self {
            NodeKind::Root { children } | NodeKind::Branch { children } => Some(children),
            NodeKind::Leaf => None,
        }
    }
}

// byte index of the `chars`-th character, clamped to the end of the string
fn byte_offset(s: &str, chars: usize) -> usize {
    s.char_indices().nth(chars).map(|(i, _)| i).unwrap_or(s.len())
}

impl Graph {
    pub fn children(&self, id: &str) -> Result<&[String]> {
        self.get_subject(id)?
            .node()
            .children()
            .ok_or_else(|| Error::NodeKind {
                id: id.to_string(),
                expected: NodeClass::Branch,
            })
    }

    pub fn child_at(&self, parent: &str, offset: usize) -> Result<&str> {
        self.children(parent)?
            .get(offset)
            .map(String::as_str)
            .ok_or_else(|| Error::ChildNotFound {
                parent: parent.to_string(),
                offset,
            })
    }

    fn children_mut(&mut self, id: &str) -> Result<&mut Vec<String>> {
        self.subject_mut(id)?
            .node_mut()
            .children_mut()
            .ok_or_else(|| Error::NodeKind {
                id: id.to_string(),
                expected: NodeClass::Branch,
            })
    }

    // writes one structural property, touching the subject only when the value changes
    fn link(&mut self, id: &str, predicate: NamedNodeRef, target: Option<&str>) -> Result<()> {
        let pred = self.ontology().required(predicate)?.clone();
        let value = Value::named_node(target.unwrap_or(""));
        let subject = self.subject_mut(id)?;
        if subject.get_property(&pred) == &value {
            return Ok(());
        }
        subject.set_property(&pred, value)?;
        self.mark_dirty(id);
        Ok(())
    }

    /// Derives `firstChild` of the branch and `next` of each child from the children list
    pub fn relink(&mut self, branch: &str) -> Result<()> {
        let children = self.children(branch)?.to_vec();
        self.link(branch, FIRST_CHILD, children.first().map(String::as_str))?;
        for (i, child) in children.iter().enumerate() {
            self.link(child, NEXT, children.get(i + 1).map(String::as_str))?;
        }
        Ok(())
    }

    /// Reads every children list back from the `firstChild`/`next` chains. A chain that
    /// loops or points at a missing subject is cut at that point.
    pub(crate) fn rebuild_children(&mut self) {
        let branches: Vec<String> = self
            .subjects()
            .filter(|s| s.node().children().is_some())
            .map(|s| s.id().to_string())
            .collect();
        for id in branches {
            let mut children: Vec<String> = vec![];
            {
                let mut seen = HashSet::new();
                let mut curr = self.get_subject(&id).ok().and_then(|s| s.first_child());
                while let Some(child) = curr {
                    let subject = match self.get_subject(child) {
                        Ok(subject) => subject,
                        Err(_) => {
                            warn!("Broken sibling chain under {}: {} is missing", id, child);
                            break;
                        }
                    };
                    if !seen.insert(child) {
                        warn!("Cyclic sibling chain under {} at {}", id, child);
                        break;
                    }
                    children.push(child.to_string());
                    curr = subject.next();
                }
            }
            if let Ok(list) = self.children_mut(&id) {
                *list = children;
            }
        }
    }

    // the run starting at `head` and following `next`
    fn sibling_run(&self, head: &str) -> Result<Vec<String>> {
        let mut run = vec![];
        let mut seen = HashSet::new();
        let mut curr = Some(head);
        while let Some(id) = curr {
            let subject = self.get_subject(id)?;
            if subject.is_deleted() {
                return Err(Error::InvalidState(format!(
                    "cannot attach the deleted subject {}",
                    id
                )));
            }
            if subject.is_root() {
                return Err(Error::RootSibling(id.to_string()));
            }
            if !seen.insert(id) {
                return Err(Error::InvalidState(format!("cyclic sibling chain at {}", id)));
            }
            run.push(id.to_string());
            curr = subject.next();
        }
        Ok(run)
    }

    /// Inserts `head` and its `next` successors as one run at `offset` of the branch.
    /// The offset is clamped to the number of children.
    pub fn attach_children(
        &mut self,
        branch: &str,
        head: Option<&str>,
        offset: usize,
    ) -> Result<()> {
        let head = head.ok_or(Error::NullChild)?;
        let run = self.sibling_run(head)?;
        self.children(branch)?;
        for id in run.iter() {
            if let Some(parent) = self.parent_of(id) {
                return Err(Error::InvalidState(format!(
                    "{} is already a child of {}",
                    id, parent
                )));
            }
        }
        for id in run.iter() {
            if self.is_ancestor(id, branch) {
                return Err(Error::CyclicMove {
                    node: id.clone(),
                    target: branch.to_string(),
                });
            }
        }

        debug!("Attaching {} node(s) to {} at {}", run.len(), branch, offset);
        let children = self.children_mut(branch)?;
        let offset = offset.min(children.len());
        children.splice(offset..offset, run);
        self.relink(branch)
    }

    // appends freshly created, unlinked nodes in one pass
    pub(crate) fn append_children(&mut self, branch: &str, ids: Vec<String>) -> Result<()> {
        self.children_mut(branch)?.extend(ids);
        self.relink(branch)
    }

    /// Removes `length` children starting at `offset` and returns the head of the
    /// removed run, which stays chained through `next` with its last `next` cleared.
    pub fn detach_children(
        &mut self,
        branch: &str,
        offset: usize,
        length: usize,
    ) -> Result<Option<String>> {
        if length == 0 {
            return Err(Error::InvalidRange { offset, length });
        }
        let children = self.children_mut(branch)?;
        let start = offset.min(children.len());
        let end = start.saturating_add(length).min(children.len());
        if start == end {
            return Ok(None);
        }
        let run: Vec<String> = children.drain(start..end).collect();
        debug!("Detached {} node(s) from {} at {}", run.len(), branch, start);
        self.relink(branch)?;
        for (i, id) in run.iter().enumerate() {
            self.link(id, NEXT, run.get(i + 1).map(String::as_str))?;
        }
        Ok(run.into_iter().next())
    }

    /// The live branch holding `id` among its children
    pub fn parent_of(&self, id: &str) -> Option<&str> {
        self.subjects()
            .filter(|s| !s.is_deleted())
            .find(|s| s.node().children().is_some_and(|c| c.iter().any(|c| c == id)))
            .map(|s| s.id())
    }

    /// True when `target` is `node` itself or one of its descendants
    pub fn is_ancestor(&self, node: &str, target: &str) -> bool {
        if node == target {
            return true;
        }
        match self.get_subject(node).ok().and_then(|s| s.node().children()) {
            Some(children) => children.iter().any(|c| self.is_ancestor(c, target)),
            None => false,
        }
    }

    /// Splits the child at `index` of `parent` at `position` (a child offset for
    /// branches, a character offset for leaves). The new sibling is a copy of the
    /// node's representation with `overrides` applied and is attached right after
    /// it. Returns the new sibling's id.
    pub fn split(
        &mut self,
        parent: &str,
        index: usize,
        position: usize,
        overrides: &JsonMap,
    ) -> Result<String> {
        let id = self.child_at(parent, index)?.to_string();
        let subject = self.get_subject(&id)?;
        let class = subject.class();
        let mut rep = subject.representation();
        for (key, value) in overrides.iter() {
            rep.insert(key.clone(), value.clone());
        }

        let new_id = self.node_id(
            rep.get(ID_KEY)
                .and_then(JsonValue::as_str)
                .unwrap_or_default(),
        )?;
        rep.insert(ID_KEY.to_string(), JsonValue::String(new_id.clone()));
        if self.contains(&new_id) {
            return Err(Error::DuplicateSubject(new_id));
        }
        let type_alias = self.ontology().required(TYPE)?.alias().to_string();
        let node_type = rep
            .get(&type_alias)
            .and_then(JsonValue::as_str)
            .unwrap_or_default();
        if self.class_of(node_type)? != class {
            return Err(Error::NodeKind {
                id: new_id,
                expected: class,
            });
        }

        debug!("Splitting {} at {} into {}", id, position, new_id);
        match class {
            NodeClass::Leaf => {
                let current = self.leaf_text(&id)?;
                let tail = current[byte_offset(current, position)..].to_string();
                let text_alias = self.ontology().required(TEXT)?.alias().to_string();
                rep.insert(text_alias, JsonValue::String(tail));
                self.insert_sibling(&new_id, &rep)?;
                self.attach_children(parent, Some(&new_id), index + 1)?;
                self.remove_text(&id, position, usize::MAX)?;
            }
            NodeClass::Branch => {
                rep.remove(CHILDREN_KEY);
                self.insert_sibling(&new_id, &rep)?;
                let tail = self.detach_children(&id, position, usize::MAX)?;
                self.attach_children(parent, Some(&new_id), index + 1)?;
                if let Some(head) = tail {
                    self.attach_children(&new_id, Some(&head), 0)?;
                }
            }
            NodeClass::Root => {
                return Err(Error::NodeKind {
                    id,
                    expected: NodeClass::Branch,
                })
            }
        }
        Ok(new_id)
    }

    // the copy made by a split; a half-created copy is dropped again
    fn insert_sibling(&mut self, new_id: &str, rep: &JsonMap) -> Result<()> {
        if let Err(e) = self.insert_node(rep) {
            if self.contains(new_id) {
                self.delete_node(new_id)?;
            }
            return Err(e);
        }
        Ok(())
    }

    /// Moves the content of the sibling following the child at `index` of `parent` into
    /// that child: children for branches, text for leaves. Returns the emptied sibling,
    /// which the caller detaches and deletes, or `None` when there is no next sibling.
    pub fn merge(&mut self, parent: &str, index: usize) -> Result<Option<String>> {
        let id = self.child_at(parent, index)?.to_string();
        let next = match self.children(parent)?.get(index + 1) {
            Some(next) => next.clone(),
            None => return Ok(None),
        };
        let class = self.get_subject(&id)?.class();
        if self.get_subject(&next)?.class() != class {
            return Err(Error::NodeKind {
                id: next,
                expected: class,
            });
        }

        debug!("Merging {} into {}", next, id);
        match class {
            NodeClass::Leaf => {
                let text = self
                    .get_subject(&next)?
                    .text()
                    .unwrap_or_default()
                    .to_string();
                self.insert_text(&id, usize::MAX, &text)?;
            }
            _ => {
                if let Some(head) = self.detach_children(&next, 0, usize::MAX)? {
                    self.attach_children(&id, Some(&head), usize::MAX)?;
                }
            }
        }
        Ok(Some(next))
    }

    fn leaf_text(&self, leaf: &str) -> Result<&str> {
        self.get_subject(leaf)?.text().ok_or_else(|| Error::NodeKind {
            id: leaf.to_string(),
            expected: NodeClass::Leaf,
        })
    }

    fn set_text(&mut self, leaf: &str, text: String) -> Result<()> {
        let pred = self.ontology().required(TEXT)?.clone();
        self.subject_mut(leaf)?.set_property(&pred, Value::text(text))?;
        self.mark_dirty(leaf);
        Ok(())
    }

    /// Inserts `text` at a character offset of the leaf, clamped to its length
    pub fn insert_text(&mut self, leaf: &str, offset: usize, text: &str) -> Result<()> {
        let current = self.leaf_text(leaf)?;
        let at = byte_offset(current, offset);
        let mut updated = String::with_capacity(current.len() + text.len());
        updated.push_str(&current[..at]);
        updated.push_str(text);
        updated.push_str(&current[at..]);
        self.set_text(leaf, updated)
    }

    /// Removes up to `length` characters at `offset` and returns the removed slice
    pub fn remove_text(&mut self, leaf: &str, offset: usize, length: usize) -> Result<String> {
        let current = self.leaf_text(leaf)?;
        let start = byte_offset(current, offset);
        let end = start + byte_offset(&current[start..], length);
        let removed = current[start..end].to_string();
        if removed.is_empty() {
            return Ok(removed);
        }
        let updated = format!("{}{}", &current[..start], &current[end..]);
        self.set_text(leaf, updated)?;
        Ok(removed)
    }

    /// Creates the subjects of a node representation and its `children`, and returns
    /// the id of the top node. The top node is left detached.
    pub fn insert_node(&mut self, rep: &JsonMap) -> Result<String> {
        let id = rep
            .get(ID_KEY)
            .and_then(JsonValue::as_str)
            .ok_or_else(|| Error::InvalidRepresentation("a node without an id".to_string()))?;
        let id = self.node_id(id)?;
        let id = id.as_str();
        let type_alias = self.ontology().required(TYPE)?.alias().to_string();
        let node_type = rep
            .get(&type_alias)
            .and_then(JsonValue::as_str)
            .ok_or_else(|| Error::InvalidRepresentation(format!("the node {} has no type", id)))?;
        self.create_subject(id, node_type)?
            .apply_representation(rep, false)?;

        let children = match rep.get(CHILDREN_KEY) {
            None | Some(JsonValue::Null) => return Ok(id.to_string()),
            Some(JsonValue::Array(children)) => children,
            Some(_) => {
                return Err(Error::InvalidRepresentation(format!(
                    "the children of {} are not a list",
                    id
                )))
            }
        };
        if self.get_subject(id)?.class() == NodeClass::Leaf {
            return Err(Error::NodeKind {
                id: id.to_string(),
                expected: NodeClass::Branch,
            });
        }
        let mut ids = Vec::with_capacity(children.len());
        for child in children.iter() {
            let child = child.as_object().ok_or_else(|| {
                Error::InvalidRepresentation(format!("a child of {} is not an object", id))
            })?;
            ids.push(self.insert_node(child)?);
        }
        self.append_children(id, ids)?;
        Ok(id.to_string())
    }

    /// Marks a node and its whole subtree deleted
    pub fn delete_node(&mut self, id: &str) -> Result<()> {
        let children = self
            .get_subject(id)?
            .node()
            .children()
            .map(<[String]>::to_vec)
            .unwrap_or_default();
        self.delete_subject(id)?;
        for child in children.iter() {
            self.delete_node(child)?;
        }
        Ok(())
    }

    /// Overwrites non-structural properties of a node, merging unknown keys into its
    /// options. The type may change only within the same node class.
    pub fn set_node(&mut self, id: &str, properties: &JsonMap) -> Result<()> {
        let type_alias = self.ontology().required(TYPE)?.alias().to_string();
        if let Some(value) = properties.get(&type_alias) {
            let node_type = value.as_str().ok_or_else(|| Error::MalformedValue {
                predicate: TYPE.as_str().to_string(),
                reason: format!("expected a node type, found {}", value),
            })?;
            let class = self.get_subject(id)?.class();
            if self.class_of(node_type)? != class {
                return Err(Error::NodeKind {
                    id: id.to_string(),
                    expected: class,
                });
            }
        }
        self.subject_mut(id)?;
        self.mark_dirty(id);
        self.subject_mut(id)?.apply_representation(properties, true)
    }

    /// The node and its descendants as nested JSON
    pub fn to_representation(&self, id: &str) -> Result<JsonValue> {
        let subject = self.get_subject(id)?;
        let mut rep = subject.representation();
        if let Some(children) = subject.node().children() {
            let children = children
                .iter()
                .map(|child| self.to_representation(child))
                .collect::<Result<Vec<_>>>()?;
            rep.insert(CHILDREN_KEY.to_string(), JsonValue::Array(children));
        }
        Ok(JsonValue::Object(rep))
    }
}
