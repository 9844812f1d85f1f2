//! Defines `Page`, the operation engine of one document. Each call to [`Page::apply`]
//! is a transaction: when an operation fails the page is rolled back to its last
//! commit before the error is returned.

use crate::consts::{CHILDREN_KEY, ID_KEY};
use crate::errors::{Error, Result};
use crate::graph::Graph;
use crate::operation::{Operation, Path};
use crate::ontology::Ontology;
use crate::predicate::JsonMap;
use crate::subject::Subject;
use log::{debug, error, warn};
use oxigraph::model::Triple;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Page {
    graph: Graph,
    // branch paths whose links must be re-derived, keyed by `Path::key`
    dirty_paths: BTreeMap<String, Path>,
}

impl Page {
    pub fn new(id: &str, ontology: Arc<Ontology>) -> Result<Self> {
        Ok(Page::from_graph(Graph::new(id, ontology)?))
    }

    pub fn from_graph(graph: Graph) -> Self {
        Page {
            graph,
            dirty_paths: BTreeMap::new(),
        }
    }

    pub fn from_triples(id: &str, ontology: Arc<Ontology>, triples: &[Triple]) -> Result<Self> {
        Ok(Page::from_graph(Graph::from_triples(id, ontology, triples)?))
    }

    pub fn from_turtle(id: &str, ontology: Arc<Ontology>, turtle: &str) -> Result<Self> {
        Ok(Page::from_graph(Graph::from_turtle(id, ontology, turtle)?))
    }

    /// Builds a page from a nested node representation. The top object is the root and
    /// gives the page its id; every node below it is inserted, nothing is committed.
    pub fn from_representation(rep: &JsonValue, ontology: Arc<Ontology>) -> Result<Self> {
        let rep = rep.as_object().ok_or_else(|| {
            Error::InvalidRepresentation("a page must be a JSON object".to_string())
        })?;
        let id = rep
            .get(ID_KEY)
            .and_then(JsonValue::as_str)
            .ok_or_else(|| Error::InvalidRepresentation("a page without an id".to_string()))?;
        let mut page = Page::new(id, ontology)?;
        page.graph.set_node(id, rep)?;

        let mut children = vec![];
        if let Some(list) = rep.get(CHILDREN_KEY) {
            let list = list.as_array().ok_or_else(|| {
                Error::InvalidRepresentation(format!("the children of {} are not a list", id))
            })?;
            for child in list.iter() {
                let child = child.as_object().ok_or_else(|| {
                    Error::InvalidRepresentation(format!("a child of {} is not an object", id))
                })?;
                children.push(page.graph.insert_node(child)?);
            }
        }
        page.graph.append_children(id, children)?;
        Ok(page)
    }

    pub fn id(&self) -> &str {
        self.graph.id()
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Direct access to the graph. Edits made through it are not transactional.
    pub fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }

    pub fn get_subject(&self, id: &str) -> Result<&Subject> {
        self.graph.get_subject(id)
    }

    /// The id of the node at `path`
    pub fn resolve(&self, path: &Path) -> Result<&str> {
        let mut curr = self.graph.id();
        for offset in path.offsets() {
            curr = self
                .graph
                .children(curr)
                .ok()
                .and_then(|children| children.get(*offset))
                .ok_or_else(|| Error::PathNotFound(path.to_string()))?;
        }
        Ok(curr)
    }

    // the branch holding the node at `path`, and the node's offset in it
    fn resolve_parent(&self, path: &Path) -> Result<(String, usize)> {
        match (path.parent(), path.offset()) {
            (Some(parent), Some(offset)) => {
                let parent_id = self.resolve(&parent)?;
                self.graph.children(parent_id)?;
                Ok((parent_id.to_string(), offset))
            }
            _ => Err(Error::InvalidPath(format!(
                "{} does not address a child node",
                path
            ))),
        }
    }

    fn touch(&mut self, path: Option<Path>) {
        if let Some(path) = path {
            self.dirty_paths.insert(path.key(), path);
        }
    }

    /// Applies one operation. On failure every change since the last commit is
    /// reverted, earlier uncommitted operations included.
    pub fn apply(&mut self, op: &Operation) -> Result<()> {
        debug!("Applying {} at {} to {}", op.name(), op.path(), self.id());
        match self.apply_operation(op) {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!(
                    "Failed to apply {} at {}: {}. Reverting {}",
                    op.name(),
                    op.path(),
                    e,
                    self.id()
                );
                self.dirty_paths.clear();
                if let Err(undo) = self.graph.undo() {
                    error!("Failed to revert {}: {}", self.id(), undo);
                }
                Err(e)
            }
        }
    }

    /// Applies operations in order, stopping at the first failure
    pub fn apply_all(&mut self, ops: &[Operation]) -> Result<()> {
        for op in ops.iter() {
            self.apply(op)?;
        }
        Ok(())
    }

    fn apply_operation(&mut self, op: &Operation) -> Result<()> {
        match op {
            Operation::InsertNode { path, node } => {
                let (parent, offset) = self.resolve_parent(path)?;
                let id = self.graph.insert_node(node)?;
                self.graph.attach_children(&parent, Some(&id), offset)?;
                self.touch(path.parent());
            }
            Operation::RemoveNode { path } => {
                let (parent, offset) = self.resolve_parent(path)?;
                let head = self
                    .graph
                    .detach_children(&parent, offset, 1)?
                    .ok_or_else(|| Error::PathNotFound(path.to_string()))?;
                self.graph.delete_node(&head)?;
                self.touch(path.parent());
            }
            Operation::MoveNode { path, new_path } => {
                self.move_node(path, new_path)?;
            }
            Operation::SplitNode {
                path,
                position,
                properties,
            } => {
                let (parent, offset) = self.resolve_parent(path)?;
                self.graph.split(&parent, offset, *position, properties)?;
                self.touch(path.parent());
                self.touch(Some(path.clone()));
            }
            Operation::MergeNode { path } => {
                let (parent, offset) = self.resolve_parent(path)?;
                if let Some(absorbed) = self.graph.merge(&parent, offset)? {
                    self.graph.detach_children(&parent, offset + 1, 1)?;
                    self.graph.delete_node(&absorbed)?;
                }
                self.touch(path.parent());
                self.touch(Some(path.clone()));
            }
            Operation::SetNode { path, properties } => {
                let id = self.resolve(path)?.to_string();
                self.set_node(&id, properties)?;
            }
            Operation::InsertText { path, offset, text } => {
                let id = self.resolve(path)?.to_string();
                self.graph.insert_text(&id, *offset, text)?;
            }
            Operation::RemoveText { path, offset, text } => {
                let id = self.resolve(path)?.to_string();
                self.graph.remove_text(&id, *offset, text.chars().count())?;
            }
        }
        Ok(())
    }

    // both paths address the tree as it is before the move
    fn move_node(&mut self, path: &Path, new_path: &Path) -> Result<()> {
        let (parent, offset) = self.resolve_parent(path)?;
        let (new_parent, mut new_offset) = self.resolve_parent(new_path)?;
        let node = self.graph.child_at(&parent, offset)?.to_string();
        if parent == new_parent && offset == new_offset {
            return Ok(());
        }

        self.graph.detach_children(&parent, offset, 1)?;
        if self.graph.is_ancestor(&node, &new_parent) {
            self.graph.attach_children(&parent, Some(&node), offset)?;
            return Err(Error::CyclicMove {
                node,
                target: new_parent,
            });
        }
        if parent == new_parent && offset < new_offset {
            new_offset -= 1;
        }
        self.graph
            .attach_children(&new_parent, Some(&node), new_offset)?;
        self.touch(path.parent());
        self.touch(new_path.parent());
        Ok(())
    }

    fn set_node(&mut self, id: &str, properties: &JsonMap) -> Result<()> {
        if let Some(new_id) = properties.get(ID_KEY).and_then(JsonValue::as_str) {
            if self.graph.node_id(new_id)? != id {
                return Err(Error::InvalidRepresentation(format!(
                    "set_node cannot rename {} to {}",
                    id, new_id
                )));
            }
        }
        self.graph.set_node(id, properties)
    }

    /// Re-derives `firstChild`/`next` for every branch touched since the last sync
    pub fn update(&mut self) -> Result<()> {
        let paths = std::mem::take(&mut self.dirty_paths);
        for path in paths.values() {
            let id = match self.resolve(path) {
                Ok(id) => id.to_string(),
                Err(_) => continue,
            };
            if self.graph.get_subject(&id)?.node().children().is_some() {
                self.graph.relink(&id)?;
            }
        }
        Ok(())
    }

    /// The pending changes as one update statement, after syncing links
    pub fn update_statement(&mut self) -> Result<String> {
        self.update()?;
        Ok(self.graph.update_statement())
    }

    pub fn commit(&mut self) -> Result<()> {
        self.update()?;
        self.graph.commit()
    }

    pub fn undo(&mut self) -> Result<()> {
        self.dirty_paths.clear();
        self.graph.undo()
    }

    /// The whole page as nested JSON
    pub fn to_representation(&self) -> Result<JsonValue> {
        self.graph.to_representation(self.graph.id())
    }
}
