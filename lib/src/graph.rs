//! Defines `Graph`, the document graph of one page: every subject of the page keyed by
//! id, plus the subjects touched since the last commit or undo in the order they were
//! first touched.

use crate::consts::{ROOT, TYPE};
use crate::errors::{Error, Result};
use crate::node::{NodeClass, NodeKind};
use crate::ontology::Ontology;
use crate::predicate::Value;
use crate::subject::Subject;
use crate::util;
use log::{debug, info, warn};
use oxigraph::model::{NamedNode, NamedNodeRef, NamedOrBlankNode, Term, Triple, TripleRef};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Graph {
    id: String,
    ontology: Arc<Ontology>,
    subjects: HashMap<String, Subject>,
    dirty: Vec<String>,
    dirty_set: HashSet<String>,
}

impl Graph {
    /// Creates a graph holding only its root. The root's type is hydrated from the
    /// implicit `<id> a sdoc:Root` triple, so it never shows up in a diff.
    pub fn new(id: &str, ontology: Arc<Ontology>) -> Result<Self> {
        let root_id = NamedNode::new(id)
            .map_err(|e| Error::InvalidRepresentation(format!("invalid page id {}: {}", id, e)))?;
        let mut root = Subject::new(
            id,
            id,
            NodeKind::new(NodeClass::Root),
            ontology.predicates_for(NodeClass::Root),
        );
        root.from_triple(TripleRef::new(root_id.as_ref(), TYPE, ROOT))?;

        let mut subjects = HashMap::new();
        subjects.insert(id.to_string(), root);
        Ok(Graph {
            id: id.to_string(),
            ontology,
            subjects,
            dirty: vec![],
            dirty_set: HashSet::new(),
        })
    }

    /// Hydrates a graph from the triples of its page. Subjects are created from type
    /// triples naming a known non-root type, the first such triple winning; every other
    /// triple hydrates the subject it is about, and triples about unknown subjects are
    /// dropped.
    pub fn from_triples(id: &str, ontology: Arc<Ontology>, triples: &[Triple]) -> Result<Self> {
        let mut graph = Graph::new(id, ontology)?;

        for triple in triples.iter().filter(|t| t.predicate.as_ref() == TYPE) {
            let subject = match &triple.subject {
                NamedOrBlankNode::NamedNode(n) => n.as_str(),
                _ => {
                    debug!("Skipping type of blank node {}", triple.subject);
                    continue;
                }
            };
            if graph.subjects.contains_key(subject) {
                if subject != id {
                    debug!("Ignoring additional type of {}: {}", subject, triple.object);
                }
                continue;
            }
            let class = match &triple.object {
                Term::NamedNode(t) => graph.ontology.node_class(t.as_str()),
                _ => None,
            };
            let class = match class {
                Some(NodeClass::Root) => {
                    warn!("Ignoring the root type on {}", subject);
                    continue;
                }
                Some(class) => class,
                None => {
                    debug!("Skipping {} of unknown type {}", subject, triple.object);
                    continue;
                }
            };
            let mut node = Subject::new(
                subject,
                id,
                NodeKind::new(class),
                graph.ontology.predicates_for(class),
            );
            node.from_triple(triple.as_ref())?;
            graph.subjects.insert(subject.to_string(), node);
        }

        let mut ignored = 0;
        for triple in triples.iter().filter(|t| t.predicate.as_ref() != TYPE) {
            let subject = match &triple.subject {
                NamedOrBlankNode::NamedNode(n) => graph.subjects.get_mut(n.as_str()),
                _ => None,
            };
            match subject {
                Some(subject) => subject.from_triple(triple.as_ref())?,
                None => ignored += 1,
            }
        }
        if ignored > 0 {
            debug!("Ignored {} triples about unknown subjects of {}", ignored, id);
        }

        graph.rebuild_children();
        info!("Loaded {} with {} subjects", id, graph.subjects.len());
        Ok(graph)
    }

    pub fn from_turtle(id: &str, ontology: Arc<Ontology>, turtle: &str) -> Result<Self> {
        let triples = util::parse_turtle(turtle, Some(id))?;
        Graph::from_triples(id, ontology, &triples)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn ontology(&self) -> &Arc<Ontology> {
        &self.ontology
    }

    pub fn root(&self) -> Result<&Subject> {
        self.get_subject(&self.id)
    }

    /// Every subject, deleted ones included
    pub fn subjects(&self) -> impl Iterator<Item = &Subject> {
        self.subjects.values()
    }

    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }

    /// True when a live subject with this id exists
    pub fn contains(&self, id: &str) -> bool {
        self.subjects.get(id).map(|s| !s.is_deleted()).unwrap_or(false)
    }

    pub(crate) fn class_of(&self, node_type: &str) -> Result<NodeClass> {
        self.ontology
            .node_class(node_type)
            .ok_or_else(|| Error::UnknownType(node_type.to_string()))
    }

    /// Resolves a node id from a representation. Absolute IRIs are kept, anything else
    /// names a fragment of the page, i.e. `x` becomes `<page>#x`.
    pub fn node_id(&self, id: &str) -> Result<String> {
        if id.is_empty() {
            return Err(Error::InvalidRepresentation("a node without an id".to_string()));
        }
        if NamedNodeRef::new(id).is_ok() {
            return Ok(id.to_string());
        }
        let resolved = format!("{}#{}", self.id, id);
        NamedNodeRef::new(&resolved)
            .map_err(|e| Error::InvalidRepresentation(format!("invalid node id {}: {}", id, e)))?;
        Ok(resolved)
    }

    /// Creates the subject `id` of type `node_type`. A deleted subject with the same id
    /// is brought back with an empty working set instead, so the diff against what the
    /// store holds stays minimal.
    pub fn create_subject(&mut self, id: &str, node_type: &str) -> Result<&mut Subject> {
        if self.contains(id) {
            return Err(Error::DuplicateSubject(id.to_string()));
        }
        let class = self.class_of(node_type)?;
        if class == NodeClass::Root {
            return Err(Error::InvalidRepresentation(format!(
                "{} cannot be a second root of {}",
                id, self.id
            )));
        }
        NamedNodeRef::new(id)
            .map_err(|e| Error::InvalidRepresentation(format!("invalid node id {}: {}", id, e)))?;

        let predicates = self.ontology.predicates_for(class);
        match self.subjects.get_mut(id) {
            Some(existing) => {
                debug!("Reinserting deleted subject {}", id);
                existing.reset(NodeKind::new(class), predicates);
            }
            None => {
                let mut subject = Subject::new(id, &self.id, NodeKind::new(class), predicates);
                subject.mark_inserted();
                self.subjects.insert(id.to_string(), subject);
            }
        }
        self.mark_dirty(id);

        let type_pred = self.ontology.required(TYPE)?.clone();
        let subject = self.subject_mut(id)?;
        subject.set_property(&type_pred, Value::named_node(node_type))?;
        Ok(subject)
    }

    /// Returns the subject, deleted or not
    pub fn get_subject(&self, id: &str) -> Result<&Subject> {
        self.subjects
            .get(id)
            .ok_or_else(|| Error::SubjectNotFound(id.to_string()))
    }

    pub(crate) fn subject_mut(&mut self, id: &str) -> Result<&mut Subject> {
        self.subjects
            .get_mut(id)
            .ok_or_else(|| Error::SubjectNotFound(id.to_string()))
    }

    pub fn delete_subject(&mut self, id: &str) -> Result<()> {
        self.subject_mut(id)?.delete()?;
        self.mark_dirty(id);
        Ok(())
    }

    pub fn undelete_subject(&mut self, id: &str) -> Result<()> {
        self.subject_mut(id)?.undelete();
        self.mark_dirty(id);
        Ok(())
    }

    /// Reads a property by predicate IRI or alias
    pub fn get_value(&self, subject: &str, predicate: &str) -> Result<Value> {
        self.get_subject(subject)?.property(predicate).cloned()
    }

    /// Writes a property by predicate IRI or alias
    pub fn set_value(&mut self, subject: &str, predicate: &str, value: Value) -> Result<()> {
        self.subject_mut(subject)?.set(predicate, value)?;
        self.mark_dirty(subject);
        Ok(())
    }

    pub(crate) fn mark_dirty(&mut self, id: &str) {
        if self.dirty_set.insert(id.to_string()) {
            self.dirty.push(id.to_string());
        }
    }

    /// Subjects touched since the last commit or undo, in the order first touched
    pub fn dirty_subjects(&self) -> &[String] {
        &self.dirty
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    pub fn update_statement(&self) -> String {
        self.dirty
            .iter()
            .filter_map(|id| self.subjects.get(id))
            .map(Subject::update_statement)
            .collect()
    }

    /// Makes the working state the new baseline and drops deleted subjects
    pub fn commit(&mut self) -> Result<()> {
        let dirty = std::mem::take(&mut self.dirty);
        self.dirty_set.clear();
        let mut removed = 0;
        for id in dirty.iter() {
            let deleted = match self.subjects.get(id) {
                Some(subject) => subject.is_deleted(),
                None => continue,
            };
            if deleted {
                self.subjects.remove(id);
                removed += 1;
            } else {
                self.subject_mut(id)?.commit()?;
            }
        }
        info!(
            "Committed {}: {} subjects updated, {} removed",
            self.id,
            dirty.len() - removed,
            removed
        );
        Ok(())
    }

    /// Returns to the last committed state: subjects created since are dropped and
    /// every other touched subject gets its baseline back.
    pub fn undo(&mut self) -> Result<()> {
        let dirty = std::mem::take(&mut self.dirty);
        self.dirty_set.clear();
        let mut dropped = 0;
        for id in dirty.iter() {
            let inserted = match self.subjects.get(id) {
                Some(subject) => subject.is_inserted(),
                None => continue,
            };
            if inserted {
                self.subjects.remove(id);
                dropped += 1;
            } else {
                self.subject_mut(id)?.undo()?;
            }
        }
        self.rebuild_children();
        info!(
            "Reverted {}: {} subjects restored, {} dropped",
            self.id,
            dirty.len() - dropped,
            dropped
        );
        Ok(())
    }
}
