//! Defines `Subject`, one node of a page graph. A subject keeps two sets of property
//! values: the baseline (what the store last persisted) and the working set (what the
//! page currently says). The difference between the two is what gets written back.

use crate::consts::{CHILDREN_KEY, FIRST_CHILD, ID_KEY, NEXT, OPTIONS, STRUCTURAL_PREDICATES, TEXT, TYPE};
use crate::errors::{Error, Result};
use crate::node::{NodeClass, NodeKind};
use crate::predicate::{JsonMap, Predicate, Value};
use oxigraph::model::{NamedNodeRef, NamedOrBlankNodeRef, TripleRef};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Subject {
    id: String,
    graph: String,
    node: NodeKind,
    // recognized predicates, in ontology table order
    predicates: Vec<Arc<Predicate>>,
    working: HashMap<String, Value>,
    baseline: HashMap<String, Value>,
    deleted: bool,
    inserted: bool,
    // class and predicates as of the last commit, while reinserted as another class
    restore: Option<(NodeClass, Vec<Arc<Predicate>>)>,
}

impl Subject {
    pub fn new(id: &str, graph: &str, node: NodeKind, predicates: Vec<Arc<Predicate>>) -> Self {
        Subject {
            id: id.to_string(),
            graph: graph.to_string(),
            node,
            predicates,
            working: HashMap::new(),
            baseline: HashMap::new(),
            deleted: false,
            inserted: false,
            restore: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn graph(&self) -> &str {
        &self.graph
    }

    pub fn node(&self) -> &NodeKind {
        &self.node
    }

    pub(crate) fn node_mut(&mut self) -> &mut NodeKind {
        &mut self.node
    }

    pub fn class(&self) -> NodeClass {
        self.node.class()
    }

    pub fn is_root(&self) -> bool {
        self.id == self.graph
    }

    pub fn predicates(&self) -> &[Arc<Predicate>] {
        &self.predicates
    }

    /// Finds a recognized predicate by IRI or alias
    pub fn predicate(&self, key: &str) -> Option<&Arc<Predicate>> {
        self.predicates
            .iter()
            .find(|p| p.id() == key)
            .or_else(|| self.predicates.iter().find(|p| p.alias() == key))
    }

    pub fn recognizes(&self, predicate: &str) -> bool {
        self.predicates.iter().any(|p| p.id() == predicate)
    }

    fn predicate_or_err(&self, key: &str) -> Result<Arc<Predicate>> {
        self.predicate(key)
            .cloned()
            .ok_or_else(|| Error::UnknownPredicate {
                subject: self.id.clone(),
                predicate: key.to_string(),
            })
    }

    pub fn get_property<'a>(&'a self, pred: &'a Predicate) -> &'a Value {
        self.working.get(pred.id()).unwrap_or(pred.default_value())
    }

    /// Writes a working value. Writing the default removes the entry, so an unset
    /// property and a property set to its default cannot be told apart.
    pub fn set_property(&mut self, pred: &Predicate, value: Value) -> Result<()> {
        if self.deleted {
            return Err(Error::InvalidState(format!(
                "cannot set {} on the deleted subject {}",
                pred.alias(),
                self.id
            )));
        }
        if !self.recognizes(pred.id()) {
            return Err(Error::UnknownPredicate {
                subject: self.id.clone(),
                predicate: pred.id().to_string(),
            });
        }
        pred.check(&value)?;
        if self.is_root() && pred.id() == NEXT.as_str() && !pred.is_default(&value) {
            return Err(Error::RootSibling(self.id.clone()));
        }
        if pred.is_default(&value) {
            self.working.remove(pred.id());
        } else {
            self.working.insert(pred.id().to_string(), value);
        }
        Ok(())
    }

    /// Reads a property by IRI or alias
    pub fn property(&self, key: &str) -> Result<&Value> {
        let pred = self.predicate(key).ok_or_else(|| Error::UnknownPredicate {
            subject: self.id.clone(),
            predicate: key.to_string(),
        })?;
        Ok(self.get_property(pred))
    }

    /// Writes a property by IRI or alias
    pub fn set(&mut self, key: &str, value: Value) -> Result<()> {
        let pred = self.predicate_or_err(key)?;
        self.set_property(&pred, value)
    }

    /// True when the working set holds a value for the predicate, i.e. it is not the default
    pub fn has_working_value(&self, predicate: &str) -> bool {
        self.working.contains_key(predicate)
    }

    fn named(&self, iri: NamedNodeRef) -> Option<&str> {
        self.working
            .get(iri.as_str())
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
    }

    pub fn node_type(&self) -> Option<&str> {
        self.named(TYPE)
    }

    pub fn next(&self) -> Option<&str> {
        self.named(NEXT)
    }

    pub fn first_child(&self) -> Option<&str> {
        self.named(FIRST_CHILD)
    }

    pub fn text(&self) -> Option<&str> {
        if self.class() != NodeClass::Leaf {
            return None;
        }
        let pred = self.predicate(TEXT.as_str())?;
        self.get_property(pred).as_str()
    }

    /// Hydrates one property from the store. The value becomes both baseline and
    /// working value; triples with unrecognized predicates are ignored.
    pub fn from_triple(&mut self, triple: TripleRef) -> Result<()> {
        match triple.subject {
            NamedOrBlankNodeRef::NamedNode(n) if n.as_str() == self.id => {}
            other => {
                return Err(Error::InvalidState(format!(
                    "triple about {} given to subject {}",
                    other, self.id
                )))
            }
        }
        if self.is_root() && triple.predicate == NEXT {
            return Err(Error::RootSibling(self.id.clone()));
        }
        let pred = match self.predicates.iter().find(|p| p.id() == triple.predicate.as_str()) {
            Some(pred) => pred.clone(),
            None => return Ok(()),
        };
        let value = pred.from_term(triple.object)?;
        self.baseline.insert(pred.id().to_string(), value.clone());
        if pred.is_default(&value) {
            self.working.remove(pred.id());
        } else {
            self.working.insert(pred.id().to_string(), value);
        }
        Ok(())
    }

    pub fn delete(&mut self) -> Result<()> {
        if self.is_root() {
            return Err(Error::ImmutableRoot(self.id.clone()));
        }
        self.deleted = true;
        Ok(())
    }

    pub fn undelete(&mut self) {
        self.deleted = false;
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub fn is_inserted(&self) -> bool {
        self.inserted
    }

    pub(crate) fn mark_inserted(&mut self) {
        self.inserted = true;
    }

    /// Prepares a deleted subject to be inserted again under the same id: the working
    /// set starts empty, the baseline is kept so the diff stays minimal.
    pub(crate) fn reset(&mut self, node: NodeKind, predicates: Vec<Arc<Predicate>>) {
        if self.restore.is_none() && node.class() != self.class() {
            self.restore = Some((self.class(), self.predicates.clone()));
        }
        self.node = node;
        self.predicates = predicates;
        self.working.clear();
        self.deleted = false;
    }

    pub fn commit(&mut self) -> Result<()> {
        if self.deleted {
            return Err(Error::InvalidState(format!(
                "the deleted subject {} cannot be committed",
                self.id
            )));
        }
        self.baseline = self.working.clone();
        self.inserted = false;
        self.restore = None;
        Ok(())
    }

    pub fn undo(&mut self) -> Result<()> {
        if self.inserted {
            return Err(Error::InvalidState(format!(
                "the non-persisted subject {} cannot be undone",
                self.id
            )));
        }
        if let Some((class, predicates)) = self.restore.take() {
            self.node = NodeKind::new(class);
            self.predicates = predicates;
        }
        self.working = self.baseline.clone();
        self.deleted = false;
        Ok(())
    }

    pub fn update_statement(&self) -> String {
        let graph = NamedNodeRef::new_unchecked(&self.graph);
        let subject = NamedNodeRef::new_unchecked(&self.id);
        if self.deleted {
            // never persisted, nothing to remove
            if self.inserted {
                return String::new();
            }
            return format!("DELETE WHERE {{ GRAPH {} {{ {} ?p ?o }} }};\n", graph, subject);
        }
        let mut sparql = String::new();
        for pred in self.predicates.iter() {
            let new = self.working.get(pred.id());
            let old = self.baseline.get(pred.id());
            if new.is_none() && old.is_none() {
                continue;
            }
            sparql += &pred.to_update(&self.graph, &self.id, new, old);
        }
        // persisted values of predicates this subject no longer recognizes, after it
        // was inserted again as another node class
        let mut stale: Vec<&String> = self
            .baseline
            .keys()
            .filter(|p| !self.recognizes(p))
            .collect();
        stale.sort();
        for pred in stale {
            sparql += &format!(
                "DELETE WHERE {{ GRAPH {} {{ {} {} ?o }} }};\n",
                graph,
                subject,
                NamedNodeRef::new_unchecked(pred)
            );
        }
        sparql
    }

    /// The node's own properties as JSON, without children: `id`, every recognized
    /// non-structural predicate by alias, and the options record flattened in.
    pub fn representation(&self) -> JsonMap {
        let mut rep = JsonMap::new();
        if let Some(Value::Json(options)) = self.working.get(OPTIONS.as_str()) {
            for (key, value) in options.iter() {
                rep.insert(key.clone(), value.clone());
            }
        }
        rep.insert(ID_KEY.to_string(), JsonValue::String(self.id.clone()));
        for pred in self.predicates.iter() {
            if is_structural(pred.id()) || pred.id() == OPTIONS.as_str() {
                continue;
            }
            rep.insert(pred.alias().to_string(), self.get_property(pred).to_json());
        }
        rep
    }

    /// Applies a node representation. Recognized aliases are set directly, structural
    /// keys are skipped and anything else goes to the options record, which is
    /// replaced, or merged into when `merge_options` is set. `null` removes an option.
    pub fn apply_representation(&mut self, rep: &JsonMap, merge_options: bool) -> Result<()> {
        let mut extra: Vec<(&String, &JsonValue)> = vec![];
        for (key, value) in rep.iter() {
            if key == ID_KEY || key == CHILDREN_KEY {
                continue;
            }
            match self.predicate(key).cloned() {
                Some(pred) if is_structural(pred.id()) => continue,
                Some(pred) if pred.id() == OPTIONS.as_str() => match value {
                    JsonValue::Object(map) => extra.extend(map.iter()),
                    JsonValue::Null => {}
                    other => {
                        return Err(Error::MalformedValue {
                            predicate: pred.id().to_string(),
                            reason: format!("expected a JSON object, found {}", other),
                        })
                    }
                },
                Some(pred) => {
                    let value = pred.from_json(value)?;
                    self.set_property(&pred, value)?;
                }
                None => extra.push((key, value)),
            }
        }

        let options = match self.predicate(OPTIONS.as_str()).cloned() {
            Some(pred) => pred,
            None => {
                return match extra.first() {
                    Some((key, _)) => Err(Error::UnknownPredicate {
                        subject: self.id.clone(),
                        predicate: key.to_string(),
                    }),
                    None => Ok(()),
                }
            }
        };
        if merge_options && extra.is_empty() {
            return Ok(());
        }
        let mut record = match (merge_options, self.working.get(options.id())) {
            (true, Some(Value::Json(current))) => current.as_ref().clone(),
            _ => JsonMap::new(),
        };
        for (key, value) in extra {
            if value.is_null() {
                record.remove(key);
            } else {
                record.insert(key.clone(), value.clone());
            }
        }
        self.set_property(&options, Value::json(record))
    }
}

fn is_structural(predicate: &str) -> bool {
    STRUCTURAL_PREDICATES
        .iter()
        .any(|p| p.as_str() == predicate)
}
