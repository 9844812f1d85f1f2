//! Defines `Ontology`, the registration table a page resolves predicates and node types
//! against. Predicates are shared by reference between every subject of a page.

use crate::config::Config;
use crate::errors::{Error, Result};
use crate::node::NodeClass;
use crate::predicate::{Predicate, Value};
use log::debug;
use oxigraph::model::NamedNodeRef;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Ontology {
    predicates: Vec<Arc<Predicate>>,
    by_id: HashMap<String, Arc<Predicate>>,
    by_alias: HashMap<String, Arc<Predicate>>,
    // recognized predicates per class, in table order
    domains: HashMap<NodeClass, Vec<Arc<Predicate>>>,
    node_types: HashMap<String, NodeClass>,
}

impl Default for Ontology {
    fn default() -> Self {
        Ontology::from_config(&Config::default()).expect("the built-in ontology table is valid")
    }
}

impl Ontology {
    pub fn from_config(config: &Config) -> Result<Self> {
        config
            .validate()
            .map_err(|e| Error::Ontology(e.to_string()))?;

        let mut predicates = vec![];
        let mut by_id = HashMap::new();
        let mut by_alias = HashMap::new();
        let mut domains: HashMap<NodeClass, Vec<Arc<Predicate>>> = HashMap::new();
        for row in config.predicates.iter() {
            let mut pred = Predicate::new(row.id.as_str(), row.alias.as_str(), row.kind);
            if let Some(default) = &row.default {
                pred = pred.with_default(Value::from_lexical(row.kind, default)?)?;
            }
            let pred = Arc::new(pred);
            for class in [NodeClass::Root, NodeClass::Branch, NodeClass::Leaf] {
                if row.applies_to(class) {
                    domains.entry(class).or_default().push(pred.clone());
                }
            }
            by_id.insert(row.id.as_str().to_string(), pred.clone());
            by_alias.insert(row.alias.clone(), pred.clone());
            predicates.push(pred);
        }
        let node_types = config
            .node_types
            .iter()
            .map(|(iri, class)| (iri.as_str().to_string(), *class))
            .collect();
        debug!(
            "Built ontology with {} predicates and {} node types",
            predicates.len(),
            config.node_types.len()
        );
        Ok(Ontology {
            predicates,
            by_id,
            by_alias,
            domains,
            node_types,
        })
    }

    pub fn predicates(&self) -> &[Arc<Predicate>] {
        &self.predicates
    }

    pub fn predicate(&self, id: &str) -> Option<&Arc<Predicate>> {
        self.by_id.get(id)
    }

    pub fn by_alias(&self, alias: &str) -> Option<&Arc<Predicate>> {
        self.by_alias.get(alias)
    }

    /// Looks a predicate up by IRI first and by alias second
    pub fn resolve(&self, key: &str) -> Option<&Arc<Predicate>> {
        self.predicate(key).or_else(|| self.by_alias(key))
    }

    pub fn predicates_for(&self, class: NodeClass) -> Vec<Arc<Predicate>> {
        self.domains.get(&class).cloned().unwrap_or_default()
    }

    pub fn node_class(&self, node_type: &str) -> Option<NodeClass> {
        self.node_types.get(node_type).copied()
    }

    pub(crate) fn required(&self, id: NamedNodeRef) -> Result<&Arc<Predicate>> {
        self.predicate(id.as_str())
            .ok_or_else(|| Error::Ontology(format!("Missing required predicate: {}", id)))
    }
}
