//! Defines the configuration of a page: the ontology table that maps predicate IRIs to
//! aliases, value kinds and defaults, and node types to the tree node classes.
//! The table is read-only once a page is built from it.

use crate::consts::{
    BRANCH, CHILDREN_KEY, FIRST_CHILD, ID_KEY, LEAF, NEXT, NUMBERED_LIST, OPTIONS, PARAGRAPH,
    ROOT, TEXT, TITLE, TYPE,
};
use crate::node::NodeClass;
use crate::predicate::{Value, ValueKind};
use anyhow::{anyhow, Result};
use oxigraph::model::{NamedNode, NamedNodeRef};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_with::{serde_as, DeserializeAs, SerializeAs};
use std::collections::{BTreeMap, HashSet};
use std::io::{BufReader, Write};
use std::path::Path;

fn namednode_ser<S>(namednode: &NamedNode, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(namednode.as_str())
}

fn namednode_de<'de, D>(deserializer: D) -> Result<NamedNode, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    NamedNode::new(s).map_err(serde::de::Error::custom)
}

struct LocalType;

impl SerializeAs<NamedNode> for LocalType {
    fn serialize_as<S>(value: &NamedNode, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        namednode_ser(value, serializer)
    }
}

impl<'de> DeserializeAs<'de, NamedNode> for LocalType {
    fn deserialize_as<D>(deserializer: D) -> Result<NamedNode, D::Error>
    where
        D: Deserializer<'de>,
    {
        namednode_de(deserializer)
    }
}

/// One row of the ontology table
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PredicateConfig {
    #[serde(serialize_with = "namednode_ser", deserialize_with = "namednode_de")]
    pub id: NamedNode,
    pub alias: String,
    pub kind: ValueKind,
    // lexical default; the empty value of `kind` when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    // node classes recognizing this predicate; every class when empty
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub domain: Vec<NodeClass>,
}

impl PredicateConfig {
    pub fn new(id: NamedNodeRef, alias: &str, kind: ValueKind) -> Self {
        PredicateConfig {
            id: id.into_owned(),
            alias: alias.to_string(),
            kind,
            default: None,
            domain: vec![],
        }
    }

    pub fn with_domain(mut self, domain: &[NodeClass]) -> Self {
        self.domain = domain.to_vec();
        self
    }

    pub fn with_default(mut self, default: &str) -> Self {
        self.default = Some(default.to_string());
        self
    }

    pub fn applies_to(&self, class: NodeClass) -> bool {
        self.domain.is_empty() || self.domain.contains(&class)
    }
}

#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    pub predicates: Vec<PredicateConfig>,
    #[serde_as(as = "BTreeMap<LocalType, _>")]
    pub node_types: BTreeMap<NamedNode, NodeClass>,
}

impl Default for Config {
    fn default() -> Self {
        use NodeClass::{Branch, Leaf, Root};
        let predicates = vec![
            PredicateConfig::new(TYPE, "type", ValueKind::NamedNode),
            PredicateConfig::new(TITLE, "title", ValueKind::Text).with_domain(&[Root]),
            PredicateConfig::new(FIRST_CHILD, "firstChild", ValueKind::NamedNode)
                .with_domain(&[Root, Branch]),
            PredicateConfig::new(NEXT, "next", ValueKind::NamedNode),
            PredicateConfig::new(OPTIONS, "options", ValueKind::Json),
            PredicateConfig::new(TEXT, "text", ValueKind::Text).with_domain(&[Leaf]),
        ];
        let node_types = [
            (ROOT, Root),
            (LEAF, Leaf),
            (BRANCH, Branch),
            (PARAGRAPH, Branch),
            (NUMBERED_LIST, Branch),
        ]
        .into_iter()
        .map(|(iri, class)| (iri.into_owned(), class))
        .collect();
        Config {
            predicates,
            node_types,
        }
    }
}

impl Config {
    pub fn predicate(&self, id: NamedNodeRef) -> Option<&PredicateConfig> {
        self.predicates.iter().find(|p| p.id.as_ref() == id)
    }

    /// Checks that the table can drive a page: unique IRIs and aliases, parseable
    /// defaults, and the structural predicates present with the right kinds.
    pub fn validate(&self) -> Result<()> {
        let mut ids = HashSet::new();
        let mut aliases = HashSet::new();
        for pred in self.predicates.iter() {
            if !ids.insert(pred.id.as_str()) {
                return Err(anyhow!("Duplicate predicate: {}", pred.id));
            }
            if !aliases.insert(pred.alias.as_str()) {
                return Err(anyhow!("Duplicate alias: {}", pred.alias));
            }
            if pred.alias == ID_KEY || pred.alias == CHILDREN_KEY || pred.alias.is_empty() {
                return Err(anyhow!("Reserved alias for {}: '{}'", pred.id, pred.alias));
            }
            if let Some(default) = &pred.default {
                Value::from_lexical(pred.kind, default)
                    .map_err(|e| anyhow!("Bad default for {}: {}", pred.id, e))?;
            }
        }

        let required = [
            (TYPE, ValueKind::NamedNode),
            (NEXT, ValueKind::NamedNode),
            (FIRST_CHILD, ValueKind::NamedNode),
            (TEXT, ValueKind::Text),
        ];
        for (id, kind) in required {
            match self.predicate(id) {
                Some(pred) if pred.kind == kind => {}
                Some(pred) => {
                    return Err(anyhow!(
                        "Predicate {} must be {}, found {}",
                        id,
                        kind,
                        pred.kind
                    ))
                }
                None => return Err(anyhow!("Missing required predicate: {}", id)),
            }
        }
        if let Some(pred) = self.predicate(OPTIONS) {
            if pred.kind != ValueKind::Json {
                return Err(anyhow!("Predicate {} must be json", OPTIONS));
            }
        }

        if self.node_types.get(&ROOT.into_owned()) != Some(&NodeClass::Root) {
            return Err(anyhow!("Node type {} must map to the root class", ROOT));
        }
        for (iri, class) in self.node_types.iter() {
            if *class == NodeClass::Root && iri.as_ref() != ROOT {
                return Err(anyhow!("Only {} may map to the root class, found {}", ROOT, iri));
            }
        }
        Ok(())
    }

    pub fn save_to_file(&self, file: &Path) -> Result<()> {
        let config_str = serde_json::to_string_pretty(&self)?;
        let mut file = std::fs::File::create(file)?;
        file.write_all(config_str.as_bytes())?;
        Ok(())
    }

    pub fn from_file(file: &Path) -> Result<Self> {
        let file = std::fs::File::open(file)?;
        let reader = BufReader::new(file);
        let config: Config = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Prints out the ontology table in a readable way for command line output.
    pub fn print(&self) {
        println!("Ontology:");
        println!("  Predicates:");
        for pred in self.predicates.iter() {
            let domain = if pred.domain.is_empty() {
                "all".to_string()
            } else {
                pred.domain
                    .iter()
                    .map(|c| c.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            println!(
                "    - {} ({}): {} [{}]",
                pred.alias, pred.id, pred.kind, domain
            );
        }
        println!("  Node Types:");
        for (iri, class) in self.node_types.iter() {
            println!("    - {}: {}", iri, class);
        }
    }
}
