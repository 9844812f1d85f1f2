//! Defines `Predicate`, the description of one relation type of a page graph, and the
//! `Value`s it carries. A predicate knows how to decode the object of a triple into a
//! `Value` and how to render the change between two values as update fragments.

use crate::errors::{Error, Result};
use oxigraph::model::{Literal, NamedNodeRef, TermRef};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::sync::Arc;

/// Structured-data record. `serde_json::Map` keeps its keys sorted, which gives the
/// canonical encoding used in update statements.
pub type JsonMap = serde_json::Map<String, JsonValue>;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    NamedNode,
    Text,
    Json,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::NamedNode => write!(f, "named node"),
            ValueKind::Text => write!(f, "text"),
            ValueKind::Json => write!(f, "json"),
        }
    }
}

/// A property value. JSON records are shared between the baseline and the working set
/// until one side is replaced, so snapshotting a subject never copies them.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    NamedNode(String),
    Text(String),
    Json(Arc<JsonMap>),
}

impl Value {
    pub fn named_node(iri: impl Into<String>) -> Self {
        Value::NamedNode(iri.into())
    }

    pub fn text(text: impl Into<String>) -> Self {
        Value::Text(text.into())
    }

    pub fn json(map: JsonMap) -> Self {
        Value::Json(Arc::new(map))
    }

    /// The value a predicate of the given kind has when nothing else is declared
    pub fn empty(kind: ValueKind) -> Self {
        match kind {
            ValueKind::NamedNode => Value::NamedNode(String::new()),
            ValueKind::Text => Value::Text(String::new()),
            ValueKind::Json => Value::json(JsonMap::new()),
        }
    }

    /// Parses the lexical form used for defaults in the ontology table
    pub fn from_lexical(kind: ValueKind, lexical: &str) -> Result<Self> {
        match kind {
            ValueKind::NamedNode => Ok(Value::named_node(lexical)),
            ValueKind::Text => Ok(Value::text(lexical)),
            ValueKind::Json => parse_record(lexical)
                .map(Value::json)
                .map_err(|reason| Error::MalformedValue {
                    predicate: "<default>".to_string(),
                    reason,
                }),
        }
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::NamedNode(_) => ValueKind::NamedNode,
            Value::Text(_) => ValueKind::Text,
            Value::Json(_) => ValueKind::Json,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::NamedNode(s) | Value::Text(s) => Some(s.as_str()),
            Value::Json(_) => None,
        }
    }

    pub fn as_json(&self) -> Option<&JsonMap> {
        match self {
            Value::Json(map) => Some(map.as_ref()),
            _ => None,
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::NamedNode(s) | Value::Text(s) => JsonValue::String(s.clone()),
            Value::Json(map) => JsonValue::Object(map.as_ref().clone()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::NamedNode(s) | Value::Text(s) => write!(f, "{}", s),
            Value::Json(map) => write!(f, "{}", encode_record(map)),
        }
    }
}

fn parse_record(lexical: &str) -> std::result::Result<JsonMap, String> {
    match serde_json::from_str::<JsonValue>(lexical) {
        Ok(JsonValue::Object(map)) => Ok(map),
        Ok(other) => Err(format!("expected a JSON object, found {}", other)),
        Err(e) => Err(e.to_string()),
    }
}

fn encode_record(map: &JsonMap) -> String {
    serde_json::to_string(map).unwrap_or_else(|_| "{}".to_string())
}

#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    id: String,
    alias: String,
    kind: ValueKind,
    default: Value,
}

impl Predicate {
    pub fn new(id: impl Into<String>, alias: impl Into<String>, kind: ValueKind) -> Self {
        Predicate {
            id: id.into(),
            alias: alias.into(),
            kind,
            default: Value::empty(kind),
        }
    }

    pub fn with_default(mut self, default: Value) -> Result<Self> {
        if default.kind() != self.kind {
            return Err(Error::MalformedValue {
                predicate: self.id,
                reason: format!("default must be {}, found {}", self.kind, default.kind()),
            });
        }
        self.default = default;
        Ok(self)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn default_value(&self) -> &Value {
        &self.default
    }

    pub fn is_default(&self, value: &Value) -> bool {
        value == &self.default
    }

    fn malformed(&self, reason: impl Into<String>) -> Error {
        Error::MalformedValue {
            predicate: self.id.clone(),
            reason: reason.into(),
        }
    }

    /// Checks that a value can be stored under this predicate
    pub fn check(&self, value: &Value) -> Result<()> {
        if value.kind() != self.kind {
            return Err(self.malformed(format!(
                "expected {}, found {}",
                self.kind,
                value.kind()
            )));
        }
        match value {
            Value::NamedNode(iri) => self.check_iri(iri),
            _ => Ok(()),
        }
    }

    // the empty string is the unset named node
    fn check_iri(&self, iri: &str) -> Result<()> {
        if iri.is_empty() {
            return Ok(());
        }
        NamedNodeRef::new(iri)
            .map(|_| ())
            .map_err(|e| self.malformed(format!("invalid IRI {}: {}", iri, e)))
    }

    /// Decodes the object of a triple
    pub fn from_term(&self, term: TermRef) -> Result<Value> {
        match (self.kind, term) {
            (ValueKind::NamedNode, TermRef::NamedNode(n)) => Ok(Value::named_node(n.as_str())),
            (ValueKind::Text, TermRef::Literal(l)) => Ok(Value::text(l.value())),
            (ValueKind::Json, TermRef::Literal(l)) => parse_record(l.value())
                .map(Value::json)
                .map_err(|reason| self.malformed(reason)),
            (kind, term) => Err(self.malformed(format!("cannot read {} as {}", term, kind))),
        }
    }

    /// Decodes a value from a node representation. `null` stands for the default.
    pub fn from_json(&self, value: &JsonValue) -> Result<Value> {
        match (self.kind, value) {
            (_, JsonValue::Null) => Ok(self.default.clone()),
            (ValueKind::NamedNode, JsonValue::String(s)) => {
                self.check_iri(s)?;
                Ok(Value::named_node(s.as_str()))
            }
            (ValueKind::Text, JsonValue::String(s)) => Ok(Value::text(s.as_str())),
            (ValueKind::Json, JsonValue::Object(map)) => Ok(Value::json(map.clone())),
            (kind, other) => Err(self.malformed(format!("cannot read {} as {}", other, kind))),
        }
    }

    /// Renders a value as the object of a triple
    pub fn encode(&self, value: &Value) -> String {
        match value {
            Value::NamedNode(iri) => NamedNodeRef::new_unchecked(iri).to_string(),
            Value::Text(text) => Literal::new_simple_literal(text.as_str()).to_string(),
            Value::Json(map) => Literal::new_simple_literal(encode_record(map)).to_string(),
        }
    }

    /// Generates the statement that turns `old` into `new` for one subject. Missing
    /// values are read as the default, and defaults are never written to the store.
    pub fn to_update(
        &self,
        graph: &str,
        subject: &str,
        new: Option<&Value>,
        old: Option<&Value>,
    ) -> String {
        let new = new.unwrap_or(&self.default);
        let old = old.unwrap_or(&self.default);
        if new == old {
            return String::new();
        }
        let graph = NamedNodeRef::new_unchecked(graph);
        let subject = NamedNodeRef::new_unchecked(subject);
        let predicate = NamedNodeRef::new_unchecked(&self.id);

        let mut sparql = String::new();
        if !self.is_default(old) {
            sparql += &format!(
                "DELETE WHERE {{ GRAPH {} {{ {} {} ?o }} }};\n",
                graph, subject, predicate
            );
        }
        if !self.is_default(new) {
            sparql += &format!(
                "INSERT DATA {{ GRAPH {} {{ {} {} {}}} }};\n",
                graph,
                subject,
                predicate,
                self.encode(new)
            );
        }
        sparql
    }
}
