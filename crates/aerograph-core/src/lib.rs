//! Aerograph Core Library
//!
//! Core functionality for the aerograph bulk loader.
//! Provides the graph store abstraction, schema application, and batched
//! CSV loading of vertices and edges.

pub mod loader;
pub mod schema;
pub mod store;

use serde::{Deserialize, Serialize};

/// Property key under which every vertex stores its external identifier.
///
/// The identifier comes from the first column of the node CSV and is the
/// lookup key used when resolving edge endpoints. It is distinct from
/// whatever internal identifier the store assigns.
pub const IDENTITY_KEY: &str = "identity";

/// Name of the unique composite index over [`IDENTITY_KEY`].
pub const IDENTITY_INDEX: &str = "identityIndex";

/// Scalar data types a property key can be declared with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Text,
    Integer,
    Double,
    Boolean,
}

impl DataType {
    /// Parse a schema-descriptor token. Tokens are exact; anything else is
    /// a configuration error at the call site.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "String" => Some(DataType::Text),
            "Integer" => Some(DataType::Integer),
            "Double" => Some(DataType::Double),
            "Boolean" => Some(DataType::Boolean),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DataType::Text => "String",
            DataType::Integer => "Integer",
            DataType::Double => "Double",
            DataType::Boolean => "Boolean",
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// How many values a property key holds per element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    Single,
    List,
    Set,
}

impl Cardinality {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "SINGLE" => Some(Cardinality::Single),
            "LIST" => Some(Cardinality::List),
            "SET" => Some(Cardinality::Set),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Cardinality::Single => "SINGLE",
            Cardinality::List => "LIST",
            Cardinality::Set => "SET",
        }
    }
}

impl std::fmt::Display for Cardinality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Constraint on how many edges of one label may connect a vertex pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Multiplicity {
    Multi,
    Simple,
    One2One,
    One2Many,
    Many2One,
}

impl Multiplicity {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "MULTI" => Some(Multiplicity::Multi),
            "SIMPLE" => Some(Multiplicity::Simple),
            "ONE2ONE" => Some(Multiplicity::One2One),
            "ONE2MANY" => Some(Multiplicity::One2Many),
            "MANY2ONE" => Some(Multiplicity::Many2One),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Multiplicity::Multi => "MULTI",
            Multiplicity::Simple => "SIMPLE",
            Multiplicity::One2One => "ONE2ONE",
            Multiplicity::One2Many => "ONE2MANY",
            Multiplicity::Many2One => "MANY2ONE",
        }
    }
}

impl std::fmt::Display for Multiplicity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Which kind of graph element an index targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Vertex,
    Edge,
}

impl ElementKind {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "vertex" => Some(ElementKind::Vertex),
            "edge" => Some(ElementKind::Edge),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ElementKind::Vertex => "vertex",
            ElementKind::Edge => "edge",
        }
    }
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A typed property value as produced by column coercion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl PropertyValue {
    /// The text content, when this value is textual
    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl std::fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PropertyValue::Int(v) => write!(f, "{}", v),
            PropertyValue::Float(v) => write!(f, "{}", v),
            PropertyValue::Text(v) => write!(f, "{}", v),
        }
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        PropertyValue::Int(v)
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        PropertyValue::Float(v)
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        PropertyValue::Text(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        PropertyValue::Text(v.to_string())
    }
}
