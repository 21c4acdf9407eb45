//! Schema descriptor parsing and application
//!
//! A JSON descriptor declares vertex labels, edge labels, property keys, and
//! composite indices. Application is a one-shot management pass: labels and
//! keys are created unconditionally, indices only when no index of that name
//! exists yet, so re-running against a populated store is safe. The reserved
//! identity key and its unique index are guaranteed even when the descriptor
//! never mentions them.

use crate::store::{CompositeIndex, GraphStore, StoreError};
use crate::{Cardinality, DataType, ElementKind, IDENTITY_INDEX, IDENTITY_KEY, Multiplicity};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),
    #[error("Unsupported cardinality: {0}")]
    UnsupportedCardinality(String),
    #[error("Unsupported multiplicity: {0}")]
    UnsupportedMultiplicity(String),
    #[error("Unsupported element type: {0}")]
    UnsupportedElementKind(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed schema descriptor: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Declarative schema description, deserialized from JSON
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SchemaDescriptor {
    pub vertex_labels: Vec<VertexLabelDef>,
    pub edge_labels: Vec<EdgeLabelDef>,
    pub property_keys: Vec<PropertyKeyDef>,
    pub graph_indices: GraphIndices,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VertexLabelDef {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EdgeLabelDef {
    pub name: String,
    pub multiplicity: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyKeyDef {
    pub name: String,
    pub data_type: String,
    pub cardinality: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GraphIndices {
    pub composite_indices: Vec<CompositeIndexDef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeIndexDef {
    pub index_name: String,
    pub element_type: String,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub index_only: Option<String>,
    pub property_keys: Vec<String>,
}

impl SchemaDescriptor {
    /// Read and parse a descriptor file
    pub fn from_path(path: impl AsRef<Path>) -> SchemaResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// What a schema application actually did
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaReport {
    pub vertex_labels: usize,
    pub edge_labels: usize,
    pub property_keys: usize,
    pub indices_built: usize,
    pub indices_skipped: usize,
}

impl std::fmt::Display for SchemaReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Schema applied:")?;
        writeln!(f, "  Vertex labels:   {}", self.vertex_labels)?;
        writeln!(f, "  Edge labels:     {}", self.edge_labels)?;
        writeln!(f, "  Property keys:   {}", self.property_keys)?;
        writeln!(f, "  Indices built:   {}", self.indices_built)?;
        writeln!(f, "  Indices skipped: {}", self.indices_skipped)?;
        Ok(())
    }
}

/// Apply a descriptor against a store's management API.
///
/// Unsupported tokens abort immediately; nothing of the data load has run at
/// that point.
pub async fn apply<S: GraphStore>(
    store: &S,
    descriptor: &SchemaDescriptor,
) -> SchemaResult<SchemaReport> {
    let mut report = SchemaReport::default();

    for vertex_label in &descriptor.vertex_labels {
        store.create_vertex_label(&vertex_label.name).await?;
        report.vertex_labels += 1;
    }

    for edge_label in &descriptor.edge_labels {
        let multiplicity = Multiplicity::from_token(&edge_label.multiplicity)
            .ok_or_else(|| SchemaError::UnsupportedMultiplicity(edge_label.multiplicity.clone()))?;
        store.create_edge_label(&edge_label.name, multiplicity).await?;
        report.edge_labels += 1;
    }

    for property_key in &descriptor.property_keys {
        let data_type = DataType::from_token(&property_key.data_type)
            .ok_or_else(|| SchemaError::UnsupportedDataType(property_key.data_type.clone()))?;
        let cardinality = Cardinality::from_token(&property_key.cardinality)
            .ok_or_else(|| SchemaError::UnsupportedCardinality(property_key.cardinality.clone()))?;
        store
            .create_property_key(&property_key.name, data_type, cardinality)
            .await?;
        report.property_keys += 1;
    }

    for def in &descriptor.graph_indices.composite_indices {
        let element = ElementKind::from_token(&def.element_type)
            .ok_or_else(|| SchemaError::UnsupportedElementKind(def.element_type.clone()))?;
        if store.contains_index(&def.index_name).await? {
            debug!("composite index '{}' already exists, skipping", def.index_name);
            report.indices_skipped += 1;
            continue;
        }
        store
            .build_composite_index(&CompositeIndex {
                name: def.index_name.clone(),
                element,
                property_keys: def.property_keys.clone(),
                unique: def.unique,
                index_only: def.index_only.clone(),
            })
            .await?;
        info!("Built composite index '{}'", def.index_name);
        report.indices_built += 1;
    }

    // The identity key and its unique index exist no matter what the
    // descriptor says; every loaded vertex depends on them.
    if !store.contains_property_key(IDENTITY_KEY).await? {
        store
            .create_property_key(IDENTITY_KEY, DataType::Text, Cardinality::Single)
            .await?;
    }
    if !store.contains_index(IDENTITY_INDEX).await? {
        store
            .build_composite_index(&CompositeIndex {
                name: IDENTITY_INDEX.to_string(),
                element: ElementKind::Vertex,
                property_keys: vec![IDENTITY_KEY.to_string()],
                unique: true,
                index_only: None,
            })
            .await?;
        info!("Built identity index '{}'", IDENTITY_INDEX);
        report.indices_built += 1;
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    const AIR_ROUTES_SCHEMA: &str = r#"{
        "vertexLabels": [
            {"name": "airport"},
            {"name": "country"}
        ],
        "edgeLabels": [
            {"name": "route", "multiplicity": "MULTI"},
            {"name": "contains", "multiplicity": "ONE2MANY"}
        ],
        "propertyKeys": [
            {"name": "code", "dataType": "String", "cardinality": "SINGLE"},
            {"name": "runways", "dataType": "Integer", "cardinality": "SINGLE"},
            {"name": "lat", "dataType": "Double", "cardinality": "SINGLE"}
        ],
        "graphIndices": {
            "compositeIndices": [
                {
                    "indexName": "byCode",
                    "elementType": "vertex",
                    "unique": false,
                    "indexOnly": "airport",
                    "propertyKeys": ["code"]
                }
            ]
        }
    }"#;

    #[test]
    fn descriptor_parses_from_json() {
        let descriptor: SchemaDescriptor = serde_json::from_str(AIR_ROUTES_SCHEMA).unwrap();
        assert_eq!(descriptor.vertex_labels.len(), 2);
        assert_eq!(descriptor.edge_labels[0].multiplicity, "MULTI");
        assert_eq!(descriptor.property_keys[2].data_type, "Double");
        let index = &descriptor.graph_indices.composite_indices[0];
        assert_eq!(index.index_name, "byCode");
        assert_eq!(index.index_only.as_deref(), Some("airport"));
        assert!(!index.unique);
    }

    #[test]
    fn descriptor_reads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.json");
        std::fs::write(&path, AIR_ROUTES_SCHEMA).unwrap();
        let descriptor = SchemaDescriptor::from_path(&path).unwrap();
        assert_eq!(descriptor.vertex_labels.len(), 2);
    }

    #[test]
    fn missing_descriptor_file_is_fatal() {
        let err = SchemaDescriptor::from_path("does-not-exist.json").unwrap_err();
        assert!(matches!(err, SchemaError::Io(_)));
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let descriptor: SchemaDescriptor = serde_json::from_str("{}").unwrap();
        assert!(descriptor.vertex_labels.is_empty());
        assert!(descriptor.graph_indices.composite_indices.is_empty());
    }

    #[tokio::test]
    async fn apply_builds_declared_and_reserved_indices() {
        let store = MemoryStore::new();
        let descriptor: SchemaDescriptor = serde_json::from_str(AIR_ROUTES_SCHEMA).unwrap();

        let report = apply(&store, &descriptor).await.unwrap();
        assert_eq!(report.vertex_labels, 2);
        assert_eq!(report.edge_labels, 2);
        assert_eq!(report.property_keys, 3);
        assert_eq!(report.indices_built, 2); // byCode + identityIndex
        assert_eq!(report.indices_skipped, 0);

        assert!(store.contains_index("byCode").await.unwrap());
        assert!(store.contains_index(IDENTITY_INDEX).await.unwrap());
        assert!(store.contains_property_key(IDENTITY_KEY).await.unwrap());
    }

    #[tokio::test]
    async fn second_apply_skips_existing_indices() {
        let store = MemoryStore::new();
        let descriptor: SchemaDescriptor = serde_json::from_str(AIR_ROUTES_SCHEMA).unwrap();

        apply(&store, &descriptor).await.unwrap();
        let report = apply(&store, &descriptor).await.unwrap();
        assert_eq!(report.indices_built, 0);
        assert_eq!(report.indices_skipped, 1);
    }

    #[tokio::test]
    async fn identity_guaranteed_from_empty_descriptor() {
        let store = MemoryStore::new();
        let report = apply(&store, &SchemaDescriptor::default()).await.unwrap();
        assert_eq!(report.indices_built, 1);
        assert!(store.contains_index(IDENTITY_INDEX).await.unwrap());
        assert!(store.contains_property_key(IDENTITY_KEY).await.unwrap());
    }

    #[tokio::test]
    async fn unsupported_data_type_is_fatal() {
        let store = MemoryStore::new();
        let descriptor: SchemaDescriptor = serde_json::from_str(
            r#"{"propertyKeys": [{"name": "ts", "dataType": "Timestamp", "cardinality": "SINGLE"}]}"#,
        )
        .unwrap();
        let err = apply(&store, &descriptor).await.unwrap_err();
        assert!(matches!(err, SchemaError::UnsupportedDataType(token) if token == "Timestamp"));
    }

    #[tokio::test]
    async fn unsupported_element_type_is_fatal() {
        let store = MemoryStore::new();
        let descriptor: SchemaDescriptor = serde_json::from_str(
            r#"{"graphIndices": {"compositeIndices": [
                {"indexName": "bad", "elementType": "hyperedge", "propertyKeys": ["x"]}
            ]}}"#,
        )
        .unwrap();
        let err = apply(&store, &descriptor).await.unwrap_err();
        assert!(matches!(err, SchemaError::UnsupportedElementKind(token) if token == "hyperedge"));
    }
}
