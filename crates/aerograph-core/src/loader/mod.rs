//! Batched CSV loading
//!
//! Coordinates vertex and edge ingestion against a [`crate::store::GraphStore`].
//! Node loading is all-or-nothing inside one transaction; edge loading
//! commits in independent batches that fail in isolation.

pub mod edges;
pub mod nodes;
pub mod value;

pub use edges::{EdgeLoadStats, load_edges, load_edges_from_path};
pub use nodes::{load_nodes, load_nodes_from_path};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Value error: {0}")]
    Value(#[from] value::ValueError),
    #[error("Store error: {0}")]
    Store(#[from] crate::store::StoreError),
    #[error("Malformed row {line}: {reason}")]
    MalformedRow { line: usize, reason: String },
}

/// Result type for load operations
pub type LoadResult<T> = Result<T, LoadError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{self, SchemaDescriptor};
    use crate::store::{GraphStore, MemoryStore};

    const SCHEMA: &str = r#"{
        "vertexLabels": [{"name": "airport"}],
        "edgeLabels": [{"name": "route", "multiplicity": "MULTI"}],
        "propertyKeys": [
            {"name": "code", "dataType": "String", "cardinality": "SINGLE"},
            {"name": "lat", "dataType": "Double", "cardinality": "SINGLE"},
            {"name": "dist", "dataType": "Integer", "cardinality": "SINGLE"}
        ]
    }"#;

    const NODES: &str = "\
~id,~label,code,lat:double,author,date\n\
id,label,STRING,DOUBLE,STRING,STRING\n\
1,airport,JFK,40.6413,x,2026-01-10\n\
2,airport,LAX,33.9416,x,2026-01-10\n\
3,airport,SFO,37.6213,x,2026-01-10\n";

    const EDGES: &str = "\
~id,~from,~to,~label,dist\n\
e1,1,2,route,2475\n\
e2,2,3,route,337\n";

    #[tokio::test]
    async fn schema_then_nodes_then_edges() {
        let store = MemoryStore::new();
        let descriptor: SchemaDescriptor = serde_json::from_str(SCHEMA).unwrap();
        schema::apply(&store, &descriptor).await.unwrap();

        let loaded = load_nodes(&store, NODES.as_bytes()).await.unwrap();
        assert_eq!(loaded, 3);

        let stats = load_edges(&store, EDGES.as_bytes(), 100).await.unwrap();
        assert_eq!(stats.edges_created, 2);
        assert_eq!(stats.batches_failed, 0);

        assert_eq!(store.vertex_count().await.unwrap(), 3);
        assert_eq!(store.edge_count().await.unwrap(), 2);
    }
}
