//! Neo4j store backend
//!
//! Speaks Bolt via neo4rs. Data operations run inside real server-side
//! transactions. Labels and property keys are implicit in a Cypher store, so
//! the management calls record names client-side; a composite index without
//! a label restriction is expanded into one DDL statement per recorded
//! label.

use super::{CompositeIndex, GraphStore, StoreError, StoreResult, StoreTransaction};
use crate::{Cardinality, DataType, ElementKind, Multiplicity, PropertyValue};
use neo4rs::{BoltType, ConfigBuilder, Graph, Txn, query};
use std::collections::BTreeSet;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Bolt-backed graph store
pub struct Neo4jStore {
    graph: Graph,
    vertex_labels: Mutex<BTreeSet<String>>,
    edge_labels: Mutex<BTreeSet<String>>,
}

impl Neo4jStore {
    /// Connect to a Neo4j server
    pub async fn connect(
        uri: &str,
        user: &str,
        password: &str,
        database: Option<&str>,
    ) -> StoreResult<Self> {
        let mut builder = ConfigBuilder::default()
            .uri(uri)
            .user(user)
            .password(password);
        if let Some(db) = database {
            builder = builder.db(db);
        }
        let config = builder
            .build()
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        let graph = Graph::connect(config)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        Ok(Self {
            graph,
            vertex_labels: Mutex::new(BTreeSet::new()),
            edge_labels: Mutex::new(BTreeSet::new()),
        })
    }

    async fn count(&self, cypher: &str) -> StoreResult<u64> {
        let mut stream = self
            .graph
            .execute(query(cypher))
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
        let row = stream
            .next()
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?
            .ok_or_else(|| StoreError::Query("count query returned no row".to_string()))?;
        let count: i64 = row
            .get("c")
            .map_err(|e| StoreError::Query(e.to_string()))?;
        Ok(count as u64)
    }

    async fn name_exists(&self, cypher: &str) -> StoreResult<bool> {
        let mut stream = self
            .graph
            .execute(query(cypher))
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
        let row = stream
            .next()
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
        Ok(row.is_some())
    }
}

impl GraphStore for Neo4jStore {
    type Txn = Neo4jTransaction;

    async fn create_vertex_label(&self, name: &str) -> StoreResult<()> {
        // Labels come into existence with the first node that carries them;
        // the name is recorded so label-agnostic indices can expand later.
        debug!("registered vertex label '{name}'");
        self.vertex_labels.lock().await.insert(name.to_string());
        Ok(())
    }

    async fn create_edge_label(&self, name: &str, multiplicity: Multiplicity) -> StoreResult<()> {
        debug!("registered edge label '{name}' (multiplicity {multiplicity} not enforced by this backend)");
        self.edge_labels.lock().await.insert(name.to_string());
        Ok(())
    }

    async fn create_property_key(
        &self,
        name: &str,
        data_type: DataType,
        cardinality: Cardinality,
    ) -> StoreResult<()> {
        // Property keys are implicit as well.
        debug!("registered property key '{name}' ({data_type}, {cardinality})");
        Ok(())
    }

    async fn contains_property_key(&self, name: &str) -> StoreResult<bool> {
        let cypher = format!(
            "CALL db.propertyKeys() YIELD propertyKey WHERE propertyKey = '{}' RETURN propertyKey",
            escape_string(name)
        );
        self.name_exists(&cypher).await
    }

    async fn contains_index(&self, name: &str) -> StoreResult<bool> {
        // A label-agnostic index may have been fanned out into per-label
        // statements suffixed with the label name.
        let escaped = escape_string(name);
        let index_query = format!(
            "SHOW INDEXES YIELD name WHERE name = '{escaped}' OR name STARTS WITH '{escaped}_' RETURN name"
        );
        if self.name_exists(&index_query).await? {
            return Ok(true);
        }
        let constraint_query = format!(
            "SHOW CONSTRAINTS YIELD name WHERE name = '{escaped}' OR name STARTS WITH '{escaped}_' RETURN name"
        );
        self.name_exists(&constraint_query).await
    }

    async fn build_composite_index(&self, index: &CompositeIndex) -> StoreResult<()> {
        let labels: Vec<String> = match &index.index_only {
            Some(label) => vec![label.clone()],
            None => match index.element {
                ElementKind::Vertex => self.vertex_labels.lock().await.iter().cloned().collect(),
                ElementKind::Edge => self.edge_labels.lock().await.iter().cloned().collect(),
            },
        };

        if labels.is_empty() {
            warn!(
                "index '{}' has no label restriction and no {} labels are registered; nothing to build",
                index.name, index.element
            );
            return Ok(());
        }

        for label in &labels {
            let name = if labels.len() == 1 {
                index.name.clone()
            } else {
                format!("{}_{}", index.name, label)
            };
            let cypher = index_statement(&name, label, index);
            debug!("building index: {cypher}");
            self.graph
                .run(query(&cypher))
                .await
                .map_err(|e| StoreError::Query(e.to_string()))?;
        }
        Ok(())
    }

    async fn begin(&self) -> StoreResult<Neo4jTransaction> {
        let txn = self
            .graph
            .start_txn()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(Neo4jTransaction { txn })
    }

    async fn vertex_count(&self) -> StoreResult<u64> {
        self.count("MATCH (n) RETURN count(n) AS c").await
    }

    async fn edge_count(&self) -> StoreResult<u64> {
        self.count("MATCH ()-[r]->() RETURN count(r) AS c").await
    }
}

fn index_statement(name: &str, label: &str, index: &CompositeIndex) -> String {
    let name = escape_ident(name);
    let label = escape_ident(label);
    let var = match index.element {
        ElementKind::Vertex => "v",
        ElementKind::Edge => "r",
    };
    let props: Vec<String> = index
        .property_keys
        .iter()
        .map(|key| format!("{var}.`{}`", escape_ident(key)))
        .collect();
    let target = match index.element {
        ElementKind::Vertex => format!("(v:`{label}`)"),
        ElementKind::Edge => format!("()-[r:`{label}`]-()"),
    };

    if index.unique {
        let required = if props.len() == 1 {
            props[0].clone()
        } else {
            format!("({})", props.join(", "))
        };
        format!("CREATE CONSTRAINT `{name}` IF NOT EXISTS FOR {target} REQUIRE {required} IS UNIQUE")
    } else {
        format!(
            "CREATE INDEX `{name}` IF NOT EXISTS FOR {target} ON ({})",
            props.join(", ")
        )
    }
}

/// A server-side transaction
pub struct Neo4jTransaction {
    txn: Txn,
}

impl StoreTransaction for Neo4jTransaction {
    /// Element id of the node, valid for the lifetime of the transaction
    type Vertex = String;

    async fn add_vertex(&mut self, label: &str) -> StoreResult<String> {
        let cypher = format!(
            "CREATE (v:`{}`) RETURN elementId(v) AS vid",
            escape_ident(label)
        );
        let mut stream = self
            .txn
            .execute(query(&cypher))
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
        let row = stream
            .next(self.txn.handle())
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?
            .ok_or_else(|| StoreError::Query("vertex creation returned no row".to_string()))?;
        row.get("vid").map_err(|e| StoreError::Query(e.to_string()))
    }

    async fn set_property(
        &mut self,
        vertex: &String,
        key: &str,
        value: PropertyValue,
    ) -> StoreResult<()> {
        let cypher = format!(
            "MATCH (v) WHERE elementId(v) = $vid SET v.`{}` = $value",
            escape_ident(key)
        );
        self.txn
            .run(
                query(&cypher)
                    .param("vid", vertex.as_str())
                    .param("value", bolt_value(value)),
            )
            .await
            .map_err(|e| StoreError::Query(e.to_string()))
    }

    async fn vertex_by_property(
        &mut self,
        key: &str,
        value: &PropertyValue,
    ) -> StoreResult<Option<String>> {
        let cypher = format!(
            "MATCH (v) WHERE v.`{}` = $value RETURN elementId(v) AS vid LIMIT 1",
            escape_ident(key)
        );
        let mut stream = self
            .txn
            .execute(query(&cypher).param("value", bolt_value(value.clone())))
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
        let row = stream
            .next(self.txn.handle())
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
        match row {
            Some(row) => {
                let vid: String = row
                    .get("vid")
                    .map_err(|e| StoreError::Query(e.to_string()))?;
                Ok(Some(vid))
            }
            None => Ok(None),
        }
    }

    async fn add_edge(
        &mut self,
        from: &String,
        to: &String,
        label: &str,
        property: Option<(&str, PropertyValue)>,
    ) -> StoreResult<()> {
        let set_clause = property
            .as_ref()
            .map(|(key, _)| format!(" SET r.`{}` = $value", escape_ident(key)))
            .unwrap_or_default();
        let cypher = format!(
            "MATCH (a) WHERE elementId(a) = $from \
             MATCH (b) WHERE elementId(b) = $to \
             CREATE (a)-[r:`{}`]->(b){set_clause}",
            escape_ident(label)
        );
        let mut q = query(&cypher)
            .param("from", from.as_str())
            .param("to", to.as_str());
        if let Some((_, value)) = property {
            q = q.param("value", bolt_value(value));
        }
        self.txn
            .run(q)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))
    }

    async fn commit(self) -> StoreResult<()> {
        self.txn
            .commit()
            .await
            .map_err(|e| StoreError::Query(e.to_string()))
    }

    async fn rollback(self) -> StoreResult<()> {
        self.txn
            .rollback()
            .await
            .map_err(|e| StoreError::Query(e.to_string()))
    }
}

fn bolt_value(value: PropertyValue) -> BoltType {
    match value {
        PropertyValue::Int(v) => v.into(),
        PropertyValue::Float(v) => v.into(),
        PropertyValue::Text(v) => v.into(),
    }
}

/// Escape a string for use inside a single-quoted Cypher literal
fn escape_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

/// Escape an identifier for use inside backticks
fn escape_ident(s: &str) -> String {
    s.replace('`', "``")
}
