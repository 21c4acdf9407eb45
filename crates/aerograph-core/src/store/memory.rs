//! In-process store backend
//!
//! Backs dry runs and tests. Mutations stage inside a transaction and only
//! become visible on commit; unique composite indices are enforced at commit
//! time. This is deliberately not a query engine, just the smallest honest
//! implementation of the store contract.

use super::{CompositeIndex, GraphStore, StoreError, StoreResult, StoreTransaction};
use crate::{Cardinality, DataType, ElementKind, Multiplicity, PropertyValue};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
struct VertexData {
    label: String,
    properties: HashMap<String, PropertyValue>,
}

#[derive(Debug, Clone)]
struct EdgeData {
    from: u64,
    to: u64,
    label: String,
    properties: HashMap<String, PropertyValue>,
}

#[derive(Default)]
struct Inner {
    vertex_labels: HashSet<String>,
    edge_labels: HashMap<String, Multiplicity>,
    property_keys: HashMap<String, (DataType, Cardinality)>,
    indices: HashMap<String, CompositeIndex>,
    vertices: HashMap<u64, VertexData>,
    edges: Vec<EdgeData>,
    next_vertex_id: u64,
    transactions_begun: u64,
    transactions_committed: u64,
}

/// Counters describing what a [`MemoryStore`] has seen so far
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryStats {
    pub vertices: u64,
    pub edges: u64,
    pub transactions_begun: u64,
    pub transactions_committed: u64,
}

impl std::fmt::Display for MemoryStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Memory store:")?;
        writeln!(f, "  Vertices:               {}", self.vertices)?;
        writeln!(f, "  Edges:                  {}", self.edges)?;
        writeln!(f, "  Transactions begun:     {}", self.transactions_begun)?;
        writeln!(f, "  Transactions committed: {}", self.transactions_committed)?;
        Ok(())
    }
}

/// Transaction-staging in-memory graph store
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn stats(&self) -> MemoryStats {
        let inner = self.inner.lock().await;
        MemoryStats {
            vertices: inner.vertices.len() as u64,
            edges: inner.edges.len() as u64,
            transactions_begun: inner.transactions_begun,
            transactions_committed: inner.transactions_committed,
        }
    }
}

#[cfg(test)]
impl MemoryStore {
    /// Committed properties of the vertex with the given external
    /// identifier, for assertions in loader tests.
    pub(crate) async fn vertex_properties_by_identity(
        &self,
        identity: &str,
    ) -> Option<HashMap<String, PropertyValue>> {
        let wanted = PropertyValue::Text(identity.to_string());
        let inner = self.inner.lock().await;
        inner
            .vertices
            .values()
            .find(|data| data.properties.get(crate::IDENTITY_KEY) == Some(&wanted))
            .map(|data| data.properties.clone())
    }
}

impl GraphStore for MemoryStore {
    type Txn = MemoryTransaction;

    async fn create_vertex_label(&self, name: &str) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        inner.vertex_labels.insert(name.to_string());
        Ok(())
    }

    async fn create_edge_label(&self, name: &str, multiplicity: Multiplicity) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        inner.edge_labels.insert(name.to_string(), multiplicity);
        Ok(())
    }

    async fn create_property_key(
        &self,
        name: &str,
        data_type: DataType,
        cardinality: Cardinality,
    ) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        inner
            .property_keys
            .insert(name.to_string(), (data_type, cardinality));
        Ok(())
    }

    async fn contains_property_key(&self, name: &str) -> StoreResult<bool> {
        let inner = self.inner.lock().await;
        Ok(inner.property_keys.contains_key(name))
    }

    async fn contains_index(&self, name: &str) -> StoreResult<bool> {
        let inner = self.inner.lock().await;
        Ok(inner.indices.contains_key(name))
    }

    async fn build_composite_index(&self, index: &CompositeIndex) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        inner.indices.insert(index.name.clone(), index.clone());
        Ok(())
    }

    async fn begin(&self) -> StoreResult<MemoryTransaction> {
        let mut inner = self.inner.lock().await;
        inner.transactions_begun += 1;
        Ok(MemoryTransaction {
            inner: Arc::clone(&self.inner),
            staged_new: HashMap::new(),
            staged_props: HashMap::new(),
            staged_edges: Vec::new(),
        })
    }

    async fn vertex_count(&self) -> StoreResult<u64> {
        let inner = self.inner.lock().await;
        Ok(inner.vertices.len() as u64)
    }

    async fn edge_count(&self) -> StoreResult<u64> {
        let inner = self.inner.lock().await;
        Ok(inner.edges.len() as u64)
    }
}

/// A staged unit of work against a [`MemoryStore`]
pub struct MemoryTransaction {
    inner: Arc<Mutex<Inner>>,
    /// Vertices created in this transaction: id -> label
    staged_new: HashMap<u64, String>,
    /// Property writes in this transaction, keyed by vertex id
    staged_props: HashMap<u64, HashMap<String, PropertyValue>>,
    staged_edges: Vec<EdgeData>,
}

impl MemoryTransaction {
    fn knows_vertex(&self, inner: &Inner, id: u64) -> bool {
        self.staged_new.contains_key(&id) || inner.vertices.contains_key(&id)
    }
}

impl StoreTransaction for MemoryTransaction {
    type Vertex = u64;

    async fn add_vertex(&mut self, label: &str) -> StoreResult<u64> {
        let mut inner = self.inner.lock().await;
        let id = inner.next_vertex_id;
        inner.next_vertex_id += 1;
        self.staged_new.insert(id, label.to_string());
        Ok(id)
    }

    async fn set_property(
        &mut self,
        vertex: &u64,
        key: &str,
        value: PropertyValue,
    ) -> StoreResult<()> {
        let inner = self.inner.lock().await;
        if !self.knows_vertex(&inner, *vertex) {
            return Err(StoreError::Query(format!("unknown vertex handle {vertex}")));
        }
        drop(inner);
        self.staged_props
            .entry(*vertex)
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }

    async fn vertex_by_property(
        &mut self,
        key: &str,
        value: &PropertyValue,
    ) -> StoreResult<Option<u64>> {
        // Writes staged in this transaction win over committed state.
        for (id, props) in &self.staged_props {
            if props.get(key) == Some(value) {
                return Ok(Some(*id));
            }
        }
        let inner = self.inner.lock().await;
        for (id, data) in &inner.vertices {
            if data.properties.get(key) == Some(value) {
                return Ok(Some(*id));
            }
        }
        Ok(None)
    }

    async fn add_edge(
        &mut self,
        from: &u64,
        to: &u64,
        label: &str,
        property: Option<(&str, PropertyValue)>,
    ) -> StoreResult<()> {
        let inner = self.inner.lock().await;
        if !self.knows_vertex(&inner, *from) || !self.knows_vertex(&inner, *to) {
            return Err(StoreError::Query(format!(
                "edge endpoints must exist: {from} -> {to}"
            )));
        }
        drop(inner);
        let mut properties = HashMap::new();
        if let Some((key, value)) = property {
            properties.insert(key.to_string(), value);
        }
        self.staged_edges.push(EdgeData {
            from: *from,
            to: *to,
            label: label.to_string(),
            properties,
        });
        Ok(())
    }

    async fn commit(mut self) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;

        // Materialize the post-commit vertex set, then check every unique
        // vertex index against it before anything becomes visible.
        let mut merged: HashMap<u64, VertexData> = inner.vertices.clone();
        for (id, label) in &self.staged_new {
            merged.insert(
                *id,
                VertexData {
                    label: label.clone(),
                    properties: HashMap::new(),
                },
            );
        }
        for (id, props) in self.staged_props.drain() {
            if let Some(data) = merged.get_mut(&id) {
                data.properties.extend(props);
            }
        }

        for index in inner.indices.values() {
            if !index.unique || index.element != ElementKind::Vertex {
                continue;
            }
            check_unique_index(index, &merged)?;
        }

        inner.vertices = merged;
        inner.edges.extend(self.staged_edges.drain(..));
        inner.transactions_committed += 1;
        Ok(())
    }

    async fn rollback(self) -> StoreResult<()> {
        // Staged state is owned by the transaction; dropping it discards it.
        Ok(())
    }
}

fn check_unique_index(
    index: &CompositeIndex,
    vertices: &HashMap<u64, VertexData>,
) -> StoreResult<()> {
    let mut seen: HashMap<Vec<String>, u64> = HashMap::new();
    for (id, data) in vertices {
        if let Some(label) = &index.index_only {
            if &data.label != label {
                continue;
            }
        }
        let mut key = Vec::with_capacity(index.property_keys.len());
        for prop in &index.property_keys {
            match data.properties.get(prop) {
                // Debug formatting keeps the variant tag, so Int(42) and
                // Text("42") cannot collide.
                Some(value) => key.push(format!("{:?}", value)),
                None => break,
            }
        }
        if key.len() != index.property_keys.len() {
            continue;
        }
        if let Some(other) = seen.insert(key, *id) {
            return Err(StoreError::ConstraintViolation(format!(
                "index '{}' violated: vertices {} and {} share ({})",
                index.name,
                other,
                id,
                index.property_keys.join(", ")
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity_index() -> CompositeIndex {
        CompositeIndex {
            name: "identityIndex".to_string(),
            element: ElementKind::Vertex,
            property_keys: vec!["identity".to_string()],
            unique: true,
            index_only: None,
        }
    }

    #[tokio::test]
    async fn staged_writes_invisible_until_commit() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let v = tx.add_vertex("airport").await.unwrap();
        tx.set_property(&v, "identity", "JFK".into()).await.unwrap();

        assert_eq!(store.vertex_count().await.unwrap(), 0);
        tx.commit().await.unwrap();
        assert_eq!(store.vertex_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn lookup_sees_writes_of_same_transaction() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let v = tx.add_vertex("airport").await.unwrap();
        tx.set_property(&v, "identity", "LAX".into()).await.unwrap();

        let found = tx
            .vertex_by_property("identity", &"LAX".into())
            .await
            .unwrap();
        assert_eq!(found, Some(v));
        tx.rollback().await.unwrap();
        assert_eq!(store.vertex_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn unique_index_rejects_duplicate_identity() {
        let store = MemoryStore::new();
        store.build_composite_index(&identity_index()).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let v = tx.add_vertex("airport").await.unwrap();
        tx.set_property(&v, "identity", "JFK".into()).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let v = tx.add_vertex("airport").await.unwrap();
        tx.set_property(&v, "identity", "JFK".into()).await.unwrap();
        let err = tx.commit().await.unwrap_err();
        assert!(matches!(err, StoreError::ConstraintViolation(_)));

        // The failed transaction left nothing behind.
        assert_eq!(store.vertex_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn rollback_discards_staged_edges() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let a = tx.add_vertex("airport").await.unwrap();
        let b = tx.add_vertex("airport").await.unwrap();
        tx.add_edge(&a, &b, "route", None).await.unwrap();
        tx.commit().await.unwrap();
        assert_eq!(store.edge_count().await.unwrap(), 1);

        let mut tx = store.begin().await.unwrap();
        let c = tx.add_vertex("airport").await.unwrap();
        let d = tx.add_vertex("airport").await.unwrap();
        tx.add_edge(&c, &d, "route", Some(("dist", 100.into())))
            .await
            .unwrap();
        tx.rollback().await.unwrap();
        assert_eq!(store.edge_count().await.unwrap(), 1);
        assert_eq!(store.vertex_count().await.unwrap(), 2);
    }
}
