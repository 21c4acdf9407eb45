//! Graph store abstraction
//!
//! The loader never talks to a database directly; it is generic over the
//! [`GraphStore`] trait, which mirrors the management and transactional
//! surface an external graph database exposes. Backends: [`memory`] for dry
//! runs and tests, [`neo4j`] for a real Bolt-speaking server.

pub mod memory;
pub mod neo4j;

pub use memory::MemoryStore;
pub use neo4j::Neo4jStore;

use crate::{Cardinality, DataType, ElementKind, Multiplicity, PropertyValue};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database connection error: {0}")]
    Connection(String),
    #[error("Query execution error: {0}")]
    Query(String),
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// A composite index over one or more property keys
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeIndex {
    /// Index name, used for existence checks before building
    pub name: String,
    /// Element kind the index covers
    pub element: ElementKind,
    /// Constituent property keys, in order
    pub property_keys: Vec<String>,
    /// Whether the indexed key combination must be unique
    pub unique: bool,
    /// Optional label restriction; `None` indexes every element of the kind
    pub index_only: Option<String>,
}

/// Management and transactional operations of an external graph store.
///
/// Management calls (labels, property keys, indices) take effect outside any
/// data transaction. Data mutations happen through [`GraphStore::begin`] and
/// the returned [`StoreTransaction`].
#[allow(async_fn_in_trait)]
pub trait GraphStore {
    type Txn: StoreTransaction;

    async fn create_vertex_label(&self, name: &str) -> StoreResult<()>;

    async fn create_edge_label(&self, name: &str, multiplicity: Multiplicity) -> StoreResult<()>;

    async fn create_property_key(
        &self,
        name: &str,
        data_type: DataType,
        cardinality: Cardinality,
    ) -> StoreResult<()>;

    async fn contains_property_key(&self, name: &str) -> StoreResult<bool>;

    async fn contains_index(&self, name: &str) -> StoreResult<bool>;

    async fn build_composite_index(&self, index: &CompositeIndex) -> StoreResult<()>;

    /// Open a fresh transaction. Vertex handles obtained from it are only
    /// valid until the transaction is committed or rolled back.
    async fn begin(&self) -> StoreResult<Self::Txn>;

    async fn vertex_count(&self) -> StoreResult<u64>;

    async fn edge_count(&self) -> StoreResult<u64>;
}

/// One unit of atomic work against the store.
///
/// `commit` and `rollback` consume the transaction, so a transaction cannot
/// leak past its scope and handles cannot outlive it.
#[allow(async_fn_in_trait)]
pub trait StoreTransaction {
    /// Store-specific handle to a vertex, scoped to this transaction
    type Vertex: Clone;

    async fn add_vertex(&mut self, label: &str) -> StoreResult<Self::Vertex>;

    async fn set_property(
        &mut self,
        vertex: &Self::Vertex,
        key: &str,
        value: PropertyValue,
    ) -> StoreResult<()>;

    /// Look up a vertex by property equality. Sees writes staged in this
    /// transaction as well as previously committed data.
    async fn vertex_by_property(
        &mut self,
        key: &str,
        value: &PropertyValue,
    ) -> StoreResult<Option<Self::Vertex>>;

    async fn add_edge(
        &mut self,
        from: &Self::Vertex,
        to: &Self::Vertex,
        label: &str,
        property: Option<(&str, PropertyValue)>,
    ) -> StoreResult<()>;

    async fn commit(self) -> StoreResult<()>;

    async fn rollback(self) -> StoreResult<()>;
}
