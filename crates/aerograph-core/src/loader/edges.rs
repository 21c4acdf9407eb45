//! Edge CSV loading
//!
//! Edge rows are `[ignored, fromId, toId, label, weight?]`. Rows accumulate
//! into fixed-size batches; each batch gets a fresh transaction and a fresh
//! identifier cache, because vertex handles do not survive a transaction
//! boundary. A failed batch is rolled back and logged, and loading moves on
//! to the next batch. Rows whose endpoints cannot be resolved are skipped
//! without error.

use super::value::ValueError;
use super::{LoadError, LoadResult};
use crate::store::{GraphStore, StoreResult, StoreTransaction};
use crate::{IDENTITY_KEY, PropertyValue};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::io;
use std::path::Path;
use tracing::{debug, warn};

/// Property key carrying an edge's weight
const WEIGHT_KEY: &str = "dist";

/// Outcome of one edge-loading run
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeLoadStats {
    /// Data rows read from the file
    pub rows_processed: usize,
    /// Edges created in committed batches
    pub edges_created: usize,
    /// Rows skipped because an endpoint did not resolve
    pub rows_skipped: usize,
    /// Rows dropped for not having the expected shape
    pub rows_malformed: usize,
    pub batches_committed: usize,
    pub batches_failed: usize,
}

impl std::fmt::Display for EdgeLoadStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Edge load:")?;
        writeln!(f, "  Rows processed:    {}", self.rows_processed)?;
        writeln!(f, "  Edges created:     {}", self.edges_created)?;
        writeln!(f, "  Rows skipped:      {}", self.rows_skipped)?;
        writeln!(f, "  Rows malformed:    {}", self.rows_malformed)?;
        writeln!(f, "  Batches committed: {}", self.batches_committed)?;
        writeln!(f, "  Batches failed:    {}", self.batches_failed)?;
        Ok(())
    }
}

struct EdgeRow {
    from: String,
    to: String,
    label: String,
    weight: String,
}

#[derive(Default)]
struct BatchOutcome {
    created: usize,
    skipped: usize,
}

/// Load every edge row from a reader, committing in batches of `batch_size`
pub async fn load_edges<S: GraphStore, R: io::Read>(
    store: &S,
    source: R,
    batch_size: usize,
) -> LoadResult<EdgeLoadStats> {
    let reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(source);
    run(store, reader, batch_size).await
}

/// Load every edge row from a CSV file on disk
pub async fn load_edges_from_path<S: GraphStore>(
    store: &S,
    path: impl AsRef<Path>,
    batch_size: usize,
) -> LoadResult<EdgeLoadStats> {
    let reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;
    run(store, reader, batch_size).await
}

async fn run<S: GraphStore, R: io::Read>(
    store: &S,
    mut reader: csv::Reader<R>,
    batch_size: usize,
) -> LoadResult<EdgeLoadStats> {
    let batch_size = batch_size.max(1);
    let mut stats = EdgeLoadStats::default();
    let mut records = reader.records();

    // Header row carries no type information for edges.
    if records.next().is_none() {
        warn!("edge file is empty, nothing to load");
        return Ok(stats);
    }

    let mut batch: Vec<EdgeRow> = Vec::with_capacity(batch_size);
    for (offset, result) in records.enumerate() {
        let row = result?;
        stats.rows_processed += 1;

        let (Some(from), Some(to), Some(label)) = (row.get(1), row.get(2), row.get(3)) else {
            warn!("edge row {} has fewer than four fields, dropped", offset + 2);
            stats.rows_malformed += 1;
            continue;
        };
        batch.push(EdgeRow {
            from: from.trim().to_string(),
            to: to.trim().to_string(),
            label: label.trim().to_string(),
            weight: row.get(4).unwrap_or_default().trim().to_string(),
        });

        if batch.len() == batch_size {
            flush(store, &batch, &mut stats).await;
            batch.clear();
        }
    }

    // Remainder forms a final, shorter batch.
    if !batch.is_empty() {
        flush(store, &batch, &mut stats).await;
    }

    Ok(stats)
}

/// Commit one batch in its own transaction. Failures are contained here;
/// the next batch starts from a clean transaction boundary.
async fn flush<S: GraphStore>(store: &S, batch: &[EdgeRow], stats: &mut EdgeLoadStats) {
    match commit_batch(store, batch).await {
        Ok(outcome) => {
            debug!(
                "committed edge batch: {} created, {} skipped",
                outcome.created, outcome.skipped
            );
            stats.batches_committed += 1;
            stats.edges_created += outcome.created;
            stats.rows_skipped += outcome.skipped;
        }
        Err(e) => {
            warn!("Failed to commit batch of {} edge rows: {e}", batch.len());
            stats.batches_failed += 1;
        }
    }
}

async fn commit_batch<S: GraphStore>(store: &S, batch: &[EdgeRow]) -> LoadResult<BatchOutcome> {
    let mut tx = store.begin().await?;
    match stage_batch(&mut tx, batch).await {
        Ok(outcome) => {
            tx.commit().await?;
            Ok(outcome)
        }
        Err(e) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!("rollback after failed edge batch also failed: {rollback_err}");
            }
            Err(e)
        }
    }
}

async fn stage_batch<T: StoreTransaction>(tx: &mut T, batch: &[EdgeRow]) -> LoadResult<BatchOutcome> {
    let mut cache: HashMap<String, T::Vertex> = HashMap::new();
    let mut outcome = BatchOutcome::default();

    for row in batch {
        let from = resolve(tx, &mut cache, &row.from).await?;
        let to = resolve(tx, &mut cache, &row.to).await?;
        let (Some(from), Some(to)) = (from, to) else {
            outcome.skipped += 1;
            continue;
        };

        let property = if row.weight.is_empty() {
            None
        } else {
            let dist = row.weight.parse::<i64>().map_err(|_| {
                LoadError::Value(ValueError {
                    column: WEIGHT_KEY.to_string(),
                    value: row.weight.clone(),
                    expected: "integer",
                })
            })?;
            Some((WEIGHT_KEY, PropertyValue::Int(dist)))
        };

        tx.add_edge(&from, &to, &row.label, property).await?;
        outcome.created += 1;
    }

    Ok(outcome)
}

/// Resolve an external identifier to a vertex handle, remembering hits for
/// the rest of the batch.
async fn resolve<T: StoreTransaction>(
    tx: &mut T,
    cache: &mut HashMap<String, T::Vertex>,
    identifier: &str,
) -> StoreResult<Option<T::Vertex>> {
    if let Some(vertex) = cache.get(identifier) {
        return Ok(Some(vertex.clone()));
    }
    match tx
        .vertex_by_property(IDENTITY_KEY, &PropertyValue::Text(identifier.to_string()))
        .await?
    {
        Some(vertex) => {
            cache.insert(identifier.to_string(), vertex.clone());
            Ok(Some(vertex))
        }
        None => Ok(None),
    }
}
