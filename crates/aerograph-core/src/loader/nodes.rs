//! Vertex CSV loading
//!
//! The node file is positional: row 0 holds typed headers, row 1 is a
//! descriptor row and is ignored, and in every data row the first column is
//! the external identifier and the second the vertex label. The trailing two
//! columns are loader metadata and never become properties. The whole file
//! loads inside a single transaction; any failure aborts it.

use super::value::Column;
use super::{LoadError, LoadResult};
use crate::IDENTITY_KEY;
use crate::store::{GraphStore, StoreTransaction};
use csv::{ReaderBuilder, StringRecord};
use std::io;
use std::path::Path;
use tracing::{info, warn};

/// Load every vertex row from a reader. Returns the number of vertices
/// created and committed.
pub async fn load_nodes<S: GraphStore, R: io::Read>(store: &S, source: R) -> LoadResult<usize> {
    let reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(source);
    run(store, reader).await
}

/// Load every vertex row from a CSV file on disk
pub async fn load_nodes_from_path<S: GraphStore>(
    store: &S,
    path: impl AsRef<Path>,
) -> LoadResult<usize> {
    let reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;
    run(store, reader).await
}

async fn run<S: GraphStore, R: io::Read>(
    store: &S,
    mut reader: csv::Reader<R>,
) -> LoadResult<usize> {
    let mut records = reader.records();

    let Some(header_row) = records.next() else {
        warn!("node file is empty, nothing to load");
        return Ok(0);
    };
    let columns: Vec<Column> = header_row?.iter().map(Column::parse).collect();

    // Row 1 restates the column layout for other tooling; skip it.
    if records.next().is_none() {
        return Ok(0);
    }

    let mut tx = store.begin().await?;
    match create_vertices(&mut tx, &columns, records).await {
        Ok(count) => {
            tx.commit().await?;
            info!("Committed {count} vertices");
            Ok(count)
        }
        Err(e) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!("rollback after failed node load also failed: {rollback_err}");
            }
            Err(e)
        }
    }
}

async fn create_vertices<T: StoreTransaction>(
    tx: &mut T,
    columns: &[Column],
    records: impl Iterator<Item = Result<StringRecord, csv::Error>>,
) -> LoadResult<usize> {
    // Everything between the label column and the trailing metadata pair is
    // a domain property.
    let property_end = columns.len().saturating_sub(2);
    let mut count = 0usize;

    for (offset, result) in records.enumerate() {
        let line = offset + 3; // rows 1 and 2 are header and descriptor
        let row = result?;

        let identifier = row.get(0).map(str::trim).unwrap_or_default();
        let label = row.get(1).map(str::trim).unwrap_or_default();
        if identifier.is_empty() || label.is_empty() {
            return Err(LoadError::MalformedRow {
                line,
                reason: "missing identifier or label".to_string(),
            });
        }

        let vertex = tx.add_vertex(label).await?;
        tx.set_property(&vertex, IDENTITY_KEY, identifier.into())
            .await?;

        for (column, raw) in columns.iter().zip(row.iter()).take(property_end).skip(2) {
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }
            let value = column.coerce(raw)?;
            tx.set_property(&vertex, &column.name, value).await?;
        }

        count += 1;
    }

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PropertyValue;
    use crate::schema::{self, SchemaDescriptor};
    use crate::store::{MemoryStore, StoreError};

    const NODES: &str = "\
~id,~label,code,icao:string,lat:double,elev:int,author,date\n\
id,label,STRING,STRING,DOUBLE,INT,STRING,STRING\n\
1,airport,JFK,KJFK,40.6413,13,x,2026-01-10\n\
2,airport,LAX,,33.9416,,x,2026-01-10\n\
3,country,US,,,,x,2026-01-10\n";

    #[tokio::test]
    async fn loads_rows_with_typed_properties() {
        let store = MemoryStore::new();
        let count = load_nodes(&store, NODES.as_bytes()).await.unwrap();
        assert_eq!(count, 3);
        assert_eq!(store.vertex_count().await.unwrap(), 3);

        let props = store.vertex_properties_by_identity("1").await.unwrap();
        assert_eq!(props.get("code"), Some(&PropertyValue::Text("JFK".into())));
        assert_eq!(props.get("icao"), Some(&PropertyValue::Text("KJFK".into())));
        assert_eq!(props.get("lat"), Some(&PropertyValue::Float(40.6413)));
        assert_eq!(props.get("elev"), Some(&PropertyValue::Int(13)));
        // Trailing metadata columns never become properties.
        assert!(!props.contains_key("author"));
        assert!(!props.contains_key("date"));
    }

    #[tokio::test]
    async fn empty_cells_are_omitted() {
        let store = MemoryStore::new();
        load_nodes(&store, NODES.as_bytes()).await.unwrap();

        let props = store.vertex_properties_by_identity("2").await.unwrap();
        assert!(!props.contains_key("icao"));
        assert!(!props.contains_key("elev"));
        assert_eq!(props.get("lat"), Some(&PropertyValue::Float(33.9416)));
    }

    #[tokio::test]
    async fn descriptor_row_is_not_loaded() {
        let store = MemoryStore::new();
        load_nodes(&store, NODES.as_bytes()).await.unwrap();
        assert!(store.vertex_properties_by_identity("id").await.is_none());
    }

    #[tokio::test]
    async fn parse_error_aborts_whole_load() {
        let data = "\
~id,~label,elev:int,author,date\n\
id,label,INT,STRING,STRING\n\
1,airport,13,x,d\n\
2,airport,high,x,d\n";
        let store = MemoryStore::new();
        let err = load_nodes(&store, data.as_bytes()).await.unwrap_err();
        assert!(matches!(err, LoadError::Value(_)));
        // Nothing from the aborted transaction is visible.
        assert_eq!(store.vertex_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn missing_label_is_fatal() {
        let data = "\
~id,~label,code,author,date\n\
id,label,STRING,STRING,STRING\n\
1,,JFK,x,d\n";
        let store = MemoryStore::new();
        let err = load_nodes(&store, data.as_bytes()).await.unwrap_err();
        assert!(matches!(err, LoadError::MalformedRow { line: 3, .. }));
    }

    #[tokio::test]
    async fn duplicate_identity_fails_commit() {
        let data = "\
~id,~label,code,author,date\n\
id,label,STRING,STRING,STRING\n\
1,airport,JFK,x,d\n\
1,airport,JFX,x,d\n";
        let store = MemoryStore::new();
        schema::apply(&store, &SchemaDescriptor::default())
            .await
            .unwrap();

        let err = load_nodes(&store, data.as_bytes()).await.unwrap_err();
        assert!(matches!(
            err,
            LoadError::Store(StoreError::ConstraintViolation(_))
        ));
        assert_eq!(store.vertex_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn header_only_file_loads_nothing() {
        let data = "~id,~label,code,author,date\n";
        let store = MemoryStore::new();
        let count = load_nodes(&store, data.as_bytes()).await.unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn loads_from_file_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nodes.csv");
        std::fs::write(&path, NODES).unwrap();

        let store = MemoryStore::new();
        let count = load_nodes_from_path(&store, &path).await.unwrap();
        assert_eq!(count, 3);
    }

    #[tokio::test]
    async fn missing_file_is_fatal() {
        let store = MemoryStore::new();
        let result = load_nodes_from_path(&store, "does-not-exist.csv").await;
        assert!(result.is_err());
    }
}
