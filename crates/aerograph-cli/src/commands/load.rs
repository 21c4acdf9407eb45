//! Load command implementation

use super::Connection;
use aerograph_core::loader::{load_edges_from_path, load_nodes_from_path};
use aerograph_core::schema::{self, SchemaDescriptor};
use aerograph_core::store::{GraphStore, MemoryStore};
use std::time::Instant;

pub async fn run(
    schema_path: &str,
    nodes_path: &str,
    edges_path: &str,
    batch_size: usize,
    dry_run: bool,
    connection: &Connection,
) -> anyhow::Result<()> {
    let descriptor = SchemaDescriptor::from_path(schema_path)?;

    if dry_run {
        println!("Dry run: loading into an in-process store\n");
        let store = MemoryStore::new();
        load(&store, &descriptor, nodes_path, edges_path, batch_size).await?;
        println!("{}", store.stats().await);
    } else {
        let store = connection.open().await?;
        load(&store, &descriptor, nodes_path, edges_path, batch_size).await?;
    }

    Ok(())
}

async fn load<S: GraphStore>(
    store: &S,
    descriptor: &SchemaDescriptor,
    nodes_path: &str,
    edges_path: &str,
    batch_size: usize,
) -> anyhow::Result<()> {
    let report = schema::apply(store, descriptor).await?;
    println!("{report}");

    let start = Instant::now();

    let vertices = load_nodes_from_path(store, nodes_path).await?;
    println!("Loaded {vertices} vertices from {nodes_path}");

    let stats = load_edges_from_path(store, edges_path, batch_size).await?;
    println!("{stats}");

    println!("Load finished in {:.2?}\n", start.elapsed());
    println!("Total vertices: {}", store.vertex_count().await?);
    println!("Total edges:    {}", store.edge_count().await?);

    Ok(())
}
