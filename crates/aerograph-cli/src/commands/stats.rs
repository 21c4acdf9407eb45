//! Stats command implementation

use super::Connection;
use aerograph_core::store::GraphStore;

pub async fn run(connection: &Connection) -> anyhow::Result<()> {
    let store = connection.open().await?;

    println!("Total vertices: {}", store.vertex_count().await?);
    println!("Total edges:    {}", store.edge_count().await?);

    Ok(())
}
