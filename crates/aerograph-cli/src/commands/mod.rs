//! Command implementations

pub mod load;
pub mod stats;

use aerograph_core::store::Neo4jStore;

/// Connection settings shared by all commands
pub struct Connection {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub database: Option<String>,
}

impl Connection {
    pub async fn open(&self) -> anyhow::Result<Neo4jStore> {
        let store = Neo4jStore::connect(
            &self.uri,
            &self.user,
            &self.password,
            self.database.as_deref(),
        )
        .await?;
        Ok(store)
    }
}
