//! Aerograph CLI - Graph bulk loader
//!
//! Applies a JSON schema descriptor and bulk-loads vertex and edge CSV
//! files into a graph database in batched transactions.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "aerograph")]
#[command(about = "Bulk-load a graph database from a schema descriptor and CSV files")]
#[command(version)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Bolt connection URI (default: 127.0.0.1:7687)
    #[arg(long, global = true, env = "AEROGRAPH_DB_URI")]
    db_uri: Option<String>,

    /// Database user
    #[arg(long, global = true, env = "AEROGRAPH_DB_USER", default_value = "neo4j")]
    db_user: String,

    /// Database password
    #[arg(long, global = true, env = "AEROGRAPH_DB_PASSWORD", default_value = "neo4j")]
    db_password: String,

    /// Target database name (server default when omitted)
    #[arg(long, global = true, env = "AEROGRAPH_DB_NAME")]
    database: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply the schema, then load node and edge CSV files
    Load {
        /// Node CSV file
        nodes: String,

        /// Edge CSV file
        edges: String,

        /// Schema descriptor JSON file
        #[arg(long, default_value = "data/schema.json")]
        schema: String,

        /// Edge rows per transaction
        #[arg(long, default_value_t = 100)]
        batch_size: usize,

        /// Validate schema and CSV files against an in-process store
        /// instead of a server
        #[arg(long)]
        dry_run: bool,
    },

    /// Show vertex and edge counts of the target graph
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let connection = commands::Connection {
        uri: cli
            .db_uri
            .unwrap_or_else(|| "127.0.0.1:7687".to_string()),
        user: cli.db_user,
        password: cli.db_password,
        database: cli.database,
    };

    match cli.command {
        Commands::Load {
            nodes,
            edges,
            schema,
            batch_size,
            dry_run,
        } => {
            commands::load::run(&schema, &nodes, &edges, batch_size, dry_run, &connection).await
        }
        Commands::Stats => commands::stats::run(&connection).await,
    }
}
