//! Offline schema dump tool
//!
//! Reflects a table's column/type list from the database's
//! INFORMATION_SCHEMA view and merges it into the table definitions file
//! under a human-supplied description. Runs as a separate offline process;
//! there is no locking on the definitions file, last writer wins.

use clap::Parser;
use querychat::config::Config;
use querychat::executor::{ConnectionProvider, DirectConnectionProvider};
use querychat::schema::{SchemaStore, TableDefinition};
use sqlx::Row;
use std::collections::BTreeMap;
use std::error::Error;
use std::path::Path;
use std::process::ExitCode;

/// Dump a table's column/type structure into the table definitions file
#[derive(Parser, Debug)]
#[command(name = "dump-tables")]
#[command(version, long_about = None)]
#[command(about = "Reflect a table's columns into the table definitions file")]
struct Args {
    /// Name of the database
    #[arg(long)]
    database: String,

    /// Name of the table
    #[arg(short, long)]
    table: String,

    /// Detailed description of the table. Make it understandable to the AI
    /// so that the result produced would be accurate; mention the behaviour
    /// of the fields on each record
    #[arg(short, long)]
    description: String,

    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    match run(&args).await {
        Ok(path) => {
            println!(
                "---Your {}.{} table has been dumped to {} successfully---",
                args.database, args.table, path
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("dump-tables: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &Args) -> Result<String, Box<dyn Error>> {
    let config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let provider = DirectConnectionProvider::new(&config.db);
    let mut conn = provider.acquire().await?;

    let rows = sqlx::query(
        r#"
        SELECT COLUMN_NAME, DATA_TYPE
        FROM INFORMATION_SCHEMA.COLUMNS
        WHERE TABLE_SCHEMA = ?
          AND TABLE_NAME = ?
        ORDER BY ORDINAL_POSITION
        "#,
    )
    .bind(&args.database)
    .bind(&args.table)
    .fetch_all(&mut conn)
    .await?;

    if rows.is_empty() {
        return Err(format!("no columns found for {}.{}", args.database, args.table).into());
    }

    let get_string_value = |row: &sqlx::mysql::MySqlRow, index: usize| -> String {
        if let Ok(val) = row.try_get::<String, _>(index) {
            val
        } else if let Ok(bytes) = row.try_get::<Vec<u8>, _>(index) {
            String::from_utf8_lossy(&bytes).to_string()
        } else {
            "unknown".to_string()
        }
    };

    let mut fields = BTreeMap::new();
    for row in &rows {
        fields.insert(get_string_value(row, 0), get_string_value(row, 1));
    }

    // merge: unrelated tables and the intent mapping are preserved
    let path = Path::new(&config.table_definitions_path);
    let mut store = if path.exists() {
        SchemaStore::load(path)?
    } else {
        SchemaStore::default()
    };

    store.tables.insert(
        args.table.clone(),
        TableDefinition {
            description: args.description.clone(),
            fields,
        },
    );
    store.save(path)?;

    Ok(config.table_definitions_path.clone())
}
