//! Append-only session log of successful queries
//!
//! One JSON object per line, `{"<user_query>": "<generated_sql>"}`. The log
//! is never read back by this process.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use tracing::warn;

pub struct SessionLogger {
    path: PathBuf,
}

impl SessionLogger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Append one entry; failures are traced and dropped, never surfaced
    pub fn record(&self, user_query: &str, generated_sql: &str) {
        if let Err(e) = self.append(user_query, generated_sql) {
            warn!(error = %e, path = %self.path.display(), "failed to append session log entry");
        }
    }

    fn append(&self, user_query: &str, generated_sql: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut entry = serde_json::Map::new();
        entry.insert(
            user_query.to_string(),
            serde_json::Value::String(generated_sql.to_string()),
        );

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", serde_json::Value::Object(entry))?;
        Ok(())
    }
}
