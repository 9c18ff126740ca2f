//! Query execution against the configured database
//!
//! Generated SQL is executed verbatim, with no validation, parameterization,
//! or injection defense. That trust boundary is inherited from the system
//! this assistant fronts: the model output is treated as an executable
//! artifact, and the database account's privileges are the only guard.

use crate::config::DbConfig;
use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlRow};
use sqlx::types::Decimal;
use sqlx::{Column, Connection, Row};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors captured at the execution boundary
#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("query timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },
}

/// A tabular query result: named columns plus rows of display strings
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ResultSet {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Tagged outcome of one pipeline run
///
/// Callers that only need the binary contract can collapse this with
/// [`QueryOutcome::rows`]; the failure cause stays available internally.
#[derive(Debug)]
pub enum QueryOutcome {
    /// The query executed; the result set may still be empty
    Rows(ResultSet),
    /// No query was produced (unresolved intent), so nothing was executed
    NoQuery,
    /// Execution failed; the cause is logged but not surfaced to users
    Failed { cause: ExecutorError },
}

impl QueryOutcome {
    /// The result set, when execution succeeded
    pub fn rows(&self) -> Option<&ResultSet> {
        match self {
            QueryOutcome::Rows(set) => Some(set),
            _ => None,
        }
    }
}

/// Seam for acquiring database connections
///
/// The default implementation opens a fresh connection per call; a pooled
/// provider can be swapped in without touching the pipeline.
#[async_trait]
pub trait ConnectionProvider: Send + Sync {
    async fn acquire(&self) -> Result<MySqlConnection, ExecutorError>;
}

/// Opens a fresh connection per call from the configured descriptor
pub struct DirectConnectionProvider {
    options: MySqlConnectOptions,
    display_url: String,
}

impl DirectConnectionProvider {
    pub fn new(db: &DbConfig) -> Self {
        let options = MySqlConnectOptions::new()
            .host(&db.host)
            .port(db.port)
            .database(&db.database)
            .username(&db.user)
            .password(&db.password);
        Self {
            options,
            display_url: db.display_url(),
        }
    }
}

#[async_trait]
impl ConnectionProvider for DirectConnectionProvider {
    async fn acquire(&self) -> Result<MySqlConnection, ExecutorError> {
        debug!("connecting to {}", self.display_url);
        Ok(MySqlConnection::connect_with(&self.options).await?)
    }
}

/// Trait for query execution, mockable in tests
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    async fn execute(&self, sql: &str) -> QueryOutcome;
}

/// Executes generated SQL over connections from a [`ConnectionProvider`]
pub struct DatabaseExecutor {
    provider: Box<dyn ConnectionProvider>,
    timeout: Duration,
}

impl DatabaseExecutor {
    pub fn new(provider: Box<dyn ConnectionProvider>, timeout_secs: u64) -> Self {
        Self {
            provider,
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    async fn run(&self, sql: &str) -> Result<ResultSet, ExecutorError> {
        let mut conn = self.provider.acquire().await?;
        let rows = sqlx::query(sql).fetch_all(&mut conn).await?;
        conn.close().await.ok();

        if rows.is_empty() {
            return Ok(ResultSet {
                columns: Vec::new(),
                rows: Vec::new(),
            });
        }

        let columns: Vec<String> = (0..rows[0].len())
            .map(|i| rows[0].column(i).name().to_string())
            .collect();

        let data: Vec<Vec<String>> = rows
            .iter()
            .map(|row| (0..row.len()).map(|i| format_value(row, i)).collect())
            .collect();

        debug!(rows = data.len(), "query completed");
        Ok(ResultSet {
            columns,
            rows: data,
        })
    }
}

#[async_trait]
impl SqlExecutor for DatabaseExecutor {
    /// Execute a query, converting any failure into a tagged outcome
    ///
    /// Connect errors, malformed SQL, permission errors, and timeouts all
    /// collapse to `Failed`; no partial result is ever returned.
    async fn execute(&self, sql: &str) -> QueryOutcome {
        match tokio::time::timeout(self.timeout, self.run(sql)).await {
            Ok(Ok(set)) => QueryOutcome::Rows(set),
            Ok(Err(cause)) => {
                warn!(error = %cause, "query execution failed");
                QueryOutcome::Failed { cause }
            }
            Err(_) => {
                let timeout_secs = self.timeout.as_secs();
                warn!(timeout_secs, "query execution timed out");
                QueryOutcome::Failed {
                    cause: ExecutorError::Timeout { timeout_secs },
                }
            }
        }
    }
}

/// Convert one cell to its display string
fn format_value(row: &MySqlRow, index: usize) -> String {
    use sqlx::TypeInfo;
    use sqlx::ValueRef;

    if let Ok(value_ref) = row.try_get_raw(index) {
        if value_ref.is_null() {
            return String::new();
        }
    }

    if let Ok(val) = row.try_get::<i64, _>(index) {
        return val.to_string();
    }
    if let Ok(val) = row.try_get::<u64, _>(index) {
        return val.to_string();
    }
    if let Ok(val) = row.try_get::<f64, _>(index) {
        return val.to_string();
    }
    if let Ok(val) = row.try_get::<Decimal, _>(index) {
        return val.to_string();
    }
    if let Ok(val) = row.try_get::<String, _>(index) {
        return val;
    }
    if let Ok(val) = row.try_get::<bool, _>(index) {
        return if val { "1".to_string() } else { "0".to_string() };
    }
    if let Ok(val) = row.try_get::<chrono::NaiveDateTime, _>(index) {
        return val.format("%Y-%m-%d %H:%M:%S").to_string();
    }
    if let Ok(val) = row.try_get::<chrono::DateTime<chrono::Utc>, _>(index) {
        return val.format("%Y-%m-%d %H:%M:%S").to_string();
    }
    if let Ok(val) = row.try_get::<chrono::NaiveDate, _>(index) {
        return val.format("%Y-%m-%d").to_string();
    }
    if let Ok(val) = row.try_get::<chrono::NaiveTime, _>(index) {
        return val.format("%H:%M:%S").to_string();
    }
    if let Ok(bytes) = row.try_get::<Vec<u8>, _>(index) {
        if let Ok(text) = String::from_utf8(bytes.clone()) {
            return text;
        }
        return format!("\\x{}", hex::encode(bytes));
    }

    let type_name = row.column(index).type_info().name().to_string();
    format!("<{type_name}>")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_set() -> ResultSet {
        ResultSet {
            columns: vec!["MandateId".to_string(), "MarketValue".to_string()],
            rows: vec![vec!["37007".to_string(), "1250000.00".to_string()]],
        }
    }

    #[test]
    fn outcome_rows_only_for_success() {
        assert!(QueryOutcome::Rows(sample_set()).rows().is_some());
        assert!(QueryOutcome::NoQuery.rows().is_none());
        let failed = QueryOutcome::Failed {
            cause: ExecutorError::Timeout { timeout_secs: 30 },
        };
        assert!(failed.rows().is_none());
    }

    #[test]
    fn empty_result_set_is_empty() {
        let set = ResultSet {
            columns: vec!["MandateId".to_string()],
            rows: Vec::new(),
        };
        assert!(set.is_empty());
        assert!(!sample_set().is_empty());
    }

    #[test]
    fn timeout_error_names_the_limit() {
        let err = ExecutorError::Timeout { timeout_secs: 30 };
        assert_eq!(err.to_string(), "query timed out after 30s");
    }
}
