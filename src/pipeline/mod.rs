//! Natural-language-to-SQL pipeline
//!
//! Turns a user utterance into an executed query:
//! resolve table → draft → correct → execute → log.
//!
//! Two entry points exist. [`QueryPipeline::run_intent`] resolves a single
//! table from the declared intent mapping; [`QueryPipeline::run_special`]
//! hands the model the full schema plus a stricter aggregation policy and
//! lets it pick the table(s) and joins itself.
//!
//! # Usage
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use querychat::config::Config;
//! use querychat::pipeline::BlockingPipeline;
//!
//! let config = Config::load()?;
//! let pipeline = BlockingPipeline::from_config(&config)?;
//! let outcome = pipeline.run_special("The mandateId is 37007, looking for AUM in 2024")?;
//! # Ok(()) }
//! ```

pub mod client;
pub mod corrector;
pub mod error;
pub mod prompt;

pub use client::{CompletionProvider, OpenAiProvider};
pub use corrector::{CORRECTION_MARKER, QueryCorrector};
pub use error::{PipelineError, PipelineResult};
pub use prompt::{ChatPrompt, PromptBuilder, SamplingParams};

use crate::config::Config;
use crate::executor::{DatabaseExecutor, DirectConnectionProvider, QueryOutcome, SqlExecutor};
use crate::schema::SchemaStore;
use crate::session_log::SessionLogger;
use tracing::{debug, info};

/// Orchestrates drafting, correction, execution, and logging
pub struct QueryPipeline {
    store: SchemaStore,
    provider: Box<dyn CompletionProvider>,
    executor: Box<dyn SqlExecutor>,
    logger: SessionLogger,
    draft_params: SamplingParams,
    special_params: SamplingParams,
    corrector: QueryCorrector,
}

impl QueryPipeline {
    pub fn new(
        store: SchemaStore,
        provider: Box<dyn CompletionProvider>,
        executor: Box<dyn SqlExecutor>,
        logger: SessionLogger,
        draft_params: SamplingParams,
        special_params: SamplingParams,
        correction_params: SamplingParams,
    ) -> Self {
        Self {
            store,
            provider,
            executor,
            logger,
            draft_params,
            special_params,
            corrector: QueryCorrector::new(correction_params),
        }
    }

    /// Wire up the pipeline from configuration
    pub fn from_config(config: &Config) -> PipelineResult<Self> {
        config
            .validate()
            .map_err(|e| PipelineError::Configuration(e.to_string()))?;

        let store = SchemaStore::load(&config.table_definitions_path)?;
        let provider = client::create_provider(&config.model)?;
        let executor = DatabaseExecutor::new(
            Box::new(DirectConnectionProvider::new(&config.db)),
            config.query_timeout_secs,
        );
        let logger = SessionLogger::new(&config.session_log_path);

        Ok(Self::new(
            store,
            provider,
            Box::new(executor),
            logger,
            config.model.draft,
            config.model.special,
            config.model.correction,
        ))
    }

    /// Per-intent flow: resolve one table and draft against it
    ///
    /// An unresolved intent (or a mapping to an unknown table) produces
    /// [`QueryOutcome::NoQuery`] without calling the model or the database.
    pub async fn run_intent(
        &self,
        intent: &str,
        user_query: &str,
        user_id: &str,
    ) -> PipelineResult<QueryOutcome> {
        let Some(table) = self.store.resolve_table(intent) else {
            info!(intent, "no table mapped for intent, skipping draft");
            return Ok(QueryOutcome::NoQuery);
        };

        let Some(definition) = self.store.table_definition(table) else {
            info!(intent, table, "intent maps to an undefined table, skipping draft");
            return Ok(QueryOutcome::NoQuery);
        };

        let prompt = PromptBuilder::draft(user_query, user_id, table, definition);
        self.finish(user_query, prompt, self.draft_params).await
    }

    /// Special flow: full schema plus the aggregation policy; the model
    /// picks the table(s) and joins itself
    pub async fn run_special(&self, user_query: &str) -> PipelineResult<QueryOutcome> {
        if self.store.all_tables().is_empty() {
            info!("no table definitions available, skipping draft");
            return Ok(QueryOutcome::NoQuery);
        }

        let prompt = PromptBuilder::special(user_query, self.store.all_tables());
        self.finish(user_query, prompt, self.special_params).await
    }

    /// Shared tail of both flows: draft → correct → execute → log
    ///
    /// Successful non-empty results append one entry to the session log;
    /// the append is fire-and-forget.
    async fn finish(
        &self,
        user_query: &str,
        prompt: ChatPrompt,
        params: SamplingParams,
    ) -> PipelineResult<QueryOutcome> {
        let draft = self.provider.complete(&prompt, params).await?;
        let sql = self.corrector.correct(self.provider.as_ref(), draft).await?;
        debug!(%sql, "generated query");

        let outcome = self.executor.execute(&sql).await;

        if let Some(set) = outcome.rows() {
            if !set.is_empty() {
                self.logger.record(user_query, &sql);
            }
        }

        Ok(outcome)
    }
}

/// Blocking facade over the async pipeline for script entry points
///
/// Owns a private current-thread runtime; must not be used from within an
/// existing Tokio runtime.
pub struct BlockingPipeline {
    inner: QueryPipeline,
    runtime: tokio::runtime::Runtime,
}

impl BlockingPipeline {
    pub fn from_config(config: &Config) -> PipelineResult<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let inner = QueryPipeline::from_config(config)?;
        Ok(Self { inner, runtime })
    }

    pub fn run_intent(
        &self,
        intent: &str,
        user_query: &str,
        user_id: &str,
    ) -> PipelineResult<QueryOutcome> {
        self.runtime
            .block_on(self.inner.run_intent(intent, user_query, user_id))
    }

    pub fn run_special(&self, user_query: &str) -> PipelineResult<QueryOutcome> {
        self.runtime.block_on(self.inner.run_special(user_query))
    }
}
