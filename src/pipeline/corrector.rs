//! Conditional query correction
//!
//! A drafted query is only re-submitted when it contains the row-limiting
//! marker. This is a literal substring test, not a SQL parse; drafts
//! without the marker pass through byte-for-byte unchanged.

use crate::pipeline::client::CompletionProvider;
use crate::pipeline::error::PipelineResult;
use crate::pipeline::prompt::{PromptBuilder, SamplingParams};
use tracing::debug;

/// Row-limiting keyword that signals a draft needing a rewrite
pub const CORRECTION_MARKER: &str = "LIMIT";

pub struct QueryCorrector {
    params: SamplingParams,
}

impl QueryCorrector {
    pub fn new(params: SamplingParams) -> Self {
        Self { params }
    }

    /// Whether a draft trips the correction marker
    pub fn needs_correction(sql: &str) -> bool {
        sql.contains(CORRECTION_MARKER)
    }

    /// Correct a draft through the provider when the marker is present;
    /// otherwise return the draft unchanged without a service call
    pub async fn correct(
        &self,
        provider: &dyn CompletionProvider,
        draft: String,
    ) -> PipelineResult<String> {
        if !Self::needs_correction(&draft) {
            return Ok(draft);
        }

        debug!("draft contains the row-limiting marker, requesting correction");
        let prompt = PromptBuilder::correction(&draft);
        provider.complete(&prompt, self.params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::prompt::ChatPrompt;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        calls: Arc<AtomicUsize>,
        reply: String,
    }

    #[async_trait]
    impl CompletionProvider for CountingProvider {
        async fn complete(
            &self,
            _prompt: &ChatPrompt,
            _params: SamplingParams,
        ) -> PipelineResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.reply.clone())
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    fn corrector() -> QueryCorrector {
        QueryCorrector::new(SamplingParams {
            temperature: 0.2,
            seed: Some(1),
        })
    }

    #[tokio::test]
    async fn draft_without_marker_passes_through_unchanged() {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = CountingProvider {
            calls: Arc::clone(&calls),
            reply: "unused".to_string(),
        };

        let draft = "SELECT TOP 5 * FROM Holdings ORDER BY MarketValue DESC".to_string();
        let corrected = corrector()
            .correct(&provider, draft.clone())
            .await
            .unwrap();

        assert_eq!(corrected, draft);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn draft_with_marker_is_corrected() {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = CountingProvider {
            calls: Arc::clone(&calls),
            reply: "SELECT TOP 5 * FROM Holdings".to_string(),
        };

        let corrected = corrector()
            .correct(&provider, "SELECT * FROM Holdings LIMIT 5".to_string())
            .await
            .unwrap();

        assert_eq!(corrected, "SELECT TOP 5 * FROM Holdings");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn marker_test_is_a_literal_substring_check() {
        assert!(QueryCorrector::needs_correction("SELECT x FROM t LIMIT 10"));
        // lowercase does not trip the marker
        assert!(!QueryCorrector::needs_correction("select x from t limit 10"));
        assert!(!QueryCorrector::needs_correction("SELECT TOP 10 x FROM t"));
    }
}
