//! Application state for the extraction server

use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::error::Result;
use crate::extraction::ExtractionPipeline;
use crate::ingestion::{PdfParser, TextExtractor};
use crate::processing::UploadQueue;
use crate::providers::{LlmProvider, OpenAiClient};
use crate::storage::RecordStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: AppConfig,
    /// Extraction pipeline used by `/extract` and the queue worker
    pipeline: Arc<ExtractionPipeline>,
    /// Batch upload queue
    queue: Arc<UploadQueue>,
    /// Record store
    store: Arc<RecordStore>,
    /// Ready state
    ready: RwLock<bool>,
}

impl AppState {
    /// Create application state with the production components
    pub fn new(config: AppConfig) -> Result<Self> {
        tracing::info!("Initializing application state...");

        let store = Arc::new(RecordStore::new(&config.database.path)?);
        let extractor = Arc::new(PdfParser::new(Duration::from_secs(
            config.extraction.pdf_parse_timeout_secs,
        )));
        let llm = Arc::new(OpenAiClient::new(&config.llm)?);
        tracing::info!("LLM provider: {} ({})", llm.name(), llm.model());

        Ok(Self::with_components(config, extractor, llm, store))
    }

    /// Create application state from explicit components
    pub fn with_components(
        config: AppConfig,
        extractor: Arc<dyn TextExtractor>,
        llm: Arc<dyn LlmProvider>,
        store: Arc<RecordStore>,
    ) -> Self {
        let pipeline = Arc::new(ExtractionPipeline::new(
            extractor,
            llm,
            Arc::clone(&store),
            &config.extraction,
        ));
        let queue = UploadQueue::new(
            pipeline.clone(),
            Duration::from_secs(config.queue.job_retention_secs),
        );

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pipeline,
                queue,
                store,
                ready: RwLock::new(true),
            }),
        }
    }

    /// Get configuration
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Get the extraction pipeline
    pub fn pipeline(&self) -> &Arc<ExtractionPipeline> {
        &self.inner.pipeline
    }

    /// Get the upload queue
    pub fn queue(&self) -> &Arc<UploadQueue> {
        &self.inner.queue
    }

    /// Get the record store
    pub fn store(&self) -> &Arc<RecordStore> {
        &self.inner.store
    }

    /// Check if ready
    pub fn is_ready(&self) -> bool {
        *self.inner.ready.read()
    }

    /// Set ready state
    pub fn set_ready(&self, ready: bool) {
        *self.inner.ready.write() = ready;
    }
}
