//! End-to-end extraction: PDF bytes to a stored, flattened record

use async_trait::async_trait;
use futures_util::future::try_join_all;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::config::ExtractionConfig;
use crate::error::{Error, Result};
use crate::ingestion::{ChunkPlanner, ExtractedText, TextExtractor};
use crate::processing::JobProcessor;
use crate::providers::LlmProvider;
use crate::storage::RecordStore;
use crate::types::{ExtractedRecord, UploadedFile};

use super::flatten::flatten_for_csv;
use super::merge::chunk_envelope;

/// Message for texts too short to be a text-layer PDF
pub const TEXT_TOO_SHORT_MESSAGE: &str = "PDF text extraction failed - extracted text is too short. \
     This might be a scanned PDF that requires OCR.";

/// Extraction pipeline shared by the single-file route and the upload queue
pub struct ExtractionPipeline {
    extractor: Arc<dyn TextExtractor>,
    llm: Arc<dyn LlmProvider>,
    store: Arc<RecordStore>,
    planner: ChunkPlanner,
    min_text_chars: usize,
}

impl ExtractionPipeline {
    pub fn new(
        extractor: Arc<dyn TextExtractor>,
        llm: Arc<dyn LlmProvider>,
        store: Arc<RecordStore>,
        config: &ExtractionConfig,
    ) -> Self {
        Self {
            extractor,
            llm,
            store,
            planner: ChunkPlanner::new(config.single_shot_limit, config.chunk_size),
            min_text_chars: config.min_text_chars,
        }
    }

    /// The LLM provider in use
    pub fn llm(&self) -> &Arc<dyn LlmProvider> {
        &self.llm
    }

    /// Extract, flatten and store one uploaded PDF.
    ///
    /// Failures before the insert come back as `Error::Extraction`; store
    /// failures come back unchanged. Nothing is stored on failure.
    pub async fn process(&self, file: &UploadedFile) -> Result<ExtractedRecord> {
        tracing::info!(
            "Extracting '{}' ({} bytes)",
            file.file_name,
            file.data.len()
        );

        let structured = self
            .extract_structured(file)
            .await
            .map_err(Error::into_extraction_failure)?;

        let before = Value::Object(structured.clone());
        tracing::debug!("Structured data before flattening: {}", before);
        let flat = flatten_for_csv(&structured);
        let after = Value::Object(flat.clone());
        tracing::debug!("Flattened data: {}", after);

        let record = ExtractedRecord::new(file.file_name.clone(), flat);
        self.store.insert(&record)?;

        tracing::info!(
            "Stored record {} for '{}' ({} fields)",
            record.id,
            record.file_name,
            record.extracted_content.len()
        );
        Ok(record)
    }

    /// Text extraction, chunk planning and LLM calls, without flattening
    async fn extract_structured(&self, file: &UploadedFile) -> Result<Map<String, Value>> {
        let text = self.extract_text(file).await?;

        let trimmed = text.content.trim();
        if trimmed.chars().count() < self.min_text_chars {
            tracing::warn!(
                "Only {} characters extracted from '{}'",
                trimmed.chars().count(),
                file.file_name
            );
            return Err(Error::pdf_parse(&file.file_name, TEXT_TOO_SHORT_MESSAGE));
        }

        let chunks = self.planner.plan(&text.content);
        if chunks.len() == 1 {
            return self.llm.extract_structured(chunks[0]).await;
        }

        tracing::info!(
            "Document '{}' is large ({} chars), processing {} chunks",
            file.file_name,
            text.char_count(),
            chunks.len()
        );

        let total = chunks.len();
        let results = try_join_all(chunks.iter().enumerate().map(|(i, chunk)| {
            tracing::debug!("Processing chunk {}/{}", i + 1, total);
            self.llm.extract_structured(chunk)
        }))
        .await?;

        tracing::info!("Merging {} chunk results", results.len());
        Ok(chunk_envelope(results))
    }

    /// Run the blocking text extractor off the async runtime
    async fn extract_text(&self, file: &UploadedFile) -> Result<ExtractedText> {
        let extractor = Arc::clone(&self.extractor);
        let file_name = file.file_name.clone();
        let data = file.data.clone();

        let text = tokio::task::spawn_blocking(move || extractor.extract(&file_name, &data))
            .await
            .map_err(|e| Error::internal(format!("Text extraction task failed: {}", e)))??;

        tracing::info!(
            "Extracted {} characters from '{}' ({} pages)",
            text.char_count(),
            file.file_name,
            text.total_pages.map_or_else(|| "unknown".to_string(), |p| p.to_string())
        );
        tracing::debug!(
            "Text preview: {}",
            text.content.chars().take(500).collect::<String>()
        );

        Ok(text)
    }
}

#[async_trait]
impl JobProcessor for ExtractionPipeline {
    async fn process(&self, file: &UploadedFile) -> Result<ExtractedRecord> {
        ExtractionPipeline::process(self, file).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use parking_lot::Mutex;
    use serde_json::json;

    struct FixedText(String);

    impl TextExtractor for FixedText {
        fn extract(&self, _filename: &str, _data: &[u8]) -> Result<ExtractedText> {
            Ok(ExtractedText {
                content: self.0.clone(),
                total_pages: Some(1),
            })
        }
    }

    /// Returns `{"len": <chars>, "part": [<call number>]}` per call
    #[derive(Default)]
    struct EchoLlm {
        calls: Mutex<Vec<usize>>,
        fail_on_call: Option<usize>,
    }

    #[async_trait]
    impl LlmProvider for EchoLlm {
        async fn extract_structured(&self, text: &str) -> Result<Map<String, Value>> {
            let call = {
                let mut calls = self.calls.lock();
                calls.push(text.chars().count());
                calls.len()
            };
            if self.fail_on_call == Some(call) {
                return Err(Error::llm("No content received from the model"));
            }
            let value = json!({"len": text.chars().count(), "part": [call]});
            Ok(value.as_object().cloned().unwrap_or_default())
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "echo"
        }

        fn model(&self) -> &str {
            "echo-1"
        }
    }

    fn pipeline(text: String, llm: Arc<EchoLlm>) -> (ExtractionPipeline, Arc<RecordStore>) {
        let store = Arc::new(RecordStore::in_memory().unwrap());
        let pipeline = ExtractionPipeline::new(
            Arc::new(FixedText(text)),
            llm,
            store.clone(),
            &ExtractionConfig::default(),
        );
        (pipeline, store)
    }

    fn upload() -> UploadedFile {
        UploadedFile::new("doc.pdf", Some("application/pdf".into()), Bytes::from_static(b"%PDF"))
    }

    #[tokio::test]
    async fn test_single_shot_is_flattened_and_stored() {
        let llm = Arc::new(EchoLlm::default());
        let (pipeline, store) = pipeline("a".repeat(500), llm.clone());

        let record = pipeline.process(&upload()).await.unwrap();
        assert_eq!(record.extracted_content["len"], 500);
        assert_eq!(record.extracted_content["part"], "1");
        assert_eq!(*llm.calls.lock(), vec![500]);
        assert_eq!(store.get(&record.id).unwrap().unwrap(), record);
    }

    #[tokio::test]
    async fn test_large_text_uses_chunk_envelope() {
        let llm = Arc::new(EchoLlm::default());
        let (pipeline, _store) = pipeline("b".repeat(170_000), llm.clone());

        let record = pipeline.process(&upload()).await.unwrap();
        let content = &record.extracted_content;

        assert_eq!(llm.calls.lock().len(), 3);
        assert_eq!(content["document_info_total_chunks"], 3);
        assert_eq!(
            content["document_info_processing_note"],
            "Large document processed in multiple chunks"
        );
        // Three numbers in "len" conflict, "part" arrays concatenate
        assert_eq!(content["merged_data_len"], 80_000);
        assert!(content.contains_key("merged_data_len_chunk_2"));
        assert!(content.contains_key("merged_data_len_chunk_3"));
        assert!(content["chunks"].as_str().unwrap().contains("\"len\""));
        assert!(content.values().all(|v| !v.is_array() && !v.is_object()));
    }

    #[tokio::test]
    async fn test_short_text_fails_without_storing() {
        let llm = Arc::new(EchoLlm::default());
        let (pipeline, store) = pipeline(format!("  {}  ", "x".repeat(99)), llm.clone());

        let err = pipeline.process(&upload()).await.unwrap_err();
        assert!(matches!(err, Error::Extraction { timed_out: false, .. }));
        assert!(err.to_string().contains("OCR"));
        assert!(err.to_string().starts_with("Failed to extract data from PDF: "));
        assert!(llm.calls.lock().is_empty());
        assert_eq!(store.count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_one_failing_chunk_fails_document() {
        let llm = Arc::new(EchoLlm {
            fail_on_call: Some(2),
            ..Default::default()
        });
        let (pipeline, store) = pipeline("c".repeat(170_000), llm);

        let err = pipeline.process(&upload()).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to extract data from PDF: No content received from the model"
        );
        assert_eq!(store.count().unwrap(), 0);
    }
}
