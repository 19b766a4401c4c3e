use crate::config::SessionConfig;
use crate::ingest::ingest_files;
use crate::models::{FileInput, FileResult, Record};
use crate::query::QueryEngine;
use crate::retrieval::{IndexStatus, RetrievalIndex};
use crate::summary::{summarize, DataSummary};
use crate::SearchError;
use indexmap::IndexMap;
use tracing::info;

/// Everything one caller has ingested, plus the index built over it.
///
/// Ingestion replaces the previous batch in full. Callers serialize
/// ingestion; queries only read.
pub struct Session {
    config: SessionConfig,
    engine: QueryEngine,
    results: IndexMap<String, FileResult>,
    records: Vec<Record>,
    retrieval: RetrievalIndex,
}

impl Session {
    pub fn new(config: SessionConfig) -> Result<Self, SearchError> {
        let retrieval = RetrievalIndex::from_config(&config.embedding);
        Self::with_retrieval(config, retrieval)
    }

    pub fn with_retrieval(
        config: SessionConfig,
        retrieval: RetrievalIndex,
    ) -> Result<Self, SearchError> {
        let engine = QueryEngine::new(config.query.clone())?;
        Ok(Self {
            config,
            engine,
            results: IndexMap::new(),
            records: Vec::new(),
            retrieval,
        })
    }

    pub fn process_files(
        &mut self,
        files: impl IntoIterator<Item = FileInput>,
    ) -> &IndexMap<String, FileResult> {
        let report = ingest_files(files, &self.config.header);
        let records = report.flatten_records();
        self.retrieval.rebuild(&records);

        info!(
            files = report.results.len(),
            failed = report.failed().count(),
            total_records = records.len(),
            "ingestion finished"
        );

        self.results = report.results;
        self.records = records;
        &self.results
    }

    pub fn query(&self, question: &str) -> String {
        self.engine.answer(&self.records, &self.retrieval, question)
    }

    pub fn summary(&self) -> DataSummary {
        summarize(&self.records)
    }

    pub fn results(&self) -> &IndexMap<String, FileResult> {
        &self.results
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn retrieval_status(&self) -> &IndexStatus {
        self.retrieval.status()
    }

    pub fn clear(&mut self) {
        self.results.clear();
        self.records.clear();
        self.retrieval.rebuild(&[]);
    }
}
