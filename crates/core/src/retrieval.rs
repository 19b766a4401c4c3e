use crate::config::{EmbeddingConfig, EmbeddingMode};
use crate::embeddings::{CharacterNgramEmbedder, RemoteEmbedder};
use crate::stores::InMemoryVectorStore;
use crate::traits::VectorIndex;
use crate::{Record, RetrievalDocument, SearchError, SearchHit};
use tracing::{info, warn};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexStatus {
    /// No similarity backend was configured or it failed to initialize.
    Disabled(String),
    /// The backend failed while indexing the current records.
    Unavailable(String),
    Empty,
    Ready { documents: usize },
}

/// Similarity search over the current record store, with an explicit status
/// so callers can take the keyword path when it is not ready.
pub struct RetrievalIndex {
    backend: Option<Box<dyn VectorIndex>>,
    status: IndexStatus,
}

impl RetrievalIndex {
    pub fn new(backend: Box<dyn VectorIndex>) -> Self {
        Self {
            backend: Some(backend),
            status: IndexStatus::Empty,
        }
    }

    pub fn disabled(reason: impl Into<String>) -> Self {
        Self {
            backend: None,
            status: IndexStatus::Disabled(reason.into()),
        }
    }

    pub fn from_config(config: &EmbeddingConfig) -> Self {
        let index = match config.effective_mode() {
            EmbeddingMode::Disabled | EmbeddingMode::Auto => {
                Self::disabled("no embedding backend configured")
            }
            EmbeddingMode::Local => Self::new(Box::new(InMemoryVectorStore::new(
                CharacterNgramEmbedder::default(),
            ))),
            EmbeddingMode::Remote => match remote_backend(config) {
                Ok(backend) => Self::new(backend),
                Err(error) => Self::disabled(error.to_string()),
            },
        };

        match &index.status {
            IndexStatus::Disabled(reason) => {
                warn!(reason = %reason, "similarity search disabled, using keyword search")
            }
            _ => info!(mode = ?config.effective_mode(), "similarity search enabled"),
        }
        index
    }

    pub fn status(&self) -> &IndexStatus {
        &self.status
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.status, IndexStatus::Ready { .. })
    }

    /// Drops whatever was indexed and indexes one document per record.
    pub fn rebuild(&mut self, records: &[Record]) {
        let Some(backend) = self.backend.as_mut() else {
            return;
        };
        self.status = IndexStatus::Empty;

        let documents: Vec<RetrievalDocument> = records.iter().map(RetrievalDocument::from).collect();

        match backend.rebuild(&documents) {
            Ok(()) if documents.is_empty() => {}
            Ok(()) => {
                info!(documents = documents.len(), "built retrieval index");
                self.status = IndexStatus::Ready {
                    documents: documents.len(),
                };
            }
            Err(error) => {
                warn!(error = %error, "retrieval index unavailable, using keyword search");
                self.status = IndexStatus::Unavailable(error.to_string());
            }
        }
    }

    pub fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchHit>, SearchError> {
        match (&self.status, &self.backend) {
            (IndexStatus::Ready { .. }, Some(backend)) => backend.search(query, top_k),
            (IndexStatus::Disabled(reason) | IndexStatus::Unavailable(reason), _) => {
                Err(SearchError::NotReady(reason.clone()))
            }
            _ => Err(SearchError::NotReady("index is empty".to_string())),
        }
    }
}

fn remote_backend(config: &EmbeddingConfig) -> Result<Box<dyn VectorIndex>, SearchError> {
    let api_key = config.api_key.clone().ok_or_else(|| {
        SearchError::EmbeddingUnavailable("remote embeddings need an API key".to_string())
    })?;
    let endpoint = Url::parse(&config.endpoint)?;
    let embedder = RemoteEmbedder::new(endpoint, config.model.clone(), api_key);
    Ok(Box::new(InMemoryVectorStore::new(embedder)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Provenance;

    struct FailingBackend;

    impl VectorIndex for FailingBackend {
        fn rebuild(&mut self, _documents: &[RetrievalDocument]) -> Result<(), SearchError> {
            Err(SearchError::EmbeddingUnavailable("model failed to load".to_string()))
        }

        fn search(&self, _query: &str, _top_k: usize) -> Result<Vec<SearchHit>, SearchError> {
            Ok(Vec::new())
        }
    }

    fn record(name: &str) -> Record {
        Record {
            fields: [("Name".to_string(), name.to_string())].into_iter().collect(),
            provenance: Provenance {
                file_id: "file_1".to_string(),
                filename: "agents.csv".to_string(),
                row_offset: 0,
                source_row: 1,
            },
        }
    }

    #[test]
    fn no_credential_disables_search() {
        let index = RetrievalIndex::from_config(&EmbeddingConfig::default());
        assert!(matches!(index.status(), IndexStatus::Disabled(_)));
        assert!(index.search("anything", 3).is_err());
    }

    #[test]
    fn bad_endpoint_disables_search() {
        let config = EmbeddingConfig {
            mode: EmbeddingMode::Remote,
            api_key: Some("secret".to_string()),
            endpoint: "not a url".to_string(),
            ..EmbeddingConfig::default()
        };

        let index = RetrievalIndex::from_config(&config);
        assert!(matches!(index.status(), IndexStatus::Disabled(_)));
    }

    #[test]
    fn local_index_becomes_ready_after_rebuild() -> Result<(), SearchError> {
        let config = EmbeddingConfig {
            mode: EmbeddingMode::Local,
            ..EmbeddingConfig::default()
        };
        let mut index = RetrievalIndex::from_config(&config);
        assert_eq!(index.status(), &IndexStatus::Empty);

        index.rebuild(&[record("Alice"), record("Bob")]);
        assert_eq!(index.status(), &IndexStatus::Ready { documents: 2 });

        let hits = index.search("Bob", 1)?;
        assert_eq!(hits[0].document.text, "Record from agents.csv:\nName: Bob");

        index.rebuild(&[]);
        assert_eq!(index.status(), &IndexStatus::Empty);
        Ok(())
    }

    #[test]
    fn backend_failure_marks_index_unavailable() {
        let mut index = RetrievalIndex::new(Box::new(FailingBackend));
        index.rebuild(&[record("Alice")]);

        assert!(matches!(index.status(), IndexStatus::Unavailable(_)));
        assert!(matches!(index.search("Alice", 3), Err(SearchError::NotReady(_))));
    }
}
