use crate::{RetrievalDocument, SearchError, SearchHit};

/// A similarity-search backend over retrieval documents.
pub trait VectorIndex: Send + Sync {
    /// Replaces everything held by the index with `documents`.
    fn rebuild(&mut self, documents: &[RetrievalDocument]) -> Result<(), SearchError>;

    /// Most similar documents first, at most `top_k`.
    fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchHit>, SearchError>;
}
