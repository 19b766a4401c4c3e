use crate::embeddings::{cosine_similarity, Embedder};
use crate::traits::VectorIndex;
use crate::{RetrievalDocument, SearchError, SearchHit};
use tracing::debug;

/// Brute-force cosine search over embedded documents held in memory.
pub struct InMemoryVectorStore<E: Embedder> {
    embedder: E,
    entries: Vec<(RetrievalDocument, Vec<f32>)>,
}

impl<E: Embedder> InMemoryVectorStore<E> {
    pub fn new(embedder: E) -> Self {
        Self {
            embedder,
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<E: Embedder> VectorIndex for InMemoryVectorStore<E> {
    fn rebuild(&mut self, documents: &[RetrievalDocument]) -> Result<(), SearchError> {
        self.entries.clear();

        let mut entries = Vec::with_capacity(documents.len());
        for document in documents {
            let vector = self
                .embedder
                .embed(&document.text)
                .map_err(|error| SearchError::EmbeddingUnavailable(error.to_string()))?;
            entries.push((document.clone(), vector));
        }

        debug!(documents = entries.len(), "vector store rebuilt");
        self.entries = entries;
        Ok(())
    }

    fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchHit>, SearchError> {
        let query_vector = self.embedder.embed(query)?;

        let mut hits: Vec<SearchHit> = self
            .entries
            .iter()
            .map(|(document, vector)| SearchHit {
                document: document.clone(),
                score: cosine_similarity(&query_vector, vector),
            })
            .collect();

        hits.sort_by(|left, right| right.score.total_cmp(&left.score));
        hits.truncate(top_k);
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::CharacterNgramEmbedder;

    fn document(text: &str, row_offset: usize) -> RetrievalDocument {
        RetrievalDocument {
            text: text.to_string(),
            filename: "agents.csv".to_string(),
            file_id: "file_1".to_string(),
            row_offset,
        }
    }

    struct BrokenEmbedder;

    impl Embedder for BrokenEmbedder {
        fn embed(&self, _text: &str) -> Result<Vec<f32>, SearchError> {
            Err(SearchError::Request("model offline".to_string()))
        }
    }

    #[test]
    fn search_ranks_closest_document_first() -> Result<(), SearchError> {
        let mut store = InMemoryVectorStore::new(CharacterNgramEmbedder::default());
        store.rebuild(&[
            document("Record from agents.csv:\nName: Alice\nDesignation: Manager", 0),
            document("Record from agents.csv:\nName: Bob\nDesignation: Clerk", 1),
        ])?;

        let hits = store.search("Bob Clerk", 1)?;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].document.row_offset, 1);
        Ok(())
    }

    #[test]
    fn rebuild_replaces_previous_documents() -> Result<(), SearchError> {
        let mut store = InMemoryVectorStore::new(CharacterNgramEmbedder::default());
        store.rebuild(&[document("old", 0), document("older", 1)])?;
        store.rebuild(&[document("new", 0)])?;

        assert_eq!(store.len(), 1);
        assert_eq!(store.search("anything", 5)?[0].document.text, "new");
        Ok(())
    }

    #[test]
    fn embedding_failure_leaves_store_empty() {
        let mut store = InMemoryVectorStore::new(BrokenEmbedder);
        let result = store.rebuild(&[document("text", 0)]);

        assert!(matches!(result, Err(SearchError::EmbeddingUnavailable(_))));
        assert!(store.is_empty());
    }
}
