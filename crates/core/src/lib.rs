pub mod cells;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod header;
pub mod ingest;
pub mod models;
pub mod normalize;
pub mod parser;
pub mod query;
pub mod retrieval;
pub mod session;
pub mod stores;
pub mod summary;
pub mod traits;

pub use cells::{is_empty_like, is_mixed};
pub use config::{EmbeddingConfig, EmbeddingMode, SessionConfig};
pub use embeddings::{CharacterNgramEmbedder, Embedder, RemoteEmbedder, DEFAULT_EMBEDDING_DIMENSIONS};
pub use error::{IngestError, SearchError};
pub use header::{locate_header, locate_header_with, HeaderLocation, HeaderStrategy};
pub use ingest::{discover_sheet_files, ingest_file, ingest_files, IngestionReport};
pub use models::{
    CellValue, FailedFile, FieldAlias, FileInput, FileResult, FileSource, Grid, HeaderOptions,
    ProcessedFile, Provenance, QueryOptions, Record, RetrievalDocument, SearchHit,
};
pub use normalize::{header_names, normalize};
pub use parser::{parse_grid, DelimitedParser, SheetFormat, SheetParser, WorkbookParser};
pub use query::{keyword_search, FieldResolution, IdentifierQuery, QueryEngine};
pub use retrieval::{IndexStatus, RetrievalIndex};
pub use session::Session;
pub use stores::InMemoryVectorStore;
pub use summary::{summarize, DataSummary, FileSummary};
pub use traits::VectorIndex;
