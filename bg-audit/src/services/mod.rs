//! External capability adapters
//!
//! Each adapter sits behind a trait so the workflow can be exercised with
//! in-process fakes. Timeouts, retries and backoff live here, never in the
//! workflow engine.

pub mod embedding_client;
pub mod media_downloader;
pub mod reasoning_client;
pub mod rule_retriever;
pub mod video_extractor;
pub mod video_indexer;

pub use embedding_client::{AzureEmbeddingClient, EmbeddingError};
pub use media_downloader::{DownloadError, MediaDownloader, YtDlpDownloader};
pub use reasoning_client::{AzureChatClient, ReasoningError, ReasoningModel};
pub use rule_retriever::{AzureSearchRetriever, RetrieverError, RulePassage, RuleRetriever};
pub use video_extractor::{ExtractedContent, ExtractionError, VideoExtractor, VideoIndexerExtractor};
pub use video_indexer::{extract_insights, AzureVideoIndexerClient, VideoIndexer, VideoIndexerError};
