//! Data ingestion, alignment and the persisted merged table.

pub mod align;
pub mod canonicalize;
pub mod error;
pub mod ingest;
pub mod loader;
pub mod merged_table;
pub mod schema;

pub use align::{align, Alignment, UnmatchedPolicy};
pub use canonicalize::{index_sentiment, DuplicatePolicy, SentimentIndex};
pub use error::{DataError, SchemaError, ValidationError};
pub use ingest::{ingest_sentiment, ingest_trades, SentimentLog, SourceTable, TradeLog};
pub use loader::{
    merge_files, InputHashes, LoaderColumns, LoaderConfig, MergeOutput, MergeReport,
};
pub use merged_table::{manifest_path, read_merged, write_atomic, write_merged, MergeManifest};
pub use schema::{SentimentColumns, TableContract, TradeColumns};
