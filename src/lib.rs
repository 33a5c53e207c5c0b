//! # Brevis
//!
//! A CLI application for summarising webpages and video transcripts using LLMs.
//!
//! ## Features
//!
//! - **Strategy-aware extraction**: article text for regular pages, full transcripts for video pages
//! - **Cache-aside storage**: summaries persist in sled keyed by URL, with tantivy full-text search
//! - **Enriched results**: each summary carries its token usage and related articles found by similarity search

pub mod agent;
pub mod config;
pub mod extract;
pub mod pipeline;
pub mod related;
pub mod scraper;
pub mod search;
pub mod storage;
pub mod summary;
pub mod transcript;

pub use config::Config;
pub use pipeline::Pipeline;
pub use search::SearchIndex;
pub use storage::Storage;
pub use summary::Summary;
