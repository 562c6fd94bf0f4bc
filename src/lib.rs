pub mod config;
pub mod engine;
pub mod refinery;

pub use refinery::{ExtractionResult, ExtractorConfig, SpecExtractor};
