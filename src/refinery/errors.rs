use thiserror::Error;

// * Unified error type for the extraction pipeline.
// * Per-table failures are absorbed into warnings at the table boundary;
// * only document-level failures surface here, and only when the caller
// * opted into propagation.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Document parse failed: {0}")]
    DocumentParse(String),

    #[error("Table {0} failed: {1}")]
    Table(usize, String),
}
