use quire_core::ReportError;
use quire_data::DataFactoryError;
use thiserror::Error;

/// Errors of the command-line front end and the batch runner.
#[derive(Error, Debug)]
pub enum QuireError {
    #[error("Report failed: {0}")]
    Report(#[from] ReportError),

    #[error("Invalid data: {0}")]
    Data(#[from] DataFactoryError),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
