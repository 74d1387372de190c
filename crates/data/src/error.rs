use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataFactoryError {
    #[error("No query named '{0}' is defined")]
    QueryNotFound(String),

    #[error("Query '{query}' failed: {message}")]
    QueryFailed { query: String, message: String },

    #[error("Data factory is not open")]
    NotOpen,

    #[error("Invalid table data: {0}")]
    InvalidData(String),
}
