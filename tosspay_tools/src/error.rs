use thiserror::Error;

#[derive(Debug, Error)]
pub enum TossPayApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Payment provider unreachable: {0}")]
    Unreachable(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
}
