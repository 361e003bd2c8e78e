use thiserror::Error;

#[derive(Debug, Error)]
pub enum SignError {
    #[error("DOM not available")]
    DomUnavailable,
    #[error("Element not found: {0}")]
    ElementNotFound(String),
    #[error("Canvas context unavailable")]
    NoContext2d,
    #[error("Operation failed: {0}")]
    OpFailed(String),
    #[error("Network request failed: {0}")]
    Network(String),
    #[error("Unreadable server response: {0}")]
    BadResponse(String),
}
