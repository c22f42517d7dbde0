//! Mock server errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MockError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid request JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("No route for {0}")]
    NotFound(String),

    #[error("Invalid model {0:?}, expected solid, empty, stop:N or recolor:ID")]
    InvalidModel(String),
}

impl MockError {
    /// HTTP status reported to the client
    pub fn status(&self) -> (u16, &'static str) {
        match self {
            MockError::NotFound(_) => (404, "Not Found"),
            MockError::Io(_) => (500, "Internal Server Error"),
            _ => (400, "Bad Request"),
        }
    }
}
