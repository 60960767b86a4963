use thiserror::Error;

#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum Error {
    #[error("Graph vertex not found: {0}")]
    GraphVertexNotFound(usize),

    #[error("Graph edge not found: ({0}, {1})")]
    GraphEdgeNotFound(usize, usize),

    #[error("Malformed program representation: {0}")]
    MalformedIr(String),

    #[error("Custom error: {0}")]
    Custom(String),
}

impl From<&str> for Error {
    fn from(error: &str) -> Error {
        Error::Custom(error.to_string())
    }
}

impl From<String> for Error {
    fn from(error: String) -> Error {
        Error::Custom(error)
    }
}
