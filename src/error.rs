//! Error types for the retrieval and answer pipeline

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Empty input: no usable tokens in '{0}'")]
    EmptyInput(String),

    #[error("Full-text index '{0}' is not available; run `graph_rag init-index` first")]
    IndexUnavailable(String),

    #[error("Condensation error: {0}")]
    Condensation(String),

    #[error("Retrieval error: {0}")]
    Retrieval(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Graph store error: {0}")]
    GraphStore(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Entity extraction error: {0}")]
    Extraction(String),

    #[error("OpenAI API error: {0}")]
    OpenAiError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl Error {
    /// Errors that must reach the caller even when another retrieval path succeeded.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::IndexUnavailable(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<neo4rs::Error> for Error {
    fn from(err: neo4rs::Error) -> Self {
        Error::GraphStore(err.to_string())
    }
}

impl From<qdrant_client::QdrantError> for Error {
    fn from(err: qdrant_client::QdrantError) -> Self {
        Error::VectorStore(err.to_string())
    }
}

impl From<async_openai::error::OpenAIError> for Error {
    fn from(err: async_openai::error::OpenAIError) -> Self {
        Error::OpenAiError(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_empty_input() {
        let err = Error::EmptyInput("&&".to_string());
        assert!(err.to_string().contains("Empty input"));
        assert!(err.to_string().contains("&&"));
    }

    #[test]
    fn test_error_display_index_unavailable() {
        let err = Error::IndexUnavailable("entity".to_string());
        let msg = err.to_string();
        assert!(msg.contains("'entity'"));
        assert!(msg.contains("init-index"));
    }

    #[test]
    fn test_error_display_pipeline_kinds() {
        assert!(Error::Condensation("timeout".into())
            .to_string()
            .contains("Condensation error: timeout"));
        assert!(Error::Retrieval("both paths failed".into())
            .to_string()
            .contains("Retrieval error"));
        assert!(Error::Generation("rate limit".into())
            .to_string()
            .contains("Generation error: rate limit"));
    }

    #[test]
    fn test_only_index_unavailable_is_fatal() {
        assert!(Error::IndexUnavailable("entity".into()).is_fatal());
        assert!(!Error::GraphStore("boom".into()).is_fatal());
        assert!(!Error::VectorStore("boom".into()).is_fatal());
        assert!(!Error::EmptyInput(String::new()).is_fatal());
    }

    #[test]
    fn test_error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::IoError(_)));
        assert!(err.to_string().contains("IO error"));
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<Vec<String>>("not json").unwrap_err();
        let err: Error = json_err.into();

        assert!(matches!(err, Error::SerializationError(_)));
        assert!(err.to_string().contains("Serialization error"));
    }

    #[test]
    fn test_error_all_variants_debug() {
        let variants: Vec<Error> = vec![
            Error::EmptyInput("x".to_string()),
            Error::IndexUnavailable("entity".to_string()),
            Error::Condensation("c".to_string()),
            Error::Retrieval("r".to_string()),
            Error::Generation("g".to_string()),
            Error::GraphStore("neo4j".to_string()),
            Error::VectorStore("qdrant".to_string()),
            Error::Extraction("schema".to_string()),
            Error::OpenAiError("openai".to_string()),
            Error::SerializationError("serial".to_string()),
            Error::InvalidArgument("arg".to_string()),
            Error::ConnectionError("conn".to_string()),
        ];

        for err in variants {
            let debug_str = format!("{:?}", err);
            assert!(!debug_str.is_empty());
            assert!(!err.to_string().is_empty());
        }
    }
}
