//! Error types for the conduit composition system.

use std::sync::Arc;

use thiserror::Error;

use crate::core::types::TypeTag;

/// The main error type for building and running pipelines.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// A transformer cannot be grouped with a passthrough, because items
    /// passed through unchanged would not be valid products of the group
    #[error(
        "{conduit} is not a valid concurrent conduit with a passthrough because its \
         input type {input} is not a subtype of its product type {product}"
    )]
    PassthroughType {
        conduit: String,
        input: TypeTag,
        product: TypeTag,
    },

    /// The input types of concurrent branches have no common subtype
    #[error("no common subtype exists for types [{}]", join_tags(.tags))]
    NoCommonSubtype { tags: Vec<TypeTag> },

    /// A producer failed to generate an item
    #[error("Producer error: {0}")]
    Producer(Arc<dyn std::error::Error + Send + Sync>),

    /// A transformer failed to transform an item
    #[error("Transformer error: {0}")]
    Transformer(Arc<dyn std::error::Error + Send + Sync>),

    /// A consumer failed to process an item
    #[error("Consumer error: {0}")]
    Consumer(Arc<dyn std::error::Error + Send + Sync>),

    /// Waiting for the next item timed out
    #[error("Operation timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// A custom error with a message
    #[error("{0}")]
    Custom(String),
}

fn join_tags(tags: &[TypeTag]) -> String {
    tags.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

// Convenience constructors
impl Error {
    /// Create a producer error from any error type
    pub fn producer<E: std::error::Error + Send + Sync + 'static>(error: E) -> Self {
        Error::Producer(Arc::new(error))
    }

    /// Create a transformer error from any error type
    pub fn transformer<E: std::error::Error + Send + Sync + 'static>(error: E) -> Self {
        Error::Transformer(Arc::new(error))
    }

    /// Create a consumer error from any error type
    pub fn consumer<E: std::error::Error + Send + Sync + 'static>(error: E) -> Self {
        Error::Consumer(Arc::new(error))
    }

    /// Create a timeout error
    pub fn timeout(duration_ms: u64) -> Self {
        Error::Timeout { duration_ms }
    }

    /// Create a custom error with a message
    pub fn custom<S: Into<String>>(message: S) -> Self {
        Error::Custom(message.into())
    }

    /// Whether this error was raised while composing conduits, as opposed to
    /// while running them
    pub fn is_composition_error(&self) -> bool {
        matches!(
            self,
            Error::PassthroughType { .. } | Error::NoCommonSubtype { .. }
        )
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Custom(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Custom(s.to_string())
    }
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, Error>;

/// Helper trait for converting foreign errors into our Error type
pub trait IntoError<T> {
    fn into_producer_error(self) -> Result<T>;
    fn into_transformer_error(self) -> Result<T>;
    fn into_consumer_error(self) -> Result<T>;
}

impl<T, E> IntoError<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn into_producer_error(self) -> Result<T> {
        self.map_err(Error::producer)
    }

    fn into_transformer_error(self) -> Result<T> {
        self.map_err(Error::transformer)
    }

    fn into_consumer_error(self) -> Result<T> {
        self.map_err(Error::consumer)
    }
}
