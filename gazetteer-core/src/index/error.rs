use thiserror::Error;

use super::Dataset;

/// Type-erased error raised by a concrete backend.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by [`crate::index::IndexBackend`] operations.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Creating or updating the managed indices failed.
    #[error("failed to prepare index schema: {source}")]
    Schema {
        /// Backend error.
        #[source]
        source: BoxError,
    },
    /// A bulk push failed; the whole batch is considered failed.
    #[error("failed to push {dataset} documents: {source}")]
    Push {
        /// Dataset whose push failed.
        dataset: Dataset,
        /// Backend error.
        #[source]
        source: BoxError,
    },
    /// Dropping the managed indices failed.
    #[error("failed to delete indices: {source}")]
    Delete {
        /// Backend error.
        #[source]
        source: BoxError,
    },
    /// A forward search failed.
    #[error("search for {query:?} failed: {source}")]
    Search {
        /// Query text as received.
        query: String,
        /// Backend error.
        #[source]
        source: BoxError,
    },
}

impl IndexError {
    /// Build a [`IndexError::Push`] from any backend error.
    pub fn push<E>(dataset: Dataset, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::Push {
            dataset,
            source: source.into(),
        }
    }
}
