//! Search index abstraction fed by the indexing pipeline.
//!
//! The [`IndexBackend`] trait lists every operation the ingestion core and
//! the lookup service invoke on the search backend. Implementations must be
//! safe to share between threads: the pipeline pushes the three datasets
//! concurrently against a single backend instance.

mod documents;
mod error;

pub use documents::{Dataset, JunctionDocument, PathDocument, PointDocument, SearchHit, Tags};
pub use error::{BoxError, IndexError};

/// Operations the ingestion pipeline and lookup service need from a search
/// backend.
///
/// Each push receives the whole dataset for one run and reports a single
/// outcome for the batch: the number of documents written, or an error.
/// Pushes are invoked at most once per dataset per run and never retried.
///
/// # Examples
///
/// ```rust
/// use gazetteer_core::index::{
///     IndexBackend, IndexError, JunctionDocument, PathDocument, PointDocument, SearchHit,
/// };
///
/// struct NullIndex;
///
/// impl IndexBackend for NullIndex {
///     fn ensure_schema(&self) -> Result<(), IndexError> { Ok(()) }
///     fn push_junctions(&self, docs: &[JunctionDocument]) -> Result<usize, IndexError> {
///         Ok(docs.len())
///     }
///     fn push_points(&self, docs: &[PointDocument]) -> Result<usize, IndexError> {
///         Ok(docs.len())
///     }
///     fn push_paths(&self, docs: &[PathDocument]) -> Result<usize, IndexError> {
///         Ok(docs.len())
///     }
///     fn delete_indices(&self) -> Result<(), IndexError> { Ok(()) }
///     fn search(&self, _query: &str, _limit: usize) -> Result<Vec<SearchHit>, IndexError> {
///         Ok(Vec::new())
///     }
/// }
///
/// assert!(NullIndex.search("Bishkek", 10).unwrap().is_empty());
/// ```
pub trait IndexBackend: Send + Sync {
    /// Create or update every managed index. Must be idempotent.
    fn ensure_schema(&self) -> Result<(), IndexError>;

    /// Write the road-junction dataset.
    fn push_junctions(&self, docs: &[JunctionDocument]) -> Result<usize, IndexError>;

    /// Write the raw point dataset.
    fn push_points(&self, docs: &[PointDocument]) -> Result<usize, IndexError>;

    /// Write the raw path dataset.
    fn push_paths(&self, docs: &[PathDocument]) -> Result<usize, IndexError>;

    /// Drop every managed index.
    fn delete_indices(&self) -> Result<(), IndexError>;

    /// Return at most `limit` documents matching `query`, best match first.
    ///
    /// Ranking is left to the backend.
    fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, IndexError>;
}

/// Relevance bucket of `name` for `query`, lower is better.
///
/// Comparison is case-insensitive: `0` for an exact match, `1` for a
/// prefix match, `2` for a substring match, `None` otherwise. Backends that
/// rank in memory share this ordering with the SQLite backend's `ORDER BY`.
#[must_use]
pub fn match_rank(name: &str, query: &str) -> Option<u8> {
    let name = name.to_lowercase();
    let query = query.to_lowercase();
    if name == query {
        Some(0)
    } else if name.starts_with(&query) {
        Some(1)
    } else if name.contains(&query) {
        Some(2)
    } else {
        None
    }
}
