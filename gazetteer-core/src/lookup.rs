//! Forward search and reverse geocoding over a populated index and the
//! in-memory hierarchy.

use std::sync::Arc;

use log::debug;

use crate::index::{IndexBackend, IndexError, SearchHit};
use crate::{Hierarchy, Place, Point};

/// Read-only query surface over one ingestion run's outputs.
///
/// Reverse geocoding only reads the hierarchy, so it can be served as soon
/// as the hierarchy is built, even while index pushes are still running.
#[derive(Debug)]
pub struct LookupService<B: ?Sized> {
    backend: Arc<B>,
    hierarchy: Arc<Hierarchy>,
}

impl<B> LookupService<B>
where
    B: IndexBackend + ?Sized,
{
    /// Create a service over a backend and a built hierarchy.
    pub const fn new(backend: Arc<B>, hierarchy: Arc<Hierarchy>) -> Self {
        Self { backend, hierarchy }
    }

    /// Free-text search delegated to the index backend.
    ///
    /// Blank queries return no results without touching the backend.
    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, IndexError> {
        let trimmed = query.trim();
        if trimmed.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }
        let hits = self.backend.search(trimmed, limit)?;
        debug!("search {trimmed:?} returned {} hits", hits.len());
        Ok(hits)
    }

    /// Smallest administrative entity containing `point`, if any.
    #[must_use]
    pub fn reverse_geocode(&self, point: &Point) -> Option<Place> {
        self.hierarchy.locate(point)
    }

    /// The hierarchy this service answers from.
    #[must_use]
    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }
}
