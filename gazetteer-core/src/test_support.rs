//! In-memory `IndexBackend` used by unit and behaviour tests.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::index::{
    Dataset, IndexBackend, IndexError, JunctionDocument, PathDocument, PointDocument, SearchHit,
    match_rank,
};

#[derive(Debug, Default)]
struct Documents {
    junctions: Vec<JunctionDocument>,
    points: Vec<PointDocument>,
    paths: Vec<PathDocument>,
    schema_ready: bool,
}

/// In-memory `IndexBackend` implementation used in tests.
///
/// Searches perform a linear scan and are intended only for small datasets.
/// A dataset can be configured to fail its push to exercise error paths.
#[derive(Debug, Default)]
pub struct MemoryIndex {
    documents: Mutex<Documents>,
    failing: Option<Dataset>,
}

#[derive(Debug, thiserror::Error)]
#[error("injected failure for {0}")]
struct InjectedFailure(Dataset);

impl MemoryIndex {
    /// Create an index whose push for `dataset` always fails.
    #[must_use]
    pub fn failing_on(dataset: Dataset) -> Self {
        Self {
            documents: Mutex::default(),
            failing: Some(dataset),
        }
    }

    /// Whether `ensure_schema` has been called since the last deletion.
    #[must_use]
    pub fn schema_ready(&self) -> bool {
        self.lock().schema_ready
    }

    /// Number of stored documents in `dataset`.
    #[must_use]
    pub fn len(&self, dataset: Dataset) -> usize {
        let documents = self.lock();
        match dataset {
            Dataset::Junctions => documents.junctions.len(),
            Dataset::Points => documents.points.len(),
            Dataset::Paths => documents.paths.len(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Documents> {
        self.documents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn check(&self, dataset: Dataset) -> Result<(), IndexError> {
        match self.failing {
            Some(failing) if failing == dataset => {
                Err(IndexError::push(dataset, InjectedFailure(dataset)))
            }
            _ => Ok(()),
        }
    }
}

impl IndexBackend for MemoryIndex {
    fn ensure_schema(&self) -> Result<(), IndexError> {
        self.lock().schema_ready = true;
        Ok(())
    }

    fn push_junctions(&self, docs: &[JunctionDocument]) -> Result<usize, IndexError> {
        self.check(Dataset::Junctions)?;
        self.lock().junctions.extend_from_slice(docs);
        Ok(docs.len())
    }

    fn push_points(&self, docs: &[PointDocument]) -> Result<usize, IndexError> {
        self.check(Dataset::Points)?;
        self.lock().points.extend_from_slice(docs);
        Ok(docs.len())
    }

    fn push_paths(&self, docs: &[PathDocument]) -> Result<usize, IndexError> {
        self.check(Dataset::Paths)?;
        self.lock().paths.extend_from_slice(docs);
        Ok(docs.len())
    }

    fn delete_indices(&self) -> Result<(), IndexError> {
        *self.lock() = Documents::default();
        Ok(())
    }

    fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, IndexError> {
        let documents = self.lock();
        let junctions = documents.junctions.iter().map(|doc| SearchHit {
            dataset: Dataset::Junctions,
            id: doc.id,
            name: doc.name.clone(),
            location: doc.location,
        });
        let points = documents.points.iter().map(|doc| SearchHit {
            dataset: Dataset::Points,
            id: doc.id,
            name: doc.name.clone(),
            location: doc.location,
        });
        let paths = documents.paths.iter().map(|doc| SearchHit {
            dataset: Dataset::Paths,
            id: doc.id,
            name: doc.name.clone(),
            location: doc.location,
        });
        let mut ranked: Vec<(u8, SearchHit)> = junctions
            .chain(points)
            .chain(paths)
            .filter_map(|hit| match_rank(&hit.name, query).map(|rank| (rank, hit)))
            .collect();
        ranked.sort_by(|(lhs_rank, lhs), (rhs_rank, rhs)| {
            lhs_rank
                .cmp(rhs_rank)
                .then_with(|| lhs.name.chars().count().cmp(&rhs.name.chars().count()))
                .then_with(|| lhs.id.cmp(&rhs.id))
        });
        Ok(ranked.into_iter().take(limit).map(|(_, hit)| hit).collect())
    }
}
