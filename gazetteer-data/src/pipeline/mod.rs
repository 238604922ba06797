//! Orchestrates one indexing run: schema, hierarchy, then three concurrent
//! dataset pushes.
//!
//! The hierarchy is built synchronously inside [`Importer::start`] and is
//! complete before any push begins. The pushes share the parsed extract and
//! the backend by reference count only; they never touch each other's
//! output.

mod datasets;
mod group;

use std::sync::Arc;

use gazetteer_core::index::{Dataset, IndexBackend, IndexError};
use gazetteer_core::{Hierarchy, LookupService};
use log::info;
use thiserror::Error;
use tokio::runtime::Runtime;
use tokio::task::JoinError;

use crate::hierarchy::{BuildOptions, BuildReport, build_hierarchy};
use crate::ingest::OsmExtract;

pub use datasets::{junction_documents, path_documents, point_documents};
pub use group::TaskGroup;

/// Errors raised while running the indexing pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The Tokio runtime driving the pushes could not be built.
    #[error("failed to build Tokio runtime")]
    Runtime(#[source] std::io::Error),
    /// A backend operation failed.
    #[error("index operation failed")]
    Index(#[from] IndexError),
    /// A push task panicked before reporting a result.
    #[error("{dataset} push task panicked")]
    TaskPanicked {
        /// Dataset whose push panicked.
        dataset: Dataset,
        /// Join error carrying the panic payload.
        #[source]
        source: JoinError,
    },
    /// A task was cancelled by its runtime.
    #[error("push task did not complete")]
    Join(#[source] JoinError),
    /// `wait` was called before `start`, or twice.
    #[error("no indexing run in progress")]
    NotStarted,
    /// `start` was called twice on one importer.
    #[error("importer was already started")]
    AlreadyStarted,
}

/// Document counts written by one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexReport {
    /// Junction documents written.
    pub junctions: usize,
    /// Point documents written.
    pub points: usize,
    /// Path documents written.
    pub paths: usize,
}

impl IndexReport {
    fn from_counts(counts: Vec<(Dataset, usize)>) -> Self {
        let mut report = Self::default();
        for (dataset, count) in counts {
            match dataset {
                Dataset::Junctions => report.junctions = count,
                Dataset::Points => report.points = count,
                Dataset::Paths => report.paths = count,
            }
        }
        report
    }
}

/// Runs one ingestion: hierarchy reconstruction followed by concurrent
/// pushes of the junction, point and path datasets.
///
/// # Examples
/// ```no_run
/// use std::path::Path;
/// use std::sync::Arc;
///
/// use gazetteer_data::hierarchy::BuildOptions;
/// use gazetteer_data::ingest::parse_osm_pbf;
/// use gazetteer_data::pipeline::Importer;
/// use gazetteer_data::SqliteIndex;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let extract = parse_osm_pbf(Path::new("kyrgyzstan.osm.pbf"))?;
/// let backend = Arc::new(SqliteIndex::new("index.db"));
/// let mut importer = Importer::new(backend, extract, BuildOptions::new("Kyrgyzstan"))?;
/// importer.start()?;
/// let report = importer.wait()?;
/// println!("{} junctions indexed", report.junctions);
/// # Ok(())
/// # }
/// ```
pub struct Importer<B: ?Sized> {
    backend: Arc<B>,
    extract: Arc<OsmExtract>,
    options: BuildOptions,
    runtime: Runtime,
    hierarchy: Option<Arc<Hierarchy>>,
    group: Option<TaskGroup>,
}

impl<B: ?Sized> std::fmt::Debug for Importer<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Importer")
            .field("options", &self.options)
            .field("runtime", &"<tokio::runtime::Runtime>")
            .field("started", &self.hierarchy.is_some())
            .field("pending_tasks", &self.group.as_ref().map_or(0, TaskGroup::len))
            .finish_non_exhaustive()
    }
}

impl<B> Importer<B>
where
    B: IndexBackend + ?Sized + 'static,
{
    /// Prepare a run over `extract`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Runtime`] if the Tokio runtime fails to build.
    pub fn new(
        backend: Arc<B>,
        extract: impl Into<Arc<OsmExtract>>,
        options: BuildOptions,
    ) -> Result<Self, PipelineError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .thread_name("gazetteer-index")
            .enable_all()
            .build()
            .map_err(PipelineError::Runtime)?;
        Ok(Self {
            backend,
            extract: extract.into(),
            options,
            runtime,
            hierarchy: None,
            group: None,
        })
    }

    /// Ensure the index schema, build the hierarchy, then launch the three
    /// pushes and return without waiting for them.
    ///
    /// # Errors
    ///
    /// Fails when the schema cannot be prepared; no push is launched then.
    pub fn start(&mut self) -> Result<BuildReport, PipelineError> {
        if self.hierarchy.is_some() {
            return Err(PipelineError::AlreadyStarted);
        }
        self.backend.ensure_schema()?;

        let (hierarchy, report) = build_hierarchy(&self.extract, &self.options);
        self.hierarchy = Some(Arc::new(hierarchy));

        let mut group = TaskGroup::new(self.runtime.handle().clone());
        let (backend, extract) = (Arc::clone(&self.backend), Arc::clone(&self.extract));
        group.spawn(Dataset::Junctions, move || {
            backend.push_junctions(&junction_documents(&extract))
        });
        let (backend, extract) = (Arc::clone(&self.backend), Arc::clone(&self.extract));
        group.spawn(Dataset::Points, move || {
            backend.push_points(&point_documents(&extract))
        });
        let (backend, extract) = (Arc::clone(&self.backend), Arc::clone(&self.extract));
        group.spawn(Dataset::Paths, move || {
            backend.push_paths(&path_documents(&extract))
        });
        self.group = Some(group);
        Ok(report)
    }

    /// Block until every push has finished.
    ///
    /// # Errors
    ///
    /// Returns the first push failure after all pushes have completed, or
    /// [`PipelineError::NotStarted`] when no run is in flight.
    pub fn wait(&mut self) -> Result<IndexReport, PipelineError> {
        let group = self.group.take().ok_or(PipelineError::NotStarted)?;
        let counts = self.runtime.block_on(group.wait())?;
        let report = IndexReport::from_counts(counts);
        info!(
            "indexed {} junctions, {} points, {} paths",
            report.junctions, report.points, report.paths
        );
        Ok(report)
    }

    /// Drop every managed index.
    ///
    /// # Errors
    ///
    /// Returns the backend's failure.
    pub fn teardown(&self) -> Result<(), PipelineError> {
        self.backend.delete_indices()?;
        info!("deleted search indices");
        Ok(())
    }

    /// The hierarchy built by [`Importer::start`].
    #[must_use]
    pub fn hierarchy(&self) -> Option<Arc<Hierarchy>> {
        self.hierarchy.clone()
    }

    /// Lookup service over this run's backend and hierarchy, available as
    /// soon as [`Importer::start`] returns.
    #[must_use]
    pub fn lookup(&self) -> Option<LookupService<B>> {
        self.hierarchy
            .clone()
            .map(|hierarchy| LookupService::new(Arc::clone(&self.backend), hierarchy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gazetteer_core::Point;
    use gazetteer_core::index::Tags;
    use gazetteer_core::test_support::MemoryIndex;
    use rstest::{fixture, rstest};

    use crate::ingest::{AreaKind, Member};

    fn named(pairs: &[(&str, &str)]) -> Tags {
        pairs
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect()
    }

    #[fixture]
    fn extract() -> OsmExtract {
        OsmExtract::builder()
            .node(1, 40.0, 70.0, Tags::new())
            .node(2, 45.0, 70.0, Tags::new())
            .node(3, 45.0, 80.0, Tags::new())
            .node(4, 40.0, 80.0, Tags::new())
            .node(5, 42.0, 74.0, named(&[("name", "Ala-Too Square")]))
            .node(6, 42.0, 75.0, Tags::new())
            .path(10, vec![1, 2, 3, 4], Tags::new())
            .path(11, vec![5, 6], named(&[("highway", "primary"), ("name", "Chuy Avenue")]))
            .path(12, vec![6, 4], named(&[("highway", "primary"), ("name", "Manas Avenue")]))
            .relation(
                AreaKind::Country,
                100,
                named(&[("name", "Kyrgyzstan")]),
                vec![Member::Path(10)],
            )
            .build()
    }

    #[rstest]
    fn runs_schema_hierarchy_and_pushes(extract: OsmExtract) {
        let backend = Arc::new(MemoryIndex::default());
        let mut importer = Importer::new(
            Arc::clone(&backend),
            extract,
            BuildOptions::new("Kyrgyzstan"),
        )
        .expect("runtime");

        let build = importer.start().expect("start");
        assert_eq!(build.countries, 1);
        assert!(backend.schema_ready());

        let report = importer.wait().expect("pushes succeed");
        assert_eq!(
            report,
            IndexReport {
                junctions: 1,
                points: 1,
                paths: 2
            }
        );
        assert_eq!(backend.len(Dataset::Points), 1);
    }

    #[rstest]
    fn lookups_are_served_from_the_built_hierarchy(extract: OsmExtract) {
        let mut importer = Importer::new(
            Arc::new(MemoryIndex::default()),
            extract,
            BuildOptions::new("Kyrgyzstan"),
        )
        .expect("runtime");
        assert!(importer.lookup().is_none());

        importer.start().expect("start");
        let lookup = importer.lookup().expect("hierarchy built");
        let place = lookup.reverse_geocode(&Point::new(42.0, 74.0));
        assert_eq!(place.map(|place| place.name().to_owned()), Some("Kyrgyzstan".into()));
        importer.wait().expect("pushes succeed");
    }

    #[rstest]
    fn push_failure_surfaces_from_wait(extract: OsmExtract) {
        let backend = Arc::new(MemoryIndex::failing_on(Dataset::Paths));
        let mut importer = Importer::new(
            Arc::clone(&backend),
            extract,
            BuildOptions::new("Kyrgyzstan"),
        )
        .expect("runtime");
        importer.start().expect("start");

        let err = importer.wait().expect_err("paths push fails");
        assert!(matches!(
            err,
            PipelineError::Index(IndexError::Push {
                dataset: Dataset::Paths,
                ..
            })
        ));
        assert_eq!(backend.len(Dataset::Points), 1);
        assert_eq!(backend.len(Dataset::Junctions), 1);
    }

    #[rstest]
    fn wait_before_start_is_rejected(extract: OsmExtract) {
        let mut importer = Importer::new(
            Arc::new(MemoryIndex::default()),
            extract,
            BuildOptions::new("Kyrgyzstan"),
        )
        .expect("runtime");
        assert!(matches!(importer.wait(), Err(PipelineError::NotStarted)));
        importer.start().expect("start");
        assert!(matches!(importer.start(), Err(PipelineError::AlreadyStarted)));
        importer.wait().expect("first wait");
        assert!(matches!(importer.wait(), Err(PipelineError::NotStarted)));
    }

    #[rstest]
    fn teardown_drops_indices(extract: OsmExtract) {
        let backend = Arc::new(MemoryIndex::default());
        let mut importer = Importer::new(
            Arc::clone(&backend),
            extract,
            BuildOptions::new("Kyrgyzstan"),
        )
        .expect("runtime");
        importer.start().expect("start");
        importer.wait().expect("pushes succeed");

        importer.teardown().expect("teardown");
        assert!(!backend.schema_ready());
        assert_eq!(backend.len(Dataset::Points), 0);
    }
}
