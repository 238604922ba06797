//! Ingestion, hierarchy reconstruction and indexing for the gazetteer.
//!
//! Responsibilities:
//! - Parse OpenStreetMap PBF extracts into an [`ingest::OsmExtract`].
//! - Rebuild the country → settlement → district tree from boundary
//!   relations.
//! - Derive the junction, point and path datasets and push them
//!   concurrently to an index backend.
//! - Provide the SQLite index backend.
//!
//! Boundaries:
//! - Domain types and the backend trait live in `gazetteer-core`.
//! - Pushes run on Tokio's blocking pool; nothing here is async-facing.
//!
//! Invariants:
//! - The hierarchy is complete before any push starts.
//! - No global mutable state.
#![forbid(unsafe_code)]

pub mod hierarchy;
pub mod ingest;
pub mod pipeline;
mod sqlite;

pub use hierarchy::{BuildOptions, BuildReport, ExportError, build_hierarchy};
pub use ingest::{OsmExtract, OsmIngestError, OsmIngestSummary, parse_osm_pbf};
pub use pipeline::{Importer, IndexReport, PipelineError};
pub use sqlite::{SqliteIndex, SqliteIndexError};
