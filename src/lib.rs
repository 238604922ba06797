//! Facade crate for the gazetteer.
//!
//! This crate re-exports the core domain types: geometry, the derived
//! administrative hierarchy, the search index abstraction and the lookup
//! service. Ingestion and the SQLite backend live in `gazetteer-data`.

#![forbid(unsafe_code)]

pub use gazetteer_core::{
    ContainmentStrategy, Country, District, Hierarchy, IndexBackend, IndexError, LookupService,
    Place, Point, Polygon, RepresentativePoint, Settlement,
};

pub use gazetteer_core::index::{
    Dataset, JunctionDocument, PathDocument, PointDocument, SearchHit, Tags,
};

#[cfg(feature = "test-support")]
pub use gazetteer_core::test_support::MemoryIndex;
