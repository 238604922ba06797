//! Core domain types for the gazetteer.
//!
//! Responsibilities:
//! - Geometry primitives and the point-in-polygon predicate.
//! - The derived country → settlement → district hierarchy.
//! - The containment strategy used to nest boundaries.
//! - The search index abstraction and the lookup service built on it.
//!
//! Boundaries:
//! - No file formats or storage engines (those live in `gazetteer-data`).
//!
//! Invariants:
//! - Geometry never fails: malformed rings degrade to "contains nothing".
//! - Built hierarchies are immutable and safe to share across threads.

#![forbid(unsafe_code)]

pub mod containment;
pub mod geometry;
pub mod hierarchy;
pub mod index;
pub mod lookup;
#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-support")))]
pub mod test_support;

pub use containment::{ContainmentStrategy, RepresentativePoint};
pub use geometry::{Point, Polygon};
pub use hierarchy::{Country, District, Hierarchy, Place, Settlement};
pub use index::{IndexBackend, IndexError};
pub use lookup::LookupService;
