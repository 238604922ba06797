//! Read-only view over the entities collected for one ingestion run.
//!
//! Points and paths are keyed by identifier for lookup. Classified boundary
//! relations are kept as ordered sequences so that "first containing parent
//! wins" resolves identically across runs.

use std::collections::HashMap;

use gazetteer_core::Point;
use gazetteer_core::index::Tags;

use super::OsmIngestSummary;

/// Administrative level assigned to a boundary relation during parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AreaKind {
    /// Country-level boundary.
    Country,
    /// City, town, village or hamlet.
    Settlement,
    /// Subdivision of a settlement.
    District,
}

/// A resolved point with its tags.
#[derive(Debug, Clone, PartialEq)]
pub struct OsmNode {
    /// Node identifier.
    pub id: u64,
    /// Node location.
    pub location: Point,
    /// Tags carried by the node; empty for geometry-only nodes.
    pub tags: Tags,
}

/// An ordered list of point references.
#[derive(Debug, Clone, PartialEq)]
pub struct OsmPath {
    /// Way identifier.
    pub id: u64,
    /// Node references in path order.
    pub refs: Vec<u64>,
    /// Tags carried by the way; empty for geometry-only ways.
    pub tags: Tags,
}

/// One member of a boundary relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Member {
    /// Direct reference to a point.
    Point(u64),
    /// Reference to a path.
    Path(u64),
}

/// A classified boundary relation.
#[derive(Debug, Clone, PartialEq)]
pub struct OsmRelation {
    /// Relation identifier.
    pub id: u64,
    /// Relation tags, at least `name` for useful boundaries.
    pub tags: Tags,
    /// Members in relation order.
    pub members: Vec<Member>,
}

impl OsmRelation {
    /// Value of the `name` tag, or an empty string when missing.
    #[must_use]
    pub fn name(&self) -> &str {
        self.tag("name").unwrap_or_default()
    }

    /// Value of an arbitrary tag.
    #[must_use]
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }
}

/// Everything collected from one extract, ready for the hierarchy builder
/// and the indexing pipeline.
///
/// Paths exposed here are fully resolved: every point they reference is
/// present in [`OsmExtract::node`].
#[derive(Debug, Clone, Default)]
pub struct OsmExtract {
    summary: OsmIngestSummary,
    nodes: HashMap<u64, OsmNode>,
    paths: HashMap<u64, OsmPath>,
    countries: Vec<OsmRelation>,
    settlements: Vec<OsmRelation>,
    districts: Vec<OsmRelation>,
}

impl OsmExtract {
    /// Start populating an extract by hand.
    ///
    /// # Examples
    /// ```
    /// use gazetteer_data::ingest::{AreaKind, Member, OsmExtract};
    /// use gazetteer_core::index::Tags;
    ///
    /// let extract = OsmExtract::builder()
    ///     .node(1, 42.0, 74.0, Tags::new())
    ///     .relation(
    ///         AreaKind::Country,
    ///         10,
    ///         Tags::from([("name".into(), "Kyrgyzstan".into())]),
    ///         vec![Member::Point(1)],
    ///     )
    ///     .build();
    /// assert_eq!(extract.countries().len(), 1);
    /// ```
    #[must_use]
    pub fn builder() -> OsmExtractBuilder {
        OsmExtractBuilder::default()
    }

    /// Element counts gathered while parsing.
    #[must_use]
    pub const fn summary(&self) -> &OsmIngestSummary {
        &self.summary
    }

    /// Look up a node by identifier.
    #[must_use]
    pub fn node(&self, id: u64) -> Option<&OsmNode> {
        self.nodes.get(&id)
    }

    /// Location of a node, if known.
    #[must_use]
    pub fn point(&self, id: u64) -> Option<Point> {
        self.nodes.get(&id).map(|node| node.location)
    }

    /// Every resolved node.
    pub fn nodes(&self) -> impl Iterator<Item = &OsmNode> {
        self.nodes.values()
    }

    /// Look up a fully resolved path by identifier.
    #[must_use]
    pub fn path(&self, id: u64) -> Option<&OsmPath> {
        self.paths.get(&id)
    }

    /// Every fully resolved path.
    pub fn paths(&self) -> impl Iterator<Item = &OsmPath> {
        self.paths.values()
    }

    /// Country candidates in insertion order.
    #[must_use]
    pub fn countries(&self) -> &[OsmRelation] {
        &self.countries
    }

    /// Settlement candidates in insertion order.
    #[must_use]
    pub fn settlements(&self) -> &[OsmRelation] {
        &self.settlements
    }

    /// District candidates in insertion order.
    #[must_use]
    pub fn districts(&self) -> &[OsmRelation] {
        &self.districts
    }
}

/// Single-owner builder populating an [`OsmExtract`] before it is frozen.
#[derive(Debug, Default)]
pub struct OsmExtractBuilder {
    extract: OsmExtract,
}

impl OsmExtractBuilder {
    /// Add a node.
    #[must_use]
    pub fn node(mut self, id: u64, lat: f64, lon: f64, tags: Tags) -> Self {
        self.insert_node(OsmNode {
            id,
            location: Point::new(lat, lon),
            tags,
        });
        self
    }

    /// Add a path. Callers are responsible for adding its nodes.
    #[must_use]
    pub fn path(mut self, id: u64, refs: Vec<u64>, tags: Tags) -> Self {
        self.insert_path(OsmPath { id, refs, tags });
        self
    }

    /// Append a classified relation to its group.
    #[must_use]
    pub fn relation(mut self, kind: AreaKind, id: u64, tags: Tags, members: Vec<Member>) -> Self {
        self.push_relation(kind, OsmRelation { id, tags, members });
        self
    }

    /// Record the parsing summary.
    #[must_use]
    pub fn summary(mut self, summary: OsmIngestSummary) -> Self {
        self.extract.summary = summary;
        self
    }

    /// Freeze the extract.
    #[must_use]
    pub fn build(self) -> OsmExtract {
        self.extract
    }

    pub(super) fn insert_node(&mut self, node: OsmNode) {
        self.extract.nodes.insert(node.id, node);
    }

    pub(super) fn insert_path(&mut self, path: OsmPath) {
        self.extract.paths.insert(path.id, path);
    }

    pub(super) fn push_relation(&mut self, kind: AreaKind, relation: OsmRelation) {
        let group = match kind {
            AreaKind::Country => &mut self.extract.countries,
            AreaKind::Settlement => &mut self.extract.settlements,
            AreaKind::District => &mut self.extract.districts,
        };
        group.push(relation);
    }
}
