use std::collections::HashMap;
use std::fmt;

use crate::Point;

/// OpenStreetMap-style free-form key/value tags.
pub type Tags = HashMap<String, String>;

/// The three datasets pushed by the indexing pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Dataset {
    /// Road-network junctions.
    Junctions,
    /// Raw point entities (points of interest).
    Points,
    /// Raw path entities (roads, buildings, named ways).
    Paths,
}

impl Dataset {
    /// Stable lowercase name, also used as the backend's index name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Junctions => "junctions",
            Self::Points => "points",
            Self::Paths => "paths",
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A point where two or more named roads meet.
#[derive(Debug, Clone, PartialEq)]
pub struct JunctionDocument {
    /// Identifier of the shared node.
    pub id: u64,
    /// Display name, the street names joined with `" / "`.
    pub name: String,
    /// Sorted, de-duplicated street names meeting here.
    pub streets: Vec<String>,
    /// Junction location.
    pub location: Point,
}

impl JunctionDocument {
    /// Build a junction from its node and street names.
    ///
    /// Street names are sorted and de-duplicated so the display name is
    /// stable across runs.
    ///
    /// # Examples
    /// ```
    /// use gazetteer_core::Point;
    /// use gazetteer_core::index::JunctionDocument;
    ///
    /// let junction = JunctionDocument::new(
    ///     7,
    ///     Point::new(42.87, 74.60),
    ///     vec!["Manas Avenue".into(), "Chuy Avenue".into()],
    /// );
    /// assert_eq!(junction.name, "Chuy Avenue / Manas Avenue");
    /// ```
    #[must_use]
    pub fn new(id: u64, location: Point, mut streets: Vec<String>) -> Self {
        streets.sort();
        streets.dedup();
        let name = streets.join(" / ");
        Self {
            id,
            name,
            streets,
            location,
        }
    }
}

/// A named point entity taken verbatim from the extract.
#[derive(Debug, Clone, PartialEq)]
pub struct PointDocument {
    /// Point identifier.
    pub id: u64,
    /// Value of the `name` tag.
    pub name: String,
    /// Point location.
    pub location: Point,
    /// All tags carried by the point.
    pub tags: Tags,
}

/// A named path entity taken from the extract.
#[derive(Debug, Clone, PartialEq)]
pub struct PathDocument {
    /// Path identifier.
    pub id: u64,
    /// Value of the `name` tag.
    pub name: String,
    /// Centroid of the path's resolved points.
    pub location: Point,
    /// All tags carried by the path.
    pub tags: Tags,
}

/// One ranked forward-search result.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SearchHit {
    /// Dataset the document came from.
    pub dataset: Dataset,
    /// Document identifier within its dataset.
    pub id: u64,
    /// Matched name.
    pub name: String,
    /// Document location.
    pub location: Point,
}
