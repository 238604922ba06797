//! OpenStreetMap (OSM) PBF parsing into an [`OsmExtract`].
//!
//! Parsing runs in two passes. The first decodes blocks in parallel and
//! collects named nodes, way geometry and classified boundary relations. The
//! second streams nodes again to fill in coordinates for points referenced by
//! retained paths and relations.

use std::path::{Path, PathBuf};

use geo::{Coord, Rect};
use log::{info, warn};
use osmpbf::{Element, ElementReader};
use thiserror::Error;

mod accumulator;
mod extract;
mod ids;
mod tags;

pub use extract::{AreaKind, Member, OsmExtract, OsmExtractBuilder, OsmNode, OsmPath, OsmRelation};

use accumulator::OsmExtractAccumulator;

/// Summary of raw OSM elements discovered during ingestion.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OsmIngestSummary {
    /// Number of nodes discovered, including dense-node entries.
    pub nodes: u64,
    /// Number of ways discovered.
    pub ways: u64,
    /// Number of relations discovered.
    pub relations: u64,
    /// Bounding box covering all node coordinates, if any nodes were present.
    /// Coordinates are WGS84 with `x = longitude`, `y = latitude`.
    pub bounds: Option<Rect<f64>>,
}

impl OsmIngestSummary {
    fn combine(mut self, other: Self) -> Self {
        self.nodes += other.nodes;
        self.ways += other.ways;
        self.relations += other.relations;
        if let Some(bounds) = other.bounds {
            self.include_bounds(bounds);
        }
        self
    }

    fn include_bounds(&mut self, bounds: Rect<f64>) {
        match &mut self.bounds {
            Some(existing) => {
                let min = Coord {
                    x: existing.min().x.min(bounds.min().x),
                    y: existing.min().y.min(bounds.min().y),
                };
                let max = Coord {
                    x: existing.max().x.max(bounds.max().x),
                    y: existing.max().y.max(bounds.max().y),
                };
                *existing = Rect::new(min, max);
            }
            None => self.bounds = Some(bounds),
        }
    }

    fn record_node(&mut self, lon: f64, lat: f64) {
        self.nodes += 1;
        if let Some(point) = accumulator::validated_point(lon, lat) {
            let coordinate = point.to_coord();
            self.include_bounds(Rect::new(coordinate, coordinate));
        }
    }

    fn record_way(&mut self) {
        self.ways += 1;
    }

    fn record_relation(&mut self) {
        self.relations += 1;
    }
}

/// Errors returned when parsing an OSM PBF file.
#[derive(Debug, Error)]
pub enum OsmIngestError {
    /// The file could not be opened.
    #[error("failed to open OSM PBF file at {path:?}")]
    Open {
        /// Underlying reader error.
        #[source]
        source: osmpbf::Error,
        /// File that failed to open.
        path: PathBuf,
    },
    /// A block failed to decode.
    #[error("failed to decode OSM PBF data at {path:?}")]
    Decode {
        /// Underlying decoder error.
        #[source]
        source: osmpbf::Error,
        /// File being decoded.
        path: PathBuf,
    },
}

/// Parse an OSM PBF file into the entities needed for the place hierarchy
/// and the search datasets.
///
/// Relation groups come back sorted by identifier so builds over the same
/// file are deterministic.
///
/// # Examples
/// ```no_run
/// use std::path::Path;
/// use gazetteer_data::ingest::parse_osm_pbf;
///
/// # fn main() -> Result<(), gazetteer_data::ingest::OsmIngestError> {
/// let extract = parse_osm_pbf(Path::new("kyrgyzstan.osm.pbf"))?;
/// println!("{} country boundaries", extract.countries().len());
/// # Ok(())
/// # }
/// ```
pub fn parse_osm_pbf(path: &Path) -> Result<OsmExtract, OsmIngestError> {
    let open = |path: &Path| {
        ElementReader::from_path(path).map_err(|source| OsmIngestError::Open {
            source,
            path: path.to_path_buf(),
        })
    };
    let decode = |source| OsmIngestError::Decode {
        source,
        path: path.to_path_buf(),
    };

    let mut accumulator = open(path)?
        .par_map_reduce(
            |element| {
                let mut accumulator = OsmExtractAccumulator::default();
                accumulator.process_element(element);
                accumulator
            },
            OsmExtractAccumulator::default,
            OsmExtractAccumulator::combine,
        )
        .map_err(decode)?;

    accumulator.retain_referenced();
    if accumulator.has_pending_nodes() {
        let accumulator_ref = &mut accumulator;
        open(path)?
            .for_each(|element| match element {
                Element::Node(node) => {
                    accumulator_ref.resolve_pending_node(node.id(), node.lon(), node.lat());
                }
                Element::DenseNode(node) => {
                    accumulator_ref.resolve_pending_node(node.id(), node.lon(), node.lat());
                }
                Element::Way(_) | Element::Relation(_) => {}
            })
            .map_err(decode)?;
        if accumulator.has_pending_nodes() {
            warn!(
                "Skipped {} point references without coordinates",
                accumulator.pending_node_count()
            );
        }
    }

    let extract = accumulator.into_extract();
    let summary = extract.summary();
    info!(
        "Parsed {}: {} nodes, {} ways, {} relations; {} countries, {} settlements, {} districts",
        path.display(),
        summary.nodes,
        summary.ways,
        summary.relations,
        extract.countries().len(),
        extract.settlements().len(),
        extract.districts().len()
    );
    if let Some(bounds) = summary.bounds {
        info!(
            "Extract covers lat {:.5}..{:.5}, lon {:.5}..{:.5}",
            bounds.min().y,
            bounds.max().y,
            bounds.min().x,
            bounds.max().x
        );
    }
    Ok(extract)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn summary_combines_counts_and_bounds() {
        let mut left = OsmIngestSummary::default();
        left.record_node(74.0, 42.0);
        left.record_way();
        let mut right = OsmIngestSummary::default();
        right.record_node(75.0, 43.0);
        right.record_relation();

        let combined = left.combine(right);
        assert_eq!((combined.nodes, combined.ways, combined.relations), (2, 1, 1));
        let bounds = combined.bounds.expect("bounds recorded");
        assert_eq!(bounds.min(), Coord { x: 74.0, y: 42.0 });
        assert_eq!(bounds.max(), Coord { x: 75.0, y: 43.0 });
    }

    #[rstest]
    fn invalid_coordinates_are_counted_without_bounds() {
        let mut summary = OsmIngestSummary::default();
        summary.record_node(200.0, 42.0);
        assert_eq!(summary.nodes, 1);
        assert!(summary.bounds.is_none());
    }

    #[rstest]
    fn missing_file_reports_open_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("absent.osm.pbf");
        let err = parse_osm_pbf(&path).expect_err("missing file must fail");
        assert!(matches!(err, OsmIngestError::Open { path: ref p, .. } if p == &path));
    }
}
