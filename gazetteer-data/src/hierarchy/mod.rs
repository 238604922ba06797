//! Reconstruct the country → settlement → district tree from boundary
//! relations in an [`OsmExtract`].
//!
//! Nesting is decided by a [`ContainmentStrategy`]; [`build_hierarchy`] uses
//! [`RepresentativePoint`], which tests a single point of the inner ring.

mod export;

use camino::Utf8PathBuf;
use gazetteer_core::{
    ContainmentStrategy, Country, District, Hierarchy, Polygon, RepresentativePoint, Settlement,
};
use log::{debug, info, warn};

use crate::ingest::{Member, OsmExtract, OsmPath, OsmRelation};

pub use export::{ExportError, export_file_name, export_ring};

/// Settings for one hierarchy build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// Only country boundaries whose `name` tag equals this are built.
    pub country: String,
    /// When set, each built country's ring is written below this directory.
    pub export_dir: Option<Utf8PathBuf>,
}

impl BuildOptions {
    /// Build only `country`, without a boundary export.
    #[must_use]
    pub fn new(country: impl Into<String>) -> Self {
        Self {
            country: country.into(),
            export_dir: None,
        }
    }

    /// Write boundary rings below `dir`.
    #[must_use]
    pub fn with_export_dir(mut self, dir: impl Into<Utf8PathBuf>) -> Self {
        self.export_dir = Some(dir.into());
        self
    }
}

/// What a build produced besides the tree itself.
#[derive(Debug, Default)]
pub struct BuildReport {
    /// Countries built.
    pub countries: usize,
    /// Settlements attached to a country.
    pub settlements: usize,
    /// Districts attached to a settlement.
    pub districts: usize,
    /// Export files written.
    pub exported: Vec<Utf8PathBuf>,
    /// Exports that failed; the affected countries were still built.
    pub export_failures: Vec<ExportError>,
}

/// Assemble a relation's ring from its members in order.
///
/// Point members contribute their location, path members all of their
/// points in path order. Unknown members are skipped. The ring is neither
/// closed, reordered nor de-duplicated.
///
/// # Examples
/// ```
/// use gazetteer_core::index::Tags;
/// use gazetteer_data::hierarchy::relation_to_polygon;
/// use gazetteer_data::ingest::{AreaKind, Member, OsmExtract};
///
/// let extract = OsmExtract::builder()
///     .node(1, 0.0, 0.0, Tags::new())
///     .node(2, 0.0, 1.0, Tags::new())
///     .node(3, 1.0, 1.0, Tags::new())
///     .path(10, vec![2, 3], Tags::new())
///     .relation(AreaKind::Country, 20, Tags::new(), vec![Member::Point(1), Member::Path(10)])
///     .build();
/// let polygon = relation_to_polygon(&extract, &extract.countries()[0]);
/// assert_eq!(polygon.len(), 3);
/// ```
#[must_use]
pub fn relation_to_polygon(extract: &OsmExtract, relation: &OsmRelation) -> Polygon {
    let mut ring = Vec::new();
    for member in &relation.members {
        match *member {
            Member::Point(id) => match extract.point(id) {
                Some(point) => ring.push(point),
                None => debug!("relation {}: point member {id} not in extract", relation.id),
            },
            Member::Path(id) => match extract.path(id) {
                Some(path) => ring.extend(path_to_polygon(extract, path).points()),
                None => debug!("relation {}: path member {id} not in extract", relation.id),
            },
        }
    }
    Polygon::new(ring)
}

/// Resolve a path's point references in order.
///
/// References missing from the extract are skipped.
#[must_use]
pub fn path_to_polygon(extract: &OsmExtract, path: &OsmPath) -> Polygon {
    let mut skipped = 0_usize;
    let ring: Vec<_> = path
        .refs
        .iter()
        .filter_map(|id| {
            let point = extract.point(*id);
            if point.is_none() {
                skipped += 1;
            }
            point
        })
        .collect();
    if skipped > 0 {
        debug!("path {}: skipped {skipped} unresolved point references", path.id);
    }
    Polygon::new(ring)
}

/// Build every settlement candidate with the districts it owns.
///
/// Ownership is settled over all candidates in relation order before any
/// country filter, so a district belongs to its first containing settlement
/// even when that settlement lies outside the requested country.
fn assemble_settlements<S>(extract: &OsmExtract, strategy: &S) -> Vec<Settlement>
where
    S: ContainmentStrategy + ?Sized,
{
    let districts: Vec<(&OsmRelation, Polygon)> = extract
        .districts()
        .iter()
        .map(|relation| (relation, relation_to_polygon(extract, relation)))
        .collect();
    let mut claimed = vec![false; districts.len()];

    extract
        .settlements()
        .iter()
        .map(|relation| {
            let mut settlement = Settlement {
                name: relation.name().to_owned(),
                place: relation.tag("place").unwrap_or_default().to_owned(),
                polygon: relation_to_polygon(extract, relation),
                districts: Vec::new(),
            };
            for ((district_relation, district_polygon), taken) in
                districts.iter().zip(claimed.iter_mut())
            {
                if *taken || !strategy.nests_within(&settlement.polygon, district_polygon) {
                    continue;
                }
                *taken = true;
                settlement.districts.push(District {
                    name: district_relation.name().to_owned(),
                    polygon: district_polygon.clone(),
                });
            }
            settlement
        })
        .collect()
}

/// Build the hierarchy for `options.country` with the representative-point
/// heuristic.
#[must_use]
pub fn build_hierarchy(extract: &OsmExtract, options: &BuildOptions) -> (Hierarchy, BuildReport) {
    build_hierarchy_with(extract, options, &RepresentativePoint)
}

/// Build the hierarchy with a caller-supplied nesting strategy.
///
/// Every country candidate named `options.country` is built in candidate
/// order. Settlements nest under a country and districts under a settlement
/// when `strategy` says so; a district attaches to the first settlement that
/// accepts it and no other, whether or not that settlement joins the country.
pub fn build_hierarchy_with<S>(
    extract: &OsmExtract,
    options: &BuildOptions,
    strategy: &S,
) -> (Hierarchy, BuildReport)
where
    S: ContainmentStrategy + ?Sized,
{
    let mut report = BuildReport::default();
    let mut hierarchy = Hierarchy::default();

    let candidates: Vec<&OsmRelation> = extract
        .countries()
        .iter()
        .filter(|relation| relation.name() == options.country)
        .collect();
    if candidates.is_empty() {
        warn!("no country boundary named {:?} in extract", options.country);
        return (hierarchy, report);
    }

    let settlements = assemble_settlements(extract, strategy);

    for relation in candidates {
        let polygon = relation_to_polygon(extract, relation);
        if let Some(dir) = &options.export_dir {
            match export_ring(dir, relation.name(), &polygon) {
                Ok(path) => report.exported.push(path),
                Err(err) => {
                    warn!("boundary export for {:?} failed: {err}", relation.name());
                    report.export_failures.push(err);
                }
            }
        }

        let mut country = Country {
            name: relation.name().to_owned(),
            polygon,
            settlements: Vec::new(),
        };
        for settlement in &settlements {
            if !strategy.nests_within(&country.polygon, &settlement.polygon) {
                continue;
            }
            report.districts += settlement.districts.len();
            country.settlements.push(settlement.clone());
        }
        report.settlements += country.settlements.len();
        report.countries += 1;
        hierarchy.countries.push(country);
    }

    info!(
        "built hierarchy for {:?}: {} countries, {} settlements, {} districts",
        options.country, report.countries, report.settlements, report.districts
    );
    (hierarchy, report)
}
