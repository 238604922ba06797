//! Derive the three search datasets from a parsed extract.

use std::collections::{BTreeSet, HashMap};

use gazetteer_core::Point;
use gazetteer_core::index::{JunctionDocument, PathDocument, PointDocument, Tags};
use geo::{Centroid, MultiPoint};

use crate::ingest::{OsmExtract, OsmPath};

fn name_of(tags: &Tags) -> Option<&str> {
    tags.get("name")
        .map(String::as_str)
        .filter(|name| !name.is_empty())
}

/// Points shared by highway paths with at least two different names.
#[must_use]
pub fn junction_documents(extract: &OsmExtract) -> Vec<JunctionDocument> {
    let mut streets_at: HashMap<u64, BTreeSet<&str>> = HashMap::new();
    for path in extract.paths() {
        if !path.tags.contains_key("highway") {
            continue;
        }
        let Some(name) = name_of(&path.tags) else {
            continue;
        };
        for id in &path.refs {
            streets_at.entry(*id).or_default().insert(name);
        }
    }

    let mut junctions: Vec<JunctionDocument> = streets_at
        .into_iter()
        .filter(|(_, streets)| streets.len() >= 2)
        .filter_map(|(id, streets)| {
            let location = extract.point(id)?;
            let streets = streets.into_iter().map(str::to_owned).collect();
            Some(JunctionDocument::new(id, location, streets))
        })
        .collect();
    junctions.sort_by_key(|junction| junction.id);
    junctions
}

/// Every named point with its tags.
#[must_use]
pub fn point_documents(extract: &OsmExtract) -> Vec<PointDocument> {
    let mut points: Vec<PointDocument> = extract
        .nodes()
        .filter_map(|node| {
            let name = name_of(&node.tags)?;
            Some(PointDocument {
                id: node.id,
                name: name.to_owned(),
                location: node.location,
                tags: node.tags.clone(),
            })
        })
        .collect();
    points.sort_by_key(|point| point.id);
    points
}

fn path_centroid(extract: &OsmExtract, path: &OsmPath) -> Option<Point> {
    let coords: Vec<geo::Point<f64>> = path
        .refs
        .iter()
        .filter_map(|id| extract.point(*id))
        .map(|point| geo::Point::from(point.to_coord()))
        .collect();
    MultiPoint::new(coords)
        .centroid()
        .map(|centroid| Point::from_coord(centroid.0))
}

/// Every named path with at least one resolved point.
#[must_use]
pub fn path_documents(extract: &OsmExtract) -> Vec<PathDocument> {
    let mut paths: Vec<PathDocument> = extract
        .paths()
        .filter_map(|path| {
            let name = name_of(&path.tags)?;
            let location = path_centroid(extract, path)?;
            Some(PathDocument {
                id: path.id,
                name: name.to_owned(),
                location,
                tags: path.tags.clone(),
            })
        })
        .collect();
    paths.sort_by_key(|path| path.id);
    paths
}
