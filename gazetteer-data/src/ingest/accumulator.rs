//! Internal accumulator for OpenStreetMap (OSM) PBF ingestion.
//!
//! Collects named nodes, way geometry and classified boundary relations in a
//! first pass, then tracks which point references still need coordinates so
//! a second pass can resolve them.
use std::collections::{HashMap, HashSet};

use gazetteer_core::Point;
use log::warn;
use osmpbf::{Element, RelMemberType};

use super::extract::{AreaKind, Member, OsmExtract, OsmNode, OsmPath, OsmRelation};
use super::ids::{OsmElementKind, element_id};
use super::tags::{classify_relation, collect_tags, has_name};
use super::OsmIngestSummary;

#[derive(Debug, Default)]
pub(super) struct OsmExtractAccumulator {
    summary: OsmIngestSummary,
    nodes: HashMap<u64, OsmNode>,
    paths: HashMap<u64, OsmPath>,
    relations: Vec<(AreaKind, OsmRelation)>,
    pending_nodes: HashSet<u64>,
}

impl OsmExtractAccumulator {
    pub(super) fn process_element(&mut self, element: Element<'_>) {
        match element {
            Element::Node(node) => {
                self.process_node(node.id(), node.lon(), node.lat(), node.tags(), node.tags())
            }
            Element::DenseNode(node) => {
                self.process_node(node.id(), node.lon(), node.lat(), node.tags(), node.tags())
            }
            Element::Way(way) => self.process_way(way),
            Element::Relation(relation) => self.process_relation(relation),
        }
    }

    fn process_node<'a, N, C>(&mut self, raw_id: i64, lon: f64, lat: f64, name_tags: N, tags: C)
    where
        N: IntoIterator<Item = (&'a str, &'a str)>,
        C: IntoIterator<Item = (&'a str, &'a str)>,
    {
        self.summary.record_node(lon, lat);
        let Some(id) = element_id(OsmElementKind::Node, raw_id) else {
            return;
        };
        let was_pending = self.pending_nodes.remove(&id);
        let Some(location) = validated_point(lon, lat) else {
            return;
        };
        let named = has_name(name_tags);
        if !named && !was_pending {
            return;
        }
        let tags = if named { collect_tags(tags) } else { Default::default() };
        self.nodes.insert(id, OsmNode { id, location, tags });
    }

    fn process_way(&mut self, way: osmpbf::Way<'_>) {
        self.summary.record_way();
        let Some(id) = element_id(OsmElementKind::Way, way.id()) else {
            return;
        };
        let refs: Vec<u64> = way
            .refs()
            .filter_map(|raw| element_id(OsmElementKind::Node, raw))
            .collect();
        // Unnamed ways only matter as boundary geometry; drop their tags.
        let tags = if has_name(way.tags()) {
            collect_tags(way.tags())
        } else {
            Default::default()
        };
        self.paths.insert(id, OsmPath { id, refs, tags });
    }

    fn process_relation(&mut self, relation: osmpbf::Relation<'_>) {
        self.summary.record_relation();
        let Some(id) = element_id(OsmElementKind::Relation, relation.id()) else {
            return;
        };
        let tags = collect_tags(relation.tags());
        let Some(kind) = classify_relation(&tags) else {
            return;
        };
        let members = relation
            .members()
            .filter_map(|member| match member.member_type {
                RelMemberType::Node => {
                    element_id(OsmElementKind::Node, member.member_id).map(Member::Point)
                }
                RelMemberType::Way => {
                    element_id(OsmElementKind::Way, member.member_id).map(Member::Path)
                }
                RelMemberType::Relation => None,
            })
            .collect();
        self.relations.push((kind, OsmRelation { id, tags, members }));
    }

    pub(super) fn combine(mut self, other: Self) -> Self {
        self.summary = self.summary.combine(other.summary);
        for (id, node) in other.nodes {
            self.nodes.entry(id).or_insert(node);
        }
        for (id, path) in other.paths {
            self.paths.entry(id).or_insert(path);
        }
        self.relations.extend(other.relations);
        self.pending_nodes.extend(other.pending_nodes);
        self.pending_nodes.retain(|id| !self.nodes.contains_key(id));
        self
    }

    /// Drop geometry-only paths no boundary references and record every
    /// point reference still lacking coordinates.
    pub(super) fn retain_referenced(&mut self) {
        let mut referenced_paths = HashSet::new();
        let mut referenced_points = Vec::new();
        for (_, relation) in &self.relations {
            for member in &relation.members {
                match member {
                    Member::Path(id) => {
                        referenced_paths.insert(*id);
                    }
                    Member::Point(id) => referenced_points.push(*id),
                }
            }
        }
        self.paths
            .retain(|id, path| !path.tags.is_empty() || referenced_paths.contains(id));

        let nodes = &self.nodes;
        let pending = self
            .paths
            .values()
            .flat_map(|path| path.refs.iter().copied())
            .chain(referenced_points)
            .filter(|id| !nodes.contains_key(id));
        self.pending_nodes.extend(pending);
    }

    pub(super) fn has_pending_nodes(&self) -> bool {
        !self.pending_nodes.is_empty()
    }

    pub(super) fn pending_node_count(&self) -> usize {
        self.pending_nodes.len()
    }

    pub(super) fn resolve_pending_node(&mut self, raw_id: i64, lon: f64, lat: f64) {
        let Some(id) = element_id(OsmElementKind::Node, raw_id) else {
            return;
        };
        if !self.pending_nodes.remove(&id) {
            return;
        }
        if let Some(location) = validated_point(lon, lat) {
            self.nodes.insert(
                id,
                OsmNode {
                    id,
                    location,
                    tags: Default::default(),
                },
            );
        }
    }

    pub(super) fn into_extract(self) -> OsmExtract {
        let Self {
            summary,
            nodes,
            paths,
            mut relations,
            ..
        } = self;

        let mut builder = OsmExtract::builder().summary(summary);
        let mut unresolved = 0_usize;
        for path in paths.into_values() {
            if path.refs.iter().all(|id| nodes.contains_key(id)) {
                builder.insert_path(path);
            } else {
                unresolved += 1;
            }
        }
        if unresolved > 0 {
            warn!("Skipped {unresolved} paths with unresolved point references");
        }
        for node in nodes.into_values() {
            builder.insert_node(node);
        }

        relations.sort_by_key(|(_, relation)| relation.id);
        for (kind, relation) in relations {
            builder.push_relation(kind, relation);
        }
        builder.build()
    }
}

pub(super) fn validated_point(lon: f64, lat: f64) -> Option<Point> {
    (lon.is_finite()
        && lat.is_finite()
        && (-180.0..=180.0).contains(&lon)
        && (-90.0..=90.0).contains(&lat))
    .then_some(Point::new(lat, lon))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn tags(pairs: &[(&str, &str)]) -> gazetteer_core::index::Tags {
        collect_tags(pairs.iter().copied())
    }

    #[rstest]
    #[case(74.6, 42.87, true)]
    #[case(181.0, 42.87, false)]
    #[case(74.6, -91.0, false)]
    #[case(f64::NAN, 0.0, false)]
    fn validates_coordinates(#[case] lon: f64, #[case] lat: f64, #[case] valid: bool) {
        assert_eq!(validated_point(lon, lat).is_some(), valid);
    }

    #[rstest]
    fn named_nodes_are_kept_and_unnamed_dropped() {
        let mut accumulator = OsmExtractAccumulator::default();
        accumulator.process_node(1, 74.6, 42.87, [("name", "TSUM")], [("name", "TSUM")]);
        accumulator.process_node(2, 74.7, 42.88, [("amenity", "bench")], [("amenity", "bench")]);
        let extract = accumulator.into_extract();
        assert!(extract.node(1).is_some());
        assert!(extract.node(2).is_none());
        assert_eq!(extract.summary().nodes, 2);
    }

    #[rstest]
    fn pending_nodes_resolve_in_second_pass() {
        let mut accumulator = OsmExtractAccumulator::default();
        accumulator.paths.insert(
            5,
            OsmPath {
                id: 5,
                refs: vec![1, 2],
                tags: tags(&[("name", "Chuy Avenue")]),
            },
        );
        accumulator.retain_referenced();
        assert_eq!(accumulator.pending_node_count(), 2);

        accumulator.resolve_pending_node(1, 74.6, 42.87);
        accumulator.resolve_pending_node(2, 74.7, 42.87);
        accumulator.resolve_pending_node(3, 74.8, 42.87);
        assert!(!accumulator.has_pending_nodes());

        let extract = accumulator.into_extract();
        assert_eq!(extract.path(5).map(|path| path.refs.len()), Some(2));
        assert!(extract.node(3).is_none());
    }

    #[rstest]
    fn unreferenced_geometry_paths_are_dropped() {
        let mut accumulator = OsmExtractAccumulator::default();
        for id in [7, 8] {
            accumulator.paths.insert(
                id,
                OsmPath {
                    id,
                    refs: Vec::new(),
                    tags: Default::default(),
                },
            );
        }
        accumulator.relations.push((
            AreaKind::Country,
            OsmRelation {
                id: 1,
                tags: tags(&[("name", "Kyrgyzstan")]),
                members: vec![Member::Path(7)],
            },
        ));
        accumulator.retain_referenced();
        let extract = accumulator.into_extract();
        assert!(extract.path(7).is_some());
        assert!(extract.path(8).is_none());
    }

    #[rstest]
    fn paths_with_missing_points_are_skipped() {
        let mut accumulator = OsmExtractAccumulator::default();
        accumulator.paths.insert(
            5,
            OsmPath {
                id: 5,
                refs: vec![1, 2],
                tags: tags(&[("name", "Chuy Avenue")]),
            },
        );
        accumulator.retain_referenced();
        accumulator.resolve_pending_node(1, 74.6, 42.87);
        let extract = accumulator.into_extract();
        assert!(extract.path(5).is_none());
    }

    #[rstest]
    fn relations_are_grouped_and_sorted_by_id() {
        let mut accumulator = OsmExtractAccumulator::default();
        for (kind, id) in [
            (AreaKind::Settlement, 30),
            (AreaKind::Country, 20),
            (AreaKind::Settlement, 10),
        ] {
            accumulator.relations.push((
                kind,
                OsmRelation {
                    id,
                    tags: Default::default(),
                    members: Vec::new(),
                },
            ));
        }
        let extract = accumulator.into_extract();
        let settlement_ids: Vec<u64> = extract.settlements().iter().map(|r| r.id).collect();
        assert_eq!(settlement_ids, vec![10, 30]);
        assert_eq!(extract.countries().len(), 1);
        assert!(extract.districts().is_empty());
    }
}
