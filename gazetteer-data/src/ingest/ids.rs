use log::warn;

#[derive(Copy, Clone, Debug)]
pub(super) enum OsmElementKind {
    Node,
    Way,
    Relation,
}

/// Convert a raw OSM identifier into the unsigned identifier used across the
/// extract. Nodes, ways and relations keep separate namespaces, so no type
/// prefix is applied.
pub(super) fn element_id(kind: OsmElementKind, raw_id: i64) -> Option<u64> {
    match u64::try_from(raw_id) {
        Ok(id) => Some(id),
        Err(_) => {
            warn!(
                "Skipped OSM element: kind={:?}, raw_id={} (negative identifiers are unsupported)",
                kind, raw_id
            );
            None
        }
    }
}
