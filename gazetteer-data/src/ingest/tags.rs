//! Tag utilities for boundary classification and entity selection.
//!
//! Provides helpers to:
//! - classify a relation as a country, settlement or district boundary;
//! - detect named ways and nodes worth keeping with their tags; and
//! - collect key/value tags into the shared tag map.
use gazetteer_core::index::Tags;

use super::AreaKind;

pub(super) fn collect_tags<'a, T>(tags: T) -> Tags
where
    T: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut collected = Tags::new();
    for (key, value) in tags {
        collected.insert(key.to_owned(), value.to_owned());
    }
    collected
}

pub(super) fn has_name<'a, T>(tags: T) -> bool
where
    T: IntoIterator<Item = (&'a str, &'a str)>,
{
    tags.into_iter()
        .any(|(key, value)| key == "name" && !value.is_empty())
}

/// Classify a relation's tags into an administrative level.
///
/// Checks run country, district, settlement in that order so a relation
/// lands in at most one group.
pub(crate) fn classify_relation(tags: &Tags) -> Option<AreaKind> {
    let tag = |key: &str| tags.get(key).map(String::as_str);
    let administrative = tag("boundary") == Some("administrative");
    let admin_level = tag("admin_level");

    if administrative && admin_level == Some("2") {
        return Some(AreaKind::Country);
    }
    if matches!(tag("place"), Some("suburb" | "quarter" | "neighbourhood"))
        || (administrative && matches!(admin_level, Some("9" | "10")))
    {
        return Some(AreaKind::District);
    }
    if matches!(tag("place"), Some("city" | "town" | "village" | "hamlet")) {
        return Some(AreaKind::Settlement);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn tags(pairs: &[(&str, &str)]) -> Tags {
        collect_tags(pairs.iter().copied())
    }

    #[rstest]
    #[case(&[("boundary", "administrative"), ("admin_level", "2")], Some(AreaKind::Country))]
    #[case(
        &[("place", "city"), ("boundary", "administrative"), ("admin_level", "4")],
        Some(AreaKind::Settlement)
    )]
    #[case(&[("place", "village")], Some(AreaKind::Settlement))]
    #[case(&[("place", "suburb")], Some(AreaKind::District))]
    #[case(&[("boundary", "administrative"), ("admin_level", "9")], Some(AreaKind::District))]
    #[case(&[("boundary", "administrative"), ("admin_level", "4")], None)]
    #[case(&[("admin_level", "2")], None)]
    #[case(&[("type", "route")], None)]
    fn classifies_relations(#[case] pairs: &[(&str, &str)], #[case] expected: Option<AreaKind>) {
        assert_eq!(classify_relation(&tags(pairs)), expected);
    }

    #[rstest]
    fn country_check_wins_over_place() {
        let relation = tags(&[
            ("boundary", "administrative"),
            ("admin_level", "2"),
            ("place", "city"),
        ]);
        assert_eq!(classify_relation(&relation), Some(AreaKind::Country));
    }

    #[rstest]
    #[case(&[("highway", "residential")], false)]
    #[case(&[("name", "Chuy Avenue")], true)]
    #[case(&[("name", "")], false)]
    #[case(&[("building", "yes"), ("name", "TSUM")], true)]
    fn detects_named_elements(#[case] pairs: &[(&str, &str)], #[case] expected: bool) {
        assert_eq!(has_name(pairs.iter().copied()), expected);
    }
}
