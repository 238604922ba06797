//! Focused unit tests covering CLI configuration validation and output.

use super::helpers::{SampleWorkspace, output_json};
use super::*;
use crate::ingest::{IngestArgs, IngestConfig, config_from_layers_for_test, resolve_ingest_config};
use crate::reverse::ReverseConfig;
use crate::search::SearchConfig;
use camino::Utf8PathBuf;
use gazetteer_core::Point;
use gazetteer_core::index::{IndexBackend, PointDocument, Tags};
use gazetteer_data::SqliteIndex;
use rstest::rstest;
use std::fs;
use tempfile::TempDir;

fn ingest_args(osm: Option<&str>, country: Option<&str>, db: Option<&str>) -> IngestArgs {
    IngestArgs {
        osm_pbf: osm.map(Utf8PathBuf::from),
        country: country.map(str::to_owned),
        index_db: db.map(Utf8PathBuf::from),
        ..IngestArgs::default()
    }
}

#[rstest]
#[case(None, Some("Kyrgyzstan"), Some("index.db"), ARG_OSM_PBF, ENV_INGEST_OSM_PBF)]
#[case(Some("kg.osm.pbf"), None, Some("index.db"), ARG_COUNTRY, ENV_INGEST_COUNTRY)]
#[case(Some("kg.osm.pbf"), Some("  "), Some("index.db"), ARG_COUNTRY, ENV_INGEST_COUNTRY)]
#[case(Some("kg.osm.pbf"), Some("Kyrgyzstan"), None, ARG_INDEX_DB, ENV_INGEST_INDEX_DB)]
fn ingest_without_required_fields_errors(
    #[case] osm: Option<&str>,
    #[case] country: Option<&str>,
    #[case] db: Option<&str>,
    #[case] field: &'static str,
    #[case] env_var: &'static str,
) {
    let err = IngestConfig::try_from(ingest_args(osm, country, db))
        .expect_err("missing field should error");
    match err {
        CliError::MissingArgument {
            field: missing,
            env,
        } => {
            assert_eq!(missing, field);
            assert_eq!(env, env_var);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn ingest_config_keeps_optional_export_dir() {
    let mut args = ingest_args(Some("kg.osm.pbf"), Some("Kyrgyzstan"), Some("index.db"));
    args.export_dir = Some(Utf8PathBuf::from("rings"));
    let config = IngestConfig::try_from(args).expect("complete config");
    assert_eq!(config.export_dir, Some(Utf8PathBuf::from("rings")));
    assert_eq!(config.country, "Kyrgyzstan");
}

#[rstest]
fn validate_sources_reports_missing_files() {
    let tmp = TempDir::new().expect("tempdir");
    let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf-8 tempdir");
    let config = IngestConfig {
        osm_pbf: root.join("missing.osm.pbf"),
        country: "Kyrgyzstan".to_owned(),
        index_db: root.join("index.db"),
        export_dir: None,
    };
    match config.validate_sources().expect_err("expected failure") {
        CliError::MissingSourceFile { field, .. } => assert_eq!(field, ARG_OSM_PBF),
        other => panic!("unexpected error {other:?}"),
    }
}

#[rstest]
fn validate_sources_rejects_directories() {
    let tmp = TempDir::new().expect("tempdir");
    let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf-8 tempdir");
    let dir = root.join("extract.osm.pbf");
    fs::create_dir(&dir).expect("create directory");
    match require_existing(&dir, ARG_OSM_PBF).expect_err("directory rejected") {
        CliError::MissingSourceFile { field, path } => {
            assert_eq!(field, ARG_OSM_PBF);
            assert_eq!(path, dir);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[rstest]
fn search_limit_defaults_when_unset() {
    let args = crate::search::SearchArgs {
        query: Some("chuy".to_owned()),
        index_db: Some(Utf8PathBuf::from("index.db")),
        limit: None,
    };
    let config = SearchConfig::try_from(args).expect("complete config");
    assert_eq!(config.limit, DEFAULT_SEARCH_LIMIT);
}

#[rstest]
fn search_requires_a_query() {
    let args = crate::search::SearchArgs {
        index_db: Some(Utf8PathBuf::from("index.db")),
        ..crate::search::SearchArgs::default()
    };
    match SearchConfig::try_from(args).expect_err("query missing") {
        CliError::MissingArgument { field, env } => {
            assert_eq!(field, ARG_QUERY);
            assert_eq!(env, ENV_SEARCH_QUERY);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[rstest]
#[case(91.0, 74.6, ARG_LAT)]
#[case(-90.5, 74.6, ARG_LAT)]
#[case(42.8, 180.5, ARG_LON)]
#[case(f64::NAN, 74.6, ARG_LAT)]
fn reverse_rejects_out_of_range_coordinates(
    #[case] lat: f64,
    #[case] lon: f64,
    #[case] expected: &'static str,
) {
    let args = crate::reverse::ReverseArgs {
        osm_pbf: Some(Utf8PathBuf::from("kg.osm.pbf")),
        country: Some("Kyrgyzstan".to_owned()),
        lat: Some(lat),
        lon: Some(lon),
    };
    match ReverseConfig::try_from(args).expect_err("coordinate rejected") {
        CliError::InvalidCoordinate { field, .. } => assert_eq!(field, expected),
        other => panic!("unexpected error {other:?}"),
    }
}

#[rstest]
fn reverse_accepts_negative_coordinates_from_flags() {
    let cli = Cli::try_parse_from([
        "gazetteer",
        "reverse",
        "--osm-pbf",
        "kg.osm.pbf",
        "--country",
        "Kyrgyzstan",
        "--lat",
        "-33.9",
        "--lon",
        "-70.6",
    ])
    .expect("flags parse");
    let Command::Reverse(args) = cli.command else {
        panic!("expected reverse command");
    };
    let config = ReverseConfig::try_from(args).expect("complete config");
    assert_eq!(config.point, gazetteer_core::Point::new(-33.9, -70.6));
}

#[rstest]
fn merge_layers_maps_configuration_errors() {
    use ortho_config::MergeComposer;
    use serde_json::json;

    let mut composer = MergeComposer::new();
    composer.push_cli(json!({ "osm_pbf": 42 }));

    let err = config_from_layers_for_test(composer.layers())
        .expect_err("invalid config layer should map to CliError::Configuration");
    match err {
        CliError::Configuration(_) => {}
        other => panic!("expected CliError::Configuration, found {other:?}"),
    }
}

#[rstest]
fn merge_layers_honours_precedence() {
    use ortho_config::MergeComposer;
    use serde_json::json;

    let mut composer = MergeComposer::new();
    composer.push_file(
        json!({
            "osm_pbf": "from-file.osm.pbf",
            "country": "Kazakhstan",
            "index_db": "from-file.db",
        }),
        None,
    );
    composer.push_environment(json!({
        "country": "Kyrgyzstan",
        "index_db": "from-env.db",
    }));
    composer.push_cli(json!({ "index_db": "from-cli.db" }));

    let config =
        config_from_layers_for_test(composer.layers()).expect("merged config should build");
    assert_eq!(config.osm_pbf, Utf8PathBuf::from("from-file.osm.pbf"));
    assert_eq!(config.country, "Kyrgyzstan");
    assert_eq!(config.index_db, Utf8PathBuf::from("from-cli.db"));
    assert_eq!(config.export_dir, None);
}

#[rstest]
fn ingest_writes_a_json_summary() {
    let workspace = SampleWorkspace::new();
    let mut args = ingest_args(
        Some(workspace.extract().as_str()),
        Some("Kyrgyzstan"),
        Some(workspace.index_db().as_str()),
    );
    args.export_dir = Some(workspace.root().join("rings"));
    let config = resolve_ingest_config(args).expect("config resolves");
    let outcome = crate::ingest::execute_ingest(config).expect("ingest succeeds");

    let mut buffer = Vec::new();
    write_json(&mut buffer, &outcome).expect("write json");
    let json = output_json(&buffer);
    assert_eq!(json["country"], "Kyrgyzstan");
    assert!(json["nodes"].as_u64().is_some_and(|nodes| nodes > 0));
    assert!(json["ways"].as_u64().is_some_and(|ways| ways >= 2));
    assert!(json["relations"].as_u64().is_some_and(|relations| relations > 0));
    assert_eq!(json["countries"], 1);
    assert_eq!(json["settlements"], 1);
    assert_eq!(json["paths"], 2);
    assert_eq!(json["exported"].as_array().map(Vec::len), Some(1));
    assert!(workspace.root().join("rings").join("Kyrgyzstan").is_file());
}

#[rstest]
fn reingest_drops_rows_missing_from_the_extract() {
    let workspace = SampleWorkspace::new();
    let seeded = SqliteIndex::new(workspace.index_db());
    seeded.ensure_schema().expect("schema");
    seeded
        .push_points(&[PointDocument {
            id: 999_999,
            name: "Demolished Kiosk".into(),
            location: Point::new(42.87, 74.6),
            tags: Tags::new(),
        }])
        .expect("seed stale row");

    let args = ingest_args(
        Some(workspace.extract().as_str()),
        Some("Kyrgyzstan"),
        Some(workspace.index_db().as_str()),
    );
    let config = resolve_ingest_config(args).expect("config resolves");
    let outcome = crate::ingest::execute_ingest(config).expect("ingest succeeds");
    assert_eq!(outcome.points, 1);

    let index = SqliteIndex::new(workspace.index_db());
    assert!(index.search("kiosk", 5).expect("search").is_empty());
    assert!(!index.search("chuy", 5).expect("search").is_empty());
}

#[rstest]
fn search_reports_a_missing_index() {
    let tmp = TempDir::new().expect("tempdir");
    let missing = Utf8PathBuf::from_path_buf(tmp.path().join("absent.db")).expect("utf-8 path");
    let args = crate::search::SearchArgs {
        query: Some("chuy".to_owned()),
        index_db: Some(missing),
        limit: None,
    };
    let mut buffer = Vec::new();
    match crate::search::run_search(args, &mut buffer).expect_err("index missing") {
        CliError::MissingSourceFile { field, .. } => assert_eq!(field, ARG_INDEX_DB),
        other => panic!("unexpected error {other:?}"),
    }
    assert!(buffer.is_empty());
}
