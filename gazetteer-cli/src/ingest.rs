//! Ingest command implementation for the gazetteer CLI.

use std::io::Write;
use std::sync::Arc;

use camino::Utf8PathBuf;
use clap::Parser;
use gazetteer_data::{
    BuildOptions, BuildReport, Importer, IndexReport, OsmIngestSummary, SqliteIndex,
    parse_osm_pbf,
};
use log::warn;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_COUNTRY, ARG_EXPORT_DIR, ARG_INDEX_DB, ARG_OSM_PBF, CliError, ENV_INGEST_COUNTRY,
    ENV_INGEST_INDEX_DB, ENV_INGEST_OSM_PBF, require_existing, write_json,
};

/// CLI arguments for the `ingest` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Parse an OpenStreetMap PBF extract, rebuild the country, \
                 settlement and district boundaries of one country, and \
                 index junctions, named points and named paths into a \
                 SQLite database. Paths can come from CLI flags, \
                 configuration files, or environment variables.",
    about = "Build a search index from an OSM extract"
)]
#[ortho_config(prefix = "GAZETTEER")]
pub(crate) struct IngestArgs {
    /// Path to the OpenStreetMap PBF file.
    #[arg(long = ARG_OSM_PBF, value_name = "path")]
    #[serde(default)]
    pub(crate) osm_pbf: Option<Utf8PathBuf>,
    /// Name of the country whose boundaries are rebuilt.
    #[arg(long = ARG_COUNTRY, value_name = "name")]
    #[serde(default)]
    pub(crate) country: Option<String>,
    /// SQLite database receiving the search index.
    #[arg(long = ARG_INDEX_DB, value_name = "path")]
    #[serde(default)]
    pub(crate) index_db: Option<Utf8PathBuf>,
    /// Directory receiving one `lon,lat` file per rebuilt country.
    #[arg(long = ARG_EXPORT_DIR, value_name = "dir")]
    #[serde(default)]
    pub(crate) export_dir: Option<Utf8PathBuf>,
}

impl IngestArgs {
    pub(crate) fn into_config(self) -> Result<IngestConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        IngestConfig::try_from(merged)
    }
}

/// Resolved `ingest` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct IngestConfig {
    pub(crate) osm_pbf: Utf8PathBuf,
    pub(crate) country: String,
    pub(crate) index_db: Utf8PathBuf,
    pub(crate) export_dir: Option<Utf8PathBuf>,
}

impl IngestConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        require_existing(&self.osm_pbf, ARG_OSM_PBF)
    }

    fn build_options(&self) -> BuildOptions {
        let options = BuildOptions::new(self.country.clone());
        match &self.export_dir {
            Some(dir) => options.with_export_dir(dir.clone()),
            None => options,
        }
    }
}

impl TryFrom<IngestArgs> for IngestConfig {
    type Error = CliError;

    fn try_from(args: IngestArgs) -> Result<Self, Self::Error> {
        let osm_pbf = args.osm_pbf.ok_or(CliError::MissingArgument {
            field: ARG_OSM_PBF,
            env: ENV_INGEST_OSM_PBF,
        })?;
        let country = args
            .country
            .filter(|name| !name.trim().is_empty())
            .ok_or(CliError::MissingArgument {
                field: ARG_COUNTRY,
                env: ENV_INGEST_COUNTRY,
            })?;
        let index_db = args.index_db.ok_or(CliError::MissingArgument {
            field: ARG_INDEX_DB,
            env: ENV_INGEST_INDEX_DB,
        })?;
        Ok(Self {
            osm_pbf,
            country,
            index_db,
            export_dir: args.export_dir,
        })
    }
}

/// Summary printed once an ingest run has finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct IngestOutcome {
    pub(crate) country: String,
    pub(crate) nodes: u64,
    pub(crate) ways: u64,
    pub(crate) relations: u64,
    pub(crate) countries: usize,
    pub(crate) settlements: usize,
    pub(crate) districts: usize,
    pub(crate) junctions: usize,
    pub(crate) points: usize,
    pub(crate) paths: usize,
    pub(crate) exported: Vec<Utf8PathBuf>,
    pub(crate) export_failures: Vec<Utf8PathBuf>,
}

impl IngestOutcome {
    fn new(
        country: String,
        scanned: OsmIngestSummary,
        build: BuildReport,
        index: IndexReport,
    ) -> Self {
        for failure in &build.export_failures {
            warn!("boundary export failed: {failure}");
        }
        Self {
            country,
            nodes: scanned.nodes,
            ways: scanned.ways,
            relations: scanned.relations,
            countries: build.countries,
            settlements: build.settlements,
            districts: build.districts,
            junctions: index.junctions,
            points: index.points,
            paths: index.paths,
            exported: build.exported,
            export_failures: build
                .export_failures
                .iter()
                .map(|failure| failure.path().to_path_buf())
                .collect(),
        }
    }
}

pub(crate) fn run_ingest(args: IngestArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = resolve_ingest_config(args)?;
    let outcome = execute_ingest(config)?;
    write_json(writer, &outcome)
}

pub(crate) fn resolve_ingest_config(args: IngestArgs) -> Result<IngestConfig, CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    Ok(config)
}

pub(crate) fn execute_ingest(config: IngestConfig) -> Result<IngestOutcome, CliError> {
    let extract = parse_osm_pbf(config.osm_pbf.as_std_path())?;
    let scanned = extract.summary().clone();
    let backend = Arc::new(SqliteIndex::new(config.index_db.clone()));
    let mut importer = Importer::new(backend, extract, config.build_options())?;
    importer.teardown()?;
    let build = importer.start()?;
    let index = importer.wait()?;
    Ok(IngestOutcome::new(config.country, scanned, build, index))
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<IngestConfig, CliError> {
    let merged = IngestArgs::merge_from_layers(layers).map_err(CliError::from)?;
    IngestConfig::try_from(merged)
}
