//! Command-line interface for building and querying a gazetteer.
//!
//! Three subcommands share one configuration model: values come from CLI
//! flags, configuration files, or `GAZETTEER_CMDS_*` environment variables
//! and are merged by `ortho_config` before being checked for completeness.
//! Every command writes a pretty-printed JSON document to standard output.
#![forbid(unsafe_code)]

use std::io::Write;

use camino::Utf8Path;
use clap::{Parser, Subcommand};
use serde::Serialize;

mod error;
mod ingest;
mod reverse;
mod search;

pub use error::CliError;

use ingest::{IngestArgs, run_ingest};
use reverse::{ReverseArgs, run_reverse};
use search::{SearchArgs, run_search};

pub(crate) const ARG_OSM_PBF: &str = "osm-pbf";
pub(crate) const ARG_COUNTRY: &str = "country";
pub(crate) const ARG_INDEX_DB: &str = "index-db";
pub(crate) const ARG_EXPORT_DIR: &str = "export-dir";
pub(crate) const ARG_QUERY: &str = "query";
pub(crate) const ARG_LIMIT: &str = "limit";
pub(crate) const ARG_LAT: &str = "lat";
pub(crate) const ARG_LON: &str = "lon";

pub(crate) const ENV_INGEST_OSM_PBF: &str = "GAZETTEER_CMDS_INGEST_OSM_PBF";
pub(crate) const ENV_INGEST_COUNTRY: &str = "GAZETTEER_CMDS_INGEST_COUNTRY";
pub(crate) const ENV_INGEST_INDEX_DB: &str = "GAZETTEER_CMDS_INGEST_INDEX_DB";
pub(crate) const ENV_SEARCH_QUERY: &str = "GAZETTEER_CMDS_SEARCH_QUERY";
pub(crate) const ENV_SEARCH_INDEX_DB: &str = "GAZETTEER_CMDS_SEARCH_INDEX_DB";
pub(crate) const ENV_REVERSE_OSM_PBF: &str = "GAZETTEER_CMDS_REVERSE_OSM_PBF";
pub(crate) const ENV_REVERSE_COUNTRY: &str = "GAZETTEER_CMDS_REVERSE_COUNTRY";
pub(crate) const ENV_REVERSE_LAT: &str = "GAZETTEER_CMDS_REVERSE_LAT";
pub(crate) const ENV_REVERSE_LON: &str = "GAZETTEER_CMDS_REVERSE_LON";

/// Search result count used when `--limit` is not configured.
pub(crate) const DEFAULT_SEARCH_LIMIT: usize = 10;

/// Run the gazetteer CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    let mut stdout = std::io::stdout().lock();
    match cli.command {
        Command::Ingest(args) => run_ingest(args, &mut stdout),
        Command::Search(args) => run_search(args, &mut stdout),
        Command::Reverse(args) => run_reverse(args, &mut stdout),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "gazetteer",
    about = "Build and query an OpenStreetMap gazetteer",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse an extract, rebuild its boundaries and index it into SQLite.
    Ingest(IngestArgs),
    /// Search an existing index by name.
    Search(SearchArgs),
    /// Find the administrative area containing a coordinate.
    Reverse(ReverseArgs),
}

/// Check that `path` names an existing regular file.
pub(crate) fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
    match gazetteer_fs::file_is_file(path) {
        Ok(true) => Ok(()),
        Ok(false) => Err(CliError::MissingSourceFile {
            field,
            path: path.to_path_buf(),
        }),
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
            Err(CliError::MissingSourceFile {
                field,
                path: path.to_path_buf(),
            })
        }
        Err(source) => Err(CliError::InspectSourcePath {
            field,
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn write_json<T: Serialize>(writer: &mut dyn Write, value: &T) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(value).map_err(CliError::SerializeOutput)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}

#[cfg(test)]
mod tests;
