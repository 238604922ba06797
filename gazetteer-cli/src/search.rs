//! Search command implementation for the gazetteer CLI.

use std::io::Write;
use std::sync::Arc;

use camino::Utf8PathBuf;
use clap::Parser;
use gazetteer_core::index::SearchHit;
use gazetteer_core::{Hierarchy, LookupService};
use gazetteer_data::SqliteIndex;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_INDEX_DB, ARG_LIMIT, ARG_QUERY, CliError, DEFAULT_SEARCH_LIMIT, ENV_SEARCH_INDEX_DB,
    ENV_SEARCH_QUERY, require_existing, write_json,
};

/// CLI arguments for the `search` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Search junctions, named points and named paths in an index \
                 built by `gazetteer ingest`. Exact name matches rank first, \
                 then prefix matches, then substring matches.",
    about = "Search an index by name"
)]
#[ortho_config(prefix = "GAZETTEER")]
pub(crate) struct SearchArgs {
    /// Free-text query matched case-insensitively against names.
    #[arg(value_name = "query")]
    #[serde(default)]
    pub(crate) query: Option<String>,
    /// SQLite database written by the ingest command.
    #[arg(long = ARG_INDEX_DB, value_name = "path")]
    #[serde(default)]
    pub(crate) index_db: Option<Utf8PathBuf>,
    /// Maximum number of results (defaults to 10).
    #[arg(long = ARG_LIMIT, value_name = "count")]
    #[serde(default)]
    pub(crate) limit: Option<usize>,
}

impl SearchArgs {
    pub(crate) fn into_config(self) -> Result<SearchConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        SearchConfig::try_from(merged)
    }
}

/// Resolved `search` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SearchConfig {
    pub(crate) query: String,
    pub(crate) index_db: Utf8PathBuf,
    pub(crate) limit: usize,
}

impl TryFrom<SearchArgs> for SearchConfig {
    type Error = CliError;

    fn try_from(args: SearchArgs) -> Result<Self, Self::Error> {
        let query = args.query.ok_or(CliError::MissingArgument {
            field: ARG_QUERY,
            env: ENV_SEARCH_QUERY,
        })?;
        let index_db = args.index_db.ok_or(CliError::MissingArgument {
            field: ARG_INDEX_DB,
            env: ENV_SEARCH_INDEX_DB,
        })?;
        Ok(Self {
            query,
            index_db,
            limit: args.limit.unwrap_or(DEFAULT_SEARCH_LIMIT),
        })
    }
}

/// Ranked hits for one query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct SearchOutcome {
    pub(crate) query: String,
    pub(crate) hits: Vec<SearchHit>,
}

pub(crate) fn run_search(args: SearchArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    require_existing(&config.index_db, ARG_INDEX_DB)?;
    let outcome = execute_search(config)?;
    write_json(writer, &outcome)
}

pub(crate) fn execute_search(config: SearchConfig) -> Result<SearchOutcome, CliError> {
    // Forward search never consults the hierarchy.
    let lookup = LookupService::new(
        Arc::new(SqliteIndex::new(config.index_db)),
        Arc::new(Hierarchy::default()),
    );
    let hits = lookup
        .search(&config.query, config.limit)
        .map_err(CliError::Search)?;
    Ok(SearchOutcome {
        query: config.query,
        hits,
    })
}
