//! Reverse geocoding command implementation for the gazetteer CLI.
//!
//! The hierarchy is not persisted by `ingest`, so this command rebuilds it
//! from the extract before locating the coordinate.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use gazetteer_core::{Place, Point};
use gazetteer_data::{BuildOptions, build_hierarchy, parse_osm_pbf};
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_COUNTRY, ARG_LAT, ARG_LON, ARG_OSM_PBF, CliError, ENV_REVERSE_COUNTRY, ENV_REVERSE_LAT,
    ENV_REVERSE_LON, ENV_REVERSE_OSM_PBF, require_existing, write_json,
};

/// CLI arguments for the `reverse` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Rebuild one country's boundaries from an OpenStreetMap PBF \
                 extract and report the smallest district, settlement or \
                 country containing the given coordinate.",
    about = "Find the area containing a coordinate"
)]
#[ortho_config(prefix = "GAZETTEER")]
pub(crate) struct ReverseArgs {
    /// Path to the OpenStreetMap PBF file.
    #[arg(long = ARG_OSM_PBF, value_name = "path")]
    #[serde(default)]
    pub(crate) osm_pbf: Option<Utf8PathBuf>,
    /// Name of the country whose boundaries are rebuilt.
    #[arg(long = ARG_COUNTRY, value_name = "name")]
    #[serde(default)]
    pub(crate) country: Option<String>,
    /// Latitude in degrees.
    #[arg(long = ARG_LAT, value_name = "degrees", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) lat: Option<f64>,
    /// Longitude in degrees.
    #[arg(long = ARG_LON, value_name = "degrees", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) lon: Option<f64>,
}

impl ReverseArgs {
    pub(crate) fn into_config(self) -> Result<ReverseConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ReverseConfig::try_from(merged)
    }
}

/// Resolved `reverse` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ReverseConfig {
    pub(crate) osm_pbf: Utf8PathBuf,
    pub(crate) country: String,
    pub(crate) point: Point,
}

fn checked_degrees(value: f64, field: &'static str, bound: f64) -> Result<f64, CliError> {
    if value.is_finite() && (-bound..=bound).contains(&value) {
        Ok(value)
    } else {
        Err(CliError::InvalidCoordinate { field, value })
    }
}

impl TryFrom<ReverseArgs> for ReverseConfig {
    type Error = CliError;

    fn try_from(args: ReverseArgs) -> Result<Self, Self::Error> {
        let osm_pbf = args.osm_pbf.ok_or(CliError::MissingArgument {
            field: ARG_OSM_PBF,
            env: ENV_REVERSE_OSM_PBF,
        })?;
        let country = args
            .country
            .filter(|name| !name.trim().is_empty())
            .ok_or(CliError::MissingArgument {
                field: ARG_COUNTRY,
                env: ENV_REVERSE_COUNTRY,
            })?;
        let lat = args.lat.ok_or(CliError::MissingArgument {
            field: ARG_LAT,
            env: ENV_REVERSE_LAT,
        })?;
        let lon = args.lon.ok_or(CliError::MissingArgument {
            field: ARG_LON,
            env: ENV_REVERSE_LON,
        })?;
        let point = Point::new(
            checked_degrees(lat, ARG_LAT, 90.0)?,
            checked_degrees(lon, ARG_LON, 180.0)?,
        );
        Ok(Self {
            osm_pbf,
            country,
            point,
        })
    }
}

/// The located area, or `null` when the coordinate is outside the country.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct ReverseOutcome {
    pub(crate) point: Point,
    pub(crate) place: Option<Place>,
}

pub(crate) fn run_reverse(args: ReverseArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    require_existing(&config.osm_pbf, ARG_OSM_PBF)?;
    let outcome = execute_reverse(config)?;
    write_json(writer, &outcome)
}

pub(crate) fn execute_reverse(config: ReverseConfig) -> Result<ReverseOutcome, CliError> {
    let extract = parse_osm_pbf(config.osm_pbf.as_std_path())?;
    let (hierarchy, report) = build_hierarchy(&extract, &BuildOptions::new(config.country));
    info!(
        "rebuilt {} countries, {} settlements, {} districts",
        report.countries, report.settlements, report.districts
    );
    Ok(ReverseOutcome {
        point: config.point,
        place: hierarchy.locate(&config.point),
    })
}
