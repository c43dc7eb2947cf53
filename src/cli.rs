//! CLI module - Command-line interface definitions and handlers

use anyhow::{ensure, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

use crate::backends::http::{HttpJson, DEFAULT_TIMEOUT};
use crate::backends::tides::TIDE_CACHE_TTL;
use crate::backends::{
    Endpoints, Sources, DEFAULT_GEOCODE_URL, DEFAULT_STATIONS_URL, DEFAULT_TIDES_URL,
    DEFAULT_WEATHER_URL,
};
use crate::cache::store::{CacheStore, DiskCache, NoCache};
use crate::core::paths::cache_dir;
use crate::core::render::{OutputFormat, RenderConfig};
use crate::flows::lookup::{Request, Target};

/// sailcheck - combine tide predictions and the wind forecast into a go/no-go call.
#[derive(Parser, Debug)]
#[command(name = "sailcheck")]
#[command(
    author,
    version,
    about,
    long_about = r#"sailcheck fetches NOAA tide predictions for a station and the NWS forecast
for a coordinate, then applies a fixed rule set:

Without --station, a --location is matched to the nearest NOAA tide
station; otherwise station 9445958 (Port Orchard, WA) is used.

- missing tide or weather data      -> Unsafe (Missing data.)
- wind above 25                     -> Unsafe (High wind speed.)
- otherwise, last tide was high     -> Safe
- otherwise                         -> Unsafe

Running without a subcommand is the same as `sailcheck check`.

Examples:
    sailcheck
    sailcheck --station 9447130 --lat 47.6062 --lon=-122.3321
    sailcheck --location "Port Orchard, WA"
    sailcheck tides --date 2025-03-16
    sailcheck cache list
"#
)]
pub struct Cli {
    /// Directory holding the .sailcheck cache.
    #[arg(long, global = true, default_value = ".", value_name = "ROOT")]
    pub root: PathBuf,

    /// Output format (text/jsonl/json/md).
    #[arg(
        long,
        global = true,
        default_value = "text",
        value_name = "FORMAT",
        long_help = "Select the output format.\n\n\
Supported values:\n\
- text (default): one line per result\n\
- jsonl: one JSON object per line\n\
- json: a single JSON array\n\
- md: Markdown"
    )]
    pub format: String,

    /// Pretty-print JSON/JSONL output with indentation.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Quiet mode (only errors on stderr).
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug diagnostics on stderr).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Bypass the response cache entirely.
    #[arg(long, global = true)]
    pub no_cache: bool,

    /// NOAA tide station id [default: nearest to --location, else 9445958].
    #[arg(long, global = true, env = "SAILCHECK_STATION", value_name = "ID")]
    pub station: Option<String>,

    /// Prediction date (YYYY-MM-DD); defaults to today at the station.
    #[arg(long, global = true, value_name = "DATE")]
    pub date: Option<NaiveDate>,

    /// Forecast latitude.
    #[arg(
        long,
        global = true,
        env = "SAILCHECK_LAT",
        default_value_t = crate::backends::weather::DEFAULT_LAT,
        allow_negative_numbers = true
    )]
    pub lat: f64,

    /// Forecast longitude.
    #[arg(
        long,
        global = true,
        env = "SAILCHECK_LON",
        default_value_t = crate::backends::weather::DEFAULT_LON,
        allow_negative_numbers = true
    )]
    pub lon: f64,

    /// Place name to geocode instead of --lat/--lon.
    #[arg(long, global = true, value_name = "PLACE")]
    pub location: Option<String>,

    /// Seconds a tide response is served from cache.
    #[arg(
        long,
        global = true,
        env = "SAILCHECK_CACHE_TTL",
        default_value_t = TIDE_CACHE_TTL.as_secs(),
        value_name = "SECS"
    )]
    pub cache_ttl: u64,

    /// NOAA CO-OPS data getter URL.
    #[arg(long, global = true, env = "SAILCHECK_TIDES_URL", default_value = DEFAULT_TIDES_URL, hide = true)]
    pub tides_url: String,

    /// NOAA station list URL.
    #[arg(long, global = true, env = "SAILCHECK_STATIONS_URL", default_value = DEFAULT_STATIONS_URL, hide = true)]
    pub stations_url: String,

    /// NWS API base URL.
    #[arg(long, global = true, env = "SAILCHECK_WEATHER_URL", default_value = DEFAULT_WEATHER_URL, hide = true)]
    pub weather_url: String,

    /// Nominatim base URL.
    #[arg(long, global = true, env = "SAILCHECK_GEOCODE_URL", default_value = DEFAULT_GEOCODE_URL, hide = true)]
    pub geocode_url: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch tides and weather, then print the sailing decision.
    Check,

    /// Show the last and next tide for --station.
    Tides,

    /// Show the current forecast period for --lat/--lon (or --location).
    Weather,

    /// Resolve a place name to coordinates.
    Geocode {
        /// Free-text place, e.g. "Port Orchard, WA".
        #[arg(value_name = "PLACE")]
        place: String,
    },

    /// Inspect or clear the response cache.
    Cache {
        #[command(subcommand)]
        action: CacheCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum CacheCommands {
    /// List cached entries with their expiry.
    List,
    /// Remove every cached entry.
    Clear,
}

impl Cli {
    fn endpoints(&self) -> Endpoints {
        Endpoints {
            tides: self.tides_url.clone(),
            stations: self.stations_url.clone(),
            weather: self.weather_url.clone(),
            geocode: self.geocode_url.clone(),
        }
    }

    fn request(&self) -> Result<Request> {
        Ok(Request {
            station: self.station.clone(),
            date: self.date,
            target: self.target()?,
        })
    }

    fn target(&self) -> Result<Target> {
        if let Some(place) = &self.location {
            return Ok(Target::Place(place.clone()));
        }
        ensure!(
            (-90.0..=90.0).contains(&self.lat),
            "Latitude {} is out of range",
            self.lat
        );
        ensure!(
            (-180.0..=180.0).contains(&self.lon),
            "Longitude {} is out of range",
            self.lon
        );
        Ok(Target::Coordinates {
            lat: self.lat,
            lon: self.lon,
        })
    }
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<()> {
    let format: OutputFormat = cli.format.parse().unwrap_or_default();
    let render_config = RenderConfig::with_options(format, cli.pretty, !cli.no_color);

    let disk_cache = DiskCache::new(cache_dir(&cli.root));
    debug!(dir = ?disk_cache.dir(), "cache location");

    let cache: &dyn CacheStore = if cli.no_cache { &NoCache } else { &disk_cache };
    let http = HttpJson::new(DEFAULT_TIMEOUT)?;
    let endpoints = cli.endpoints();
    let sources = Sources {
        http: &http,
        cache,
        endpoints: &endpoints,
        tide_ttl: Duration::from_secs(cli.cache_ttl),
    };

    match &cli.command {
        None | Some(Commands::Check) => {
            crate::flows::check::run_check(&sources, &cli.request()?, render_config)
        }

        Some(Commands::Tides) => {
            crate::flows::lookup::run_tides(&sources, &cli.request()?, render_config)
        }

        Some(Commands::Weather) => {
            crate::flows::lookup::run_weather(&sources, &cli.target()?, render_config)
        }

        Some(Commands::Geocode { place }) => {
            crate::backends::geocode::run_geocode(&sources, place, render_config)
        }

        Some(Commands::Cache { action }) => match action {
            CacheCommands::List => crate::cache::store::run_list(&disk_cache, render_config),
            CacheCommands::Clear => crate::cache::store::run_clear(&disk_cache, render_config),
        },
    }
}
