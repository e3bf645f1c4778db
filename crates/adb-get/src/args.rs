use artdatabanken_api::filter::{AreaType, GeographicArea};
use clap::Parser;

use crate::config::ConfigOverrides;

pub const DEFAULT_FROM_DATE: &str = "1900-01-01T00:00";

/// Look up taxa and observations in the Artdatabanken APIs
///
/// API keys are read from ADB_SPECIES_API_KEY and ADB_OBSERVATIONS_API_KEY
/// unless given as options. Output is the raw JSON returned by the service
/// unless --pretty-print is set.
#[derive(Debug, Parser)]
#[command(name = "adb-get")]
pub struct Cli {
    /// Log requests and responses to stderr
    #[arg(short, long)]
    pub verbose: bool,

    /// Taxon id to look up or search observations for
    #[arg(long, value_name = "ID", conflicts_with = "taxon_name")]
    pub taxon_id: Option<u32>,

    /// Swedish or scientific taxon name
    #[arg(long, value_name = "NAME")]
    pub taxon_name: Option<String>,

    /// Only accept taxa whose Swedish name equals --taxon-name
    #[arg(long, requires = "taxon_name")]
    pub exact_match: bool,

    /// Fetch the full record of each matching taxon
    #[arg(long)]
    pub print_full_taxon_info: bool,

    /// Human readable output instead of raw JSON
    #[arg(long)]
    pub pretty_print: bool,

    /// Print the observation API name, version and status
    #[arg(short = 'V', long)]
    pub get_api_versions: bool,

    /// Search observations of the taxon
    #[arg(short = 'g', long)]
    pub get_observations: bool,

    /// Print the search filter sent with --get-observations
    #[arg(short = 's', long)]
    pub show_search_filter: bool,

    /// Sort ascending instead of descending
    #[arg(short = 'r', long)]
    pub sort_reverse: bool,

    #[arg(long, value_name = "FIELD", default_value = "event.startDate")]
    pub sort_by: String,

    #[arg(long, value_name = "DATE", default_value = DEFAULT_FROM_DATE)]
    pub from_date: String,

    /// Defaults to the current time
    #[arg(long, value_name = "DATE")]
    pub to_date: Option<String>,

    #[arg(long, default_value_t = 0)]
    pub offset: u32,

    #[arg(long, default_value_t = 200)]
    pub limit: u32,

    /// Restrict observations to an area, e.g. Municipality:180
    #[arg(long = "area", value_name = "TYPE:FEATURE_ID", value_parser = parse_area)]
    pub areas: Vec<GeographicArea>,

    /// Translation culture code, e.g. sv-SE or en-GB
    #[arg(long, value_name = "CULTURE")]
    pub culture: Option<String>,

    /// Include sensitive observations (needs an access token)
    #[arg(long)]
    pub sensitive: bool,

    #[arg(long)]
    pub list_data_providers: bool,

    #[arg(long)]
    pub list_area_types: bool,

    /// Search named areas, e.g. municipalities, by name
    #[arg(long, value_name = "STRING")]
    pub search_areas: Option<String>,

    #[arg(long, value_name = "KEY")]
    pub species_api_key: Option<String>,

    #[arg(long, value_name = "KEY")]
    pub observations_api_key: Option<String>,

    #[arg(long, value_name = "TOKEN")]
    pub access_token: Option<String>,

    #[arg(long, value_name = "URL")]
    pub api_root: Option<String>,
}

impl Cli {
    pub fn config_overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            species_api_key: self.species_api_key.clone(),
            observations_api_key: self.observations_api_key.clone(),
            access_token: self.access_token.clone(),
            api_root: self.api_root.clone(),
        }
    }
}

fn parse_area(value: &str) -> Result<GeographicArea, String> {
    let (area_type, feature_id) = value
        .split_once(':')
        .ok_or_else(|| format!("expected TYPE:FEATURE_ID, got '{}'", value))?;
    let area_type: AreaType = area_type.parse().map_err(|e| format!("{}", e))?;
    let feature_id = feature_id.trim();
    if feature_id.is_empty() {
        return Err(format!("missing feature id in '{}'", value));
    }
    Ok(GeographicArea::new(area_type, feature_id))
}
