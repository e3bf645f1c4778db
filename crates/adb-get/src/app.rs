//! Request orchestration for the CLI

use std::io::Write;

use artdatabanken_api::filter::{
    DateFilterType, FieldSet, SearchFilter, SearchFilterBuilder, TaxonFilter, VerificationStatus,
};
use artdatabanken_api::{
    ObservationsClient, SearchOptions, SortOrder, TaxonSummary, TaxonomyClient, AREA_TYPES,
};
use chrono::Local;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::args::Cli;
use crate::config::Config;
use crate::display;
use crate::error::{CliError, Result};

const DEFAULT_CULTURE: &str = "sv-SE";

/// Run everything the command line asks for, writing results to `out`
pub async fn run<W: Write>(cli: &Cli, config: &Config, out: &mut W) -> Result<()> {
    let mut handled = false;

    if cli.list_area_types {
        list_area_types(cli, out)?;
        handled = true;
    }

    if cli.get_api_versions {
        let client = observations_client(config)?;
        let info = client.version().await?;
        if cli.pretty_print {
            writeln!(out, "{}", display::format_api_info(&info))?;
        } else {
            write_json(out, &info)?;
        }
        handled = true;
    }

    if cli.list_data_providers {
        let client = observations_client(config)?;
        let providers = client.data_providers().await?;
        if cli.pretty_print {
            for provider in &providers {
                writeln!(out, "{}", display::format_data_provider(provider))?;
            }
        } else {
            write_json(out, &providers)?;
        }
        handled = true;
    }

    if let Some(search) = &cli.search_areas {
        let client = observations_client(config)?;
        let page = client
            .areas(&[], Some(search.as_str()), cli.offset, cli.limit)
            .await?;
        if cli.pretty_print {
            for area in &page.records {
                writeln!(out, "{}", display::format_area(area))?;
            }
        } else {
            write_json(out, &page)?;
        }
        handled = true;
    }

    if cli.taxon_id.is_some() || cli.taxon_name.is_some() {
        let taxon_id = lookup_taxon(cli, config, out).await?;
        if cli.get_observations || cli.show_search_filter {
            observations(cli, config, Some(taxon_id), out).await?;
        }
        handled = true;
    } else if cli.get_observations || cli.show_search_filter {
        if cli.areas.is_empty() {
            return Err(CliError::Usage(
                "--get-observations needs --taxon-id, --taxon-name or --area".to_string(),
            ));
        }
        observations(cli, config, None, out).await?;
        handled = true;
    }

    if !handled {
        return Err(CliError::Usage(
            "nothing to do, give --taxon-id, --taxon-name or one of the listing options (see --help)"
                .to_string(),
        ));
    }

    Ok(())
}

fn write_json<W: Write, T: Serialize + ?Sized>(out: &mut W, value: &T) -> Result<()> {
    writeln!(out, "{}", serde_json::to_string_pretty(value)?)?;
    Ok(())
}

fn observations_client(config: &Config) -> Result<ObservationsClient> {
    let credentials = config.observations_credentials()?;
    Ok(ObservationsClient::with_root_url(&credentials, &config.api_root)?)
}

fn taxonomy_client(config: &Config) -> Result<TaxonomyClient> {
    let credentials = config.species_credentials()?;
    Ok(TaxonomyClient::with_root_url(&credentials, &config.api_root)?)
}

fn list_area_types<W: Write>(cli: &Cli, out: &mut W) -> Result<()> {
    if cli.pretty_print {
        let culture = cli.culture.as_deref().unwrap_or(DEFAULT_CULTURE);
        for info in AREA_TYPES {
            writeln!(out, "{}", display::format_area_type(info, culture))?;
        }
        Ok(())
    } else {
        write_json(out, AREA_TYPES)
    }
}

/// Resolve the taxon given on the command line and print it unless only
/// observations were asked for. Returns the taxon id to search with.
async fn lookup_taxon<W: Write>(cli: &Cli, config: &Config, out: &mut W) -> Result<u32> {
    let print_taxa = !cli.get_observations || cli.print_full_taxon_info;

    if let Some(name) = &cli.taxon_name {
        let species = taxonomy_client(config)?;
        let taxa = species.find_by_name(name, cli.exact_match).await?;
        let Some(first) = taxa.first() else {
            return Err(CliError::TaxonNameNotFound(name.clone()));
        };
        let taxon_id = first.taxon_id;
        if taxa.len() > 1 {
            debug!(name = %name, hits = taxa.len(), taxon_id, "Several taxa match, using the first");
        }

        if print_taxa {
            if cli.print_full_taxon_info {
                print_full_taxa(cli, &species, &taxa, out).await?;
            } else if cli.pretty_print {
                for taxon in &taxa {
                    writeln!(out, "{}", display::format_taxon_summary(taxon))?;
                }
                writeln!(out, "Number of taxa: {}", taxa.len())?;
            } else {
                write_json(out, &taxa)?;
            }
        }
        return Ok(taxon_id);
    }

    let Some(taxon_id) = cli.taxon_id else {
        return Err(CliError::Usage("no taxon given".to_string()));
    };

    // Unknown ids fail here, also when only observations were asked for
    let species = taxonomy_client(config)?;
    let taxon = species
        .find_by_id(taxon_id)
        .await?
        .ok_or(CliError::TaxonIdNotFound(taxon_id))?;

    if print_taxa {
        if cli.pretty_print {
            write!(out, "{}", display::format_taxon(&taxon))?;
        } else {
            write_json(out, &taxon)?;
        }
    }

    Ok(taxon_id)
}

async fn print_full_taxa<W: Write>(
    cli: &Cli,
    species: &TaxonomyClient,
    taxa: &[TaxonSummary],
    out: &mut W,
) -> Result<()> {
    let mut records = Vec::with_capacity(taxa.len());
    for summary in taxa {
        match species.find_by_id(summary.taxon_id).await? {
            Some(taxon) => records.push(taxon),
            None => warn!(taxon_id = summary.taxon_id, "Taxon from name search has no record"),
        }
    }

    if cli.pretty_print {
        for taxon in &records {
            writeln!(out, "{}", display::format_taxon(taxon))?;
        }
        Ok(())
    } else {
        write_json(out, &records)
    }
}

/// Build the observation search filter from the command line
pub fn build_search_filter(cli: &Cli, taxon_id: Option<u32>) -> Result<SearchFilter> {
    let to_date = cli
        .to_date
        .clone()
        .unwrap_or_else(|| Local::now().format("%Y-%m-%dT%H:%M").to_string());

    let mut builder = SearchFilterBuilder::new();
    builder
        .set_date(
            cli.from_date.clone(),
            to_date,
            DateFilterType::OverlappingStartDateAndEndDate,
            [],
        )?
        .set_verification_status(VerificationStatus::BothVerifiedAndNotVerified)
        .set_output(FieldSet::Extended, Vec::<String>::new());

    if let Some(id) = taxon_id {
        builder.set_taxon(TaxonFilter::new([id]));
    }
    if !cli.areas.is_empty() {
        builder.set_geographic_areas(cli.areas.clone());
    }

    Ok(builder.build())
}

async fn observations<W: Write>(
    cli: &Cli,
    config: &Config,
    taxon_id: Option<u32>,
    out: &mut W,
) -> Result<()> {
    let filter = build_search_filter(cli, taxon_id)?;

    if cli.show_search_filter {
        write_json(out, &filter)?;
    }
    if !cli.get_observations {
        return Ok(());
    }

    if cli.sensitive && config.access_token.is_none() {
        warn!("Sensitive observations need an access token, the service will refuse the request");
    }

    let options = SearchOptions {
        skip: cli.offset,
        take: cli.limit,
        sort_by: cli.sort_by.clone(),
        sort_order: SortOrder::from_descending(!cli.sort_reverse),
        culture_code: cli.culture.clone(),
        sensitive: cli.sensitive,
        ..Default::default()
    };

    let client = observations_client(config)?;
    let page = client.search(&filter, &options).await?;
    info!(returned = page.len(), total = page.total_count, "Observations fetched");

    if cli.pretty_print {
        for observation in &page.records {
            writeln!(out, "{}", display::format_observation(observation))?;
        }
        writeln!(
            out,
            "Showing {} of {} observations",
            page.len(),
            page.total_count
        )?;
    } else {
        write_json(out, &page)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigOverrides;
    use axum::extract::Query;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use clap::Parser;
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use tokio::net::TcpListener;

    const SPECIES_PATH: &str = "/information/v1/speciesdataservice/v1/speciesdata";
    const SEARCH_PATH: &str = "/species-observation-system/v1/Observations/Search";

    async fn serve(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    async fn taxon_search(Query(query): Query<HashMap<String, String>>) -> Json<Value> {
        if query.get("searchString").map(String::as_str) == Some("Tajgasångare") {
            Json(json!([
                { "taxonId": 205835, "swedishName": "tajgasångare", "scientificName": "Phylloscopus borealis" }
            ]))
        } else {
            Json(json!([]))
        }
    }

    async fn taxon_by_id(Query(query): Query<HashMap<String, String>>) -> Json<Value> {
        if query.get("taxa").map(String::as_str) == Some("205835") {
            Json(json!([
                { "taxonId": 205835, "swedishName": "tajgasångare", "scientificName": "Phylloscopus borealis" }
            ]))
        } else {
            Json(json!([]))
        }
    }

    async fn search(Json(body): Json<Value>) -> Json<Value> {
        assert_eq!(body["taxon"]["ids"], json!([205835]));
        Json(json!({
            "skip": 0,
            "take": 200,
            "totalCount": 57,
            "records": [
                { "startDate": "2025-04-18T07:30:00", "endDate": "2025-04-18T09:00:00", "owner": "Anna" },
                { "startDate": "2025-04-17T00:00:00", "owner": "Bo" },
                { "startDate": "2025-04-16T06:15:00", "owner": "Cia" }
            ]
        }))
    }

    async fn config_for_stub() -> Config {
        let router = Router::new()
            .route(&format!("{}/search", SPECIES_PATH), get(taxon_search))
            .route(SPECIES_PATH, get(taxon_by_id))
            .route(SEARCH_PATH, post(search));
        let root = serve(router).await;
        Config::resolve(
            ConfigOverrides {
                species_api_key: Some("s-key".to_string()),
                observations_api_key: Some("o-key".to_string()),
                api_root: Some(root),
                ..Default::default()
            },
            |_| None,
        )
    }

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("adb-get").chain(args.iter().copied())).unwrap()
    }

    #[tokio::test]
    async fn test_observations_by_taxon_name() {
        let config = config_for_stub().await;
        let cli = cli(&["--taxon-name", "Tajgasångare", "--exact-match", "-g", "--pretty-print"]);
        let mut out = Vec::new();

        run(&cli, &config, &mut out).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("2025-04-18 07:30-09:00"));
        assert!(text.contains("Showing 3 of 57 observations"));
    }

    #[tokio::test]
    async fn test_raw_output_is_json() {
        let config = config_for_stub().await;
        let cli = cli(&["--taxon-name", "Tajgasångare", "-g"]);
        let mut out = Vec::new();

        run(&cli, &config, &mut out).await.unwrap();

        let page: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(page["totalCount"], 57);
        assert_eq!(page["records"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_unknown_taxon_name_exit_code() {
        let config = config_for_stub().await;
        let cli = cli(&["--taxon-name", "Drake"]);
        let err = run(&cli, &config, &mut Vec::new()).await.unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[tokio::test]
    async fn test_unknown_taxon_id_exit_code() {
        let config = config_for_stub().await;
        let cli = cli(&["--taxon-id", "1"]);
        let err = run(&cli, &config, &mut Vec::new()).await.unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }

    #[tokio::test]
    async fn test_unknown_taxon_id_checked_before_observation_search() {
        let config = config_for_stub().await;
        let cli = cli(&["--taxon-id", "1", "-g"]);
        let mut out = Vec::new();

        let err = run(&cli, &config, &mut out).await.unwrap_err();

        assert_eq!(err.exit_code(), 4);
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_observations_by_taxon_id() {
        let config = config_for_stub().await;
        let cli = cli(&["--taxon-id", "205835", "-g"]);
        let mut out = Vec::new();

        run(&cli, &config, &mut out).await.unwrap();

        let page: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(page["totalCount"], 57);
    }

    #[tokio::test]
    async fn test_pretty_taxon_name_lookup_counts_hits() {
        let config = config_for_stub().await;
        let cli = cli(&["--taxon-name", "Tajgasångare", "--pretty-print"]);
        let mut out = Vec::new();

        run(&cli, &config, &mut out).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Tajgasångare (Phylloscopus borealis) taxon id: 205835"));
        assert!(text.ends_with("Number of taxa: 1\n"));
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_network() {
        let config = Config::resolve(
            ConfigOverrides {
                api_root: Some("http://127.0.0.1:1".to_string()),
                ..Default::default()
            },
            |_| None,
        );
        let cli = cli(&["--taxon-id", "205835", "-g"]);
        let err = run(&cli, &config, &mut Vec::new()).await.unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }

    #[tokio::test]
    async fn test_page_size_rejected_locally() {
        let config = config_for_stub().await;
        let cli = cli(&["--taxon-id", "205835", "-g", "--limit", "1001"]);
        let err = run(&cli, &config, &mut Vec::new()).await.unwrap_err();
        assert_eq!(err.exit_code(), 7);
    }

    #[tokio::test]
    async fn test_nothing_to_do_is_usage_error() {
        let config = Config::resolve(ConfigOverrides::default(), |_| None);
        let err = run(&cli(&[]), &config, &mut Vec::new()).await.unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[tokio::test]
    async fn test_area_types_need_no_key() {
        let config = Config::resolve(ConfigOverrides::default(), |_| None);
        let mut out = Vec::new();
        run(&cli(&["--list-area-types"]), &config, &mut out).await.unwrap();
        let types: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(types.as_array().unwrap().len(), AREA_TYPES.len());
    }

    #[test]
    fn test_search_filter_from_arguments() {
        let cli = cli(&[
            "--from-date",
            "2025-04-01",
            "--to-date",
            "2025-04-30",
            "--area",
            "Municipality:180",
        ]);
        let doc = build_search_filter(&cli, Some(205835)).unwrap().to_value().unwrap();
        assert_eq!(doc["date"]["startDate"], "2025-04-01");
        assert_eq!(doc["date"]["endDate"], "2025-04-30");
        assert_eq!(doc["taxon"]["ids"], json!([205835]));
        assert_eq!(doc["taxon"]["taxonListOperator"], "Merge");
        assert_eq!(doc["geographics"]["areas"][0]["areaType"], "Municipality");
        assert_eq!(doc["geographics"]["areas"][0]["featureId"], "180");
        assert_eq!(doc["verificationStatus"], "BothVerifiedAndNotVerified");
    }

    #[test]
    fn test_reversed_dates_rejected() {
        let cli = cli(&["--from-date", "2025-05-01", "--to-date", "2025-04-01"]);
        let err = build_search_filter(&cli, None).unwrap_err();
        assert_eq!(err.exit_code(), 7);
    }
}
