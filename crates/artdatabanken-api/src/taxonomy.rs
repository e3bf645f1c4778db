//! Client for the species information (Artfakta species data) API

use std::time::Duration;

use tracing::debug;

use crate::auth::Credentials;
use crate::error::Result;
use crate::http::{build_client, fetch_json, normalize_root_url};
use crate::types::{Taxon, TaxonSummary};
use crate::{DEFAULT_ROOT_URL, DEFAULT_TIMEOUT};

/// Resolves taxon names and ids to taxon records
pub struct TaxonomyClient {
    http: reqwest::Client,
    base_url: String,
}

impl TaxonomyClient {
    const API_PATH: &'static str = "/information/v1/speciesdataservice/v1/speciesdata";

    pub fn new(credentials: &Credentials) -> Result<Self> {
        Self::with_root_url(credentials, DEFAULT_ROOT_URL)
    }

    pub fn with_root_url(credentials: &Credentials, root_url: &str) -> Result<Self> {
        Self::with_root_url_and_timeout(credentials, root_url, DEFAULT_TIMEOUT)
    }

    pub fn with_root_url_and_timeout(
        credentials: &Credentials,
        root_url: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let http = build_client(credentials, timeout)?;
        Ok(Self {
            http,
            base_url: format!("{}{}", normalize_root_url(root_url), Self::API_PATH),
        })
    }

    /// Search taxa by Swedish or scientific name
    ///
    /// With `exact_match`, only hits whose Swedish name equals `name`
    /// (ignoring case) are kept. An empty result means nothing matched.
    pub async fn find_by_name(&self, name: &str, exact_match: bool) -> Result<Vec<TaxonSummary>> {
        let url = format!(
            "{}/search?searchString={}",
            self.base_url,
            urlencoding::encode(name)
        );
        debug!(url = %url, "GET taxon search");

        let hits: Vec<TaxonSummary> = fetch_json(self.http.get(&url)).await?;
        if !exact_match {
            return Ok(hits);
        }

        let wanted = name.trim().to_lowercase();
        let matches: Vec<TaxonSummary> = hits
            .into_iter()
            .filter(|hit| {
                hit.swedish_name
                    .as_deref()
                    .map(|n| n.trim().to_lowercase() == wanted)
                    .unwrap_or(false)
            })
            .collect();

        debug!(name = %name, matches = matches.len(), "Exact taxon name match");
        Ok(matches)
    }

    /// Get the full record of a taxon, `Ok(None)` if the id is unknown
    pub async fn find_by_id(&self, id: u32) -> Result<Option<Taxon>> {
        let url = format!("{}?taxa={}", self.base_url, id);
        debug!(url = %url, "GET taxon");

        let taxa: Vec<Taxon> = fetch_json(self.http.get(&url)).await?;
        Ok(taxa.into_iter().next())
    }
}
