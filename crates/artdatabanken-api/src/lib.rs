//! Rust client for the Artdatabanken (Swedish Species Information Centre) APIs
//!
//! Covers the Species Observation System (SOS) observation search and the
//! species information service. Both need a subscription key from the
//! Artdatabanken API portal; the two products use separate keys.
//!
//! # Example
//!
//! ```no_run
//! use artdatabanken_api::filter::{DateFilterType, SearchFilterBuilder, TaxonFilter};
//! use artdatabanken_api::{Credentials, ObservationsClient, SearchOptions, TaxonomyClient};
//!
//! # async fn example() -> Result<(), artdatabanken_api::ApiError> {
//! let species = TaxonomyClient::new(&Credentials::new("species-key"))?;
//! let observations = ObservationsClient::new(&Credentials::new("observations-key"))?;
//!
//! // Resolve a Swedish name to a taxon id
//! let taxa = species.find_by_name("Tajgasångare", true).await?;
//! let Some(taxon) = taxa.first() else { return Ok(()) };
//!
//! // Search observations of that taxon during one day
//! let mut builder = SearchFilterBuilder::new();
//! builder
//!     .set_date("2025-04-18", "2025-04-18", DateFilterType::OverlappingStartDateAndEndDate, [])?
//!     .set_taxon(TaxonFilter::new([taxon.taxon_id]));
//!
//! let page = observations.search(&builder.build(), &SearchOptions::default()).await?;
//! println!("{} of {} observations", page.len(), page.total_count);
//! # Ok(())
//! # }
//! ```
//!
//! # API Coverage
//!
//! ## Species Observation System v1
//! - `POST /Observations/Search` - Search observations with a search filter
//! - `GET /Observations/{id}` - Get a single observation
//! - `GET /api/ApiInfo` - API version and status
//! - `GET /DataProviders` - Data providers
//! - `GET /Areas` - Search named areas
//!
//! ## Species information
//! - `GET /speciesdata/search` - Search taxa by name
//! - `GET /speciesdata?taxa={id}` - Get taxon records

use std::time::Duration;

mod auth;
pub mod date;
mod error;
pub mod filter;
mod http;
mod observations;
mod taxonomy;
mod types;

#[cfg(test)]
mod test_support;

pub use auth::{Credentials, SUBSCRIPTION_KEY_HEADER};
pub use error::{ApiError, Result};
pub use filter::{SearchFilter, SearchFilterBuilder};
pub use observations::{
    validate_page_size, ObservationOptions, ObservationsClient, SearchOptions, SortOrder,
    MAX_PAGE_SIZE,
};
pub use taxonomy::TaxonomyClient;
pub use types::{
    ApiInfo, Area, AreaTypeInfo, Coordinate, DataProvider, Observation, ObservationId, Page,
    RedlistInfo, RedlistPeriod, Site, SpeciesData, Taxon, TaxonRelatedInformation, TaxonSummary,
    AREA_TYPES, WGS84_COORDINATE_SYSTEM_ID,
};

/// Root URL of the production services
pub const DEFAULT_ROOT_URL: &str = "https://api.artdatabanken.se";

/// Transport timeout applied to every request
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
