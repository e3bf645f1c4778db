//! Client for the Species Observation System (SOS) API

use std::fmt;
use std::time::Duration;

use tracing::{debug, info};

use crate::auth::Credentials;
use crate::error::{ApiError, Result};
use crate::filter::{FieldSet, SearchFilter};
use crate::http::{build_client, fetch_json, fetch_optional_json, normalize_root_url};
use crate::types::{ApiInfo, Area, AreaTypeInfo, DataProvider, Observation, Page, AREA_TYPES};
use crate::{DEFAULT_ROOT_URL, DEFAULT_TIMEOUT};

/// Largest page the service hands out in one request
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Sort direction of a search
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn from_descending(descending: bool) -> Self {
        if descending {
            Self::Desc
        } else {
            Self::Asc
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => f.write_str("Asc"),
            Self::Desc => f.write_str("Desc"),
        }
    }
}

/// Paging, sorting and presentation parameters of a search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    pub skip: u32,
    /// Page size, 1 to [`MAX_PAGE_SIZE`]
    pub take: u32,
    /// Field path to sort on
    pub sort_by: String,
    pub sort_order: SortOrder,
    /// Ask the service to validate the filter before searching
    pub validate_filter: bool,
    /// `sv-SE` or `en-GB`; the service default when unset
    pub culture_code: Option<String>,
    /// Search only sensitive observations
    pub sensitive: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            skip: 0,
            take: 100,
            sort_by: ObservationsClient::DEFAULT_SORT_BY.to_string(),
            sort_order: SortOrder::Desc,
            validate_filter: false,
            culture_code: None,
            sensitive: false,
        }
    }
}

/// Parameters for fetching a single observation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservationOptions {
    pub output_field_set: FieldSet,
    pub culture_code: Option<String>,
    pub sensitive: bool,
}

impl Default for ObservationOptions {
    fn default() -> Self {
        Self {
            output_field_set: FieldSet::All,
            culture_code: None,
            sensitive: false,
        }
    }
}

/// Reject page sizes the service would refuse
pub fn validate_page_size(take: u32) -> Result<()> {
    if !(1..=MAX_PAGE_SIZE).contains(&take) {
        return Err(ApiError::InvalidFilter(format!(
            "take must be between 1 and {}, got {}",
            MAX_PAGE_SIZE, take
        )));
    }
    Ok(())
}

/// Client for the SOS observation endpoints
///
/// Holds no state besides the HTTP client and root URL, so a shared
/// reference can be used from several tasks at once.
pub struct ObservationsClient {
    http: reqwest::Client,
    base_url: String,
}

impl ObservationsClient {
    /// Default sort field of a search
    pub const DEFAULT_SORT_BY: &'static str = "event.startDate";

    const API_PATH: &'static str = "/species-observation-system/v1";

    /// Create a client against the production service
    pub fn new(credentials: &Credentials) -> Result<Self> {
        Self::with_root_url(credentials, DEFAULT_ROOT_URL)
    }

    /// Create a client against another deployment of the service
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

    /// Search observations matching `filter`.
    ///
    /// Returns one page; `total_count` on the page tells how many matches the
    /// service has in total. The page size is checked before anything is sent.
    ///
    /// # Arguments
    /// * `filter` - A built search filter, sent as the request body
    /// * `options` - Paging, sorting and presentation parameters
    pub async fn search(
        &self,
        filter: &SearchFilter,
        options: &SearchOptions,
    ) -> Result<Page<Observation>> {
        validate_page_size(options.take)?;

        let mut url = format!(
            "{}/Observations/Search?skip={}&take={}&sortBy={}&sortOrder={}&validateSearchFilter={}",
            self.base_url,
            options.skip,
            options.take,
            urlencoding::encode(&options.sort_by),
            options.sort_order,
            options.validate_filter
        );
        if let Some(culture) = &options.culture_code {
            url.push_str(&format!(
                "&translationCultureCode={}",
                urlencoding::encode(culture)
            ));
        }
        url.push_str(&format!("&sensitiveObservations={}", options.sensitive));

        debug!(url = %url, body = %filter.to_json()?, "POST observation search");

        let page: Page<Observation> = fetch_json(self.http.post(&url).json(filter)).await?;

        info!(
            returned = page.len(),
            total = page.total_count,
            skip = options.skip,
            "Observation search complete"
        );

        Ok(page)
    }

    /// Fetch a single observation by id. Unknown ids give `Ok(None)`.
    pub async fn observation(
        &self,
        id: &str,
        options: &ObservationOptions,
    ) -> Result<Option<Observation>> {
        let mut url = format!(
            "{}/Observations/{}?outputFieldSet={}",
            self.base_url,
            urlencoding::encode(id),
            options.output_field_set
        );
        if let Some(culture) = &options.culture_code {
            url.push_str(&format!(
                "&translationCultureCode={}",
                urlencoding::encode(culture)
            ));
        }
        url.push_str(&format!("&sensitiveObservations={}", options.sensitive));

        debug!(url = %url, "GET observation");
        fetch_optional_json(self.http.get(&url)).await
    }

    /// API name, version and status. Doubles as a health check.
    pub async fn version(&self) -> Result<ApiInfo> {
        let url = format!("{}/api/ApiInfo", self.base_url);
        debug!(url = %url, "GET api info");
        fetch_json(self.http.get(&url)).await
    }

    /// Succeeds when the service answers the info endpoint
    pub async fn ping(&self) -> Result<()> {
        self.version().await.map(|_| ())
    }

    /// Data providers that deliver observations, for use with
    /// [`SearchFilterBuilder::set_data_provider`](crate::filter::SearchFilterBuilder::set_data_provider)
    pub async fn data_providers(&self) -> Result<Vec<DataProvider>> {
        let url = format!("{}/DataProviders", self.base_url);
        debug!(url = %url, "GET data providers");
        fetch_json(self.http.get(&url)).await
    }

    /// Area type vocabulary. Static, no request is made.
    pub fn area_types(&self) -> &'static [AreaTypeInfo] {
        AREA_TYPES
    }

    /// Search named areas
    ///
    /// # Arguments
    /// * `type_codes` - Area type codes from [`area_types`](Self::area_types), empty for all
    /// * `search_string` - Optional name filter
    /// * `skip` - Number of areas to skip
    /// * `take` - Page size, 1 to [`MAX_PAGE_SIZE`]
    pub async fn areas(
        &self,
        type_codes: &[u32],
        search_string: Option<&str>,
        skip: u32,
        take: u32,
    ) -> Result<Page<Area>> {
        validate_page_size(take)?;

        let mut params: Vec<String> = type_codes
            .iter()
            .map(|code| format!("areaTypes={}", code))
            .collect();
        if let Some(s) = search_string.filter(|s| !s.is_empty()) {
            params.push(format!("searchString={}", urlencoding::encode(s)));
        }
        params.push(format!("skip={}", skip));
        params.push(format!("take={}", take));

        let url = format!("{}/Areas?{}", self.base_url, params.join("&"));
        debug!(url = %url, "GET areas");
        fetch_json(self.http.get(&url)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::SUBSCRIPTION_KEY_HEADER;
    use crate::filter::{SearchFilterBuilder, TaxonFilter};
    use crate::test_support::{header, serve, Captured, CapturedRequest};
    use axum::extract::{Path, Query, RawQuery, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;

    async fn search_stub(
        State(captured): State<Captured>,
        headers: HeaderMap,
        Query(query): Query<HashMap<String, String>>,
        Json(body): Json<Value>,
    ) -> Json<Value> {
        captured.lock().unwrap().push(CapturedRequest {
            query,
            subscription_key: header(&headers, SUBSCRIPTION_KEY_HEADER),
            authorization: header(&headers, "authorization"),
            body: Some(body),
            ..Default::default()
        });
        Json(json!({
            "records": [
                { "id": 1, "startDate": "2022-02-12T08:00:00", "endDate": "2022-02-12T08:00:00" },
                { "id": 2 },
                { "id": 3 }
            ],
            "pager": { "totalCount": 57 }
        }))
    }

    async fn observation_stub(Path(id): Path<String>) -> impl IntoResponse {
        if id == "42" {
            (StatusCode::OK, Json(json!({ "id": 42, "owner": "Anna" }))).into_response()
        } else {
            StatusCode::NOT_FOUND.into_response()
        }
    }

    async fn areas_stub(
        State(captured): State<Captured>,
        RawQuery(raw_query): RawQuery,
    ) -> Json<Value> {
        captured.lock().unwrap().push(CapturedRequest {
            raw_query,
            ..Default::default()
        });
        Json(json!({
            "skip": 0,
            "take": 2,
            "totalCount": 290,
            "records": [
                { "areaType": "Municipality", "featureId": "180", "name": "Stockholm" },
                { "areaType": "Municipality", "featureId": "181", "name": "Södertälje" }
            ]
        }))
    }

    async fn stub_client(credentials: Credentials) -> (ObservationsClient, Captured) {
        let captured = Captured::default();
        let api = "/species-observation-system/v1";
        let router = Router::new()
            .route(&format!("{}/Observations/Search", api), post(search_stub))
            .route(&format!("{}/Observations/{{id}}", api), get(observation_stub))
            .route(&format!("{}/Areas", api), get(areas_stub))
            .route(
                &format!("{}/api/ApiInfo", api),
                get(|| async {
                    Json(json!({ "apiName": "SOS Observations API", "apiVersion": "1.5", "apiStatus": "Active" }))
                }),
            )
            .route(
                &format!("{}/DataProviders", api),
                get(|| async {
                    Json(json!([
                        { "id": 1, "identifier": "ArtportalenObservations", "name": "Artportalen", "publicObservations": 100 }
                    ]))
                }),
            )
            .with_state(captured.clone());
        let root = serve(router).await;
        let client = ObservationsClient::with_root_url(&credentials, &root).unwrap();
        (client, captured)
    }

    fn test_filter() -> SearchFilter {
        let mut builder = SearchFilterBuilder::new();
        builder.set_taxon(TaxonFilter::new([4000104]));
        builder.build()
    }

    #[tokio::test]
    async fn test_search_keeps_page_and_total_apart() {
        let (client, captured) = stub_client(Credentials::new("obs-key")).await;
        let options = SearchOptions {
            take: 3,
            ..Default::default()
        };

        let page = client.search(&test_filter(), &options).await.unwrap();

        assert_eq!(page.len(), 3);
        assert_eq!(page.total_count, 57);
        assert_eq!(page.records[0].id, Some(crate::types::ObservationId::Number(1)));
        assert_eq!(captured.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_search_request_shape() {
        let credentials = Credentials::new("obs-key").with_access_token("tok");
        let (client, captured) = stub_client(credentials).await;
        let options = SearchOptions {
            skip: 20,
            take: 10,
            sort_order: SortOrder::Asc,
            validate_filter: true,
            culture_code: Some("en-GB".to_string()),
            ..Default::default()
        };
        let filter = test_filter();

        client.search(&filter, &options).await.unwrap();

        let requests = captured.lock().unwrap();
        let req = &requests[0];
        assert_eq!(req.query["skip"], "20");
        assert_eq!(req.query["take"], "10");
        assert_eq!(req.query["sortBy"], "event.startDate");
        assert_eq!(req.query["sortOrder"], "Asc");
        assert_eq!(req.query["validateSearchFilter"], "true");
        assert_eq!(req.query["translationCultureCode"], "en-GB");
        assert_eq!(req.query["sensitiveObservations"], "false");
        assert_eq!(req.subscription_key.as_deref(), Some("obs-key"));
        assert_eq!(req.authorization.as_deref(), Some("Bearer {tok}"));
        assert_eq!(req.body.as_ref().unwrap(), &filter.to_value().unwrap());
    }

    #[tokio::test]
    async fn test_search_omits_culture_when_unset() {
        let (client, captured) = stub_client(Credentials::new("obs-key")).await;
        client
            .search(&test_filter(), &SearchOptions::default())
            .await
            .unwrap();

        let requests = captured.lock().unwrap();
        assert!(!requests[0].query.contains_key("translationCultureCode"));
        assert_eq!(requests[0].query["sortOrder"], "Desc");
        assert!(requests[0].authorization.is_none());
    }

    #[tokio::test]
    async fn test_search_page_size_boundaries() {
        let (client, captured) = stub_client(Credentials::new("obs-key")).await;
        let filter = test_filter();

        for take in [0, 1001] {
            let options = SearchOptions {
                take,
                ..Default::default()
            };
            let err = client.search(&filter, &options).await.unwrap_err();
            assert!(matches!(err, ApiError::InvalidFilter(_)), "take={}", take);
        }
        assert!(captured.lock().unwrap().is_empty());

        for take in [1, 1000] {
            let options = SearchOptions {
                take,
                ..Default::default()
            };
            client.search(&filter, &options).await.unwrap();
        }
        let requests = captured.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].query["take"], "1");
        assert_eq!(requests[1].query["take"], "1000");
    }

    #[tokio::test]
    async fn test_search_remote_error() {
        let router = Router::new().route(
            "/species-observation-system/v1/Observations/Search",
            post(|| async { (StatusCode::BAD_REQUEST, "Invalid search filter") }),
        );
        let root = serve(router).await;
        let client = ObservationsClient::with_root_url(&Credentials::new("k"), &root).unwrap();

        let err = client
            .search(&test_filter(), &SearchOptions::default())
            .await
            .unwrap_err();

        match err {
            ApiError::Remote { status, body } => {
                assert_eq!(status, 400);
                assert_eq!(body, "Invalid search filter");
            }
            other => panic!("expected remote error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_transport_error_is_not_remote() {
        let client = ObservationsClient::with_root_url_and_timeout(
            &Credentials::new("k"),
            "http://127.0.0.1:1",
            Duration::from_secs(2),
        )
        .unwrap();

        let err = client.version().await.unwrap_err();
        assert!(matches!(err, ApiError::Http(_)));
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_empty_key_fails_before_network() {
        let result = ObservationsClient::new(&Credentials::new(""));
        assert!(matches!(result, Err(ApiError::Config(_))));
    }

    #[tokio::test]
    async fn test_observation_by_id() {
        let (client, _) = stub_client(Credentials::new("k")).await;
        let options = ObservationOptions::default();

        let found = client.observation("42", &options).await.unwrap().unwrap();
        assert_eq!(found.owner.as_deref(), Some("Anna"));

        assert!(client.observation("7", &options).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_version_and_ping() {
        let (client, _) = stub_client(Credentials::new("k")).await;
        let info = client.version().await.unwrap();
        assert_eq!(info.api_version.as_deref(), Some("1.5"));
        assert!(client.ping().await.is_ok());
    }

    #[tokio::test]
    async fn test_data_providers() {
        let (client, _) = stub_client(Credentials::new("k")).await;
        let providers = client.data_providers().await.unwrap();
        assert_eq!(providers.len(), 1);
        assert_eq!(providers[0].id, 1);
        assert_eq!(providers[0].name.as_deref(), Some("Artportalen"));
    }

    #[tokio::test]
    async fn test_areas_query() {
        let (client, captured) = stub_client(Credentials::new("k")).await;
        let page = client
            .areas(&[1, 21], Some("Stock holm"), 0, 2)
            .await
            .unwrap();

        assert_eq!(page.len(), 2);
        assert_eq!(page.total_count, 290);
        let requests = captured.lock().unwrap();
        assert_eq!(
            requests[0].raw_query.as_deref(),
            Some("areaTypes=1&areaTypes=21&searchString=Stock%20holm&skip=0&take=2")
        );
    }

    #[tokio::test]
    async fn test_areas_page_size_checked() {
        let (client, captured) = stub_client(Credentials::new("k")).await;
        assert!(client.areas(&[], None, 0, 1001).await.is_err());
        assert!(captured.lock().unwrap().is_empty());
    }

    #[test]
    fn test_area_types_are_static() {
        let client = ObservationsClient::new(&Credentials::new("k")).unwrap();
        let types = client.area_types();
        assert!(types.iter().any(|t| t.code == 1 && t.sv_se == "Kommun"));
    }

    #[test]
    fn test_sort_order_from_descending() {
        assert_eq!(SortOrder::from_descending(true), SortOrder::Desc);
        assert_eq!(SortOrder::from_descending(false).to_string(), "Asc");
    }

    #[test]
    fn test_validate_page_size() {
        assert!(validate_page_size(0).is_err());
        assert!(validate_page_size(1).is_ok());
        assert!(validate_page_size(1000).is_ok());
        assert!(validate_page_size(1001).is_err());
    }
}
