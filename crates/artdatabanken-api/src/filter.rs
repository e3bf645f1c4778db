//! Search filter for the SOS observation search endpoint
//!
//! The filter is sent as the JSON body of `POST Observations/Search`. Field
//! names and nesting mirror the remote `SearchFilterDto` schema exactly; every
//! section is optional and sections that were never set are left out of the
//! document entirely.
//!
//! ```
//! use artdatabanken_api::filter::{DateFilterType, SearchFilterBuilder, TaxonFilter};
//!
//! # fn example() -> artdatabanken_api::Result<()> {
//! let mut builder = SearchFilterBuilder::new();
//! builder
//!     .set_date("2022-02-12", "2022-02-12", DateFilterType::OverlappingStartDateAndEndDate, [])?
//!     .set_taxon(TaxonFilter::new([4000104]));
//! let json = builder.build().to_json()?;
//! assert!(json.contains("\"taxonListOperator\":\"Merge\""));
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::date::compare_timestamps;
use crate::error::{ApiError, Result};
use crate::types::AREA_TYPES;

/// Data providers to include, empty means all
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataProviderFilter {
    pub ids: Vec<u32>,
}

/// Datasets to include, empty means all
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataStewardshipFilter {
    pub dataset_identifiers: Vec<String>,
}

/// How an observation's time interval is matched against the filter dates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateFilterType {
    BetweenStartDateAndEndDate,
    #[default]
    OverlappingStartDateAndEndDate,
    OnlyStartDate,
    OnlyEndDate,
}

/// Part of the day an observation was made
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeRange {
    Morning,
    Forenoon,
    Afternoon,
    Evening,
    Night,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateFilter {
    pub start_date: String,
    pub end_date: String,
    pub date_filter_type: DateFilterType,
    pub time_ranges: Vec<TimeRange>,
}

/// Bounds on when a record was last modified. Unset bounds serialize as `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifiedDateFilter {
    pub from: Option<String>,
    pub to: Option<String>,
}

/// Kinds of named areas the service knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AreaType {
    Municipality,
    Community,
    Sea,
    CountryRegion,
    NatureType,
    Province,
    Ramsar,
    BirdValidationArea,
    Parish,
    Spa,
    County,
    ProtectedNature,
    SwedishForestAgencyDistricts,
    Sci,
    WaterArea,
    Atlas5x5,
    Atlas10x10,
    SfvDistricts,
    Campus,
}

impl AreaType {
    pub const ALL: [AreaType; 19] = [
        Self::Municipality,
        Self::Community,
        Self::Sea,
        Self::CountryRegion,
        Self::NatureType,
        Self::Province,
        Self::Ramsar,
        Self::BirdValidationArea,
        Self::Parish,
        Self::Spa,
        Self::County,
        Self::ProtectedNature,
        Self::SwedishForestAgencyDistricts,
        Self::Sci,
        Self::WaterArea,
        Self::Atlas5x5,
        Self::Atlas10x10,
        Self::SfvDistricts,
        Self::Campus,
    ];

    /// Name used on the wire
    pub fn name(self) -> &'static str {
        match self {
            Self::Municipality => "Municipality",
            Self::Community => "Community",
            Self::Sea => "Sea",
            Self::CountryRegion => "CountryRegion",
            Self::NatureType => "NatureType",
            Self::Province => "Province",
            Self::Ramsar => "Ramsar",
            Self::BirdValidationArea => "BirdValidationArea",
            Self::Parish => "Parish",
            Self::Spa => "Spa",
            Self::County => "County",
            Self::ProtectedNature => "ProtectedNature",
            Self::SwedishForestAgencyDistricts => "SwedishForestAgencyDistricts",
            Self::Sci => "Sci",
            Self::WaterArea => "WaterArea",
            Self::Atlas5x5 => "Atlas5x5",
            Self::Atlas10x10 => "Atlas10x10",
            Self::SfvDistricts => "SfvDistricts",
            Self::Campus => "Campus",
        }
    }

    /// Numeric code accepted by the `Areas` endpoint, when one is published
    pub fn code(self) -> Option<u32> {
        AREA_TYPES
            .iter()
            .find(|info| info.area_type == self)
            .map(|info| info.code)
    }
}

impl fmt::Display for AreaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AreaType {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ApiError::InvalidFilter(format!("unknown area type '{}'", s)))
    }
}

/// A named area, e.g. municipality 180 (Stockholm)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeographicArea {
    pub area_type: AreaType,
    pub feature_id: String,
}

impl GeographicArea {
    pub fn new(area_type: AreaType, feature_id: impl Into<String>) -> Self {
        Self {
            area_type,
            feature_id: feature_id.into(),
        }
    }
}

/// GeoJSON shape in WGS84. Coordinates are `[longitude, latitude]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GeoShape {
    Point { coordinates: [f64; 2] },
    Polygon { coordinates: Vec<Vec<[f64; 2]>> },
}

impl GeoShape {
    pub fn point(latitude: f64, longitude: f64) -> Self {
        Self::Point {
            coordinates: [longitude, latitude],
        }
    }

    /// Polygon from a single exterior ring of `(latitude, longitude)` pairs.
    /// The ring is closed if the last vertex differs from the first.
    pub fn polygon(ring: &[(f64, f64)]) -> Self {
        let mut coords: Vec<[f64; 2]> = ring.iter().map(|&(lat, lon)| [lon, lat]).collect();
        if let (Some(first), Some(last)) = (coords.first().copied(), coords.last().copied()) {
            if first != last {
                coords.push(first);
            }
        }
        Self::Polygon {
            coordinates: vec![coords],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub bottom_right: LatLon,
    pub top_left: LatLon,
}

/// Geographic restriction. The three forms are mutually exclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Geographics {
    Areas {
        areas: Vec<GeographicArea>,
    },
    #[serde(rename_all = "camelCase")]
    Geometries {
        geometries: Vec<GeoShape>,
        #[serde(default)]
        consider_disturbance_radius: bool,
        #[serde(default)]
        consider_observation_accuracy: bool,
        max_distance_from_point: Option<f64>,
    },
    #[serde(rename_all = "camelCase")]
    BoundingBox { bounding_box: BoundingBox },
}

/// Red list categories as used by the Swedish red list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RedListCategory {
    DD,
    EX,
    RE,
    CR,
    EN,
    VU,
    NT,
    LC,
    NA,
    NE,
}

/// How `ids` and `taxonListIds` are combined
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaxonListOperator {
    #[default]
    Merge,
    Filter,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxonFilter {
    pub include_underlying_taxa: bool,
    pub ids: Vec<u32>,
    pub taxon_list_ids: Vec<u32>,
    pub red_list_categories: Vec<RedListCategory>,
    pub taxon_categories: Vec<u32>,
    pub taxon_list_operator: TaxonListOperator,
}

impl TaxonFilter {
    /// Filter on the given taxa and everything below them, merged with any taxon lists
    pub fn new(ids: impl IntoIterator<Item = u32>) -> Self {
        Self {
            include_underlying_taxa: true,
            ids: ids.into_iter().collect(),
            taxon_list_ids: Vec::new(),
            red_list_categories: Vec::new(),
            taxon_categories: Vec::new(),
            taxon_list_operator: TaxonListOperator::Merge,
        }
    }

    pub fn include_underlying_taxa(mut self, include: bool) -> Self {
        self.include_underlying_taxa = include;
        self
    }

    pub fn with_taxon_lists(mut self, list_ids: impl IntoIterator<Item = u32>) -> Self {
        self.taxon_list_ids = list_ids.into_iter().collect();
        self
    }

    pub fn with_red_list_categories(
        mut self,
        categories: impl IntoIterator<Item = RedListCategory>,
    ) -> Self {
        self.red_list_categories = categories.into_iter().collect();
        self
    }

    pub fn with_taxon_categories(mut self, categories: impl IntoIterator<Item = u32>) -> Self {
        self.taxon_categories = categories.into_iter().collect();
        self
    }

    pub fn with_operator(mut self, operator: TaxonListOperator) -> Self {
        self.taxon_list_operator = operator;
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerificationStatus {
    Verified,
    NotVerified,
    #[default]
    BothVerifiedAndNotVerified,
}

/// Predefined sets of observation fields returned by a search
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldSet {
    #[default]
    Minimum,
    Extended,
    AllWithKnownValues,
    All,
}

impl fmt::Display for FieldSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Minimum => "Minimum",
            Self::Extended => "Extended",
            Self::AllWithKnownValues => "AllWithKnownValues",
            Self::All => "All",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputFilter {
    pub field_set: FieldSet,
    pub fields: Vec<String>,
}

/// A finished search filter, ready to be sent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data_provider: Option<DataProviderFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data_stewardship: Option<DataStewardshipFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    date: Option<DateFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    geographics: Option<Geographics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    modified_date: Option<ModifiedDateFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    taxon: Option<TaxonFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    verification_status: Option<VerificationStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    output: Option<OutputFilter>,
}

impl SearchFilter {
    pub fn builder() -> SearchFilterBuilder {
        SearchFilterBuilder::new()
    }

    pub fn data_provider(&self) -> Option<&DataProviderFilter> {
        self.data_provider.as_ref()
    }

    pub fn data_stewardship(&self) -> Option<&DataStewardshipFilter> {
        self.data_stewardship.as_ref()
    }

    pub fn date(&self) -> Option<&DateFilter> {
        self.date.as_ref()
    }

    pub fn geographics(&self) -> Option<&Geographics> {
        self.geographics.as_ref()
    }

    pub fn modified_date(&self) -> Option<&ModifiedDateFilter> {
        self.modified_date.as_ref()
    }

    pub fn taxon(&self) -> Option<&TaxonFilter> {
        self.taxon.as_ref()
    }

    pub fn verification_status(&self) -> Option<VerificationStatus> {
        self.verification_status
    }

    pub fn output(&self) -> Option<&OutputFilter> {
        self.output.as_ref()
    }

    /// Canonical JSON document sent as the request body
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_value(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Accumulates filter sections. Every setter replaces its section wholesale.
#[derive(Debug, Clone)]
pub struct SearchFilterBuilder {
    filter: SearchFilter,
}

impl SearchFilterBuilder {
    /// Builder preloaded with the sections the service expects on every
    /// search: all data providers, all datasets, and today's date.
    pub fn new() -> Self {
        let today = Local::now().format("%Y-%m-%d").to_string();
        Self {
            filter: SearchFilter {
                data_provider: Some(DataProviderFilter::default()),
                data_stewardship: Some(DataStewardshipFilter::default()),
                date: Some(DateFilter {
                    start_date: today.clone(),
                    end_date: today,
                    date_filter_type: DateFilterType::default(),
                    time_ranges: Vec::new(),
                }),
                ..SearchFilter::default()
            },
        }
    }

    /// Builder with no sections at all
    pub fn empty() -> Self {
        Self {
            filter: SearchFilter::default(),
        }
    }

    /// Restrict to data providers, see `ObservationsClient::data_providers`
    pub fn set_data_provider(&mut self, ids: impl IntoIterator<Item = u32>) -> &mut Self {
        self.filter.data_provider = Some(DataProviderFilter {
            ids: ids.into_iter().collect(),
        });
        self
    }

    pub fn set_data_stewardship<S: Into<String>>(
        &mut self,
        dataset_ids: impl IntoIterator<Item = S>,
    ) -> &mut Self {
        self.filter.data_stewardship = Some(DataStewardshipFilter {
            dataset_identifiers: dataset_ids.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Set the date interval.
    ///
    /// Fails with [`ApiError::InvalidFilter`] when both bounds are readable
    /// dates and `start` is after `end`. Bounds that are not readable dates are
    /// passed through for the service to judge.
    pub fn set_date(
        &mut self,
        start: impl Into<String>,
        end: impl Into<String>,
        filter_type: DateFilterType,
        time_ranges: impl IntoIterator<Item = TimeRange>,
    ) -> Result<&mut Self> {
        let start = start.into();
        let end = end.into();

        if compare_timestamps(&start, &end) == Some(Ordering::Greater) {
            return Err(ApiError::InvalidFilter(format!(
                "startDate {} is after endDate {}",
                start, end
            )));
        }

        self.filter.date = Some(DateFilter {
            start_date: start,
            end_date: end,
            date_filter_type: filter_type,
            time_ranges: time_ranges.into_iter().collect(),
        });
        Ok(self)
    }

    pub fn set_modified_date(&mut self, from: Option<String>, to: Option<String>) -> &mut Self {
        self.filter.modified_date = Some(ModifiedDateFilter { from, to });
        self
    }

    pub fn set_geographic_areas(
        &mut self,
        areas: impl IntoIterator<Item = GeographicArea>,
    ) -> &mut Self {
        self.filter.geographics = Some(Geographics::Areas {
            areas: areas.into_iter().collect(),
        });
        self
    }

    pub fn set_geographic_geometries(
        &mut self,
        geometries: impl IntoIterator<Item = GeoShape>,
        consider_disturbance_radius: bool,
        consider_observation_accuracy: bool,
        max_distance_from_point: Option<f64>,
    ) -> &mut Self {
        self.filter.geographics = Some(Geographics::Geometries {
            geometries: geometries.into_iter().collect(),
            consider_disturbance_radius,
            consider_observation_accuracy,
            max_distance_from_point,
        });
        self
    }

    /// Restrict to a WGS84 bounding box
    pub fn set_geographic_bounding_box(
        &mut self,
        bottom_right_latitude: f64,
        bottom_right_longitude: f64,
        top_left_latitude: f64,
        top_left_longitude: f64,
    ) -> Result<&mut Self> {
        for lat in [bottom_right_latitude, top_left_latitude] {
            if !(-90.0..=90.0).contains(&lat) {
                return Err(ApiError::InvalidFilter(format!(
                    "latitude {} out of range",
                    lat
                )));
            }
        }
        for lon in [bottom_right_longitude, top_left_longitude] {
            if !(-180.0..=180.0).contains(&lon) {
                return Err(ApiError::InvalidFilter(format!(
                    "longitude {} out of range",
                    lon
                )));
            }
        }

        self.filter.geographics = Some(Geographics::BoundingBox {
            bounding_box: BoundingBox {
                bottom_right: LatLon {
                    latitude: bottom_right_latitude,
                    longitude: bottom_right_longitude,
                },
                top_left: LatLon {
                    latitude: top_left_latitude,
                    longitude: top_left_longitude,
                },
            },
        });
        Ok(self)
    }

    pub fn set_taxon(&mut self, taxon: TaxonFilter) -> &mut Self {
        if taxon.ids.is_empty() {
            warn!(
                operator = ?taxon.taxon_list_operator,
                "Taxon filter has no taxon ids"
            );
        }
        self.filter.taxon = Some(taxon);
        self
    }

    pub fn set_verification_status(&mut self, status: VerificationStatus) -> &mut Self {
        self.filter.verification_status = Some(status);
        self
    }

    pub fn set_output<S: Into<String>>(
        &mut self,
        field_set: FieldSet,
        fields: impl IntoIterator<Item = S>,
    ) -> &mut Self {
        self.filter.output = Some(OutputFilter {
            field_set,
            fields: fields.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn build(&self) -> SearchFilter {
        self.filter.clone()
    }
}

impl Default for SearchFilterBuilder {
    fn default() -> Self {
        Self::new()
    }
}
