//! Data types for Artdatabanken API responses
//!
//! Only the fields this crate works with are typed. Everything else the
//! service sends is kept in `extra` so that records can be written back out
//! unchanged.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::date::parse_timestamp;
use crate::filter::AreaType;

/// Coordinate system id of WGS84 in `site.coordinates`
pub const WGS84_COORDINATE_SYSTEM_ID: u32 = 10;

/// Observation ids are numeric in older datasets and strings in newer ones
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ObservationId {
    Number(u64),
    Text(String),
}

impl fmt::Display for ObservationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Projected coordinate of an observation site
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinate {
    pub coordinate_system_id: u32,
    pub easting: f64,
    pub northing: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presentation_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub coordinates: Vec<Coordinate>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A single recorded sighting
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<ObservationId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sighting_observers: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site: Option<Site>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discovery_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_comment: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Observation {
    /// Start and end of the observation as wall-clock times. A single instant
    /// has equal start and end; a missing end defaults to the start.
    pub fn interval(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let start = parse_timestamp(self.start_date.as_deref()?)?;
        let end = self
            .end_date
            .as_deref()
            .and_then(parse_timestamp)
            .unwrap_or(start);
        Some((start, end))
    }

    /// WGS84 position as `(latitude, longitude)`
    pub fn wgs84_position(&self) -> Option<(f64, f64)> {
        self.site
            .as_ref()?
            .coordinates
            .iter()
            .find(|c| c.coordinate_system_id == WGS84_COORDINATE_SYSTEM_ID)
            .map(|c| (c.northing, c.easting))
    }
}

/// Candidate returned by the species name search
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxonSummary {
    pub taxon_id: u32,
    pub swedish_name: Option<String>,
    pub scientific_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxonRelatedInformation {
    pub swedish_presence: Option<String>,
    pub immigration_history: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedlistPeriod {
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One red list assessment
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedlistInfo {
    pub period: Option<RedlistPeriod>,
    pub category: Option<String>,
    pub criterion_text: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeciesData {
    pub taxon_related_information: Option<TaxonRelatedInformation>,
    #[serde(default)]
    pub redlist_info: Vec<RedlistInfo>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Full taxon record from the species data endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Taxon {
    pub taxon_id: u32,
    pub swedish_name: Option<String>,
    pub scientific_name: Option<String>,
    pub species_data: Option<SpeciesData>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPage<T> {
    #[serde(default = "Vec::new")]
    records: Vec<T>,
    skip: Option<u32>,
    take: Option<u32>,
    total_count: Option<u64>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// One page of a paged listing
///
/// `total_count` is the number of matches on the server, not the number of
/// records on this page. Serializing a page writes the envelope back with its
/// unknown fields (such as a `pager` object) kept and `totalCount` always at
/// the top level.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(
    rename_all = "camelCase",
    from = "RawPage<T>",
    bound(deserialize = "T: Deserialize<'de>")
)]
pub struct Page<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub take: Option<u32>,
    pub total_count: u64,
    pub records: Vec<T>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl<T> From<RawPage<T>> for Page<T> {
    fn from(raw: RawPage<T>) -> Self {
        // Newer deployments nest the count in a pager object
        let total_count = raw
            .extra
            .get("pager")
            .and_then(|p| p.get("totalCount"))
            .and_then(Value::as_u64)
            .or(raw.total_count)
            .unwrap_or(raw.records.len() as u64);
        Self {
            skip: raw.skip,
            take: raw.take,
            total_count,
            records: raw.records,
            extra: raw.extra,
        }
    }
}

impl<T> Page<T> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether more records exist after this page
    pub fn has_more(&self) -> bool {
        let skip = u64::from(self.skip.unwrap_or(0));
        skip + (self.records.len() as u64) < self.total_count
    }
}

/// Organisation or system delivering observations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataProvider {
    pub id: u32,
    pub identifier: Option<String>,
    pub name: Option<String>,
    pub organization: Option<String>,
    pub public_observations: Option<u64>,
    pub protected_observations: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response of `GET api/ApiInfo`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiInfo {
    pub api_name: Option<String>,
    pub api_version: Option<String>,
    pub api_status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Named area returned by the area search
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Area {
    pub area_type: Option<Value>,
    pub feature_id: Option<String>,
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Entry in the area type vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AreaTypeInfo {
    pub code: u32,
    pub area_type: AreaType,
    pub sv_se: &'static str,
    pub en_gb: &'static str,
}

impl AreaTypeInfo {
    /// Localized name, `sv-SE` unless `en-GB` is asked for
    pub fn localized_name(&self, culture_code: &str) -> &'static str {
        if culture_code.eq_ignore_ascii_case("en-GB") {
            self.en_gb
        } else {
            self.sv_se
        }
    }
}

const fn area_type_info(
    code: u32,
    area_type: AreaType,
    sv_se: &'static str,
    en_gb: &'static str,
) -> AreaTypeInfo {
    AreaTypeInfo {
        code,
        area_type,
        sv_se,
        en_gb,
    }
}

/// Area types returned by the `Areas` endpoint for numeric codes. The names
/// are the ones the service itself reports.
pub const AREA_TYPES: &[AreaTypeInfo] = &[
    area_type_info(1, AreaType::Municipality, "Kommun", "Kommun"),
    area_type_info(12, AreaType::Sea, "Sea", "Sea"),
    area_type_info(13, AreaType::CountryRegion, "Landsdel", "Landsdel"),
    area_type_info(15, AreaType::NatureType, "NatureType", "NatureType"),
    area_type_info(16, AreaType::Province, "Provins", "Provins"),
    area_type_info(17, AreaType::Ramsar, "Ramsar", "Ramsar"),
    area_type_info(18, AreaType::BirdValidationArea, "BirdValidationArea", "BirdValidationArea"),
    area_type_info(19, AreaType::Parish, "Socken", "Socken"),
    area_type_info(20, AreaType::Spa, "Spa", "Spa"),
    area_type_info(21, AreaType::County, "Län", "Län"),
    area_type_info(22, AreaType::ProtectedNature, "Skyddadnatur", "Skyddadnatur"),
    area_type_info(
        24,
        AreaType::SwedishForestAgencyDistricts,
        "SwedishForestAgencyDistricts",
        "SwedishForestAgencyDistricts",
    ),
    area_type_info(26, AreaType::Sci, "Sci", "Sci"),
    area_type_info(27, AreaType::WaterArea, "Vattenområde", "Vattenområde"),
    area_type_info(29, AreaType::Atlas5x5, "Atlas5x5", "Atlas5x5"),
    area_type_info(30, AreaType::Atlas10x10, "Atlas10x10", "Atlas10x10"),
];
