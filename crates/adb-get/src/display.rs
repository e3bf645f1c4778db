//! Human readable rendering for --pretty-print

use artdatabanken_api::{
    ApiInfo, Area, AreaTypeInfo, DataProvider, Observation, Taxon, TaxonSummary,
};
use chrono::{NaiveDateTime, NaiveTime};

const MISSING: &str = "<missing>";

fn or_missing(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or(MISSING)
}

/// Uppercase the first character, the services send Swedish names lowercased
fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn has_time(dt: &NaiveDateTime) -> bool {
    dt.time() != NaiveTime::MIN
}

/// Compact date text for an observation interval.
///
/// Same-day intervals with times render as `2025-04-18 07:30-09:00`, single
/// instants as `2025-04-18 07:30`, and midnight-only values as the bare date.
pub fn format_interval(start: NaiveDateTime, end: NaiveDateTime) -> String {
    let start_date = start.format("%Y-%m-%d");
    if start == end {
        return if has_time(&start) {
            start.format("%Y-%m-%d %H:%M").to_string()
        } else {
            start_date.to_string()
        };
    }

    if start.date() == end.date() {
        if has_time(&start) && has_time(&end) {
            format!("{} {}-{}", start_date, start.format("%H:%M"), end.format("%H:%M"))
        } else {
            start_date.to_string()
        }
    } else {
        format!("{} - {}", start_date, end.format("%Y-%m-%d"))
    }
}

pub fn google_maps_url(latitude: f64, longitude: f64) -> String {
    format!(
        "https://www.google.com/maps/search/?api=1&query={},{}",
        latitude, longitude
    )
}

pub fn openstreetmap_url(latitude: f64, longitude: f64) -> String {
    format!(
        "https://www.openstreetmap.org/?mlat={}&mlon={}#map=14/{}/{}",
        latitude, longitude, latitude, longitude
    )
}

pub fn format_taxon_summary(taxon: &TaxonSummary) -> String {
    format!(
        "{} ({}) taxon id: {}",
        capitalize(or_missing(taxon.swedish_name.as_deref())),
        or_missing(taxon.scientific_name.as_deref()),
        taxon.taxon_id
    )
}

pub fn format_taxon(taxon: &Taxon) -> String {
    let mut out = format!(
        "{} ({}) taxon id: {}\n",
        capitalize(or_missing(taxon.swedish_name.as_deref())),
        or_missing(taxon.scientific_name.as_deref()),
        taxon.taxon_id
    );

    let Some(species) = &taxon.species_data else {
        return out;
    };

    if let Some(info) = &species.taxon_related_information {
        out.push_str(&format!(
            "{} ({})\n",
            or_missing(info.swedish_presence.as_deref()),
            or_missing(info.immigration_history.as_deref())
        ));
    }

    for redlist in &species.redlist_info {
        let period = redlist.period.as_ref().and_then(|p| p.name.as_deref());
        out.push_str(&format!("{}:\n", or_missing(period)));
        out.push_str(&format!(
            "  Category: {}\n",
            or_missing(redlist.category.as_deref())
        ));
        if let Some(criterion) = redlist.criterion_text.as_deref().filter(|c| !c.is_empty()) {
            out.push_str(&format!("  Criterion: {}\n", criterion));
        }
    }

    out
}

pub fn format_observation(observation: &Observation) -> String {
    let when = observation
        .interval()
        .map(|(start, end)| format_interval(start, end))
        .unwrap_or_else(|| MISSING.to_string());
    let place = observation
        .site
        .as_ref()
        .and_then(|s| s.presentation_name.as_deref());

    let mut out = format!("{}  {}\n", when, or_missing(place));
    out.push_str(&format!(
        "  Observers: {}\n",
        or_missing(observation.sighting_observers.as_deref())
    ));
    out.push_str(&format!(
        "  Reported by: {}\n",
        or_missing(observation.owner.as_deref())
    ));
    if let Some(method) = &observation.discovery_method {
        out.push_str(&format!("  Discovery method: {}\n", method));
    }
    if let Some(comment) = &observation.public_comment {
        out.push_str(&format!("  Comment: {}\n", comment));
    }
    if let Some((lat, lon)) = observation.wgs84_position() {
        out.push_str(&format!("  {}\n", google_maps_url(lat, lon)));
        out.push_str(&format!("  {}\n", openstreetmap_url(lat, lon)));
    }
    out
}

pub fn format_api_info(info: &ApiInfo) -> String {
    format!(
        "{} {} ({})",
        or_missing(info.api_name.as_deref()),
        or_missing(info.api_version.as_deref()),
        or_missing(info.api_status.as_deref())
    )
}

pub fn format_data_provider(provider: &DataProvider) -> String {
    format!(
        "{:>4}  {}  {} ({} public, {} protected)",
        provider.id,
        or_missing(provider.name.as_deref()),
        or_missing(provider.organization.as_deref()),
        provider.public_observations.unwrap_or(0),
        provider.protected_observations.unwrap_or(0)
    )
}

pub fn format_area_type(info: &AreaTypeInfo, culture_code: &str) -> String {
    format!(
        "{:>3}  {:<30} {}",
        info.code,
        info.area_type.name(),
        info.localized_name(culture_code)
    )
}

pub fn format_area(area: &Area) -> String {
    let area_type = match &area.area_type {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => MISSING.to_string(),
    };
    format!(
        "{}  {}:{}",
        or_missing(area.name.as_deref()),
        area_type,
        or_missing(area.feature_id.as_deref())
    )
}
