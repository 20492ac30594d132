use serde::{Deserialize, Serialize};

use crate::filter::Severity;

/// One server-side aggregation endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    VulnBySeverity,
    VulnByTech,
    TopCountries,
    WorldMap,
    IssuesByMonth,
}

impl Metric {
    pub const fn endpoint(self) -> &'static str {
        match self {
            Self::VulnBySeverity => "vulnbyseverity",
            Self::VulnByTech => "vulnbytech",
            Self::TopCountries => "top10countryguarddutydata",
            Self::WorldMap => "worldmapguarddutydata",
            Self::IssuesByMonth => "issuescountbymonth",
        }
    }

    /// Endpoint path with the query appended; an empty query adds no `?`.
    pub fn path(self, query: &str) -> String {
        if query.is_empty() {
            self.endpoint().to_string()
        } else {
            format!("{}?{query}", self.endpoint())
        }
    }
}

/// A record the chart layer can draw without knowing its concrete shape.
pub trait LabeledValue {
    fn label(&self) -> &str;
    fn value(&self) -> u64;
}

/// Open audit issues bucketed by score (`low` < 5, `medium` 5..=10, `high` > 10).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    #[serde(default)]
    pub high: u64,
    #[serde(default)]
    pub medium: u64,
    #[serde(default)]
    pub low: u64,
}

impl SeverityCounts {
    pub const fn count(&self, severity: Severity) -> u64 {
        match severity {
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
        }
    }

    pub const fn total(&self) -> u64 {
        self.high + self.medium + self.low
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnologyShare {
    pub technology: String,
    pub count: u64,
    #[serde(default)]
    pub percentage: f64,
}

impl LabeledValue for TechnologyShare {
    fn label(&self) -> &str {
        &self.technology
    }

    fn value(&self) -> u64 {
        self.count
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryCount {
    pub country_name: String,
    pub count: u64,
}

impl LabeledValue for CountryCount {
    fn label(&self) -> &str {
        &self.country_name
    }

    fn value(&self) -> u64 {
        self.count
    }
}

/// Issue revisions per month; the backend capitalises these two keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthCount {
    #[serde(rename = "Month")]
    pub month: String,
    #[serde(rename = "Count")]
    pub count: u64,
}

impl LabeledValue for MonthCount {
    fn label(&self) -> &str {
        &self.month
    }

    fn value(&self) -> u64 {
        self.count
    }
}

/// A geolocated GuardDuty port-probe event, one per distinct (lat, lon).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoEvent {
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub country_name: String,
    #[serde(default)]
    pub city_name: Option<String>,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub remote_ip_v4: Option<String>,
    #[serde(default)]
    pub remote_org: Option<String>,
    #[serde(default, rename = "remoteOrgASN")]
    pub remote_org_asn: Option<f64>,
    #[serde(default, rename = "remoteOrgASNOrg")]
    pub remote_org_asn_org: Option<String>,
    #[serde(default, rename = "remoteOrgISP")]
    pub remote_org_isp: Option<String>,
    #[serde(default)]
    pub local_port: Option<f64>,
    #[serde(default)]
    pub local_port_name: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub first_seen: Option<String>,
    #[serde(default)]
    pub last_seen: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl GeoEvent {
    /// Label/value pairs for the marker detail view, in display order.
    /// Missing optional fields are skipped.
    pub fn detail_fields(&self) -> Vec<(&'static str, String)> {
        let fields = [
            ("IP address", self.remote_ip_v4.clone()),
            ("City", self.city_name.clone()),
            ("Country", Some(self.country_name.clone())),
            ("Latitude", Some(format!("{:.4}", self.lat))),
            ("Longitude", Some(format!("{:.4}", self.lon))),
            ("ASN", self.remote_org_asn.map(format_whole)),
            ("ASN org", self.remote_org_asn_org.clone()),
            ("ISP", self.remote_org_isp.clone()),
            ("Org", self.remote_org.clone()),
            (
                "Local port",
                self.local_port.map(|port| match &self.local_port_name {
                    Some(name) => format!("{} ({name})", format_whole(port)),
                    None => format_whole(port),
                }),
            ),
            ("Severity", self.severity.clone()),
            ("First seen", self.first_seen.clone()),
            ("Last seen", self.last_seen.clone()),
            ("Events", Some(self.count.to_string())),
            ("Description", self.description.clone()),
        ];

        fields
            .into_iter()
            .filter_map(|(label, value)| {
                value
                    .filter(|value| !value.is_empty())
                    .map(|value| (label, value))
            })
            .collect()
    }
}

#[allow(clippy::cast_possible_truncation)]
fn format_whole(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}
