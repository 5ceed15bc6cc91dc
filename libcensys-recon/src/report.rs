//! Host data returned by the Censys hosts endpoint, and the summaries the
//! CLI renders from it.
//!
//! Every field is optional: the API omits whatever it has not observed, and
//! the summaries fall back to `"Unknown"` / `"None"` placeholders.

use serde::{de::IgnoredAny, Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;

pub const UNKNOWN: &str = "Unknown";
pub const NONE: &str = "None";

#[derive(Deserialize)]
#[serde(untagged)]
enum Lenient<T> {
    Value(T),
    Other(IgnoredAny),
}

/// Decode `T` if the payload has the expected shape, otherwise fall back to
/// `T::default()` so one odd field never costs the whole host.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(match Lenient::deserialize(deserializer)? {
        Lenient::Value(value) => value,
        Lenient::Other(_) => T::default(),
    })
}

/// Envelope around a host lookup: `{"code": 200, "status": "OK", "result": {..}}`.
///
/// Only the fields the report shows are modelled; the rest of the payload is
/// ignored.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct HostResponse {
    #[serde(default, deserialize_with = "lenient")]
    pub result: HostRecord,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct HostRecord {
    #[serde(default, deserialize_with = "lenient")]
    pub ip: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub services: Vec<Service>,
    #[serde(default, deserialize_with = "lenient")]
    pub autonomous_system: Option<AutonomousSystem>,
    #[serde(default, deserialize_with = "lenient")]
    pub metadata: Option<Metadata>,
    #[serde(default, deserialize_with = "lenient")]
    pub operating_system: Option<OperatingSystem>,
    #[serde(default, deserialize_with = "lenient")]
    pub dns: Option<Dns>,
    #[serde(default, deserialize_with = "lenient")]
    pub location: Option<Location>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Service {
    #[serde(default, deserialize_with = "lenient")]
    pub port: Option<u16>,
    #[serde(default, deserialize_with = "lenient")]
    pub service_name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub vulnerabilities: Vec<Vulnerability>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Vulnerability {
    #[serde(default, deserialize_with = "lenient")]
    pub cve_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AutonomousSystem {
    #[serde(default, deserialize_with = "lenient")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Metadata {
    #[serde(default, deserialize_with = "lenient")]
    pub os: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OperatingSystem {
    #[serde(default, deserialize_with = "lenient")]
    pub product: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Dns {
    #[serde(default, deserialize_with = "lenient")]
    pub reverse_dns: Option<ReverseDns>,
}

/// Older payloads list names directly; current ones wrap them in `{"names": [..]}`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ReverseDns {
    Names(Vec<String>),
    Record {
        #[serde(default, deserialize_with = "lenient")]
        names: Vec<String>,
    },
}

impl ReverseDns {
    pub fn names(&self) -> &[String] {
        match self {
            ReverseDns::Names(names) => names,
            ReverseDns::Record { names } => names,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Location {
    #[serde(default, deserialize_with = "lenient")]
    pub country: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub city: Option<String>,
}

impl HostRecord {
    pub fn operating_system(&self) -> String {
        self.metadata
            .as_ref()
            .and_then(|m| m.os.clone())
            .or_else(|| self.operating_system.as_ref().and_then(|os| os.product.clone()))
            .unwrap_or_else(|| UNKNOWN.to_string())
    }

    pub fn autonomous_system(&self) -> String {
        self.autonomous_system
            .as_ref()
            .and_then(|asys| asys.description.clone().or_else(|| asys.name.clone()))
            .unwrap_or_else(|| UNKNOWN.to_string())
    }

    pub fn location(&self) -> String {
        let location = self.location.clone().unwrap_or_default();
        format!(
            "{}, {}",
            location.country.as_deref().unwrap_or(UNKNOWN),
            location.city.as_deref().unwrap_or(UNKNOWN)
        )
    }

    pub fn hostnames(&self) -> Vec<String> {
        let names: Vec<String> = self
            .dns
            .as_ref()
            .and_then(|dns| dns.reverse_dns.as_ref())
            .map(|rdns| rdns.names().to_vec())
            .unwrap_or_default();

        if names.is_empty() {
            vec![NONE.to_string()]
        } else {
            names
        }
    }

    /// `(port, service)` rows for the services table.
    pub fn port_listing(&self) -> Vec<(String, String)> {
        self.services
            .iter()
            .map(|service| {
                (
                    service.port.map(|p| p.to_string()).unwrap_or_else(|| UNKNOWN.to_string()),
                    service.service_name.clone().unwrap_or_else(|| UNKNOWN.to_string()),
                )
            })
            .collect()
    }

    pub fn stats(&self) -> HostStats {
        HostStats::from_record(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HostStats {
    pub open_ports: usize,
    pub unique_services: Vec<String>,
    pub vulnerabilities: Vec<String>,
    pub operating_system: String,
    pub hostnames: Vec<String>,
    pub location: String,
}

impl HostStats {
    pub fn from_record(record: &HostRecord) -> Self {
        let unique: BTreeSet<String> = record
            .services
            .iter()
            .filter_map(|s| s.service_name.clone())
            .filter(|name| name != UNKNOWN)
            .collect();
        let unique_services = if unique.is_empty() {
            vec![UNKNOWN.to_string()]
        } else {
            unique.into_iter().collect()
        };

        let cves: Vec<String> = record
            .services
            .iter()
            .flat_map(|s| s.vulnerabilities.iter())
            .map(|v| v.cve_id.clone().unwrap_or_else(|| UNKNOWN.to_string()))
            .collect();
        let vulnerabilities = if cves.is_empty() {
            vec![NONE.to_string()]
        } else {
            cves
        };

        Self {
            open_ports: record.services.len(),
            unique_services,
            vulnerabilities,
            operating_system: record.operating_system(),
            hostnames: record.hostnames(),
            location: record.location(),
        }
    }

    /// Labelled rows in display order, list values comma-joined.
    pub fn rows(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Number of Open Ports", self.open_ports.to_string()),
            ("Unique Services", self.unique_services.join(", ")),
            ("Vulnerabilities", self.vulnerabilities.join(", ")),
            ("Operating System", self.operating_system.clone()),
            ("Hostnames", self.hostnames.join(", ")),
            ("Location", self.location.clone()),
        ]
    }
}

/// Rows for the general-information table of a host queried as `ip`.
pub fn general_info(ip: &str, record: &HostRecord) -> Vec<(&'static str, String)> {
    vec![
        ("IP Address", ip.to_string()),
        ("Autonomous System", record.autonomous_system()),
        ("Operating System", record.operating_system()),
        ("Location", record.location()),
        ("Hostnames", record.hostnames().join(", ")),
    ]
}
