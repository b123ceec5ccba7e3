//! Service registry discovery adapter.
//!
//! Resolves service names against a Consul-style catalog endpoint:
//! `GET {registry_url}/{service}` returns a JSON array of registration
//! records. Records may carry the instance address in either
//! `ServiceAddress` or, when that is absent or empty, the node-level
//! `Address` field; the port always comes from `ServicePort`.
use std::time::Duration;

use async_trait::async_trait;
use eyre::{Result, WrapErr};
use serde::Deserialize;

use crate::ports::discovery::{Discovery, DiscoveryError, DiscoveryResult, ServiceInstance};

const REGISTRY_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// One registration record as returned by the catalog endpoint. Unknown
/// fields are ignored so registry schema additions stay non-breaking.
#[derive(Debug, Deserialize)]
struct RegistryRecord {
    #[serde(rename = "Address")]
    address: Option<String>,
    #[serde(rename = "ServiceAddress")]
    service_address: Option<String>,
    #[serde(rename = "ServicePort")]
    service_port: Option<u64>,
}

pub struct RegistryDiscovery {
    client: reqwest::Client,
    base_url: String,
}

impl RegistryDiscovery {
    pub fn new(registry_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REGISTRY_REQUEST_TIMEOUT)
            .build()
            .wrap_err("failed to build registry HTTP client")?;
        Ok(Self {
            client,
            base_url: registry_url.trim_end_matches('/').to_string(),
        })
    }

    /// Startup reachability check against the registry base URL. Any HTTP
    /// response counts as reachable; only transport errors fail.
    pub async fn probe(&self) -> Result<()> {
        self.client
            .get(&self.base_url)
            .send()
            .await
            .wrap_err_with(|| format!("service registry unreachable at {}", self.base_url))?;
        Ok(())
    }
}

#[async_trait]
impl Discovery for RegistryDiscovery {
    async fn resolve(&self, service_name: &str) -> DiscoveryResult<Vec<ServiceInstance>> {
        let url = format!("{}/{}", self.base_url, service_name);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| DiscoveryError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            tracing::debug!(
                service = service_name,
                status = response.status().as_u16(),
                "registry returned non-success for service lookup"
            );
            return Ok(Vec::new());
        }

        let records: Vec<RegistryRecord> = response
            .json()
            .await
            .map_err(|e| DiscoveryError::Unavailable(format!("malformed registry payload: {e}")))?;

        Ok(records.iter().filter_map(normalize_record).collect())
    }
}

/// Map a registry record to an instance, preferring the service-level
/// address over the node address. Records without a usable address and port
/// are skipped rather than failing the whole lookup.
fn normalize_record(record: &RegistryRecord) -> Option<ServiceInstance> {
    let address = record
        .service_address
        .as_deref()
        .filter(|a| !a.is_empty())
        .or(record.address.as_deref())
        .filter(|a| !a.is_empty())?;
    let port = u16::try_from(record.service_port?).ok()?;
    Some(ServiceInstance::new(address, port))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(
        address: Option<&str>,
        service_address: Option<&str>,
        service_port: Option<u64>,
    ) -> RegistryRecord {
        RegistryRecord {
            address: address.map(str::to_string),
            service_address: service_address.map(str::to_string),
            service_port,
        }
    }

    #[test]
    fn service_address_takes_precedence() {
        let instance =
            normalize_record(&record(Some("10.0.0.1"), Some("10.0.0.2"), Some(8080))).unwrap();
        assert_eq!(instance, ServiceInstance::new("10.0.0.2", 8080));
    }

    #[test]
    fn empty_service_address_falls_back_to_node_address() {
        let instance = normalize_record(&record(Some("10.0.0.1"), Some(""), Some(8080))).unwrap();
        assert_eq!(instance, ServiceInstance::new("10.0.0.1", 8080));
    }

    #[test]
    fn record_without_any_address_is_skipped() {
        assert!(normalize_record(&record(None, None, Some(8080))).is_none());
        assert!(normalize_record(&record(Some(""), Some(""), Some(8080))).is_none());
    }

    #[test]
    fn record_without_port_or_with_oversized_port_is_skipped() {
        assert!(normalize_record(&record(Some("10.0.0.1"), None, None)).is_none());
        assert!(normalize_record(&record(Some("10.0.0.1"), None, Some(70_000))).is_none());
    }
}
