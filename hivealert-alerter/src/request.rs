use std::collections::BTreeMap;

use hivealert_rules::{HiveConnection, HiveProxies};

/// TLS and proxy settings applied to the HTTP client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportOptions {
    pub verify_tls: bool,
    /// Empty entries mean a direct connection, regardless of `HTTP_PROXY`
    /// and friends in the environment.
    pub proxies: HiveProxies,
}

impl TransportOptions {
    pub fn from_connection(connection: &HiveConnection) -> Self {
        Self {
            verify_tls: connection.hive_verify,
            proxies: connection.hive_proxies.clone(),
        }
    }

    pub(crate) fn build_client(&self) -> Result<reqwest::Client, reqwest::Error> {
        let mut builder = reqwest::Client::builder()
            .danger_accept_invalid_certs(!self.verify_tls)
            .danger_accept_invalid_hostnames(!self.verify_tls)
            .no_proxy();

        if !self.proxies.http.is_empty() {
            builder = builder.proxy(reqwest::Proxy::http(self.proxies.http.as_str())?);
        }
        if !self.proxies.https.is_empty() {
            builder = builder.proxy(reqwest::Proxy::https(self.proxies.https.as_str())?);
        }

        builder.build()
    }
}

/// Everything needed to submit one alert, computed without touching the network.
#[derive(Debug, Clone)]
pub struct HiveRequest {
    pub url: String,
    pub headers: BTreeMap<&'static str, String>,
    pub transport: TransportOptions,
    pub body: String,
}

impl HiveRequest {
    pub fn headers_for(api_key: &str) -> BTreeMap<&'static str, String> {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type", "application/json".to_string());
        headers.insert("Authorization", format!("Bearer {api_key}"));
        headers
    }
}
