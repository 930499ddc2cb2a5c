use crate::i18n::ResolutionMetrics;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::net::IpAddr;
use std::time::Duration;
use tracing::{debug, warn};

/// Response of the IP geolocation provider (`{base}/{ip}/json/`).
#[derive(Debug, Deserialize)]
struct GeoResponse {
    country_code: Option<String>,
    #[serde(default)]
    error: bool,
    reason: Option<String>,
}

/// Best-effort IP → country lookup with a hard timeout.
#[derive(Debug, Clone)]
pub struct GeoLocator {
    client: reqwest::Client,
    base_url: String,
}

impl GeoLocator {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build geolocation HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Country code (ISO 3166-1 alpha-2, uppercase) for a client address.
    ///
    /// Never fails: timeouts, HTTP errors and malformed responses are logged
    /// and reported as `None`. Non-public addresses are not looked up. No
    /// retries.
    pub async fn country_code(&self, ip: IpAddr) -> Option<String> {
        if !is_public(ip) {
            debug!("Skipping geolocation for non-public address {}", ip);
            return None;
        }

        match self.try_country_code(ip).await {
            Ok(code) => Some(code),
            Err(e) => {
                warn!("Geolocation lookup for {} failed: {:#}", ip, e);
                ResolutionMetrics::global().record_geolocation_failure();
                None
            }
        }
    }

    async fn try_country_code(&self, ip: IpAddr) -> Result<String> {
        let url = format!("{}/{}/json/", self.base_url, ip);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Geolocation request failed")?;

        let status = response.status();
        if !status.is_success() {
            bail!("Geolocation provider returned {}", status);
        }

        let body: GeoResponse = response
            .json()
            .await
            .context("Failed to parse geolocation response")?;

        if body.error {
            bail!(
                "Geolocation provider error: {}",
                body.reason.as_deref().unwrap_or("unknown")
            );
        }

        match body.country_code {
            Some(code) if code.trim().len() == 2 => Ok(code.trim().to_ascii_uppercase()),
            Some(code) => bail!("Unexpected country code '{}'", code),
            None => bail!("Geolocation response has no country code"),
        }
    }
}

/// Whether an address is worth sending to the provider.
fn is_public(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            !(v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast()
                || v4.is_documentation())
        }
        IpAddr::V6(v6) => {
            let first = v6.segments()[0];
            let unique_local = (first & 0xfe00) == 0xfc00;
            let link_local = (first & 0xffc0) == 0xfe80;
            !(v6.is_loopback() || v6.is_unspecified() || unique_local || link_local)
        }
    }
}
