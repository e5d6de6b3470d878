use std::collections::HashMap;

use serde::Deserialize;
use tokio::sync::RwLock;
use url::Url;

/// Sentinel place string returned whenever a coordinate pair cannot be
/// resolved to a name.
pub const UNKNOWN_LOCATION: &str = "unknown location";

/// Zoom level requested from the reverse geocoder, roughly city granularity.
const REVERSE_ZOOM: &str = "10";

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    address: Option<Address>,
}

#[derive(Debug, Default, Deserialize)]
struct Address {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    county: Option<String>,
    state: Option<String>,
    country: Option<String>,
}

impl Address {
    /// First present of city, town, village, county.
    fn primary(&self) -> Option<&str> {
        self.city
            .as_deref()
            .or(self.town.as_deref())
            .or(self.village.as_deref())
            .or(self.county.as_deref())
    }

    fn place_name(&self) -> Option<String> {
        let primary = self.primary()?;
        let region = self.state.as_deref().or(self.country.as_deref());
        Some(match region {
            Some(region) => format!("{primary}, {region}"),
            None => primary.to_string(),
        })
    }
}

/// Resolves coordinates to a human-readable place name.
///
/// Results are cached keyed by the coordinates rounded to two decimals
/// (about 1.1 km). Failures degrade to [`UNKNOWN_LOCATION`] and are never
/// cached, so a later retry can succeed once the upstream recovers.
pub struct LocationResolver {
    http: reqwest::Client,
    base: Url,
    cache: RwLock<HashMap<String, String>>,
}

impl LocationResolver {
    pub fn new(http: reqwest::Client, base: Url) -> Self {
        Self {
            http,
            base,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Resolves `(lat, lon)` to a place string. Total: any upstream or
    /// parse failure yields the sentinel instead of an error.
    pub async fn resolve(&self, lat: f64, lon: f64) -> String {
        let lat = round2(lat);
        let lon = round2(lon);
        let key = format!("{lat:.2},{lon:.2}");
        if let Some(name) = self.cache.read().await.get(&key) {
            return name.clone();
        }
        match self.reverse(lat, lon).await {
            Some(name) => {
                self.cache.write().await.insert(key, name.clone());
                name
            }
            None => UNKNOWN_LOCATION.to_string(),
        }
    }

    async fn reverse(&self, lat: f64, lon: f64) -> Option<String> {
        let url = match self.base.join("reverse") {
            Ok(url) => url,
            Err(e) => {
                tracing::error!(error = %e, "invalid geocode base url");
                return None;
            }
        };
        let lat = format!("{lat:.2}");
        let lon = format!("{lon:.2}");
        let resp = self
            .http
            .get(url)
            .query(&[
                ("format", "json"),
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("zoom", REVERSE_ZOOM),
            ])
            .send()
            .await;
        let resp = match resp {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "reverse geocoding request failed");
                return None;
            }
        };
        if !resp.status().is_success() {
            tracing::warn!(status = %resp.status(), "reverse geocoding returned an error status");
            return None;
        }
        let parsed: ReverseResponse = match resp.json().await {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, "reverse geocoding response was not valid json");
                return None;
            }
        };
        parsed.address.and_then(|a| a.place_name())
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
