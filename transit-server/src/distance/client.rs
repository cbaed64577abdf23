//! HTTP distance-matrix client.
//!
//! Fetches walking times from a distance-matrix web API, caches resolved
//! pairs, and retries transient failures with doubled delays. Lookups are
//! blocking by design; they run inside a provider's `prepare` hook, never
//! per edge.

use moka::sync::Cache;
use serde::Deserialize;

use super::{DistanceError, DistanceSource, WalkingEstimate};

/// Configuration for [`MatrixClient`].
#[derive(Debug, Clone)]
pub struct MatrixClientConfig {
    /// Base URL of the matrix endpoint.
    pub base_url: String,
    /// API key sent with each request.
    pub api_key: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Give up after this many attempts at one request.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles on each subsequent retry.
    pub initial_backoff_ms: u64,
    /// TTL for cached pair estimates in seconds.
    pub cache_ttl_secs: u64,
    /// Maximum number of cached pair estimates.
    pub cache_capacity: u64,
}

impl MatrixClientConfig {
    /// Create a config with the given endpoint and key.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            timeout_secs: 30,
            max_attempts: 5,
            initial_backoff_ms: 100,
            cache_ttl_secs: 24 * 60 * 60,
            cache_capacity: 10_000,
        }
    }
}

/// Blocking client for a walking distance-matrix API.
pub struct MatrixClient {
    http: reqwest::blocking::Client,
    config: MatrixClientConfig,
    /// Resolved (from, to) pairs; `None` records a pair the API could not
    /// route so it is not re-requested every search.
    cache: Cache<(String, String), Option<WalkingEstimate>>,
}

impl MatrixClient {
    /// Create a client.
    pub fn new(config: MatrixClientConfig) -> Result<Self, DistanceError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;
        let cache = Cache::builder()
            .time_to_live(std::time::Duration::from_secs(config.cache_ttl_secs))
            .max_capacity(config.cache_capacity)
            .build();
        Ok(Self { http, config, cache })
    }

    /// Number of cached pair estimates.
    pub fn cache_entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    fn request(
        &self,
        origins: &[&str],
        destinations: &[&str],
    ) -> Result<MatrixResponse, reqwest::Error> {
        let params = [
            ("units", "imperial".to_string()),
            ("mode", "walking".to_string()),
            ("origins", origins.join("|")),
            ("destinations", destinations.join("|")),
            ("key", self.config.api_key.clone()),
        ];
        self.http
            .get(&self.config.base_url)
            .query(&params)
            .send()?
            .error_for_status()?
            .json::<MatrixResponse>()
    }

    /// Perform one matrix request, retrying transient failures with a
    /// doubling delay.
    fn fetch(
        &self,
        origins: &[&str],
        destinations: &[&str],
    ) -> Result<MatrixResponse, DistanceError> {
        let mut delay = std::time::Duration::from_millis(self.config.initial_backoff_ms);
        for attempt in 1..=self.config.max_attempts {
            match self.request(origins, destinations) {
                Ok(response) if response.status == "OK" => return Ok(response),
                Ok(response) if response.status == "UNKNOWN_ERROR" => {
                    tracing::debug!(attempt, "matrix API returned UNKNOWN_ERROR, retrying");
                }
                Ok(response) => {
                    // Most API errors cannot be fixed by a retry.
                    return Err(DistanceError::Api {
                        status: response.status,
                        message: response.error_message,
                    });
                }
                Err(error) => {
                    tracing::debug!(attempt, %error, "matrix request failed, retrying");
                }
            }
            if attempt < self.config.max_attempts {
                std::thread::sleep(delay);
                delay *= 2;
            }
        }
        Err(DistanceError::RetriesExhausted {
            attempts: self.config.max_attempts,
        })
    }
}

impl DistanceSource for MatrixClient {
    fn walking_times(
        &self,
        origins: &[&str],
        destinations: &[&str],
    ) -> Result<Vec<Option<WalkingEstimate>>, DistanceError> {
        check_element_limits(origins.len(), destinations.len())?;

        let cached: Vec<Option<Option<WalkingEstimate>>> = origins
            .iter()
            .flat_map(|origin| {
                destinations.iter().map(move |destination| {
                    self.cache
                        .get(&(origin.to_string(), destination.to_string()))
                })
            })
            .collect();
        if cached.iter().all(Option::is_some) {
            return Ok(cached.into_iter().flatten().collect());
        }

        let response = self.fetch(origins, destinations)?;
        let estimates = estimates_from(&response, origins, destinations);
        for (index, estimate) in estimates.iter().enumerate() {
            let origin = origins[index / destinations.len()];
            let destination = destinations[index % destinations.len()];
            self.cache
                .insert((origin.to_string(), destination.to_string()), estimate.clone());
        }
        Ok(estimates)
    }
}

/// One matrix request may not exceed the API's element limits.
fn check_element_limits(origins: usize, destinations: usize) -> Result<(), DistanceError> {
    if (origins >= 25 && destinations >= 25) || origins + destinations > 100 {
        return Err(DistanceError::TooManyElements);
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct MatrixResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    rows: Vec<MatrixRow>,
    #[serde(default)]
    destination_addresses: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct MatrixRow {
    elements: Vec<MatrixElement>,
}

#[derive(Debug, Deserialize)]
struct MatrixElement {
    status: String,
    duration: Option<ValueText>,
    distance: Option<ValueText>,
}

#[derive(Debug, Deserialize)]
struct ValueText {
    value: i64,
    text: String,
}

/// Convert a matrix response into row-major pair estimates.
fn estimates_from(
    response: &MatrixResponse,
    origins: &[&str],
    destinations: &[&str],
) -> Vec<Option<WalkingEstimate>> {
    let mut estimates = Vec::with_capacity(origins.len() * destinations.len());
    for (row_index, _) in origins.iter().enumerate() {
        for (col_index, destination) in destinations.iter().enumerate() {
            let element = response
                .rows
                .get(row_index)
                .and_then(|row| row.elements.get(col_index));
            estimates.push(element.and_then(|e| estimate_from(e, destination, response, col_index)));
        }
    }
    estimates
}

fn estimate_from(
    element: &MatrixElement,
    destination: &str,
    response: &MatrixResponse,
    col_index: usize,
) -> Option<WalkingEstimate> {
    if element.status != "OK" {
        return None;
    }
    let duration = element.duration.as_ref()?;
    // Prefer the API's resolved address for the description; fall back to
    // the name the caller asked about.
    let address = response
        .destination_addresses
        .get(col_index)
        .map(String::as_str)
        .filter(|a| !a.is_empty())
        .unwrap_or(destination);
    let description = match &element.distance {
        Some(distance) => format!("Walk {} to {}.", distance.text, address),
        None => format!("Walk to {address}."),
    };
    Some(WalkingEstimate {
        duration: chrono::Duration::seconds(duration.value),
        description,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = MatrixClientConfig::new("https://example.test/matrix", "key");
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.initial_backoff_ms, 100);
    }

    #[test]
    fn element_limits() {
        assert!(check_element_limits(1, 99).is_ok());
        assert!(check_element_limits(1, 100).is_err());
        assert!(check_element_limits(24, 70).is_ok());
        assert!(check_element_limits(25, 25).is_err());
    }

    #[test]
    fn parses_and_converts_a_matrix_response() {
        let json = r#"{
            "status": "OK",
            "destination_addresses": ["6 MetroTech Center, Brooklyn, NY", ""],
            "rows": [{
                "elements": [
                    {
                        "status": "OK",
                        "duration": {"value": 420, "text": "7 mins"},
                        "distance": {"value": 500, "text": "0.3 mi"}
                    },
                    {"status": "ZERO_RESULTS"}
                ]
            }]
        }"#;
        let response: MatrixResponse = serde_json::from_str(json).unwrap();
        let estimates = estimates_from(&response, &["Origin"], &["6 MetroTech", "Nowhere"]);

        let first = estimates[0].as_ref().unwrap();
        assert_eq!(first.duration, chrono::Duration::minutes(7));
        assert_eq!(
            first.description,
            "Walk 0.3 mi to 6 MetroTech Center, Brooklyn, NY."
        );

        // Unroutable pair resolves to None, not an error.
        assert!(estimates[1].is_none());
    }

    #[test]
    fn missing_rows_resolve_to_none() {
        let response: MatrixResponse =
            serde_json::from_str(r#"{"status": "OK", "rows": []}"#).unwrap();
        let estimates = estimates_from(&response, &["A"], &["B"]);
        assert_eq!(estimates, vec![None]);
    }
}
