//! Distance-matrix client
//!
//! Thin wrapper over the external distance service. The upstream is
//! treated as unreliable and rate-limited: one bounded-timeout attempt
//! per order, never retried. Callers degrade on any error.

use async_trait::async_trait;
use serde::Deserialize;
use shared::types::Coordinates;
use std::time::Duration;
use thiserror::Error;

use crate::core::Config;

#[derive(Debug, Error)]
pub enum DistanceError {
    #[error("Distance service credential not configured")]
    MissingCredential,

    #[error("Distance request failed: {0}")]
    Http(String),

    #[error("Distance service returned no usable result: {0}")]
    Upstream(String),
}

/// Per-destination result. `ok` mirrors the upstream element status.
#[derive(Debug, Clone, Copy)]
pub struct DistanceElement {
    pub ok: bool,
    /// Reported travel distance in meters (0 when not ok)
    pub meters: i64,
}

/// Seam for the external distance boundary, mockable in tests
#[async_trait]
pub trait DistanceProvider: Send + Sync {
    /// Rank destinations by travel distance from one origin. Returns one
    /// element per destination, in destination order.
    async fn travel_distances(
        &self,
        origin: Coordinates,
        destinations: &[Coordinates],
    ) -> Result<Vec<DistanceElement>, DistanceError>;
}

// ── Wire format ─────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct MatrixResponse {
    status: String,
    #[serde(default)]
    rows: Vec<MatrixRow>,
}

#[derive(Debug, Deserialize)]
struct MatrixRow {
    #[serde(default)]
    elements: Vec<MatrixElement>,
}

#[derive(Debug, Deserialize)]
struct MatrixElement {
    status: String,
    distance: Option<MatrixValue>,
}

#[derive(Debug, Deserialize)]
struct MatrixValue {
    value: i64,
}

/// HTTP distance-matrix client
#[derive(Clone)]
pub struct DistanceService {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl DistanceService {
    pub fn new(config: &Config) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.distance_timeout_ms))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: config.distance_api_url.clone(),
            api_key: config.distance_api_key.clone(),
        }
    }
}

#[async_trait]
impl DistanceProvider for DistanceService {
    async fn travel_distances(
        &self,
        origin: Coordinates,
        destinations: &[Coordinates],
    ) -> Result<Vec<DistanceElement>, DistanceError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or(DistanceError::MissingCredential)?;

        let destinations_param = destinations
            .iter()
            .map(Coordinates::to_string)
            .collect::<Vec<_>>()
            .join("|");

        let url = format!("{}/maps/api/distancematrix/json", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("origins", origin.to_string()),
                ("destinations", destinations_param),
                ("key", key.to_string()),
            ])
            .send()
            .await
            .map_err(|e| DistanceError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(DistanceError::Http(format!(
                "status {}",
                response.status()
            )));
        }

        let body: MatrixResponse = response
            .json()
            .await
            .map_err(|e| DistanceError::Http(e.to_string()))?;

        if body.status != "OK" {
            return Err(DistanceError::Upstream(body.status));
        }

        let row = body
            .rows
            .into_iter()
            .next()
            .ok_or_else(|| DistanceError::Upstream("empty rows".to_string()))?;

        Ok(row
            .elements
            .into_iter()
            .map(|element| {
                let ok = element.status == "OK" && element.distance.is_some();
                DistanceElement {
                    ok,
                    meters: element.distance.map(|d| d.value).unwrap_or(0),
                }
            })
            .collect())
    }
}
