use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::{debug, info};

use sublet_market::marketplace::contract::{ConvertError, DocumentConverter};
use sublet_market::marketplace::domain::{NewListing, NewUser};
use sublet_market::marketplace::geocode::{GeoPoint, Geocoder};
use sublet_market::marketplace::import::SeedListing;
use sublet_market::marketplace::store::{MarketStore, StoreError};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Upstream geocoding client. Mirrors the Google-style response shape:
/// `{ "status": "OK", "results": [{ "geometry": { "location": ... } }] }`.
/// Any failure along the way resolves to `None`.
pub(crate) struct HttpGeocoder {
    client: reqwest::Client,
    url: String,
    api_key: String,
}

impl HttpGeocoder {
    pub(crate) fn new(url: String, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
            api_key: api_key.unwrap_or_default(),
        }
    }
}

#[async_trait]
impl Geocoder for HttpGeocoder {
    async fn resolve(&self, address: &str) -> Option<GeoPoint> {
        let response = self
            .client
            .get(&self.url)
            .query(&[("address", address), ("key", self.api_key.as_str())])
            .send()
            .await;
        let body: serde_json::Value = match response {
            Ok(response) => match response.json().await {
                Ok(body) => body,
                Err(err) => {
                    debug!(%err, "geocode response was not JSON");
                    return None;
                }
            },
            Err(err) => {
                debug!(%err, "geocode request failed");
                return None;
            }
        };

        if body.get("status").and_then(|status| status.as_str()) != Some("OK") {
            return None;
        }
        let location = body
            .get("results")?
            .get(0)?
            .get("geometry")?
            .get("location")?;
        Some(GeoPoint {
            lat: location.get("lat")?.as_f64()?,
            lng: location.get("lng")?.as_f64()?,
        })
    }
}

static CONVERT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Runs an external conversion tool (`<program> <input> <output>`), bounded
/// by a timeout so a wedged converter reports failure instead of hanging the
/// download.
pub(crate) struct CommandConverter {
    program: String,
    timeout: Duration,
}

impl CommandConverter {
    pub(crate) fn new(program: String, timeout: Duration) -> Self {
        Self { program, timeout }
    }
}

#[async_trait]
impl DocumentConverter for CommandConverter {
    async fn convert(&self, document: &[u8]) -> Result<Vec<u8>, ConvertError> {
        let stamp = format!(
            "{}-{}",
            std::process::id(),
            CONVERT_SEQUENCE.fetch_add(1, Ordering::Relaxed)
        );
        let dir = std::env::temp_dir();
        let input = dir.join(format!("contract-{stamp}.txt"));
        let output = dir.join(format!("contract-{stamp}.pdf"));

        tokio::fs::write(&input, document)
            .await
            .map_err(|err| ConvertError::Failed(format!("could not stage document: {err}")))?;

        let run = tokio::process::Command::new(&self.program)
            .arg(&input)
            .arg(&output)
            .output();
        let result = tokio::time::timeout(self.timeout, run).await;
        let _ = tokio::fs::remove_file(&input).await;

        let converted = match result {
            Err(_) => Err(ConvertError::TimedOut),
            Ok(Err(err)) => Err(ConvertError::Failed(format!(
                "could not launch '{}': {err}",
                self.program
            ))),
            Ok(Ok(finished)) if !finished.status.success() => Err(ConvertError::Failed(
                String::from_utf8_lossy(&finished.stderr).trim().to_string(),
            )),
            Ok(Ok(_)) => tokio::fs::read(&output)
                .await
                .map_err(|_| ConvertError::Failed("converter produced no output file".to_string())),
        };
        let _ = tokio::fs::remove_file(&output).await;
        converted
    }

    fn output_content_type(&self) -> &'static str {
        "application/pdf"
    }
}

/// Load seed listings into the store, creating each owner the first time its
/// email shows up. Seeded accounts get a throwaway password; real deployments
/// seed staging data only.
pub(crate) fn seed_store<S: MarketStore>(
    store: &S,
    listings: Vec<SeedListing>,
) -> Result<(), StoreError> {
    let mut owners = std::collections::HashMap::new();
    let total = listings.len();
    for seed in listings {
        let owner = match owners.get(&seed.owner_email).cloned() {
            Some(id) => id,
            None => {
                let user = store.insert_user(NewUser {
                    name: seed.owner_name.clone(),
                    email: seed.owner_email.clone(),
                    password: "changeme".to_string(),
                    wallet_address: None,
                    zipcode: None,
                })?;
                owners.insert(seed.owner_email.clone(), user.id.clone());
                user.id
            }
        };
        store.insert_listing(
            NewListing {
                title: seed.title,
                description: None,
                address: seed.address,
                website: None,
                rent: seed.rent,
                security_deposit: seed.security_deposit,
                window: seed.window,
                capacity: seed.capacity,
                owner,
            },
            None,
        )?;
    }
    info!(listings = total, owners = owners.len(), "seeded store");
    Ok(())
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
