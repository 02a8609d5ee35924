//! Reqwest-backed Amadeus flight-offers adapter.
//!
//! Handles the client-credentials token exchange and the offers search. The
//! access token is cached until shortly before it expires.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use skyway_core::inventory::{FlightOffer, InventoryClient, InventoryError, OfferQuery};
use tokio::sync::Mutex;

use crate::app_config::AmadeusConfig;

const TOKEN_PATH: &str = "/v1/security/oauth2/token";
const OFFERS_PATH: &str = "/v2/shopping/flight-offers";
/// Refresh this long before the provider-reported expiry.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(30);

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Deserialize)]
struct OffersResponse {
    #[serde(default)]
    data: Vec<FlightOffer>,
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

pub struct AmadeusClient {
    client: Client,
    base_url: String,
    client_id: String,
    client_secret: String,
    token: Mutex<Option<CachedToken>>,
}

impl AmadeusClient {
    pub fn new(config: &AmadeusConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            token: Mutex::new(None),
        })
    }

    async fn access_token(&self) -> Result<String, InventoryError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Instant::now() {
                return Ok(token.value.clone());
            }
        }

        tracing::debug!("Requesting Amadeus access token");
        let response = self
            .client
            .post(format!("{}{}", self.base_url, TOKEN_PATH))
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|e| InventoryError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InventoryError::Auth(format!("{}: {}", status.as_u16(), body)));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| InventoryError::Decode(e.to_string()))?;

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        *cached = Some(CachedToken {
            value: token.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });
        Ok(token.access_token)
    }

    async fn invalidate_token(&self) {
        *self.token.lock().await = None;
    }
}

#[async_trait]
impl InventoryClient for AmadeusClient {
    async fn search_offers(&self, query: &OfferQuery) -> Result<Vec<FlightOffer>, InventoryError> {
        let token = self.access_token().await?;
        let departure = query.departure_date.format("%Y-%m-%d").to_string();
        let adults = query.adults.to_string();
        let max = query.max.to_string();

        let response = self
            .client
            .get(format!("{}{}", self.base_url, OFFERS_PATH))
            .bearer_auth(&token)
            .query(&[
                ("originLocationCode", query.origin.as_str()),
                ("destinationLocationCode", query.destination.as_str()),
                ("departureDate", departure.as_str()),
                ("adults", adults.as_str()),
                ("max", max.as_str()),
            ])
            .send()
            .await
            .map_err(|e| InventoryError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| InventoryError::Transport(e.to_string()))?;

        if status == StatusCode::UNAUTHORIZED {
            self.invalidate_token().await;
            return Err(InventoryError::Auth("access token rejected".to_string()));
        }
        if !status.is_success() {
            return Err(InventoryError::Upstream {
                status: status.as_u16(),
                message: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        let decoded: OffersResponse =
            serde_json::from_slice(&body).map_err(|e| InventoryError::Decode(e.to_string()))?;
        tracing::debug!(
            origin = %query.origin,
            destination = %query.destination,
            offers = decoded.data.len(),
            "Flight offers fetched"
        );
        Ok(decoded.data)
    }
}
