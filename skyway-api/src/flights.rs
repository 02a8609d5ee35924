use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use skyway_core::inventory::{FlightOffer, OfferQuery, DEFAULT_SEARCH_ADULTS};

use crate::extract::AppQuery;
use crate::{error::AppError, state::AppState};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FlightSearchParams {
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub departure_date: Option<String>,
    pub adults: Option<u32>,
}

impl FlightSearchParams {
    fn into_query(self) -> Result<OfferQuery, AppError> {
        let present = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        let (Some(origin), Some(destination), Some(date)) = (
            present(self.origin),
            present(self.destination),
            present(self.departure_date),
        ) else {
            return Err(AppError::ValidationError("Missing required parameters".to_string()));
        };

        let departure_date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
            .map_err(|_| AppError::ValidationError("Invalid departureDate, expected YYYY-MM-DD".to_string()))?;

        Ok(OfferQuery::new(
            &origin,
            &destination,
            departure_date,
            self.adults.unwrap_or(DEFAULT_SEARCH_ADULTS),
        ))
    }
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/flights", get(search_flights))
}

async fn search_flights(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<FlightSearchParams>,
) -> Result<Json<Vec<FlightOffer>>, AppError> {
    let query = params.into_query()?;

    let offers = state.inventory.search_offers(&query).await.map_err(|e| {
        tracing::warn!(origin = %query.origin, destination = %query.destination, "Flight search failed: {}", e);
        AppError::BadGateway(e.to_string())
    })?;

    tracing::info!(origin = %query.origin, destination = %query.destination, count = offers.len(), "Flight search");
    Ok(Json(offers))
}
