use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Maximum number of offers requested from the inventory source per query.
pub const MAX_OFFERS: u32 = 30;

/// Default traveller count used by the plain flight search.
pub const DEFAULT_SEARCH_ADULTS: u32 = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferQuery {
    pub origin: String,
    pub destination: String,
    pub departure_date: NaiveDate,
    pub adults: u32,
    pub max: u32,
}

impl OfferQuery {
    pub fn new(origin: &str, destination: &str, departure_date: NaiveDate, adults: u32) -> Self {
        Self {
            origin: origin.trim().to_uppercase(),
            destination: destination.trim().to_uppercase(),
            departure_date,
            adults: adults.max(1),
            max: MAX_OFFERS,
        }
    }
}

/// A priced itinerary as returned by the GDS flight-offers search.
///
/// Only the fields the booking flow reads are modelled; everything else the
/// provider sends is kept in `extra` so search results pass through intact.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightOffer {
    pub id: String,
    #[serde(default)]
    pub number_of_bookable_seats: u32,
    #[serde(default)]
    pub itineraries: Vec<Itinerary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<OfferPrice>,
    #[serde(default)]
    pub validating_airline_codes: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Itinerary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default)]
    pub segments: Vec<Segment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub departure: FlightEndpoint,
    pub arrival: FlightEndpoint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carrier_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_seats: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightEndpoint {
    #[serde(default)]
    pub iata_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminal: Option<String>,
    pub at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferPrice {
    pub currency: String,
    pub total: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grand_total: Option<String>,
}

impl FlightOffer {
    /// The first validating carrier, used as the booked airline.
    pub fn carrier(&self) -> Option<&str> {
        self.validating_airline_codes.first().map(String::as_str)
    }

    /// Departure of the first segment of the outbound itinerary.
    pub fn departure_at(&self) -> Option<NaiveDateTime> {
        self.itineraries
            .first()
            .and_then(|it| it.segments.first())
            .map(|s| s.departure.at)
    }

    /// Arrival of the last segment of the outbound itinerary.
    pub fn arrival_at(&self) -> Option<NaiveDateTime> {
        self.itineraries
            .first()
            .and_then(|it| it.segments.last())
            .map(|s| s.arrival.at)
    }

    pub fn has_seat(&self, seat: &str) -> bool {
        self.itineraries.iter().any(|it| {
            it.segments.iter().any(|s| {
                s.available_seats
                    .as_ref()
                    .is_some_and(|seats| seats.iter().any(|a| a == seat))
            })
        })
    }

    /// Requested seats that no segment of any itinerary lists as available,
    /// in request order.
    pub fn unavailable_seats(&self, requested: &[String]) -> Vec<String> {
        requested
            .iter()
            .filter(|seat| !self.has_seat(seat))
            .cloned()
            .collect()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("Inventory transport error: {0}")]
    Transport(String),
    #[error("Inventory authentication failed: {0}")]
    Auth(String),
    #[error("Inventory provider returned {status}: {message}")]
    Upstream { status: u16, message: String },
    #[error("Inventory response could not be decoded: {0}")]
    Decode(String),
}

/// Read-only access to the external flight-offer catalog. Every call hits the
/// provider; nothing is cached.
#[async_trait]
pub trait InventoryClient: Send + Sync {
    async fn search_offers(&self, query: &OfferQuery) -> Result<Vec<FlightOffer>, InventoryError>;
}
