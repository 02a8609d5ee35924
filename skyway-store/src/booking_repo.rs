use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use skyway_booking::ledger::{BookingLedger, LedgerError};
use skyway_booking::models::{Booking, BookingFilter, BookingStatus, Passenger, PaymentDetails};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

pub struct PgBookingLedger {
    pool: PgPool,
}

impl PgBookingLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    user_id: Uuid,
    flight: String,
    airline_name: String,
    departure: NaiveDateTime,
    arrival: NaiveDateTime,
    passengers: Json<Vec<Passenger>>,
    payment_method: String,
    payment_intent_id: Option<String>,
    charge_id: Option<String>,
    total_price: Decimal,
    tickets_count: i32,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = LedgerError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<BookingStatus>()
            .map_err(|e| LedgerError::Storage(e.to_string()))?;
        let method = row.payment_method.parse().map_err(LedgerError::Storage)?;

        Ok(Booking {
            id: row.id,
            user_id: row.user_id,
            flight: row.flight,
            airline_name: row.airline_name,
            departure: row.departure,
            arrival: row.arrival,
            passengers: row.passengers.0,
            payment_details: PaymentDetails {
                method,
                payment_intent_id: row.payment_intent_id,
                charge_id: row.charge_id,
            },
            total_price: row.total_price,
            tickets_count: row.tickets_count.max(0) as u32,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const BOOKING_COLUMNS: &str = "id, user_id, flight, airline_name, departure, arrival, passengers, payment_method, payment_intent_id, charge_id, total_price, tickets_count, status, created_at, updated_at";

fn storage(e: sqlx::Error) -> LedgerError {
    LedgerError::Storage(e.to_string())
}

#[async_trait]
impl BookingLedger for PgBookingLedger {
    async fn insert(&self, booking: &Booking) -> Result<(), LedgerError> {
        sqlx::query(
            r#"
            INSERT INTO bookings (id, user_id, flight, airline_name, departure, arrival, passengers, payment_method, payment_intent_id, charge_id, total_price, tickets_count, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(booking.id)
        .bind(booking.user_id)
        .bind(&booking.flight)
        .bind(&booking.airline_name)
        .bind(booking.departure)
        .bind(booking.arrival)
        .bind(Json(&booking.passengers))
        .bind(booking.payment_details.method.as_str())
        .bind(&booking.payment_details.payment_intent_id)
        .bind(&booking.payment_details.charge_id)
        .bind(booking.total_price)
        .bind(booking.tickets_count as i32)
        .bind(booking.status.as_str())
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&self.pool)
        .await
        .map_err(storage)?;

        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Booking>, LedgerError> {
        let row = sqlx::query_as::<_, BookingRow>(&format!("SELECT {} FROM bookings WHERE id = $1", BOOKING_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?;

        row.map(Booking::try_from).transpose()
    }

    async fn list(&self, filter: &BookingFilter) -> Result<Vec<Booking>, LedgerError> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM bookings WHERE TRUE", BOOKING_COLUMNS));
        if let Some(owner) = filter.owner {
            qb.push(" AND user_id = ").push_bind(owner);
        }
        if let Some(status) = filter.status {
            qb.push(" AND status = ").push_bind(status.as_str());
        }
        qb.push(" ORDER BY created_at DESC");

        let rows: Vec<BookingRow> = qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(storage)?;

        rows.into_iter().map(Booking::try_from).collect()
    }

    async fn save_status(&self, booking: &Booking, expected: BookingStatus) -> Result<(), LedgerError> {
        let result = sqlx::query("UPDATE bookings SET status = $1, updated_at = $2 WHERE id = $3 AND status = $4")
            .bind(booking.status.as_str())
            .bind(booking.updated_at)
            .bind(booking.id)
            .bind(expected.as_str())
            .execute(&self.pool)
            .await
            .map_err(storage)?;

        if result.rows_affected() == 0 {
            let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM bookings WHERE id = $1")
                .bind(booking.id)
                .fetch_optional(&self.pool)
                .await
                .map_err(storage)?;
            return Err(match exists {
                Some(_) => LedgerError::StatusConflict { id: booking.id, expected },
                None => LedgerError::NotFound(booking.id),
            });
        }
        Ok(())
    }
}
