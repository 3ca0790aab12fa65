//! Booking persistence boundary.
//!
//! The trip tools only talk to [`BookingStore`]; the in-memory store backs the
//! chat binary and the tests.

mod memory;

pub use memory::InMemoryBookingStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tripgraph_core::AgentError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Ticketed,
    Canceled,
}

/// A persisted flight booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub flight_id: String,
    pub pnr: String,
    pub passenger_name: String,
    pub passenger_email: String,
    pub itinerary_id: String,
    pub status: BookingStatus,
    /// Minor units of `currency`
    pub total: i64,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    pub passenger_name: String,
    pub passenger_email: String,
    pub itinerary_id: String,
    pub pnr: String,
    pub total: i64,
    pub currency: String,
    /// Repeated creates with the same key return the first booking.
    pub idempotency_key: Option<String>,
}

/// Lookup by flight id and/or PNR; every given field must match.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingQuery {
    pub flight_id: Option<String>,
    pub pnr: Option<String>,
    pub status: BookingStatus,
}

impl BookingQuery {
    pub fn matches(&self, booking: &Booking) -> bool {
        if self.flight_id.is_none() && self.pnr.is_none() {
            return false;
        }
        self.flight_id
            .as_ref()
            .map_or(true, |flight_id| *flight_id == booking.flight_id)
            && self.pnr.as_ref().map_or(true, |pnr| *pnr == booking.pnr)
            && self.status == booking.status
    }
}

#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn create_booking(&self, booking: NewBooking) -> Result<Booking, AgentError>;

    async fn find_booking(&self, query: &BookingQuery) -> Result<Option<Booking>, AgentError>;

    async fn update_booking_status(
        &self,
        flight_id: &str,
        status: BookingStatus,
    ) -> Result<Booking, AgentError>;
}
