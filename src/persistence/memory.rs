use super::{Booking, BookingQuery, BookingStatus, BookingStore, NewBooking};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, info};
use tripgraph_core::AgentError;
use uuid::Uuid;

#[derive(Debug, Default)]
struct Tables {
    bookings: HashMap<String, Booking>,
    // idempotency key -> flight id
    keys: HashMap<String, String>,
}

#[derive(Debug, Default)]
pub struct InMemoryBookingStore {
    tables: RwLock<Tables>,
}

impl InMemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All bookings ordered by creation time.
    pub async fn bookings(&self) -> Vec<Booking> {
        let mut bookings: Vec<Booking> = self.tables.read().await.bookings.values().cloned().collect();
        bookings.sort_by_key(|booking| booking.created_at);
        bookings
    }

    pub async fn len(&self) -> usize {
        self.tables.read().await.bookings.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn create_booking(&self, booking: NewBooking) -> Result<Booking, AgentError> {
        let mut tables = self.tables.write().await;

        if let Some(existing) = booking
            .idempotency_key
            .as_ref()
            .and_then(|key| tables.keys.get(key))
            .and_then(|flight_id| tables.bookings.get(flight_id))
        {
            debug!(flight_id = %existing.flight_id, "Returning existing booking for idempotency key");
            return Ok(existing.clone());
        }

        let now = Utc::now();
        let created = Booking {
            flight_id: Uuid::new_v4().to_string(),
            pnr: booking.pnr,
            passenger_name: booking.passenger_name,
            passenger_email: booking.passenger_email,
            itinerary_id: booking.itinerary_id,
            status: BookingStatus::Ticketed,
            total: booking.total,
            currency: booking.currency,
            created_at: now,
            updated_at: now,
        };

        if let Some(key) = booking.idempotency_key {
            tables.keys.insert(key, created.flight_id.clone());
        }
        tables
            .bookings
            .insert(created.flight_id.clone(), created.clone());

        info!(flight_id = %created.flight_id, itinerary_id = %created.itinerary_id, "Created booking");
        Ok(created)
    }

    async fn find_booking(&self, query: &BookingQuery) -> Result<Option<Booking>, AgentError> {
        let tables = self.tables.read().await;
        Ok(tables
            .bookings
            .values()
            .find(|booking| query.matches(booking))
            .cloned())
    }

    async fn update_booking_status(
        &self,
        flight_id: &str,
        status: BookingStatus,
    ) -> Result<Booking, AgentError> {
        let mut tables = self.tables.write().await;
        let booking = tables.bookings.get_mut(flight_id).ok_or_else(|| {
            AgentError::persistence(format!("Booking {flight_id} does not exist"), false)
        })?;

        booking.status = status;
        booking.updated_at = Utc::now();
        Ok(booking.clone())
    }
}
