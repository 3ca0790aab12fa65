use super::{FlightItinerary, SimulationProfile, TripTool};
use crate::persistence::{Booking, BookingStore, NewBooking};
use crate::state::TripState;
use crate::trip_planner::validation::is_valid_email;
use async_trait::async_trait;
use rand::Rng;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;
use tripgraph_core::{AgentError, ToolContext, ToolHandler, ToolParams};

/// Flat fare in cents until pricing follows the itinerary.
pub const FLIGHT_BOOKING_TOTAL: i64 = 30_000;

/// A tool to book a flight for the user
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookFlightParams {
    /// The flight itinerary to book
    pub itinerary: FlightItinerary,
    /// The name of the passenger
    pub passenger_name: String,
    /// The email of the passenger
    pub passenger_email: String,
}

impl ToolParams for BookFlightParams {
    fn validate(&self) -> Result<(), String> {
        if self.passenger_name.trim().is_empty() {
            return Err("Passenger name is required".to_string());
        }
        if !is_valid_email(self.passenger_email.trim()) {
            return Err("Invalid email address".to_string());
        }
        Ok(())
    }
}

pub struct BookFlight {
    bookings: Arc<dyn BookingStore>,
    simulation: SimulationProfile,
}

impl BookFlight {
    pub fn new(bookings: Arc<dyn BookingStore>, simulation: SimulationProfile) -> Self {
        Self {
            bookings,
            simulation,
        }
    }
}

#[async_trait]
impl ToolHandler<TripState> for BookFlight {
    type Params = BookFlightParams;
    type Output = Booking;

    fn description(&self) -> &str {
        "A tool to book a flight for the user"
    }

    async fn execute(
        &self,
        params: Self::Params,
        ctx: ToolContext<'_, TripState>,
    ) -> Result<Self::Output, AgentError> {
        self.simulation.run(TripTool::BookFlight.as_str()).await?;

        let pnr = format!("PNR{}", rand::rng().random_range(0..1_000_000));
        // keyed by tool call so a retried or late attempt reuses the first booking
        let booking = self
            .bookings
            .create_booking(NewBooking {
                passenger_name: params.passenger_name.trim().to_string(),
                passenger_email: params.passenger_email.trim().to_lowercase(),
                itinerary_id: params.itinerary.id.clone(),
                pnr,
                total: FLIGHT_BOOKING_TOTAL,
                currency: "USD".to_string(),
                idempotency_key: Some(ctx.tool_call_id.to_string()),
            })
            .await?;

        info!(
            flight_id = %booking.flight_id,
            itinerary_id = %booking.itinerary_id,
            "Created flight booking"
        );
        Ok(booking)
    }

    fn ui_props(
        &self,
        params: &Self::Params,
        output: &Self::Output,
        _ctx: ToolContext<'_, TripState>,
    ) -> Option<Value> {
        Some(json!({
            "passengerEmail": output.passenger_email,
            "passengerName": output.passenger_name,
            "flight": params.itinerary,
            "flightId": output.flight_id,
            "pnr": output.pnr,
        }))
    }
}
