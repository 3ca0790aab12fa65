use super::TripTool;
use crate::persistence::{Booking, BookingQuery, BookingStatus, BookingStore};
use crate::state::TripState;
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;
use tripgraph_core::{AgentError, ToolContext, ToolHandler, ToolParams};

/// A tool to cancel a booked flight
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CancelFlightParams {
    /// The ID of the flight to cancel
    pub flight_id: Option<String>,
    /// The booking reference of the flight to cancel
    pub pnr: Option<String>,
}

impl ToolParams for CancelFlightParams {}

pub struct CancelFlight {
    bookings: Arc<dyn BookingStore>,
}

impl CancelFlight {
    pub fn new(bookings: Arc<dyn BookingStore>) -> Self {
        Self { bookings }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[async_trait]
impl ToolHandler<TripState> for CancelFlight {
    type Params = CancelFlightParams;
    type Output = Booking;

    fn description(&self) -> &str {
        "A tool to cancel a booked flight"
    }

    async fn execute(
        &self,
        params: Self::Params,
        _ctx: ToolContext<'_, TripState>,
    ) -> Result<Self::Output, AgentError> {
        let tool = TripTool::CancelFlight.as_str();
        let query = BookingQuery {
            flight_id: non_blank(params.flight_id),
            pnr: non_blank(params.pnr),
            status: BookingStatus::Ticketed,
        };
        if query.flight_id.is_none() && query.pnr.is_none() {
            return Err(AgentError::tool_execution(
                tool,
                "You must provide either a flightId or a pnr to cancel a flight.",
                false,
            ));
        }

        let booking = self
            .bookings
            .find_booking(&query)
            .await?
            .ok_or_else(|| {
                AgentError::tool_execution(tool, "Could not find the provided flight.", false)
            })?;

        let canceled = self
            .bookings
            .update_booking_status(&booking.flight_id, BookingStatus::Canceled)
            .await?;

        info!(flight_id = %canceled.flight_id, "Canceled flight booking");
        Ok(canceled)
    }

    fn ui_props(
        &self,
        _params: &Self::Params,
        output: &Self::Output,
        _ctx: ToolContext<'_, TripState>,
    ) -> Option<Value> {
        Some(json!({ "flight": output }))
    }
}
