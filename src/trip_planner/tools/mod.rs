//! The trip tools the tool-calling model may invoke.

mod accommodations;
mod book_flight;
mod cancel_flight;
mod flights;
mod simulation;

pub use accommodations::{generate_accommodations, Accommodation, ListAccommodations, ListAccommodationsParams};
pub use book_flight::{BookFlight, BookFlightParams, FLIGHT_BOOKING_TOTAL};
pub use cancel_flight::{CancelFlight, CancelFlightParams};
pub use flights::{generate_itineraries, FlightItinerary, ListFlightItineraries, ListFlightItinerariesParams};
pub use simulation::{SimulatedFailure, SimulationProfile};

use crate::persistence::BookingStore;
use crate::state::{TripDetails, TripState};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tripgraph_core::tool::ToolDefaults;
use tripgraph_core::{AgentError, ToolContext, ToolOptions, ToolRegistry};

pub const ACCOMMODATIONS_LIST: &str = "accommodations-list";
pub const FLIGHT_ITINERARIES_LIST: &str = "flight-itineraries-list";
pub const FLIGHT_BOOKING_CONFIRMATION: &str = "flight-booking-confirmation";
pub const FLIGHT_BOOKING_ERROR: &str = "flight-booking-error";
pub const FLIGHT_CANCELLATION_CONFIRMATION: &str = "flight-cancellation-confirmation";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TripTool {
    ListFlightItineraries,
    ListAccommodations,
    BookFlight,
    CancelFlight,
}

impl TripTool {
    pub const ALL: [TripTool; 4] = [
        TripTool::ListFlightItineraries,
        TripTool::ListAccommodations,
        TripTool::BookFlight,
        TripTool::CancelFlight,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TripTool::ListFlightItineraries => "list-flight-itineraries",
            TripTool::ListAccommodations => "list-accommodations",
            TripTool::BookFlight => "book-flight",
            TripTool::CancelFlight => "cancel-flight",
        }
    }
}

impl fmt::Display for TripTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TripTool {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TripTool::ALL
            .into_iter()
            .find(|tool| tool.as_str() == s)
            .ok_or_else(|| format!("unknown trip tool: {s}"))
    }
}

pub type TripToolRegistry = ToolRegistry<TripTool, TripState>;

/// Registers all four trip tools with their UI components.
pub fn build_registry(
    defaults: ToolDefaults,
    bookings: Arc<dyn BookingStore>,
    simulation: SimulationProfile,
) -> TripToolRegistry {
    let mut registry = ToolRegistry::new(defaults);
    registry
        .register(
            TripTool::ListFlightItineraries,
            ListFlightItineraries,
            ToolOptions::new().component(FLIGHT_ITINERARIES_LIST),
        )
        .register(
            TripTool::ListAccommodations,
            ListAccommodations,
            ToolOptions::new().component(ACCOMMODATIONS_LIST),
        )
        .register(
            TripTool::BookFlight,
            BookFlight::new(Arc::clone(&bookings), simulation),
            ToolOptions::new()
                .component(FLIGHT_BOOKING_CONFIRMATION)
                .error_component(FLIGHT_BOOKING_ERROR),
        )
        .register(
            TripTool::CancelFlight,
            CancelFlight::new(bookings),
            ToolOptions::new().component(FLIGHT_CANCELLATION_CONFIRMATION),
        );
    registry
}

fn require_trip_details<'a>(
    tool: TripTool,
    ctx: &ToolContext<'a, TripState>,
) -> Result<&'a TripDetails, AgentError> {
    ctx.state
        .trip_details
        .as_ref()
        .ok_or_else(|| AgentError::tool_execution(tool.as_str(), "No trip details found", false))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_names_round_trip() {
        for tool in TripTool::ALL {
            assert_eq!(tool.to_string().parse::<TripTool>().unwrap(), tool);
        }
        assert!("book-hotel".parse::<TripTool>().is_err());
    }
}
