use super::{require_trip_details, TripTool};
use crate::state::{TripDetails, TripState};
use async_trait::async_trait;
use chrono::{Duration, SecondsFormat, Utc};
use rand::seq::IndexedRandom;
use rand::Rng;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tripgraph_core::{AgentError, ToolContext, ToolHandler, ToolParams};
use uuid::Uuid;

const AIRLINES: [&str; 10] = [
    "Delta Air Lines",
    "United Airlines",
    "American Airlines",
    "Southwest Airlines",
    "JetBlue",
    "Alaska Airlines",
    "Air Canada",
    "LATAM",
    "Emirates",
    "Lufthansa",
];

const OFFERS_PER_SEARCH: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FlightItinerary {
    pub id: String,
    pub airline: String,
    pub from: String,
    pub to: String,
    pub departure_time: String,
    pub arrival_time: String,
    pub duration: String,
    pub stops: u32,
    pub price: f64,
}

/// Synthetic offers departing within the next one to ten days.
pub fn generate_itineraries(details: &TripDetails) -> Vec<FlightItinerary> {
    let mut rng = rand::rng();
    let now = Utc::now();

    (0..OFFERS_PER_SEARCH)
        .map(|_| {
            let departure = now + Duration::minutes(rng.random_range(24 * 60..=10 * 24 * 60));
            let hours = rng.random_range(2..=15);
            let minutes = rng.random_range(0..=59);
            let arrival = departure + Duration::hours(hours) + Duration::minutes(minutes);

            FlightItinerary {
                id: Uuid::new_v4().to_string(),
                airline: AIRLINES.choose(&mut rng).copied().unwrap_or(AIRLINES[0]).to_string(),
                from: details.origin.clone(),
                to: details.destination.clone(),
                departure_time: departure.to_rfc3339_opts(SecondsFormat::Millis, true),
                arrival_time: arrival.to_rfc3339_opts(SecondsFormat::Millis, true),
                duration: format!("{hours}h {minutes}m"),
                stops: rng.random_range(0..=2),
                price: f64::from(rng.random_range(200u32..=2000)),
            }
        })
        .collect()
}

/// Takes no arguments; the route comes from the trip details.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct ListFlightItinerariesParams {}

impl ToolParams for ListFlightItinerariesParams {}

#[derive(Debug, Clone, Copy, Default)]
pub struct ListFlightItineraries;

#[async_trait]
impl ToolHandler<TripState> for ListFlightItineraries {
    type Params = ListFlightItinerariesParams;
    type Output = Vec<FlightItinerary>;

    fn description(&self) -> &str {
        "A tool to list flight itineraries for the user"
    }

    async fn execute(
        &self,
        _params: Self::Params,
        ctx: ToolContext<'_, TripState>,
    ) -> Result<Self::Output, AgentError> {
        let details = require_trip_details(TripTool::ListFlightItineraries, &ctx)?;
        Ok(generate_itineraries(details))
    }

    fn ui_props(
        &self,
        _params: &Self::Params,
        output: &Self::Output,
        ctx: ToolContext<'_, TripState>,
    ) -> Option<Value> {
        Some(json!({
            "toolCallId": ctx.tool_call_id,
            "flights": output,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn details() -> TripDetails {
        let start = Utc::now() + Duration::days(30);
        TripDetails {
            origin: "NYC".to_string(),
            destination: "LAX".to_string(),
            start_date: start,
            end_date: start + Duration::days(7),
            number_of_guests: 2,
        }
    }

    #[test]
    fn test_offers_follow_the_search() {
        let now = Utc::now();
        let offers = generate_itineraries(&details());
        assert_eq!(offers.len(), OFFERS_PER_SEARCH);

        for offer in offers {
            assert_eq!(offer.from, "NYC");
            assert_eq!(offer.to, "LAX");
            assert!(AIRLINES.contains(&offer.airline.as_str()));
            assert!(offer.stops <= 2);
            assert!((200.0..=2000.0).contains(&offer.price));

            let departure = DateTime::parse_from_rfc3339(&offer.departure_time).unwrap();
            let arrival = DateTime::parse_from_rfc3339(&offer.arrival_time).unwrap();
            assert!(departure > now + Duration::hours(23));
            assert!(departure <= now + Duration::days(10) + Duration::minutes(1));

            let flight_time = arrival - departure;
            assert!(flight_time >= Duration::hours(2));
            assert!(flight_time < Duration::hours(16));
        }
    }
}
