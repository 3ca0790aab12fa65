use super::{require_trip_details, TripTool};
use crate::state::{TripDetails, TripState};
use async_trait::async_trait;
use rand::seq::IndexedRandom;
use rand::Rng;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tripgraph_core::{AgentError, ToolContext, ToolHandler, ToolParams};
use uuid::Uuid;

const STAY_STYLES: [&str; 8] = [
    "Grand", "Harbor", "Garden", "Old Town", "Skyline", "Riverside", "Boutique", "Central",
];
const STAY_KINDS: [&str; 5] = ["Hotel", "Inn", "Suites", "Residences", "Lodge"];
const STAYS_PER_SEARCH: usize = 6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Accommodation {
    pub id: String,
    pub name: String,
    /// Nightly rate in USD
    pub price: u32,
    pub rating: f64,
    pub city: String,
    pub image: String,
}

pub fn generate_accommodations(details: &TripDetails) -> Vec<Accommodation> {
    let mut rng = rand::rng();

    (0..STAYS_PER_SEARCH)
        .map(|_| {
            let id = Uuid::new_v4().to_string();
            let style = STAY_STYLES.choose(&mut rng).copied().unwrap_or("Central");
            let kind = STAY_KINDS.choose(&mut rng).copied().unwrap_or("Hotel");
            // one decimal place, 3.5 to 5.0
            let rating = f64::from(rng.random_range(35u32..=50)) / 10.0;

            Accommodation {
                name: format!("{} {} {}", details.destination, style, kind),
                price: rng.random_range(80..=600),
                rating,
                city: details.destination.clone(),
                image: format!("https://picsum.photos/seed/{id}/640/480"),
                id,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct ListAccommodationsParams {}

impl ToolParams for ListAccommodationsParams {}

#[derive(Debug, Clone, Copy, Default)]
pub struct ListAccommodations;

#[async_trait]
impl ToolHandler<TripState> for ListAccommodations {
    type Params = ListAccommodationsParams;
    type Output = Vec<Accommodation>;

    fn description(&self) -> &str {
        "A tool to list accommodations for the user"
    }

    async fn execute(
        &self,
        _params: Self::Params,
        ctx: ToolContext<'_, TripState>,
    ) -> Result<Self::Output, AgentError> {
        let details = require_trip_details(TripTool::ListAccommodations, &ctx)?;
        Ok(generate_accommodations(details))
    }

    fn ui_props(
        &self,
        _params: &Self::Params,
        output: &Self::Output,
        ctx: ToolContext<'_, TripState>,
    ) -> Option<Value> {
        Some(json!({
            "toolCallId": ctx.tool_call_id,
            "tripDetails": ctx.state.trip_details,
            "accommodations": output,
        }))
    }
}
