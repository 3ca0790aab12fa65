#![allow(dead_code)]

use serde_json::{json, Value};
use std::sync::Arc;
use tripgraph::config::{AgentConfig, ConfigCache, Environment, RetryConfig};
use tripgraph::persistence::InMemoryBookingStore;
use tripgraph::AgentServices;
use tripgraph_core::completion::ScriptedBuilder;
use tripgraph_core::ScriptedModel;

pub struct Harness {
    pub model: Arc<ScriptedModel>,
    pub bookings: Arc<InMemoryBookingStore>,
    pub services: Arc<AgentServices>,
}

/// Test environment with millisecond retry delays.
pub fn test_config() -> AgentConfig {
    AgentConfig {
        environment: Environment::Test,
        retry: RetryConfig {
            max_retries: 2,
            base_delay_ms: 1,
            max_delay_ms: 5,
            exponential_backoff: false,
        },
        ..AgentConfig::default()
    }
}

pub fn harness() -> Harness {
    harness_with(test_config())
}

pub fn harness_with(config: AgentConfig) -> Harness {
    let model = Arc::new(ScriptedModel::new());
    let bookings = Arc::new(InMemoryBookingStore::new());
    let services = AgentServices::new(
        ConfigCache::fixed(config),
        Arc::new(ScriptedBuilder::new(Arc::clone(&model))),
        bookings.clone(),
    )
    .unwrap();

    Harness {
        model,
        bookings,
        services: Arc::new(services),
    }
}

pub fn itinerary_json() -> Value {
    json!({
        "id": "0f0c5a9e-2d6b-4c47-9a0e-3b5c1f7e8d21",
        "airline": "Delta",
        "from": "London",
        "to": "Tokyo",
        "departureTime": "2099-05-01T09:00:00.000Z",
        "arrivalTime": "2099-05-01T21:30:00.000Z",
        "duration": "12h 30m",
        "stops": 1,
        "price": 845.5
    })
}

pub fn extracted_details_json() -> Value {
    json!({
        "passengerFullName": "Jane Doe",
        "passengerEmail": "jane@example.com",
        "origin": "London",
        "destination": "Tokyo",
        "startDate": "2099-05-01",
        "endDate": "2099-05-10",
        "numberOfGuests": 2
    })
}
