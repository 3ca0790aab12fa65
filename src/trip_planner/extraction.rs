use super::validation::{normalize_email, validate_passenger_name};
use crate::services::AgentServices;
use crate::state::{format_messages, TripDetails, TripState, TripStateUpdate};
use async_trait::async_trait;
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Utc};
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use tripgraph_core::prelude::*;

pub const EXTRACT_NODE: &str = "extract";

const CONTEXT: &str = "extract-trip-details";
const MAX_RETRIES: u32 = 2;
const DEFAULT_GUESTS: u32 = 2;
const MAX_GUESTS: i64 = 10;

/// Arguments of the `extract` tool as produced by the model.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedTripDetails {
    /// The full name of the passenger
    pub passenger_full_name: String,
    /// The email of the passenger
    pub passenger_email: String,
    /// The origin location to plan the trip from. Can be a city, state, or country.
    pub origin: String,
    /// The destination location to plan the trip to. Can be a city, state, or country.
    pub destination: String,
    /// The start date of the trip. Should be in YYYY-MM-DD format
    #[serde(default)]
    pub start_date: Option<String>,
    /// The end date of the trip. Should be in YYYY-MM-DD format
    #[serde(default)]
    pub end_date: Option<String>,
    /// The number of guests for the trip. Should default to 2 if not specified
    #[serde(default)]
    pub number_of_guests: Option<i64>,
}

impl ExtractedTripDetails {
    /// Validates the extracted fields and applies date and guest defaults.
    pub fn resolve(&self, now: DateTime<Utc>) -> Result<TripDetails, AgentError> {
        validate_passenger_name(&self.passenger_full_name).map_err(AgentError::Validation)?;
        normalize_email(&self.passenger_email).map_err(AgentError::Validation)?;

        let origin = self.origin.trim();
        if origin.chars().count() < 2 {
            return Err(AgentError::Validation("Origin must be specified".to_string()));
        }
        let destination = self.destination.trim();
        if destination.chars().count() < 2 {
            return Err(AgentError::Validation("Destination must be specified".to_string()));
        }

        let number_of_guests = match self.number_of_guests {
            Some(guests) if guests > MAX_GUESTS => {
                return Err(AgentError::Validation(
                    "Number of guests cannot exceed 10".to_string(),
                ))
            }
            Some(guests) if guests > 0 => guests as u32,
            _ => DEFAULT_GUESTS,
        };

        let (start_date, end_date) =
            resolve_trip_dates(self.start_date.as_deref(), self.end_date.as_deref(), now)?;

        Ok(TripDetails {
            origin: origin.to_string(),
            destination: destination.to_string(),
            start_date,
            end_date,
            number_of_guests,
        })
    }
}

/// Accepts RFC 3339 timestamps, `YYYY-MM-DDTHH:MM:SS` and plain
/// `YYYY-MM-DD` dates (midnight UTC).
fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Some(parsed.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|date| date.and_utc())
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.trim().is_empty())
}

/// Exactly one day after `now`, keeping the time of day.
fn tomorrow(now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::days(1)
}

/// Resolves the travel window.
///
/// - neither date: four to five weeks from `now`
/// - start only: a one-week trip from start
/// - end only: a one-week trip ending at end
/// - both: taken as given
///
/// Supplied dates must parse and must not fall earlier than `now` plus one
/// day; the end must follow the start.
pub fn resolve_trip_dates(
    start: Option<&str>,
    end: Option<&str>,
    now: DateTime<Utc>,
) -> Result<(DateTime<Utc>, DateTime<Utc>), AgentError> {
    let tomorrow = tomorrow(now);
    let parse_start = |raw: &str| {
        parse_date(raw)
            .ok_or_else(|| AgentError::Validation(format!("Invalid start date format: {raw}")))
    };
    let parse_end = |raw: &str| {
        parse_date(raw)
            .ok_or_else(|| AgentError::Validation(format!("Invalid end date format: {raw}")))
    };

    match (non_blank(start), non_blank(end)) {
        (None, None) => Ok((now + Duration::days(28), now + Duration::days(35))),
        (Some(start), None) => {
            let start = parse_start(start)?;
            if start < tomorrow {
                return Err(AgentError::Validation("Start date must be in the future".to_string()));
            }
            Ok((start, start + Duration::days(7)))
        }
        (None, Some(end)) => {
            let end = parse_end(end)?;
            if end < tomorrow {
                return Err(AgentError::Validation("End date must be in the future".to_string()));
            }
            Ok((end - Duration::days(7), end))
        }
        (Some(start), Some(end)) => {
            let start = parse_start(start)?;
            let end = parse_end(end)?;
            if start < tomorrow {
                return Err(AgentError::Validation("Start date must be in the future".to_string()));
            }
            if end <= start {
                return Err(AgentError::Validation(
                    "End date must be after start date".to_string(),
                ));
            }
            Ok((start, end))
        }
    }
}

fn extract_tool() -> ToolSchema {
    ToolSchema::for_params::<ExtractedTripDetails>(
        "extract",
        "A tool to extract information from a user's request.",
    )
}

fn system_prompt(now: DateTime<Utc>) -> String {
    let year = now.year();
    let today = now.format("%B %-d, %Y");
    format!(
        r#"You are a dedicated trip planning assistant.

IMPORTANT CONTEXT: Today is {today}. When interpreting dates, always use the current year {year} unless the user explicitly specifies a different year. For example, if a user says "December 25", interpret this as "December 25, {year}" not any past year.

Gather these details about the trip:

Passenger details:
   - The passenger's full name (for any bookings)
   - The passenger's email address (for confirmations and updates)

Trip information:
   - Where the user would like to go (destination)
   - Where the user is traveling from (assume New York if not specified)
   - When the user would like to travel (start and end dates, optional for now)
   - How many travelers will be going

Date guidelines:
- Always interpret dates in the context of {year} unless explicitly told otherwise
- If a user gives a month and day without a year, assume {year}
- Dates should be in YYYY-MM-DD format (e.g., {year}-12-25 for December 25th)

If essential information such as the destination, name, or email is missing, politely ask the user for it instead of calling the tool."#
    )
}

/// Extracts trip details from the conversation, or asks for what is missing.
#[derive(Debug)]
pub struct ExtractNode {
    services: Arc<AgentServices>,
}

impl ExtractNode {
    pub fn new(services: Arc<AgentServices>) -> Self {
        Self { services }
    }

    async fn extract(&self, state: &TripState) -> Result<Vec<TripStateUpdate>, AgentError> {
        let config = self.services.config()?;
        let model = self.services.models().extraction(
            ModelOptions::new()
                .tools(vec![extract_tool()])
                .timeout(config.model.timeout())
                .tag("extract")
                .tag("trip-details"),
        )?;

        let now = Utc::now();
        let human = format!(
            "Here is the entire conversation so far:\n{}",
            format_messages(&state.messages)
        );
        let response = model
            .invoke(&[Message::system(system_prompt(now)), Message::human(human)])
            .await?;

        let Some(call) = response.tool_calls.first().cloned() else {
            info!("No tool call found, returning clarification message");
            return Ok(vec![TripStateUpdate::Messages(vec![response])]);
        };

        let extracted: ExtractedTripDetails = serde_json::from_value(call.args.clone())
            .map_err(|err| AgentError::Validation(format!("Invalid trip details: {err}")))?;
        let details = extracted.resolve(now)?;

        info!(
            origin = %details.origin,
            destination = %details.destination,
            start_date = %details.start_date.to_rfc3339(),
            end_date = %details.end_date.to_rfc3339(),
            number_of_guests = details.number_of_guests,
            "Trip details extracted successfully"
        );

        let acknowledgement = Message::tool(&call.id, "Successfully extracted trip details").hidden();
        Ok(vec![
            TripStateUpdate::TripDetails(Some(details)),
            TripStateUpdate::Messages(vec![response, acknowledgement]),
        ])
    }
}

#[async_trait]
impl Node<TripState> for ExtractNode {
    async fn process(&self, _ctx: &Context, state: TripState) -> NodeResult<TripState> {
        info!("Starting trip details extraction");

        // TODO: narrow to retryable errors once provider failures carry reliable retry flags
        let retry = self
            .services
            .retry_options(MAX_RETRIES)?
            .retry_if(|err| !matches!(err, AgentError::Validation(_)));

        let updates = safe_execute(CONTEXT, SafeExecuteOptions::new().retry(retry), || {
            self.extract(&state)
        })
        .await?;
        Ok(NodeOutput::Updates(updates))
    }

    fn name(&self) -> &str {
        EXTRACT_NODE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 15, 30, 0).unwrap()
    }

    fn validation_message(err: AgentError) -> String {
        match err {
            AgentError::Validation(message) => message,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_no_dates_defaults_to_four_to_five_weeks_out() {
        let (start, end) = resolve_trip_dates(None, None, now()).unwrap();
        assert_eq!(start, now() + Duration::days(28));
        assert_eq!(end, now() + Duration::days(35));

        // blank strings count as missing
        let (start, _) = resolve_trip_dates(Some(" "), Some(""), now()).unwrap();
        assert_eq!(start, now() + Duration::days(28));
    }

    #[test]
    fn test_single_date_gives_a_one_week_trip() {
        let (start, end) = resolve_trip_dates(Some("2026-12-01"), None, now()).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 12, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 12, 8, 0, 0, 0).unwrap());

        let (start, end) = resolve_trip_dates(None, Some("2026-12-08"), now()).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 12, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 12, 8, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_tomorrow_is_the_earliest_start() {
        assert!(resolve_trip_dates(Some("2026-10-20"), None, now()).is_ok());
        assert!(resolve_trip_dates(Some("2026-10-19T15:30:00Z"), None, now()).is_ok());

        let err = resolve_trip_dates(Some("2026-10-18"), None, now()).unwrap_err();
        assert_eq!(validation_message(err), "Start date must be in the future");

        let err = resolve_trip_dates(None, Some("2026-10-01"), now()).unwrap_err();
        assert_eq!(validation_message(err), "End date must be in the future");
    }

    #[test]
    fn test_dates_before_a_full_day_from_now_are_rejected() {
        // after the next midnight but less than 24h away
        for start in ["2026-10-19", "2026-10-19T10:00:00Z", "2026-10-19T15:29:59Z"] {
            let err = resolve_trip_dates(Some(start), None, now()).unwrap_err();
            assert_eq!(validation_message(err), "Start date must be in the future");
        }

        let err = resolve_trip_dates(None, Some("2026-10-19T00:00:00Z"), now()).unwrap_err();
        assert_eq!(validation_message(err), "End date must be in the future");

        let err = resolve_trip_dates(Some("2026-10-19T12:00:00Z"), Some("2026-10-25"), now())
            .unwrap_err();
        assert_eq!(validation_message(err), "Start date must be in the future");
    }

    #[test]
    fn test_both_dates_are_validated() {
        let (start, end) =
            resolve_trip_dates(Some("2026-11-01"), Some("2026-11-03T10:00:00Z"), now()).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 11, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 11, 3, 10, 0, 0).unwrap());

        let err = resolve_trip_dates(Some("2026-11-03"), Some("2026-11-03"), now()).unwrap_err();
        assert_eq!(validation_message(err), "End date must be after start date");

        let err = resolve_trip_dates(Some("2026-09-03"), Some("2026-11-03"), now()).unwrap_err();
        assert_eq!(validation_message(err), "Start date must be in the future");

        let err = resolve_trip_dates(Some("next friday"), Some("2026-11-03"), now()).unwrap_err();
        assert_eq!(validation_message(err), "Invalid start date format: next friday");

        let err = resolve_trip_dates(Some("2026-11-01"), Some("13/11/2026"), now()).unwrap_err();
        assert_eq!(validation_message(err), "Invalid end date format: 13/11/2026");
    }

    fn extracted() -> ExtractedTripDetails {
        ExtractedTripDetails {
            passenger_full_name: "Ada Lovelace".to_string(),
            passenger_email: " Ada@Example.com ".to_string(),
            origin: " New York ".to_string(),
            destination: "Lisbon".to_string(),
            start_date: None,
            end_date: None,
            number_of_guests: None,
        }
    }

    #[test]
    fn test_resolve_applies_defaults_and_trims() {
        let details = extracted().resolve(now()).unwrap();
        assert_eq!(details.origin, "New York");
        assert_eq!(details.number_of_guests, 2);

        let details = ExtractedTripDetails {
            number_of_guests: Some(0),
            ..extracted()
        }
        .resolve(now())
        .unwrap();
        assert_eq!(details.number_of_guests, 2);

        let details = ExtractedTripDetails {
            number_of_guests: Some(4),
            ..extracted()
        }
        .resolve(now())
        .unwrap();
        assert_eq!(details.number_of_guests, 4);
    }

    #[test]
    fn test_resolve_rejects_bad_fields() {
        let cases = [
            (
                ExtractedTripDetails {
                    number_of_guests: Some(11),
                    ..extracted()
                },
                "Number of guests cannot exceed 10",
            ),
            (
                ExtractedTripDetails {
                    passenger_email: "ada".to_string(),
                    ..extracted()
                },
                "Invalid email address",
            ),
            (
                ExtractedTripDetails {
                    origin: " X ".to_string(),
                    ..extracted()
                },
                "Origin must be specified",
            ),
            (
                ExtractedTripDetails {
                    destination: "".to_string(),
                    ..extracted()
                },
                "Destination must be specified",
            ),
            (
                ExtractedTripDetails {
                    passenger_full_name: "C3PO".to_string(),
                    ..extracted()
                },
                "Name can only contain letters, spaces, hyphens, and apostrophes",
            ),
        ];

        for (input, expected) in cases {
            let err = input.resolve(now()).unwrap_err();
            assert!(!err.is_retryable());
            assert_eq!(validation_message(err), expected);
        }
    }
}
