//! Request and response types for the JSON API.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::{Edge, Itinerary, Timestamp};
use crate::planner::TripMode;

/// Which end of the trip the request's time constrains.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeDto {
    Depart,
    Arrive,
}

impl From<ModeDto> for TripMode {
    fn from(mode: ModeDto) -> Self {
        match mode {
            ModeDto::Depart => TripMode::Depart,
            ModeDto::Arrive => TripMode::Arrive,
        }
    }
}

/// Body of `POST /itinerary/plan`.
#[derive(Debug, Deserialize)]
pub struct PlanRequest {
    pub origin: String,
    pub destination: String,
    /// Trip time, `YYYY-MM-DDTHH:MM[:SS]`.
    pub time: String,
    pub mode: ModeDto,
}

/// Body of `POST /itinerary/alternatives`.
#[derive(Debug, Deserialize)]
pub struct AlternativesRequest {
    #[serde(flatten)]
    pub plan: PlanRequest,
    #[serde(default = "default_max_count")]
    pub max_count: usize,
}

fn default_max_count() -> usize {
    3
}

/// Query of `GET /departures`.
#[derive(Debug, Deserialize)]
pub struct DeparturesQuery {
    pub from: String,
    /// List departures after this time, `YYYY-MM-DDTHH:MM[:SS]`.
    pub after: String,
    pub limit: Option<usize>,
}

/// An intermediate stop on a leg.
#[derive(Debug, Serialize)]
pub struct StopDto {
    pub node: String,
    pub time: String,
}

/// One leg of an itinerary, or one listed departure.
#[derive(Debug, Serialize)]
pub struct EdgeDto {
    pub provider: &'static str,
    pub from: String,
    pub to: String,
    pub depart: String,
    pub arrive: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instruction: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub intermediate_stops: Vec<StopDto>,
}

impl EdgeDto {
    pub fn from_edge(edge: &Edge) -> Self {
        Self {
            provider: edge.provider.name(),
            from: edge.from.clone(),
            to: edge.to.clone(),
            depart: format_time(edge.depart),
            arrive: format_time(edge.arrive),
            instruction: edge.instruction.clone(),
            intermediate_stops: edge
                .intermediate_stops
                .iter()
                .map(|stop| StopDto {
                    node: stop.node.clone(),
                    time: format_time(stop.time),
                })
                .collect(),
        }
    }
}

/// Response of `POST /itinerary/plan`.
#[derive(Debug, Serialize)]
pub struct ItineraryDto {
    pub departs: String,
    pub arrives: String,
    pub edges: Vec<EdgeDto>,
}

impl ItineraryDto {
    pub fn from_itinerary(itinerary: &Itinerary) -> Self {
        Self {
            departs: format_time(itinerary.departure_time()),
            arrives: format_time(itinerary.arrival_time()),
            edges: itinerary.edges().iter().map(EdgeDto::from_edge).collect(),
        }
    }
}

/// Response of `POST /itinerary/alternatives`.
#[derive(Debug, Serialize)]
pub struct AlternativesResponse {
    pub itineraries: Vec<ItineraryDto>,
}

/// Response of `GET /departures`.
#[derive(Debug, Serialize)]
pub struct DeparturesResponse {
    pub departures: Vec<EdgeDto>,
}

const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

fn format_time(time: Timestamp) -> String {
    time.to_datetime().format(TIME_FORMAT).to_string()
}

/// Parse a request timestamp, with or without seconds.
pub fn parse_time(value: &str) -> Result<Timestamp, AppError> {
    NaiveDateTime::parse_from_str(value, TIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M"))
        .map(Timestamp::from_datetime)
        .map_err(|_| AppError::BadRequest {
            message: format!("invalid time: {value}"),
        })
}

/// API-level errors.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    BadRequest { message: String },

    #[error("no itinerary is possible")]
    NotPossible,

    #[error("internal error")]
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::NotPossible => StatusCode::NOT_FOUND,
            AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NodeTime, ProviderId, ProviderKind};
    use chrono::{Duration, NaiveDate};

    #[test]
    fn parse_time_accepts_both_precisions() {
        assert!(parse_time("2024-03-15T09:30").is_ok());
        assert!(parse_time("2024-03-15T09:30:15").is_ok());
        assert!(parse_time("today").is_err());
        assert!(parse_time("2024-03-15 09:30").is_err());
    }

    #[test]
    fn edge_dto_serializes() {
        let day = Timestamp::at_midnight(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        let edge = Edge {
            provider: ProviderId::new("schedule", ProviderKind::Scheduled),
            from: "Alpha".into(),
            to: "Beta".into(),
            depart: day + Duration::hours(9),
            arrive: day + Duration::hours(10),
            instruction: Some("Take Route A.".into()),
            intermediate_stops: vec![NodeTime {
                node: "Mid".into(),
                time: day + Duration::hours(9) + Duration::minutes(30),
            }],
        };
        let json = serde_json::to_value(EdgeDto::from_edge(&edge)).unwrap();
        assert_eq!(json["provider"], "schedule");
        assert_eq!(json["depart"], "2024-03-15T09:00:00");
        assert_eq!(json["intermediate_stops"][0]["node"], "Mid");
    }

    #[test]
    fn plan_request_deserializes() {
        let request: PlanRequest = serde_json::from_str(
            r#"{"origin": "A", "destination": "B", "time": "2024-03-15T09:00", "mode": "arrive"}"#,
        )
        .unwrap();
        assert!(matches!(request.mode, ModeDto::Arrive));
    }

    #[test]
    fn alternatives_request_defaults_max_count() {
        let request: AlternativesRequest = serde_json::from_str(
            r#"{"origin": "A", "destination": "B", "time": "2024-03-15T09:00", "mode": "depart"}"#,
        )
        .unwrap();
        assert_eq!(request.max_count, 3);
    }
}
