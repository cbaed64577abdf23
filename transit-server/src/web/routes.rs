//! HTTP route handlers.
//!
//! The planner is synchronous by design, so handlers run searches on the
//! blocking thread pool; provider `prepare` hooks may perform network I/O.

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::planner::{find_itineraries, find_itinerary, list_departures, SearchError};

use super::dto::{
    parse_time, AlternativesRequest, AlternativesResponse, AppError, DeparturesQuery,
    DeparturesResponse, EdgeDto, ItineraryDto, PlanRequest,
};
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/itinerary/plan", post(plan_itinerary))
        .route("/itinerary/alternatives", post(plan_alternatives))
        .route("/departures", get(departures))
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Plan the single best itinerary.
async fn plan_itinerary(
    State(state): State<AppState>,
    Json(request): Json<PlanRequest>,
) -> Result<Json<ItineraryDto>, AppError> {
    let when = parse_time(&request.time)?;
    let providers = state.providers.clone();
    let mode = request.mode.into();

    let result = tokio::task::spawn_blocking(move || {
        find_itinerary(
            &providers,
            &request.origin,
            &request.destination,
            when,
            mode,
        )
    })
    .await
    .map_err(|_| AppError::Internal)?;

    match result {
        Ok(itinerary) => Ok(Json(ItineraryDto::from_itinerary(&itinerary))),
        Err(SearchError::ItineraryNotPossible) => Err(AppError::NotPossible),
    }
}

/// Enumerate distinct alternative itineraries.
async fn plan_alternatives(
    State(state): State<AppState>,
    Json(request): Json<AlternativesRequest>,
) -> Result<Json<AlternativesResponse>, AppError> {
    let when = parse_time(&request.plan.time)?;
    let providers = state.providers.clone();
    let variable = state.variable.clone();
    let mode = request.plan.mode.into();
    let max_count = request.max_count;

    let itineraries = tokio::task::spawn_blocking(move || {
        find_itineraries(
            &variable,
            &providers,
            &request.plan.origin,
            &request.plan.destination,
            when,
            mode,
            Some(max_count),
        )
        .map(|itinerary| ItineraryDto::from_itinerary(&itinerary))
        .collect::<Vec<_>>()
    })
    .await
    .map_err(|_| AppError::Internal)?;

    Ok(Json(AlternativesResponse { itineraries }))
}

/// Default cap on departure listings; the underlying stream is unbounded.
const DEFAULT_DEPARTURE_LIMIT: usize = 10;

/// List upcoming departures from a stop, merged across providers.
async fn departures(
    State(state): State<AppState>,
    Query(query): Query<DeparturesQuery>,
) -> Result<Json<DeparturesResponse>, AppError> {
    let after = parse_time(&query.after)?;
    let providers = state.providers.clone();
    let limit = query.limit.unwrap_or(DEFAULT_DEPARTURE_LIMIT);

    let departures = tokio::task::spawn_blocking(move || {
        list_departures(&providers, &query.from, after, Some(limit))
            .map(|edge| EdgeDto::from_edge(&edge))
            .collect::<Vec<_>>()
    })
    .await
    .map_err(|_| AppError::Internal)?;

    Ok(Json(DeparturesResponse { departures }))
}
