//! JSON HTTP surface over the planner.

mod dto;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
