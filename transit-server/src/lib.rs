//! Multimodal transit itinerary planner.
//!
//! Finds optimal point-to-point trips through a network of scheduled
//! services and walking connections, given either an earliest-departure or
//! latest-arrival constraint, and can enumerate ranked alternatives.

pub mod distance;
pub mod domain;
pub mod merge;
pub mod planner;
pub mod provider;
pub mod timetable;
pub mod web;
