//! Earthquake feed aggregation: event model, feed access, statistics,
//! filtered views and the session that ties them together.

pub mod color;
pub mod config;
pub mod data;
pub mod session;
pub mod worker;
