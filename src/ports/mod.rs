//! Port traits: the seams between the simulation core and its collaborators.

pub mod cache_port;
pub mod config_port;
pub mod earnings_port;
pub mod price_port;
