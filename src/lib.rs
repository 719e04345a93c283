//! earnings-trader: backtests buying earnings-day drops and selling
//! earnings-day pops over a fixed ticker universe.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`], command wiring in [`cli`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;
