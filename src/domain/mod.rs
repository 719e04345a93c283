//! Core domain types and logic.

pub mod error;
pub mod quote;
pub mod earnings;
pub mod universe;
pub mod record_cache;
pub mod retry;
pub mod price_lookup;
pub mod earnings_lookup;
pub mod portfolio;
pub mod strategy;
pub mod simulator;
pub mod runner;
pub mod settings;
pub mod config_validation;
