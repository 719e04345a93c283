//! Concrete adapter implementations for ports.

pub mod calendar_adapter;
pub mod csv_adapter;
pub mod file_cache_adapter;
pub mod file_config_adapter;
pub mod http;
pub mod memory_cache_adapter;
#[cfg(feature = "sqlite")]
pub mod sqlite_adapter;
pub mod universe_file_adapter;
pub mod yahoo_adapter;
