//! Ticker universes: the fixed symbol sets a strategy may trade.
//!
//! Universes are loaded once at startup (see `adapters::universe_file_adapter`)
//! and shared read-only between strategies.

use crate::domain::error::TraderError;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Ordered ticker list with constant-time membership checks.
///
/// Source lists may repeat a symbol; order is kept as given and membership
/// is unaffected by repeats.
#[derive(Debug, Clone)]
pub struct Universe {
    name: String,
    symbols: Vec<String>,
    members: HashSet<String>,
}

impl Universe {
    pub fn new(name: &str, symbols: Vec<String>) -> Self {
        let members = symbols.iter().cloned().collect();
        Universe {
            name: name.to_string(),
            symbols,
            members,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn contains(&self, ticker: &str) -> bool {
        self.members.contains(ticker)
    }

    pub fn count(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in code list")]
    EmptyToken,

    #[error("universe {0} has no symbols")]
    Empty(String),
}

/// Parse a comma-separated ticker list. Repeats are kept as listed, the same
/// as in universe files.
pub fn parse_codes(input: &str) -> Result<Vec<String>, UniverseError> {
    input
        .split(',')
        .map(|token| match token.trim() {
            "" => Err(UniverseError::EmptyToken),
            code => Ok(code.to_uppercase()),
        })
        .collect()
}

/// Named universes available to strategy configurations.
#[derive(Debug, Clone, Default)]
pub struct UniverseRegistry {
    universes: HashMap<String, Arc<Universe>>,
}

impl UniverseRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, universe: Universe) -> Result<(), UniverseError> {
        if universe.is_empty() {
            return Err(UniverseError::Empty(universe.name().to_string()));
        }
        self.universes
            .insert(universe.name().to_lowercase(), Arc::new(universe));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Arc<Universe>, TraderError> {
        self.universes
            .get(&name.trim().to_lowercase())
            .cloned()
            .ok_or_else(|| TraderError::UnknownUniverse(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.universes.contains_key(&name.trim().to_lowercase())
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.universes.keys().cloned().collect();
        names.sort();
        names
    }
}
