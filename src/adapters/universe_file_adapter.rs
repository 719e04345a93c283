//! Universe lists loaded from CSV files or inline ticker lists.
//!
//! A file has a `symbol` header and one ticker per row. Repeated tickers are
//! kept as listed; blank rows are skipped. The default lists are also compiled
//! in and used when their file is not found from the working directory.

use log::debug;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

use crate::domain::error::TraderError;
use crate::domain::universe::{parse_codes, Universe, UniverseRegistry};

#[derive(Debug, Deserialize)]
struct SymbolRow {
    symbol: String,
}

const BUNDLED: [(&str, &str); 2] = [
    ("data/russell2000.csv", include_str!("../../data/russell2000.csv")),
    ("data/sp500.csv", include_str!("../../data/sp500.csv")),
];

/// Compiled-in copy of a default universe file, looked up by its source path.
pub fn bundled_list(source: &str) -> Option<&'static str> {
    let source = source.trim().trim_start_matches("./");
    BUNDLED
        .iter()
        .find(|(path, _)| *path == source)
        .map(|(_, content)| *content)
}

fn read_symbols<R: Read>(
    name: &str,
    origin: &str,
    mut rdr: csv::Reader<R>,
) -> Result<Universe, TraderError> {
    let load_error = |reason: String| TraderError::UniverseLoad {
        name: name.to_string(),
        path: origin.to_string(),
        reason,
    };

    let mut symbols = Vec::new();
    for row in rdr.deserialize::<SymbolRow>() {
        let row = row.map_err(|e| load_error(e.to_string()))?;
        let symbol = row.symbol.trim().to_uppercase();
        if !symbol.is_empty() {
            symbols.push(symbol);
        }
    }

    debug!("loaded universe {} ({} symbols) from {}", name, symbols.len(), origin);
    Ok(Universe::new(name, symbols))
}

pub fn load_universe_file<P: AsRef<Path>>(name: &str, path: P) -> Result<Universe, TraderError> {
    let path = path.as_ref();
    let rdr = csv::Reader::from_path(path).map_err(|e| TraderError::UniverseLoad {
        name: name.to_string(),
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    read_symbols(name, &path.display().to_string(), rdr)
}

/// Universe from CSV text already in memory. `origin` names it in errors.
pub fn load_universe_str(name: &str, origin: &str, content: &str) -> Result<Universe, TraderError> {
    read_symbols(name, origin, csv::Reader::from_reader(content.as_bytes()))
}

/// Resolve one `[universes]` entry: a `.csv` path or a comma-separated list.
///
/// A default list path that does not exist on disk falls back to the compiled-in copy.
pub fn load_universe(name: &str, source: &str) -> Result<Universe, TraderError> {
    if source.to_lowercase().ends_with(".csv") {
        if !Path::new(source).exists() {
            if let Some(content) = bundled_list(source) {
                debug!("{} not found, using bundled copy", source);
                return load_universe_str(name, source, content);
            }
        }
        load_universe_file(name, source)
    } else {
        Ok(Universe::new(name, parse_codes(source)?))
    }
}

pub fn load_registry(sources: &[(String, String)]) -> Result<UniverseRegistry, TraderError> {
    let mut registry = UniverseRegistry::new();
    for (name, source) in sources {
        registry.insert(load_universe(name, source)?)?;
    }
    Ok(registry)
}
