//! CLI definition and dispatch.

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use log::info;
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::calendar_adapter::CalendarAdapter;
use crate::adapters::csv_adapter::CsvPriceAdapter;
use crate::adapters::file_cache_adapter::FileCacheStore;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::memory_cache_adapter::MemoryCacheStore;
use crate::adapters::universe_file_adapter::load_registry;
use crate::adapters::yahoo_adapter::YahooPriceAdapter;
use crate::domain::config_validation::strategies_from_config;
use crate::domain::earnings_lookup::EarningsLookup;
use crate::domain::error::TraderError;
use crate::domain::price_lookup::PriceLookup;
use crate::domain::runner::{format_outcome, StrategyOutcome, StrategyRunner};
use crate::domain::settings::{CacheBackend, CacheSettings, QuoteSource, Settings};
use crate::domain::simulator::Simulator;
use crate::domain::strategy::StrategyConfig;
use crate::domain::universe::UniverseRegistry;
use crate::ports::cache_port::CacheStore;
use crate::ports::config_port::ConfigPort;
use crate::ports::earnings_port::EarningsProvider;
use crate::ports::price_port::PriceProvider;

#[derive(Parser, Debug)]
#[command(
    name = "earnings-trader",
    about = "Backtest buying earnings-day drops and selling earnings-day pops"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the strategy batch and print each final portfolio value
    #[command(alias = "s")]
    Simulate {
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Only run the strategy with this name
        #[arg(long)]
        strategy: Option<String>,
        /// Simulate up to (not including) this date instead of today
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
    /// List universe tickers reporting earnings on a date
    #[command(alias = "e")]
    Earnings {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long, default_value = "sp500")]
        universe: String,
    },
    /// Show close and same-session change for one ticker on a date
    #[command(alias = "q")]
    Quote {
        ticker: String,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Validate the config and list the strategies it resolves to
    Strategies {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Simulate {
            config,
            strategy,
            as_of,
        } => return run_simulate(config.as_ref(), strategy.as_deref(), as_of),
        Command::Earnings {
            config,
            date,
            universe,
        } => run_earnings(config.as_ref(), date, &universe),
        Command::Quote {
            ticker,
            config,
            date,
        } => run_quote(config.as_ref(), &ticker, date),
        Command::Strategies { config } => run_strategies(config.as_ref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report_error(&e),
    }
}

fn report_error(err: &TraderError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

/// Missing path means no config file: every setting takes its default.
pub fn load_config(path: Option<&PathBuf>) -> Result<FileConfigAdapter, TraderError> {
    match path {
        Some(path) => {
            info!("loading config from {}", path.display());
            FileConfigAdapter::from_file(path)
        }
        None => Ok(FileConfigAdapter::empty()),
    }
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Settings, universes and strategies, all validated before any network work.
pub fn build_strategies(
    config: &dyn ConfigPort,
) -> Result<(Settings, UniverseRegistry, Vec<StrategyConfig>), TraderError> {
    let settings = Settings::from_config(config)?;
    let registry = load_registry(&settings.universes)?;
    let strategies = strategies_from_config(config, &registry)?;
    Ok((settings, registry, strategies))
}

/// Keep only the strategy named `name` (case-insensitive), or all when `None`.
pub fn select_strategies(
    strategies: Vec<StrategyConfig>,
    name: Option<&str>,
) -> Result<Vec<StrategyConfig>, TraderError> {
    let Some(name) = name else {
        return Ok(strategies);
    };
    let selected: Vec<StrategyConfig> = strategies
        .into_iter()
        .filter(|s| s.name.eq_ignore_ascii_case(name.trim()))
        .collect();
    if selected.is_empty() {
        return Err(TraderError::InvalidInput {
            reason: format!("no strategy named '{name}'"),
        });
    }
    Ok(selected)
}

pub fn open_store(settings: &CacheSettings) -> Result<Box<dyn CacheStore>, TraderError> {
    match settings.backend {
        CacheBackend::File => Ok(Box::new(FileCacheStore::new(&settings.dir))),
        CacheBackend::Memory => Ok(Box::new(MemoryCacheStore::new())),
        #[cfg(feature = "sqlite")]
        CacheBackend::Sqlite => {
            use crate::adapters::sqlite_adapter::SqliteCacheStore;
            Ok(Box::new(SqliteCacheStore::from_settings(settings)?))
        }
        #[cfg(not(feature = "sqlite"))]
        CacheBackend::Sqlite => Err(TraderError::config_invalid(
            "cache",
            "backend",
            "sqlite feature is required for the sqlite backend",
        )),
    }
}

pub fn price_provider(settings: &Settings) -> Result<Box<dyn PriceProvider>, TraderError> {
    match settings.quotes.source {
        QuoteSource::Yahoo => Ok(Box::new(YahooPriceAdapter::new(&settings.quotes)?)),
        QuoteSource::Csv => Ok(Box::new(CsvPriceAdapter::new(settings.quotes.csv_dir.clone()))),
    }
}

pub fn earnings_provider(settings: &Settings) -> Result<Box<dyn EarningsProvider>, TraderError> {
    Ok(Box::new(CalendarAdapter::new(&settings.earnings)?))
}

/// Run `strategies` against the given collaborators, printing each result line
/// as soon as its strategy finishes.
pub fn run_simulation_pipeline(
    prices: &dyn PriceProvider,
    earnings: &dyn EarningsProvider,
    store: &dyn CacheStore,
    settings: &Settings,
    strategies: &[StrategyConfig],
    as_of: NaiveDate,
) -> Vec<StrategyOutcome> {
    let price_lookup = PriceLookup::new(prices, store, settings.retry.clone());
    let earnings_lookup =
        EarningsLookup::new(earnings, store, settings.retry.clone(), settings.earnings.window);
    let simulator = Simulator::new(&price_lookup, &earnings_lookup, settings.on_error);
    let runner = StrategyRunner::new(&simulator, as_of);

    println!("simulating strategies:");
    runner.run_all_with(strategies, |outcome| println!("{}", format_outcome(outcome)))
}

/// The first failed strategy's error, if any.
pub fn batch_status(outcomes: &[StrategyOutcome]) -> Result<(), &TraderError> {
    match outcomes.iter().find_map(|o| o.result.as_ref().err()) {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn run_simulate(
    config_path: Option<&PathBuf>,
    strategy_name: Option<&str>,
    as_of: Option<NaiveDate>,
) -> ExitCode {
    let outcomes = match simulate_batch(config_path, strategy_name, as_of) {
        Ok(outcomes) => outcomes,
        Err(e) => return report_error(&e),
    };
    // Result lines are already printed; a failed strategy only sets the exit code.
    match batch_status(&outcomes) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => e.into(),
    }
}

fn simulate_batch(
    config_path: Option<&PathBuf>,
    strategy_name: Option<&str>,
    as_of: Option<NaiveDate>,
) -> Result<Vec<StrategyOutcome>, TraderError> {
    let config = load_config(config_path)?;
    let (settings, _registry, strategies) = build_strategies(&config)?;
    let strategies = select_strategies(strategies, strategy_name)?;
    let as_of = as_of.unwrap_or_else(today);

    let store = open_store(&settings.cache)?;
    let prices = price_provider(&settings)?;
    let earnings = earnings_provider(&settings)?;

    info!(
        "running {} strategies as of {} ({} cache, on_error={})",
        strategies.len(),
        as_of,
        settings.cache.backend,
        settings.on_error
    );
    Ok(run_simulation_pipeline(
        prices.as_ref(),
        earnings.as_ref(),
        store.as_ref(),
        &settings,
        &strategies,
        as_of,
    ))
}

fn run_earnings(
    config_path: Option<&PathBuf>,
    date: Option<NaiveDate>,
    universe_name: &str,
) -> Result<(), TraderError> {
    let config = load_config(config_path)?;
    let settings = Settings::from_config(&config)?;
    let registry = load_registry(&settings.universes)?;
    let universe = registry.get(universe_name)?;
    let date = date.unwrap_or_else(today);

    let store = open_store(&settings.cache)?;
    let provider = earnings_provider(&settings)?;
    let lookup = EarningsLookup::new(
        provider.as_ref(),
        store.as_ref(),
        settings.retry.clone(),
        settings.earnings.window,
    );

    let reporters = lookup.reporters(date, &universe)?;
    println!(
        "{} {} reporters on {} ({}):",
        reporters.len(),
        universe.name(),
        date,
        settings.earnings.window
    );
    for ticker in &reporters {
        println!("{ticker}");
    }
    Ok(())
}

fn run_quote(
    config_path: Option<&PathBuf>,
    ticker: &str,
    date: Option<NaiveDate>,
) -> Result<(), TraderError> {
    let config = load_config(config_path)?;
    let settings = Settings::from_config(&config)?;
    let date = date.unwrap_or_else(today);

    let store = open_store(&settings.cache)?;
    let provider = price_provider(&settings)?;
    let lookup = PriceLookup::new(provider.as_ref(), store.as_ref(), settings.retry.clone());

    let ticker = ticker.trim().to_uppercase();
    match lookup.quote_for_date(&ticker, date)? {
        Some(quote) => println!(
            "{} {}: close {:.4}, change {:+.4}%",
            ticker,
            date,
            quote.close,
            quote.change * 100.0
        ),
        None => println!("{} {}: no data", ticker, date),
    }
    Ok(())
}

fn run_strategies(config_path: Option<&PathBuf>) -> Result<(), TraderError> {
    let config = load_config(config_path)?;
    let (settings, registry, strategies) = build_strategies(&config)?;

    println!(
        "config OK: {} cache, {} quotes, {} earnings window, on_error={}",
        settings.cache.backend,
        settings.quotes.source,
        settings.earnings.window,
        settings.on_error
    );
    println!("universes: {}", registry.names().join(", "));
    for strategy in &strategies {
        println!("{}", describe_strategy(strategy));
    }
    Ok(())
}

pub fn describe_strategy(strategy: &StrategyConfig) -> String {
    format!(
        "{}: {} ({} symbols), threshold {:.2}%, increment {:.2}, start cash {:.2}, {}",
        strategy.name,
        strategy.universe.name(),
        strategy.universe.count(),
        strategy.threshold_pct * 100.0,
        strategy.increment,
        strategy.start_cash,
        strategy.start
    )
}
