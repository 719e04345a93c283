//! CLI-level tests: config resolution, strategy selection and full offline runs
//! against CSV quotes and a pre-seeded file cache.

mod common;

use approx::assert_relative_eq;
use common::*;
use earnings_trader::adapters::file_cache_adapter::FileCacheStore;
use earnings_trader::adapters::memory_cache_adapter::MemoryCacheStore;
use earnings_trader::cli::{
    batch_status, build_strategies, describe_strategy, load_config, run, run_simulation_pipeline,
    select_strategies, Cli, Command,
};
use earnings_trader::domain::earnings::{EarningsKey, EarningsRecord, Release};
use earnings_trader::domain::error::TraderError;
use earnings_trader::domain::record_cache::RecordCache;
use earnings_trader::domain::runner::StrategyOutcome;
use earnings_trader::domain::settings::{CacheBackend, Settings};
use earnings_trader::domain::simulator::ErrorPolicy;
use earnings_trader::domain::strategy::StartPoint;
use earnings_trader::ports::cache_port::CacheStore;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tempfile::TempDir;

fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn same_code(actual: ExitCode, expected: ExitCode) -> bool {
    format!("{:?}", actual) == format!("{:?}", expected)
}

mod config_resolution {
    use super::*;

    #[test]
    fn strategies_resolve_against_file_universe() {
        let dir = TempDir::new().unwrap();
        let universe = write_file(dir.path(), "tech.csv", "symbol\nabc\nDEF\n\n");
        let config = write_file(
            dir.path(),
            "trader.ini",
            &format!(
                "[universes]\ntech = {}\n\n\
                 [strategy.b]\nname = tech 5%\nuniverse = tech\nthreshold_pct = 0.05\n\
                 increment = 1000\nstart_cash = 5000\nlookback_days = 30\n\n\
                 [strategy.a]\nuniverse = tech\nthreshold_pct = 0.04\nincrement = 500\n\
                 start_cash = 2000\nstart_date = 2024-01-01\n",
                universe.display()
            ),
        );

        let config = load_config(Some(&config)).unwrap();
        let (settings, registry, strategies) = build_strategies(&config).unwrap();

        assert!(registry.contains("tech"));
        assert!(settings.universes.iter().any(|(name, _)| name == "tech"));
        assert_eq!(strategies.len(), 2);
        assert_eq!(strategies[0].name, "a");
        assert_eq!(strategies[0].start, StartPoint::Date(date(2024, 1, 1)));
        assert_eq!(strategies[1].name, "tech 5%");
        assert_eq!(strategies[1].start, StartPoint::DaysBack(30));
        assert_eq!(strategies[1].universe.symbols(), &["ABC", "DEF"]);
    }

    #[test]
    fn no_config_file_gives_default_batch() {
        let config = load_config(None).unwrap();
        let (settings, registry, strategies) = build_strategies(&config).unwrap();

        assert_eq!(settings.cache.backend, CacheBackend::File);
        assert_eq!(settings.on_error, ErrorPolicy::Skip);
        assert!(registry.contains("russell2000"));
        assert!(registry.contains("sp500"));
        assert_eq!(strategies.len(), 5);
        assert!(strategies.iter().all(|s| s.start == StartPoint::YearsBack(5)));
        assert!(strategies.iter().all(|s| s.universe.name() == "russell2000"));
    }

    #[test]
    fn missing_config_file_is_a_parse_error() {
        let err = load_config(Some(&PathBuf::from("/nonexistent/trader.ini"))).unwrap_err();
        assert!(matches!(err, TraderError::ConfigParse { .. }));
    }

    #[test]
    fn unknown_universe_fails_before_any_run() {
        let dir = TempDir::new().unwrap();
        let config = write_file(
            dir.path(),
            "trader.ini",
            "[strategy.x]\nuniverse = nasdaq\nthreshold_pct = 0.05\nincrement = 1000\n\
             start_cash = 5000\nlookback_years = 1\n",
        );
        let config = load_config(Some(&config)).unwrap();
        let err = build_strategies(&config).unwrap_err();
        assert!(matches!(err, TraderError::UnknownUniverse(name) if name == "nasdaq"));
    }

    #[test]
    fn describe_lists_parameters() {
        let line = describe_strategy(&strategy(&["ABC", "DEF"], 0.05, 1000.0, 5000.0));
        assert_eq!(
            line,
            "test strategy: test (2 symbols), threshold 5.00%, increment 1000.00, \
             start cash 5000.00, from 2024-01-01"
        );
    }
}

mod selection {
    use super::*;

    fn batch() -> Vec<earnings_trader::domain::strategy::StrategyConfig> {
        let mut first = strategy(&["ABC"], 0.05, 1000.0, 5000.0);
        first.name = "Quick".to_string();
        let mut second = strategy(&["ABC"], 0.04, 1000.0, 5000.0);
        second.name = "slow".to_string();
        vec![first, second]
    }

    #[test]
    fn no_name_keeps_everything() {
        assert_eq!(select_strategies(batch(), None).unwrap().len(), 2);
    }

    #[test]
    fn name_match_ignores_case() {
        let selected = select_strategies(batch(), Some("quick")).unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].name, "Quick");
    }

    #[test]
    fn unknown_name_is_invalid_input() {
        let err = select_strategies(batch(), Some("medium")).unwrap_err();
        assert!(matches!(err, TraderError::InvalidInput { .. }));
    }
}

mod pipeline {
    use super::*;

    #[test]
    fn failed_strategy_does_not_stop_the_batch() {
        let prices = MockPriceProvider::new().with_quote("ABC", date(2024, 1, 2), 10.0, -0.10);
        let calendar = MockCalendar::new()
            .failing_on(date(2024, 1, 1))
            .with_reporters(date(2024, 1, 2), &["ABC"]);
        let store = MemoryCacheStore::new();
        let mut settings = Settings::default();
        settings.on_error = ErrorPolicy::Abort;
        settings.retry.max_attempts = 1;

        let mut late = strategy(&["ABC"], 0.05, 1000.0, 5000.0);
        late.name = "late".to_string();
        late.start = StartPoint::Date(date(2024, 1, 2));
        let mut early = strategy(&["ABC"], 0.05, 1000.0, 5000.0);
        early.name = "early".to_string();

        let outcomes = run_simulation_pipeline(
            &prices,
            &calendar,
            &store,
            &settings,
            &[early, late],
            date(2024, 1, 3),
        );

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes[0].result.is_err());
        assert_relative_eq!(outcomes[1].final_value().unwrap(), 5000.0, epsilon = 1e-9);
        assert!(matches!(batch_status(&outcomes), Err(TraderError::Upstream { .. })));
    }

    #[test]
    fn all_successful_batch_is_ok() {
        let prices = MockPriceProvider::new();
        let calendar = MockCalendar::new();
        let store = MemoryCacheStore::new();
        let mut batch = strategy(&["ABC"], 0.05, 1000.0, 5000.0);
        batch.start = StartPoint::DaysBack(3);

        let outcomes = run_simulation_pipeline(
            &prices,
            &calendar,
            &store,
            &Settings::default(),
            &[batch],
            date(2024, 1, 10),
        );

        assert!(batch_status(&outcomes).is_ok());
        assert_eq!(outcomes[0].result.as_ref().unwrap().days_simulated, 3);
        assert_eq!(calendar.calls.get(), 3);
    }

    #[test]
    fn empty_batch_status_is_ok() {
        let outcomes: Vec<StrategyOutcome> = Vec::new();
        assert!(batch_status(&outcomes).is_ok());
    }
}

mod offline_run {
    use super::*;

    struct Fixture {
        _dir: TempDir,
        config: PathBuf,
        cache_dir: PathBuf,
    }

    /// CSV quotes for ABC, cached earnings for 2024-03-04 and 2024-03-05 and a
    /// single strategy over those two days.
    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let quotes_dir = dir.path().join("quotes");
        let cache_dir = dir.path().join("cache");
        fs::create_dir_all(&quotes_dir).unwrap();

        write_file(
            &quotes_dir,
            "ABC.csv",
            "date,open,high,low,close,volume\n\
             2024-03-04,12.50,12.60,9.90,10.00,150000\n\
             2024-03-05,10.00,11.20,9.95,11.00,90000\n",
        );

        let store = FileCacheStore::new(&cache_dir);
        let cache: RecordCache<EarningsKey, EarningsRecord> = RecordCache::new(&store);
        for (day, tickers) in [(date(2024, 3, 4), vec!["ABC", "ZZZ"]), (date(2024, 3, 5), vec![])] {
            let record = EarningsRecord {
                date: day,
                session: None,
                releases: tickers.iter().map(|t| Release::new(t, None)).collect(),
            };
            cache.put(&EarningsKey { date: day, session: None }, &record).unwrap();
        }

        let config = write_file(
            dir.path(),
            "trader.ini",
            &format!(
                "[cache]\nbackend = file\ndir = {}\n\n\
                 [quotes]\nsource = csv\ncsv_dir = {}\n\n\
                 [earnings]\nbase_url = http://127.0.0.1:9/earnings\ntimeout_secs = 1\n\n\
                 [retry]\nmax_attempts = 1\n\n\
                 [universes]\noffline = ABC\n\n\
                 [strategy.offline]\nname = offline\nuniverse = offline\n\
                 threshold_pct = 0.05\nincrement = 1000\nstart_cash = 5000\n\
                 start_date = 2024-03-04\n",
                cache_dir.display(),
                quotes_dir.display()
            ),
        );

        Fixture {
            _dir: dir,
            config,
            cache_dir,
        }
    }

    #[test]
    fn simulate_succeeds_from_local_data() {
        let fixture = fixture();
        let code = run(Cli {
            command: Command::Simulate {
                config: Some(fixture.config.clone()),
                strategy: None,
                as_of: Some(date(2024, 3, 6)),
            },
        });
        assert!(same_code(code, ExitCode::SUCCESS));

        // Both trading-day quotes were written through to the file cache.
        let store = FileCacheStore::new(&fixture.cache_dir);
        assert!(store.exists("quotes/ABC/2024-03-04").unwrap());
        assert!(store.exists("quotes/ABC/2024-03-05").unwrap());
    }

    #[test]
    fn pipeline_values_position_at_last_close() {
        let fixture = fixture();
        let config = load_config(Some(&fixture.config)).unwrap();
        let (settings, _registry, strategies) = build_strategies(&config).unwrap();
        let store = earnings_trader::cli::open_store(&settings.cache).unwrap();
        let prices = earnings_trader::cli::price_provider(&settings).unwrap();
        let earnings = earnings_trader::cli::earnings_provider(&settings).unwrap();

        let outcomes = run_simulation_pipeline(
            prices.as_ref(),
            earnings.as_ref(),
            store.as_ref(),
            &settings,
            &strategies,
            date(2024, 3, 6),
        );

        let result = outcomes[0].result.as_ref().unwrap();
        assert_eq!(result.portfolio.holding("ABC"), 100);
        assert_relative_eq!(result.portfolio.cash, 4000.0, epsilon = 1e-9);
        assert_relative_eq!(result.final_value, 4000.0 + 100.0 * 11.0, epsilon = 1e-9);
        assert!(result.skipped.is_empty());
    }

    #[test]
    fn unknown_strategy_name_exits_with_config_code() {
        let fixture = fixture();
        let code = run(Cli {
            command: Command::Simulate {
                config: Some(fixture.config.clone()),
                strategy: Some("nope".to_string()),
                as_of: Some(date(2024, 3, 6)),
            },
        });
        assert!(same_code(code, ExitCode::from(2)));
    }

    #[test]
    fn strategies_command_validates_config() {
        let fixture = fixture();
        let code = run(Cli {
            command: Command::Strategies {
                config: Some(fixture.config.clone()),
            },
        });
        assert!(same_code(code, ExitCode::SUCCESS));
    }

    #[test]
    fn quote_command_reads_csv_source() {
        let fixture = fixture();
        let code = run(Cli {
            command: Command::Quote {
                ticker: "abc".to_string(),
                config: Some(fixture.config.clone()),
                date: Some(date(2024, 3, 5)),
            },
        });
        assert!(same_code(code, ExitCode::SUCCESS));
    }

    #[test]
    fn missing_config_file_fails() {
        let code = run(Cli {
            command: Command::Simulate {
                config: Some(PathBuf::from("/nonexistent/trader.ini")),
                strategy: None,
                as_of: Some(date(2024, 3, 6)),
            },
        });
        assert!(!same_code(code, ExitCode::SUCCESS));
    }
}
