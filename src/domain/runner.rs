//! Sequential strategy batch: one simulation per strategy, one outcome each.

use chrono::NaiveDate;
use log::{error, info};

use crate::domain::error::TraderError;
use crate::domain::simulator::{SimulationResult, SimulationWindow, Simulator};
use crate::domain::strategy::StrategyConfig;

#[derive(Debug)]
pub struct StrategyOutcome {
    pub name: String,
    pub result: Result<SimulationResult, TraderError>,
}

impl StrategyOutcome {
    pub fn final_value(&self) -> Option<f64> {
        self.result.as_ref().ok().map(|r| r.final_value)
    }
}

/// `<name> --> <value>` on success, `<name> --> error: <reason>` otherwise.
pub fn format_outcome(outcome: &StrategyOutcome) -> String {
    match &outcome.result {
        Ok(result) => format!("{} --> {:.6}", outcome.name, result.final_value),
        Err(e) => format!("{} --> error: {}", outcome.name, e),
    }
}

pub struct StrategyRunner<'a> {
    simulator: &'a Simulator<'a>,
    as_of: NaiveDate,
}

impl<'a> StrategyRunner<'a> {
    /// Every strategy in the batch is simulated up to the same pinned `as_of` date.
    pub fn new(simulator: &'a Simulator<'a>, as_of: NaiveDate) -> Self {
        Self { simulator, as_of }
    }

    pub fn as_of(&self) -> NaiveDate {
        self.as_of
    }

    pub fn run(&self, strategy: &StrategyConfig) -> StrategyOutcome {
        let window = SimulationWindow::for_strategy(strategy, self.as_of);
        let result = self.simulator.simulate(strategy, window);

        match &result {
            Ok(r) => info!(
                "{}: final value {:.2} after {} days, {} trades, {} skipped lookups",
                strategy.name,
                r.final_value,
                r.days_simulated,
                r.portfolio.trades().len(),
                r.skipped.len()
            ),
            Err(e) => error!("{}: simulation failed: {}", strategy.name, e),
        }

        StrategyOutcome {
            name: strategy.name.clone(),
            result,
        }
    }

    pub fn run_all(&self, strategies: &[StrategyConfig]) -> Vec<StrategyOutcome> {
        self.run_all_with(strategies, |_| {})
    }

    /// Like [`run_all`](Self::run_all), handing each outcome to `on_outcome` as
    /// soon as its strategy finishes. A failed strategy does not stop the batch.
    pub fn run_all_with<F>(
        &self,
        strategies: &[StrategyConfig],
        mut on_outcome: F,
    ) -> Vec<StrategyOutcome>
    where
        F: FnMut(&StrategyOutcome),
    {
        strategies
            .iter()
            .map(|strategy| {
                let outcome = self.run(strategy);
                on_outcome(&outcome);
                outcome
            })
            .collect()
    }
}
