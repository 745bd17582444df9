//! Backtest configuration files.
//!
//! ```toml
//! data_dir = "market_data"
//! cash_drag_floor = 0.0005
//! start = "2019-01-02"
//! frequency = "monthly"
//!
//! [benchmark]
//! "TD CN" = 0.5
//! "RY CN" = 0.5
//!
//! [strategy]
//! kind = "reoptimize"
//! lookback = 252
//!
//! [optimizer]
//! bound = 0.03
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tilt_core::types::{Date, DateRange, SecurityId, WeightVector};
use tilt_ext_file::{CsvMarketData, DEFAULT_DIVIDENDS_FILE};
use tilt_portfolio::{
    boundary_dates, BoundaryFrequency, OptimizerConfig, ReturnsConfig, ReturnsMatrix,
    ReturnsMatrixAssembler, SimulationConfig, Strategy, TrackingErrorOptimizer,
};

use crate::commands::parse_date;
use crate::error::{CliError, CliResult};

/// How the backtest sets weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Hold the starting weights and let them drift.
    #[default]
    BuyAndHold,
    /// Reset to the starting weights at every boundary.
    Rebalance,
    /// Re-solve for minimum tracking error at every boundary.
    Reoptimize,
}

/// Strategy section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Strategy kind
    #[serde(default)]
    pub kind: StrategyKind,

    /// Rows of history the optimizer sees; all history if absent
    pub lookback: Option<usize>,

    /// Starting weights for buy-and-hold or rebalance; the naive cash-drag
    /// tilt of the benchmark if absent
    pub weights: Option<WeightVector>,
}

/// Backtest configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestConfig {
    /// Directory with one price CSV per security and the dividends file
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Dividends file name inside `data_dir`
    #[serde(default = "default_dividends_file")]
    pub dividends_file: String,

    /// First date of data to load (YYYY-MM-DD)
    pub start: Option<String>,

    /// Last date of data to load (YYYY-MM-DD)
    pub end: Option<String>,

    /// Benchmark weights; must sum to one
    pub benchmark: WeightVector,

    /// Minimum portfolio cash weight
    #[serde(default = "default_cash_drag_floor")]
    pub cash_drag_floor: f64,

    /// Boundary frequency when no explicit list is given
    #[serde(default)]
    pub frequency: BoundaryFrequency,

    /// Explicit rebalance boundaries (YYYY-MM-DD)
    #[serde(default)]
    pub boundaries: Vec<String>,

    /// Drop generated boundaries before this date
    pub first_boundary: Option<String>,

    /// Strategy section
    #[serde(default)]
    pub strategy: StrategyConfig,

    /// Return building section
    #[serde(default)]
    pub returns: ReturnsConfig,

    /// Optimizer section
    #[serde(default)]
    pub optimizer: OptimizerConfig,

    /// Simulation section
    #[serde(default)]
    pub simulation: SimulationConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("market_data")
}

fn default_dividends_file() -> String {
    DEFAULT_DIVIDENDS_FILE.to_string()
}

fn default_cash_drag_floor() -> f64 {
    0.0005
}

impl BacktestConfig {
    /// Loads configuration from a TOML file.
    ///
    /// A relative `data_dir` is resolved against the file's directory.
    pub fn from_file(path: &Path) -> CliResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)
            .map_err(|e| CliError::Config(format!("{}: {}", path.display(), e)))?;

        if config.data_dir.is_relative() {
            if let Some(parent) = path.parent() {
                config.data_dir = parent.join(&config.data_dir);
            }
        }
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.benchmark.is_empty() {
            return Err(CliError::Config("benchmark has no securities".to_string()));
        }
        if !(0.0..=1.0).contains(&self.cash_drag_floor) {
            return Err(CliError::InvalidFraction {
                name: "cash_drag_floor",
                value: self.cash_drag_floor,
            });
        }
        Ok(())
    }

    /// Date range of data to load.
    pub fn date_range(&self) -> CliResult<DateRange> {
        let mut range = DateRange::unbounded();
        if let Some(start) = &self.start {
            range = range.with_start(parse_date(start)?);
        }
        if let Some(end) = &self.end {
            range = range.with_end(parse_date(end)?);
        }
        Ok(range)
    }

    /// Securities to load: benchmark names, then any extra strategy names.
    pub fn securities(&self) -> Vec<SecurityId> {
        let mut ids: Vec<SecurityId> = self.benchmark.ids().cloned().collect();
        if let Some(weights) = &self.strategy.weights {
            for id in weights.ids() {
                if !ids.contains(id) {
                    ids.push(id.clone());
                }
            }
        }
        ids
    }

    /// Opens the market-data directory.
    pub fn market_data(&self) -> anyhow::Result<CsvMarketData> {
        Ok(CsvMarketData::with_dividends_file(
            &self.data_dir,
            &self.dividends_file,
        )?)
    }

    /// Loads and aligns the returns matrix for all configured securities.
    pub fn load_returns(&self) -> anyhow::Result<ReturnsMatrix> {
        let assembler =
            ReturnsMatrixAssembler::new(self.market_data()?).with_config(self.returns.clone());
        Ok(assembler.assemble(&self.securities(), &self.date_range()?)?)
    }

    /// Optimizer built from the `[optimizer]` section.
    pub fn optimizer(&self) -> TrackingErrorOptimizer {
        TrackingErrorOptimizer::new(self.optimizer.clone())
    }

    /// The strategy to run.
    pub fn strategy(&self) -> anyhow::Result<Strategy> {
        let starting = || -> anyhow::Result<WeightVector> {
            match &self.strategy.weights {
                Some(w) => Ok(w.clone()),
                None => Ok(tilt_portfolio::naive_cash_drag_tilt(
                    &self.benchmark,
                    self.cash_drag_floor,
                )?),
            }
        };

        Ok(match self.strategy.kind {
            StrategyKind::BuyAndHold => Strategy::BuyAndHold {
                weights: starting()?,
            },
            StrategyKind::Rebalance => Strategy::Rebalance {
                target: starting()?,
            },
            StrategyKind::Reoptimize => Strategy::Reoptimize {
                benchmark: self.benchmark.clone(),
                cash_drag_floor: self.cash_drag_floor,
                lookback: self.strategy.lookback,
            },
        })
    }

    /// Rebalance boundaries for `returns`.
    ///
    /// An explicit list wins over the frequency. Generated boundaries start
    /// at `first_boundary` when given; otherwise a reoptimizing run skips the
    /// first axis date so the first solve has history to work with.
    pub fn boundaries(&self, returns: &ReturnsMatrix) -> CliResult<Vec<Date>> {
        if !self.boundaries.is_empty() {
            return self.boundaries.iter().map(|s| parse_date(s)).collect();
        }

        let generated = boundary_dates(returns.dates(), self.frequency);
        let skip_until = match &self.first_boundary {
            Some(first) => Some(parse_date(first)?),
            None if self.strategy.kind == StrategyKind::Reoptimize => {
                generated.get(1).copied()
            }
            None => None,
        };

        Ok(match skip_until {
            Some(first) => generated.into_iter().filter(|d| *d >= first).collect(),
            None => generated,
        })
    }
}
