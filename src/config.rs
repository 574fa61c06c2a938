use crate::candidates::{SamplingMode, Strategy, StrategyKind};
use crate::error::{MarkerForgeError, MfResult};
use crate::evaluator::Objective;
use clap::{parser::ValueSource, ArgMatches, Args, ValueEnum};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};
use tracing::warn;

#[derive(Args, Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    #[command(flatten)]
    pub search: SearchParams,
    #[command(flatten)]
    pub build: BuildParams,
    #[command(flatten)]
    pub run: RunParams,
    #[command(flatten)]
    pub verbosity: VerbosityArgs,
}

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    #[arg(long, default_value_t = 4)]
    pub window_size: usize,
    #[arg(long, value_enum, default_value_t = StrategyKind::Exhaustive)]
    pub strategy: StrategyKind,
    /// Pairwise strategy: skip the reversed copy of every swapped window.
    #[arg(long, default_value_t = false)]
    pub no_reverse: bool,
    /// Sampled strategy: rows to draw (defaults to half of ws!).
    #[arg(long)]
    pub samples: Option<usize>,
    #[arg(long, value_enum, default_value_t = SamplingMode::Neutral)]
    pub sampling: SamplingMode,
    #[arg(long, value_enum, default_value_t = Objective::Likelihood)]
    pub objective: Objective,
    #[arg(long, default_value_t = 0)]
    pub start_position: usize,
    #[arg(long, default_value_t = 1e-3)]
    pub tolerance: f64,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            window_size: 4,
            strategy: StrategyKind::Exhaustive,
            no_reverse: false,
            samples: None,
            sampling: SamplingMode::Neutral,
            objective: Objective::Likelihood,
            start_position: 0,
            tolerance: 1e-3,
        }
    }
}

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildParams {
    #[arg(long, default_value_t = 5)]
    pub seed_size: usize,
    /// LOD margin the best insertion slot must clear over every other slot.
    #[arg(long, default_value_t = 3.0)]
    pub threshold: f64,
    #[arg(long, default_value_t = false)]
    pub touchdown: bool,
    #[arg(long, default_value_t = 0.1)]
    pub build_tolerance: f64,
    #[arg(long, default_value_t = 1e-4)]
    pub final_tolerance: f64,
}

impl Default for BuildParams {
    fn default() -> Self {
        Self {
            seed_size: 5,
            threshold: 3.0,
            touchdown: false,
            build_tolerance: 0.1,
            final_tolerance: 1e-4,
        }
    }
}

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunParams {
    /// Concurrent candidate evaluations per window.
    #[arg(long, default_value_t = default_workers())]
    pub workers: usize,
    /// Threads handed to the estimator for phase estimation.
    #[arg(long, default_value_t = 1)]
    pub phase_workers: usize,
    #[arg(short = 'S', long)]
    pub seed: Option<u64>,
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            phase_workers: 1,
            seed: None,
        }
    }
}

pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ValueEnum,
    EnumIter,
    EnumString,
    Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Channel {
    /// Window bounds being tested.
    Order,
    /// Candidate index within the current batch.
    Position,
    /// Predicted finish time.
    Time,
}

#[derive(Args, Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct VerbosityArgs {
    #[arg(long = "verbose", value_enum, value_delimiter = ',')]
    pub channels: Vec<Channel>,
}

impl VerbosityArgs {
    pub fn resolve(&self) -> Verbosity {
        let mut v = Verbosity::default();
        for channel in &self.channels {
            match channel {
                Channel::Order => v.order = true,
                Channel::Position => v.position = true,
                Channel::Time => v.time = true,
            }
        }
        v
    }
}

/// Progress channels. They only gate log output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Verbosity {
    pub order: bool,
    pub position: bool,
    pub time: bool,
}

impl Verbosity {
    pub fn is_on(&self, channel: Channel) -> bool {
        match channel {
            Channel::Order => self.order,
            Channel::Position => self.position,
            Channel::Time => self.time,
        }
    }

    /// Switched-on channels in declaration order.
    pub fn enabled(&self) -> Vec<Channel> {
        Channel::iter().filter(|&c| self.is_on(c)).collect()
    }

    pub fn all() -> Self {
        Self {
            order: true,
            position: true,
            time: true,
        }
    }
}

impl SearchParams {
    pub fn strategy(&self) -> MfResult<Strategy> {
        let strategy = match self.strategy {
            StrategyKind::Exhaustive => Strategy::Exhaustive,
            StrategyKind::Pairwise => Strategy::Pairwise {
                reverse: !self.no_reverse,
            },
            StrategyKind::Sampled => Strategy::Sampled {
                n: self.samples,
                mode: self.sampling,
            },
        };
        strategy.validate(self.window_size)?;
        Ok(strategy)
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> MfResult<Self> {
        let content = fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Checks every value once, before any search starts.
    pub fn validate(&self) -> MfResult<()> {
        let s = &self.search;
        if s.window_size < 2 {
            return Err(MarkerForgeError::Config(format!(
                "window size must be at least 2, got {}",
                s.window_size
            )));
        }
        check_tolerance("tolerance", s.tolerance)?;
        s.strategy()?;

        let b = &self.build;
        if b.seed_size < 2 {
            return Err(MarkerForgeError::Config(format!(
                "seed size must be at least 2, got {}",
                b.seed_size
            )));
        }
        if !b.threshold.is_finite() || b.threshold <= 0.0 {
            return Err(MarkerForgeError::Config(format!(
                "threshold must be a positive LOD, got {}",
                b.threshold
            )));
        }
        if b.touchdown && b.threshold - 1.0 <= 0.0 {
            return Err(MarkerForgeError::Config(format!(
                "touchdown relaxes the threshold to {} which is not positive",
                b.threshold - 1.0
            )));
        }
        check_tolerance("build tolerance", b.build_tolerance)?;
        check_tolerance("final tolerance", b.final_tolerance)?;
        if b.final_tolerance > b.build_tolerance {
            warn!(
                "Final tolerance {} is looser than build tolerance {}",
                b.final_tolerance, b.build_tolerance
            );
        }

        if self.run.workers == 0 || self.run.phase_workers == 0 {
            return Err(MarkerForgeError::Config(
                "worker counts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Overlays the arguments the user typed on top of a file-loaded config.
    pub fn merge_from_cli(&mut self, cli: &Config, matches: &ArgMatches) {
        macro_rules! update_if_present {
            ($section:ident, $field:ident, $arg_name:expr) => {
                if matches.value_source($arg_name) == Some(ValueSource::CommandLine) {
                    self.$section.$field = cli.$section.$field.clone();
                }
            };
        }

        update_if_present!(search, window_size, "window_size");
        update_if_present!(search, strategy, "strategy");
        update_if_present!(search, no_reverse, "no_reverse");
        update_if_present!(search, samples, "samples");
        update_if_present!(search, sampling, "sampling");
        update_if_present!(search, objective, "objective");
        update_if_present!(search, start_position, "start_position");
        update_if_present!(search, tolerance, "tolerance");

        update_if_present!(build, seed_size, "seed_size");
        update_if_present!(build, threshold, "threshold");
        update_if_present!(build, touchdown, "touchdown");
        update_if_present!(build, build_tolerance, "build_tolerance");
        update_if_present!(build, final_tolerance, "final_tolerance");

        update_if_present!(run, workers, "workers");
        update_if_present!(run, phase_workers, "phase_workers");
        update_if_present!(run, seed, "seed");

        update_if_present!(verbosity, channels, "channels");
    }
}

fn check_tolerance(name: &str, value: f64) -> MfResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(MarkerForgeError::Config(format!(
            "{} must be a positive number, got {}",
            name, value
        )));
    }
    Ok(())
}
