pub mod batches;
pub mod sweep;
pub mod window;

use crate::candidates::Strategy;
use crate::config::{Config, Verbosity};
use crate::error::{MarkerForgeError, MfResult};
use crate::estimator::{MapEstimator, TransitionWeights};
use crate::evaluator::{FitnessEvaluator, Objective};
use std::sync::Arc;

pub struct OptimizationOptions {
    pub window_size: usize,
    pub strategy: Strategy,
    pub objective: Objective,
    pub start_position: usize,
    pub tolerance: f64,
    pub workers: usize,
    pub phase_workers: usize,
    pub seed: Option<u64>,
    pub verbosity: Verbosity,
}

impl TryFrom<&Config> for OptimizationOptions {
    type Error = MarkerForgeError;

    fn try_from(cfg: &Config) -> MfResult<Self> {
        cfg.validate()?;
        Ok(Self {
            window_size: cfg.search.window_size,
            strategy: cfg.search.strategy()?,
            objective: cfg.search.objective,
            start_position: cfg.search.start_position,
            tolerance: cfg.search.tolerance,
            workers: cfg.run.workers,
            phase_workers: cfg.run.phase_workers,
            seed: cfg.run.seed,
            verbosity: cfg.verbosity.resolve(),
        })
    }
}

/// Window re-optimization, sweeps and batch mapping over one estimator.
pub struct Optimizer {
    estimator: Arc<dyn MapEstimator>,
    weights: Option<Arc<dyn TransitionWeights>>,
    options: OptimizationOptions,
    pool: rayon::ThreadPool,
}

impl Optimizer {
    pub fn new(
        estimator: Arc<dyn MapEstimator>,
        weights: Option<Arc<dyn TransitionWeights>>,
        options: OptimizationOptions,
    ) -> MfResult<Self> {
        if options.window_size < 2 {
            return Err(MarkerForgeError::Config(format!(
                "window size must be at least 2, got {}",
                options.window_size
            )));
        }
        options.strategy.validate(options.window_size)?;
        if options.objective == Objective::Count && weights.is_none() {
            return Err(MarkerForgeError::Config(
                "the count objective needs a transition weight matrix".to_string(),
            ));
        }
        if options.workers == 0 || options.phase_workers == 0 {
            return Err(MarkerForgeError::Config(
                "worker counts must be at least 1".to_string(),
            ));
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(options.workers)
            .thread_name(|i| format!("markerforge-eval-{}", i))
            .build()
            .map_err(|e| MarkerForgeError::Config(format!("worker pool: {}", e)))?;

        Ok(Self {
            estimator,
            weights,
            options,
            pool,
        })
    }

    pub fn options(&self) -> &OptimizationOptions {
        &self.options
    }

    pub fn evaluator(&self) -> FitnessEvaluator<'_> {
        FitnessEvaluator::new(
            self.estimator.as_ref(),
            self.options.tolerance,
            self.options.phase_workers,
        )
    }

    /// Random source for the window starting at `p`. Seeded runs depend only
    /// on the seed and the window, never on worker scheduling.
    fn window_rng(&self, p: usize) -> fastrand::Rng {
        match self.options.seed {
            Some(s) => fastrand::Rng::with_seed(s.wrapping_add(p as u64)),
            None => fastrand::Rng::new(),
        }
    }
}
