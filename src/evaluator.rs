use crate::estimator::{EstimationFailure, MapEstimator, TransitionWeights};
use crate::types::{MappedOrder, Order};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

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
pub enum Objective {
    /// Multipoint log-likelihood, higher is better.
    Likelihood,
    /// Sum of adjacent two-point weights, lower is better. Used for pruning
    /// only; the winner is always re-scored by likelihood.
    Count,
}

/// Which estimator entry point to call.
#[derive(Debug, Clone, Copy)]
pub enum EvalContext<'a> {
    Full,
    /// The phases of the leading items are already known.
    Seeded { fixed_phases: &'a [u8] },
}

pub type Evaluation = Result<MappedOrder, EstimationFailure>;

/// Ranking value of an evaluation: the likelihood, or `-inf` on failure.
pub fn rank(evaluation: &Evaluation) -> f64 {
    match evaluation {
        Ok(mapped) if !mapped.fitness().is_dominated() => mapped.likelihood(),
        _ => f64::NEG_INFINITY,
    }
}

/// Wraps a [`MapEstimator`] so every call ends in an [`Evaluation`].
pub struct FitnessEvaluator<'a> {
    estimator: &'a dyn MapEstimator,
    tolerance: f64,
    phase_workers: usize,
}

impl<'a> FitnessEvaluator<'a> {
    pub fn new(estimator: &'a dyn MapEstimator, tolerance: f64, phase_workers: usize) -> Self {
        Self {
            estimator,
            tolerance,
            phase_workers,
        }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn evaluate(&self, order: &Order, ctx: EvalContext<'_>) -> Evaluation {
        let fitness = match ctx {
            EvalContext::Full => {
                self.estimator
                    .estimate_map(order, self.tolerance, self.phase_workers)?
            }
            EvalContext::Seeded { fixed_phases } => self.estimator.estimate_seeded_map(
                order,
                fixed_phases,
                self.tolerance,
                self.phase_workers,
            )?,
        };
        if fitness.likelihood.is_nan() {
            return Err(EstimationFailure::Numerical(
                "likelihood is NaN".to_string(),
            ));
        }
        MappedOrder::new(order.clone(), fitness)
            .map_err(|e| EstimationFailure::Numerical(e.to_string()))
    }
}

/// Sum of the transition weights between adjacent items. Self transitions
/// and undefined weights count as zero.
pub fn transition_count(order: &Order, weights: &dyn TransitionWeights) -> f64 {
    order
        .items()
        .windows(2)
        .map(|pair| {
            if pair[0] == pair[1] {
                return 0.0;
            }
            let w = weights.weight(pair[0], pair[1]);
            if w.is_finite() {
                w
            } else {
                0.0
            }
        })
        .sum()
}
