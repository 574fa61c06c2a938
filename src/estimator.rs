//! Contracts of the collaborators the search engine drives but does not
//! implement: the multipoint estimator, the framework heuristic, the
//! per-position insertion scorer and the two-point weight matrix.

use crate::types::{FitnessResult, Item, Order};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EstimationFailure {
    #[error("estimator did not converge after {iterations} iterations")]
    NonConvergence { iterations: usize },

    #[error("numerical failure: {0}")]
    Numerical(String),

    #[error("no two-point estimate for pair ({0}, {1})")]
    MissingPair(Item, Item),
}

pub trait MapEstimator: Send + Sync {
    /// Full multipoint estimation of `order`.
    fn estimate_map(
        &self,
        order: &Order,
        tolerance: f64,
        phase_workers: usize,
    ) -> Result<FitnessResult, EstimationFailure>;

    /// Estimation with the phases of the first `fixed_phases.len() + 1`
    /// items held fixed.
    fn estimate_seeded_map(
        &self,
        order: &Order,
        fixed_phases: &[u8],
        tolerance: f64,
        phase_workers: usize,
    ) -> Result<FitnessResult, EstimationFailure>;
}

pub trait FrameworkBuilder: Send + Sync {
    /// Initial ordering of the seed items.
    fn build_framework(&self, seed: &[Item]) -> Result<Order, EstimationFailure>;
}

pub trait InsertionScorer: Send + Sync {
    /// One LOD score per insertion slot of `partial` (`partial.len() + 1`
    /// values, slot `k` meaning "before position `k`"). 0 marks the best slot.
    fn score_insertion(
        &self,
        partial: &Order,
        item: Item,
        tolerance: f64,
    ) -> Result<Vec<f64>, EstimationFailure>;
}

pub trait TransitionWeights: Send + Sync {
    /// Symmetric pair weight; `weight(a, a)` is 0.
    fn weight(&self, a: Item, b: Item) -> f64;
}
