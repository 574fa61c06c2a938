#![allow(dead_code)]

use markerforge::estimator::{
    EstimationFailure, FrameworkBuilder, InsertionScorer, MapEstimator, TransitionWeights,
};
use markerforge::optimizer::{OptimizationOptions, Optimizer};
use markerforge::candidates::Strategy;
use markerforge::config::Verbosity;
use markerforge::evaluator::Objective;
use markerforge::types::{FitnessResult, Item, MappedOrder, Order};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Likelihood `-Σ|a - b|` over adjacent items: sorted orders score best.
/// Orders accepted by `fail_if` come back as numerical failures.
pub struct DistanceEstimator {
    pub full_calls: AtomicUsize,
    pub seeded_calls: AtomicUsize,
    fail_if: Box<dyn Fn(&[Item]) -> bool + Send + Sync>,
}

impl DistanceEstimator {
    pub fn new() -> Self {
        Self::failing_when(|_| false)
    }

    pub fn failing_when<F>(fail_if: F) -> Self
    where
        F: Fn(&[Item]) -> bool + Send + Sync + 'static,
    {
        Self {
            full_calls: AtomicUsize::new(0),
            seeded_calls: AtomicUsize::new(0),
            fail_if: Box::new(fail_if),
        }
    }

    pub fn likelihood_of(items: &[Item]) -> f64 {
        -items
            .windows(2)
            .map(|p| (p[0] as f64 - p[1] as f64).abs())
            .sum::<f64>()
    }

    fn fit(&self, items: &[Item]) -> Result<FitnessResult, EstimationFailure> {
        if (self.fail_if)(items) {
            return Err(EstimationFailure::NonConvergence { iterations: 100 });
        }
        Ok(FitnessResult {
            likelihood: Self::likelihood_of(items),
            recombination: items
                .windows(2)
                .map(|p| ((p[0] as f64 - p[1] as f64).abs() / 100.0).min(0.5))
                .collect(),
            phases: vec![1; items.len().saturating_sub(1)],
            lods: None,
        })
    }
}

impl MapEstimator for DistanceEstimator {
    fn estimate_map(
        &self,
        order: &Order,
        _tolerance: f64,
        _phase_workers: usize,
    ) -> Result<FitnessResult, EstimationFailure> {
        self.full_calls.fetch_add(1, Ordering::SeqCst);
        self.fit(order.items())
    }

    fn estimate_seeded_map(
        &self,
        order: &Order,
        fixed_phases: &[u8],
        _tolerance: f64,
        _phase_workers: usize,
    ) -> Result<FitnessResult, EstimationFailure> {
        self.seeded_calls.fetch_add(1, Ordering::SeqCst);
        let mut fit = self.fit(order.items())?;
        fit.phases[..fixed_phases.len()].copy_from_slice(fixed_phases);
        Ok(fit)
    }
}

/// `|a - b|` as transition weight.
pub struct DistanceWeights;

impl TransitionWeights for DistanceWeights {
    fn weight(&self, a: Item, b: Item) -> f64 {
        (a as f64 - b as f64).abs()
    }
}

/// Frameworks are the seed sorted ascending.
pub struct SortedFramework;

impl FrameworkBuilder for SortedFramework {
    fn build_framework(&self, seed: &[Item]) -> Result<Order, EstimationFailure> {
        let mut items = seed.to_vec();
        items.sort_unstable();
        Order::new(items).map_err(|e| EstimationFailure::Numerical(e.to_string()))
    }
}

/// Scores slot 0 for the position that keeps the order sorted and
/// `-margin` everywhere else. Items in `ambiguous` tie at slot 0 and at the
/// last slot.
pub struct SortedInsertion {
    pub margin: f64,
    pub margins: Vec<(Item, f64)>,
    pub ambiguous: HashSet<Item>,
    pub failing: HashSet<Item>,
}

impl SortedInsertion {
    pub fn new(margin: f64) -> Self {
        Self {
            margin,
            margins: Vec::new(),
            ambiguous: HashSet::new(),
            failing: HashSet::new(),
        }
    }

    pub fn with_ambiguous(mut self, item: Item) -> Self {
        self.ambiguous.insert(item);
        self
    }

    pub fn with_margin(mut self, item: Item, margin: f64) -> Self {
        self.margins.push((item, margin));
        self
    }

    pub fn with_failing(mut self, item: Item) -> Self {
        self.failing.insert(item);
        self
    }
}

impl InsertionScorer for SortedInsertion {
    fn score_insertion(
        &self,
        partial: &Order,
        item: Item,
        _tolerance: f64,
    ) -> Result<Vec<f64>, EstimationFailure> {
        if self.failing.contains(&item) {
            return Err(EstimationFailure::Numerical("singular matrix".to_string()));
        }
        let slots = partial.len() + 1;
        let margin = self
            .margins
            .iter()
            .find(|(i, _)| *i == item)
            .map(|(_, m)| *m)
            .unwrap_or(self.margin);
        let mut lods = vec![-margin; slots];
        if self.ambiguous.contains(&item) {
            lods[0] = 0.0;
            lods[slots - 1] = 0.0;
        } else {
            let target = partial.items().iter().filter(|&&x| x < item).count();
            lods[target] = 0.0;
        }
        Ok(lods)
    }
}

pub fn options(ws: usize, strategy: Strategy, objective: Objective) -> OptimizationOptions {
    OptimizationOptions {
        window_size: ws,
        strategy,
        objective,
        start_position: 0,
        tolerance: 1e-3,
        workers: 2,
        phase_workers: 1,
        seed: Some(42),
        verbosity: Verbosity::default(),
    }
}

pub fn optimizer(
    estimator: Arc<DistanceEstimator>,
    ws: usize,
    strategy: Strategy,
    objective: Objective,
) -> Optimizer {
    Optimizer::new(
        estimator,
        Some(Arc::new(DistanceWeights)),
        options(ws, strategy, objective),
    )
    .expect("valid optimizer")
}

pub fn mapped(items: &[Item]) -> MappedOrder {
    let order = Order::new(items.to_vec()).unwrap();
    let fit = DistanceEstimator::new()
        .estimate_map(&order, 1e-3, 1)
        .unwrap();
    MappedOrder::new(order, fit).unwrap()
}

pub fn is_permutation_of(a: &[Item], b: &[Item]) -> bool {
    let mut x = a.to_vec();
    let mut y = b.to_vec();
    x.sort_unstable();
    y.sort_unstable();
    x == y
}
