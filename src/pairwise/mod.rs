//! Collaborators backed by a table of two-point estimates.
//!
//! Fitness is the sum of adjacent LOD scores (SALOD), the recombination
//! vector holds the adjacent fractions and phases come straight from the
//! table. This is a stand-in that lets the search run without a multipoint
//! estimator; it makes no attempt at a multipoint likelihood.

pub mod loader;

use crate::estimator::{
    EstimationFailure, FrameworkBuilder, InsertionScorer, MapEstimator, TransitionWeights,
};
use crate::types::{FitnessResult, Item, Order};
use std::collections::HashMap;

/// Fraction assumed for pairs without an estimate when chaining a framework.
const UNLINKED_RF: f64 = 0.5;

#[derive(Debug, Clone)]
pub struct TwoPointTable {
    names: Vec<String>,
    index: HashMap<String, Item>,
    rf: Vec<f64>,
    lod: Vec<f64>,
    phase: Vec<u8>,
}

impl TwoPointTable {
    pub(crate) fn empty(names: Vec<String>) -> Self {
        let n = names.len();
        let index = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i as Item))
            .collect();
        Self {
            names,
            index,
            rf: vec![f64::NAN; n * n],
            lod: vec![f64::NAN; n * n],
            phase: vec![0; n * n],
        }
    }

    /// Stores a symmetric entry. Returns true when it replaced one.
    pub(crate) fn set(&mut self, a: Item, b: Item, rf: f64, lod: f64, phase: u8) -> bool {
        let n = self.names.len();
        let (a, b) = (a as usize, b as usize);
        let replaced = !self.rf[a * n + b].is_nan();
        for idx in [a * n + b, b * n + a] {
            self.rf[idx] = rf;
            self.lod[idx] = lod;
            self.phase[idx] = phase;
        }
        replaced
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn items(&self) -> Vec<Item> {
        (0..self.names.len() as Item).collect()
    }

    pub fn id_of(&self, name: &str) -> Option<Item> {
        self.index.get(name).copied()
    }

    pub fn name_of(&self, item: Item) -> Option<&str> {
        self.names.get(item as usize).map(String::as_str)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn missing_pairs(&self) -> usize {
        let n = self.names.len();
        (0..n)
            .flat_map(|a| (a + 1..n).map(move |b| (a, b)))
            .filter(|&(a, b)| self.rf[a * n + b].is_nan())
            .count()
    }

    fn slot(&self, a: Item, b: Item) -> Option<usize> {
        let n = self.names.len();
        let (a, b) = (a as usize, b as usize);
        if a >= n || b >= n || a == b {
            return None;
        }
        let idx = a * n + b;
        (!self.rf[idx].is_nan()).then_some(idx)
    }

    pub fn rf(&self, a: Item, b: Item) -> Option<f64> {
        self.slot(a, b).map(|i| self.rf[i])
    }

    pub fn lod(&self, a: Item, b: Item) -> Option<f64> {
        self.slot(a, b).map(|i| self.lod[i])
    }

    fn adjacent(&self, items: &[Item]) -> Result<FitnessResult, EstimationFailure> {
        let mut likelihood = 0.0;
        let mut recombination = Vec::with_capacity(items.len().saturating_sub(1));
        let mut phases = Vec::with_capacity(items.len().saturating_sub(1));
        for pair in items.windows(2) {
            let idx = self
                .slot(pair[0], pair[1])
                .ok_or(EstimationFailure::MissingPair(pair[0], pair[1]))?;
            likelihood += self.lod[idx];
            recombination.push(self.rf[idx]);
            phases.push(self.phase[idx]);
        }
        Ok(FitnessResult {
            likelihood,
            recombination,
            phases,
            lods: None,
        })
    }

    fn salod(&self, items: &[Item]) -> f64 {
        items
            .windows(2)
            .map(|pair| self.lod(pair[0], pair[1]).unwrap_or(f64::NEG_INFINITY))
            .sum()
    }
}

impl MapEstimator for TwoPointTable {
    fn estimate_map(
        &self,
        order: &Order,
        _tolerance: f64,
        _phase_workers: usize,
    ) -> Result<FitnessResult, EstimationFailure> {
        self.adjacent(order.items())
    }

    fn estimate_seeded_map(
        &self,
        order: &Order,
        fixed_phases: &[u8],
        _tolerance: f64,
        _phase_workers: usize,
    ) -> Result<FitnessResult, EstimationFailure> {
        let mut result = self.adjacent(order.items())?;
        if fixed_phases.len() > result.phases.len() {
            return Err(EstimationFailure::Numerical(format!(
                "{} fixed phases for {} intervals",
                fixed_phases.len(),
                result.phases.len()
            )));
        }
        result.phases[..fixed_phases.len()].copy_from_slice(fixed_phases);
        Ok(result)
    }
}

impl FrameworkBuilder for TwoPointTable {
    /// Greedy chaining: start from the tightest pair and keep attaching the
    /// closest remaining item to whichever end it is closer to.
    fn build_framework(&self, seed: &[Item]) -> Result<Order, EstimationFailure> {
        let order = |items: Vec<Item>| {
            Order::new(items).map_err(|e| EstimationFailure::Numerical(e.to_string()))
        };
        if seed.len() < 3 {
            return order(seed.to_vec());
        }
        let dist = |a: Item, b: Item| self.rf(a, b).unwrap_or(UNLINKED_RF);

        let mut best = (0, 1, f64::INFINITY);
        for i in 0..seed.len() {
            for j in i + 1..seed.len() {
                let d = dist(seed[i], seed[j]);
                if d < best.2 {
                    best = (i, j, d);
                }
            }
        }

        let mut chain = std::collections::VecDeque::with_capacity(seed.len());
        chain.push_back(seed[best.0]);
        chain.push_back(seed[best.1]);
        let mut left: Vec<Item> = seed
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != best.0 && i != best.1)
            .map(|(_, &item)| item)
            .collect();

        while !left.is_empty() {
            let (head, tail) = match (chain.front(), chain.back()) {
                (Some(&h), Some(&t)) => (h, t),
                _ => break,
            };
            let mut pick = (0, true, f64::INFINITY);
            for (k, &item) in left.iter().enumerate() {
                let (dh, dt) = (dist(item, head), dist(item, tail));
                if dh < pick.2 {
                    pick = (k, true, dh);
                }
                if dt < pick.2 {
                    pick = (k, false, dt);
                }
            }
            let item = left.remove(pick.0);
            if pick.1 {
                chain.push_front(item);
            } else {
                chain.push_back(item);
            }
        }
        order(chain.into_iter().collect())
    }
}

impl InsertionScorer for TwoPointTable {
    fn score_insertion(
        &self,
        partial: &Order,
        item: Item,
        _tolerance: f64,
    ) -> Result<Vec<f64>, EstimationFailure> {
        let items = partial.items();
        let mut buf = Vec::with_capacity(items.len() + 1);
        let scores: Vec<f64> = (0..=items.len())
            .map(|slot| {
                buf.clear();
                buf.extend_from_slice(&items[..slot]);
                buf.push(item);
                buf.extend_from_slice(&items[slot..]);
                self.salod(&buf)
            })
            .collect();

        let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if !max.is_finite() {
            let anchor = items.first().copied().unwrap_or(item);
            return Err(EstimationFailure::MissingPair(item, anchor));
        }
        Ok(scores.into_iter().map(|s| s - max).collect())
    }
}

impl TransitionWeights for TwoPointTable {
    fn weight(&self, a: Item, b: Item) -> f64 {
        self.rf(a, b).unwrap_or(f64::NAN)
    }
}
