use crate::error::{MarkerForgeError, MfResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

/// Opaque marker identifier.
pub type Item = u32;

/// A permutation of unique items.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Order {
    items: Vec<Item>,
}

impl Order {
    /// Builds an order, rejecting repeated identifiers.
    pub fn new(items: Vec<Item>) -> MfResult<Self> {
        let mut seen = HashSet::with_capacity(items.len());
        for &item in &items {
            if !seen.insert(item) {
                return Err(MarkerForgeError::Config(format!(
                    "Item {} appears more than once in the order",
                    item
                )));
            }
        }
        Ok(Self { items })
    }

    /// Callers guarantee uniqueness (rows derived from an already valid order).
    pub(crate) fn from_trusted(items: Vec<Item>) -> Self {
        debug_assert!({
            let set: HashSet<_> = items.iter().collect();
            set.len() == items.len()
        });
        Self { items }
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn into_items(self) -> Vec<Item> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, item: Item) -> bool {
        self.items.contains(&item)
    }

    pub fn position_of(&self, item: Item) -> Option<usize> {
        self.items.iter().position(|&i| i == item)
    }

    /// The items in `[p, p + ws)`. Panics if the range is out of bounds.
    pub fn window(&self, p: usize, ws: usize) -> &[Item] {
        &self.items[p..p + ws]
    }

    /// Copy of this order with positions `[p, p + window.len())` replaced.
    /// Prefix and suffix are copied verbatim.
    pub fn with_window(&self, p: usize, window: &[Item]) -> Order {
        let mut items = self.items.clone();
        items[p..p + window.len()].copy_from_slice(window);
        Order::from_trusted(items)
    }

    /// Copy of this order with `item` inserted before position `pos`
    /// (`pos == len` appends).
    pub fn inserted(&self, pos: usize, item: Item) -> MfResult<Order> {
        if pos > self.items.len() {
            return Err(MarkerForgeError::Validation(format!(
                "Insertion position {} is past the end of an order of {} items",
                pos,
                self.items.len()
            )));
        }
        if self.contains(item) {
            return Err(MarkerForgeError::Validation(format!(
                "Item {} is already placed",
                item
            )));
        }
        let mut items = Vec::with_capacity(self.items.len() + 1);
        items.extend_from_slice(&self.items[..pos]);
        items.push(item);
        items.extend_from_slice(&self.items[pos..]);
        Ok(Order::from_trusted(items))
    }
}

/// Output of one estimator call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitnessResult {
    /// Multipoint log-likelihood. `-inf` marks a failed evaluation.
    pub likelihood: f64,
    /// One recombination fraction per adjacent pair.
    pub recombination: Vec<f64>,
    /// One linkage phase code per adjacent pair.
    pub phases: Vec<u8>,
    /// LOD scores against a reference order, when the estimator reports them.
    pub lods: Option<Vec<f64>>,
}

impl FitnessResult {
    /// Placeholder for an order no estimate could be obtained for.
    pub fn dominated(len: usize) -> Self {
        let intervals = len.saturating_sub(1);
        Self {
            likelihood: f64::NEG_INFINITY,
            recombination: vec![f64::NAN; intervals],
            phases: vec![0; intervals],
            lods: None,
        }
    }

    pub fn is_dominated(&self) -> bool {
        self.likelihood == f64::NEG_INFINITY
    }
}

/// An order together with its estimated fitness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappedOrder {
    order: Order,
    fitness: FitnessResult,
}

impl MappedOrder {
    pub fn new(order: Order, fitness: FitnessResult) -> MfResult<Self> {
        let intervals = order.len().saturating_sub(1);
        if fitness.recombination.len() != intervals || fitness.phases.len() != intervals {
            return Err(MarkerForgeError::Validation(format!(
                "Fitness shape mismatch: {} items need {} intervals, got {} fractions and {} phases",
                order.len(),
                intervals,
                fitness.recombination.len(),
                fitness.phases.len()
            )));
        }
        Ok(Self { order, fitness })
    }

    pub fn order(&self) -> &Order {
        &self.order
    }

    pub fn fitness(&self) -> &FitnessResult {
        &self.fitness
    }

    pub fn likelihood(&self) -> f64 {
        self.fitness.likelihood
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Phases of the intervals between the first `p` items.
    pub fn prefix_phases(&self, p: usize) -> &[u8] {
        let n = p.saturating_sub(1).min(self.fitness.phases.len());
        &self.fitness.phases[..n]
    }

    pub fn into_parts(self) -> (Order, FitnessResult) {
        (self.order, self.fitness)
    }
}

/// Append-only record of window step durations, in seconds.
#[derive(Debug, Clone, Default)]
pub struct TimingSamples {
    samples: Vec<f64>,
}

impl TimingSamples {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, elapsed: Duration) {
        self.samples.push(elapsed.as_secs_f64());
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl From<Vec<f64>> for TimingSamples {
    fn from(samples: Vec<f64>) -> Self {
        Self { samples }
    }
}
