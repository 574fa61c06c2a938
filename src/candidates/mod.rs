//! Candidate orders for one window.
//!
//! Every generator returns full orders: the window positions are rearranged
//! and the prefix and suffix of the current order are copied verbatim.

pub mod sampling;

use crate::error::{MarkerForgeError, MfResult};
use crate::types::{Item, Order};
use clap::ValueEnum;
use fastrand::Rng;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use strum_macros::{Display, EnumIter, EnumString};
use tracing::warn;

/// Windows past this size make exhaustive enumeration impractically slow.
pub const PRACTICAL_EXHAUSTIVE_WINDOW: usize = 7;

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
pub enum StrategyKind {
    Exhaustive,
    Pairwise,
    Sampled,
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
pub enum SamplingMode {
    /// Every permutation equally likely.
    Neutral,
    /// Favour permutations close to the current window.
    Similar,
    /// Favour permutations far from the current window.
    Dissimilar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// All `ws!` permutations of the window.
    Exhaustive,
    /// Every single swap of two window positions, optionally with each
    /// swapped window reversed.
    Pairwise { reverse: bool },
    /// `n` permutations drawn without replacement from the exhaustive set.
    Sampled { n: Option<usize>, mode: SamplingMode },
}

impl Strategy {
    pub fn kind(&self) -> StrategyKind {
        match self {
            Strategy::Exhaustive => StrategyKind::Exhaustive,
            Strategy::Pairwise { .. } => StrategyKind::Pairwise,
            Strategy::Sampled { .. } => StrategyKind::Sampled,
        }
    }

    pub fn validate(&self, ws: usize) -> MfResult<()> {
        if let Strategy::Sampled { n: Some(n), .. } = *self {
            let total = factorial(ws);
            if n == 0 || n > total {
                return Err(MarkerForgeError::Config(format!(
                    "cannot sample {} of the {} permutations of a window of {}",
                    n, total, ws
                )));
            }
        }
        Ok(())
    }
}

pub fn factorial(n: usize) -> usize {
    (1..=n).product()
}

/// Candidate set for the window `[p, p + ws)` of `current`.
pub fn generate(
    current: &Order,
    p: usize,
    ws: usize,
    strategy: &Strategy,
    rng: &mut Rng,
) -> MfResult<Vec<Order>> {
    if ws < 2 {
        return Err(MarkerForgeError::Config(format!(
            "window size must be at least 2, got {}",
            ws
        )));
    }
    if p + ws > current.len() {
        return Err(MarkerForgeError::Config(format!(
            "window [{}, {}) does not fit an order of {} items",
            p,
            p + ws,
            current.len()
        )));
    }
    strategy.validate(ws)?;

    let window = current.window(p, ws);
    let rows = match *strategy {
        Strategy::Exhaustive => {
            if ws > PRACTICAL_EXHAUSTIVE_WINDOW {
                warn!("Enumerating {}! permutations for one window", ws);
            }
            permutations(window)
        }
        Strategy::Pairwise { reverse } => pairwise(window, reverse),
        Strategy::Sampled { n, mode } => {
            if ws > PRACTICAL_EXHAUSTIVE_WINDOW {
                warn!("Sampling from {}! permutations for one window", ws);
            }
            let all = permutations(window);
            let n = n.unwrap_or(all.len() / 2).max(1);
            sampling::draw(window, all, n, mode, rng)
        }
    };

    Ok(rows
        .into_iter()
        .map(|row| current.with_window(p, &row))
        .collect())
}

/// All permutations in lexicographic order of window positions, the identity
/// first.
pub fn permutations(window: &[Item]) -> Vec<Vec<Item>> {
    window
        .iter()
        .copied()
        .permutations(window.len())
        .collect()
}

fn pairwise(window: &[Item], reverse: bool) -> Vec<Vec<Item>> {
    let ws = window.len();
    let mut swapped = Vec::with_capacity(ws * (ws - 1) / 2);
    for i in 0..ws - 1 {
        for j in i + 1..ws {
            let mut row = window.to_vec();
            row.swap(i, j);
            swapped.push(row);
        }
    }

    let mut rows = swapped.clone();
    if reverse {
        rows.extend(swapped.into_iter().map(|mut row| {
            row.reverse();
            row
        }));
    }

    let mut seen: HashSet<Vec<Item>> = HashSet::with_capacity(rows.len() + 1);
    seen.insert(window.to_vec());
    rows.retain(|row| seen.insert(row.clone()));
    rows
}
