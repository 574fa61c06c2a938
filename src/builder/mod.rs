//! Progressive construction of an order, one item at a time.
//!
//! Items are ranked by ambiguity. The least ambiguous form a seed framework;
//! the rest are inserted where the insertion scorer clearly prefers them.
//! Whatever cannot be placed confidently is reported with its LOD profile
//! and then forced into a second, complete order.

pub mod placement;

use crate::config::{BuildParams, Config};
use crate::error::{MarkerForgeError, MfResult};
use crate::estimator::{FrameworkBuilder, InsertionScorer, MapEstimator};
use crate::evaluator::{EvalContext, FitnessEvaluator};
use crate::types::{FitnessResult, Item, MappedOrder, Order};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// An item with its ambiguity category; lower categories are more
/// informative and are placed first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedItem {
    pub item: Item,
    pub category: u8,
}

#[derive(Debug, Clone)]
pub struct BuildOutcome {
    /// Seed plus every item that cleared the threshold.
    pub positioned: MappedOrder,
    /// Items that never cleared the threshold, in ranked order.
    pub unpositioned: Vec<Item>,
    /// LOD profile of each unpositioned item against `positioned`.
    pub lod_matrix: Vec<(Item, Vec<f64>)>,
    /// Every item, unpositioned ones forced into their best slot.
    pub forced: MappedOrder,
}

#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub seed_size: usize,
    pub threshold: f64,
    pub touchdown: bool,
    pub tolerance: f64,
    pub final_tolerance: f64,
    pub phase_workers: usize,
    pub seed: Option<u64>,
}

impl BuildOptions {
    pub fn from_params(params: &BuildParams, phase_workers: usize, seed: Option<u64>) -> Self {
        Self {
            seed_size: params.seed_size,
            threshold: params.threshold,
            touchdown: params.touchdown,
            tolerance: params.build_tolerance,
            final_tolerance: params.final_tolerance,
            phase_workers,
            seed,
        }
    }

    fn validate(&self) -> MfResult<()> {
        if self.seed_size < 2 {
            return Err(MarkerForgeError::Config(format!(
                "seed size must be at least 2, got {}",
                self.seed_size
            )));
        }
        if !self.threshold.is_finite() || self.threshold <= 0.0 {
            return Err(MarkerForgeError::Config(format!(
                "threshold must be a positive LOD, got {}",
                self.threshold
            )));
        }
        if self.touchdown && self.touchdown_threshold() <= 0.0 {
            return Err(MarkerForgeError::Config(format!(
                "touchdown threshold {} is not positive",
                self.touchdown_threshold()
            )));
        }
        for (name, tol) in [
            ("build tolerance", self.tolerance),
            ("final tolerance", self.final_tolerance),
        ] {
            if !tol.is_finite() || tol <= 0.0 {
                return Err(MarkerForgeError::Config(format!(
                    "{} must be positive, got {}",
                    name, tol
                )));
            }
        }
        Ok(())
    }

    fn touchdown_threshold(&self) -> f64 {
        self.threshold - 1.0
    }
}

impl TryFrom<&Config> for BuildOptions {
    type Error = MarkerForgeError;

    fn try_from(cfg: &Config) -> MfResult<Self> {
        cfg.validate()?;
        Ok(Self::from_params(&cfg.build, cfg.run.phase_workers, cfg.run.seed))
    }
}

pub struct ProgressiveBuilder {
    estimator: Arc<dyn MapEstimator>,
    framework: Arc<dyn FrameworkBuilder>,
    scorer: Arc<dyn InsertionScorer>,
    options: BuildOptions,
}

impl ProgressiveBuilder {
    pub fn new(
        estimator: Arc<dyn MapEstimator>,
        framework: Arc<dyn FrameworkBuilder>,
        scorer: Arc<dyn InsertionScorer>,
        options: BuildOptions,
    ) -> MfResult<Self> {
        options.validate()?;
        Ok(Self {
            estimator,
            framework,
            scorer,
            options,
        })
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    pub fn build(&self, items: &[RankedItem]) -> MfResult<BuildOutcome> {
        let mut seen = HashSet::with_capacity(items.len());
        for r in items {
            if !seen.insert(r.item) {
                return Err(MarkerForgeError::Config(format!(
                    "Item {} is listed more than once",
                    r.item
                )));
            }
        }
        if items.len() < 2 {
            return Err(MarkerForgeError::Config(format!(
                "ordering needs at least 2 items, got {}",
                items.len()
            )));
        }

        let mut ranked = items.to_vec();
        ranked.sort_by_key(|r| r.category);
        let ranked: Vec<Item> = ranked.into_iter().map(|r| r.item).collect();

        let rough = FitnessEvaluator::new(
            self.estimator.as_ref(),
            self.options.tolerance,
            self.options.phase_workers,
        );
        let refined = FitnessEvaluator::new(
            self.estimator.as_ref(),
            self.options.final_tolerance,
            self.options.phase_workers,
        );

        if ranked.len() <= self.options.seed_size {
            info!(
                "{} items fit in the seed, ordering them directly",
                ranked.len()
            );
            let order = self
                .framework
                .build_framework(&ranked)
                .map_err(MarkerForgeError::SeedEstimation)?;
            let mapped = refined
                .evaluate(&order, EvalContext::Full)
                .map_err(MarkerForgeError::SeedEstimation)?;
            return Ok(BuildOutcome {
                positioned: mapped.clone(),
                unpositioned: Vec::new(),
                lod_matrix: Vec::new(),
                forced: mapped,
            });
        }

        let (seed, rest) = ranked.split_at(self.options.seed_size);
        info!("Seed framework over {} items: {:?}", seed.len(), seed);
        let framework = self
            .framework
            .build_framework(seed)
            .map_err(MarkerForgeError::SeedEstimation)?;
        rough
            .evaluate(&framework, EvalContext::Full)
            .map_err(MarkerForgeError::SeedEstimation)?;

        let mut positioned = framework;
        let mut pending = self.insertion_pass(&mut positioned, rest, self.options.threshold);

        if self.options.touchdown && !pending.is_empty() {
            info!(
                "Touchdown: retrying {} items at LOD {}",
                pending.len(),
                self.options.touchdown_threshold()
            );
            pending =
                self.insertion_pass(&mut positioned, &pending, self.options.touchdown_threshold());
        }

        let lod_matrix: Vec<(Item, Vec<f64>)> = pending
            .iter()
            .map(|&item| (item, self.lod_profile(&positioned, item)))
            .collect();

        let mut rng = match self.options.seed {
            Some(s) => fastrand::Rng::with_seed(s),
            None => fastrand::Rng::new(),
        };
        let mut forced = positioned.clone();
        for (item, _) in placement::by_confidence(&lod_matrix) {
            let lods = self.lod_profile(&forced, item);
            let slot = placement::best_slot(&lods, &mut rng);
            debug!("Forcing item {} into slot {}", item, slot);
            forced = forced.inserted(slot, item)?;
        }

        let positioned = self.remap(&refined, &rough, positioned, "positioned")?;
        let forced = self.remap(&refined, &rough, forced, "forced")?;
        info!(
            "{} items positioned, {} forced",
            positioned.len(),
            pending.len()
        );

        Ok(BuildOutcome {
            positioned,
            unpositioned: pending,
            lod_matrix,
            forced,
        })
    }

    /// Final estimate of a finished order. Falls back to the build tolerance,
    /// then to a dominated result, so a hard-to-map item never discards the
    /// outcome.
    fn remap(
        &self,
        refined: &FitnessEvaluator<'_>,
        rough: &FitnessEvaluator<'_>,
        order: Order,
        label: &str,
    ) -> MfResult<MappedOrder> {
        let first = match refined.evaluate(&order, EvalContext::Full) {
            Ok(mapped) => return Ok(mapped),
            Err(e) => e,
        };
        debug!(
            "Mapping the {} order at tolerance {} failed: {}",
            label,
            refined.tolerance(),
            first
        );
        match rough.evaluate(&order, EvalContext::Full) {
            Ok(mapped) => {
                warn!(
                    "{} order kept at build tolerance {}",
                    label,
                    rough.tolerance()
                );
                Ok(mapped)
            }
            Err(e) => {
                warn!("{} order could not be mapped: {}", label, e);
                let len = order.len();
                MappedOrder::new(order, FitnessResult::dominated(len))
            }
        }
    }

    /// Tries each item in turn and returns those left unplaced.
    fn insertion_pass(&self, order: &mut Order, candidates: &[Item], threshold: f64) -> Vec<Item> {
        let mut left = Vec::new();
        for &item in candidates {
            let lods = match self.scored_slots(order, item) {
                Some(lods) => lods,
                None => {
                    left.push(item);
                    continue;
                }
            };
            match placement::confident_slot(&lods, threshold) {
                Some(slot) => match order.inserted(slot, item) {
                    Ok(next) => {
                        debug!("Item {} placed at {}", item, slot);
                        *order = next;
                    }
                    Err(e) => {
                        warn!("Item {} could not be inserted: {}", item, e);
                        left.push(item);
                    }
                },
                None => {
                    debug!("Item {} is ambiguous at LOD {}", item, threshold);
                    left.push(item);
                }
            }
        }
        left
    }

    /// Normalized LOD profile, or `None` when the scorer failed.
    fn scored_slots(&self, order: &Order, item: Item) -> Option<Vec<f64>> {
        match self
            .scorer
            .score_insertion(order, item, self.options.tolerance)
        {
            Ok(lods) if lods.len() == order.len() + 1 => placement::normalize(&lods),
            Ok(lods) => {
                warn!(
                    "Scorer returned {} slots for item {}, expected {}",
                    lods.len(),
                    item,
                    order.len() + 1
                );
                None
            }
            Err(e) => {
                debug!("Insertion scoring failed for item {}: {}", item, e);
                None
            }
        }
    }

    /// Like [`Self::scored_slots`] but a failure becomes a flat profile.
    fn lod_profile(&self, order: &Order, item: Item) -> Vec<f64> {
        self.scored_slots(order, item)
            .unwrap_or_else(|| vec![0.0; order.len() + 1])
    }
}
