use super::Optimizer;
use crate::candidates;
use crate::error::{MarkerForgeError, MfResult};
use crate::evaluator::{rank, transition_count, EvalContext, Evaluation, Objective};
use crate::types::{MappedOrder, Order};
use rayon::prelude::*;
use tracing::{debug, info, warn};

impl Optimizer {
    /// Re-optimizes the window `[p, p + ws)` of `current`.
    ///
    /// Under the likelihood objective the result never scores below
    /// `current`: the best candidate is returned only when it is strictly
    /// better, otherwise `current` comes back unchanged.
    pub fn optimize_window(&self, current: &MappedOrder, p: usize) -> MfResult<MappedOrder> {
        let ws = self.options.window_size;
        if ws < 2 {
            return Err(MarkerForgeError::Config(format!(
                "window size must be at least 2, got {}",
                ws
            )));
        }
        if p + ws > current.len() {
            return Err(MarkerForgeError::Config(format!(
                "window [{}, {}) does not fit a sequence of {} items",
                p,
                p + ws,
                current.len()
            )));
        }

        if self.options.verbosity.order {
            info!(
                "Window [{}, {}) of {}: {:?}",
                p,
                p + ws,
                current.len(),
                current.order().window(p, ws)
            );
        }

        let mut rng = self.window_rng(p);
        let candidates =
            candidates::generate(current.order(), p, ws, &self.options.strategy, &mut rng)?;
        if candidates.is_empty() {
            debug!("No candidates for window at {}, keeping the sequence", p);
            return Ok(current.clone());
        }

        match self.options.objective {
            Objective::Likelihood => Ok(self.select_by_likelihood(current, p, candidates)),
            Objective::Count => self.select_by_count(current, candidates),
        }
    }

    fn select_by_likelihood(
        &self,
        current: &MappedOrder,
        p: usize,
        candidates: Vec<Order>,
    ) -> MappedOrder {
        let ctx = if p >= 2 {
            EvalContext::Seeded {
                fixed_phases: current.prefix_phases(p),
            }
        } else {
            EvalContext::Full
        };

        let evaluations = self.evaluate_all(&candidates, ctx);

        let mut best: Option<(usize, f64)> = None;
        for (idx, evaluation) in evaluations.iter().enumerate() {
            if let Err(e) = evaluation {
                debug!("Candidate {} at window {} dominated: {}", idx, p, e);
            }
            let score = rank(evaluation);
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((idx, score)),
            }
        }

        match best {
            Some((idx, score)) if score > current.likelihood() => {
                debug!(
                    "Window {} improved likelihood {:.4} -> {:.4}",
                    p,
                    current.likelihood(),
                    score
                );
                match evaluations.into_iter().nth(idx) {
                    Some(Ok(mapped)) => mapped,
                    _ => current.clone(),
                }
            }
            _ => current.clone(),
        }
    }

    fn select_by_count(
        &self,
        current: &MappedOrder,
        mut candidates: Vec<Order>,
    ) -> MfResult<MappedOrder> {
        let weights = self.weights.as_deref().ok_or_else(|| {
            MarkerForgeError::Config(
                "the count objective needs a transition weight matrix".to_string(),
            )
        })?;

        candidates.push(current.order().clone());
        let stats: Vec<f64> = self.pool.install(|| {
            candidates
                .par_iter()
                .map(|order| transition_count(order, weights))
                .collect()
        });

        let mut winner = candidates.len() - 1;
        let mut best = f64::INFINITY;
        for (idx, &stat) in stats.iter().enumerate() {
            if stat < best {
                best = stat;
                winner = idx;
            }
        }

        match self.evaluator().evaluate(&candidates[winner], EvalContext::Full) {
            Ok(mapped) => Ok(mapped),
            Err(e) => {
                warn!("Count winner could not be mapped ({}), keeping the sequence", e);
                Ok(current.clone())
            }
        }
    }

    /// Evaluates every candidate on the worker pool; results keep candidate
    /// order and the call returns once all of them are done.
    fn evaluate_all(&self, candidates: &[Order], ctx: EvalContext<'_>) -> Vec<Evaluation> {
        let evaluator = self.evaluator();
        let total = candidates.len();
        let show_position = self.options.verbosity.position;
        self.pool.install(|| {
            candidates
                .par_iter()
                .enumerate()
                .map(|(idx, order)| {
                    if show_position {
                        info!("Candidate {}/{}", idx + 1, total);
                    }
                    evaluator.evaluate(order, ctx)
                })
                .collect()
        })
    }
}
