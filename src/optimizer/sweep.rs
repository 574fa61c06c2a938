use super::Optimizer;
use crate::error::MfResult;
use crate::predictor::{self, BatchContext};
use crate::types::{MappedOrder, TimingSamples};
use std::time::Instant;
use tracing::{debug, info};

impl Optimizer {
    /// One left-to-right pass from the configured start position.
    pub fn sweep(
        &self,
        sequence: MappedOrder,
        timings: &mut TimingSamples,
    ) -> MfResult<MappedOrder> {
        self.sweep_from(sequence, self.options.start_position, timings)
    }

    /// Applies the window optimizer at every start `start ..= len - ws`,
    /// each step working on the previous step's result. A single pass: the
    /// caller repeats it when convergence is wanted.
    pub fn sweep_from(
        &self,
        sequence: MappedOrder,
        start: usize,
        timings: &mut TimingSamples,
    ) -> MfResult<MappedOrder> {
        let progress = BatchContext::single(sequence.len());
        self.sweep_with_progress(sequence, start, timings, &progress)
    }

    pub(crate) fn sweep_with_progress(
        &self,
        sequence: MappedOrder,
        start: usize,
        timings: &mut TimingSamples,
        progress: &BatchContext,
    ) -> MfResult<MappedOrder> {
        let ws = self.options.window_size;
        if start + ws > sequence.len() {
            debug!(
                "No window of {} fits from {} in {} items",
                ws,
                start,
                sequence.len()
            );
            return Ok(sequence);
        }

        let last = sequence.len() - ws;
        let mut current = sequence;
        for p in start..=last {
            let step_start = Instant::now();
            current = self.optimize_window(&current, p)?;
            timings.push(step_start.elapsed());

            debug!(
                "Step {}/{} done, likelihood {:.4}",
                p - start + 1,
                last - start + 1,
                current.likelihood()
            );

            if self.options.verbosity.time {
                if let Some(estimate) = predictor::predict(Some(progress), ws, timings.as_slice())
                {
                    info!(
                        "Predicted total time: {} (sd {})",
                        predictor::format_secs(estimate.mean_secs),
                        predictor::format_secs(estimate.std_dev_secs)
                    );
                }
            }
        }
        Ok(current)
    }
}
