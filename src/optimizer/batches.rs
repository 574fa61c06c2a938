use super::Optimizer;
use crate::error::{MarkerForgeError, MfResult};
use crate::evaluator::EvalContext;
use crate::predictor::BatchContext;
use crate::types::{Item, MappedOrder, Order, TimingSamples};
use std::ops::Range;
use tracing::{debug, info};

/// Splits `0..len` into ranges of `size` items where each range starts
/// `overlap` items before the previous one ended.
pub fn plan_batches(len: usize, size: usize, overlap: usize) -> MfResult<Vec<Range<usize>>> {
    if size < 2 {
        return Err(MarkerForgeError::Config(format!(
            "batch size must be at least 2, got {}",
            size
        )));
    }
    if overlap >= size {
        return Err(MarkerForgeError::Config(format!(
            "overlap {} must be smaller than the batch size {}",
            overlap, size
        )));
    }
    if len <= size {
        return Ok(vec![0..len]);
    }

    let mut batches = Vec::new();
    let mut start = 0;
    loop {
        let end = (start + size).min(len);
        batches.push(start..end);
        if end == len {
            break;
        }
        start = end - overlap;
    }
    Ok(batches)
}

impl Optimizer {
    /// Maps and sweeps a long order batch by batch.
    ///
    /// The first batch is mapped in full and swept from the configured start
    /// position. Each later batch starts with the
    /// last `overlap` items of the stitched result, mapped with their phases
    /// held fixed, and is swept only past that shared prefix. The stitched
    /// order is re-estimated once at the end with every phase fixed.
    pub fn map_in_batches(
        &self,
        order: &Order,
        size: usize,
        overlap: usize,
        timings: &mut TimingSamples,
    ) -> MfResult<MappedOrder> {
        let ws = self.options.window_size;
        if size < ws {
            return Err(MarkerForgeError::Config(format!(
                "batch size {} is smaller than the window size {}",
                size, ws
            )));
        }
        if overlap == 0 {
            return Err(MarkerForgeError::Config(
                "batches must share at least one item to carry phases across".to_string(),
            ));
        }

        let ranges = plan_batches(order.len(), size, overlap)?;
        let progress = BatchContext {
            sizes: ranges.iter().map(|r| r.len()).collect(),
            overlap,
        };
        info!(
            "Mapping {} items in {} batches (size {}, overlap {})",
            order.len(),
            ranges.len(),
            size,
            overlap
        );

        let evaluator = self.evaluator();
        let items = order.items();
        let mut merged_items: Vec<Item> = Vec::with_capacity(items.len());
        let mut merged_phases: Vec<u8> = Vec::with_capacity(items.len().saturating_sub(1));

        for (k, range) in ranges.iter().enumerate() {
            if k == 0 {
                let batch = Order::from_trusted(items[range.clone()].to_vec());
                let mapped = evaluator.evaluate(&batch, EvalContext::Full)?;
                let start = self.options.start_position;
                let swept = self.sweep_with_progress(mapped, start, timings, &progress)?;
                let (batch_order, fitness) = swept.into_parts();
                merged_items = batch_order.into_items();
                merged_phases = fitness.phases;
                continue;
            }

            let keep = overlap.min(merged_items.len());
            let mut batch_items = merged_items[merged_items.len() - keep..].to_vec();
            batch_items.extend_from_slice(&items[range.start + overlap..range.end]);
            let batch = Order::from_trusted(batch_items);

            let fixed = &merged_phases[merged_phases.len() - (keep - 1)..];
            let mapped = evaluator.evaluate(
                &batch,
                EvalContext::Seeded {
                    fixed_phases: fixed,
                },
            )?;
            let swept = self.sweep_with_progress(mapped, keep, timings, &progress)?;
            debug!(
                "Batch {}/{} likelihood {:.4}",
                k + 1,
                ranges.len(),
                swept.likelihood()
            );

            let (batch_order, fitness) = swept.into_parts();
            merged_items.extend_from_slice(&batch_order.items()[keep..]);
            merged_phases.extend_from_slice(&fitness.phases[keep - 1..]);
        }

        let whole = Order::from_trusted(merged_items);
        let mapped = evaluator.evaluate(
            &whole,
            EvalContext::Seeded {
                fixed_phases: &merged_phases,
            },
        )?;
        Ok(mapped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batches_cover_every_position() {
        let ranges = plan_batches(21, 10, 3).unwrap();
        assert_eq!(ranges, vec![0..10, 7..17, 14..21]);
    }

    #[test]
    fn short_sequence_is_one_batch() {
        assert_eq!(plan_batches(5, 10, 3).unwrap(), vec![0..5]);
    }

    #[test]
    fn overlap_must_be_smaller_than_size() {
        assert!(plan_batches(30, 5, 5).is_err());
    }
}
