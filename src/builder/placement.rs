use crate::types::Item;
use fastrand::Rng;

/// Slots within this distance of the best LOD count as tied.
pub const TIE_TOLERANCE: f64 = 1e-9;

/// Shifts a LOD profile so its best slot is 0. NaN counts as `-inf`.
/// `None` when no slot has a finite score.
pub fn normalize(lods: &[f64]) -> Option<Vec<f64>> {
    let max = lods
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return None;
    }
    Some(
        lods.iter()
            .map(|&v| if v.is_nan() { f64::NEG_INFINITY } else { v - max })
            .collect(),
    )
}

/// The best slot, if every other slot sits below `-threshold`.
pub fn confident_slot(lods: &[f64], threshold: f64) -> Option<usize> {
    let best = lods
        .iter()
        .enumerate()
        .fold(None, |acc: Option<(usize, f64)>, (i, &v)| match acc {
            Some((_, b)) if v <= b => acc,
            _ => Some((i, v)),
        })?
        .0;
    let clear = lods
        .iter()
        .enumerate()
        .all(|(i, &v)| i == best || v < lods[best] - threshold);
    clear.then_some(best)
}

pub fn second_best(lods: &[f64]) -> f64 {
    let mut sorted = lods.to_vec();
    sorted.sort_by(|a, b| b.total_cmp(a));
    sorted.get(1).copied().unwrap_or(f64::NEG_INFINITY)
}

/// Items ordered most confident first: the lower the runner-up LOD, the
/// clearer the best slot. Equal confidence keeps the input order.
pub fn by_confidence(matrix: &[(Item, Vec<f64>)]) -> Vec<(Item, f64)> {
    let mut ranked: Vec<(Item, f64)> = matrix
        .iter()
        .map(|(item, lods)| (*item, second_best(lods)))
        .collect();
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
    ranked
}

/// Highest-scoring slot, ties drawn uniformly.
pub fn best_slot(lods: &[f64], rng: &mut Rng) -> usize {
    let max = lods.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let tied: Vec<usize> = lods
        .iter()
        .enumerate()
        .filter(|&(_, &v)| v >= max - TIE_TOLERANCE)
        .map(|(i, _)| i)
        .collect();
    if tied.is_empty() {
        return 0;
    }
    tied[rng.usize(0..tied.len())]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confident_slot_needs_clear_margin() {
        assert_eq!(confident_slot(&[-5.0, 0.0, -3.5], 3.0), Some(1));
        assert_eq!(confident_slot(&[-2.0, 0.0, -3.5], 3.0), None);
        assert_eq!(confident_slot(&[0.0, 0.0], 3.0), None);
    }

    #[test]
    fn normalize_shifts_best_to_zero() {
        assert_eq!(normalize(&[-4.0, -1.0]), Some(vec![-3.0, 0.0]));
        assert_eq!(normalize(&[f64::NEG_INFINITY]), None);
    }

    #[test]
    fn ties_are_drawn_from_tied_slots_only() {
        let lods = [0.0, -2.0, 0.0, -7.0];
        let mut rng = Rng::with_seed(11);
        for _ in 0..50 {
            let slot = best_slot(&lods, &mut rng);
            assert!(slot == 0 || slot == 2);
        }
    }

    #[test]
    fn runner_up_orders_confidence() {
        let matrix = vec![(1, vec![0.0, -1.0]), (2, vec![0.0, -9.0]), (3, vec![0.0, -4.0])];
        let order: Vec<Item> = by_confidence(&matrix).into_iter().map(|(i, _)| i).collect();
        assert_eq!(order, vec![2, 3, 1]);
    }
}
