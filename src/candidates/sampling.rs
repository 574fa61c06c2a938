use super::SamplingMode;
use crate::types::Item;
use fastrand::Rng;

/// Spearman rank correlation between the original window and a
/// rearrangement of it. Items are unique, so the tie-free formula applies.
pub fn spearman(original: &[Item], candidate: &[Item]) -> f64 {
    let n = original.len();
    if n < 2 {
        return 1.0;
    }
    let mut d_sq = 0.0;
    for (rank, item) in original.iter().enumerate() {
        let other = candidate
            .iter()
            .position(|c| c == item)
            .unwrap_or(rank);
        let d = rank as f64 - other as f64;
        d_sq += d * d;
    }
    let n = n as f64;
    1.0 - (6.0 * d_sq) / (n * (n * n - 1.0))
}

/// Min-max scaling into `[0, 1]`. A constant input maps to all ones.
pub fn normalize(scores: &[f64]) -> Vec<f64> {
    let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;
    if !span.is_finite() || span <= 0.0 {
        return vec![1.0; scores.len()];
    }
    scores.iter().map(|s| (s - min) / span).collect()
}

pub fn weights(window: &[Item], rows: &[Vec<Item>], mode: SamplingMode) -> Vec<f64> {
    let scores: Vec<f64> = rows.iter().map(|row| spearman(window, row)).collect();
    let scaled = normalize(&scores);
    match mode {
        SamplingMode::Neutral => vec![1.0; rows.len()],
        SamplingMode::Similar => scaled,
        SamplingMode::Dissimilar => scaled.into_iter().map(|s| 1.0 - s).collect(),
    }
}

/// Draws `n` distinct rows without replacement. Once all remaining weights
/// are zero the draw continues uniformly.
pub fn draw(
    window: &[Item],
    rows: Vec<Vec<Item>>,
    n: usize,
    mode: SamplingMode,
    rng: &mut Rng,
) -> Vec<Vec<Item>> {
    let mut w = weights(window, &rows, mode);
    let mut pool = rows;
    let n = n.min(pool.len());
    let mut picked = Vec::with_capacity(n);

    while picked.len() < n {
        let total: f64 = w.iter().sum();
        let idx = if total > 0.0 {
            let mut target = rng.f64() * total;
            let mut chosen = w.len() - 1;
            for (i, &wi) in w.iter().enumerate() {
                if wi <= 0.0 {
                    continue;
                }
                if target < wi {
                    chosen = i;
                    break;
                }
                target -= wi;
                chosen = i;
            }
            chosen
        } else {
            rng.usize(0..pool.len())
        };
        w.swap_remove(idx);
        picked.push(pool.swap_remove(idx));
    }
    picked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spearman_bounds() {
        let w = [1, 2, 3, 4];
        assert!((spearman(&w, &[1, 2, 3, 4]) - 1.0).abs() < 1e-12);
        assert!((spearman(&w, &[4, 3, 2, 1]) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn normalize_constant_input() {
        assert_eq!(normalize(&[0.3, 0.3]), vec![1.0, 1.0]);
        assert_eq!(normalize(&[-1.0, 0.0, 1.0]), vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn zero_weight_rows_still_drawn_when_exhausted() {
        let window = vec![1, 2];
        let rows = vec![vec![1, 2], vec![2, 1]];
        let mut rng = Rng::with_seed(7);
        // Similar mode gives the reversed row weight 0.
        let picked = draw(&window, rows, 2, SamplingMode::Similar, &mut rng);
        assert_eq!(picked.len(), 2);
        assert_eq!(picked[0], vec![1, 2]);
    }
}
