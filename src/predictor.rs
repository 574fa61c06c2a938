//! Wall-clock estimate for a batched sweep, from the durations of the
//! window steps completed so far.

/// Sizes of the batches a sequence is processed in and the number of items
/// consecutive batches share.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchContext {
    pub sizes: Vec<usize>,
    pub overlap: usize,
}

impl BatchContext {
    /// The whole sequence as one batch.
    pub fn single(len: usize) -> Self {
        Self {
            sizes: vec![len],
            overlap: 0,
        }
    }

    /// Window steps expected over all batches.
    pub fn steps(&self, ws: usize) -> usize {
        let total: usize = self.sizes.iter().sum();
        let shared = self.overlap * self.sizes.len().saturating_sub(1);
        total.saturating_sub(shared).saturating_sub(ws)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinishEstimate {
    pub mean_secs: f64,
    pub std_dev_secs: f64,
}

/// Median and standard deviation of the step durations, scaled by the
/// expected number of steps. `None` without batch context or samples.
pub fn predict(batches: Option<&BatchContext>, ws: usize, samples: &[f64]) -> Option<FinishEstimate> {
    let ctx = batches?;
    if ctx.sizes.is_empty() || samples.is_empty() {
        return None;
    }
    let steps = ctx.steps(ws) as f64;
    Some(FinishEstimate {
        mean_secs: median(samples) * steps,
        std_dev_secs: std_dev(samples) * steps,
    })
}

pub fn median(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Sample standard deviation; zero below two samples.
pub fn std_dev(samples: &[f64]) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }
    let n = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / n;
    let var = samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / (n - 1.0);
    var.sqrt()
}

pub fn format_secs(secs: f64) -> String {
    let total = secs.max(0.0).round() as u64;
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{}h {:02}m {:02}s", h, m, s)
    } else if m > 0 {
        format!("{}m {:02}s", m, s)
    } else {
        format!("{}s", s)
    }
}
