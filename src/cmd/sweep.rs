use crate::reports;
use clap::Args;
use itertools::Itertools;
use markerforge::config::Config;
use markerforge::error::{MarkerForgeError, MfResult};
use markerforge::estimator::{MapEstimator, TransitionWeights};
use markerforge::evaluator::EvalContext;
use markerforge::optimizer::{OptimizationOptions, Optimizer};
use markerforge::pairwise::TwoPointTable;
use markerforge::types::{Order, TimingSamples};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

#[derive(Args, Debug, Clone)]
pub struct SweepArgs {
    #[command(flatten)]
    pub config: Config,

    /// Starting order as comma separated marker names (table order if empty).
    #[arg(short, long, value_delimiter = ',')]
    pub markers: Vec<String>,

    /// Repeat the sweep until a pass no longer improves the likelihood.
    #[arg(long, default_value_t = 1)]
    pub passes: usize,

    /// Process the order in overlapping batches of this many markers.
    #[arg(long)]
    pub batch_size: Option<usize>,

    #[arg(long, default_value_t = 4)]
    pub overlap: usize,
}

pub fn run(args: SweepArgs, config: Config, table: Arc<TwoPointTable>) -> MfResult<()> {
    let order = resolve_order(&args.markers, &table)?;
    let options = OptimizationOptions::try_from(&config)?;
    let estimator: Arc<dyn MapEstimator> = table.clone();
    let weights: Arc<dyn TransitionWeights> = table.clone();
    let optimizer = Optimizer::new(estimator, Some(weights), options)?;

    let opts = optimizer.options();
    info!(
        "🔎 Sweeping {} markers: window {}, {} strategy, {} objective, {} workers",
        order.len(),
        opts.window_size,
        opts.strategy.kind(),
        opts.objective,
        opts.workers
    );
    let channels = opts.verbosity.enabled();
    if !channels.is_empty() {
        info!("Verbose channels: {}", channels.iter().join(","));
    }

    let mut timings = TimingSamples::new();
    let start = Instant::now();

    let initial = optimizer.evaluator().evaluate(&order, EvalContext::Full)?;
    let initial_likelihood = initial.likelihood();

    let mut current = match args.batch_size {
        Some(size) => optimizer.map_in_batches(&order, size, args.overlap, &mut timings)?,
        None => optimizer.sweep(initial, &mut timings)?,
    };

    for pass in 1..args.passes.max(1) {
        let before = current.likelihood();
        current = optimizer.sweep(current, &mut timings)?;
        info!("Pass {}: {:.4} -> {:.4}", pass + 1, before, current.likelihood());
        if current.likelihood() <= before {
            break;
        }
    }

    info!(
        "Finished {} window steps in {:.2}s",
        timings.len(),
        start.elapsed().as_secs_f32()
    );

    reports::print_order_table("SWEPT ORDER", &current, &table);
    println!("Initial: {:.4}", initial_likelihood);
    println!("Likelihood: {:.4}", current.likelihood());
    Ok(())
}

fn resolve_order(markers: &[String], table: &TwoPointTable) -> MfResult<Order> {
    if markers.is_empty() {
        return Order::new(table.items());
    }
    let ids = markers
        .iter()
        .map(|name| {
            table.id_of(name.trim()).ok_or_else(|| {
                MarkerForgeError::Validation(format!("Unknown marker '{}'", name))
            })
        })
        .collect::<MfResult<Vec<_>>>()?;
    Order::new(ids)
}
