use crate::reports;
use clap::Args;
use markerforge::builder::{BuildOptions, ProgressiveBuilder, RankedItem};
use markerforge::config::Config;
use markerforge::error::MfResult;
use markerforge::pairwise::loader::load_categories_file;
use markerforge::pairwise::TwoPointTable;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Args, Debug, Clone)]
pub struct OrderArgs {
    #[command(flatten)]
    pub config: Config,

    /// marker,category file; lower categories are placed first.
    #[arg(long)]
    pub categories: Option<String>,
}

pub fn run(args: OrderArgs, config: Config, table: Arc<TwoPointTable>) -> MfResult<()> {
    let items = match &args.categories {
        Some(path) => load_categories_file(path, &table)?,
        None => table
            .items()
            .into_iter()
            .map(|item| RankedItem { item, category: 0 })
            .collect(),
    };

    let options = BuildOptions::try_from(&config)?;
    let builder = ProgressiveBuilder::new(table.clone(), table.clone(), table.clone(), options)?;
    let opts = builder.options();
    info!(
        "🧱 Ordering {} markers: seed {}, LOD {}, touchdown {}",
        items.len(),
        opts.seed_size,
        opts.threshold,
        opts.touchdown
    );

    let outcome = builder.build(&items)?;
    if outcome.forced.fitness().is_dominated() {
        warn!("⚠️  The forced order has no estimate; its rf and phase columns are empty");
    }

    reports::print_order_table("POSITIONED", &outcome.positioned, &table);
    if !outcome.unpositioned.is_empty() {
        reports::print_lod_matrix(&outcome.lod_matrix, &table);
        reports::print_order_table("FORCED", &outcome.forced, &table);
    }
    println!(
        "Unpositioned: {}",
        reports::names(&outcome.unpositioned, &table).join(",")
    );
    println!("Likelihood: {:.4}", outcome.positioned.likelihood());
    println!("Forced likelihood: {:.4}", outcome.forced.likelihood());
    Ok(())
}
