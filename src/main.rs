use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use markerforge::config::Config;
use markerforge::pairwise::loader::load_two_point_file;
use std::process;
use std::sync::Arc;
use tracing::{error, info, Level};

mod cmd;
mod reports;

#[derive(Parser, Debug)]
#[command(author, version, about = "Marker ordering by windowed search", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Two-point table: marker_a,marker_b,rf,lod[,phase]
    #[arg(global = true, short, long, default_value = "data/two_point.csv")]
    table: String,

    /// JSON configuration; flags given on the command line override it.
    #[arg(global = true, long)]
    config: Option<String>,

    #[arg(global = true, long, default_value_t = false)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Slide the window optimizer over an existing order.
    Sweep(cmd::sweep::SweepArgs),
    /// Build an order from scratch, one marker at a time.
    Order(cmd::order::OrderArgs),
}

fn main() {
    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    tracing_subscriber::fmt()
        .with_max_level(if cli.debug { Level::DEBUG } else { Level::INFO })
        .init();

    let (cli_config, sub_name) = match &cli.command {
        Commands::Sweep(args) => (&args.config, "sweep"),
        Commands::Order(args) => (&args.config, "order"),
    };

    let config = match &cli.config {
        Some(path) => {
            info!("⚙️  Loading configuration from: {}", path);
            let mut file_config = Config::load_from_file(path).unwrap_or_else(|e| {
                error!("{}", e);
                process::exit(1);
            });
            if let Some(sub_matches) = matches.subcommand_matches(sub_name) {
                file_config.merge_from_cli(cli_config, sub_matches);
            }
            file_config
        }
        None => cli_config.clone(),
    };

    if let Err(e) = config.validate() {
        error!("{}", e);
        process::exit(2);
    }

    info!("📂 Loading two-point table: {}", cli.table);
    let table = match load_two_point_file(&cli.table) {
        Ok(t) => Arc::new(t),
        Err(e) => {
            error!("❌ FATAL ERROR LOADING TABLE: {}", e);
            process::exit(1);
        }
    };

    let outcome = match cli.command {
        Commands::Sweep(args) => cmd::sweep::run(args, config, table),
        Commands::Order(args) => cmd::order::run(args, config, table),
    };

    if let Err(e) = outcome {
        error!("{}", e);
        process::exit(1);
    }
}
