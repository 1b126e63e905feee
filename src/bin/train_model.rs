use clap::Parser;
use cyber_risk_etl::config::DEFAULT_MODEL_PATH;
use cyber_risk_etl::core::csv_io::parse_csv;
use cyber_risk_etl::ml::forest::ForestParams;
use cyber_risk_etl::ml::{train, TrainingOptions};
use cyber_risk_etl::utils::error::RiskError;
use cyber_risk_etl::utils::logger;

#[derive(Parser, Debug)]
#[command(name = "train-model")]
#[command(about = "Train the high-risk event classifier offline")]
struct Args {
    /// Labelled training CSV (needs a label_high_risk column)
    #[arg(short, long, default_value = "data/training_events.csv")]
    data: String,

    /// Where to write the fitted model
    #[arg(short, long, default_value = DEFAULT_MODEL_PATH)]
    model: String,

    #[arg(long, default_value_t = 250)]
    trees: usize,

    /// Maximum tree depth; unlimited when omitted
    #[arg(long)]
    max_depth: Option<usize>,

    #[arg(long, default_value_t = 0.25)]
    test_size: f64,

    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn fail(e: &RiskError) -> ! {
    tracing::error!("❌ Training failed: {}", e);
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());
    std::process::exit(1);
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // 初始化日誌
    logger::init_cli_logger(args.verbose);

    tracing::info!("🚀 Training model from {}", args.data);

    let bytes = match std::fs::read(&args.data) {
        Ok(bytes) => bytes,
        Err(e) => fail(&RiskError::IoError(e)),
    };
    let table = match parse_csv(&bytes) {
        Ok(table) => table,
        Err(e) => fail(&e),
    };
    tracing::info!("📥 Loaded {} labelled rows", table.len());

    let options = TrainingOptions {
        forest: ForestParams {
            n_trees: args.trees,
            max_depth: args.max_depth,
            seed: args.seed,
            ..ForestParams::default()
        },
        test_size: args.test_size,
        split_seed: args.seed,
    };

    let outcome = match train(&table, &options) {
        Ok(outcome) => outcome,
        Err(e) => fail(&e),
    };

    println!("{}", outcome.report);

    if let Err(e) = outcome.model.save(&args.model) {
        fail(&e);
    }
    tracing::info!(
        "🌲 {} trees, {} train / {} test rows",
        outcome.model.forest.n_trees(),
        outcome.train_rows,
        outcome.test_rows
    );
    println!("💾 Model saved to {}", args.model);

    Ok(())
}
