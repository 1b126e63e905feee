use anyhow::Context;
use clap::Parser;
use cyber_risk_etl::config::{bootstrap, DEFAULT_CONFIG_PATH, DEFAULT_SAMPLE_EVENTS};
use cyber_risk_etl::dashboard::{build_router, AppState};
use cyber_risk_etl::utils::{logger, validation::Validate};
use cyber_risk_etl::RiskConfig;
use std::net::SocketAddr;
use std::path::Path;

#[derive(Parser, Debug)]
#[command(name = "risk-dashboard")]
#[command(about = "Browser dashboard for scoring security event CSVs")]
struct Args {
    /// YAML/TOML config with threshold and playbook
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:8501")]
    bind: SocketAddr,

    /// Sample events analysed when nothing is uploaded
    #[arg(long, default_value = DEFAULT_SAMPLE_EVENTS)]
    sample_path: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 初始化日誌
    logger::init_server_logger(args.verbose, args.log_json);

    tracing::info!("🚀 Starting risk dashboard");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    // 首次啟動時寫入範例設定與範例資料
    let config = RiskConfig::load_or_bootstrap(&args.config)
        .with_context(|| format!("failed to load config '{}'", args.config))?;
    config.validate()?;
    bootstrap::ensure_sample_events(Path::new(&args.sample_path))?;

    tracing::info!(
        "🎯 Threshold {:.2}, {} playbook entries",
        config.threshold(),
        config.playbook().len()
    );

    let app = build_router(AppState::new(config, &args.sample_path));

    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("failed to bind {}", args.bind))?;
    tracing::info!("🌐 Dashboard listening on http://{}", args.bind);

    axum::serve(listener, app).await?;
    Ok(())
}
