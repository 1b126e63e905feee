use clap::Parser;
use cyber_risk_etl::config::{bootstrap, DEFAULT_SAMPLE_EVENTS};
use cyber_risk_etl::domain::ports::RiskScorer;
use cyber_risk_etl::ml::shared_model;
use cyber_risk_etl::utils::error::{ErrorSeverity, RiskError};
use cyber_risk_etl::utils::{logger, validation::Validate};
use cyber_risk_etl::{
    CliConfig, EtlEngine, HeuristicScorer, LocalStorage, RiskConfig, ScoringPipeline,
};
use std::path::Path;
use std::sync::Arc;

fn exit_with(e: &RiskError) -> ! {
    // 記錄詳細錯誤信息
    tracing::error!(
        "❌ Scoring run failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    // 輸出用戶友好的錯誤信息
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2, // 輸入檔案問題
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3, // 系統錯誤
    };
    std::process::exit(exit_code);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting cyber-risk-etl CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    // 預設輸入檔不存在時寫入範例資料
    if config.input == DEFAULT_SAMPLE_EVENTS {
        if let Err(e) = bootstrap::ensure_sample_events(Path::new(&config.input)) {
            exit_with(&e);
        }
    }

    let risk_config = match RiskConfig::load_or_bootstrap(&config.config) {
        Ok(risk_config) => risk_config,
        Err(e) => exit_with(&e),
    };
    if let Err(e) = risk_config.validate() {
        exit_with(&e);
    }

    let threshold = config.threshold.unwrap_or_else(|| risk_config.threshold());
    tracing::info!("🎯 Alert threshold: {:.2}", threshold);

    let scorer: Arc<dyn RiskScorer> = match &config.model {
        Some(model_path) => match shared_model(model_path) {
            Ok(model) => model as Arc<dyn RiskScorer>,
            Err(e) => exit_with(&e),
        },
        None => Arc::new(HeuristicScorer::new(risk_config.weights())),
    };
    tracing::info!("🧮 Scoring with the {} scorer", scorer.name());

    let monitor_enabled = config.monitor;
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    // 創建存儲和管道
    let storage = LocalStorage::default();
    let pipeline = ScoringPipeline::new(
        storage,
        config,
        scorer,
        risk_config.recommender(),
        threshold,
    );

    // 創建引擎並運行
    let engine = EtlEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(summary) => {
            tracing::info!("✅ Scoring completed successfully!");
            println!(
                "✅ Scored {} records, {} alerts at threshold {:.2}",
                summary.rows, summary.alerts, summary.threshold
            );
            println!("📁 Output saved to: {}", summary.output_path);
        }
        Err(e) => exit_with(&e),
    }

    Ok(())
}
