use clap::Parser;
use study_export::utils::logger;
use study_export::{
    CliConfig, EtlEngine, EtlError, ExportPipeline, ExportSettings, FirestoreClient,
    LocalStorage, TomlConfig,
};

fn fail(e: EtlError) -> ! {
    // 記錄詳細錯誤信息
    tracing::error!(
        "❌ Export failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    // 輸出用戶友好的錯誤信息
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
    std::process::exit(e.exit_code());
}

async fn run(config: CliConfig) -> study_export::Result<()> {
    let file_config = match &config.config {
        Some(path) => {
            tracing::debug!("Loading config file: {}", path);
            Some(TomlConfig::from_file(path)?)
        }
        None => None,
    };

    let settings = ExportSettings::resolve(config.overrides(), file_config)?;
    tracing::info!(
        "Exporting collection '{}' from project {} (database {})",
        settings.collection,
        settings.firestore.project_id,
        settings.firestore.database
    );
    if settings.is_emulator() {
        tracing::info!("🧪 Using Firestore emulator at {}", settings.firestore.endpoint);
    }

    // 建立 Firestore 客戶端、存儲和管道
    let client = FirestoreClient::connect(settings.firestore.clone(), &settings.auth).await?;
    let storage = LocalStorage::new(".".to_string());
    let pipeline = ExportPipeline::new(client, storage, settings);

    let engine = EtlEngine::new_with_monitoring(pipeline, config.monitor);
    let summary = engine.run().await?;

    println!("Data saved to {}", summary.output_path);
    println!("Total responses: {}", summary.total_responses);
    println!("Unique participants: {}", summary.unique_participants);
    Ok(())
}

#[tokio::main]
async fn main() {
    let config = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting study-export");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }
    if config.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    if let Err(e) = run(config).await {
        fail(e);
    }
}
