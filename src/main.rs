use clap::Parser;
use movie_meta::domain::ports::Storage;
use movie_meta::utils::{logger, validation::Validate};
use movie_meta::{CliConfig, LocalStorage, MetaError, MetadataEngine, MovieResponse};

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.log_json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting movie-meta CLI");
    tracing::debug!("CLI config: {:?}", cli);

    if let Err(e) = run(&cli).await {
        tracing::error!("Lookup failed: {}", e);
        eprintln!("❌ {}", e);
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }
}

async fn run(cli: &CliConfig) -> Result<(), MetaError> {
    let config = cli.metadata_config()?;
    config.validate()?;
    tracing::info!(
        "Configuration loaded (strict: {}, proxy: {}, timeout: {}s)",
        config.strict_title_match,
        config.proxy.use_proxy,
        config.request_timeout_seconds
    );

    let file = match &cli.input {
        Some(path) => {
            tracing::info!("Reading titles from {}", path);
            Some(LocalStorage::new(".".to_string()).read_file(path).await?)
        }
        None => None,
    };

    let engine = MetadataEngine::from_config(&config)?;
    let response = engine.run_parts(cli.title.clone(), file).await?;

    let output_dir = cli.output_directory()?;
    let filename = MovieResponse::output_filename(&chrono::Local::now());
    LocalStorage::new(output_dir.clone())
        .write_file(&filename, &response.spreadsheet)
        .await?;
    let output_path = std::path::Path::new(&output_dir).join(&filename);
    tracing::info!("Spreadsheet saved to {}", output_path.display());

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&response.metadata)?);
        return Ok(());
    }

    let records = response.metadata.records();
    for record in records {
        match &record.error {
            None => println!(
                "✅ {} ({}) [{}] {}",
                record.title,
                record.year,
                record.source.label(),
                record.rating
            ),
            Some(message) => println!("❌ {}: {}", record.title, message),
        }
    }
    let resolved = records.iter().filter(|r| r.is_success()).count();
    println!("📊 Resolved {}/{} title(s)", resolved, records.len());
    println!("📁 Output saved to: {}", output_path.display());

    Ok(())
}
