use clap::Parser;
use shipdash::server::{build_router, AppState};
use shipdash::utils::{logger, validation::Validate};
use shipdash::{AppConfig, CliConfig, ShipStationClient, ShippingApi};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_server_logger(cli.verbose);
    }

    tracing::info!("Starting shipdash server");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // 載入並驗證配置
    let mut config = match AppConfig::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Failed to load configuration: {}", e);
            eprintln!("❌ {}", e);
            eprintln!("💡 Provide a shipdash.toml or set SS_API_KEY in the environment");
            std::process::exit(1);
        }
    };

    if let Some(port) = cli.port {
        config.server.port = port;
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }

    // 上游 client 與共享狀態
    let api: Arc<dyn ShippingApi> = Arc::new(ShipStationClient::new(
        &config.upstream.base_url,
        &config.upstream.api_key,
        config.upstream.timeout_seconds,
    )?);
    let state = AppState::new(api, &config);
    let router = build_router(state, &config.server.cors_origins);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("🚀 Server running on port {}", config.server.port);

    axum::serve(listener, router).await?;

    Ok(())
}
