//! Report Dashboard: browser front-end for the market report pipeline.
//! Default: http://127.0.0.1:9104/

use market_report::ai::AiClient;
use market_report::config::ReportConfig;
use market_report::dashboard::{self, AppState};
use market_report::pipeline::ReportPipeline;
use market_report::tools::ToolRegistry;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = match ReportConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let http = match reqwest::Client::builder()
        .pool_idle_timeout(Duration::from_secs(90))
        .build()
    {
        Ok(c) => c,
        Err(e) => {
            log::error!("Failed to create HTTP client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let client = match AiClient::from_config(&config, http.clone()) {
        Ok(c) => c,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    log::info!(
        "[REPORT] Using model {} in {:?} mode",
        client.model(),
        config.mode
    );

    let state = Arc::new(AppState::new(
        ReportPipeline::from_client(&client, Arc::new(ToolRegistry::with_builtins(http))),
        config.mode,
    ));

    let cors = tower_http::cors::CorsLayer::permissive();

    let app = axum::Router::new()
        .route("/", axum::routing::get(dashboard::index))
        .route("/report", axum::routing::post(dashboard::generate_form))
        .route("/report/:id/download", axum::routing::get(dashboard::download))
        .route(
            "/rpc/report/generate",
            axum::routing::post(dashboard::generate_rpc),
        )
        .with_state(state)
        .layer(cors);

    let addr = format!("127.0.0.1:{}", config.dashboard_port);
    log::info!("Report Dashboard listening on http://{}", addr);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            log::error!("Failed to bind {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        log::error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
