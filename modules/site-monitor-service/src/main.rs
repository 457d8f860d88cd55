//! Site Monitor: detects content changes on tracked websites and emails a
//! summary of what changed.
//!
//! `site-monitor` runs one detection pass and exits.
//! `site-monitor serve` keeps scanning on an interval and hosts an RPC API
//! plus a dashboard on the same port. Default: http://127.0.0.1:9103/

mod board;
mod config;
mod dashboard;
mod detector;
mod error;
mod fetcher;
mod fingerprint;
mod gmail;
mod monitor;
mod notifier;
mod routes;
mod store;
#[cfg(test)]
mod testing;
mod worker;

use board::SiteBoard;
use config::MonitorConfig;
use fetcher::{ContentFetcher, FirecrawlFetcher, HttpFetcher};
use monitor::Monitor;
use notifier::{LogTransport, MailTransport};
use routes::AppState;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};
use store::TrackingStore;
use tokio::sync::Mutex;

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = match MonitorConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let client = match reqwest::Client::builder()
        .pool_idle_timeout(Duration::from_secs(90))
        .timeout(Duration::from_secs(120))
        .build()
    {
        Ok(c) => c,
        Err(e) => {
            log::error!("Failed to create HTTP client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let serve = std::env::args().nth(1).as_deref() == Some("serve");
    let notifications_enabled = config.mail.is_some();
    let monitor = Arc::new(build_monitor(&config, client));

    if serve {
        run_service(config, monitor, notifications_enabled).await
    } else {
        match monitor.run_once().await {
            Ok(outcome) => {
                for url in &outcome.summary.changed {
                    println!("changed: {}", url);
                }
                ExitCode::SUCCESS
            }
            Err(e) => {
                log::error!("[SITE_MONITOR] Run failed: {}", e);
                ExitCode::FAILURE
            }
        }
    }
}

fn build_monitor(config: &MonitorConfig, client: reqwest::Client) -> Monitor {
    let fetcher: Arc<dyn ContentFetcher> = match &config.firecrawl {
        Some(fc) => Arc::new(FirecrawlFetcher::new(client.clone(), fc.clone())),
        None => {
            log::warn!("FIRECRAWL_API_KEY not set, fetching pages directly over HTTP");
            Arc::new(HttpFetcher::new(client.clone()))
        }
    };

    let transport: Arc<dyn MailTransport> = match &config.mail {
        Some(mail) => Arc::new(gmail::GmailTransport::new(client, mail.clone())),
        None => {
            log::warn!("Mail credentials not set, notifications will only be logged");
            Arc::new(LogTransport)
        }
    };

    Monitor::new(
        config.urls.clone(),
        fetcher,
        transport,
        TrackingStore::new(config.tracking_file.clone()),
    )
}

async fn run_service(
    config: MonitorConfig,
    monitor: Arc<Monitor>,
    notifications_enabled: bool,
) -> ExitCode {
    let record = match monitor.load_record() {
        Ok(r) => r,
        Err(e) => {
            log::error!("[SITE_MONITOR] {}", e);
            return ExitCode::FAILURE;
        }
    };

    let state = Arc::new(AppState {
        board: Mutex::new(SiteBoard::seed(monitor.urls(), &record)),
        monitor,
        start_time: Instant::now(),
        last_tick_at: Mutex::new(None),
        last_scan: Mutex::new(None),
        poll_interval_secs: config.poll_interval_secs,
        notifications_enabled,
    });

    let worker_state = state.clone();
    tokio::spawn(async move {
        worker::run_worker(worker_state).await;
    });

    let cors = tower_http::cors::CorsLayer::permissive();

    let app = axum::Router::new()
        .route("/", axum::routing::get(dashboard::dashboard))
        .route("/rpc/sites/list", axum::routing::get(routes::sites_list))
        .route("/rpc/scan", axum::routing::post(routes::scan_now))
        .route("/rpc/status", axum::routing::get(routes::status))
        .with_state(state)
        .layer(cors);

    let addr = format!("127.0.0.1:{}", config.port);
    log::info!("Site Monitor Service listening on http://{}", addr);

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
