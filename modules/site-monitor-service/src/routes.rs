//! Axum route handlers for the site monitor RPC API.

use crate::board::SiteBoard;
use crate::error::MonitorError;
use crate::monitor::Monitor;
use crate::worker;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use site_monitor_types::*;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

pub struct AppState {
    pub monitor: Arc<Monitor>,
    pub board: Mutex<SiteBoard>,
    pub start_time: Instant,
    pub last_tick_at: Mutex<Option<String>>,
    pub last_scan: Mutex<Option<ScanSummary>>,
    pub poll_interval_secs: u64,
    pub notifications_enabled: bool,
}

// =====================================================
// Site Endpoints
// =====================================================

// GET /rpc/sites/list?status=changed
pub async fn sites_list(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<SiteFilter>,
) -> (StatusCode, Json<RpcResponse<Vec<MonitoredSite>>>) {
    let sites = state.board.lock().await.list(filter.status);
    (StatusCode::OK, Json(RpcResponse::ok(sites)))
}

// POST /rpc/scan
pub async fn scan_now(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<RpcResponse<ScanSummary>>) {
    match worker::scan_tick(&state).await {
        Ok(summary) => (StatusCode::OK, Json(RpcResponse::ok(summary))),
        Err(e) => {
            let status = match e {
                MonitorError::Transport(_) => StatusCode::BAD_GATEWAY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            log::error!("[SITE_MONITOR] On-demand scan failed: {}", e);
            (status, Json(RpcResponse::err(e.to_string())))
        }
    }
}

// =====================================================
// Service
// =====================================================

// GET /rpc/status
pub async fn status(State(state): State<Arc<AppState>>) -> Json<RpcResponse<ServiceStatus>> {
    Json(RpcResponse::ok(service_status(&state).await))
}

pub async fn service_status(state: &AppState) -> ServiceStatus {
    let board = state.board.lock().await;
    ServiceStatus {
        running: true,
        uptime_secs: state.start_time.elapsed().as_secs(),
        monitored_sites: board.len(),
        changed_sites: board.count(SiteStatus::Changed),
        uncertain_sites: board.count(SiteStatus::Uncertain),
        last_tick_at: state.last_tick_at.lock().await.clone(),
        last_scan: state.last_scan.lock().await.clone(),
        poll_interval_secs: state.poll_interval_secs,
        notifications_enabled: state.notifications_enabled,
    }
}
