//! Background worker for site monitoring.
//!
//! Runs a detection pass every N seconds and folds the results into the
//! dashboard board.

use crate::error::MonitorError;
use crate::routes::AppState;
use site_monitor_types::ScanSummary;
use std::sync::Arc;
use std::time::Duration;

pub async fn run_worker(state: Arc<AppState>) {
    log::info!(
        "[SITE_MONITOR] Worker started (poll interval: {}s)",
        state.poll_interval_secs
    );

    loop {
        if let Err(e) = scan_tick(&state).await {
            log::error!("[SITE_MONITOR] Tick error: {}", e);
        }
        tokio::time::sleep(Duration::from_secs(state.poll_interval_secs)).await;
    }
}

/// One scan: run the monitor, then publish its results to the shared state.
///
/// Used by the worker loop and the on-demand `/rpc/scan` endpoint. The
/// monitor's own lock keeps the two from overlapping.
pub async fn scan_tick(state: &AppState) -> Result<ScanSummary, MonitorError> {
    let outcome = state.monitor.run_once().await?;

    state.board.lock().await.apply(&outcome.checks);
    *state.last_tick_at.lock().await = Some(outcome.summary.finished_at.clone());
    *state.last_scan.lock().await = Some(outcome.summary.clone());

    Ok(outcome.summary)
}
