//! Dashboard HTML page handler.
//!
//! Serves a self-contained HTML page with inline CSS/JS showing each
//! monitored site, its status, last check and change history.

use crate::routes::{AppState, service_status};
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use site_monitor_types::{MonitoredSite, ServiceStatus, SiteFilter, SiteStatus};
use std::sync::Arc;

pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<SiteFilter>,
) -> impl IntoResponse {
    let sites = state.board.lock().await.list(filter.status);
    let status = service_status(&state).await;
    let html = render_dashboard(&sites, &status, filter.status);
    ([(header::CONTENT_TYPE, "text/html; charset=utf-8")], html)
}

pub fn render_dashboard(
    sites: &[MonitoredSite],
    status: &ServiceStatus,
    filter: Option<SiteStatus>,
) -> String {
    let stats_html = format!(
        r#"<div class="stats">
                <div class="stat"><span class="val">{}</span><span class="lbl">Monitored</span></div>
                <div class="stat"><span class="val">{}</span><span class="lbl">Changed</span></div>
                <div class="stat"><span class="val">{}</span><span class="lbl">Uncertain</span></div>
            </div>"#,
        status.monitored_sites, status.changed_sites, status.uncertain_sites
    );

    let mut site_rows = String::new();
    for s in sites {
        let last_checked = s.last_checked_at.as_deref().unwrap_or("-");
        let latest_change = s
            .change_history
            .first()
            .map(|c| format!("{} ({})", c.kind, c.detected_at))
            .unwrap_or_else(|| "-".to_string());
        let note = s.last_error.as_deref().map(escape_html).unwrap_or_default();
        site_rows.push_str(&format!(
            "<tr class=\"{cls}\"><td><a href=\"{url}\">{url}</a></td><td>{label}</td><td>{checked}</td><td>{changes}</td><td>{latest}</td><td class=\"err\">{note}</td></tr>\n",
            cls = s.status.as_str(),
            url = escape_html(&s.url),
            label = status_label(s.status),
            checked = last_checked,
            changes = s.change_history.len(),
            latest = latest_change,
            note = note,
        ));
    }
    if site_rows.is_empty() {
        site_rows = "<tr><td colspan=\"6\">No sites match this filter.</td></tr>".to_string();
    }

    let mut filter_links = String::new();
    for (value, label) in [
        (None, "All"),
        (Some(SiteStatus::Changed), "Changed"),
        (Some(SiteStatus::Unchanged), "Unchanged"),
        (Some(SiteStatus::Baseline), "Baseline"),
        (Some(SiteStatus::Uncertain), "Uncertain"),
    ] {
        let href = match value {
            Some(s) => format!("/?status={}", s.as_str()),
            None => "/".to_string(),
        };
        let active = if value == filter { " class=\"active\"" } else { "" };
        filter_links.push_str(&format!("<a href=\"{}\"{}>{}</a>", href, active, label));
    }

    let last_tick_str = status.last_tick_at.as_deref().unwrap_or("not yet");
    let uptime_str = format_uptime(status.uptime_secs);
    let mail_str = if status.notifications_enabled {
        "email"
    } else {
        "log only"
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Website Monitor</title>
<style>
  * {{ margin: 0; padding: 0; box-sizing: border-box; }}
  body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; background: #0f1117; color: #e0e0e0; padding: 20px; }}
  h1 {{ color: #58a6ff; margin-bottom: 8px; }}
  .meta {{ color: #8b949e; font-size: 0.85em; margin-bottom: 20px; }}
  .stats {{ display: flex; gap: 16px; margin-bottom: 24px; flex-wrap: wrap; }}
  .stat {{ background: #161b22; border: 1px solid #30363d; border-radius: 8px; padding: 16px 24px; text-align: center; min-width: 120px; }}
  .stat .val {{ display: block; font-size: 2em; font-weight: bold; color: #58a6ff; }}
  .stat .lbl {{ display: block; font-size: 0.85em; color: #8b949e; margin-top: 4px; }}
  .filters {{ margin-bottom: 16px; display: flex; gap: 12px; align-items: center; }}
  .filters a.active {{ font-weight: bold; text-decoration: underline; }}
  button {{ background: #238636; color: #fff; border: 0; border-radius: 6px; padding: 6px 14px; cursor: pointer; }}
  button:disabled {{ background: #30363d; cursor: wait; }}
  table {{ width: 100%; border-collapse: collapse; margin-bottom: 24px; }}
  th {{ background: #161b22; color: #8b949e; text-align: left; padding: 8px 12px; font-size: 0.85em; text-transform: uppercase; border-bottom: 1px solid #30363d; }}
  td {{ padding: 8px 12px; border-bottom: 1px solid #21262d; font-size: 0.9em; }}
  tr:hover {{ background: #161b22; }}
  tr.changed {{ background: #2d1b00; }}
  tr.unchanged td:nth-child(2) {{ color: #3fb950; }}
  tr.uncertain td:nth-child(2) {{ color: #58a6ff; }}
  td.err {{ color: #f85149; font-size: 0.8em; }}
  h2 {{ color: #c9d1d9; margin-bottom: 12px; font-size: 1.1em; }}
  a {{ color: #58a6ff; text-decoration: none; }}
  a:hover {{ text-decoration: underline; }}
</style>
</head>
<body>
  <h1>Website Monitor</h1>
  <p class="meta">Uptime: {uptime_str} &middot; Last scan: {last_tick_str} &middot; Poll interval: {poll_interval}s &middot; Notifications: {mail_str}</p>

  {stats_html}

  <div class="filters">{filter_links} <button id="scan" onclick="scanNow()">Scan now</button></div>

  <h2>Monitored Websites</h2>
  <table>
    <thead><tr><th>URL</th><th>Status</th><th>Last Checked</th><th>Changes</th><th>Latest Change</th><th>Error</th></tr></thead>
    <tbody>{site_rows}</tbody>
  </table>

  <script>
    function scanNow() {{
      const btn = document.getElementById('scan');
      btn.disabled = true;
      btn.textContent = 'Scanning...';
      fetch('/rpc/scan', {{ method: 'POST' }}).finally(() => location.reload());
    }}
    // Auto-refresh every 60 seconds
    setTimeout(() => location.reload(), 60000);
  </script>
</body>
</html>"#,
        uptime_str = uptime_str,
        last_tick_str = last_tick_str,
        poll_interval = status.poll_interval_secs,
        mail_str = mail_str,
        stats_html = stats_html,
        filter_links = filter_links,
        site_rows = site_rows,
    )
}

fn status_label(status: SiteStatus) -> &'static str {
    match status {
        SiteStatus::Changed => "Changed",
        SiteStatus::Unchanged => "Unchanged",
        SiteStatus::Baseline => "Baseline",
        SiteStatus::Uncertain => "Uncertain",
    }
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn format_uptime(secs: u64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status() -> ServiceStatus {
        ServiceStatus {
            running: true,
            uptime_secs: 3725,
            monitored_sites: 2,
            changed_sites: 1,
            uncertain_sites: 1,
            last_tick_at: None,
            last_scan: None,
            poll_interval_secs: 3600,
            notifications_enabled: false,
        }
    }

    #[test]
    fn test_rows_escape_urls_and_errors() {
        let mut site = MonitoredSite::unchecked("https://a.example/?q=<x>", None);
        site.last_error = Some("bad <html>".to_string());
        let html = render_dashboard(&[site], &status(), None);
        assert!(html.contains("https://a.example/?q=&lt;x&gt;"));
        assert!(html.contains("bad &lt;html&gt;"));
        assert!(html.contains("Uptime: 1h 2m 5s"));
        assert!(html.contains("Last scan: not yet"));
    }

    #[test]
    fn test_empty_filter_result() {
        let html = render_dashboard(&[], &status(), Some(SiteStatus::Changed));
        assert!(html.contains("No sites match this filter."));
        assert!(html.contains("<a href=\"/?status=changed\" class=\"active\">Changed</a>"));
    }

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(59), "59s");
        assert_eq!(format_uptime(61), "1m 1s");
        assert_eq!(format_uptime(7200), "2h 0m 0s");
    }
}
