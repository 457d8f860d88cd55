//! Web front-end for the report pipeline.
//!
//! `GET /` shows the topic form and recent reports, `POST /report` runs the
//! analysis and renders it, `GET /report/:id/download` returns the `.docx`,
//! and `POST /rpc/report/generate` is the JSON variant.

use crate::config::AnalysisMode;
use crate::docx::DOCX_MIME;
use crate::error::ReportError;
use crate::formatter::{ReportDocument, report_title};
use crate::pipeline::{ReportPipeline, ReportSection};
use axum::Json;
use axum::extract::{Form, Path, State};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;

const MAX_STORED_REPORTS: usize = 20;

// ===== RPC types =====

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> RpcResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub topic: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub id: String,
    pub topic: String,
    pub title: String,
    pub file_name: String,
    pub created_at: String,
    pub download_url: String,
    pub sections: Vec<ReportSection>,
}

// ===== State =====

struct StoredReport {
    summary: ReportSummary,
    bytes: Vec<u8>,
}

pub struct AppState {
    pipeline: ReportPipeline,
    mode: AnalysisMode,
    /// Oldest first, capped at `MAX_STORED_REPORTS`
    reports: Mutex<Vec<StoredReport>>,
    /// One analysis at a time
    run_lock: Mutex<()>,
}

impl AppState {
    pub fn new(pipeline: ReportPipeline, mode: AnalysisMode) -> Self {
        Self {
            pipeline,
            mode,
            reports: Mutex::new(Vec::new()),
            run_lock: Mutex::new(()),
        }
    }

    /// Run the analysis for `topic`, keep the document in memory, and return its summary.
    pub async fn generate(&self, topic: &str) -> Result<ReportSummary, ReportError> {
        let _guard = self.run_lock.lock().await;
        let topic = topic.trim();

        log::info!("[REPORT] Dashboard analysis requested for '{}'", topic);
        let sections = match self.mode {
            AnalysisMode::Pipeline => {
                self.pipeline
                    .run(topic, |done, total, status| {
                        log::info!("[REPORT] [{}/{}] {}", done, total, status)
                    })
                    .await?
            }
            AnalysisMode::Team => self.pipeline.run_team(topic).await?,
        };

        let document = ReportDocument::new(report_title(topic), sections);
        let bytes = document.to_bytes()?;
        let id = uuid::Uuid::new_v4().to_string();

        let summary = ReportSummary {
            download_url: format!("/report/{}/download", id),
            file_name: document.file_name(topic),
            created_at: document.generated_at.to_rfc3339(),
            title: document.title,
            topic: topic.to_string(),
            sections: document.sections,
            id,
        };

        let mut reports = self.reports.lock().await;
        reports.push(StoredReport {
            summary: summary.clone(),
            bytes,
        });
        if reports.len() > MAX_STORED_REPORTS {
            let excess = reports.len() - MAX_STORED_REPORTS;
            reports.drain(..excess);
        }

        Ok(summary)
    }

    async fn recent(&self) -> Vec<ReportSummary> {
        let reports = self.reports.lock().await;
        reports.iter().rev().map(|r| r.summary.clone()).collect()
    }

    async fn document(&self, id: &str) -> Option<(String, Vec<u8>)> {
        let reports = self.reports.lock().await;
        reports
            .iter()
            .find(|r| r.summary.id == id)
            .map(|r| (r.summary.file_name.clone(), r.bytes.clone()))
    }
}

// ===== Handlers =====

pub async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    let recent = state.recent().await;
    Html(render_page(None, None, &recent))
}

pub async fn generate_form(
    State(state): State<Arc<AppState>>,
    Form(req): Form<GenerateRequest>,
) -> Html<String> {
    let result = state.generate(&req.topic).await;
    let recent = state.recent().await;
    match result {
        Ok(report) => Html(render_page(Some(&report), None, &recent)),
        Err(e) => {
            log::error!("[REPORT] Error during analysis: {}", e);
            let message = format!("Error during analysis: {}", e);
            Html(render_page(None, Some(&message), &recent))
        }
    }
}

pub async fn generate_rpc(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GenerateRequest>,
) -> Json<RpcResponse<ReportSummary>> {
    match state.generate(&req.topic).await {
        Ok(report) => Json(RpcResponse::ok(report)),
        Err(e) => {
            log::error!("[REPORT] Error during analysis: {}", e);
            Json(RpcResponse::err(e.to_string()))
        }
    }
}

pub async fn download(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    match state.document(&id).await {
        Some((file_name, bytes)) => (
            [
                (header::CONTENT_TYPE, DOCX_MIME.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", file_name),
                ),
            ],
            bytes,
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "Report not found").into_response(),
    }
}

// ===== Rendering =====

pub fn render_page(
    report: Option<&ReportSummary>,
    error: Option<&str>,
    recent: &[ReportSummary],
) -> String {
    let topic_value = report.map(|r| escape_html(&r.topic)).unwrap_or_default();

    let error_html = error
        .map(|e| format!(r#"<div class="error">{}</div>"#, escape_html(e)))
        .unwrap_or_default();

    let report_html = match report {
        Some(r) => {
            let mut html = format!(
                r#"<h2>{title}</h2><p class="meta">Generated {created} &middot; <a class="download" href="{url}">Download Full Report</a></p>"#,
                title = escape_html(&r.title),
                created = escape_html(&r.created_at),
                url = r.download_url,
            );
            for s in &r.sections {
                html.push_str(&format!(
                    r#"<details open><summary>{section} <span class="agent">{agent}</span></summary><pre>{content}</pre></details>"#,
                    section = escape_html(&s.section),
                    agent = escape_html(&s.agent),
                    content = escape_html(&s.content),
                ));
            }
            html
        }
        None => String::new(),
    };

    let mut recent_rows = String::new();
    for r in recent {
        recent_rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td><a href=\"{}\">{}</a></td></tr>\n",
            escape_html(&r.topic),
            escape_html(&r.created_at),
            r.download_url,
            escape_html(&r.file_name),
        ));
    }
    if recent_rows.is_empty() {
        recent_rows = "<tr><td colspan=\"3\">No reports yet.</td></tr>".to_string();
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Business Analysis System</title>
<style>
  * {{ margin: 0; padding: 0; box-sizing: border-box; }}
  body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; background: #0f1117; color: #e0e0e0; padding: 20px; }}
  h1 {{ color: #58a6ff; margin-bottom: 8px; }}
  h2 {{ color: #c9d1d9; margin: 20px 0 8px; font-size: 1.1em; }}
  .meta {{ color: #8b949e; font-size: 0.85em; margin-bottom: 16px; }}
  form {{ display: flex; gap: 12px; margin: 16px 0; }}
  input[type=text] {{ flex: 1; max-width: 480px; background: #161b22; color: #e0e0e0; border: 1px solid #30363d; border-radius: 6px; padding: 8px 12px; }}
  button {{ background: #238636; color: #fff; border: 0; border-radius: 6px; padding: 8px 16px; cursor: pointer; }}
  button:disabled {{ background: #30363d; cursor: wait; }}
  .error {{ background: #2d1117; border: 1px solid #f85149; color: #f85149; border-radius: 6px; padding: 12px; margin-bottom: 16px; }}
  details {{ background: #161b22; border: 1px solid #30363d; border-radius: 8px; margin-bottom: 12px; padding: 12px 16px; }}
  summary {{ cursor: pointer; font-weight: bold; color: #c9d1d9; }}
  summary .agent {{ color: #8b949e; font-weight: normal; font-size: 0.85em; margin-left: 8px; }}
  pre {{ white-space: pre-wrap; font-family: inherit; font-size: 0.9em; margin-top: 12px; }}
  table {{ width: 100%; border-collapse: collapse; margin-bottom: 24px; }}
  th {{ background: #161b22; color: #8b949e; text-align: left; padding: 8px 12px; font-size: 0.85em; text-transform: uppercase; border-bottom: 1px solid #30363d; }}
  td {{ padding: 8px 12px; border-bottom: 1px solid #21262d; font-size: 0.9em; }}
  a {{ color: #58a6ff; text-decoration: none; }}
  a:hover {{ text-decoration: underline; }}
</style>
</head>
<body>
  <h1>Business Analysis System</h1>
  <p class="meta">Generate comprehensive business analysis reports using AI agents</p>

  <form method="post" action="/report" onsubmit="document.getElementById('go').disabled = true; document.getElementById('go').textContent = 'Analyzing...';">
    <input type="text" name="topic" placeholder="What kind of company do you want to analyze?" value="{topic_value}" required>
    <button id="go" type="submit">Generate Analysis</button>
  </form>

  {error_html}
  {report_html}

  <h2>Recent Reports</h2>
  <table>
    <thead><tr><th>Topic</th><th>Generated</th><th>Document</th></tr></thead>
    <tbody>{recent_rows}</tbody>
  </table>
</body>
</html>"#,
        topic_value = topic_value,
        error_html = error_html,
        report_html = report_html,
        recent_rows = recent_rows,
    )
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::AgentKey;
    use crate::pipeline::testing::{ScriptedAgent, all_replying, scripted_pipeline};
    use axum::body::to_bytes;

    fn state(mode: AnalysisMode) -> Arc<AppState> {
        Arc::new(AppState::new(scripted_pipeline(&all_replying()), mode))
    }

    #[tokio::test]
    async fn test_generate_stores_downloadable_report() {
        let state = state(AnalysisMode::Pipeline);

        let report = state.generate(" drone delivery ").await.unwrap();

        assert_eq!(report.title, "Drone Delivery Industry Analysis Report");
        assert_eq!(report.sections.len(), 5);
        assert!(report.file_name.starts_with("drone_delivery_market_analysis_"));
        assert_eq!(report.download_url, format!("/report/{}/download", report.id));

        let response = download(State(state.clone()), Path(report.id.clone())).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], DOCX_MIME);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(body.starts_with(b"PK"));
    }

    #[tokio::test]
    async fn test_download_unknown_id_is_404() {
        let state = state(AnalysisMode::Pipeline);
        let response = download(State(state), Path("nope".to_string())).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_team_mode_produces_one_section() {
        let state = state(AnalysisMode::Team);
        let report = state.generate("solar").await.unwrap();
        assert_eq!(report.sections.len(), 1);
        assert_eq!(report.sections[0].agent, "Product Management Research Team");
    }

    #[tokio::test]
    async fn test_rpc_reports_agent_failure() {
        let mut agents = all_replying();
        agents[0] = (AgentKey::Web, Arc::new(ScriptedAgent::failing("Web Agent", "timeout")));
        let state = Arc::new(AppState::new(scripted_pipeline(&agents), AnalysisMode::Pipeline));

        let Json(resp) = generate_rpc(
            State(state.clone()),
            Json(GenerateRequest {
                topic: "solar".to_string(),
            }),
        )
        .await;

        assert!(!resp.success);
        assert_eq!(resp.error.as_deref(), Some("Web Agent failed: timeout"));
        assert!(state.recent().await.is_empty());
    }

    #[tokio::test]
    async fn test_store_is_capped() {
        let state = state(AnalysisMode::Team);
        for i in 0..MAX_STORED_REPORTS + 2 {
            state.generate(&format!("topic {}", i)).await.unwrap();
        }
        let recent = state.recent().await;
        assert_eq!(recent.len(), MAX_STORED_REPORTS);
        assert_eq!(recent[0].topic, format!("topic {}", MAX_STORED_REPORTS + 1));
    }

    #[test]
    fn test_render_page_escapes_content() {
        let report = ReportSummary {
            id: "1".to_string(),
            topic: "a<b".to_string(),
            title: "A<B Industry Analysis Report".to_string(),
            file_name: "ab_market_analysis_20240101_0000.docx".to_string(),
            created_at: "2024-01-01T00:00:00+00:00".to_string(),
            download_url: "/report/1/download".to_string(),
            sections: vec![ReportSection {
                section: "Industry News".to_string(),
                agent: "Web Agent".to_string(),
                content: "<script>alert(1)</script>".to_string(),
            }],
        };

        let html = render_page(Some(&report), None, std::slice::from_ref(&report));

        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(!html.contains("<script>alert(1)"));
        assert!(html.contains(r#"href="/report/1/download""#));
        assert!(html.contains("Industry News"));
    }

    #[test]
    fn test_render_page_shows_error() {
        let html = render_page(None, Some("Error during analysis: boom"), &[]);
        assert!(html.contains(r#"<div class="error">Error during analysis: boom</div>"#));
        assert!(html.contains("No reports yet."));
    }
}
