//! Quote snapshot for a ticker from the Yahoo Finance chart endpoint.

use super::{PropertySchema, Tool, ToolDefinition, ToolInputSchema, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

const CHART_ENDPOINT: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

pub struct StockDataTool {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct StockParams {
    symbol: String,
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: QuoteMeta,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteMeta {
    symbol: String,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    long_name: Option<String>,
    #[serde(default)]
    short_name: Option<String>,
    #[serde(default)]
    exchange_name: Option<String>,
    #[serde(default)]
    regular_market_price: Option<f64>,
    #[serde(default)]
    chart_previous_close: Option<f64>,
    #[serde(default)]
    fifty_two_week_high: Option<f64>,
    #[serde(default)]
    fifty_two_week_low: Option<f64>,
}

impl StockDataTool {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            endpoint: CHART_ENDPOINT.to_string(),
        }
    }

    async fn quote(&self, symbol: &str) -> Result<String, String> {
        let url = format!("{}/{}", self.endpoint, symbol);
        let response = self
            .client
            .get(&url)
            .query(&[("range", "1d"), ("interval", "1d")])
            .timeout(Duration::from_secs(30))
            .send()
            .await
            .map_err(|e| format!("Quote request failed: {}", e))?;

        // Unknown symbols come back as 404 with a chart.error body
        let body = response
            .text()
            .await
            .map_err(|e| format!("Failed to read quote response: {}", e))?;

        format_quote(&body)
    }
}

fn money(value: Option<f64>, currency: &str) -> String {
    match value {
        Some(v) => format!("{:.2} {}", v, currency),
        None => "n/a".to_string(),
    }
}

/// Summarise the chart metadata as a few Markdown lines.
pub(crate) fn format_quote(body: &str) -> Result<String, String> {
    let response: ChartResponse =
        serde_json::from_str(body).map_err(|e| format!("Failed to parse quote response: {}", e))?;

    if let Some(error) = response.chart.error {
        return Err(error.description);
    }
    let meta = response
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .map(|r| r.meta)
        .ok_or_else(|| "No quote data returned".to_string())?;

    let currency = meta.currency.as_deref().unwrap_or("");
    let name = meta
        .long_name
        .as_deref()
        .or(meta.short_name.as_deref())
        .unwrap_or(&meta.symbol);

    let mut out = format!("**{}** ({}", name, meta.symbol);
    if let Some(exchange) = &meta.exchange_name {
        out.push_str(&format!(", {}", exchange));
    }
    out.push_str(")\n");
    out.push_str(&format!("- Price: {}\n", money(meta.regular_market_price, currency)));
    out.push_str(&format!(
        "- Previous close: {}\n",
        money(meta.chart_previous_close, currency)
    ));
    if let (Some(price), Some(prev)) = (meta.regular_market_price, meta.chart_previous_close) {
        if prev != 0.0 {
            out.push_str(&format!("- Day change: {:+.2}%\n", (price - prev) / prev * 100.0));
        }
    }
    out.push_str(&format!(
        "- 52-week range: {} to {}\n",
        money(meta.fifty_two_week_low, currency),
        money(meta.fifty_two_week_high, currency)
    ));
    Ok(out)
}

#[async_trait]
impl Tool for StockDataTool {
    fn definition(&self) -> ToolDefinition {
        let mut properties = HashMap::new();
        properties.insert(
            "symbol".to_string(),
            PropertySchema::string("Ticker symbol, e.g. 'TSLA' or 'NIO'"),
        );

        ToolDefinition {
            name: "stock_data".to_string(),
            description: "Current stock price, previous close and 52-week range for a listed company.".to_string(),
            input_schema: ToolInputSchema {
                schema_type: "object".to_string(),
                properties,
                required: vec!["symbol".to_string()],
            },
        }
    }

    async fn execute(&self, params: Value) -> ToolResult {
        let params: StockParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return ToolResult::error(format!("Invalid parameters: {}", e)),
        };

        let symbol = params.symbol.trim().to_uppercase();
        if symbol.is_empty() || !symbol.chars().all(|c| c.is_ascii_alphanumeric() || ".-^=".contains(c)) {
            return ToolResult::error(format!("Invalid symbol '{}'", params.symbol));
        }

        match self.quote(&symbol).await {
            Ok(text) => ToolResult::success(text),
            Err(e) => ToolResult::error(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_quote() {
        let body = r#"{"chart": {"result": [{"meta": {
            "currency": "USD",
            "symbol": "TSLA",
            "exchangeName": "NMS",
            "longName": "Tesla, Inc.",
            "regularMarketPrice": 110.0,
            "chartPreviousClose": 100.0,
            "fiftyTwoWeekHigh": 299.29,
            "fiftyTwoWeekLow": 101.81
        }}], "error": null}}"#;

        let text = format_quote(body).unwrap();
        assert!(text.starts_with("**Tesla, Inc.** (TSLA, NMS)\n"));
        assert!(text.contains("- Price: 110.00 USD\n"));
        assert!(text.contains("- Day change: +10.00%\n"));
        assert!(text.contains("- 52-week range: 101.81 USD to 299.29 USD\n"));
    }

    #[test]
    fn test_format_quote_reports_chart_error() {
        let body = r#"{"chart": {"result": null, "error": {
            "code": "Not Found",
            "description": "No data found, symbol may be delisted"
        }}}"#;
        assert_eq!(
            format_quote(body).unwrap_err(),
            "No data found, symbol may be delisted"
        );
    }

    #[tokio::test]
    async fn test_execute_rejects_odd_symbols() {
        let tool = StockDataTool::new(reqwest::Client::new());
        let result = tool.execute(json!({"symbol": "TSLA/../x"})).await;
        assert!(!result.success);
        assert!(result.content.contains("Invalid symbol"));
    }
}
