//! Interactive market report: asks for a company idea, runs the agents and
//! saves the report as a Word document.

use market_report::ai::AiClient;
use market_report::config::{AnalysisMode, ReportConfig};
use market_report::error::ReportError;
use market_report::formatter::{ReportDocument, report_title, title_case};
use market_report::pipeline::ReportPipeline;
use market_report::tools::ToolRegistry;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    env_logger::init();

    if let Err(e) = run().await {
        println!("Error during analysis: {}", e);
        println!("Try narrowing the industry scope or checking the input format.");
    }
}

async fn run() -> Result<(), ReportError> {
    let config = ReportConfig::from_env()?;
    let http = reqwest::Client::builder()
        .pool_idle_timeout(Duration::from_secs(90))
        .build()
        .map_err(|e| ReportError::Config(format!("Failed to create HTTP client: {}", e)))?;
    let client = AiClient::from_config(&config, http.clone())?;
    let tools = Arc::new(ToolRegistry::with_builtins(http));
    let pipeline = ReportPipeline::from_client(&client, tools);

    let topic = prompt_topic()?;
    println!("\n=== {} Industry Analysis ===\n", title_case(topic.trim()));

    let path = generate(&pipeline, &config, &topic).await?;
    println!("\nDetailed report saved as: {}", path.display());
    Ok(())
}

fn prompt_topic() -> Result<String, ReportError> {
    print!("What kind of company do you want to create? ");
    io::stdout()
        .flush()
        .map_err(|e| ReportError::Config(format!("stdout: {}", e)))?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| ReportError::Config(format!("stdin: {}", e)))?;
    Ok(line.trim().to_string())
}

async fn generate(
    pipeline: &ReportPipeline,
    config: &ReportConfig,
    topic: &str,
) -> Result<PathBuf, ReportError> {
    let sections = match config.mode {
        AnalysisMode::Pipeline => {
            pipeline
                .run(topic, |done, total, status| {
                    if done < total {
                        println!("[{}/{}] {}", done + 1, total, status);
                    } else {
                        println!("{}", status);
                    }
                })
                .await?
        }
        AnalysisMode::Team => {
            println!("Running the research team...");
            pipeline.run_team(topic).await?
        }
    };

    for section in &sections {
        println!("\n--- {} ({}) ---\n{}", section.section, section.agent, section.content);
    }

    let document = ReportDocument::new(report_title(topic), sections);
    document.save(&config.output_dir, topic)
}
