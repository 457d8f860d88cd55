//! Turns agent replies into the Word report.

use crate::docx::{DocxBuilder, ParagraphStyle};
use crate::error::ReportError;
use crate::pipeline::ReportSection;
use chrono::{DateTime, Local};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

static TOOL_ECHO: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)Running:.*?\n\n").expect("valid tool echo regex"));
static TRANSFER_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:•|â€¢) transfer_task_to.*?\.\.\..*?\n").expect("valid transfer regex")
});
static LEADING_BLANK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\n").expect("valid leading blank regex"));

const SEPARATOR_WIDTH: usize = 50;

/// Strip tool-call chatter from a reply: `Running:` blocks up to the next
/// blank line, `• transfer_task_to ...` lines, and leading blank lines.
pub fn clean_output(text: &str) -> String {
    let cleaned = TOOL_ECHO.replace_all(text, "\n\n");
    let cleaned = TRANSFER_LINE.replace_all(&cleaned, "");
    let cleaned = LEADING_BLANK.replace(&cleaned, "");
    cleaned.trim().to_string()
}

/// Upper-case the first letter of every run of letters, lower-case the rest.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

pub fn report_title(topic: &str) -> String {
    format!("{} Industry Analysis Report", title_case(topic.trim()))
}

pub fn sanitize_file_stem(topic: &str) -> String {
    let stem: String = topic
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
        .collect();

    if stem.is_empty() {
        "report".to_string()
    } else {
        stem
    }
}

pub struct ReportDocument {
    pub title: String,
    pub generated_at: DateTime<Local>,
    pub sections: Vec<ReportSection>,
}

impl ReportDocument {
    pub fn new(title: impl Into<String>, sections: Vec<ReportSection>) -> Self {
        Self {
            title: title.into(),
            generated_at: Local::now(),
            sections,
        }
    }

    pub fn with_generated_at(mut self, generated_at: DateTime<Local>) -> Self {
        self.generated_at = generated_at;
        self
    }

    pub fn generated_line(&self) -> String {
        format!(
            "Generated on: {}",
            self.generated_at.format("%B %d, %Y at %I:%M %p")
        )
    }

    fn build(&self) -> DocxBuilder {
        let separator = "_".repeat(SEPARATOR_WIDTH);
        let mut doc = DocxBuilder::new();

        doc.paragraph(&self.title, ParagraphStyle::Title, true, true)
            .paragraph(&self.generated_line(), ParagraphStyle::Normal, true, false)
            .paragraph(&separator, ParagraphStyle::Normal, false, false);

        for section in &self.sections {
            let heading = format!("{} Analysis", section.section);
            doc.paragraph(&heading, ParagraphStyle::Heading1, false, true);

            let cleaned = clean_output(&section.content);
            doc.paragraph(&cleaned, ParagraphStyle::Normal, false, false)
                .paragraph(&separator, ParagraphStyle::Normal, false, false);
        }

        doc
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ReportError> {
        self.build().to_bytes()
    }

    pub fn file_name(&self, topic: &str) -> String {
        format!(
            "{}_market_analysis_{}.docx",
            sanitize_file_stem(topic),
            self.generated_at.format("%Y%m%d_%H%M")
        )
    }

    /// Write the report into `dir` (created if missing) and return its path.
    pub fn save(&self, dir: &Path, topic: &str) -> Result<PathBuf, ReportError> {
        std::fs::create_dir_all(dir).map_err(|e| ReportError::io(dir, e))?;

        let path = dir.join(self.file_name(topic));
        let bytes = self.to_bytes()?;
        std::fs::write(&path, bytes).map_err(|e| ReportError::io(&path, e))?;

        log::info!("[REPORT] Saved {}", path.display());
        Ok(path)
    }
}
