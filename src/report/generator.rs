//! Export rendering.
//!
//! This module renders an [`Analysis`] as Markdown, plain text or JSON.
//! Rendering is read-only: it never touches engine state.

use crate::config::ExportConfig;
use crate::models::{Analysis, ExportFormat, WhyQuestion};
use anyhow::{Context, Result};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Utc};
use std::fmt::Write as _;
use std::path::Path;

/// Default strftime pattern for human-readable timestamps.
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// Options that shape the human-readable renderings.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// strftime pattern for start and end times.
    pub timestamp_format: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
        }
    }
}

impl From<&ExportConfig> for RenderOptions {
    fn from(config: &ExportConfig) -> Self {
        Self {
            timestamp_format: config.timestamp_format.clone(),
        }
    }
}

impl RenderOptions {
    fn timestamp(&self, time: &DateTime<Utc>) -> String {
        let mut out = String::new();
        // An invalid pattern makes chrono's Display fail; fall back to RFC 3339.
        if write!(out, "{}", time.format(&self.timestamp_format)).is_err() {
            return time.to_rfc3339();
        }
        out
    }
}

/// Returns true if `pattern` is a usable strftime pattern.
pub fn is_valid_timestamp_format(pattern: &str) -> bool {
    !pattern.trim().is_empty()
        && !StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error))
}

/// Render an analysis in the requested format.
pub fn render(
    analysis: &Analysis,
    format: ExportFormat,
    options: &RenderOptions,
) -> serde_json::Result<String> {
    match format {
        ExportFormat::Json => generate_json_report(analysis),
        ExportFormat::Text => Ok(generate_text_report(analysis, options)),
        ExportFormat::Markdown => Ok(generate_markdown_report(analysis, options)),
    }
}

/// Generate the Markdown export.
pub fn generate_markdown_report(analysis: &Analysis, options: &RenderOptions) -> String {
    let mut output = String::new();

    output.push_str("# 5 Whys Analysis\n\n");
    output.push_str(&format!("**Problem:** {}\n\n", analysis.problem));
    output.push_str(&format!(
        "**Started:** {}\n",
        options.timestamp(&analysis.start_time)
    ));
    if let Some(ref end_time) = analysis.end_time {
        output.push_str(&format!("**Completed:** {}\n", options.timestamp(end_time)));
    }
    output.push_str(&format!("**Status:** {}\n\n", analysis.status_label()));

    output.push_str("## Analysis Steps\n\n");
    for (i, question) in analysis.questions.iter().enumerate() {
        output.push_str(&generate_markdown_step(i + 1, question));
    }

    if let Some(ref root_cause) = analysis.root_cause {
        output.push_str("## Root Cause\n\n");
        output.push_str(&format!("**{}**\n\n", root_cause));
    }

    output
}

fn generate_markdown_step(number: usize, question: &WhyQuestion) -> String {
    let mut block = format!("### {}. {}\n", number, question.question);
    match question.answer {
        Some(ref answer) => block.push_str(&format!("**Answer:** {}\n\n", answer)),
        None => block.push_str("*Awaiting answer...*\n\n"),
    }
    block
}

/// Generate the plain text export.
pub fn generate_text_report(analysis: &Analysis, options: &RenderOptions) -> String {
    let mut output = String::new();

    output.push_str("5 WHYS ANALYSIS\n");
    output.push_str("===============\n\n");
    output.push_str(&format!("Problem: {}\n", analysis.problem));
    output.push_str(&format!(
        "Started: {}\n",
        options.timestamp(&analysis.start_time)
    ));
    if let Some(ref end_time) = analysis.end_time {
        output.push_str(&format!("Completed: {}\n", options.timestamp(end_time)));
    }
    output.push_str(&format!("Status: {}\n\n", analysis.status_label()));

    output.push_str("ANALYSIS STEPS\n");
    output.push_str("--------------\n\n");
    for (i, question) in analysis.questions.iter().enumerate() {
        output.push_str(&format!("{}. {}\n", i + 1, question.question));
        match question.answer {
            Some(ref answer) => output.push_str(&format!("   Answer: {}\n\n", answer)),
            None => output.push_str("   Awaiting answer...\n\n"),
        }
    }

    if let Some(ref root_cause) = analysis.root_cause {
        output.push_str("ROOT CAUSE\n");
        output.push_str("----------\n");
        output.push_str(&format!("{}\n\n", root_cause));
    }

    output
}

/// Generate the JSON export.
pub fn generate_json_report(analysis: &Analysis) -> serde_json::Result<String> {
    serde_json::to_string_pretty(analysis)
}

/// Write rendered export data to a file.
pub fn write_export(content: &str, path: &Path) -> Result<()> {
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write export to {}", path.display()))
}
