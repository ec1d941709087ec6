//! Data models for the 5 whys interview.
//!
//! This module contains the core data structures shared by the engine,
//! the renderers and the tool layer.

use crate::error::AnalysisError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Number of questions in a complete interview.
pub const MAX_DEPTH: usize = 5;

/// One step of the interview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhyQuestion {
    /// Position in the interview (1-indexed).
    pub level: usize,
    /// Question text generated when the level was reached.
    pub question: String,
    /// Answer, present once the step has been answered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

impl WhyQuestion {
    /// Creates an unanswered question at the given level.
    pub fn new(level: usize, question: String) -> Self {
        Self {
            level,
            question,
            answer: None,
        }
    }

    /// Returns true once an answer has been attached.
    pub fn is_answered(&self) -> bool {
        self.answer.is_some()
    }
}

/// A full interview from problem statement to root cause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub id: Uuid,
    /// Trimmed problem statement.
    pub problem: String,
    /// Questions ordered by level.
    pub questions: Vec<WhyQuestion>,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    pub is_complete: bool,
    /// The level-5 answer, set on completion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_cause: Option<String>,
}

impl Analysis {
    /// Creates a fresh, incomplete analysis with no questions.
    pub fn new(problem: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            problem,
            questions: Vec::new(),
            start_time: Utc::now(),
            end_time: None,
            is_complete: false,
            root_cause: None,
        }
    }

    /// Returns the question recorded at `level`, if any.
    pub fn question_at(&self, level: usize) -> Option<&WhyQuestion> {
        level
            .checked_sub(1)
            .and_then(|index| self.questions.get(index))
            .filter(|q| q.level == level)
    }

    pub(crate) fn question_at_mut(&mut self, level: usize) -> Option<&mut WhyQuestion> {
        level
            .checked_sub(1)
            .and_then(|index| self.questions.get_mut(index))
            .filter(|q| q.level == level)
    }

    /// Number of questions that have an answer.
    pub fn answered_count(&self) -> usize {
        self.questions.iter().filter(|q| q.is_answered()).count()
    }

    /// Human-readable completion status.
    pub fn status_label(&self) -> &'static str {
        if self.is_complete {
            "Complete"
        } else {
            "In Progress"
        }
    }
}

/// Output format for exports.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// Plain text format
    Text,
    /// JSON format
    Json,
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Markdown => write!(f, "markdown"),
            ExportFormat::Text => write!(f, "text"),
            ExportFormat::Json => write!(f, "json"),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "markdown" | "md" => Ok(ExportFormat::Markdown),
            "text" | "txt" => Ok(ExportFormat::Text),
            "json" => Ok(ExportFormat::Json),
            other => Err(format!(
                "Invalid format '{}'. Expected one of: markdown, json, text",
                other
            )),
        }
    }
}

/// Uniform result shape returned to callers of the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<Analysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_question: Option<String>,
    /// Rendered export, only set by a successful export.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_data: Option<String>,
}

impl AnalysisResult {
    /// A successful result with only a message.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            analysis: None,
            next_question: None,
            export_data: None,
        }
    }

    /// A negative result carrying the error's message.
    pub fn failure(error: &AnalysisError) -> Self {
        Self {
            success: false,
            message: error.to_string(),
            analysis: None,
            next_question: None,
            export_data: None,
        }
    }

    pub fn with_analysis(mut self, analysis: Analysis) -> Self {
        self.analysis = Some(analysis);
        self
    }

    pub fn with_next_question(mut self, question: Option<String>) -> Self {
        self.next_question = question;
        self
    }

    pub fn with_export_data(mut self, data: String) -> Self {
        self.export_data = Some(data);
        self
    }

    /// Folds an engine outcome into the non-throwing result shape.
    pub fn from_outcome(outcome: Result<AnalysisResult, AnalysisError>) -> Self {
        outcome.unwrap_or_else(|e| Self::failure(&e))
    }
}
