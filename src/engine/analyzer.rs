//! The 5 whys state machine.
//!
//! [`AnalysisEngine`] owns at most one analysis and moves it through the
//! fixed five-level question/answer sequence. Every operation is synchronous
//! and takes `&mut self` (or `&self` for reads), so callers sharing an engine
//! across tasks must serialize access themselves.

use crate::engine::questions::question_for_level;
use crate::error::AnalysisError;
use crate::models::{Analysis, AnalysisResult, ExportFormat, WhyQuestion, MAX_DEPTH};
use crate::report::{self, RenderOptions};
use chrono::Utc;
use tracing::{debug, info, warn};

/// Mutable state behind the engine.
#[derive(Debug, Clone, Default)]
pub struct EngineState {
    /// The single live analysis, if any.
    pub current_analysis: Option<Analysis>,
    /// Level awaiting an answer; 0 when no analysis is active.
    pub current_level: usize,
    pub is_waiting_for_answer: bool,
}

/// Drives one analysis at a time.
#[derive(Debug, Default)]
pub struct AnalysisEngine {
    state: EngineState,
    render_options: RenderOptions,
}

impl AnalysisEngine {
    /// Create an engine with default render options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine that renders exports with the given options.
    pub fn with_render_options(render_options: RenderOptions) -> Self {
        Self {
            state: EngineState::default(),
            render_options,
        }
    }

    /// Read-only view of the engine state.
    pub fn state(&self) -> &EngineState {
        &self.state
    }

    /// Start a new analysis for `problem`.
    pub fn start(&mut self, problem: &str) -> Result<AnalysisResult, AnalysisError> {
        if self
            .state
            .current_analysis
            .as_ref()
            .is_some_and(|a| !a.is_complete)
        {
            debug!("Refusing to start: analysis already in progress");
            return Err(AnalysisError::AlreadyInProgress);
        }

        let problem = problem.trim();
        if problem.is_empty() {
            return Err(AnalysisError::EmptyProblem);
        }

        let mut analysis = Analysis::new(problem.to_string());
        let first_question = question_for_level(1, None);
        analysis
            .questions
            .push(WhyQuestion::new(1, first_question.clone()));

        info!("Started analysis {}: {}", analysis.id, analysis.problem);

        self.state = EngineState {
            current_analysis: Some(analysis.clone()),
            current_level: 1,
            is_waiting_for_answer: true,
        };

        Ok(AnalysisResult::ok(
            "Analysis started successfully. Please answer the first 'why' question.",
        )
        .with_analysis(analysis)
        .with_next_question(Some(first_question)))
    }

    /// Record an answer for the current level and advance.
    pub fn answer_why(&mut self, answer: &str) -> Result<AnalysisResult, AnalysisError> {
        let level = self.state.current_level;
        let waiting = self.state.is_waiting_for_answer;

        let Some(analysis) = self.state.current_analysis.as_mut() else {
            return Err(AnalysisError::NoAnalysisInProgress);
        };

        if !waiting {
            return Err(AnalysisError::NotWaitingForAnswer);
        }

        let answer = answer.trim();
        if answer.is_empty() {
            return Err(AnalysisError::EmptyAnswer);
        }

        let Some(question) = analysis.question_at_mut(level) else {
            warn!("No question recorded for level {}", level);
            return Err(AnalysisError::InternalStateError(format!(
                "current question not found at level {}",
                level
            )));
        };
        question.answer = Some(answer.to_string());
        debug!("Recorded answer for level {}/{}", level, MAX_DEPTH);

        if level >= MAX_DEPTH {
            analysis.is_complete = true;
            analysis.end_time = Some(Utc::now());
            analysis.root_cause = Some(answer.to_string());
            self.state.is_waiting_for_answer = false;

            info!("Analysis {} complete, root cause: {}", analysis.id, answer);

            return Ok(AnalysisResult::ok(
                "Analysis complete! You have identified the root cause.",
            )
            .with_analysis(analysis.clone()));
        }

        let next_level = level + 1;
        let next_question = question_for_level(next_level, Some(answer));
        analysis
            .questions
            .push(WhyQuestion::new(next_level, next_question.clone()));
        self.state.current_level = next_level;

        Ok(AnalysisResult::ok(format!(
            "Answer recorded. Please answer the next 'why' question ({}/{}).",
            next_level, MAX_DEPTH
        ))
        .with_analysis(analysis.clone())
        .with_next_question(Some(next_question)))
    }

    /// Report the current analysis and the question awaiting an answer.
    pub fn get_current_state(&self) -> Result<AnalysisResult, AnalysisError> {
        let analysis = self
            .state
            .current_analysis
            .as_ref()
            .ok_or(AnalysisError::NoAnalysisInProgress)?;

        let next_question = if self.state.is_waiting_for_answer {
            analysis
                .question_at(self.state.current_level)
                .map(|q| q.question.clone())
        } else {
            None
        };

        let message = if analysis.is_complete {
            "Analysis is complete.".to_string()
        } else {
            let mut message = format!(
                "Analysis in progress ({}/{}).",
                self.state.current_level, MAX_DEPTH
            );
            if self.state.is_waiting_for_answer {
                message.push_str(" Waiting for answer.");
            }
            message
        };

        Ok(AnalysisResult::ok(message)
            .with_analysis(analysis.clone())
            .with_next_question(next_question))
    }

    /// Render the current analysis, complete or not.
    pub fn export_analysis(
        &self,
        format: ExportFormat,
    ) -> Result<AnalysisResult, AnalysisError> {
        let analysis = self
            .state
            .current_analysis
            .as_ref()
            .ok_or(AnalysisError::NoAnalysisToExport)?;

        let export_data = report::render(analysis, format, &self.render_options).map_err(|e| {
            AnalysisError::InternalStateError(format!("failed to render {}: {}", format, e))
        })?;

        debug!(
            "Exported analysis {} as {} ({} bytes)",
            analysis.id,
            format,
            export_data.len()
        );

        Ok(
            AnalysisResult::ok(format!("Analysis exported as {}.", format))
                .with_analysis(analysis.clone())
                .with_export_data(export_data),
        )
    }

    /// Discard the current analysis. Always succeeds.
    pub fn reset_analysis(&mut self) -> AnalysisResult {
        if let Some(ref analysis) = self.state.current_analysis {
            info!("Discarding analysis {}", analysis.id);
        }
        self.state = EngineState::default();

        AnalysisResult::ok("Analysis reset successfully. You can start a new analysis.")
    }
}
