//! Interactive terminal session.
//!
//! Runs the interview against any line-oriented input, so the same loop
//! serves a TTY and scripted tests.

use crate::engine::AnalysisEngine;
use crate::mcp::tools::format_result;
use crate::models::{AnalysisResult, ExportFormat, MAX_DEPTH};
use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use tracing::debug;

/// Options for one interactive session.
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// Problem to start with instead of prompting for one.
    pub problem: Option<String>,
    /// Format of the export produced when the session ends.
    pub format: ExportFormat,
}

enum Command<'a> {
    State,
    Reset,
    Quit,
    Text(&'a str),
}

impl<'a> Command<'a> {
    fn parse(line: &'a str) -> Self {
        match line.trim() {
            ":state" => Command::State,
            ":reset" => Command::Reset,
            ":quit" | ":q" => Command::Quit,
            _ => Command::Text(line),
        }
    }
}

/// Drive an interview from `input`, echoing prompts to `output`.
///
/// Returns the rendered export if an analysis exists when the session ends.
pub fn run_session<R: BufRead, W: Write>(
    engine: &mut AnalysisEngine,
    mut input: R,
    mut output: W,
    options: &SessionOptions,
) -> Result<Option<String>> {
    writeln!(output, "🔍 5 Whys Analysis")?;
    writeln!(
        output,
        "   Commands: :state (show progress), :reset (start over), :quit (stop)\n"
    )?;

    let mut pending_problem = options.problem.clone();

    loop {
        if engine.state().current_analysis.is_none() {
            let problem = match pending_problem.take() {
                Some(problem) => problem,
                None => {
                    write!(output, "Describe the problem: ")?;
                    output.flush()?;
                    match read_line(&mut input)? {
                        Some(line) => line,
                        None => break,
                    }
                }
            };

            match Command::parse(&problem) {
                Command::Quit => break,
                Command::State | Command::Reset => {
                    writeln!(output, "❌ No analysis in progress.")?;
                }
                Command::Text(text) => {
                    if let Err(e) = engine.start(text) {
                        writeln!(output, "❌ {}", e)?;
                    }
                }
            }
            continue;
        }

        if !engine.state().is_waiting_for_answer {
            break;
        }

        let level = engine.state().current_level;
        let question = engine
            .get_current_state()
            .ok()
            .and_then(|r| r.next_question)
            .unwrap_or_default();
        write!(output, "\n[{}/{}] {}\n> ", level, MAX_DEPTH, question)?;
        output.flush()?;

        let Some(line) = read_line(&mut input)? else {
            break;
        };

        match Command::parse(&line) {
            Command::Quit => break,
            Command::State => {
                let result = AnalysisResult::from_outcome(engine.get_current_state());
                writeln!(output, "{}", format_result(&result))?;
            }
            Command::Reset => {
                let result = engine.reset_analysis();
                writeln!(output, "✅ {}", result.message)?;
            }
            Command::Text(answer) => match engine.answer_why(answer) {
                Ok(result) => {
                    if let Some(root_cause) = result.analysis.and_then(|a| a.root_cause) {
                        writeln!(output, "\n🎯 Root cause identified: {}", root_cause)?;
                    }
                }
                Err(e) => writeln!(output, "❌ {}", e)?,
            },
        }
    }

    let export = match engine.export_analysis(options.format) {
        Ok(result) => result.export_data,
        Err(e) => {
            debug!("Nothing to export: {}", e);
            None
        }
    };

    Ok(export)
}

fn read_line<R: BufRead>(input: &mut R) -> Result<Option<String>> {
    let mut line = String::new();
    let read = input
        .read_line(&mut line)
        .context("Failed to read from input")?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}
