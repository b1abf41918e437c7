use std::io::Write;
use std::process::{Command, Stdio};

use crate::error::SummarizerError;
use crate::model::ChunkResult;

use super::{ChunkSummarizer, SummaryRequest, build_prompt, parse_summary_response};

/// Runs an external program per chunk: the prompt goes to stdin, a JSON summary is
/// expected on stdout.
#[derive(Debug, Clone)]
pub struct CommandSummarizer {
    program: String,
    args: Vec<String>,
}

impl CommandSummarizer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Splits `program arg...` on whitespace.
    pub fn from_command_line(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self::new(program, parts.collect()))
    }
}

pub(crate) fn run_with_stdin(
    program: &str,
    args: &[String],
    input: &str,
) -> Result<String, SummarizerError> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|err| SummarizerError::Transient(format!("failed to spawn {program}: {err}")))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(input.as_bytes()).map_err(|err| {
            SummarizerError::Transient(format!("failed to write prompt to {program}: {err}"))
        })?;
    }

    let output = child
        .wait_with_output()
        .map_err(|err| SummarizerError::Transient(format!("failed to wait for {program}: {err}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SummarizerError::Transient(format!(
            "{program} exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

impl ChunkSummarizer for CommandSummarizer {
    fn name(&self) -> &'static str {
        "command"
    }

    fn summarize_chunk(
        &mut self,
        request: &SummaryRequest<'_>,
    ) -> Result<ChunkResult, SummarizerError> {
        let prompt = build_prompt(request);
        let stdout = run_with_stdin(&self.program, &self.args, &prompt)?;
        parse_summary_response(&stdout)
    }
}
