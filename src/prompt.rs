/*!
 * Interactive decision capability.
 *
 * The classification engine depends on a [`DecisionPrompt`] injected by the
 * caller rather than reading stdin directly, so the engine stays testable
 * with a scripted decision source.
 */

use std::collections::VecDeque;
use std::io::{BufRead, Write};
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};

use crate::store::models::DecisionCommand;
use crate::subtitle_processor::Cue;

/// A synchronous, blocking source of keep/delete verdicts.
///
/// Processing of a document does not continue until the prompt answers.
pub trait DecisionPrompt: Send + Sync {
    /// Ask for a verdict on an undecided cue that matched `pattern`
    fn decide(&self, path: &Path, cue: &Cue, pattern: &str) -> Result<DecisionCommand>;
}

// Allows a shared prompt handle wherever an owned one is expected
impl<T: DecisionPrompt + ?Sized> DecisionPrompt for std::sync::Arc<T> {
    fn decide(&self, path: &Path, cue: &Cue, pattern: &str) -> Result<DecisionCommand> {
        (**self).decide(path, cue, pattern)
    }
}

/// Prompt implementation that asks the operator on the terminal
#[derive(Debug, Default)]
pub struct ConsolePrompt;

impl ConsolePrompt {
    /// Create a new console prompt
    pub fn new() -> Self {
        ConsolePrompt
    }
}

impl DecisionPrompt for ConsolePrompt {
    fn decide(&self, path: &Path, cue: &Cue, pattern: &str) -> Result<DecisionCommand> {
        let mut stderr = std::io::stderr().lock();

        // Surface the offending cue with its timing so the operator can judge it
        writeln!(
            stderr,
            "\n\x1B[1;33m{} matches '{}':\n{} --> {}\n\"{}\"\x1B[0m",
            path.display(),
            pattern,
            Cue::format_vtt_timestamp(cue.start_ms),
            Cue::format_vtt_timestamp(cue.end_ms),
            cue.text.trim()
        )?;
        write!(stderr, "Delete this text from now on? [y/N] ")?;
        stderr.flush()?;

        let mut answer = String::new();
        std::io::stdin()
            .lock()
            .read_line(&mut answer)
            .context("Failed to read decision from stdin")?;

        // An empty answer keeps the cue; only an explicit yes deletes
        if matches!(answer.trim().to_lowercase().as_str(), "y" | "yes") {
            Ok(DecisionCommand::Delete)
        } else {
            Ok(DecisionCommand::Keep)
        }
    }
}

/// Scripted prompt for tests and unattended runs: answers come from a fixed
/// queue, falling back to a default verdict when the queue runs dry
#[derive(Debug)]
pub struct ScriptedPrompt {
    /// Queued answers, consumed front to back
    answers: Mutex<VecDeque<DecisionCommand>>,

    /// Verdict returned once the queue is empty
    fallback: DecisionCommand,

    /// Trimmed texts this prompt was asked about, in order
    asked: Mutex<Vec<String>>,
}

impl ScriptedPrompt {
    /// Create a prompt that always answers with `fallback`
    pub fn always(fallback: DecisionCommand) -> Self {
        Self::with_answers(Vec::new(), fallback)
    }

    /// Create a prompt with a queue of answers and a fallback
    pub fn with_answers(answers: Vec<DecisionCommand>, fallback: DecisionCommand) -> Self {
        ScriptedPrompt {
            answers: Mutex::new(answers.into()),
            fallback,
            asked: Mutex::new(Vec::new()),
        }
    }

    /// Texts this prompt has been asked about so far
    pub fn asked_texts(&self) -> Vec<String> {
        self.asked.lock().unwrap().clone()
    }

    /// Number of prompts answered so far
    pub fn asked_count(&self) -> usize {
        self.asked.lock().unwrap().len()
    }
}

impl DecisionPrompt for ScriptedPrompt {
    fn decide(&self, _path: &Path, cue: &Cue, _pattern: &str) -> Result<DecisionCommand> {
        self.asked.lock().unwrap().push(cue.text.trim().to_string());

        let answer = self
            .answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.fallback);

        Ok(answer)
    }
}
