// SPDX-License-Identifier: GPL-3.0-only

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

/// Asks the operator whether a destructive step may go ahead
pub trait Confirm {
    fn confirm(&mut self, description: &str) -> bool;
}

/// Blocking yes/no prompt on a terminal. Anything but `y`/`yes` declines, as does EOF.
pub struct ConsolePrompt<R, W> {
    input: R,
    output: W,
}

impl ConsolePrompt<io::StdinLock<'static>, io::Stderr> {
    /// Read answers from stdin, write prompts to stderr so stdout stays machine-readable
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> ConsolePrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Confirm for ConsolePrompt<R, W> {
    fn confirm(&mut self, description: &str) -> bool {
        let prompt = write!(self.output, "{description} [y/N] ").and_then(|_| self.output.flush());
        if prompt.is_err() {
            return false;
        }

        let mut answer = String::new();
        match self.input.read_line(&mut answer) {
            Ok(0) | Err(_) => false,
            Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
        }
    }
}

/// Pre-recorded answers, consumed in order; declines once they run out
#[derive(Debug, Default)]
pub struct ScriptedConfirm {
    answers: VecDeque<bool>,
    pub prompts: Vec<String>,
}

impl ScriptedConfirm {
    pub fn new(answers: impl IntoIterator<Item = bool>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            prompts: Vec::new(),
        }
    }
}

impl Confirm for ScriptedConfirm {
    fn confirm(&mut self, description: &str) -> bool {
        self.prompts.push(description.to_string());
        self.answers.pop_front().unwrap_or(false)
    }
}
