//! Interactive console controller.
//!
//! # Responsibility
//! - Read and echo lines on an injected input/output pair.
//! - Drive validated field collection and menu dispatch (`session`).
//! - Verify storage at startup and offer connection string remediation
//!   (`startup`).
//!
//! # Invariants
//! - Closed input ends the session: prompts that need an answer fail with
//!   `InputClosed`, and only `pause` accepts it as the awaited key press.
//! - Field validation failures re-prompt; they never abort a flow.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::{BufRead, Write};

pub mod fields;
pub mod session;
pub mod startup;

pub type ConsoleResult<T> = Result<T, ConsoleError>;

#[derive(Debug)]
pub enum ConsoleError {
    Io(std::io::Error),
    /// Input reached end-of-file while an answer was expected.
    InputClosed,
}

impl Display for ConsoleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "console I/O failed: {err}"),
            Self::InputClosed => write!(f, "console input closed"),
        }
    }
}

impl Error for ConsoleError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::InputClosed => None,
        }
    }
}

impl From<std::io::Error> for ConsoleError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Line-oriented terminal over any reader/writer pair.
pub struct Console<I, O> {
    input: I,
    output: O,
}

impl<I: BufRead, O: Write> Console<I, O> {
    pub fn new(input: I, output: O) -> Self {
        Self { input, output }
    }

    /// Writes `prompt` without a newline and reads one line.
    ///
    /// The trailing line break is stripped; other whitespace is kept.
    pub fn read_line(&mut self, prompt: &str) -> ConsoleResult<String> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(ConsoleError::InputClosed);
        }
        let trimmed_len = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed_len);
        Ok(line)
    }

    /// Writes one line.
    pub fn say(&mut self, line: impl Display) -> ConsoleResult<()> {
        writeln!(self.output, "{line}")?;
        Ok(())
    }

    pub fn blank_line(&mut self) -> ConsoleResult<()> {
        writeln!(self.output)?;
        Ok(())
    }

    /// Asks a yes/no question; only `y` or `yes` (any case) count as yes.
    pub fn confirm(&mut self, question: &str) -> ConsoleResult<bool> {
        let answer = self.read_line(&format!("{question} (y/n): "))?;
        Ok(is_affirmative(&answer))
    }

    /// Waits for Enter. Closed input counts as a key press.
    pub fn pause(&mut self, prompt: &str) -> ConsoleResult<()> {
        match self.read_line(prompt) {
            Ok(_) | Err(ConsoleError::InputClosed) => Ok(()),
            Err(err) => Err(err),
        }
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn into_parts(self) -> (I, O) {
        (self.input, self.output)
    }
}

/// Whether `answer` means yes.
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
