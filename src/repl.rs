//! Input handling for the chat loop.
//!
//! Kept separate from the binary so turn parsing stays testable without a
//! terminal attached.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};

/// Question asked when the user submits an empty line.
pub const FALLBACK_QUESTION: &str = "search for the weather in Quincy, MA now";

/// One parsed line of user input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TurnCommand {
    /// Leave the loop without invoking anything.
    Quit,
    /// Run a conversation turn with this question.
    Ask(String),
    /// Stdin is gone; run this one last turn, then leave the loop.
    FinalAsk(String),
}

/// Parses a raw input line into a turn command.
///
/// `quit`, `exit`, and `q` in any casing end the session. A blank line
/// falls back to [`FALLBACK_QUESTION`] so a bare Enter still demonstrates
/// a full turn.
#[must_use]
pub fn parse_turn(line: &str) -> TurnCommand {
    let trimmed = line.trim();
    if matches!(
        trimmed.to_ascii_lowercase().as_str(),
        "quit" | "exit" | "q"
    ) {
        return TurnCommand::Quit;
    }
    if trimmed.is_empty() {
        return TurnCommand::Ask(FALLBACK_QUESTION.to_string());
    }
    TurnCommand::Ask(trimmed.to_string())
}

/// Line source for the chat loop.
///
/// Owns its reader for the life of the loop: a buffered reader pulls every
/// byte already available on a pipe, so rebuilding one per read would drop
/// all but the first line of piped input.
pub struct ReplInput<R = BufReader<Stdin>> {
    reader: R,
}

impl ReplInput {
    /// Reads from the process stdin.
    #[must_use]
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R: AsyncBufRead + Unpin> ReplInput<R> {
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Reads one raw line, `None` on EOF or read failure.
    pub async fn read_line(&mut self) -> Option<String> {
        let mut line = String::new();
        match self.reader.read_line(&mut line).await {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
        }
    }

    /// Reads one line as a turn command. A closed or failing input
    /// substitutes the fallback question for one final turn, so piped input
    /// still demonstrates a complete run before exiting.
    pub async fn read_turn(&mut self) -> TurnCommand {
        match self.read_line().await {
            None => TurnCommand::FinalAsk(FALLBACK_QUESTION.to_string()),
            Some(line) => parse_turn(&line),
        }
    }
}
