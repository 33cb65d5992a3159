// ============================================================
// Layer 1 — Interactive Translation Loop
// ============================================================
// Two states:
//
//   AwaitingInput ──"exit" (any case) / EOF──► Terminated
//        │  ▲
//        └──┘  empty line → "Please enter a sentence."
//              sentence   → "Shakespearean: …"
//
// Reads from any BufRead and writes to any Write, so the loop
// runs against in-memory buffers in tests.

use anyhow::{Context, Result};
use std::io::{BufRead, Write};

use crate::domain::traits::Translator;

pub const INPUT_PROMPT: &str = "Enter a modern English sentence (or type 'exit' to quit): ";
pub const EMPTY_INPUT_REPLY: &str = "Please enter a sentence.";
pub const FAREWELL: &str = "Exiting translator. Fare thee well!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplState {
    AwaitingInput,
    Terminated,
}

/// What one line of user input means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplInput {
    Exit,
    Empty,
    Sentence(String),
}

impl ReplInput {
    pub fn classify(line: &str) -> Self {
        let text = line.trim();
        if text.eq_ignore_ascii_case("exit") {
            ReplInput::Exit
        } else if text.is_empty() {
            ReplInput::Empty
        } else {
            ReplInput::Sentence(text.to_string())
        }
    }
}

/// Prompt, read and translate until `exit` or end of input.
pub fn run_repl<R, W, T>(mut reader: R, mut writer: W, translator: &T) -> Result<()>
where
    R: BufRead,
    W: Write,
    T: Translator + ?Sized,
{
    let mut state = ReplState::AwaitingInput;
    while state == ReplState::AwaitingInput {
        state = step(&mut reader, &mut writer, translator)?;
    }
    Ok(())
}

fn step<R, W, T>(reader: &mut R, writer: &mut W, translator: &T) -> Result<ReplState>
where
    R: BufRead,
    W: Write,
    T: Translator + ?Sized,
{
    write!(writer, "\n{INPUT_PROMPT}")?;
    writer.flush()?;

    let mut line = String::new();
    let read = reader.read_line(&mut line).context("Cannot read from stdin")?;

    if read == 0 {
        tracing::debug!("End of input");
        writeln!(writer)?;
        writeln!(writer, "{FAREWELL}")?;
        return Ok(ReplState::Terminated);
    }

    match ReplInput::classify(&line) {
        ReplInput::Exit => {
            writeln!(writer, "{FAREWELL}")?;
            Ok(ReplState::Terminated)
        }
        ReplInput::Empty => {
            writeln!(writer, "{EMPTY_INPUT_REPLY}")?;
            Ok(ReplState::AwaitingInput)
        }
        ReplInput::Sentence(text) => {
            let translation = translator.translate(&text)?;
            writeln!(writer, "Shakespearean: {translation}\n")?;
            Ok(ReplState::AwaitingInput)
        }
    }
}
