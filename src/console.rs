//! Line-based terminal input and output.
//!
//! Everything the interactive program prints or reads goes through `Console`, which is generic
//! over its reader and writer so that whole sessions can be driven from a script in tests.
//!
//! `Console` is synchronous: reading a line blocks the thread, and so do the typing delay and the
//! loading pauses, which use `std::thread::sleep`. The interactive session is the only task running
//! on the runtime while the console waits, so nothing else is starved.

use crate::error::{typed, ErrorType};
use crate::Result;
use anyhow::Context;
use colored::{Color, Colorize};
use crossterm::cursor::MoveTo;
use crossterm::terminal::{Clear, ClearType};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, StdinLock, Stdout, Write};
use std::time::Duration;
use tracing::trace;

const PROMPT: &str = "> ";
const RULE: &str = "══════════════════════════════════════════════════════";

/// Cosmetic effects. None of these change what the program does, only how fast it says it.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pacing {
    /// Delay between characters of typed-out messages.
    pub typing_delay_ms: u64,
    /// Pause before moving to a new screen.
    pub loading_pause_ms: u64,
    /// Whether to clear the terminal when moving to a new screen.
    pub clear_screen: bool,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            typing_delay_ms: 50,
            loading_pause_ms: 1500,
            clear_screen: true,
        }
    }
}

impl Pacing {
    /// No delays and no screen clearing.
    pub const fn none() -> Self {
        Self {
            typing_delay_ms: 0,
            loading_pause_ms: 0,
            clear_screen: false,
        }
    }
}

pub struct Console<R, W> {
    input: R,
    output: W,
    pacing: Pacing,
}

impl Console<StdinLock<'static>, Stdout> {
    /// A console reading from stdin and writing to stdout.
    pub fn stdio(pacing: Pacing) -> Self {
        Self::new(std::io::stdin().lock(), std::io::stdout(), pacing)
    }
}

impl<R, W> Console<R, W>
where
    R: BufRead,
    W: Write,
{
    pub fn new(input: R, output: W, pacing: Pacing) -> Self {
        Self {
            input,
            output,
            pacing,
        }
    }

    #[cfg(test)]
    pub fn output(&self) -> &W {
        &self.output
    }

    /// Types out `text` followed by a newline.
    pub fn say(&mut self, text: &str) -> Result<()> {
        self.type_out(text, None)?;
        self.newline()
    }

    /// Prints an error in red, preceded by a blank line.
    pub fn error(&mut self, text: &str) -> Result<()> {
        self.newline()?;
        self.type_out(text, Some(Color::Red))?;
        self.newline()
    }

    /// Prints `text` immediately, without the typing effect.
    pub fn line(&mut self, text: &str) -> Result<()> {
        writeln!(self.output, "{text}").context("Unable to write to the terminal")
    }

    pub fn newline(&mut self) -> Result<()> {
        self.line("")
    }

    /// Prints a horizontal rule.
    pub fn rule(&mut self) -> Result<()> {
        self.line(RULE)
    }

    /// Prints `text` in green.
    pub fn green(&mut self, text: &str) -> Result<()> {
        let colored = text.green().to_string();
        self.line(&colored)
    }

    /// Prints a green section heading followed by a blank line.
    pub fn heading(&mut self, title: &str) -> Result<()> {
        self.green(&format!("◇─◇──◇── {title} ──◇──◇─◇"))?;
        self.newline()
    }

    /// Prints a numbered list of options, starting at 1.
    pub fn options<S>(&mut self, options: &[S]) -> Result<()>
    where
        S: AsRef<str>,
    {
        for (ix, option) in options.iter().enumerate() {
            self.line(&format!("    {}. {}", ix + 1, option.as_ref()))?;
        }
        Ok(())
    }

    /// Shows the prompt marker and reads one line of input without its line ending.
    ///
    /// # Errors
    /// - Returns an `ErrorType::InputClosed` error when the input has reached end-of-file.
    pub fn read_line(&mut self) -> Result<String> {
        write!(self.output, "{PROMPT}").context("Unable to write to the terminal")?;
        self.output
            .flush()
            .context("Unable to flush the terminal")?;
        let mut buf = String::new();
        let n = self
            .input
            .read_line(&mut buf)
            .context("Unable to read from the terminal")?;
        if n == 0 {
            return Err(typed(ErrorType::InputClosed, "Standard input was closed"));
        }
        let line = buf.trim_end_matches(['\n', '\r']).to_string();
        trace!("read input line '{line}'");
        Ok(line)
    }

    /// Prints `message`, then pauses and clears the screen.
    pub fn transition(&mut self, message: &str) -> Result<()> {
        self.newline()?;
        self.say(message)?;
        self.pause(1);
        self.clear()
    }

    /// Sleeps for `times` loading pauses.
    pub fn pause(&mut self, times: u32) {
        let ms = self.pacing.loading_pause_ms.saturating_mul(u64::from(times));
        if ms > 0 {
            std::thread::sleep(Duration::from_millis(ms));
        }
    }

    pub fn clear(&mut self) -> Result<()> {
        if !self.pacing.clear_screen {
            return Ok(());
        }
        crossterm::execute!(self.output, Clear(ClearType::All), MoveTo(0, 0))
            .context("Unable to clear the terminal")
    }

    fn type_out(&mut self, text: &str, color: Option<Color>) -> Result<()> {
        let delay = self.pacing.typing_delay_ms;
        if delay == 0 {
            let text = match color {
                Some(color) => text.color(color).to_string(),
                None => text.to_string(),
            };
            return write!(self.output, "{text}").context("Unable to write to the terminal");
        }
        for ch in text.chars() {
            let s = ch.to_string();
            let written = match color {
                Some(color) => write!(self.output, "{}", s.as_str().color(color)),
                None => write!(self.output, "{s}"),
            };
            written.context("Unable to write to the terminal")?;
            self.output
                .flush()
                .context("Unable to flush the terminal")?;
            std::thread::sleep(Duration::from_millis(delay));
        }
        Ok(())
    }
}
