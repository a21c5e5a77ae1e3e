//! stdout/stdin abstractions consumed by the `stdio.h` builtins.
//!
//! `PrintWriter` abstracts stdout behind a small trait instead of calling `std::io::stdout()`
//! directly, so `printf`/`putchar` can be exercised against an in-memory collector in tests.
//! `StdinReader` is the symmetric trait for `scanf`/`getchar`.

use std::{
    borrow::Cow,
    collections::VecDeque,
    io::{self, Write as _},
};

use crate::error::{CError, CResult};

/// Trait for handling output from the `printf`/`putchar` builtins.
///
/// Implement this trait to capture or redirect program output.
pub trait PrintWriter {
    /// Writes a chunk of already-formatted text to stdout.
    fn stdout_write(&mut self, output: Cow<'_, str>) -> CResult<()>;

    /// Writes a single character to stdout (used by `putchar`).
    fn stdout_push(&mut self, ch: char) -> CResult<()>;
}

/// Default `PrintWriter` that writes straight to the process's stdout.
#[derive(Debug, Default)]
pub struct StdPrint;

impl PrintWriter for StdPrint {
    fn stdout_write(&mut self, output: Cow<'_, str>) -> CResult<()> {
        io::stdout().write_all(output.as_bytes()).map_err(|e| CError::runtime(format!("stdout write error: {e}")))?;
        io::stdout().flush().map_err(|e| CError::runtime(format!("stdout flush error: {e}")))
    }

    fn stdout_push(&mut self, ch: char) -> CResult<()> {
        let mut buf = [0_u8; 4];
        self.stdout_write(Cow::Borrowed(ch.encode_utf8(&mut buf)))
    }
}

/// A `PrintWriter` that collects all output into a string.
///
/// Useful for testing or capturing program output programmatically.
#[derive(Debug, Default)]
pub struct CollectStringPrint(String);

impl CollectStringPrint {
    #[must_use]
    pub fn new() -> Self {
        Self(String::new())
    }

    #[must_use]
    pub fn output(&self) -> &str {
        self.0.as_str()
    }

    #[must_use]
    pub fn into_output(self) -> String {
        self.0
    }
}

impl PrintWriter for CollectStringPrint {
    fn stdout_write(&mut self, output: Cow<'_, str>) -> CResult<()> {
        self.0.push_str(&output);
        Ok(())
    }

    fn stdout_push(&mut self, ch: char) -> CResult<()> {
        self.0.push(ch);
        Ok(())
    }
}

/// `PrintWriter` that discards all output.
#[derive(Debug, Default)]
pub struct NoPrint;

impl PrintWriter for NoPrint {
    fn stdout_write(&mut self, _output: Cow<'_, str>) -> CResult<()> {
        Ok(())
    }

    fn stdout_push(&mut self, _ch: char) -> CResult<()> {
        Ok(())
    }
}

/// Trait for satisfying the `scanf`/`getchar` builtins' stdin reads.
pub trait StdinReader {
    /// Returns the next whitespace-delimited token, skipping leading whitespace.
    ///
    /// # Errors
    /// Returns `CError::Runtime` ("exhausted stdin") if no more input is available.
    fn next_token(&mut self) -> CResult<String>;

    /// Returns the next raw character, without skipping whitespace.
    ///
    /// # Errors
    /// Returns `CError::Runtime` ("exhausted stdin") if no more input is available.
    fn next_char(&mut self) -> CResult<char>;
}

/// Default `StdinReader` that reads from the process's stdin, one line at a time.
#[derive(Debug, Default)]
pub struct StdinRead {
    buffer: VecDeque<char>,
}

impl StdinRead {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn fill(&mut self) -> CResult<bool> {
        let mut line = String::new();
        let n = io::stdin().read_line(&mut line).map_err(|e| CError::runtime(format!("stdin read error: {e}")))?;
        if n == 0 {
            return Ok(false);
        }
        self.buffer.extend(line.chars());
        Ok(true)
    }
}

impl StdinReader for StdinRead {
    fn next_token(&mut self) -> CResult<String> {
        loop {
            while matches!(self.buffer.front(), Some(c) if c.is_whitespace()) {
                self.buffer.pop_front();
            }
            if self.buffer.front().is_some() {
                break;
            }
            if !self.fill()? {
                return Err(CError::runtime("exhausted stdin"));
            }
        }
        let mut token = String::new();
        while matches!(self.buffer.front(), Some(c) if !c.is_whitespace()) {
            token.push(self.buffer.pop_front().expect("checked non-empty"));
        }
        Ok(token)
    }

    fn next_char(&mut self) -> CResult<char> {
        loop {
            if let Some(c) = self.buffer.pop_front() {
                return Ok(c);
            }
            if !self.fill()? {
                return Err(CError::runtime("exhausted stdin"));
            }
        }
    }
}

/// `StdinReader` backed by a fixed in-memory string, for tests and embedding.
#[derive(Debug, Default)]
pub struct FixedStdin {
    buffer: VecDeque<char>,
}

impl FixedStdin {
    #[must_use]
    pub fn new(input: &str) -> Self {
        Self { buffer: input.chars().collect() }
    }
}

impl StdinReader for FixedStdin {
    fn next_token(&mut self) -> CResult<String> {
        while matches!(self.buffer.front(), Some(c) if c.is_whitespace()) {
            self.buffer.pop_front();
        }
        if self.buffer.is_empty() {
            return Err(CError::runtime("exhausted stdin"));
        }
        let mut token = String::new();
        while matches!(self.buffer.front(), Some(c) if !c.is_whitespace()) {
            token.push(self.buffer.pop_front().expect("checked non-empty"));
        }
        Ok(token)
    }

    fn next_char(&mut self) -> CResult<char> {
        self.buffer.pop_front().ok_or_else(|| CError::runtime("exhausted stdin"))
    }
}

/// `StdinReader` that always reports stdin as exhausted; used when a program is known not to
/// read input.
#[derive(Debug, Default)]
pub struct NoStdin;

impl StdinReader for NoStdin {
    fn next_token(&mut self) -> CResult<String> {
        Err(CError::runtime("exhausted stdin"))
    }

    fn next_char(&mut self) -> CResult<char> {
        Err(CError::runtime("exhausted stdin"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_stdin_splits_whitespace_delimited_tokens() {
        let mut stdin = FixedStdin::new("  12   34\n56");
        assert_eq!(stdin.next_token().unwrap(), "12");
        assert_eq!(stdin.next_token().unwrap(), "34");
        assert_eq!(stdin.next_token().unwrap(), "56");
        assert!(stdin.next_token().is_err());
    }

    #[test]
    fn fixed_stdin_next_char_does_not_skip_whitespace() {
        let mut stdin = FixedStdin::new(" a");
        assert_eq!(stdin.next_char().unwrap(), ' ');
        assert_eq!(stdin.next_char().unwrap(), 'a');
    }

    #[test]
    fn collect_string_print_accumulates_output() {
        let mut writer = CollectStringPrint::new();
        writer.stdout_write(Cow::Borrowed("ab")).unwrap();
        writer.stdout_push('c').unwrap();
        assert_eq!(writer.output(), "abc");
    }
}
