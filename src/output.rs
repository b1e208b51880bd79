//! Line-oriented output
//!
//! Every observable action of the crate is a single line of text handed to an [Output].
//! The core never writes to the console or to files by itself: the caller injects the sink.

use tracing::trace;

/// A sink accepting lines of text
pub trait Output {
    /// Emit a single line
    fn emit(&mut self, line: &str);
}

impl<O> Output for &mut O
where
    O: Output + ?Sized,
{
    #[inline]
    fn emit(&mut self, line: &str) {
        (**self).emit(line)
    }
}

/// Standard output
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Console;

impl Output for Console {
    fn emit(&mut self, line: &str) {
        trace!(line, "console");
        println!("{line}");
    }
}

/// In-memory sink, it keeps every emitted line in order
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Recorder {
    lines: Vec<String>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The lines emitted so far
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Drop the recorded lines and return them
    pub fn take(&mut self) -> Vec<String> {
        std::mem::take(&mut self.lines)
    }
}

impl Output for Recorder {
    fn emit(&mut self, line: &str) {
        self.lines.push(line.to_owned());
    }
}
