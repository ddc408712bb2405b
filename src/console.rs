// src/console.rs
use std::collections::VecDeque;
use crate::router::DebugSink;
/// Default number of lines kept by the console.
pub const DEFAULT_CONSOLE_LINES: usize = 100;
/// Append-only text console that keeps only the most recent lines.
#[derive(Debug)]
pub struct ConsoleLog {
    lines: VecDeque<String>,
    capacity: usize,
}
impl ConsoleLog {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
        }
    }
    pub fn push(&mut self, line: impl Into<String>) {
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line.into());
    }
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }
    pub fn len(&self) -> usize {
        self.lines.len()
    }
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
    pub fn text(&self) -> String {
        self.lines().collect::<Vec<_>>().join("\n")
    }
}
impl Default for ConsoleLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CONSOLE_LINES)
    }
}
impl DebugSink for ConsoleLog {
    fn write_line(&mut self, line: String) {
        self.push(line);
    }
}
