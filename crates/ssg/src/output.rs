//! Colored terminal output utilities.

use std::fmt::Display;

use console::{Term, style};

/// Terminal output formatter.
pub(crate) struct Output {
    term: Term,
}

impl Output {
    /// Create a new output formatter.
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
        }
    }

    fn line(&self, msg: impl Display) {
        let _ = self.term.write_line(&msg.to_string());
    }

    /// Print an info message.
    pub(crate) fn info(&self, msg: &str) {
        self.line(msg);
    }

    /// Print a success message (green).
    pub(crate) fn success(&self, msg: &str) {
        self.line(style(msg).green());
    }

    /// Print a warning message (yellow).
    pub(crate) fn warning(&self, msg: &str) {
        self.line(style(msg).yellow());
    }

    /// Print an error message (red).
    pub(crate) fn error(&self, msg: &str) {
        self.line(style(msg).red());
    }
}
