//! Terminal styling helpers
//!
//! Output goes through anstream, which strips ANSI codes when the stream is
//! not a color-capable terminal.

use indicatif::ProgressStyle;
use owo_colors::{OwoColorize, Style, Styled};
use std::fmt;

/// Semantic styles used across commands
pub trait Stylize {
    /// Secondary information
    fn muted(&self) -> Styled<&Self>;
    /// Names worth highlighting (branches, PR numbers)
    fn accent(&self) -> Styled<&Self>;
    /// Headings
    fn emphasis(&self) -> Styled<&Self>;
    /// Positive outcome
    fn success(&self) -> Styled<&Self>;
    /// Recoverable problem
    fn warn(&self) -> Styled<&Self>;
    /// Failure
    fn error(&self) -> Styled<&Self>;
}

impl<T: fmt::Display> Stylize for T {
    fn muted(&self) -> Styled<&Self> {
        self.style(Style::new().dimmed())
    }

    fn accent(&self) -> Styled<&Self> {
        self.style(Style::new().cyan())
    }

    fn emphasis(&self) -> Styled<&Self> {
        self.style(Style::new().bold())
    }

    fn success(&self) -> Styled<&Self> {
        self.style(Style::new().green())
    }

    fn warn(&self) -> Styled<&Self> {
        self.style(Style::new().yellow())
    }

    fn error(&self) -> Styled<&Self> {
        self.style(Style::new().red())
    }
}

/// Success marker
pub const fn check() -> &'static str {
    "√"
}

/// Failure marker
pub const fn cross() -> &'static str {
    "!"
}

/// Spinner used while waiting on GitHub or git
pub fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
}

/// Render `url` as a clickable link where the terminal supports it
pub fn hyperlink(text: &str, url: &str) -> String {
    if supports_hyperlinks::on(supports_hyperlinks::Stream::Stderr) {
        terminal_link::Link::new(text, url).to_string()
    } else {
        url.to_string()
    }
}
