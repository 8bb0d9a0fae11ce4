//! Operator interaction
//!
//! The merge task and driver never touch the terminal directly. The binary
//! supplies a dialoguer-backed implementation; tests script the answers.

use crate::error::Result;

/// Questions the merge tooling asks the operator
pub trait Prompt: Send + Sync {
    /// Ask a yes/no question
    fn confirm(&self, message: &str) -> Result<bool>;

    /// Let the operator edit `text`
    ///
    /// Returns `None` when the editor was closed without saving.
    fn edit(&self, text: &str) -> Result<Option<String>>;
}
