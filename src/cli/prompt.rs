//! Terminal-backed operator prompts

use devinfra::error::{Error, Result};
use devinfra::prompt::Prompt;
use dialoguer::{Confirm, Editor};

/// Prompts on the controlling terminal with dialoguer
pub struct TerminalPrompt;

impl Prompt for TerminalPrompt {
    fn confirm(&self, message: &str) -> Result<bool> {
        Confirm::new()
            .with_prompt(message)
            .default(false)
            .interact()
            .map_err(|e| Error::Internal(format!("prompt failed: {e}")))
    }

    fn edit(&self, text: &str) -> Result<Option<String>> {
        Editor::new()
            .edit(text)
            .map_err(|e| Error::Internal(format!("editor failed: {e}")))
    }
}
