pub mod gemini;
mod prompts;
pub mod prompt_builder;

use crate::cancel::CancelToken;
use anyhow::Result;

/// Trait for talking to a generation model.
pub trait Summarizer {
    /// Generate a commit message summary for a fully built prompt.
    ///
    /// Implementations must return promptly once `cancel` fires.
    fn summarize(&self, cancel: &CancelToken, prompt: &str) -> Result<String>;

    /// Short description for diagnostics, e.g. the model name.
    fn describe(&self) -> String;
}
