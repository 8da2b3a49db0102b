use log::debug;
use crate::config::Config;
use crate::llm::Summarizer;
use crate::llm::gemini::GeminiSummarizer;

/// Build the summarizer based on the resolved config.
pub fn build_summarizer(cfg: &Config) -> Box<dyn Summarizer> {
    debug!(
        "Using GeminiSummarizer with model {} in {}/{}",
        cfg.model, cfg.project, cfg.region
    );

    Box::new(GeminiSummarizer::from_config(cfg))
}
