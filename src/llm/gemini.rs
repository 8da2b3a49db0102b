use super::prompts::SYSTEM_INSTRUCTION;
use super::Summarizer;
use crate::cancel::{CancelToken, Interrupted, run_cancellable};
use crate::config::Config;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::process::Command;
use std::time::Duration;
use thiserror::Error;

/// Sampling temperature; kept low so repeated runs read alike.
const TEMPERATURE: f64 = 0.3;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("creating Vertex AI client: {0}")]
    Credentials(String),

    #[error("creating Vertex AI client")]
    ClientBuild(#[source] reqwest::Error),

    #[error("generating content")]
    Request(#[source] reqwest::Error),

    #[error("generating content: HTTP {} - {body}", .status.as_u16())]
    Http { status: StatusCode, body: String },

    #[error("decoding model response")]
    Decode(#[source] serde_json::Error),

    #[error("empty response from model")]
    EmptyResponse,

    #[error("generation cancelled")]
    Cancelled,

    #[error("running generation call")]
    Worker(#[source] Interrupted),
}

/// Request/response structs for the Vertex AI `generateContent` method.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    system_instruction: Content,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<u32>,
    candidates_token_count: Option<u32>,
    total_token_count: Option<u32>,
}

impl GenerateRequest {
    fn new(prompt: &str) -> Self {
        GenerateRequest {
            contents: vec![Content {
                role: Some("user".into()),
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: Some(SYSTEM_INSTRUCTION.to_string()),
                }],
            },
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
            },
        }
    }
}

/// Gemini on Vertex AI, authenticated with the ambient gcloud credentials.
#[derive(Debug, Clone)]
pub struct GeminiSummarizer {
    project: String,
    region: String,
    model: String,
}

impl GeminiSummarizer {
    pub fn new(
        project: impl Into<String>,
        region: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        GeminiSummarizer {
            project: project.into(),
            region: region.into(),
            model: model.into(),
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(&cfg.project, &cfg.region, &cfg.model)
    }

    fn endpoint(&self) -> String {
        let host = if self.region == "global" {
            "aiplatform.googleapis.com".to_string()
        } else {
            format!("{}-aiplatform.googleapis.com", self.region)
        };

        format!(
            "https://{host}/v1/projects/{project}/locations/{region}/publishers/google/models/{model}:generateContent",
            project = self.project,
            region = self.region,
            model = self.model
        )
    }

    fn generate(&self, prompt: &str) -> Result<String, SummarizeError> {
        let token = access_token()?;
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(SummarizeError::ClientBuild)?;

        let url = self.endpoint();
        log::info!("Calling Gemini model {:?} in {}", self.model, self.region);

        let resp = client
            .post(&url)
            .bearer_auth(token)
            .header("x-goog-user-project", &self.project)
            .json(&GenerateRequest::new(prompt))
            .send()
            .map_err(SummarizeError::Request)?;

        let status = resp.status();
        let text = resp.text().map_err(SummarizeError::Request)?;
        if !status.is_success() {
            return Err(SummarizeError::Http { status, body: text });
        }

        log::debug!("Gemini raw JSON response: {}", truncate(&text, 2000));

        let parsed: GenerateResponse =
            serde_json::from_str(&text).map_err(SummarizeError::Decode)?;
        first_candidate_text(parsed)
    }
}

impl Summarizer for GeminiSummarizer {
    fn summarize(&self, cancel: &CancelToken, prompt: &str) -> anyhow::Result<String> {
        let this = self.clone();
        let prompt = prompt.to_string();

        // the HTTP client lives and dies inside the worker
        let result = run_cancellable(cancel, move || this.generate(&prompt));
        match result {
            Ok(summary) => Ok(summary?),
            Err(Interrupted::Cancelled) => Err(SummarizeError::Cancelled.into()),
            Err(e) => Err(SummarizeError::Worker(e).into()),
        }
    }

    fn describe(&self) -> String {
        format!("{} ({}, {})", self.model, self.project, self.region)
    }
}

/// Pull the first candidate's text out of a response.
fn first_candidate_text(resp: GenerateResponse) -> Result<String, SummarizeError> {
    if let Some(usage) = &resp.usage_metadata {
        log::debug!(
            "Token usage: prompt={}, completion={}, total={}",
            usage.prompt_token_count.unwrap_or_default(),
            usage.candidates_token_count.unwrap_or_default(),
            usage.total_token_count.unwrap_or_default()
        );
    }

    let candidate = resp
        .candidates
        .into_iter()
        .next()
        .ok_or(SummarizeError::EmptyResponse)?;

    if let Some(reason) = &candidate.finish_reason {
        log::debug!("Finish reason: {reason}");
    }

    candidate
        .content
        .and_then(|content| content.parts.into_iter().find_map(|part| part.text))
        .map(|text| text.trim().to_string())
        .ok_or(SummarizeError::EmptyResponse)
}

/// Fetch a bearer token from the application-default credentials.
fn access_token() -> Result<String, SummarizeError> {
    let output = Command::new("gcloud")
        .args(["auth", "application-default", "print-access-token"])
        .output()
        .map_err(|e| SummarizeError::Credentials(format!("failed to run gcloud: {e}")))?;

    if !output.status.success() {
        return Err(SummarizeError::Credentials(format!(
            "gcloud auth application-default print-access-token failed: {} \
             (run: gcloud auth application-default login)",
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if token.is_empty() {
        return Err(SummarizeError::Credentials(
            "gcloud returned an empty access token".into(),
        ));
    }

    Ok(token)
}

/// Truncate long strings for debug logging.
fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}...\n[truncated {} bytes]", &s[..cut], s.len() - cut),
    }
}
