use crate::Cli;
use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::process::Command;

pub const DEFAULT_REGION: &str = "us-central1";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Environment variables consulted for the project id, in order.
const PROJECT_ENV_VARS: [&str; 2] = ["GOOGLE_CLOUD_PROJECT", "CLOUDSDK_CORE_PROJECT"];

/// Final resolved configuration for gitsum.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub dir: PathBuf,
    pub project: String,
    pub region: String,
    pub model: String,
    pub staged_only: bool,
}

impl Config {
    /// Build the final config from CLI flags, environment, TOML file, and defaults.
    ///
    /// Precedence for the project id:
    ///   1. CLI flag (`--project`)
    ///   2. Env vars `GOOGLE_CLOUD_PROJECT`, then `CLOUDSDK_CORE_PROJECT`
    ///   3. TOML `~/.config/gitsum.toml`
    ///   4. `gcloud config get-value project`
    ///
    /// Region and model come from the CLI, then the TOML file, then the hardcoded defaults.
    pub fn from_sources(cli: &Cli) -> Result<Self> {
        let file_cfg = load_file_config().unwrap_or_default();
        Self::resolve(cli, file_cfg, |key| env::var(key).ok(), gcloud_default_project)
    }

    fn resolve<E, P>(
        cli: &Cli,
        file_cfg: FileConfig,
        env_lookup: E,
        default_project: P,
    ) -> Result<Self>
    where
        E: Fn(&str) -> Option<String>,
        P: FnOnce() -> Result<String>,
    {
        let project_env = PROJECT_ENV_VARS
            .iter()
            .find_map(|key| non_empty(env_lookup(key)));

        let project = match non_empty(cli.project.clone())
            .or(project_env)
            .or(non_empty(file_cfg.project))
        {
            Some(project) => project,
            None => default_project().context("no GCP project ID found")?,
        };

        let region = non_empty(cli.region.clone())
            .or(non_empty(file_cfg.region))
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        let model = non_empty(cli.model.clone())
            .or(non_empty(file_cfg.model))
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        Ok(Config {
            dir: PathBuf::from(&cli.dir),
            project,
            region,
            model,
            staged_only: cli.staged_only,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    pub project: Option<String>,
    pub region: Option<String>,
    pub model: Option<String>,
}

/// Return `~/.config/gitsum.toml`
fn config_path() -> Option<PathBuf> {
    let home = dirs::home_dir()?;
    Some(home.join(".config").join("gitsum.toml"))
}

fn load_file_config() -> Option<FileConfig> {
    let path = config_path()?;
    if !path.exists() {
        return None;
    }

    let data = fs::read_to_string(&path).ok()?;
    match toml::from_str::<FileConfig>(&data) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            log::warn!("Ignoring unreadable config {}: {e}", path.display());
            None
        }
    }
}

/// Ask gcloud for its configured default project.
fn gcloud_default_project() -> Result<String> {
    let output = Command::new("gcloud")
        .args(["config", "get-value", "project"])
        .output()
        .context("failed to run gcloud config get-value project (ensure gcloud is installed and configured)")?;

    if !output.status.success() {
        return Err(anyhow!(
            "gcloud config get-value project exited with status {:?}: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }

    let project = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if project.is_empty() {
        return Err(anyhow!(
            "no default project set (run: gcloud config set project PROJECT_ID)"
        ));
    }

    Ok(project)
}
