use clap::Parser;

/// CLI options
#[derive(Parser, Debug)]
#[command(
    name = "gitsum",
    about = "Generate git commit message summaries using Gemini",
    after_help = "Project resolution order:\n  \
        1. --project flag\n  \
        2. GOOGLE_CLOUD_PROJECT env var\n  \
        3. CLOUDSDK_CORE_PROJECT env var\n  \
        4. project in ~/.config/gitsum.toml\n  \
        5. gcloud config get-value project\n\n\
        Authentication:\n  \
        Run 'gcloud auth application-default login' to authenticate.\n\n\
        Example:\n  \
        git commit -m \"$(gitsum)\""
)]
pub struct Cli {
    /// Print version and exit
    #[arg(short = 'v', long = "version")]
    pub version: bool,

    /// Git repository directory
    #[arg(short = 'd', long = "dir", default_value = ".")]
    pub dir: String,

    /// GCP project ID (default: gcloud config project)
    #[arg(short = 'p', long = "project")]
    pub project: Option<String>,

    /// GCP region [default: us-central1]
    #[arg(short = 'r', long = "region")]
    pub region: Option<String>,

    /// Gemini model name [default: gemini-2.5-flash]
    #[arg(short = 'm', long = "model")]
    pub model: Option<String>,

    /// Only include staged changes
    #[arg(long)]
    pub staged_only: bool,

    /// Print diff stats and model info to stderr
    #[arg(long)]
    pub verbose: bool,

    /// Debug mode: log the prompt preview and raw model response
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Logger verbosity derived from `--verbose` / `--debug`.
    pub fn verbosity(&self) -> u8 {
        if self.debug {
            2
        } else if self.verbose {
            1
        } else {
            0
        }
    }
}
