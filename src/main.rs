mod comment;
mod config;
mod pipeline;
mod pr;
mod summary;
#[cfg(test)]
mod testing;

use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error, info, info_span, Instrument};
use tracing_subscriber::EnvFilter;

use comment::UpsertOutcome;
use config::{FileConfig, Overrides, RequiredInputs, Settings, DEFAULT_CONFIG_PATH};

/// PR Summarizer: summarizes a GitHub Pull Request diff with Gemini and keeps
/// one bot comment on the PR up to date with the result.
///
/// Meant to run from a pull_request workflow. Serialize runs per PR (e.g. a
/// `concurrency` group keyed on the PR number) so two runs never race to
/// create the comment.
#[derive(Parser, Debug)]
#[command(name = "pr-summarizer", version, about)]
struct Cli {
    /// Repository in owner/name form
    #[arg(long, env = "REPO")]
    repo: Option<String>,

    /// Pull request number
    #[arg(long, env = "PR_NUMBER")]
    pr_number: Option<String>,

    /// GitHub token with pull-request read and issue-comment write access
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    github_token: Option<String>,

    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    gemini_api_key: Option<String>,

    /// Optional TOML config file
    #[arg(long, env = "PR_SUMMARIZER_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// GitHub REST API base URL (GitHub Enterprise, proxies)
    #[arg(long, env = "GITHUB_API_URL")]
    github_api_url: Option<String>,

    /// Gemini API base URL
    #[arg(long, env = "GEMINI_API_URL")]
    gemini_api_url: Option<String>,

    /// Gemini model name
    #[arg(long, env = "GEMINI_MODEL")]
    model: Option<String>,

    /// Do not tag the author and requested reviewers
    #[arg(long)]
    no_mentions: bool,

    /// Print the comment instead of posting it
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let span = info_span!("pr_summarize", repo = cli.repo.as_deref().unwrap_or_default());

    match run(cli).instrument(span).await {
        Ok(outcome) => {
            if let UpsertOutcome::DryRun { body, .. } = &outcome {
                println!("{body}");
                println!();
            }
            println!("{} {}", "✓".green().bold(), outcome);
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "run aborted");
            eprintln!("{} {}", "error:".red().bold(), err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<UpsertOutcome, Box<dyn std::error::Error>> {
    info!("loading configuration");
    let required = RequiredInputs {
        repo: cli.repo,
        pr_number: cli.pr_number,
        github_token: cli.github_token,
        gemini_api_key: cli.gemini_api_key,
    };
    let overrides = Overrides {
        github_api_url: cli.github_api_url,
        gemini_api_url: cli.gemini_api_url,
        model: cli.model,
        no_mentions: cli.no_mentions,
    };
    let file = FileConfig::load(&cli.config)?;
    let settings = Settings::resolve(required, overrides, file)?;
    debug!(
        pr = %settings.pr,
        github_api = %settings.github.api_url,
        model = %settings.gemini.model,
        max_diff_chars = settings.summary.max_diff_chars,
        mentions = settings.summary.mentions,
        "resolved settings"
    );

    let host = pr::GitHubClient::new(
        &settings.github.api_url,
        settings.github.token.clone(),
        settings.http_timeout,
    )?;
    let generator = summary::GeminiClient::new(
        &settings.gemini.api_url,
        &settings.gemini.model,
        settings.gemini.api_key.clone(),
        settings.http_timeout,
    )?;

    info!("running pipeline");
    let outcome = pipeline::run(&settings, &host, &generator, cli.dry_run).await?;
    Ok(outcome)
}
