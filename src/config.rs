use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::pr::diff::DEFAULT_MAX_DIFF_CHARS;
use crate::pr::PullRequestRef;
use crate::summary::prompt::{PromptTemplate, TemplateError};

pub const DEFAULT_CONFIG_PATH: &str = ".pr-summarizer.toml";
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
pub const DEFAULT_GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_FOOTER: &str = "*⏳ Updated automatically based on the latest commits.*";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {}", .0.join(", "))]
    Missing(Vec<&'static str>),

    #[error("REPO must look like owner/name, got {0:?}")]
    InvalidRepo(String),

    #[error("PR_NUMBER must be a positive integer, got {0:?}")]
    InvalidPrNumber(String),

    #[error("Failed to read config file {}: {source}", .path.display())]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid prompt template: {0}")]
    Template(#[from] TemplateError),

    #[error("summary.max_diff_chars must be greater than zero")]
    ZeroDiffLimit,

    #[error("http.timeout_secs must be greater than zero")]
    ZeroTimeout,
}

/// A credential that never shows up in `Debug` output or logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// The four values a run cannot start without, as handed over by the CLI
/// (flag or environment variable). Empty strings count as missing.
#[derive(Debug, Clone, Default)]
pub struct RequiredInputs {
    pub repo: Option<String>,
    pub pr_number: Option<String>,
    pub github_token: Option<String>,
    pub gemini_api_key: Option<String>,
}

/// Optional flag/env overrides that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub github_api_url: Option<String>,
    pub gemini_api_url: Option<String>,
    pub model: Option<String>,
    pub no_mentions: bool,
}

/// Optional settings loaded from .pr-summarizer.toml.
///
/// All fields are optional; the tool works with zero config.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub github: GitHubFileConfig,

    #[serde(default)]
    pub gemini: GeminiFileConfig,

    #[serde(default)]
    pub summary: SummaryFileConfig,

    #[serde(default)]
    pub http: HttpFileConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GitHubFileConfig {
    pub api_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeminiFileConfig {
    pub api_url: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SummaryFileConfig {
    /// Diff size limit in characters
    pub max_diff_chars: Option<usize>,
    /// Path to a prompt template containing a `{diff}` placeholder
    pub prompt_template: Option<PathBuf>,
    /// Notice printed under the marker in every comment
    pub footer: Option<String>,
    /// Tag the author and requested reviewers
    pub mentions: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpFileConfig {
    pub timeout_secs: Option<u64>,
}

impl FileConfig {
    /// Load from `path`, or defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<FileConfig, ConfigError> {
        if path.exists() {
            Self::load_from(path)
        } else {
            Ok(FileConfig::default())
        }
    }

    pub fn load_from(path: &Path) -> Result<FileConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&contents)?)
    }
}

#[derive(Debug, Clone)]
pub struct GitHubSettings {
    pub api_url: String,
    pub token: Secret,
}

#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub api_url: String,
    pub model: String,
    pub api_key: Secret,
}

#[derive(Debug, Clone)]
pub struct SummarySettings {
    pub max_diff_chars: usize,
    pub template: PromptTemplate,
    pub footer: String,
    pub mentions: bool,
}

/// Everything a run needs, resolved once at startup and passed down by
/// reference. Nothing below `main` reads the process environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub pr: PullRequestRef,
    pub github: GitHubSettings,
    pub gemini: GeminiSettings,
    pub summary: SummarySettings,
    pub http_timeout: Duration,
}

impl Settings {
    /// Check the required inputs, then merge overrides, file values, and
    /// defaults in that order of precedence.
    ///
    /// The required-input check runs first and reports every missing name
    /// at once.
    pub fn resolve(
        required: RequiredInputs,
        overrides: Overrides,
        file: FileConfig,
    ) -> Result<Settings, ConfigError> {
        let repo = present(required.repo);
        let pr_number = present(required.pr_number);
        let github_token = present(required.github_token);
        let gemini_api_key = present(required.gemini_api_key);

        let (Some(repo), Some(pr_number), Some(github_token), Some(gemini_api_key)) =
            (&repo, &pr_number, &github_token, &gemini_api_key)
        else {
            let missing = [
                ("REPO", repo.is_none()),
                ("PR_NUMBER", pr_number.is_none()),
                ("GITHUB_TOKEN", github_token.is_none()),
                ("GEMINI_API_KEY", gemini_api_key.is_none()),
            ]
            .into_iter()
            .filter_map(|(name, absent)| absent.then_some(name))
            .collect();
            return Err(ConfigError::Missing(missing));
        };

        let pr = parse_pr_ref(repo, pr_number)?;

        let max_diff_chars = file.summary.max_diff_chars.unwrap_or(DEFAULT_MAX_DIFF_CHARS);
        if max_diff_chars == 0 {
            return Err(ConfigError::ZeroDiffLimit);
        }

        let timeout_secs = file.http.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }

        let template = match &file.summary.prompt_template {
            Some(path) => PromptTemplate::from_file(path)?,
            None => PromptTemplate::default(),
        };

        Ok(Settings {
            pr,
            github: GitHubSettings {
                api_url: overrides
                    .github_api_url
                    .or(file.github.api_url)
                    .unwrap_or_else(|| DEFAULT_GITHUB_API_URL.to_string()),
                token: Secret::new(github_token.as_str()),
            },
            gemini: GeminiSettings {
                api_url: overrides
                    .gemini_api_url
                    .or(file.gemini.api_url)
                    .unwrap_or_else(|| DEFAULT_GEMINI_API_URL.to_string()),
                model: overrides
                    .model
                    .or(file.gemini.model)
                    .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
                api_key: Secret::new(gemini_api_key.as_str()),
            },
            summary: SummarySettings {
                max_diff_chars,
                template,
                footer: file
                    .summary
                    .footer
                    .unwrap_or_else(|| DEFAULT_FOOTER.to_string()),
                mentions: !overrides.no_mentions && file.summary.mentions.unwrap_or(true),
            },
            http_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Build a [`PullRequestRef`] from `owner/name` and a PR number.
pub fn parse_pr_ref(repo: &str, pr_number: &str) -> Result<PullRequestRef, ConfigError> {
    let (owner, name) = repo
        .split_once('/')
        .filter(|(owner, name)| !owner.is_empty() && !name.is_empty() && !name.contains('/'))
        .ok_or_else(|| ConfigError::InvalidRepo(repo.to_string()))?;

    let number = pr_number
        .parse::<u64>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| ConfigError::InvalidPrNumber(pr_number.to_string()))?;

    Ok(PullRequestRef {
        owner: owner.to_string(),
        repo: name.to_string(),
        number,
    })
}
