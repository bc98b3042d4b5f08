use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Where the diff goes in a template.
pub const DIFF_PLACEHOLDER: &str = "{diff}";

const DEFAULT_TEMPLATE: &str = include_str!("../../prompts/summary.md");

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("template has no {{diff}} placeholder")]
    MissingPlaceholder,
}

/// Prompt text with a `{diff}` slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    text: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            text: DEFAULT_TEMPLATE.to_string(),
        }
    }
}

impl PromptTemplate {
    pub fn new(text: impl Into<String>) -> Result<Self, TemplateError> {
        let text = text.into();
        if !text.contains(DIFF_PLACEHOLDER) {
            return Err(TemplateError::MissingPlaceholder);
        }
        Ok(Self { text })
    }

    pub fn from_file(path: &Path) -> Result<Self, TemplateError> {
        let text = fs::read_to_string(path).map_err(|source| TemplateError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::new(text)
    }

    /// Fill the template with `diff`. The diff itself is inserted verbatim,
    /// so a `{diff}` inside the diff text is left alone.
    pub fn render(&self, diff: &str) -> String {
        self.text.replace(DIFF_PLACEHOLDER, diff)
    }
}
