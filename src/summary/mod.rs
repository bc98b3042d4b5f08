pub mod gemini;
pub mod prompt;

pub use gemini::GeminiClient;

use async_trait::async_trait;
use thiserror::Error;

/// Any of these aborts the run before a comment is written.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("generation API returned {status}: {body}")]
    UnexpectedStatus {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("generation response is missing {0}")]
    MalformedResponse(&'static str),

    #[error("generation response text is empty")]
    EmptySummary,
}

/// A text-completion backend.
///
/// One attempt per call; no retries. Implementations must return an error
/// rather than partial text when the response is not what they expect.
#[async_trait]
pub trait SummaryGenerator: Send + Sync {
    /// Short name used in logs (e.g., "gemini-2.5-flash")
    fn name(&self) -> &str;

    /// Send `prompt` and return the generated text.
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}
