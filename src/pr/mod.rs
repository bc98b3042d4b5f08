pub mod diff;
pub mod github;
pub mod types;

pub use github::GitHubClient;
pub use types::{IssueComment, Participants, PullRequestRef};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PrError {
    #[error("GitHub API request failed: {0}")]
    ApiRequest(#[from] reqwest::Error),

    #[error("GitHub API returned {status} while trying to {operation}: {body}")]
    UnexpectedStatus {
        operation: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },
}

/// The source-hosting operations the summarizer needs.
///
/// Implemented by [`GitHubClient`] against the REST API and by in-memory
/// fakes in tests. Every method is a single round trip (listing may follow
/// pagination links) and every non-success response is an error.
#[async_trait]
pub trait PullRequestHost: Send + Sync {
    /// Raw unified diff of the PR.
    async fn fetch_diff(&self, pr: &PullRequestRef) -> Result<String, PrError>;

    /// Author and requested reviewers of the PR.
    async fn fetch_participants(&self, pr: &PullRequestRef) -> Result<Participants, PrError>;

    /// All conversation comments on the PR, oldest first.
    async fn list_comments(&self, pr: &PullRequestRef) -> Result<Vec<IssueComment>, PrError>;

    /// Append a new comment to the PR thread.
    async fn create_comment(
        &self,
        pr: &PullRequestRef,
        body: &str,
    ) -> Result<IssueComment, PrError>;

    /// Replace the body of an existing comment.
    async fn update_comment(
        &self,
        pr: &PullRequestRef,
        comment_id: u64,
        body: &str,
    ) -> Result<IssueComment, PrError>;
}
