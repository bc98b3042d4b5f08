//! In-memory stand-ins for the hosting and generation APIs.

use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::pr::{IssueComment, Participants, PrError, PullRequestHost, PullRequestRef};
use crate::summary::{GenerationError, SummaryGenerator};

pub fn sample_pr() -> PullRequestRef {
    PullRequestRef {
        owner: "octo".to_string(),
        repo: "widgets".to_string(),
        number: 7,
    }
}

/// How many times each host operation was called.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostCalls {
    pub diffs: usize,
    pub participants: usize,
    pub lists: usize,
    pub creates: usize,
    pub updates: usize,
}

#[derive(Default)]
pub struct FakeHost {
    diff: String,
    participants: Participants,
    comments: Mutex<Vec<IssueComment>>,
    calls: Mutex<HostCalls>,
    fail_diff: bool,
    fail_list: bool,
}

impl FakeHost {
    pub fn with_comments(comments: Vec<IssueComment>) -> Self {
        Self {
            comments: Mutex::new(comments),
            ..Self::default()
        }
    }

    pub fn with_diff(mut self, diff: &str) -> Self {
        self.diff = diff.to_string();
        self
    }

    pub fn with_participants(mut self, author: &str, reviewers: &[&str]) -> Self {
        self.participants = Participants {
            author: author.to_string(),
            requested_reviewers: reviewers.iter().map(|r| r.to_string()).collect(),
        };
        self
    }

    pub fn failing_diff(mut self) -> Self {
        self.fail_diff = true;
        self
    }

    pub fn failing_list(mut self) -> Self {
        self.fail_list = true;
        self
    }

    pub fn comments(&self) -> Vec<IssueComment> {
        self.comments.lock().unwrap().clone()
    }

    pub fn calls(&self) -> HostCalls {
        *self.calls.lock().unwrap()
    }

    fn record(&self, f: impl FnOnce(&mut HostCalls)) {
        f(&mut self.calls.lock().unwrap());
    }
}

fn server_error(operation: &'static str) -> PrError {
    PrError::UnexpectedStatus {
        operation,
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: "boom".to_string(),
    }
}

#[async_trait]
impl PullRequestHost for FakeHost {
    async fn fetch_diff(&self, _pr: &PullRequestRef) -> Result<String, PrError> {
        self.record(|c| c.diffs += 1);
        if self.fail_diff {
            return Err(server_error("fetch the PR diff"));
        }
        Ok(self.diff.clone())
    }

    async fn fetch_participants(&self, _pr: &PullRequestRef) -> Result<Participants, PrError> {
        self.record(|c| c.participants += 1);
        Ok(self.participants.clone())
    }

    async fn list_comments(&self, _pr: &PullRequestRef) -> Result<Vec<IssueComment>, PrError> {
        self.record(|c| c.lists += 1);
        if self.fail_list {
            return Err(server_error("list PR comments"));
        }
        Ok(self.comments())
    }

    async fn create_comment(
        &self,
        _pr: &PullRequestRef,
        body: &str,
    ) -> Result<IssueComment, PrError> {
        self.record(|c| c.creates += 1);
        let mut comments = self.comments.lock().unwrap();
        let id = comments.iter().map(|c| c.id).max().unwrap_or(0) + 1;
        let created = IssueComment {
            id,
            body: body.to_string(),
        };
        comments.push(created.clone());
        Ok(created)
    }

    async fn update_comment(
        &self,
        _pr: &PullRequestRef,
        comment_id: u64,
        body: &str,
    ) -> Result<IssueComment, PrError> {
        self.record(|c| c.updates += 1);
        let mut comments = self.comments.lock().unwrap();
        let existing = comments
            .iter_mut()
            .find(|c| c.id == comment_id)
            .ok_or_else(|| server_error("update the PR comment"))?;
        existing.body = body.to_string();
        Ok(existing.clone())
    }
}

/// Replies with a fixed text, or with a malformed-response error when built
/// with [`FakeGenerator::malformed`]. Remembers every prompt it was sent.
pub struct FakeGenerator {
    reply: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl FakeGenerator {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Some(text.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn malformed() -> Self {
        Self {
            reply: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl SummaryGenerator for FakeGenerator {
    fn name(&self) -> &str {
        "fake"
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply
            .clone()
            .ok_or(GenerationError::MalformedResponse("candidates[0]"))
    }
}
