use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, ACCEPT, LINK};
use reqwest::{Method, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use super::types::{IssueComment, Participants, PullRequestRef};
use super::{PrError, PullRequestHost};
use crate::config::Secret;

const USER_AGENT: &str = concat!("pr-summarizer/", env!("CARGO_PKG_VERSION"));
const DIFF_MEDIA_TYPE: &str = "application/vnd.github.v3.diff";
const JSON_MEDIA_TYPE: &str = "application/vnd.github+json";
const API_VERSION: &str = "2022-11-28";
const COMMENTS_PER_PAGE: &str = "100";

/// GitHub REST client scoped to what the summarizer needs.
pub struct GitHubClient {
    client: reqwest::Client,
    api_url: String,
    token: Secret,
}

#[derive(Deserialize)]
struct User {
    login: String,
}

#[derive(Deserialize)]
struct PullMetadata {
    #[serde(alias = "author")]
    user: User,
    #[serde(default)]
    requested_reviewers: Vec<User>,
}

#[derive(Serialize)]
struct CommentPayload<'a> {
    body: &'a str,
}

impl GitHubClient {
    pub fn new(api_url: &str, token: Secret, timeout: Duration) -> Result<Self, PrError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn pull_url(&self, pr: &PullRequestRef) -> String {
        format!("{}/repos/{}/pulls/{}", self.api_url, pr.full_name(), pr.number)
    }

    fn comments_url(&self, pr: &PullRequestRef) -> String {
        format!("{}/repos/{}/issues/{}/comments", self.api_url, pr.full_name(), pr.number)
    }

    fn comment_url(&self, pr: &PullRequestRef, comment_id: u64) -> String {
        format!("{}/repos/{}/issues/comments/{}", self.api_url, pr.full_name(), comment_id)
    }

    fn request(&self, method: Method, url: &str, accept: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(self.token.expose())
            .header(ACCEPT, accept)
            .header("X-GitHub-Api-Version", API_VERSION)
    }
}

#[async_trait]
impl PullRequestHost for GitHubClient {
    #[instrument(skip(self), fields(pr = %pr))]
    async fn fetch_diff(&self, pr: &PullRequestRef) -> Result<String, PrError> {
        let response = self
            .request(Method::GET, &self.pull_url(pr), DIFF_MEDIA_TYPE)
            .send()
            .await?;
        let diff = ensure_success(response, "fetch the PR diff").await?.text().await?;
        debug!(diff_bytes = diff.len(), "received PR diff");
        Ok(diff)
    }

    #[instrument(skip(self), fields(pr = %pr))]
    async fn fetch_participants(&self, pr: &PullRequestRef) -> Result<Participants, PrError> {
        let response = self
            .request(Method::GET, &self.pull_url(pr), JSON_MEDIA_TYPE)
            .send()
            .await?;
        let metadata: PullMetadata = ensure_success(response, "fetch PR metadata")
            .await?
            .json()
            .await?;
        let participants = Participants {
            author: metadata.user.login,
            requested_reviewers: metadata
                .requested_reviewers
                .into_iter()
                .map(|user| user.login)
                .collect(),
        };
        debug!(
            author = %participants.author,
            reviewers = participants.requested_reviewers.len(),
            "received PR participants"
        );
        Ok(participants)
    }

    #[instrument(skip(self), fields(pr = %pr))]
    async fn list_comments(&self, pr: &PullRequestRef) -> Result<Vec<IssueComment>, PrError> {
        let mut comments = Vec::new();
        let mut url = format!("{}?per_page={}&page=1", self.comments_url(pr), COMMENTS_PER_PAGE);
        let mut visited = HashSet::new();

        loop {
            visited.insert(url.clone());
            let response = self.request(Method::GET, &url, JSON_MEDIA_TYPE).send().await?;
            let response = ensure_success(response, "list PR comments").await?;
            let next = next_page_url(response.headers());
            let page: Vec<IssueComment> = response.json().await?;
            debug!(page = visited.len(), count = page.len(), "received comment page");
            comments.extend(page);

            match next {
                Some(next) if visited.contains(&next) => {
                    warn!(url = %next, "next page link points to a page already read");
                    break;
                }
                Some(next) => url = next,
                None => break,
            }
        }

        debug!(total = comments.len(), pages = visited.len(), "listed PR comments");
        Ok(comments)
    }

    #[instrument(skip(self, body), fields(pr = %pr, body_bytes = body.len()))]
    async fn create_comment(
        &self,
        pr: &PullRequestRef,
        body: &str,
    ) -> Result<IssueComment, PrError> {
        let response = self
            .request(Method::POST, &self.comments_url(pr), JSON_MEDIA_TYPE)
            .json(&CommentPayload { body })
            .send()
            .await?;
        let created: IssueComment = ensure_success(response, "create a PR comment")
            .await?
            .json()
            .await?;
        debug!(comment_id = created.id, "created comment");
        Ok(created)
    }

    #[instrument(skip(self, body), fields(pr = %pr))]
    async fn update_comment(
        &self,
        pr: &PullRequestRef,
        comment_id: u64,
        body: &str,
    ) -> Result<IssueComment, PrError> {
        let response = self
            .request(Method::PATCH, &self.comment_url(pr, comment_id), JSON_MEDIA_TYPE)
            .json(&CommentPayload { body })
            .send()
            .await?;
        let updated: IssueComment = ensure_success(response, "update the PR comment")
            .await?
            .json()
            .await?;
        debug!(comment_id = updated.id, "updated comment");
        Ok(updated)
    }
}

/// Turn a non-2xx response into [`PrError::UnexpectedStatus`], keeping the
/// response body for the diagnostic.
async fn ensure_success(response: Response, operation: &'static str) -> Result<Response, PrError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(PrError::UnexpectedStatus {
        operation,
        status,
        body: body.trim().to_string(),
    })
}

/// Extract the `rel="next"` target from a GitHub `Link` header.
fn next_page_url(headers: &HeaderMap) -> Option<String> {
    let link = headers.get(LINK)?.to_str().ok()?;
    link.split(',').find_map(|entry| {
        let (target, params) = entry.split_once(';')?;
        params
            .split(';')
            .any(|param| param.trim() == r#"rel="next""#)
            .then(|| {
                target
                    .trim()
                    .trim_start_matches('<')
                    .trim_end_matches('>')
                    .to_string()
            })
    })
}
