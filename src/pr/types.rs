use std::fmt;

use serde::Deserialize;

/// Identifies the pull request every API call is addressed to.
/// Built once from configuration and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestRef {
    pub owner: String,
    pub repo: String,
    pub number: u64,
}

impl PullRequestRef {
    /// `owner/repo`, as used in GitHub API paths.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

impl fmt::Display for PullRequestRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{}", self.owner, self.repo, self.number)
    }
}

/// A comment on the PR conversation thread.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IssueComment {
    /// Identifier assigned by GitHub
    pub id: u64,
    /// Markdown body. GitHub may send `null`, which we treat as empty.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub body: String,
}

/// People involved in the PR, used to build the mentions block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Participants {
    /// Author's GitHub login
    pub author: String,
    /// Logins of requested reviewers, in API order
    pub requested_reviewers: Vec<String>,
}

/// Size of a diff, for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffStats {
    pub files: usize,
    pub additions: usize,
    pub deletions: usize,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
