pub mod body;

pub use body::{compose, mentions, BOT_MARKER};

use std::fmt;

use tracing::{info, instrument};

use crate::pr::{IssueComment, PrError, PullRequestHost, PullRequestRef};

/// What the upsert step decided to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertPlan {
    /// Replace the body of the existing bot comment
    Update { comment_id: u64 },
    /// No bot comment yet; append a new one
    Create,
}

/// What the upsert step actually did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    Updated { comment_id: u64 },
    Created { comment_id: u64 },
    /// Nothing was written; `body` is what would have been posted.
    DryRun { plan: UpsertPlan, body: String },
}

impl fmt::Display for UpsertOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpsertOutcome::Updated { comment_id } => {
                write!(f, "updated existing PR summary (comment {comment_id})")
            }
            UpsertOutcome::Created { comment_id } => {
                write!(f, "posted new PR summary (comment {comment_id})")
            }
            UpsertOutcome::DryRun {
                plan: UpsertPlan::Update { comment_id },
                ..
            } => write!(f, "dry run: would update comment {comment_id}"),
            UpsertOutcome::DryRun {
                plan: UpsertPlan::Create,
                ..
            } => write!(f, "dry run: would post a new comment"),
        }
    }
}

/// The first comment, in listing order, whose body carries `marker`.
///
/// Later matches are ignored; if a marker collision ever produces two bot
/// comments, only the earliest one keeps being updated.
pub fn find_bot_comment<'a>(comments: &'a [IssueComment], marker: &str) -> Option<&'a IssueComment> {
    comments.iter().find(|comment| comment.body.contains(marker))
}

/// Decide between update and create for the given comment listing.
pub fn plan_upsert(comments: &[IssueComment]) -> UpsertPlan {
    match find_bot_comment(comments, BOT_MARKER) {
        Some(existing) => UpsertPlan::Update {
            comment_id: existing.id,
        },
        None => UpsertPlan::Create,
    }
}

/// Make sure the PR carries exactly one bot comment with `body`.
///
/// Lists the PR's comments, then patches the first marker-bearing comment or
/// creates a new one. Two runs racing on the same PR can both see no match
/// and both create; callers serialize runs per PR to rule that out.
#[instrument(skip(host, body), fields(pr = %pr))]
pub async fn upsert(
    host: &dyn PullRequestHost,
    pr: &PullRequestRef,
    body: &str,
    dry_run: bool,
) -> Result<UpsertOutcome, PrError> {
    let comments = host.list_comments(pr).await?;
    let plan = plan_upsert(&comments);
    info!(?plan, scanned = comments.len(), "planned comment upsert");

    if dry_run {
        return Ok(UpsertOutcome::DryRun {
            plan,
            body: body.to_string(),
        });
    }

    match plan {
        UpsertPlan::Update { comment_id } => {
            host.update_comment(pr, comment_id, body).await?;
            Ok(UpsertOutcome::Updated { comment_id })
        }
        UpsertPlan::Create => {
            let created = host.create_comment(pr, body).await?;
            Ok(UpsertOutcome::Created {
                comment_id: created.id,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sample_pr, FakeHost};

    fn comment(id: u64, body: &str) -> IssueComment {
        IssueComment {
            id,
            body: body.to_string(),
        }
    }

    fn bot_body(text: &str) -> String {
        compose(text, "*footer*", None)
    }

    #[test]
    fn test_first_match_wins() {
        let comments = vec![
            comment(10, "human"),
            comment(11, "another human"),
            comment(12, &bot_body("old summary")),
            comment(13, "reply"),
            comment(14, "reply"),
            comment(15, &bot_body("duplicate")),
        ];
        assert_eq!(plan_upsert(&comments), UpsertPlan::Update { comment_id: 12 });
        assert_eq!(find_bot_comment(&comments, BOT_MARKER).map(|c| c.id), Some(12));
    }

    #[test]
    fn test_no_match_plans_create() {
        let comments = vec![comment(1, "LGTM"), comment(2, "")];
        assert_eq!(plan_upsert(&comments), UpsertPlan::Create);
        assert_eq!(plan_upsert(&[]), UpsertPlan::Create);
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(
            UpsertOutcome::Updated { comment_id: 5 }.to_string(),
            "updated existing PR summary (comment 5)"
        );
        assert_eq!(
            UpsertOutcome::DryRun {
                plan: UpsertPlan::Create,
                body: String::new()
            }
            .to_string(),
            "dry run: would post a new comment"
        );
    }

    #[tokio::test]
    async fn test_upsert_creates_when_absent() {
        let host = FakeHost::with_comments(vec![comment(1, "LGTM")]);
        let outcome = upsert(&host, &sample_pr(), &bot_body("first"), false)
            .await
            .unwrap();
        assert!(matches!(outcome, UpsertOutcome::Created { .. }));
        assert_eq!(host.comments().len(), 2);
        assert_eq!(host.calls().creates, 1);
        assert_eq!(host.calls().updates, 0);
    }

    #[tokio::test]
    async fn test_upsert_updates_first_match_only() {
        let mut comments: Vec<IssueComment> = (0..6).map(|i| comment(100 + i, "human")).collect();
        comments[2].body = bot_body("old");
        comments[5].body = bot_body("stale duplicate");
        let host = FakeHost::with_comments(comments);

        let outcome = upsert(&host, &sample_pr(), &bot_body("new"), false)
            .await
            .unwrap();
        assert_eq!(outcome, UpsertOutcome::Updated { comment_id: 102 });

        let after = host.comments();
        assert_eq!(after[2].body, bot_body("new"));
        assert_eq!(after[5].body, bot_body("stale duplicate"));
    }

    #[tokio::test]
    async fn test_upsert_converges_to_one_comment() {
        let host = FakeHost::with_comments(vec![comment(1, "LGTM")]);
        let pr = sample_pr();

        upsert(&host, &pr, &bot_body("first run"), false).await.unwrap();
        let second = upsert(&host, &pr, &bot_body("second run"), false)
            .await
            .unwrap();

        let bot_comments: Vec<IssueComment> = host
            .comments()
            .into_iter()
            .filter(|c| c.body.contains(BOT_MARKER))
            .collect();
        assert_eq!(bot_comments.len(), 1);
        assert_eq!(bot_comments[0].body, bot_body("second run"));
        assert!(matches!(second, UpsertOutcome::Updated { .. }));
    }

    #[tokio::test]
    async fn test_dry_run_writes_nothing() {
        let host = FakeHost::with_comments(vec![comment(7, &bot_body("old"))]);
        let outcome = upsert(&host, &sample_pr(), "body", true).await.unwrap();
        assert_eq!(
            outcome,
            UpsertOutcome::DryRun {
                plan: UpsertPlan::Update { comment_id: 7 },
                body: "body".to_string()
            }
        );
        assert_eq!(host.calls().creates + host.calls().updates, 0);
    }

    #[tokio::test]
    async fn test_listing_failure_aborts_before_writing() {
        let host = FakeHost::default().failing_list();
        let err = upsert(&host, &sample_pr(), "body", false).await.unwrap_err();
        assert!(matches!(err, PrError::UnexpectedStatus { .. }));
        assert_eq!(host.calls().creates, 0);
    }
}
