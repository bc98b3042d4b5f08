use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::comment::{self, UpsertOutcome};
use crate::config::Settings;
use crate::pr::diff::{diff_stats, truncate_diff};
use crate::pr::{PrError, PullRequestHost};
use crate::summary::{GenerationError, SummaryGenerator};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("could not fetch the PR diff: {0}")]
    Diff(#[source] PrError),

    #[error("could not generate a summary: {0}")]
    Generation(#[from] GenerationError),

    #[error("could not fetch PR participants: {0}")]
    Participants(#[source] PrError),

    #[error("could not post the summary comment: {0}")]
    Comment(#[source] PrError),
}

/// Fetch the diff, summarize it, and upsert the bot comment.
///
/// Stages run strictly in order and any error ends the run before the next
/// one starts, so a failed fetch or generation never reaches the comment
/// thread.
#[instrument(skip_all, fields(pr = %settings.pr, dry_run = dry_run))]
pub async fn run(
    settings: &Settings,
    host: &dyn PullRequestHost,
    generator: &dyn SummaryGenerator,
    dry_run: bool,
) -> Result<UpsertOutcome, PipelineError> {
    let pr = &settings.pr;
    let limit = settings.summary.max_diff_chars;

    let raw_diff = host.fetch_diff(pr).await.map_err(PipelineError::Diff)?;
    if raw_diff.trim().is_empty() {
        warn!("PR diff is empty");
    }
    let stats = diff_stats(&raw_diff);
    let truncated = raw_diff.chars().count() > limit;
    let diff = truncate_diff(&raw_diff, limit);
    info!(
        files = stats.files,
        additions = stats.additions,
        deletions = stats.deletions,
        truncated,
        "diff fetched"
    );

    let prompt = settings.summary.template.render(&diff);
    let summary = generator.generate(&prompt).await?;
    info!(generator = generator.name(), summary_bytes = summary.len(), "summary generated");

    let mentions = if settings.summary.mentions {
        let participants = host
            .fetch_participants(pr)
            .await
            .map_err(PipelineError::Participants)?;
        Some(comment::mentions(&participants))
    } else {
        None
    };

    let body = comment::compose(&summary, &settings.summary.footer, mentions.as_deref());
    let outcome = comment::upsert(host, pr, &body, dry_run)
        .await
        .map_err(PipelineError::Comment)?;
    info!(%outcome, "done");
    Ok(outcome)
}
