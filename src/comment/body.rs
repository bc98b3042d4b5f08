use crate::pr::Participants;

/// Hidden tag that identifies the summarizer's own comment. Invisible in
/// rendered Markdown and never empty, so it only matches comments we wrote.
pub const BOT_MARKER: &str = "<!-- pr-summarizer:summary -->";

/// Build the `@author` line and, if anyone was asked to review, a CC line.
///
/// Purely textual: logins are not validated.
pub fn mentions(participants: &Participants) -> String {
    let mut block = format!("@{}", participants.author);
    if !participants.requested_reviewers.is_empty() {
        let reviewers: Vec<String> = participants
            .requested_reviewers
            .iter()
            .map(|login| format!("@{login}"))
            .collect();
        block.push_str("\n*CC Reviewers:* ");
        block.push_str(&reviewers.join(" "));
    }
    block
}

/// Assemble the comment: the generated summary verbatim, then the marker,
/// the footer, and the optional mentions block.
pub fn compose(summary: &str, footer: &str, mentions: Option<&str>) -> String {
    let mut body = format!("{summary}\n\n{BOT_MARKER}\n{footer}");
    if let Some(mentions) = mentions {
        body.push_str("\n\n");
        body.push_str(mentions);
    }
    body
}
