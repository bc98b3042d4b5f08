use super::types::DiffStats;

/// Default upper bound on diff size sent to the model, in characters.
pub const DEFAULT_MAX_DIFF_CHARS: usize = 50_000;

/// Appended to a diff that was cut at the size limit.
pub const TRUNCATION_NOTICE: &str = "\n\n...[Diff truncated due to length]...";

/// Bound a diff to `max_chars` characters.
///
/// Diffs at or under the limit come back unchanged. Longer diffs keep their
/// first `max_chars` characters followed by [`TRUNCATION_NOTICE`]. The cut is
/// not diff-aware and may land mid-line, but it never splits a code point.
pub fn truncate_diff(diff: &str, max_chars: usize) -> String {
    match diff.char_indices().nth(max_chars) {
        Some((cut, _)) => {
            let mut truncated = String::with_capacity(cut + TRUNCATION_NOTICE.len());
            truncated.push_str(&diff[..cut]);
            truncated.push_str(TRUNCATION_NOTICE);
            truncated
        }
        None => diff.to_string(),
    }
}

/// Count files and changed lines in a unified diff.
///
/// Each file section starts with `diff --git`; lines prefixed with `+` or `-`
/// count as additions or deletions, except the `+++`/`---` file headers.
pub fn diff_stats(diff: &str) -> DiffStats {
    let mut stats = DiffStats::default();
    for line in diff.lines() {
        if line.starts_with("diff --git ") {
            stats.files += 1;
        } else if line.starts_with("+++") || line.starts_with("---") {
            continue;
        } else if line.starts_with('+') {
            stats.additions += 1;
        } else if line.starts_with('-') {
            stats.deletions += 1;
        }
    }
    stats
}
