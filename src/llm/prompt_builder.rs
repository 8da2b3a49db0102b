use crate::llm::prompts;

/// Maximum number of diff characters embedded in a prompt.
pub const MAX_DIFF_CHARS: usize = 100_000;

/// Build the commit-message prompt for `diff`.
///
/// Diffs longer than [`MAX_DIFF_CHARS`] characters are cut at exactly that many
/// characters; the returned flag reports whether that happened.
pub fn build_prompt(diff: &str) -> (String, bool) {
    let (diff, truncated) = match diff.char_indices().nth(MAX_DIFF_CHARS) {
        Some((cut, _)) => (&diff[..cut], true),
        None => (diff, false),
    };

    let mut prompt = String::with_capacity(
        prompts::COMMIT_INSTRUCTIONS.len() + prompts::DIFF_MARKER.len() + diff.len() + 1,
    );
    prompt.push_str(prompts::COMMIT_INSTRUCTIONS);
    prompt.push('\n');
    prompt.push_str(prompts::DIFF_MARKER);
    prompt.push_str(diff);

    (prompt, truncated)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embedded_diff(prompt: &str) -> &str {
        let idx = prompt
            .find(prompts::DIFF_MARKER)
            .expect("prompt missing 'Diff:' marker");
        &prompt[idx + prompts::DIFF_MARKER.len()..]
    }

    #[test]
    fn embeds_normal_diff_unmodified() {
        let diff = "diff --git a/foo.rs b/foo.rs\n+added line";
        let (prompt, truncated) = build_prompt(diff);

        assert!(!truncated);
        assert_eq!(embedded_diff(&prompt), diff);
    }

    #[test]
    fn empty_diff_keeps_marker() {
        let (prompt, truncated) = build_prompt("");

        assert!(!truncated);
        assert!(prompt.ends_with("Diff:\n"));
    }

    #[test]
    fn diff_at_limit_is_not_truncated() {
        let diff = "y".repeat(MAX_DIFF_CHARS);
        let (prompt, truncated) = build_prompt(&diff);

        assert!(!truncated);
        assert_eq!(embedded_diff(&prompt), diff);
    }

    #[test]
    fn oversized_diff_is_cut_to_limit() {
        let diff = "x".repeat(MAX_DIFF_CHARS + 100);
        let (prompt, truncated) = build_prompt(&diff);

        assert!(truncated);
        assert_eq!(embedded_diff(&prompt).len(), MAX_DIFF_CHARS);
        assert_eq!(embedded_diff(&prompt), &diff[..MAX_DIFF_CHARS]);
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let diff = "é".repeat(MAX_DIFF_CHARS + 1);
        let (prompt, truncated) = build_prompt(&diff);

        assert!(truncated);
        assert_eq!(embedded_diff(&prompt).chars().count(), MAX_DIFF_CHARS);

        let diff = "é".repeat(MAX_DIFF_CHARS);
        let (_, truncated) = build_prompt(&diff);
        assert!(!truncated);
    }

    #[test]
    fn cut_ignores_line_boundaries() {
        let line = "+0123456789\n";
        let diff = line.repeat(MAX_DIFF_CHARS / line.len() + 10);
        let (prompt, truncated) = build_prompt(&diff);

        assert!(truncated);
        assert_eq!(embedded_diff(&prompt), &diff[..MAX_DIFF_CHARS]);
    }

    #[test]
    fn contains_formatting_rules() {
        for diff in ["some diff", "", "imperative"] {
            let (prompt, _) = build_prompt(diff);
            for rule in ["imperative mood", "under 72 characters", "plain text only"] {
                assert!(prompt.contains(rule), "prompt missing rule: {rule:?}");
            }
        }
    }

    #[test]
    fn is_deterministic() {
        assert_eq!(build_prompt("a diff"), build_prompt("a diff"));
    }
}
