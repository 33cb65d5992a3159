// ============================================================
// Layer 3 — Translation Prompt
// ============================================================
// The model is only ever asked one kind of question, so the
// prompt is fixed. It ends with "Shakespearean:" to mirror the
// training strings; the model continues from there.
//
// Extraction takes the generated text after the LAST
// "Shakespearean:" (the instruction line itself mentions
// "Shakespearean English:", and the model may echo more pairs),
// keeps only the first line, and drops any [END] marker.

use crate::domain::parallel_record::END_MARKER;

/// Label that precedes the translation in both prompt and training data.
pub const RESPONSE_LABEL: &str = "Shakespearean:";

/// Build the instruction prompt for one modern English sentence.
pub fn build_prompt(modern_text: &str) -> String {
    format!(
        "Translate the following Modern English sentence to Shakespearean English:\nModern: {}\n{}",
        modern_text, RESPONSE_LABEL
    )
}

/// Pull the cleaned translation out of the full decoded generation.
pub fn extract_translation(generated: &str) -> String {
    let tail = generated
        .rsplit(RESPONSE_LABEL)
        .next()
        .unwrap_or(generated);

    let first_line = tail.split('\n').next().unwrap_or_default();

    first_line
        .trim()
        .replace(END_MARKER, "")
        .trim()
        .to_string()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_ends_with_label() {
        let p = build_prompt("Where are you?");
        assert!(p.starts_with("Translate the following Modern English sentence"));
        assert!(p.contains("\nModern: Where are you?\n"));
        assert!(p.ends_with("Shakespearean:"));
    }

    #[test]
    fn test_extracts_after_last_label() {
        let generated = format!("{} Where art thou? [END]\nModern: next", build_prompt("Where are you?"));
        assert_eq!(extract_translation(&generated), "Where art thou?");
    }

    #[test]
    fn test_strips_every_end_marker() {
        let out = extract_translation("Shakespearean: Good [END] morrow [END]");
        assert!(!out.contains("[END]"));
        assert_eq!(out, "Good  morrow");
    }

    #[test]
    fn test_no_label_uses_first_line() {
        assert_eq!(extract_translation("  hark [END]\nmore"), "hark");
    }

    #[test]
    fn test_empty_continuation() {
        assert_eq!(extract_translation(&build_prompt("hi")), "");
    }
}
