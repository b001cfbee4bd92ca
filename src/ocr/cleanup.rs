use std::sync::OnceLock;

use regex::Regex;

fn spaces_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[ \t]+").expect("valid regex"))
}

fn blank_lines_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{3,}").expect("valid regex"))
}

fn zero_after_letter_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([A-Za-z])0").expect("valid regex"))
}

fn zero_before_letter_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"0([A-Za-z])").expect("valid regex"))
}

fn stray_lowercase_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s[b-hj-z]\s").expect("valid regex"))
}

/// Normalizes whitespace in raw OCR output: collapses runs of spaces and
/// tabs, trims each line, and squeezes repeated blank lines down to one.
/// Line structure is preserved so callers can still count lines and
/// paragraphs.
pub fn normalize_text(raw: &str) -> String {
    let collapsed = spaces_re().replace_all(raw, " ");
    let trimmed_lines: Vec<&str> = collapsed.lines().map(str::trim).collect();
    let joined = trimmed_lines.join("\n");
    blank_lines_re()
        .replace_all(&joined, "\n\n")
        .trim()
        .to_string()
}

/// Best-effort correction of common OCR character confusions.
///
/// Heuristic and lossy: a legitimate digit zero adjacent to letters is
/// rewritten to the letter O, and stray single lowercase letters are
/// dropped. Opt-in via `OCR_FIX_CONFUSIONS`; never applied to text the
/// caller did not ask to have rewritten.
pub fn fix_character_confusions(text: &str) -> String {
    let text = text.replace('|', "I");
    let text = zero_after_letter_re().replace_all(&text, "${1}O");
    let text = zero_before_letter_re().replace_all(&text, "O${1}");
    let text = stray_lowercase_re().replace_all(&text, " ");
    normalize_text(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn normalize_collapses_space_runs() {
        assert_eq!(normalize_text("hello    world"), "hello world");
        assert_eq!(normalize_text("  padded \t line  "), "padded line");
    }

    #[test]
    fn normalize_preserves_line_structure() {
        let raw = "first line\nsecond  line\n\n\n\nnext paragraph";
        assert_eq!(
            normalize_text(raw),
            "first line\nsecond line\n\nnext paragraph"
        );
    }

    #[test]
    fn normalize_of_empty_input_is_empty() {
        assert_eq!(normalize_text(""), "");
        assert_eq!(normalize_text("   \n  \n"), "");
    }

    #[test]
    fn confusion_fix_rewrites_pipes_and_zeros() {
        assert_eq!(fix_character_confusions("|t was R0ME"), "It was ROME");
    }

    #[test]
    fn confusion_fix_leaves_numeric_zeros_alone() {
        assert_eq!(fix_character_confusions("year 1005"), "year 1005");
    }

    #[test]
    fn confusion_fix_drops_stray_lowercase_letters() {
        assert_eq!(
            fix_character_confusions("the q quick fox"),
            "the quick fox"
        );
        // 'a' and 'i' are real words and must survive
        assert_eq!(fix_character_confusions("a dog i saw"), "a dog i saw");
    }
}
