//! Suggestion parsing for free-text model output
//!
//! Models answer with prose, bulleted lists or a mix of both. The parser
//! turns that text into discrete, single-line suggestions:
//!
//! - A line whose trimmed form starts with `-`, `*`, `•`, `1.` or `1)`
//!   followed by whitespace opens a new suggestion; the marker is dropped.
//!   A marker alone on its line opens an empty suggestion.
//! - Lines without a marker that follow a bullet are continuation text and
//!   are joined with a single space.
//! - Text before the first bullet is treated as preamble and discarded.
//! - Without any bullet, every non-blank line is a suggestion.
//!
//! # Example
//!
//! ```
//! use poise_coach::feedback::parse_suggestions;
//!
//! let suggestions = parse_suggestions("Intro.\n- Wear a collar.\n- Sit up straight.\n");
//! assert_eq!(suggestions, vec!["Wear a collar.", "Sit up straight."]);
//! ```

/// Splits model output into suggestions
///
/// Returned entries are trimmed, non-blank and contain no newlines. An empty
/// result means the text held nothing usable.
pub fn parse_suggestions(text: &str) -> Vec<String> {
    let lines: Vec<&str> = text.lines().map(str::trim).collect();

    if !lines.iter().any(|line| strip_bullet(line).is_some()) {
        return lines
            .into_iter()
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect();
    }

    let mut suggestions = Vec::new();
    let mut current: Option<String> = None;

    for line in lines {
        if let Some(rest) = strip_bullet(line) {
            if let Some(done) = current.replace(rest.trim().to_string()) {
                suggestions.push(done);
            }
        } else if !line.is_empty() {
            // Preamble lines have no open suggestion and are skipped.
            if let Some(open) = current.as_mut() {
                if !open.is_empty() {
                    open.push(' ');
                }
                open.push_str(line);
            }
        }
    }
    suggestions.extend(current);

    suggestions
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Returns the text after a bullet marker, or `None` if `line` is not a bullet
fn strip_bullet(line: &str) -> Option<&str> {
    let rest = match line.strip_prefix(['-', '*', '•']) {
        Some(rest) => rest,
        None => {
            let digits = line.len() - line.trim_start_matches(|c: char| c.is_ascii_digit()).len();
            if digits == 0 {
                return None;
            }
            line[digits..].strip_prefix(['.', ')'])?
        }
    };

    // Lines are trimmed, so a bare marker ends the line.
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discards_preamble_before_bullets() {
        let parsed = parse_suggestions("Intro.\n- Wear a collar.\n- Sit up straight.\n");
        assert_eq!(parsed, vec!["Wear a collar.", "Sit up straight."]);
    }

    #[test]
    fn test_plain_lines_without_bullets() {
        let parsed = parse_suggestions("Smile more.\n\n  Look at the camera.  \n");
        assert_eq!(parsed, vec!["Smile more.", "Look at the camera."]);
    }

    #[test]
    fn test_numbered_and_mixed_markers() {
        let text = "Here is my feedback:\n1. Slow down.\n2) Pause instead of saying um.\n* Project your voice.\n• Finish strongly.";
        assert_eq!(
            parse_suggestions(text),
            vec![
                "Slow down.",
                "Pause instead of saying um.",
                "Project your voice.",
                "Finish strongly."
            ]
        );
    }

    #[test]
    fn test_continuation_lines_are_joined() {
        let text = "- Your background is cluttered;\n  consider a plain wall.\n\n- Raise the camera\nto eye level.";
        assert_eq!(
            parse_suggestions(text),
            vec![
                "Your background is cluttered; consider a plain wall.",
                "Raise the camera to eye level."
            ]
        );
    }

    #[test]
    fn test_markers_need_trailing_whitespace() {
        let text = "**Observations**\n1.5 metres from the camera is fine\n-not a bullet";
        assert_eq!(
            parse_suggestions(text),
            vec![
                "**Observations**",
                "1.5 metres from the camera is fine",
                "-not a bullet"
            ]
        );
    }

    #[test]
    fn test_blank_bullets_are_dropped() {
        let parsed = parse_suggestions("-  \n- Keep going.\n*\t\n");
        assert_eq!(parsed, vec!["Keep going."]);
    }

    #[test]
    fn test_empty_input_yields_nothing() {
        assert!(parse_suggestions("").is_empty());
        assert!(parse_suggestions("\n   \n\t").is_empty());
    }

    #[test]
    fn test_windows_line_endings() {
        let parsed = parse_suggestions("- One.\r\n- Two.\r\n");
        assert_eq!(parsed, vec!["One.", "Two."]);
    }

    #[test]
    fn test_suggestions_never_contain_newlines() {
        let text = "Preface\n- a\nb\nc\n- d";
        for suggestion in parse_suggestions(text) {
            assert!(!suggestion.contains('\n'));
            assert_eq!(suggestion, suggestion.trim());
        }
    }
}
