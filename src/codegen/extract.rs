//! Fenced code block extraction from model output.

use regex::Regex;
use std::sync::OnceLock;

fn fence_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // Opening fence, optional Python tag, lazy body, closing fence
        Regex::new(r"```(?:(?i:python3?|py)\b)?\s*([\s\S]*?)```")
            .expect("fence pattern is a valid regex")
    })
}

/// Return the trimmed contents of the first fenced code block in `text`.
///
/// Models often answer with bare code, so when no fence is present the
/// whole input is returned, trimmed.
pub fn extract_code_block(text: &str) -> String {
    match fence_pattern().captures(text).and_then(|c| c.get(1)) {
        Some(body) => body.as_str().trim().to_string(),
        None => text.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tagged_block() {
        let text = "Here you go:\n```python\nself.play(Create(Circle()))\n```\nEnjoy!";
        assert_eq!(extract_code_block(text), "self.play(Create(Circle()))");
    }

    #[test]
    fn test_untagged_block() {
        let text = "```\n  circle = Circle()\n  self.add(circle)\n```";
        assert_eq!(extract_code_block(text), "circle = Circle()\n  self.add(circle)");
    }

    #[test]
    fn test_other_language_tags() {
        assert_eq!(extract_code_block("```py\nx = 1\n```"), "x = 1");
        assert_eq!(extract_code_block("```Python3 \r\nx = 1\r\n```"), "x = 1");
    }

    #[test]
    fn test_inline_fence_without_tag() {
        assert_eq!(extract_code_block("```x = 1```"), "x = 1");
    }

    #[test]
    fn test_tag_on_same_line_as_code() {
        assert_eq!(
            extract_code_block("```python self.play(Create(Circle()))```"),
            "self.play(Create(Circle()))"
        );
    }

    #[test]
    fn test_leading_identifier_is_kept() {
        assert_eq!(
            extract_code_block("```circle\nself.add(circle)\n```"),
            "circle\nself.add(circle)"
        );
        assert_eq!(
            extract_code_block("```pyramid = Square()```"),
            "pyramid = Square()"
        );
    }

    #[test]
    fn test_first_block_wins() {
        let text = "```python\nfirst = 1\n```\ntext\n```python\nsecond = 2\n```";
        assert_eq!(extract_code_block(text), "first = 1");
    }

    #[test]
    fn test_no_fence_returns_trimmed_input() {
        let text = "\n   self.wait(1)\n\n";
        assert_eq!(extract_code_block(text), "self.wait(1)");
        assert_eq!(extract_code_block(""), "");
    }

    #[test]
    fn test_unclosed_fence_falls_back() {
        let text = "```python\nx = 1";
        assert_eq!(extract_code_block(text), text);
    }
}
