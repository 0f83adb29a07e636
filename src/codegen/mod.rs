//! Turning raw model output into a renderable scene script.
//!
//! The stages run in order: [`extract_code_block`] strips markdown fencing,
//! [`isolate_construct_body`] keeps only the body of `construct`,
//! [`PlausibilityCheck`] rejects obvious non-code, and [`SceneTemplate`]
//! writes the final script.

mod extract;
mod isolate;
mod script;
mod validate;

pub use extract::extract_code_block;
pub use isolate::{isolate_construct_body, parse_python, ConstructBody, TARGET_METHOD};
pub use script::{indent_body, SceneTemplate, BODY_INDENT};
pub use validate::{PlausibilityCheck, DEFAULT_SIGNALS};

/// Extract and isolate in one step.
pub fn sanitize(response: &str) -> ConstructBody {
    isolate_construct_body(&extract_code_block(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_fenced_class() {
        let response = "Sure!\n```python\nclass S(Scene):\n    def construct(self):\n        self.play(Create(Circle()))\n```";
        assert_eq!(
            sanitize(response),
            ConstructBody::Structured(vec!["self.play(Create(Circle()))".to_string()])
        );
    }

    #[test]
    fn test_sanitize_bare_body() {
        let response = "  self.wait(2)  ";
        assert_eq!(
            sanitize(response),
            ConstructBody::RawFallback("self.wait(2)".to_string())
        );
    }
}
