//! Isolation of the `construct` method body from generated Python.
//!
//! Models frequently return a whole `Scene` subclass even when asked for the
//! method body only. The source is parsed with tree-sitter and, when a
//! `construct` definition is present, only its statements are kept.

use crate::error::{AnimagenError, Result};
use std::collections::{HashSet, VecDeque};
use tracing::debug;
use tree_sitter::{Node, Parser, Tree};

/// Method name every generated scene must implement.
pub const TARGET_METHOD: &str = "construct";

/// Outcome of body isolation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstructBody {
    /// Source of each statement of `construct`, at column zero.
    Structured(Vec<String>),
    /// The input, unchanged: it did not parse or had no `construct`.
    RawFallback(String),
}

impl ConstructBody {
    pub fn is_structured(&self) -> bool {
        matches!(self, ConstructBody::Structured(_))
    }

    /// Code ready to be placed in a method body.
    pub fn into_code(self) -> String {
        match self {
            ConstructBody::Structured(statements) => statements.join("\n"),
            ConstructBody::RawFallback(code) => code,
        }
    }
}

/// Parse Python source into a syntax tree.
pub fn parse_python(source: &str) -> Result<Tree> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|e| AnimagenError::Parse(e.to_string()))?;
    parser
        .parse(source, None)
        .ok_or_else(|| AnimagenError::Parse("parser produced no tree".to_string()))
}

/// Extract the statements of the first `construct` definition in `code`.
///
/// Never fails: unparseable input and input without `construct` come back
/// as [`ConstructBody::RawFallback`].
pub fn isolate_construct_body(code: &str) -> ConstructBody {
    let tree = match parse_python(code) {
        Ok(tree) if !tree.root_node().has_error() => tree,
        Ok(_) => {
            debug!("Generated code does not parse, keeping it as-is");
            return ConstructBody::RawFallback(code.to_string());
        }
        Err(e) => {
            debug!("Parser unavailable ({}), keeping code as-is", e);
            return ConstructBody::RawFallback(code.to_string());
        }
    };

    match find_function(tree.root_node(), code.as_bytes(), TARGET_METHOD) {
        Some(function) => {
            let statements = body_statements(function, code);
            debug!("Isolated {} statements from {}", statements.len(), TARGET_METHOD);
            ConstructBody::Structured(statements)
        }
        None => ConstructBody::RawFallback(code.to_string()),
    }
}

/// Breadth-first search for a function definition called `name`.
fn find_function<'t>(root: Node<'t>, source: &[u8], name: &str) -> Option<Node<'t>> {
    let mut queue = VecDeque::from([root]);

    while let Some(node) = queue.pop_front() {
        if node.kind() == "function_definition"
            && node
                .child_by_field_name("name")
                .and_then(|n| n.utf8_text(source).ok())
                == Some(name)
        {
            return Some(node);
        }

        let mut cursor = node.walk();
        queue.extend(node.named_children(&mut cursor));
    }

    None
}

fn body_statements(function: Node<'_>, source: &str) -> Vec<String> {
    let Some(body) = function.child_by_field_name("body") else {
        return Vec::new();
    };

    let mut cursor = body.walk();
    let statements = body
        .named_children(&mut cursor)
        .filter(|stmt| stmt.kind() != "comment")
        .filter_map(|stmt| match stmt.utf8_text(source.as_bytes()) {
            Ok(text) => Some(dedent_continuation(
                text,
                stmt.start_position().column,
                &string_continuation_lines(stmt),
            )),
            Err(e) => {
                debug!("Skipping statement at line {}: {}", stmt.start_position().row + 1, e);
                None
            }
        })
        .collect();
    statements
}

/// Lines of `stmt`, relative to its first line, that begin inside a string
/// literal.
fn string_continuation_lines(stmt: Node<'_>) -> HashSet<usize> {
    let base = stmt.start_position().row;
    let mut lines = HashSet::new();
    let mut pending = vec![stmt];

    while let Some(node) = pending.pop() {
        if node.kind() == "string" {
            let start = node.start_position().row;
            let end = node.end_position().row;
            lines.extend((start + 1..=end).map(|row| row - base));
            continue;
        }
        let mut cursor = node.walk();
        pending.extend(node.children(&mut cursor));
    }

    lines
}

/// Strip up to `column` leading whitespace characters from every line after
/// the first, so a nested block keeps its relative indentation. Lines listed
/// in `verbatim` are string contents and stay untouched.
fn dedent_continuation(text: &str, column: usize, verbatim: &HashSet<usize>) -> String {
    let mut lines = text.split('\n').enumerate();
    let mut out = String::with_capacity(text.len());

    if let Some((_, first)) = lines.next() {
        out.push_str(first);
    }
    for (index, line) in lines {
        out.push('\n');
        if verbatim.contains(&index) {
            out.push_str(line);
            continue;
        }
        let strip = line
            .bytes()
            .take(column)
            .take_while(|b| *b == b' ' || *b == b'\t')
            .count();
        out.push_str(&line[strip..]);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn top_level_statements(code: &str) -> usize {
        let tree = parse_python(code).unwrap();
        assert!(!tree.root_node().has_error(), "does not reparse:\n{code}");
        let root = tree.root_node();
        let mut cursor = root.walk();
        let count = root
            .named_children(&mut cursor)
            .filter(|n| n.kind() != "comment")
            .count();
        count
    }

    #[test]
    fn test_full_scene_class() {
        let code = r#"from manim import *

class RedCircle(Scene):
    def construct(self):
        circle = Circle(color=RED)
        self.play(Create(circle))
        self.wait(1)
"#;
        let body = isolate_construct_body(code);
        assert_eq!(
            body,
            ConstructBody::Structured(vec![
                "circle = Circle(color=RED)".to_string(),
                "self.play(Create(circle))".to_string(),
                "self.wait(1)".to_string(),
            ])
        );
    }

    #[test]
    fn test_statement_count_round_trips() {
        let code = r#"class Demo(Scene):
    def construct(self):
        # shapes
        shapes = [Circle(), Square()]
        for shape in shapes:
            self.play(
                Create(shape),
                run_time=0.5,
            )
        if len(shapes) > 1:
            self.wait()
        else:
            pass
        self.play(FadeOut(*shapes))
"#;
        let body = isolate_construct_body(code);
        let ConstructBody::Structured(statements) = &body else {
            panic!("expected structured body, got {body:?}");
        };
        assert_eq!(statements.len(), 4);

        let code = body.into_code();
        assert_eq!(top_level_statements(&code), 4);
        assert!(code.contains("for shape in shapes:\n    self.play(\n        Create(shape),"));
    }

    #[test]
    fn test_bare_function_definition() {
        let body = isolate_construct_body("def construct(self):\n    self.add(Square())\n");
        assert_eq!(
            body,
            ConstructBody::Structured(vec!["self.add(Square())".to_string()])
        );
    }

    #[test]
    fn test_first_construct_breadth_first() {
        let code = r#"class A(Scene):
    def construct(self):
        x = 1

def construct(self):
    y = 2
"#;
        let body = isolate_construct_body(code);
        assert_eq!(body, ConstructBody::Structured(vec!["y = 2".to_string()]));
    }

    #[test]
    fn test_no_construct_returns_input() {
        let code = "self.play(Create(Circle()))";
        assert_eq!(
            isolate_construct_body(code),
            ConstructBody::RawFallback(code.to_string())
        );
    }

    #[test]
    fn test_unparseable_returns_input() {
        let code = "def construct(self):\n    self.play(Create(";
        let body = isolate_construct_body(code);
        assert!(!body.is_structured());
        assert_eq!(body.into_code(), code);
    }

    #[test]
    fn test_dedent_continuation() {
        let text = "for i in range(3):\n            self.wait(i)\n  short";
        assert_eq!(
            dedent_continuation(text, 8, &HashSet::new()),
            "for i in range(3):\n    self.wait(i)\nshort"
        );
    }

    #[test]
    fn test_multiline_string_keeps_its_indentation() {
        let code = "class S(Scene):\n    def construct(self):\n        t = Text(\"\"\"a\n        b\"\"\")\n        if t:\n            self.add(t)\n";
        let body = isolate_construct_body(code);
        assert_eq!(
            body,
            ConstructBody::Structured(vec![
                "t = Text(\"\"\"a\n        b\"\"\")".to_string(),
                "if t:\n    self.add(t)".to_string(),
            ])
        );
    }
}
