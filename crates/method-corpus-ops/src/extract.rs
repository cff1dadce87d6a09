//! Method extraction from Java sources via tree-sitter.
//!
//! A file either parses cleanly and yields every `method_declaration` the
//! traversal reaches (nested, local and anonymous classes included), or it
//! yields a [`ParseFailure`] and nothing at all.
//!
//! End lines are a heuristic: the last row of the final statement in the
//! body. A closing brace on its own line falls outside the range, and trailing
//! comments after the last statement are not counted. This is a known
//! limitation and is not corrected.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tree_sitter::{Node, Parser, Tree};

use crate::error::{CorpusError, CorpusResult};

const METHOD_DECLARATION: &str = "method_declaration";
const COMMENT_KINDS: &[&str] = &["line_comment", "block_comment"];

/// One method declaration, before normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedMethod {
    pub name: String,
    /// `<return type> <name>(<type> <name>, ...)`.
    pub signature: String,
    /// 1-based, inclusive.
    pub start_line: usize,
    /// 1-based, inclusive.
    pub end_line: usize,
    /// Raw source lines `start_line..=end_line`.
    pub body: String,
}

/// Category of a file-level extraction failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseFailureKind {
    /// The token stream does not form a valid compilation unit.
    Syntax,
    /// Characters the lexer cannot turn into tokens.
    Lexical,
    /// The file could not be read.
    Unreadable,
}

impl fmt::Display for ParseFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ParseFailureKind::Syntax => "syntax",
            ParseFailureKind::Lexical => "lexical",
            ParseFailureKind::Unreadable => "unreadable",
        };
        f.write_str(label)
    }
}

/// Why a file contributed no methods.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind} error: {message}")]
pub struct ParseFailure {
    pub kind: ParseFailureKind,
    /// 1-based line of the first offending node, when known.
    pub line: Option<usize>,
    pub message: String,
}

impl ParseFailure {
    fn at(kind: ParseFailureKind, line: usize, message: impl Into<String>) -> Self {
        Self {
            kind,
            line: Some(line),
            message: message.into(),
        }
    }
}

/// Declaration-level view of a syntax node.
enum JavaNode<'tree> {
    Method(Node<'tree>),
    Error(Node<'tree>),
    Missing(Node<'tree>),
    Other,
}

impl<'tree> JavaNode<'tree> {
    fn classify(node: Node<'tree>) -> Self {
        if node.is_missing() {
            JavaNode::Missing(node)
        } else if node.is_error() {
            JavaNode::Error(node)
        } else if node.kind() == METHOD_DECLARATION {
            JavaNode::Method(node)
        } else {
            JavaNode::Other
        }
    }
}

/// Visit every node of `tree` in document order; stop early when `visit`
/// returns `false`.
fn walk<'tree, F>(tree: &'tree Tree, mut visit: F)
where
    F: FnMut(JavaNode<'tree>) -> bool,
{
    let mut cursor = tree.walk();
    loop {
        if !visit(JavaNode::classify(cursor.node())) {
            return;
        }
        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return;
            }
        }
    }
}

/// Reusable Java method extractor.
pub struct JavaMethodExtractor {
    parser: Parser,
}

impl JavaMethodExtractor {
    /// Create an extractor with the Java grammar loaded.
    pub fn new() -> CorpusResult<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_java::LANGUAGE.into())
            .map_err(|e| CorpusError::Parser(e.to_string()))?;
        Ok(Self { parser })
    }

    /// Read and extract one file. Invalid UTF-8 is replaced, not rejected.
    pub fn extract_file(&mut self, path: &Path) -> Result<Vec<ExtractedMethod>, ParseFailure> {
        let bytes = std::fs::read(path).map_err(|e| ParseFailure {
            kind: ParseFailureKind::Unreadable,
            line: None,
            message: format!("Failed to read {}: {}", path.display(), e),
        })?;
        let source = String::from_utf8_lossy(&bytes);
        self.extract(&source)
    }

    /// Extract every method declaration from `source`, in declaration order.
    pub fn extract(&mut self, source: &str) -> Result<Vec<ExtractedMethod>, ParseFailure> {
        let tree = self.parser.parse(source, None).ok_or_else(|| ParseFailure {
            kind: ParseFailureKind::Syntax,
            line: None,
            message: "parser produced no tree".to_string(),
        })?;

        if tree.root_node().has_error() {
            return Err(first_error(&tree));
        }

        let lines: Vec<&str> = source.lines().collect();
        let mut methods = Vec::new();
        walk(&tree, |node| {
            if let JavaNode::Method(node) = node {
                if let Some(method) = describe_method(node, source, &lines) {
                    methods.push(method);
                }
            }
            true
        });

        Ok(methods)
    }
}

fn first_error(tree: &Tree) -> ParseFailure {
    let mut failure = None;
    walk(tree, |node| match node {
        JavaNode::Missing(node) => {
            failure = Some(ParseFailure::at(
                ParseFailureKind::Syntax,
                node.start_position().row + 1,
                format!("missing `{}`", node.kind()),
            ));
            false
        }
        // A leaf error node is input the lexer could not tokenize.
        JavaNode::Error(node) if node.child_count() == 0 => {
            failure = Some(ParseFailure::at(
                ParseFailureKind::Lexical,
                node.start_position().row + 1,
                "unrecognized input",
            ));
            false
        }
        JavaNode::Error(node) => {
            failure = Some(ParseFailure::at(
                ParseFailureKind::Syntax,
                node.start_position().row + 1,
                "unexpected tokens",
            ));
            false
        }
        _ => true,
    });

    failure.unwrap_or_else(|| ParseFailure {
        kind: ParseFailureKind::Syntax,
        line: None,
        message: "syntax error".to_string(),
    })
}

fn describe_method(node: Node<'_>, source: &str, lines: &[&str]) -> Option<ExtractedMethod> {
    let name = text(node.child_by_field_name("name")?, source)?;

    let return_type = node
        .child_by_field_name("type")
        .and_then(|t| text(t, source))
        .unwrap_or_else(|| "void".to_string());

    let parameters = node
        .child_by_field_name("parameters")
        .map(|p| parameter_list(p, source))
        .unwrap_or_default();

    let start_line = node.start_position().row + 1;
    let end_line = estimate_end_line(node).max(start_line);

    let body = lines
        .get(start_line - 1..end_line.min(lines.len()))
        .map(|span| span.join("\n"))
        .unwrap_or_default();

    Some(ExtractedMethod {
        signature: format!("{} {}({})", return_type, name, parameters.join(", ")),
        name,
        start_line,
        end_line,
        body,
    })
}

/// Last row of the final statement in the body, or of the declaration itself
/// when there is no statement to anchor on.
fn estimate_end_line(node: Node<'_>) -> usize {
    let last_statement = node.child_by_field_name("body").and_then(|body| {
        let mut cursor = body.walk();
        let statements: Vec<Node<'_>> = body
            .named_children(&mut cursor)
            .filter(|child| !COMMENT_KINDS.contains(&child.kind()))
            .collect();
        statements.last().copied()
    });

    last_statement.unwrap_or(node).end_position().row + 1
}

fn parameter_list(parameters: Node<'_>, source: &str) -> Vec<String> {
    let mut cursor = parameters.walk();
    parameters
        .named_children(&mut cursor)
        .filter_map(|param| match param.kind() {
            "formal_parameter" => {
                let ty = text(param.child_by_field_name("type")?, source)?;
                let name = text(param.child_by_field_name("name")?, source)?;
                let dims = param
                    .child_by_field_name("dimensions")
                    .and_then(|d| text(d, source))
                    .unwrap_or_default();
                Some(format!("{} {}{}", ty, name, dims))
            }
            "spread_parameter" => {
                let mut inner = param.walk();
                let children: Vec<Node<'_>> = param.named_children(&mut inner).collect();
                let ty = children
                    .iter()
                    .find(|c| c.kind() != "modifiers" && c.kind() != "variable_declarator")
                    .and_then(|c| text(*c, source))?;
                let name = children
                    .iter()
                    .find(|c| c.kind() == "variable_declarator")
                    .and_then(|c| c.child_by_field_name("name"))
                    .and_then(|n| text(n, source))?;
                Some(format!("{}... {}", ty, name))
            }
            // Receiver parameters (`Foo this`) and comments are not parameters.
            _ => None,
        })
        .collect()
}

/// Node text with internal whitespace collapsed.
fn text(node: Node<'_>, source: &str) -> Option<String> {
    let raw = node.utf8_text(source.as_bytes()).ok()?;
    Some(raw.split_whitespace().collect::<Vec<_>>().join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(source: &str) -> Result<Vec<ExtractedMethod>, ParseFailure> {
        JavaMethodExtractor::new().unwrap().extract(source)
    }

    #[test]
    fn test_extracts_single_method() {
        let src = "class Calc {\n    int add(int a, int b) { // sum\n        return a + b; }\n}\n";
        let methods = extract(src).unwrap();

        assert_eq!(methods.len(), 1);
        let m = &methods[0];
        assert_eq!(m.name, "add");
        assert_eq!(m.signature, "int add(int a, int b)");
        assert_eq!(m.start_line, 2);
        assert_eq!(m.end_line, 3);
        assert_eq!(
            m.body,
            "    int add(int a, int b) { // sum\n        return a + b; }"
        );
    }

    #[test]
    fn test_end_line_stops_at_last_statement() {
        let src = "class A {\n  void run() {\n    first();\n    second(\n      1);\n  }\n}\n";
        let methods = extract(src).unwrap();
        assert_eq!(methods[0].start_line, 2);
        assert_eq!(methods[0].end_line, 5);
    }

    #[test]
    fn test_abstract_and_empty_methods() {
        let src = "abstract class A {\n  abstract void a();\n  void b() {\n  }\n}\n";
        let methods = extract(src).unwrap();
        assert_eq!(methods.len(), 2);
        assert_eq!((methods[0].start_line, methods[0].end_line), (2, 2));
        assert_eq!(methods[0].signature, "void a()");
        // No statement to anchor on: the declaration's own last row.
        assert_eq!((methods[1].start_line, methods[1].end_line), (3, 4));
    }

    #[test]
    fn test_overloads_and_declaration_order() {
        let src = r#"
class A {
    void log(String s) { }
    void log(int n) { }
    static <T> java.util.List<T> wrap(T value, String... rest) { return null; }
}
"#;
        let methods = extract(src).unwrap();
        let names: Vec<_> = methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["log", "log", "wrap"]);
        assert_eq!(methods[0].signature, "void log(String s)");
        assert_eq!(methods[1].signature, "void log(int n)");
        assert_eq!(
            methods[2].signature,
            "java.util.List<T> wrap(T value, String... rest)"
        );
    }

    #[test]
    fn test_nested_and_anonymous_classes_are_reached() {
        let src = r#"
class Outer {
    void outer() {
        Runnable r = new Runnable() {
            public void run() { }
        };
    }
    static class Inner {
        int inner() { return 1; }
    }
}
interface Shape { double area(); }
"#;
        let names: Vec<_> = extract(src)
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, vec!["outer", "run", "inner", "area"]);
    }

    #[test]
    fn test_constructors_are_not_methods() {
        let src = "class A {\n  A() { }\n  void m() { }\n}\n";
        let methods = extract(src).unwrap();
        assert_eq!(methods.len(), 1);
        assert_eq!(methods[0].name, "m");
    }

    #[test]
    fn test_annotations_and_array_parameters() {
        let src = "class A {\n  @Override\n  public String toString(final int xs[]) { return \"\"; }\n}\n";
        let methods = extract(src).unwrap();
        assert_eq!(methods[0].start_line, 2);
        assert_eq!(methods[0].end_line, 3);
        assert_eq!(methods[0].signature, "String toString(int xs[])");
    }

    #[test]
    fn test_syntax_error_rejects_whole_file() {
        let src = "class A {\n  void ok() { }\n  void broken( { \n}\n";
        let failure = extract(src).unwrap_err();
        assert_eq!(failure.kind, ParseFailureKind::Syntax);
        assert!(failure.line.is_some());
    }

    #[test]
    fn test_unreadable_file() {
        let mut extractor = JavaMethodExtractor::new().unwrap();
        let failure = extractor
            .extract_file(Path::new("/definitely/not/here/A.java"))
            .unwrap_err();
        assert_eq!(failure.kind, ParseFailureKind::Unreadable);
    }

    #[test]
    fn test_file_without_methods() {
        assert!(extract("class Empty { }").unwrap().is_empty());
        assert!(extract("").unwrap().is_empty());
    }
}
