//! Comment stripping, whitespace collapsing and tokenization.
//!
//! Comment removal is pattern-based and does not understand literals: a `//`
//! or `/*` inside a string or char literal is treated as a comment start.
//! That imprecision is accepted.

use std::sync::LazyLock;

use regex::Regex;

// An opener left unclosed by the extracted span runs to the end of the text.
static BLOCK_COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*.*?(?:\*/|\z)").unwrap());

static LINE_COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)//.*$").unwrap());

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

// Priority order: identifiers/keywords, numbers, string literals, char
// literals, two-character operators, then any single non-whitespace char.
static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[A-Za-z_][A-Za-z0-9_]*|\d+|".*?"|'.*?'|==|!=|<=|>=|&&|\|\||\S"#).unwrap()
});

/// Normalized text and tokens of one method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedMethod {
    /// Single-line, comment-free text.
    pub original_code: String,
    pub code_tokens: Vec<String>,
}

/// Remove block comments, then line comments.
pub fn strip_comments(code: &str) -> String {
    let without_blocks = BLOCK_COMMENT_RE.replace_all(code, "");
    LINE_COMMENT_RE.replace_all(&without_blocks, "").into_owned()
}

/// Collapse every whitespace run to one space and trim both ends.
pub fn collapse_whitespace(code: &str) -> String {
    WHITESPACE_RE.replace_all(code, " ").trim().to_string()
}

/// Split normalized text into tokens.
pub fn tokenize(code: &str) -> Vec<String> {
    TOKEN_RE
        .find_iter(code)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Strip, collapse, then tokenize the collapsed text.
pub fn normalize(raw: &str) -> NormalizedMethod {
    let original_code = collapse_whitespace(&strip_comments(raw));
    let code_tokens = tokenize(&original_code);
    NormalizedMethod {
        original_code,
        code_tokens,
    }
}
