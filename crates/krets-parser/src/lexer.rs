//! Line tokenizer for the netlist language.
//!
//! The language is line-oriented and whitespace-separated; the lexer
//! keeps 1-based line and column positions so parse errors point at the
//! offending token.

/// A token with its source column (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub text: &'a str,
    pub column: usize,
}

/// One non-blank, non-comment source line.
#[derive(Debug, Clone)]
pub struct Line<'a> {
    /// Source line number (1-based).
    pub number: usize,
    pub tokens: Vec<Token<'a>>,
}

/// Split the input into token lines, dropping blanks and comments.
///
/// Comment lines start with `#`, `//`, `;` or `*`.
pub fn tokenize(input: &str) -> Vec<Line<'_>> {
    let mut lines = Vec::new();
    for (idx, raw) in input.lines().enumerate() {
        let trimmed = raw.trim_start();
        if trimmed.is_empty() || is_comment(trimmed) {
            continue;
        }

        let mut tokens = Vec::new();
        let mut column = None;
        let mut start = 0;
        for (pos, ch) in raw.char_indices() {
            if ch.is_whitespace() {
                if let Some(col) = column.take() {
                    tokens.push(Token {
                        text: &raw[start..pos],
                        column: col,
                    });
                }
            } else if column.is_none() {
                column = Some(pos + 1);
                start = pos;
            }
        }
        if let Some(col) = column {
            tokens.push(Token {
                text: &raw[start..],
                column: col,
            });
        }

        lines.push(Line {
            number: idx + 1,
            tokens,
        });
    }
    lines
}

fn is_comment(line: &str) -> bool {
    line.starts_with('#') || line.starts_with("//") || line.starts_with(';') || line.starts_with('*')
}
