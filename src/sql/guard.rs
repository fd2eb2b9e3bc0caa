//! Local statement-kind check
//!
//! The decomposition prompt asks the model to refuse data-modifying
//! requests. This check runs on every emitted statement as a second layer:
//! only a single `SELECT` or `WITH` statement passes. The store itself is
//! opened read-only as a third layer.

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum GuardError {
    #[error("Empty statement")]
    Empty,

    #[error("Only SELECT statements are supported (found {0})")]
    NotReadOnly(String),

    #[error("Multiple statements are not supported")]
    MultipleStatements,
}

#[derive(Clone, Copy)]
enum ScanState {
    Code,
    Quoted(char),
    LineComment,
    BlockComment,
}

/// Reduce a statement to its structure in one pass.
///
/// Comments outside quotes become a single space. The contents of quoted
/// literals and identifiers become `_`, so a `;`, keyword or comment marker
/// inside them is never mistaken for statement structure.
fn mask_structure(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut state = ScanState::Code;
    let mut chars = sql.chars().peekable();

    while let Some(ch) = chars.next() {
        state = match state {
            ScanState::Code => match ch {
                '-' if chars.peek() == Some(&'-') => {
                    chars.next();
                    out.push(' ');
                    ScanState::LineComment
                }
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    out.push(' ');
                    ScanState::BlockComment
                }
                '\'' | '"' | '`' => {
                    out.push(ch);
                    ScanState::Quoted(ch)
                }
                _ => {
                    out.push(ch);
                    ScanState::Code
                }
            },
            ScanState::Quoted(q) if ch == q => {
                out.push(ch);
                ScanState::Code
            }
            ScanState::Quoted(q) => {
                out.push('_');
                ScanState::Quoted(q)
            }
            ScanState::LineComment if ch == '\n' => {
                out.push(ch);
                ScanState::Code
            }
            ScanState::LineComment => ScanState::LineComment,
            ScanState::BlockComment if ch == '*' && chars.peek() == Some(&'/') => {
                chars.next();
                ScanState::Code
            }
            ScanState::BlockComment => ScanState::BlockComment,
        };
    }

    out
}

/// Accept a single read-only statement
pub fn check_read_only(sql: &str) -> Result<(), GuardError> {
    let cleaned = mask_structure(sql);
    let body = cleaned.trim().trim_end_matches(|c: char| c == ';' || c.is_whitespace());

    if body.is_empty() {
        return Err(GuardError::Empty);
    }

    if body.contains(';') {
        return Err(GuardError::MultipleStatements);
    }

    let keyword: String = body
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect::<String>()
        .to_ascii_uppercase();

    match keyword.as_str() {
        "SELECT" | "WITH" => Ok(()),
        "" => Err(GuardError::NotReadOnly(body.chars().take(20).collect())),
        _ => Err(GuardError::NotReadOnly(keyword)),
    }
}
