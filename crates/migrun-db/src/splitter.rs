//! Cutting migration file content into individual statements.
//!
//! The default [`SplitStrategy::Naive`] splits on every `;` and knows nothing
//! about SQL: a `;` inside a string literal, a comment or a trigger body cuts
//! the statement in two. Migrations written for it must not contain such
//! delimiters. [`SplitStrategy::Quoted`] skips delimiters inside quotes and
//! comments, but still does not understand `BEGIN ... END` trigger bodies.

use migrun_config::SplitStrategy;

const DELIMITER: char = ';';

/// Split `sql` into trimmed, non-empty statements in source order.
pub fn split_statements(sql: &str, strategy: SplitStrategy) -> Vec<String> {
    match strategy {
        SplitStrategy::Naive => split_naive(sql),
        SplitStrategy::Quoted => split_quoted(sql),
    }
}

fn split_naive(sql: &str) -> Vec<String> {
    sql.split(DELIMITER)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Clone, Copy, PartialEq)]
enum State {
    Normal,
    Quoted(char),
    LineComment,
    BlockComment,
}

fn split_quoted(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut start = 0;
    let mut state = State::Normal;
    let mut chars = sql.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        let next = chars.peek().map(|&(_, n)| n);
        match state {
            State::Normal => match c {
                '\'' | '"' | '`' => state = State::Quoted(c),
                '-' if next == Some('-') => {
                    chars.next();
                    state = State::LineComment;
                }
                '/' if next == Some('*') => {
                    chars.next();
                    state = State::BlockComment;
                }
                DELIMITER => {
                    push_trimmed(&mut statements, &sql[start..i]);
                    start = i + c.len_utf8();
                }
                _ => {}
            },
            State::Quoted(quote) if c == quote => {
                // A doubled quote is an escaped quote, not the end of the literal.
                if next == Some(quote) {
                    chars.next();
                } else {
                    state = State::Normal;
                }
            }
            State::Quoted(_) => {}
            State::LineComment => {
                if c == '\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment => {
                if c == '*' && next == Some('/') {
                    chars.next();
                    state = State::Normal;
                }
            }
        }
    }
    push_trimmed(&mut statements, &sql[start..]);
    statements
}

fn push_trimmed(statements: &mut Vec<String>, fragment: &str) {
    let fragment = fragment.trim();
    if !fragment.is_empty() {
        statements.push(fragment.to_string());
    }
}
