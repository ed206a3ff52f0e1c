// src/parse/tokens.rs
// Splits one layout line into cell tokens.
//
// A token starts at the first letter, runs through letters, punctuation and short
// whitespace runs, and closes once a whitespace run reaches `max_gap`. Offsets are
// char columns in the source line; column assignment depends on them being exact.

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub offset: usize,
    pub value: String,
}

pub fn tokenize(line: &str, max_gap: usize) -> Vec<Token> {
    let chars: Vec<char> = line.chars().collect();
    let mut out = Vec::new();
    let mut start: Option<usize> = None;
    let mut gap = 0usize;

    for (i, &c) in chars.iter().enumerate() {
        match start {
            None => {
                if c.is_alphabetic() {
                    start = Some(i);
                    gap = 0;
                }
            }
            Some(s) => {
                if c.is_whitespace() {
                    gap += 1;
                    if gap >= max_gap {
                        out.push(close(&chars[s..i], s));
                        start = None;
                    }
                } else {
                    gap = 0;
                }
            }
        }
    }

    // dangling token at end of line
    if let Some(s) = start {
        out.push(close(&chars[s..], s));
    }
    out
}

fn close(span: &[char], offset: usize) -> Token {
    let value: String = span.iter().collect();
    Token { offset, value: value.trim().to_string() }
}
