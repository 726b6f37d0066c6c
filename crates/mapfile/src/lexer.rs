//! Mapfile tokenizer.
//!
//! Mapfiles are whitespace separated sequences of bare words and quoted
//! strings. `#` starts a comment that runs to the end of the line. Strings use
//! single or double quotes and accept backslash escapes.

use std::ops::Range;

use crate::error::MapfileError;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Bare word: keywords, numbers, unquoted values, expression fragments.
    Word(String),
    /// Quoted string with escapes resolved.
    Str(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Byte range in the source, quotes included.
    pub span: Range<usize>,
    /// 1-based line number of the first byte.
    pub line: usize,
    /// Index of the source the token was read from; 0 is the top-level file.
    pub file: usize,
}

impl Token {
    /// Text of the token regardless of quoting.
    pub fn text(&self) -> &str {
        match &self.kind {
            TokenKind::Word(s) | TokenKind::Str(s) => s,
        }
    }

    /// True if this is a bare word equal to `keyword`, ignoring case.
    pub fn is_keyword(&self, keyword: &str) -> bool {
        matches!(&self.kind, TokenKind::Word(w) if w.eq_ignore_ascii_case(keyword))
    }

    /// Upper-cased keyword, or `None` for quoted strings.
    pub fn keyword(&self) -> Option<String> {
        match &self.kind {
            TokenKind::Word(w) => Some(w.to_ascii_uppercase()),
            TokenKind::Str(_) => None,
        }
    }
}

/// Split mapfile source into tokens.
pub fn tokenize(source: &str) -> Result<Vec<Token>, MapfileError> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;
    let mut line = 1;

    while pos < bytes.len() {
        let c = bytes[pos];

        if c == b'\n' {
            line += 1;
            pos += 1;
        } else if c.is_ascii_whitespace() {
            pos += 1;
        } else if c == b'#' {
            while pos < bytes.len() && bytes[pos] != b'\n' {
                pos += 1;
            }
        } else if c == b'"' || c == b'\'' {
            let quote = c as char;
            let start = pos;
            let start_line = line;
            let mut value = String::new();
            pos += 1;
            loop {
                let Some(ch) = source[pos..].chars().next() else {
                    return Err(MapfileError::UnterminatedString { line: start_line });
                };
                pos += ch.len_utf8();
                match ch {
                    '\\' => {
                        let Some(escaped) = source[pos..].chars().next() else {
                            return Err(MapfileError::UnterminatedString { line: start_line });
                        };
                        pos += escaped.len_utf8();
                        if escaped == '\n' {
                            line += 1;
                        }
                        // Only quotes and backslashes are escapes; anything
                        // else (regex classes like \d) is kept as written.
                        if escaped != '"' && escaped != '\'' && escaped != '\\' {
                            value.push('\\');
                        }
                        value.push(escaped);
                    }
                    ch if ch == quote => break,
                    '\n' => {
                        line += 1;
                        value.push(ch);
                    }
                    ch => value.push(ch),
                }
            }
            tokens.push(Token {
                kind: TokenKind::Str(value),
                span: start..pos,
                line: start_line,
                file: 0,
            });
        } else {
            let start = pos;
            while pos < bytes.len() {
                let b = bytes[pos];
                if b.is_ascii_whitespace() || b == b'"' || b == b'\'' || b == b'#' {
                    break;
                }
                pos += 1;
            }
            tokens.push(Token {
                kind: TokenKind::Word(source[start..pos].to_string()),
                span: start..pos,
                line,
                file: 0,
            });
        }
    }

    Ok(tokens)
}
