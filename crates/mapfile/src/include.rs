//! `INCLUDE` expansion.
//!
//! Included files are spliced into the token stream in place of their
//! `INCLUDE "file"` statement. Relative names resolve against the directory
//! of the top-level mapfile at every nesting level, as MapServer does.

use std::fs;
use std::ops::Range;
use std::path::Path;

use tracing::debug;

use crate::error::MapfileError;
use crate::lexer::{tokenize, Token};

/// Deepest nesting of `INCLUDE` statements accepted.
pub const MAX_INCLUDE_DEPTH: usize = 5;

/// An `INCLUDE` statement and the source it pulled in.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct IncludeSite {
    /// Source holding the statement.
    pub file: usize,
    /// `INCLUDE "file"`, keyword through value.
    pub span: Range<usize>,
    /// Source read for the statement.
    pub target: usize,
}

/// Mapfile tokens with every include expanded.
#[derive(Debug, Clone, Default)]
pub(crate) struct Expanded {
    /// Source texts; index 0 is the top-level file.
    pub sources: Vec<String>,
    pub includes: Vec<IncludeSite>,
    pub tokens: Vec<Token>,
}

/// Tokenize `source`, reading included files relative to `base_dir`.
pub(crate) fn expand(source: String, base_dir: &Path) -> Result<Expanded, MapfileError> {
    let mut expanded = Expanded {
        sources: vec![source],
        ..Default::default()
    };
    let mut tokens = Vec::new();
    expand_source(&mut expanded, 0, base_dir, 0, &mut tokens)?;
    expanded.tokens = tokens;
    Ok(expanded)
}

fn expand_source(
    expanded: &mut Expanded,
    file: usize,
    base_dir: &Path,
    depth: usize,
    out: &mut Vec<Token>,
) -> Result<(), MapfileError> {
    let mut tokens = tokenize(&expanded.sources[file])?.into_iter();

    while let Some(mut token) = tokens.next() {
        token.file = file;
        if !token.is_keyword("INCLUDE") {
            out.push(token);
            continue;
        }

        let name = match tokens.next() {
            Some(name) if !name.is_keyword("END") => name,
            _ => {
                return Err(MapfileError::MissingValue {
                    keyword: "INCLUDE".to_string(),
                    line: token.line,
                })
            }
        };
        if depth >= MAX_INCLUDE_DEPTH {
            return Err(MapfileError::IncludeDepth {
                line: token.line,
                max: MAX_INCLUDE_DEPTH,
            });
        }

        let path = base_dir.join(name.text());
        let text = fs::read_to_string(&path).map_err(|source| MapfileError::Include {
            path: path.clone(),
            line: token.line,
            source,
        })?;
        debug!(path = %path.display(), depth = depth + 1, "Included mapfile");

        let target = expanded.sources.len();
        expanded.sources.push(text);
        expanded.includes.push(IncludeSite {
            file,
            span: token.span.start..name.span.end,
            target,
        });
        expand_source(expanded, target, base_dir, depth + 1, out)?;
    }
    Ok(())
}
