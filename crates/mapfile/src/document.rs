//! A loaded mapfile together with the overrides to apply to it.

use std::fs;
use std::path::{Path, PathBuf};

use map_common::Extent;
use tracing::debug;

use crate::description::MapDescription;
use crate::error::MapfileError;
use crate::include::{self, IncludeSite};
use crate::parser::{self, MapSpans, SourceSpan};

/// Replacement of `len` bytes at a position in one source.
type Edit = (usize, usize, String);

/// Mapfile source plus its parsed description.
///
/// `INCLUDE` statements are expanded for the description. Overrides are
/// recorded on the document and applied textually by
/// [`MapDocument::to_mapfile_string`], leaving every other byte of the
/// original source untouched.
#[derive(Debug, Clone)]
pub struct MapDocument {
    path: Option<PathBuf>,
    /// Top-level source first, then every included file in reading order.
    sources: Vec<String>,
    includes: Vec<IncludeSite>,
    description: MapDescription,
    spans: MapSpans,
    extent_override: Option<Extent>,
    connection_override: Option<String>,
}

impl MapDocument {
    /// Parse mapfile source that does not live on disk.
    ///
    /// Included files resolve against the current directory.
    pub fn parse(source: impl Into<String>) -> Result<Self, MapfileError> {
        Self::build(source.into(), None, Path::new("."))
    }

    fn build(source: String, path: Option<PathBuf>, base_dir: &Path) -> Result<Self, MapfileError> {
        let expanded = include::expand(source, base_dir)?;
        let (description, spans) = parser::parse(expanded.tokens)?;
        Ok(Self {
            path,
            sources: expanded.sources,
            includes: expanded.includes,
            description,
            spans,
            extent_override: None,
            connection_override: None,
        })
    }

    /// Read and parse a mapfile.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, MapfileError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| MapfileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), bytes = source.len(), "Read mapfile");

        let base_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        Self::build(source, Some(path.to_path_buf()), base_dir)
    }

    /// File the document was read from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Description with all recorded overrides applied.
    pub fn description(&self) -> &MapDescription {
        &self.description
    }

    /// Replace the map extent.
    pub fn set_extent(&mut self, extent: Extent) {
        self.description.declared_extent = Some(extent.to_array());
        self.extent_override = Some(extent);
    }

    /// Replace the `CONNECTION` of every layer.
    pub fn set_layer_connection(&mut self, connection: impl Into<String>) {
        let connection = connection.into();
        for layer in &mut self.description.layers {
            layer.connection = Some(connection.clone());
        }
        self.connection_override = Some(connection);
    }

    /// True if any override has been recorded.
    pub fn is_modified(&self) -> bool {
        self.extent_override.is_some() || self.connection_override.is_some()
    }

    /// Original source text of the top-level file.
    pub fn source(&self) -> &str {
        &self.sources[0]
    }

    /// Number of files pulled in through `INCLUDE`.
    pub fn include_count(&self) -> usize {
        self.includes.len()
    }

    /// Mapfile text with the recorded overrides applied.
    ///
    /// An included file touched by an override is inlined in place of its
    /// `INCLUDE` statement; untouched includes are kept as statements.
    pub fn to_mapfile_string(&self) -> String {
        let mut edits: Vec<Vec<Edit>> = vec![Vec::new(); self.sources.len()];
        let mut push = |span: &SourceSpan, replacement: String| {
            edits[span.file].push((span.range.start, span.range.len(), replacement));
        };

        if let Some(extent) = &self.extent_override {
            let statement = format!(
                "EXTENT {} {} {} {}",
                extent.min_x, extent.min_y, extent.max_x, extent.max_y
            );
            match &self.spans.extent {
                Some(span) => push(span, statement),
                None => push(&self.spans.body_start, format!("\n  {}", statement)),
            }
        }

        if let Some(connection) = &self.connection_override {
            let statement = format!("CONNECTION {}", quote(connection));
            for layer in &self.spans.layers {
                match &layer.connection {
                    Some(span) => push(span, statement.clone()),
                    None => push(&layer.body_start, format!("\n    {}", statement)),
                }
            }
        }

        self.render_source(0, &edits).0
    }

    /// Text of source `file` with its edits applied, and whether anything in
    /// it or its includes changed.
    fn render_source(&self, file: usize, edits: &[Vec<Edit>]) -> (String, bool) {
        let mut own = edits[file].clone();
        for site in self.includes.iter().filter(|site| site.file == file) {
            let (text, changed) = self.render_source(site.target, edits);
            if changed {
                own.push((site.span.start, site.span.len(), text));
            }
        }

        let source = &self.sources[file];
        if own.is_empty() {
            return (source.clone(), false);
        }
        own.sort_by_key(|(position, _, _)| *position);

        let mut output = String::with_capacity(source.len() + 64);
        let mut cursor = 0;
        for (position, len, replacement) in own {
            output.push_str(&source[cursor..position]);
            output.push_str(&replacement);
            cursor = position + len;
        }
        output.push_str(&source[cursor..]);
        (output, true)
    }
}

/// Double-quote a mapfile string value.
fn quote(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{}\"", escaped)
}
