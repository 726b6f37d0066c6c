//! Block parser for mapfiles.
//!
//! Only the map-level settings the viewer needs and the name and connection
//! of each layer are interpreted. Every other statement and block is skipped,
//! so the parser stays tolerant of keywords it does not know about.

use std::ops::Range;

use map_common::ProjectionCode;
use tracing::debug;

use crate::description::{LayerInfo, MapDescription, DEFAULT_MAP_NAME, DEFAULT_RESOLUTION_DPI, METERS_UNIT_CODE};
use crate::error::MapfileError;
use crate::lexer::Token;

/// Keywords that open a block closed by `END`.
const BLOCK_KEYWORDS: &[&str] = &[
    "CLASS",
    "CLUSTER",
    "COMPOSITE",
    "FEATURE",
    "GRID",
    "JOIN",
    "LABEL",
    "LAYER",
    "LEADER",
    "LEGEND",
    "METADATA",
    "OUTPUTFORMAT",
    "PATTERN",
    "POINTS",
    "PROJECTION",
    "QUERYMAP",
    "REFERENCE",
    "SCALEBAR",
    "SCALETOKEN",
    "STYLE",
    "VALIDATION",
    "VALUES",
    "WEB",
];

/// Byte range within one of the document's sources.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SourceSpan {
    /// Source index; 0 is the top-level file.
    pub file: usize,
    pub range: Range<usize>,
}

impl SourceSpan {
    /// Empty span just after `token`.
    fn after(token: &Token) -> Self {
        Self {
            file: token.file,
            range: token.span.end..token.span.end,
        }
    }

    /// From the start of `first` through the end of `last`, when both come
    /// from the same source.
    fn covering(first: &Token, last: &Token) -> Option<Self> {
        (first.file == last.file).then(|| Self {
            file: first.file,
            range: first.span.start..last.span.end,
        })
    }
}

/// Byte positions used to rewrite a layer.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LayerSpans {
    /// Just after the `LAYER` keyword.
    pub body_start: SourceSpan,
    /// `CONNECTION "..."` statement, keyword through value.
    pub connection: Option<SourceSpan>,
}

/// Byte positions used to rewrite a document.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MapSpans {
    /// Just after the `MAP` keyword.
    pub body_start: SourceSpan,
    /// `EXTENT a b c d` statement, keyword through last value.
    pub extent: Option<SourceSpan>,
    pub layers: Vec<LayerSpans>,
}

/// Parse an expanded token stream into its description and rewrite
/// positions.
pub(crate) fn parse(tokens: Vec<Token>) -> Result<(MapDescription, MapSpans), MapfileError> {
    let mut parser = Parser { tokens, pos: 0 };
    parser.parse_map()
}

/// True if `keyword` (upper-case) opens a block in the given scope.
///
/// `SYMBOL` is a block only when defined inline at map level; inside classes
/// and styles it is a plain reference to a symbol.
fn opens_block(keyword: &str, map_scope: bool) -> bool {
    BLOCK_KEYWORDS.contains(&keyword) || (map_scope && keyword == "SYMBOL")
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Value following `keyword`.
    fn value(&mut self, keyword: &Token) -> Result<Token, MapfileError> {
        match self.next() {
            Some(token) if !token.is_keyword("END") => Ok(token),
            _ => Err(MapfileError::MissingValue {
                keyword: keyword.text().to_ascii_uppercase(),
                line: keyword.line,
            }),
        }
    }

    fn number(&mut self, keyword: &Token) -> Result<(f64, Token), MapfileError> {
        let token = self.value(keyword)?;
        let value = token
            .text()
            .parse::<f64>()
            .map_err(|_| MapfileError::InvalidValue {
                keyword: keyword.text().to_ascii_uppercase(),
                value: token.text().to_string(),
                line: token.line,
            })?;
        Ok((value, token))
    }

    fn parse_map(&mut self) -> Result<(MapDescription, MapSpans), MapfileError> {
        let opener = self.next().ok_or(MapfileError::Empty)?;
        if !opener.is_keyword("MAP") {
            return Err(MapfileError::ExpectedMap {
                found: opener.text().to_string(),
                line: opener.line,
            });
        }

        let mut description = MapDescription {
            root_name: DEFAULT_MAP_NAME.to_string(),
            unit_code: METERS_UNIT_CODE,
            resolution_dpi: DEFAULT_RESOLUTION_DPI,
            projection: ProjectionCode::fallback(),
            declared_extent: None,
            layers: Vec::new(),
        };
        let mut spans = MapSpans {
            body_start: SourceSpan::after(&opener),
            extent: None,
            layers: Vec::new(),
        };

        loop {
            let Some(token) = self.next() else {
                return Err(MapfileError::Unterminated {
                    block: "MAP".to_string(),
                    line: opener.line,
                });
            };
            let Some(keyword) = token.keyword() else {
                continue;
            };

            match keyword.as_str() {
                "END" => break,
                "NAME" => description.root_name = self.value(&token)?.text().to_string(),
                "UNITS" => {
                    let value = self.value(&token)?;
                    description.unit_code = unit_code(value.text()).ok_or_else(|| {
                        MapfileError::InvalidValue {
                            keyword: "UNITS".to_string(),
                            value: value.text().to_string(),
                            line: value.line,
                        }
                    })?;
                }
                "RESOLUTION" => description.resolution_dpi = self.number(&token)?.0,
                "EXTENT" => {
                    let mut values = [0.0; 4];
                    let mut last = token.clone();
                    for value in values.iter_mut() {
                        let (number, value_token) = self.number(&token)?;
                        *value = number;
                        last = value_token;
                    }
                    description.declared_extent = Some(values);
                    spans.extent = SourceSpan::covering(&token, &last);
                }
                "PROJECTION" => {
                    let entries = self.projection_entries(&token)?;
                    description.projection = ProjectionCode::from_declaration(&entries);
                }
                "LAYER" => {
                    let (layer, layer_spans) = self.parse_layer(&token)?;
                    description.layers.push(layer);
                    spans.layers.push(layer_spans);
                }
                other if opens_block(other, true) => self.skip_block(&token)?,
                _ => {}
            }
        }

        if let Some(extra) = self.next() {
            return Err(MapfileError::TrailingContent { line: extra.line });
        }

        debug!(
            name = %description.root_name,
            layers = description.layers.len(),
            "Parsed mapfile"
        );

        Ok((description, spans))
    }

    fn parse_layer(&mut self, opener: &Token) -> Result<(LayerInfo, LayerSpans), MapfileError> {
        let mut layer = LayerInfo::default();
        let mut spans = LayerSpans {
            body_start: SourceSpan::after(opener),
            connection: None,
        };

        loop {
            let token = self.next().ok_or_else(|| MapfileError::Unterminated {
                block: "LAYER".to_string(),
                line: opener.line,
            })?;
            let Some(keyword) = token.keyword() else {
                continue;
            };

            match keyword.as_str() {
                "END" => return Ok((layer, spans)),
                "NAME" => layer.name = Some(self.value(&token)?.text().to_string()),
                "CONNECTION" => {
                    let value = self.value(&token)?;
                    layer.connection = Some(value.text().to_string());
                    spans.connection = SourceSpan::covering(&token, &value);
                }
                other if opens_block(other, false) => self.skip_block(&token)?,
                _ => {}
            }
        }
    }

    /// Collect the entries of a `PROJECTION ... END` block.
    fn projection_entries(&mut self, opener: &Token) -> Result<Vec<String>, MapfileError> {
        let mut entries = Vec::new();
        loop {
            let token = self.next().ok_or_else(|| MapfileError::Unterminated {
                block: "PROJECTION".to_string(),
                line: opener.line,
            })?;
            if token.is_keyword("END") {
                return Ok(entries);
            }
            entries.push(token.text().to_string());
        }
    }

    fn skip_block(&mut self, opener: &Token) -> Result<(), MapfileError> {
        loop {
            let token = self.next().ok_or_else(|| MapfileError::Unterminated {
                block: opener.text().to_ascii_uppercase(),
                line: opener.line,
            })?;
            let Some(keyword) = token.keyword() else {
                continue;
            };
            if keyword == "END" {
                return Ok(());
            }
            if opens_block(&keyword, false) {
                self.skip_block(&token)?;
            }
        }
    }
}

/// Engine unit code for a `UNITS` keyword.
fn unit_code(value: &str) -> Option<i32> {
    let code = match value.to_ascii_uppercase().as_str() {
        "INCHES" => 0,
        "FEET" => 1,
        "MILES" => 2,
        "METERS" => 3,
        "KILOMETERS" => 4,
        "DD" => 5,
        "PIXELS" => 6,
        "PERCENTAGES" => 7,
        "NAUTICALMILES" => 8,
        _ => return None,
    };
    Some(code)
}
