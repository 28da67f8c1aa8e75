//! Parsed engine output.
//!
//! Content extraction produces an XML document of `Line` elements, each
//! holding typed `Unit` children and the tag-ratio statistics the engine
//! used to classify the line:
//!
//! ```xml
//! <ResultSet>
//! <Result>
//! <Line is_content="yes" num_tags="1" num_chars="5" tag_ratio="0.500000"
//!       smoothed_tag_ratio="0.500000" derivate="0.000000" smoothed_derivate="0.000000">
//! <Unit type="tag">&lt;p&gt;</Unit>
//! <Unit type="text">Hello</Unit>
//! </Line>
//! </Result>
//! </ResultSet>
//! ```
//!
//! Text extraction produces plain lines. [`parse`] turns either into an
//! [`Extraction`]; a malformed line fails the whole result.

use std::borrow::Cow;
use std::fmt;

use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use serde::Serialize;

use crate::{ExtractError, Result};

/// Which engine front end produced the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionKind {
    /// Classified Line/Unit output.
    Content,
    /// Plain text, one line per output line.
    Text,
}

impl fmt::Display for ExtractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Content => f.write_str("content"),
            Self::Text => f.write_str("text"),
        }
    }
}

/// Kind of a fragment within a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    /// Markup such as `<p>` or `</div>`.
    Tag,
    /// Visible text.
    Text,
    /// Text that is not rendered, e.g. script or style bodies and comments.
    Invisible,
}

impl UnitKind {
    /// Wire name of the kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tag => "tag",
            Self::Text => "text",
            Self::Invisible => "invisible",
        }
    }

    fn from_attr(value: &str) -> Option<Self> {
        match value {
            "tag" => Some(Self::Tag),
            "text" => Some(Self::Text),
            "invisible" => Some(Self::Invisible),
            _ => None,
        }
    }
}

/// A typed fragment of a line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Unit {
    pub kind: UnitKind,
    pub content: String,
}

impl Unit {
    pub fn new(kind: UnitKind, content: impl Into<String>) -> Self {
        Self { kind, content: content.into() }
    }
}

/// One source line with its statistics and classification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Line {
    pub num_tags: u64,
    pub num_chars: u64,
    pub tag_ratio: f64,
    pub smoothed_tag_ratio: f64,
    pub derivative: f64,
    pub smoothed_derivative: f64,
    pub is_content: bool,
    pub units: Vec<Unit>,
}

impl Line {
    /// Concatenated content of all units, in order.
    pub fn text(&self) -> String {
        self.units.iter().map(|unit| unit.content.as_str()).collect()
    }

    /// True when the units hold nothing but whitespace.
    pub fn is_blank(&self) -> bool {
        self.units.iter().all(|unit| unit.content.trim().is_empty())
    }
}

/// Content-mode result: every line the engine reported, in order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractionResult {
    pub lines: Vec<Line>,
}

impl ExtractionResult {
    pub fn new(lines: Vec<Line>) -> Self {
        Self { lines }
    }

    /// Non-blank lines paired with their 1-based sequence number.
    ///
    /// Blank lines are skipped without consuming a number.
    pub fn numbered_lines(&self) -> impl Iterator<Item = (usize, &Line)> {
        self.lines
            .iter()
            .filter(|line| !line.is_blank())
            .enumerate()
            .map(|(i, line)| (i + 1, line))
    }

    /// Number of lines classified as content among the non-blank ones.
    pub fn content_line_count(&self) -> usize {
        self.numbered_lines().filter(|(_, line)| line.is_content).count()
    }
}

/// Text-mode result: the non-empty output lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionText {
    pub lines: Vec<String>,
}

impl ExtractionText {
    /// Builds a text result, dropping empty lines.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let lines = lines.into_iter().map(Into::into).filter(|line: &String| !line.is_empty()).collect();
        Self { lines }
    }

    /// Lines paired with their 1-based sequence number.
    pub fn numbered_lines(&self) -> impl Iterator<Item = (usize, &str)> {
        self.lines.iter().enumerate().map(|(i, line)| (i + 1, line.as_str()))
    }
}

/// Parsed engine output of either kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Extraction {
    Content(ExtractionResult),
    Text(ExtractionText),
}

impl Extraction {
    pub fn kind(&self) -> ExtractionKind {
        match self {
            Self::Content(_) => ExtractionKind::Content,
            Self::Text(_) => ExtractionKind::Text,
        }
    }

    /// Number of rows a report of this result has.
    pub fn row_count(&self) -> usize {
        match self {
            Self::Content(result) => result.numbered_lines().count(),
            Self::Text(text) => text.lines.len(),
        }
    }
}

/// Parses engine output produced in the given mode.
pub fn parse(output: &[u8], kind: ExtractionKind) -> Result<Extraction> {
    match kind {
        ExtractionKind::Content => parse_content(output).map(Extraction::Content),
        ExtractionKind::Text => parse_text(output).map(Extraction::Text),
    }
}

/// Parses plain-text engine output.
///
/// Splits on `\n`, `\r\n` and `\r` and drops empty lines.
pub fn parse_text(output: &[u8]) -> Result<ExtractionText> {
    let text = std::str::from_utf8(output).map_err(|e| ExtractError::ParseFailure {
        kind: ExtractionKind::Text,
        reason: format!("output is not valid UTF-8: {e}"),
    })?;
    Ok(ExtractionText::from_lines(text.split(['\n', '\r'])))
}

fn malformed(reason: impl Into<String>) -> ExtractError {
    ExtractError::ParseFailure { kind: ExtractionKind::Content, reason: reason.into() }
}

/// Line attribute names: wire name first, camel-case alias second.
const IS_CONTENT: [&str; 2] = ["is_content", "isContent"];
const NUM_TAGS: [&str; 2] = ["num_tags", "numTags"];
const NUM_CHARS: [&str; 2] = ["num_chars", "numChars"];
const TAG_RATIO: [&str; 2] = ["tag_ratio", "tagRatio"];
const SMOOTHED_TAG_RATIO: [&str; 2] = ["smoothed_tag_ratio", "smoothedTagRatio"];
const DERIVATIVE: [&str; 2] = ["derivate", "derivative"];
const SMOOTHED_DERIVATIVE: [&str; 2] = ["smoothed_derivate", "smoothedDerivative"];
const UNIT_KIND: [&str; 2] = ["type", "kind"];

struct Attributes(Vec<(String, String)>);

impl Attributes {
    fn read(element: &BytesStart<'_>) -> Result<Self> {
        let mut pairs = Vec::new();
        for attr in element.attributes() {
            let attr = attr.map_err(|e| malformed(format!("bad attribute: {e}")))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| malformed(format!("bad value for attribute {key}: {e}")))?;
            pairs.push((key, value.into_owned()));
        }
        Ok(Self(pairs))
    }

    fn get(&self, names: [&str; 2]) -> Option<&str> {
        names
            .iter()
            .find_map(|name| self.0.iter().find(|(key, _)| key == name).map(|(_, value)| value.as_str()))
    }

    fn require(&self, names: [&str; 2], line_no: usize) -> Result<&str> {
        self.get(names)
            .ok_or_else(|| malformed(format!("line {line_no}: missing attribute {}", names[0])))
    }

    fn integer(&self, names: [&str; 2], line_no: usize) -> Result<u64> {
        let raw = self.require(names, line_no)?;
        raw.trim()
            .parse()
            .map_err(|_| malformed(format!("line {line_no}: {} is not an integer: {raw:?}", names[0])))
    }

    fn float(&self, names: [&str; 2], line_no: usize) -> Result<f64> {
        let raw = self.require(names, line_no)?;
        raw.trim()
            .parse()
            .map_err(|_| malformed(format!("line {line_no}: {} is not a number: {raw:?}", names[0])))
    }
}

fn parse_line(element: &BytesStart<'_>, line_no: usize) -> Result<Line> {
    let attrs = Attributes::read(element)?;
    Ok(Line {
        num_tags: attrs.integer(NUM_TAGS, line_no)?,
        num_chars: attrs.integer(NUM_CHARS, line_no)?,
        tag_ratio: attrs.float(TAG_RATIO, line_no)?,
        smoothed_tag_ratio: attrs.float(SMOOTHED_TAG_RATIO, line_no)?,
        derivative: attrs.float(DERIVATIVE, line_no)?,
        smoothed_derivative: attrs.float(SMOOTHED_DERIVATIVE, line_no)?,
        is_content: attrs.get(IS_CONTENT) == Some("yes"),
        units: Vec::new(),
    })
}

fn parse_unit_kind(element: &BytesStart<'_>, line_no: usize) -> Result<UnitKind> {
    let attrs = Attributes::read(element)?;
    let value = attrs.require(UNIT_KIND, line_no)?;
    UnitKind::from_attr(value).ok_or_else(|| malformed(format!("line {line_no}: unknown unit type {value:?}")))
}

/// Parses content-mode (XML) engine output.
///
/// `Line` elements are collected in document order at any depth, so one
/// `Result` per archive entry is flattened into a single sequence.
pub fn parse_content(output: &[u8]) -> Result<ExtractionResult> {
    let mut reader = Reader::from_reader(output);
    let mut buf = Vec::new();
    let mut state = ContentParser::default();

    loop {
        match reader
            .read_event_into(&mut buf)
            .map_err(|e| malformed(format!("invalid XML at byte {}: {e}", reader.buffer_position())))?
        {
            Event::Start(e) => state.open(&e, false)?,
            Event::Empty(e) => state.open(&e, true)?,
            Event::End(e) => state.close(e.name().as_ref()),
            Event::Text(t) => {
                let raw = std::str::from_utf8(&t)
                    .map_err(|_| malformed(format!("line {}: text is not UTF-8", state.line_no())))?;
                let text = unescape(&normalize_newlines(raw))
                    .map_err(|e| malformed(format!("line {}: bad text: {e}", state.line_no())))?
                    .into_owned();
                state.text(&text)?;
            }
            Event::CData(c) => {
                let raw = std::str::from_utf8(&c)
                    .map_err(|_| malformed(format!("line {}: CDATA is not UTF-8", state.line_no())))?;
                state.text(&normalize_newlines(raw))?;
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    state.finish()
}

/// XML end-of-line handling: `\r\n` and lone `\r` become `\n`.
///
/// Applied to raw markup before entity expansion, so `&#13;` still yields `\r`.
fn normalize_newlines(raw: &str) -> Cow<'_, str> {
    if raw.contains('\r') { Cow::Owned(raw.replace("\r\n", "\n").replace('\r', "\n")) } else { Cow::Borrowed(raw) }
}

#[derive(Default)]
struct ContentParser {
    lines: Vec<Line>,
    line: Option<Line>,
    unit: Option<Unit>,
    depth: usize,
    saw_root: bool,
}

impl ContentParser {
    fn line_no(&self) -> usize {
        self.lines.len() + 1
    }

    fn open(&mut self, element: &BytesStart<'_>, is_empty: bool) -> Result<()> {
        self.saw_root = true;
        if !is_empty {
            self.depth += 1;
        }
        if self.unit.is_some() {
            return Err(malformed(format!("line {}: element inside Unit", self.line_no())));
        }

        match element.name().as_ref() {
            b"Line" => {
                if self.line.is_some() {
                    return Err(malformed(format!("line {}: nested Line", self.line_no())));
                }
                let parsed = parse_line(element, self.line_no())?;
                if is_empty {
                    self.lines.push(parsed);
                } else {
                    self.line = Some(parsed);
                }
            }
            b"Unit" => {
                let line_no = self.line_no();
                let Some(current) = self.line.as_mut() else {
                    return Err(malformed("Unit outside of a Line"));
                };
                let kind = parse_unit_kind(element, line_no)?;
                if is_empty {
                    current.units.push(Unit::new(kind, ""));
                } else {
                    self.unit = Some(Unit::new(kind, String::new()));
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn close(&mut self, name: &[u8]) {
        self.depth = self.depth.saturating_sub(1);
        match name {
            b"Unit" => {
                if let (Some(done), Some(current)) = (self.unit.take(), self.line.as_mut()) {
                    current.units.push(done);
                }
            }
            b"Line" => {
                if let Some(done) = self.line.take() {
                    self.lines.push(done);
                }
            }
            _ => {}
        }
    }

    fn text(&mut self, text: &str) -> Result<()> {
        match self.unit.as_mut() {
            Some(unit) => unit.content.push_str(text),
            None if self.line.is_some() && !text.trim().is_empty() => {
                return Err(malformed(format!("line {}: text outside of a Unit", self.line_no())));
            }
            None => {}
        }
        Ok(())
    }

    fn finish(self) -> Result<ExtractionResult> {
        if !self.saw_root {
            return Err(malformed("no result document in engine output"));
        }
        if self.depth != 0 || self.line.is_some() || self.unit.is_some() {
            return Err(malformed("engine output ended inside an element"));
        }
        Ok(ExtractionResult::new(self.lines))
    }
}
