//! FB2 metadata extraction: walk the XML event stream once and pick out `title-info`
//! plus the cover binary it references.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::Record;
use crate::error::ExtractionError;

/// Turns raw document bytes into a [`Record`]. Implementations must be pure so
/// workers can share one instance without locking.
pub trait MetadataExtractor: Sync {
    fn extract(&self, bytes: &[u8]) -> Result<Record, ExtractionError>;
}

/// Extractor for FictionBook 2 documents.
#[derive(Clone, Copy, Debug, Default)]
pub struct Fb2Extractor;

impl MetadataExtractor for Fb2Extractor {
    fn extract(&self, bytes: &[u8]) -> Result<Record, ExtractionError> {
        parse_fb2(bytes)
    }
}

const ROOT: &[u8] = b"FictionBook";
/// Element path from the root to `title-info`.
const TITLE_INFO_DEPTH: usize = 3;

/// Elements that end a paragraph inside an annotation.
fn is_block(name: &[u8]) -> bool {
    matches!(
        name,
        b"p" | b"subtitle" | b"v" | b"stanza" | b"poem" | b"cite" | b"empty-line"
    )
}

fn malformed(err: impl std::fmt::Display) -> ExtractionError {
    ExtractionError::Malformed(err.to_string())
}

#[derive(Default)]
struct AuthorParts {
    first: String,
    middle: String,
    last: String,
    nickname: String,
}

impl AuthorParts {
    fn full_name(&self) -> Option<String> {
        let parts: Vec<&str> = [&self.first, &self.middle, &self.last]
            .into_iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect();
        if !parts.is_empty() {
            return Some(parts.join(" "));
        }
        let nick = self.nickname.trim();
        (!nick.is_empty()).then(|| nick.to_string())
    }
}

/// Accumulates plain text with whitespace runs collapsed; paragraphs split on block ends.
#[derive(Default)]
struct Paragraphs {
    done: Vec<String>,
    current: String,
}

impl Paragraphs {
    fn push_text(&mut self, text: &str) {
        for c in text.chars() {
            if c.is_whitespace() {
                if !self.current.is_empty() && !self.current.ends_with(' ') {
                    self.current.push(' ');
                }
            } else {
                self.current.push(c);
            }
        }
    }

    fn break_paragraph(&mut self) {
        let para = self.current.trim_end();
        if !para.is_empty() {
            self.done.push(para.to_string());
        }
        self.current.clear();
    }

    fn finish(mut self) -> String {
        self.break_paragraph();
        self.done.join("\n\n")
    }
}

/// Everything collected from `title-info`.
#[derive(Default)]
struct TitleInfo {
    title: String,
    authors: Vec<String>,
    author: AuthorParts,
    genres: Vec<String>,
    genre: String,
    lang: String,
    annotation: Paragraphs,
    keywords: String,
    series: Option<String>,
    series_number: Option<i64>,
    cover_ref: Option<String>,
}

impl TitleInfo {
    /// Text inside title-info; `rel` is the element path below `title-info`.
    fn on_text(&mut self, rel: &[Vec<u8>], text: &str) {
        let Some(first) = rel.first() else {
            return;
        };
        match (first.as_slice(), rel.get(1).map(Vec::as_slice)) {
            (b"book-title", _) => self.title.push_str(text),
            (b"author", Some(b"first-name")) => self.author.first.push_str(text),
            (b"author", Some(b"middle-name")) => self.author.middle.push_str(text),
            (b"author", Some(b"last-name")) => self.author.last.push_str(text),
            (b"author", Some(b"nickname")) => self.author.nickname.push_str(text),
            (b"genre", _) => self.genre.push_str(text),
            (b"lang", _) => self.lang.push_str(text),
            (b"annotation", _) => self.annotation.push_text(text),
            (b"keywords", _) => self.keywords.push_str(text),
            _ => {}
        }
    }

    fn on_start(
        &mut self,
        rel: &[Vec<u8>],
        elem: &BytesStart<'_>,
        reader: &Reader<&[u8]>,
    ) -> Result<(), ExtractionError> {
        let name = elem.local_name();
        match (rel, name.as_ref()) {
            ([], b"author") => self.author = AuthorParts::default(),
            ([], b"sequence") if self.series.is_none() => {
                let series =
                    attr_value(elem, b"name", reader)?.map(|s| s.trim().to_string());
                if let Some(series) = series.filter(|s| !s.is_empty()) {
                    self.series_number = attr_value(elem, b"number", reader)?
                        .and_then(|n| n.trim().parse().ok());
                    self.series = Some(series);
                }
            }
            ([parent], b"image")
                if parent.as_slice() == b"coverpage" && self.cover_ref.is_none() =>
            {
                self.cover_ref = attr_value(elem, b"href", reader)?
                    .and_then(|href| href.strip_prefix('#').map(str::to_string));
            }
            ([first, ..], b"empty-line") if first.as_slice() == b"annotation" => {
                self.annotation.break_paragraph();
            }
            _ => {}
        }
        Ok(())
    }

    fn on_end(&mut self, rel: &[Vec<u8>]) {
        match rel {
            [only] if only.as_slice() == b"author" => {
                if let Some(name) = std::mem::take(&mut self.author).full_name() {
                    self.authors.push(name);
                }
            }
            [only] if only.as_slice() == b"genre" => {
                let genre = std::mem::take(&mut self.genre).trim().to_string();
                if !genre.is_empty() && !self.genres.contains(&genre) {
                    self.genres.push(genre);
                }
            }
            [first, .., last] if first.as_slice() == b"annotation" && is_block(last) => {
                self.annotation.break_paragraph();
            }
            _ => {}
        }
    }

    fn into_record(self, cover: Option<Vec<u8>>) -> Result<Record, ExtractionError> {
        let mut record = Record::new(&self.title)?;
        record.authors = self.authors;
        record.genres = self.genres;
        record.language = self.lang.trim().to_string();
        record.annotation = self.annotation.finish();
        record.tags = self
            .keywords
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect();
        record.series = self.series;
        record.series_number = self.series_number;
        record.cover = cover;
        Ok(record)
    }
}

/// Decoded, unescaped value of the attribute whose local name is `key` (namespace prefix ignored).
fn attr_value(
    elem: &BytesStart<'_>,
    key: &[u8],
    reader: &Reader<&[u8]>,
) -> Result<Option<String>, ExtractionError> {
    for attr in elem.attributes() {
        let attr = attr.map_err(malformed)?;
        if attr.key.local_name().as_ref() == key {
            let value = attr
                .decode_and_unescape_value(reader.decoder())
                .map_err(malformed)?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn decode_cover(b64: &str) -> Option<Vec<u8>> {
    let clean: String = b64.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    if clean.is_empty() {
        return None;
    }
    STANDARD.decode(clean).ok()
}

/// Parse an FB2 document. Malformed XML, a non-FictionBook root or unclosed elements
/// are [`ExtractionError::Malformed`]; a missing or blank `book-title` is
/// [`ExtractionError::MissingField`].
pub fn parse_fb2(bytes: &[u8]) -> Result<Record, ExtractionError> {
    let mut reader = Reader::from_reader(bytes);
    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut info = TitleInfo::default();
    let mut saw_root = false;
    // Id of the cover binary being captured, and its base64 text so far.
    let mut binary: Option<String> = None;
    let mut cover_b64 = String::new();

    loop {
        let event = reader
            .read_event()
            .map_err(|e| malformed(format!("at byte {}: {}", reader.buffer_position(), e)))?;
        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let name = e.local_name().as_ref().to_vec();
                if stack.is_empty() {
                    if saw_root || name != ROOT {
                        return Err(malformed(format!(
                            "unexpected root element `{}`",
                            String::from_utf8_lossy(&name)
                        )));
                    }
                    saw_root = true;
                }
                if in_title_info(&stack) {
                    info.on_start(&stack[TITLE_INFO_DEPTH..], e, &reader)?;
                } else if stack.len() == 1
                    && name == b"binary"
                    && binary.is_none()
                    && cover_b64.is_empty()
                {
                    let id = attr_value(e, b"id", &reader)?;
                    if id.is_some() && id == info.cover_ref {
                        binary = id;
                    }
                }
                if matches!(event, Event::Start(_)) {
                    stack.push(name);
                } else if in_title_info(&stack) {
                    // An empty element opens and closes in one event.
                    stack.push(name);
                    info.on_end(&stack[TITLE_INFO_DEPTH..]);
                    stack.pop();
                }
            }
            Event::End(_) => {
                if in_title_info(&stack) && stack.len() > TITLE_INFO_DEPTH {
                    info.on_end(&stack[TITLE_INFO_DEPTH..]);
                }
                if stack.len() == 2 && stack[1] == b"binary" && binary.take().is_some() {
                    // Cover captured; stop looking at further binaries.
                    info.cover_ref = None;
                }
                stack.pop();
            }
            Event::Text(ref e) => {
                if in_title_info(&stack) && stack.len() > TITLE_INFO_DEPTH {
                    let text = e.unescape().map_err(malformed)?;
                    info.on_text(&stack[TITLE_INFO_DEPTH..], &text);
                } else if binary.is_some() && stack.len() == 2 {
                    cover_b64.push_str(&String::from_utf8_lossy(e));
                }
            }
            Event::CData(ref e) => {
                if in_title_info(&stack) && stack.len() > TITLE_INFO_DEPTH {
                    info.on_text(&stack[TITLE_INFO_DEPTH..], &String::from_utf8_lossy(e));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root {
        return Err(malformed("no root element"));
    }
    if !stack.is_empty() {
        return Err(malformed(format!(
            "unexpected end of document inside `{}`",
            String::from_utf8_lossy(stack.last().map(Vec::as_slice).unwrap_or_default())
        )));
    }
    info.into_record(decode_cover(&cover_b64))
}

/// True when the open-element path is at or below `FictionBook/description/title-info`.
fn in_title_info(stack: &[Vec<u8>]) -> bool {
    stack.len() >= TITLE_INFO_DEPTH
        && stack[0] == ROOT
        && stack[1] == b"description"
        && stack[2] == b"title-info"
}
