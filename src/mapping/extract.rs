//! Raw text extraction from PDF floorplans.
//!
//! For every page, in page-number order, the text layer and the text of every
//! annotation (callouts, free-text notes, pop-ups) are collected. Layout is
//! ignored; label recognition happens later on the joined blob.
//!
//! Content streams are walked operator by operator: every string shown by
//! `Tj`, `'`, `"` or `TJ` is its own run, even when a whole sheet sits inside
//! one `BT ... ET` text object.

use std::collections::BTreeMap;

use lopdf::content::Content;
use lopdf::{Dictionary, Document, Encoding, Object, ObjectId};

use crate::error::ExtractError;

/// A `TJ` displacement below this (thousandths of an em) reads as a word gap.
const TJ_WORD_GAP: f32 = -100.0;

/// Text pulled from a single page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageText {
    /// 1-based page number
    pub number: u32,
    /// Text runs from the content streams.
    pub runs: Vec<String>,
    /// Contents of the page's annotations.
    pub annotations: Vec<String>,
}

impl PageText {
    /// The page's combined text: runs, then annotations, joined by single spaces.
    pub fn combined(&self) -> String {
        let runs = self.runs.join(" ");
        let notes = self.annotations.join(" ");
        format!("{runs} {notes}")
    }
}

/// Extract the raw text blob from a PDF held in memory.
///
/// A document without a text layer (a raster scan) yields an empty or
/// whitespace-only blob, not an error.
pub fn extract_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let pages = read_pages(bytes)?;
    Ok(join_pages(&pages))
}

/// Concatenate page texts in the given order, space separated.
pub fn join_pages(pages: &[PageText]) -> String {
    let mut blob = String::new();
    for page in pages {
        blob.push(' ');
        blob.push_str(&page.combined());
    }
    blob
}

/// Parse the document and collect the text of each page.
pub fn read_pages(bytes: &[u8]) -> Result<Vec<PageText>, ExtractError> {
    let doc = Document::load_mem(bytes)?;
    let pages = doc.get_pages();
    log::debug!("Document loaded, pages: {}", pages.len());

    // get_pages is keyed by page number, so iteration is already ascending.
    let mut out = Vec::with_capacity(pages.len());
    for (&number, &page_id) in pages.iter() {
        let runs = page_runs(&doc, number, page_id)?;
        let annotations = page_annotations(&doc, page_id);
        log::debug!(
            "Page {}: {} text runs, {} annotations",
            number,
            runs.len(),
            annotations.len()
        );
        out.push(PageText { number, runs, annotations });
    }
    Ok(out)
}

fn page_runs(doc: &Document, number: u32, page_id: ObjectId) -> Result<Vec<String>, ExtractError> {
    let page_err = |e: lopdf::Error| ExtractError::PageText { page: number, reason: e.to_string() };
    let encodings = page_encodings(doc, page_id).map_err(page_err)?;
    let data = doc.get_page_content(page_id).map_err(page_err)?;
    let content = Content::decode(&data).map_err(page_err)?;

    let mut runs = Vec::new();
    let mut encoding: Option<&Encoding> = None;
    for op in &content.operations {
        let shown = match op.operator.as_str() {
            "Tf" => {
                let name = op.operands.first().and_then(|o| o.as_name().ok());
                encoding = name.and_then(|n| encodings.get(n));
                if encoding.is_none() {
                    log::debug!("Page {}: no usable encoding for font {:?}", number, name.map(String::from_utf8_lossy));
                }
                continue;
            }
            "Tj" | "'" | "TJ" => op.operands.first(),
            "\"" => op.operands.get(2),
            _ => None,
        };
        let Some(text) = shown.zip(encoding).and_then(|(operand, enc)| run_text(operand, enc)) else {
            continue;
        };
        let text = text.trim();
        if !text.is_empty() {
            runs.push(text.to_string());
        }
    }
    Ok(runs)
}

/// Encodings of the page's fonts by resource name. Fonts lopdf cannot decode are left out.
fn page_encodings(doc: &Document, page_id: ObjectId) -> Result<BTreeMap<Vec<u8>, Encoding<'_>>, lopdf::Error> {
    let mut encodings = BTreeMap::new();
    for (name, font) in doc.get_page_fonts(page_id)? {
        match font.get_font_encoding(doc) {
            Ok(encoding) => {
                encodings.insert(name, encoding);
            }
            Err(e) => log::warn!("Skipping text in font {}: {}", String::from_utf8_lossy(&name), e),
        }
    }
    Ok(encodings)
}

/// Text of one show-text operand: a string, or a `TJ` array whose large gaps become spaces.
fn run_text(operand: &Object, encoding: &Encoding) -> Option<String> {
    match operand {
        Object::String(bytes, _) => decode_run(encoding, bytes),
        Object::Array(items) => {
            let mut text = String::new();
            for item in items {
                match item {
                    Object::String(bytes, _) => {
                        if let Some(piece) = decode_run(encoding, bytes) {
                            text.push_str(&piece);
                        }
                    }
                    Object::Integer(i) if (*i as f32) < TJ_WORD_GAP => text.push(' '),
                    Object::Real(r) if *r < TJ_WORD_GAP => text.push(' '),
                    _ => {}
                }
            }
            Some(text)
        }
        _ => None,
    }
}

fn decode_run(encoding: &Encoding, bytes: &[u8]) -> Option<String> {
    match Document::decode_text(encoding, bytes) {
        Ok(text) => Some(text),
        Err(e) => {
            log::debug!("Undecodable text run: {}", e);
            None
        }
    }
}

fn page_annotations(doc: &Document, page_id: ObjectId) -> Vec<String> {
    let Ok(page) = doc.get_dictionary(page_id) else {
        return Vec::new();
    };
    let Some(Object::Array(annots)) = page.get(b"Annots").ok().and_then(|o| resolve(doc, o)) else {
        return Vec::new();
    };

    annots
        .iter()
        .filter_map(|a| resolve(doc, a))
        .filter_map(|a| a.as_dict().ok())
        .filter_map(annotation_text)
        .collect()
}

/// The textual content of one annotation: `Contents`, else its rich text with markup removed.
fn annotation_text(dict: &Dictionary) -> Option<String> {
    let contents = string_entry(dict, b"Contents").filter(|s| !s.trim().is_empty());
    let text = contents.or_else(|| string_entry(dict, b"RC").map(|rc| strip_markup(&rc)))?;
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

fn string_entry(dict: &Dictionary, key: &[u8]) -> Option<String> {
    match dict.get(key).ok()? {
        Object::String(bytes, _) => Some(decode_pdf_string(bytes)),
        _ => None,
    }
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => match doc.get_object(*id) {
            Ok(o) => Some(o),
            Err(e) => {
                log::warn!("Dangling reference {:?}: {}", id, e);
                None
            }
        },
        other => Some(other),
    }
}

/// Decode a PDF text string: UTF-16BE when it carries a byte order mark,
/// otherwise a single-byte encoding.
pub fn decode_pdf_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE_u8, 0xFF][..]) {
        let (text, _, had_errors) = encoding_rs::UTF_16BE.decode(rest);
        if had_errors {
            log::warn!("Annotation text contained invalid UTF-16");
        }
        text.into_owned()
    } else {
        let (text, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
        text.into_owned()
    }
}

/// Drop XML/XHTML tags from rich-text annotation bodies, keeping tag boundaries as spaces.
fn strip_markup(rich: &str) -> String {
    let mut out = String::with_capacity(rich.len());
    let mut in_tag = false;
    for c in rich.chars() {
        match c {
            '<' => {
                in_tag = true;
                out.push(' ');
            }
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combined_joins_runs_then_annotations() {
        let page = PageText {
            number: 1,
            runs: vec!["D101".into(), "LEGEND".into()],
            annotations: vec!["AP 1".into()],
        };
        assert_eq!(page.combined(), "D101 LEGEND AP 1");
    }

    #[test]
    fn pages_are_joined_with_spaces() {
        let pages = vec![
            PageText { number: 1, runs: vec!["D1".into()], annotations: vec![] },
            PageText { number: 2, runs: vec!["D2".into()], annotations: vec!["TV1".into()] },
        ];
        let blob = join_pages(&pages);
        let tokens: Vec<_> = blob.split_whitespace().collect();
        assert_eq!(tokens, ["D1", "D2", "TV1"]);
    }

    #[test]
    fn garbage_bytes_are_a_parse_error() {
        let err = extract_text(b"this is not a pdf").unwrap_err();
        assert!(matches!(err, ExtractError::DocumentParse(_)));
    }

    #[test]
    fn decodes_utf16_and_single_byte_strings() {
        assert_eq!(decode_pdf_string(&[0xFE, 0xFF, 0x00, b'S', 0x00, b'P', 0x00, b'1']), "SP1");
        assert_eq!(decode_pdf_string(b"CAM 2"), "CAM 2");
    }

    #[test]
    fn rich_text_markup_is_removed() {
        let rc = "<body><p>TV1</p><p>TV2</p></body>";
        let tokens: Vec<_> = strip_markup(rc).split_whitespace().map(str::to_string).collect();
        assert_eq!(tokens, ["TV1", "TV2"]);
    }

    #[test]
    fn annotation_prefers_contents_over_rich_text() {
        let mut dict = Dictionary::new();
        dict.set("Contents", Object::string_literal("KP1"));
        dict.set("RC", Object::string_literal("<p>ignored</p>"));
        assert_eq!(annotation_text(&dict).as_deref(), Some("KP1"));

        let mut rich_only = Dictionary::new();
        rich_only.set("RC", Object::string_literal("<p>GB2</p>"));
        assert_eq!(annotation_text(&rich_only).as_deref(), Some("GB2"));

        assert_eq!(annotation_text(&Dictionary::new()), None);
    }
}
