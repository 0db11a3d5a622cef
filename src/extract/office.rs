//! Text from OOXML (DOCX) and OpenDocument (ODT) containers.
//!
//! Both formats are zip archives with one XML part holding the body text.
//! Only paragraph text is needed, so the XML is scanned for the handful of
//! elements that carry text instead of being parsed into a tree.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use zip::ZipArchive;

use super::ExtractionError;

const DOCX_BODY: &str = "word/document.xml";
const ODT_BODY: &str = "content.xml";

/// Paragraph texts of a DOCX file joined with newlines.
pub fn docx_text(path: &Path) -> Result<String, ExtractionError> {
    let xml = read_part(path, DOCX_BODY)?;
    Ok(docx_paragraphs(&xml).join("\n"))
}

/// Paragraph texts of an ODT file joined with newlines.
pub fn odt_text(path: &Path) -> Result<String, ExtractionError> {
    let xml = read_part(path, ODT_BODY)?;
    Ok(odt_paragraphs(&xml).join("\n"))
}

fn read_part(path: &Path, part: &str) -> Result<String, ExtractionError> {
    let file = File::open(path)?;
    let mut archive = ZipArchive::new(file).map_err(|e| {
        ExtractionError::MalformedDocument(format!("{}: not a zip container ({})", path.display(), e))
    })?;
    let mut entry = archive.by_name(part).map_err(|_| {
        ExtractionError::MalformedDocument(format!("{}: missing {}", path.display(), part))
    })?;

    let mut xml = String::new();
    entry.read_to_string(&mut xml)?;
    Ok(xml)
}

fn regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("static regex"))
}

/// Paragraph texts in order of their opening tags.
///
/// Paragraphs can nest (text boxes, frames anchored in a paragraph). Text
/// always belongs to the innermost open paragraph, so an outer paragraph
/// keeps the text on both sides of a nested one.
#[derive(Default)]
struct Paragraphs {
    texts: Vec<String>,
    open: Vec<usize>,
}

impl Paragraphs {
    fn start(&mut self) {
        self.open.push(self.texts.len());
        self.texts.push(String::new());
    }

    fn add_empty(&mut self) {
        self.texts.push(String::new());
    }

    fn end(&mut self) {
        self.open.pop();
    }

    fn is_open(&self) -> bool {
        !self.open.is_empty()
    }

    fn push(&mut self, text: &str) {
        if let Some(&i) = self.open.last() {
            self.texts[i].push_str(text);
        }
    }

    /// Track `name` paragraphs; returns false when `tag` is some other element.
    fn track(&mut self, tag: &str, name: &str) -> bool {
        if is_element(tag, name) {
            if tag.ends_with("/>") {
                self.add_empty();
            } else {
                self.start();
            }
            true
        } else if is_closing(tag, name) {
            self.end();
            true
        } else {
            false
        }
    }
}

fn tokens(xml: &str) -> regex::Matches<'static, '_> {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    regex(&TOKEN, r"<[^>]*>|[^<]+").find_iter(xml)
}

/// Split `w:p` paragraphs out of `word/document.xml`.
pub(crate) fn docx_paragraphs(xml: &str) -> Vec<String> {
    let mut paragraphs = Paragraphs::default();
    let mut in_text = false;
    // Paragraph properties hold tab stop definitions that are not text.
    let mut properties = 0usize;

    for tok in tokens(xml) {
        let s = tok.as_str();
        if !s.starts_with('<') {
            if in_text {
                paragraphs.push(&decode_entities(s));
            }
            continue;
        }
        if paragraphs.track(s, "w:p") {
            in_text = false;
        } else if is_element(s, "w:pPr") {
            if !s.ends_with("/>") {
                properties += 1;
            }
        } else if is_closing(s, "w:pPr") {
            properties = properties.saturating_sub(1);
        } else if properties > 0 || !paragraphs.is_open() {
            continue;
        } else if is_element(s, "w:t") {
            in_text = !s.ends_with("/>");
        } else if is_closing(s, "w:t") {
            in_text = false;
        } else if is_element(s, "w:tab") {
            paragraphs.push("\t");
        } else if is_element(s, "w:br") || is_element(s, "w:cr") {
            paragraphs.push("\n");
        }
    }

    paragraphs.texts
}

/// Collect every `text:p` paragraph from `content.xml`.
pub(crate) fn odt_paragraphs(xml: &str) -> Vec<String> {
    static SPACE_COUNT: OnceLock<Regex> = OnceLock::new();
    let space_count = regex(&SPACE_COUNT, r#"text:c="(\d+)""#);

    let mut paragraphs = Paragraphs::default();
    for tok in tokens(xml) {
        let s = tok.as_str();
        if paragraphs.track(s, "text:p") || !paragraphs.is_open() {
            continue;
        }
        if is_element(s, "text:s") {
            let count = space_count
                .captures(s)
                .and_then(|c| c[1].parse::<usize>().ok())
                .unwrap_or(1);
            paragraphs.push(&" ".repeat(count));
        } else if is_element(s, "text:tab") {
            paragraphs.push("\t");
        } else if is_element(s, "text:line-break") {
            paragraphs.push("\n");
        } else if !s.starts_with('<') {
            paragraphs.push(&decode_entities(s));
        }
    }

    paragraphs.texts
}

/// Whether `tag` opens (or self-closes) the element `name`.
fn is_element(tag: &str, name: &str) -> bool {
    tag.strip_prefix('<')
        .and_then(|t| t.strip_prefix(name))
        .map(|rest| rest.starts_with(|c: char| c.is_whitespace() || c == '/' || c == '>'))
        .unwrap_or(false)
}

/// Whether `tag` is the closing tag of `name`.
fn is_closing(tag: &str, name: &str) -> bool {
    tag.strip_prefix("</")
        .and_then(|t| t.strip_prefix(name))
        .map(|rest| rest.trim_start() == ">")
        .unwrap_or(false)
}

/// Decode the predefined XML entities and numeric character references.
pub(crate) fn decode_entities(s: &str) -> String {
    static ENTITY: OnceLock<Regex> = OnceLock::new();

    if !s.contains('&') {
        return s.to_string();
    }

    let entity = regex(&ENTITY, r"&(#x[0-9a-fA-F]+|#[0-9]+|lt|gt|amp|quot|apos);");
    entity
        .replace_all(s, |caps: &Captures| {
            let name = &caps[1];
            let decoded = match name {
                "lt" => Some('<'),
                "gt" => Some('>'),
                "amp" => Some('&'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => {
                    let code = match name.strip_prefix("#x") {
                        Some(hex) => u32::from_str_radix(hex, 16).ok(),
                        None => name[1..].parse::<u32>().ok(),
                    };
                    code.and_then(char::from_u32)
                }
            };
            decoded
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
