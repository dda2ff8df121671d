use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::debug;
use quick_xml::Reader;
use quick_xml::events::Event;
use thiserror::Error;
use zip::ZipArchive;

const DOCUMENT_PART: &str = "word/document.xml";

#[derive(Debug, Error)]
pub enum DocxError {
    #[error("failed to read document: {0}")]
    Io(#[from] std::io::Error),
    #[error("document is not a valid .docx archive: {0}")]
    Archive(#[from] zip::result::ZipError),
    #[error("document has no {DOCUMENT_PART} part")]
    MissingDocumentPart,
    #[error("failed to parse document XML: {0}")]
    Xml(#[from] quick_xml::Error),
}

/// Read the ordered paragraph texts of a DOCX file.
///
/// Runs within a paragraph are concatenated; soft line breaks become `\n` and
/// tabs become `\t`. Paragraphs inside tables are skipped, and all styling,
/// images, and other markup are ignored.
///
/// # Errors
/// Returns an error when the file cannot be read, is not a ZIP container,
/// lacks the main document part, or carries malformed XML.
pub fn read_paragraphs(path: &Path) -> Result<Vec<String>, DocxError> {
    let file = File::open(path)?;
    let mut archive = ZipArchive::new(file)?;

    let mut xml = String::new();
    match archive.by_name(DOCUMENT_PART) {
        Ok(mut part) => {
            part.read_to_string(&mut xml)?;
        }
        Err(zip::result::ZipError::FileNotFound) => return Err(DocxError::MissingDocumentPart),
        Err(error) => return Err(DocxError::Archive(error)),
    }

    let paragraphs = parse_paragraphs(&xml)?;
    debug!(
        "Read {} paragraphs from {}",
        paragraphs.len(),
        path.display()
    );
    Ok(paragraphs)
}

fn parse_paragraphs(xml: &str) -> Result<Vec<String>, DocxError> {
    let mut reader = Reader::from_str(xml);

    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_paragraph = false;
    let mut in_text = false;
    let mut table_depth = 0_usize;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.name().as_ref() {
                b"w:tbl" => table_depth += 1,
                b"w:p" if table_depth == 0 => {
                    in_paragraph = true;
                    current.clear();
                }
                b"w:t" if in_paragraph => in_text = true,
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:p" if table_depth == 0 => paragraphs.push(String::new()),
                b"w:br" | b"w:cr" if in_paragraph => current.push('\n'),
                b"w:tab" if in_paragraph => current.push('\t'),
                _ => {}
            },
            Event::Text(e) if in_text => current.push_str(&e.unescape()?),
            Event::End(e) => match e.name().as_ref() {
                b"w:tbl" => table_depth = table_depth.saturating_sub(1),
                b"w:t" => in_text = false,
                b"w:p" if in_paragraph => {
                    in_paragraph = false;
                    paragraphs.push(std::mem::take(&mut current));
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs)
}
