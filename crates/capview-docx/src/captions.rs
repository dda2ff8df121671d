use std::path::Path;

use log::info;

use crate::document::{DocxError, read_paragraphs};

/// Split an ordered paragraph sequence into captions.
///
/// Blank paragraphs are boundaries: consecutive non-blank paragraphs form one
/// caption joined with `\n`, runs of blank paragraphs collapse to a single
/// boundary, and a trailing caption without a closing blank line is still
/// emitted. No empty captions are ever produced.
pub fn extract_captions<I, S>(paragraphs: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut captions = Vec::new();
    let mut current = String::new();

    for paragraph in paragraphs {
        let text = paragraph.as_ref().trim();
        if text.is_empty() {
            if !current.is_empty() {
                captions.push(std::mem::take(&mut current));
            }
        } else {
            if !current.is_empty() {
                current.push('\n');
            }
            current.push_str(text);
        }
    }

    if !current.is_empty() {
        captions.push(current);
    }

    captions
}

/// Ordered captions plus the navigation cursor.
///
/// The cursor stays within bounds at all times: navigation moves it by
/// exactly one position and clamps at both ends. Only empty sets have no
/// current caption.
#[derive(Debug, Clone, Default)]
pub struct CaptionSet {
    captions: Vec<String>,
    cursor: usize,
}

impl CaptionSet {
    #[must_use]
    pub fn new(captions: Vec<String>) -> Self {
        Self {
            captions,
            cursor: 0,
        }
    }

    /// Extract captions from a DOCX file, cursor at the first caption.
    ///
    /// # Errors
    /// Returns an error when the document cannot be read or parsed; the
    /// caller's previously loaded set is unaffected.
    pub fn load(path: &Path) -> Result<Self, DocxError> {
        let captions = extract_captions(read_paragraphs(path)?);
        info!("Loaded {} captions from {}", captions.len(), path.display());
        Ok(Self::new(captions))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.captions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.captions.is_empty()
    }

    /// Zero-based cursor position, or `None` for an empty set.
    #[must_use]
    pub fn position(&self) -> Option<usize> {
        (!self.is_empty()).then_some(self.cursor)
    }

    #[must_use]
    pub fn current(&self) -> Option<&str> {
        self.captions.get(self.cursor).map(String::as_str)
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        self.cursor + 1 < self.captions.len()
    }

    #[must_use]
    pub fn has_previous(&self) -> bool {
        !self.is_empty() && self.cursor > 0
    }

    /// Move one caption forward, clamping at the last one.
    pub fn next_caption(&mut self) -> Option<&str> {
        if self.has_next() {
            self.cursor += 1;
        }
        self.current()
    }

    /// Move one caption back, clamping at the first one.
    pub fn previous_caption(&mut self) -> Option<&str> {
        if self.has_previous() {
            self.cursor -= 1;
        }
        self.current()
    }
}

#[cfg(test)]
mod tests {
    use super::{CaptionSet, extract_captions};

    #[test]
    fn blank_document_yields_no_captions() {
        assert!(extract_captions(Vec::<String>::new()).is_empty());
        assert!(extract_captions([" ", "  ", "\t"]).is_empty());
    }

    #[test]
    fn blank_paragraphs_separate_captions() {
        let captions = extract_captions(["a", "", "b", "c", ""]);
        assert_eq!(captions, vec!["a", "b\nc"]);
    }

    #[test]
    fn consecutive_blanks_collapse_to_one_boundary() {
        let captions = extract_captions(["", "a", "", "  ", "", "b", ""]);
        assert_eq!(captions, vec!["a", "b"]);
    }

    #[test]
    fn document_without_separators_is_one_caption() {
        let captions = extract_captions(["one", "two", "three"]);
        assert_eq!(captions, vec!["one\ntwo\nthree"]);
    }

    #[test]
    fn trailing_caption_is_emitted_without_closing_blank() {
        let captions = extract_captions(["a", "", "b"]);
        assert_eq!(captions, vec!["a", "b"]);
    }

    #[test]
    fn captions_are_trimmed_and_never_empty() {
        let captions = extract_captions(["  padded  ", "", " ", "x"]);
        assert_eq!(captions, vec!["padded", "x"]);
        assert!(captions.iter().all(|caption| !caption.is_empty()));
    }

    #[test]
    fn duplicate_captions_are_allowed() {
        let captions = extract_captions(["same", "", "same"]);
        assert_eq!(captions, vec!["same", "same"]);
    }

    #[test]
    fn empty_set_has_no_current_caption() {
        let mut set = CaptionSet::default();
        assert!(set.is_empty());
        assert_eq!(set.position(), None);
        assert_eq!(set.current(), None);
        assert_eq!(set.next_caption(), None);
        assert_eq!(set.previous_caption(), None);
    }

    #[test]
    fn navigation_moves_one_step_and_clamps() {
        let mut set = CaptionSet::new(vec!["a".into(), "b".into(), "c".into()]);
        assert_eq!(set.current(), Some("a"));
        assert!(!set.has_previous());

        assert_eq!(set.next_caption(), Some("b"));
        assert_eq!(set.next_caption(), Some("c"));
        assert!(!set.has_next());
        assert_eq!(set.next_caption(), Some("c"));
        assert_eq!(set.position(), Some(2));

        assert_eq!(set.previous_caption(), Some("b"));
        assert_eq!(set.previous_caption(), Some("a"));
        assert_eq!(set.previous_caption(), Some("a"));
        assert_eq!(set.position(), Some(0));
    }
}
