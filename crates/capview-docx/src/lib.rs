//! Caption extraction from DOCX documents.
//!
//! A caption is a run of non-blank paragraphs; blank paragraphs separate
//! captions. This crate reads the paragraph sequence out of the DOCX
//! container and turns it into a navigable [`CaptionSet`].

mod captions;
mod document;

pub use captions::{CaptionSet, extract_captions};
pub use document::{DocxError, read_paragraphs};
