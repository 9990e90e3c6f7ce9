//! Best-effort, page-ordered PDF text extraction.
//!
//! Extraction walks pages in document order and concatenates whatever text
//! each yields. A page that fails extraction or contains no text is skipped
//! and counted, never fatal; a document that cannot be opened at all is
//! [`RagError::Extraction`].

use std::path::Path;

use lopdf::Document;
use tracing::warn;

use crate::types::{RagError, RagResult};

/// Pages joined by this separator form the document text handed to the
/// chunker.
pub const PAGE_SEPARATOR: &str = "\n";

/// Text pulled from one document, with per-page accounting.
#[derive(Clone, Debug)]
pub struct ExtractedDocument {
    /// All extractable page texts, joined with [`PAGE_SEPARATOR`].
    pub text: String,
    /// Pages that yielded text.
    pub pages: usize,
    /// Pages skipped because extraction failed or produced nothing.
    pub skipped_pages: usize,
}

/// Extract text from the PDF at `path`.
pub fn extract_pdf(path: impl AsRef<Path>) -> RagResult<ExtractedDocument> {
    let path = path.as_ref();
    let document = Document::load(path)
        .map_err(|err| RagError::Extraction(format!("{}: {err}", path.display())))?;

    let mut page_texts = Vec::new();
    let mut skipped_pages = 0usize;
    for page_number in document.get_pages().keys() {
        match document.extract_text(&[*page_number]) {
            Ok(text) if !text.trim().is_empty() => page_texts.push(text),
            Ok(_) => skipped_pages += 1,
            Err(err) => {
                warn!(
                    page = page_number,
                    path = %path.display(),
                    error = %err,
                    "skipping unextractable page"
                );
                skipped_pages += 1;
            }
        }
    }

    Ok(ExtractedDocument {
        pages: page_texts.len(),
        text: page_texts.join(PAGE_SEPARATOR),
        skipped_pages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_an_extraction_error() {
        let err = extract_pdf("/nonexistent/ghost.pdf").unwrap_err();
        assert!(matches!(err, RagError::Extraction(_)));
    }
}
