//! PDF reader abstraction (`OpenPdf`/`ExtractText`) backed by
//! `pdf-extract`, the one format reader with no counterpart crate in
//! the teacher or pack — the corpus has no PDF-reading repo, so this is
//! an ecosystem pick rather than something grounded in a specific
//! example file.
//!
//! `pdf-extract` has no native per-page API; it inserts a form-feed
//! (`\u{0c}`) between pages in the concatenated text, so pages are
//! recovered by splitting on that character. Encrypted PDFs (CAMS/NSDL
//! CAS statements are commonly password-protected with the investor's
//! PAN) are not supported by the crate — `open` surfaces that as a
//! file-level error, same as the original's `check_pdf_support` gate.

use std::path::Path;

use ledger_domain::{LedgerError, LedgerResult};

/// Some NSDL CAS PDFs mangle their embedded text by doubling every
/// letter (`National` extracts as `NNaattiioonnaall`). A handful of
/// known doubled prefixes in the first 500 characters is enough signal
/// that the whole document is affected; outside that, real English text
/// has plenty of legitimate double letters ("committee", "access") that
/// a blind collapse would corrupt.
fn has_duplicate_char_artifact(text: &str) -> bool {
    let sample_end = text.char_indices().nth(500).map(|(i, _)| i).unwrap_or(text.len());
    let sample = &text[..sample_end];
    ["NNaa", "SSee", "DDee", "CCoo", "AAcc"].iter().any(|pattern| sample.contains(pattern))
}

/// Collapses every adjacent identical alphabetic pair (`NNaattiioonnaall`
/// -> `National`). Only safe to run once [`has_duplicate_char_artifact`]
/// has confirmed the document is affected.
fn fix_duplicate_chars(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut result = String::with_capacity(text.len());
    let mut i = 0;
    while i < chars.len() {
        if i + 1 < chars.len() && chars[i] == chars[i + 1] && chars[i].is_alphabetic() {
            result.push(chars[i]);
            i += 2;
        } else {
            result.push(chars[i]);
            i += 1;
        }
    }
    result
}

pub struct PdfDocument {
    pages: Vec<String>,
}

impl PdfDocument {
    pub fn open(path: &Path, password: Option<&str>) -> LedgerResult<Self> {
        if password.is_some() {
            tracing::debug!(path = %path.display(), "password supplied but pdf-extract cannot open encrypted PDFs");
        }
        let mut text =
            pdf_extract::extract_text(path).map_err(|e| LedgerError::invalid(format!("failed to extract PDF text: {e}")))?;
        if has_duplicate_char_artifact(&text) {
            tracing::debug!(path = %path.display(), "collapsing duplicated-character extraction artifact");
            text = fix_duplicate_chars(&text);
        }
        let pages = text.split('\u{0c}').map(|s| s.to_string()).collect();
        Ok(PdfDocument { pages })
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn extract_text(&self, page: usize) -> LedgerResult<&str> {
        self.pages
            .get(page)
            .map(|s| s.as_str())
            .ok_or_else(|| LedgerError::invalid(format!("page {page} out of range (0..{})", self.pages.len())))
    }

    pub fn full_text(&self) -> String {
        self.pages.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_the_known_doubled_prefixes() {
        assert!(has_duplicate_char_artifact("NNaattiioonnaall Securities Depository"));
        assert!(!has_duplicate_char_artifact("National Securities Depository"));
    }

    #[test]
    fn collapses_doubled_letters_without_touching_digits_or_punctuation() {
        let collapsed = fix_duplicate_chars("NNaattiioonnaall Pension Sy:110091211424, Units: 44,286.3740");
        assert_eq!(collapsed, "National Pension Sy:110091211424, Units: 44,286.3740");
    }
}
