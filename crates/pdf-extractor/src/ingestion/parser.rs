//! PDF text extraction

use std::time::Duration;

use crate::error::{Error, Result};

/// Glyph names that some PDF fonts leak into extracted text instead of the
/// character itself
const GLYPH_NAMES: &[(&str, char)] = &[
    // Hyphens and dashes
    ("uni2010", '\u{2010}'),
    ("uni2011", '\u{2011}'),
    ("uni2013", '\u{2013}'),
    ("uni2014", '\u{2014}'),
    // Quotation marks
    ("uni2018", '\u{2018}'),
    ("uni2019", '\u{2019}'),
    ("uni201A", '\u{201A}'),
    ("uni201C", '\u{201C}'),
    ("uni201D", '\u{201D}'),
    ("uni201E", '\u{201E}'),
    // Bullets and symbols
    ("uni2022", '\u{2022}'),
    ("uni2026", '\u{2026}'),
    ("uni00A0", '\u{00A0}'),
    ("uni20AC", '\u{20AC}'),
    ("uni00B2", '\u{00B2}'),
    ("uni00B3", '\u{00B3}'),
    // German letters
    ("uni00E4", 'ä'),
    ("uni00F6", 'ö'),
    ("uni00FC", 'ü'),
    ("uni00C4", 'Ä'),
    ("uni00D6", 'Ö'),
    ("uni00DC", 'Ü'),
    ("uni00DF", 'ß'),
    // Ligatures
    ("f_f_i", '\u{FB03}'),
    ("f_f_l", '\u{FB04}'),
    ("f_i", '\u{FB01}'),
    ("f_l", '\u{FB02}'),
    ("f_f", '\u{FB00}'),
];

/// Replace leaked glyph names, split ligatures, drop NULs, trim lines and
/// remove blank ones. Everything else is left verbatim.
fn cleanup_pdf_text(text: &str) -> String {
    let mut result = text.replace('\0', "");

    for (glyph_name, ch) in GLYPH_NAMES {
        for pattern in [format!("({})", glyph_name), format!("<{}>", glyph_name)] {
            if result.contains(&pattern) {
                result = result.replace(&pattern, &ch.to_string());
            }
        }
    }

    let result = result
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
        .replace('\u{FB00}', "ff")
        .replace('\u{FB03}', "ffi")
        .replace('\u{FB04}', "ffl");

    result
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Text pulled out of a PDF
#[derive(Debug, Clone, Default)]
pub struct ExtractedText {
    /// Cleaned text content (may be empty for image-only PDFs)
    pub content: String,
    /// Page count, when the document structure could be read
    pub total_pages: Option<u32>,
}

impl ExtractedText {
    /// Length in characters
    pub fn char_count(&self) -> usize {
        self.content.chars().count()
    }
}

/// Turns raw document bytes into plain text
pub trait TextExtractor: Send + Sync {
    /// Extract text; blocking, call from a blocking-capable context
    fn extract(&self, filename: &str, data: &[u8]) -> Result<ExtractedText>;
}

/// PDF text extractor backed by `pdf-extract`, with `lopdf` as fallback
pub struct PdfParser {
    parse_timeout: Duration,
}

impl Default for PdfParser {
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}

impl PdfParser {
    pub fn new(parse_timeout: Duration) -> Self {
        Self { parse_timeout }
    }

    /// Run `pdf-extract` on its own thread so a hang or panic on a
    /// problematic font cannot take the caller down
    fn extract_with_timeout(&self, filename: &str, data: &[u8]) -> Result<String> {
        use std::sync::mpsc;
        use std::thread;

        let data_vec = data.to_vec();
        let (tx, rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            let result = pdf_extract::extract_text_from_mem(&data_vec);
            let _ = tx.send(result);
        });

        match rx.recv_timeout(self.parse_timeout) {
            Ok(Ok(text)) => {
                let _ = handle.join();
                Ok(text)
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                tracing::warn!("pdf-extract failed on '{}': {}, trying fallback", filename, e);
                Self::extract_fallback(filename, data)
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                // The thread cannot be killed; it is left to finish on its own
                tracing::error!(
                    "pdf-extract timed out after {}s on '{}', trying fallback",
                    self.parse_timeout.as_secs(),
                    filename
                );
                Self::extract_fallback(filename, data)
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                tracing::error!("pdf-extract thread crashed on '{}', trying fallback", filename);
                Self::extract_fallback(filename, data)
            }
        }
    }

    /// Fallback extraction using lopdf's own text extraction
    fn extract_fallback(filename: &str, data: &[u8]) -> Result<String> {
        let doc = lopdf::Document::load_mem(data)
            .map_err(|e| Error::pdf_parse(filename, format!("Failed to load PDF: {}", e)))?;

        let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
        doc.extract_text(&page_numbers)
            .map_err(|e| Error::pdf_parse(filename, format!("Failed to extract text: {}", e)))
    }

    fn count_pages(data: &[u8]) -> Option<u32> {
        lopdf::Document::load_mem(data)
            .ok()
            .map(|doc| doc.get_pages().len() as u32)
    }
}

impl TextExtractor for PdfParser {
    fn extract(&self, filename: &str, data: &[u8]) -> Result<ExtractedText> {
        if !data.starts_with(b"%PDF") {
            return Err(Error::pdf_parse(filename, "File is not a PDF document"));
        }

        let raw = self.extract_with_timeout(filename, data)?;
        let content = cleanup_pdf_text(&raw);

        Ok(ExtractedText {
            content,
            total_pages: Self::count_pages(data),
        })
    }
}
