//! Turning uploaded PDFs into text ready for the LLM

mod chunker;
mod parser;

pub use chunker::ChunkPlanner;
pub use parser::{ExtractedText, PdfParser, TextExtractor};
