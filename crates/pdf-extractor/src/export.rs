//! CSV export of a single extraction record

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

use crate::error::{Error, Result};
use crate::types::ExtractedRecord;

/// Render a record as a two-line CSV: field names, then values
pub fn record_to_csv(record: &ExtractedRecord) -> Result<String> {
    let content = &record.extracted_content;
    if content.is_empty() {
        return Ok(String::new());
    }

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer
        .write_record(content.keys())
        .and_then(|_| writer.write_record(content.values().map(cell_text)))
        .map_err(|e| Error::internal(format!("Failed to write CSV: {}", e)))?;

    let bytes = writer
        .into_inner()
        .map_err(|e| Error::internal(format!("Failed to finish CSV: {}", e)))?;
    let mut csv = String::from_utf8(bytes)
        .map_err(|e| Error::internal(format!("CSV is not valid UTF-8: {}", e)))?;

    // Two lines, no trailing newline
    if csv.ends_with('\n') {
        csv.pop();
    }
    Ok(csv)
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn unsafe_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-zA-Z0-9\-_äöüÄÖÜß ]").expect("Invalid regex"))
}

fn pdf_suffix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\.pdf$").expect("Invalid regex"))
}

/// Download name for a record's CSV: `<cleaned name>_extracted.csv`
pub fn csv_file_name(file_name: &str) -> String {
    let stem = pdf_suffix().replace(file_name, "");
    let cleaned = unsafe_chars().replace_all(&stem, "_");
    format!("{}_extracted.csv", cleaned.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FlatContent;
    use serde_json::json;

    fn record(pairs: &[(&str, Value)]) -> ExtractedRecord {
        let mut content = FlatContent::new();
        for (k, v) in pairs {
            content.insert((*k).to_string(), v.clone());
        }
        ExtractedRecord::new("doc.pdf", content)
    }

    #[test]
    fn test_header_and_value_rows() {
        let rec = record(&[
            ("Titel", json!("Wohnung")),
            ("Preis", json!(350000)),
            ("Provision", json!(true)),
        ]);
        assert_eq!(record_to_csv(&rec).unwrap(), "Titel,Preis,Provision\nWohnung,350000,true");
    }

    #[test]
    fn test_quotes_special_values() {
        let rec = record(&[
            ("a", json!("x, y")),
            ("b", json!("say \"hi\"")),
            ("c", json!("line1\nline2")),
        ]);
        assert_eq!(
            record_to_csv(&rec).unwrap(),
            "a,b,c\n\"x, y\",\"say \"\"hi\"\"\",\"line1\nline2\""
        );
    }

    #[test]
    fn test_empty_record() {
        assert_eq!(record_to_csv(&record(&[])).unwrap(), "");
    }

    #[test]
    fn test_csv_file_name() {
        assert_eq!(csv_file_name("Exposé Müller.PDF"), "Expos_ Müller_extracted.csv");
        assert_eq!(csv_file_name("report (v2).pdf"), "report _v2__extracted.csv");
        assert_eq!(csv_file_name(" notes.pdf.txt "), "notes_pdf_txt_extracted.csv");
    }
}
