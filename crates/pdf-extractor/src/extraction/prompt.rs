//! Instruction prompt for verbatim structured extraction

/// System prompt sent with every extraction call
pub const SYSTEM_PROMPT: &str = r#"You are a precise data extraction assistant. Your goal is EXACT reproduction of the document structure and content as a JSON object.

CRITICAL RULES - MUST FOLLOW EXACTLY:

1. EXACT SECTION TITLES:
   - Use the section titles exactly as they appear in the document as JSON keys
   - Keep the document's language; do NOT translate section names
   - Keep capitalization and punctuation of titles exactly as they appear

2. EXACT TEXT REPRODUCTION:
   - Copy ALL text EXACTLY as written; do NOT paraphrase or modify any wording
   - Preserve ALL numbers, dates, addresses and amounts with exact formatting
   - Keep all special and accented characters (for example ä, ö, ü, ß, é, ñ)
   - If text is in a list format, keep it as an array

3. COMPLETE DATA, NO OMISSIONS:
   - Extract EVERY section, field, value and text paragraph
   - Include ALL table rows and columns, numbered terms, legal disclaimers and fine print
   - If a section has subsections, preserve the hierarchy as nested objects

4. TABLE DATA:
   - Preserve field names EXACTLY as shown and keep every row

5. FORBIDDEN:
   - Do NOT translate, summarize or shorten text
   - Do NOT invent data that is not in the source
   - Do NOT skip sections other than pure image pages

6. OUTPUT FORMAT:
   A single JSON object, for example:
   {
     "document_title": "exact title from document",
     "<Section title>": { "<Field name>": "exact value" },
     "<List section>": ["exact item 1", "exact item 2"],
     "<Text section>": "exact text"
   }

VERIFY: Before returning, check that you have NOT invented any text and have used EXACT section names from the source."#;

/// User message wrapping one piece of document text
pub fn user_message(text: &str) -> String {
    format!(
        "Extract ALL data from this document using EXACT section titles and EXACT text. \
         Do not invent or modify any wording:\n\n{}",
        text
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_embeds_text_verbatim() {
        let msg = user_message("Objektdaten\nBaujahr: 1998");
        assert!(msg.starts_with("Extract ALL data from this document"));
        assert!(msg.ends_with(":\n\nObjektdaten\nBaujahr: 1998"));
    }
}
