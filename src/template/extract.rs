//! Template placeholder extraction.
//!
//! Pure functions over template bytes. Extraction is a UX assist for staff
//! configuring templates, so every failure path collapses to an empty set.

use std::io::Read;

use quick_xml::events::Event;
use quick_xml::Reader;

use super::{DOLLAR_BRACE_RE, TRIPLE_BRACE_RE, WHITESPACE_RE};
use crate::catalog::models::TemplateFormat;

/// Extract the deduplicated placeholder names from a template.
pub fn extract_placeholders(bytes: &[u8], format: TemplateFormat) -> Vec<String> {
    let result = match format {
        TemplateFormat::Html => Ok(extract_from_text(&String::from_utf8_lossy(bytes))),
        TemplateFormat::Docx => extract_from_docx(bytes),
        TemplateFormat::Pdf => extract_from_pdf(bytes),
    };
    match result {
        Ok(placeholders) => placeholders,
        Err(e) => {
            log::warn!("placeholder extraction failed: {}", e);
            Vec::new()
        }
    }
}

/// Scan raw text for both placeholder conventions, preserving first-seen order.
pub fn extract_from_text(text: &str) -> Vec<String> {
    let mut placeholders = Vec::new();
    for captures in DOLLAR_BRACE_RE
        .captures_iter(text)
        .chain(TRIPLE_BRACE_RE.captures_iter(text))
    {
        let name = captures[1].to_string();
        if !placeholders.contains(&name) {
            placeholders.push(name);
        }
    }
    placeholders
}

/// DOCX: concatenate the body plus all header/footer parts, strip markup tags
/// FIRST so placeholders split across text runs re-join, collapse whitespace,
/// then match. Matching before stripping would under-count.
fn extract_from_docx(bytes: &[u8]) -> Result<Vec<String>, String> {
    let cursor = std::io::Cursor::new(bytes);
    let mut archive =
        zip::ZipArchive::new(cursor).map_err(|e| format!("failed to open DOCX archive: {}", e))?;

    let mut xml = String::new();
    append_archive_entry(&mut archive, "word/document.xml", &mut xml)?;
    for i in 1..=10 {
        let _ = append_archive_entry(&mut archive, &format!("word/header{}.xml", i), &mut xml);
        let _ = append_archive_entry(&mut archive, &format!("word/footer{}.xml", i), &mut xml);
    }

    let stripped = strip_markup_tags(&xml)?;
    let collapsed = WHITESPACE_RE.replace_all(&stripped, " ");
    Ok(extract_from_text(&collapsed))
}

fn append_archive_entry<R: Read + std::io::Seek>(
    archive: &mut zip::ZipArchive<R>,
    name: &str,
    target: &mut String,
) -> Result<(), String> {
    let mut entry = archive
        .by_name(name)
        .map_err(|e| format!("missing {}: {}", name, e))?;
    entry
        .read_to_string(target)
        .map_err(|e| format!("failed to read {}: {}", name, e))?;
    Ok(())
}

/// Drop every tag and keep only text content, concatenated in document order.
fn strip_markup_tags(xml: &str) -> Result<String, String> {
    let mut reader = Reader::from_str(xml);
    let mut text = String::new();
    loop {
        match reader.read_event() {
            Ok(Event::Text(e)) => {
                let decoded = e.xml_content().map_err(|e| format!("bad entity: {}", e))?;
                text.push_str(&decoded);
            }
            Ok(Event::CData(e)) => {
                text.push_str(&String::from_utf8_lossy(&e));
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(format!("XML parsing error: {}", e)),
        }
    }
    Ok(text)
}

/// PDF: flattened text, `{{{name}}}` convention only. PDF text extraction does
/// not preserve `${}` reliably.
fn extract_from_pdf(bytes: &[u8]) -> Result<Vec<String>, String> {
    let text = pdf_text(bytes)?;
    let mut placeholders = Vec::new();
    for captures in TRIPLE_BRACE_RE.captures_iter(&text) {
        let name = captures[1].to_string();
        if !placeholders.contains(&name) {
            placeholders.push(name);
        }
    }
    Ok(placeholders)
}

/// Linearized text of every page of a PDF.
pub fn pdf_text(bytes: &[u8]) -> Result<String, String> {
    let doc = lopdf::Document::load_mem(bytes).map_err(|e| format!("failed to load PDF: {}", e))?;
    let mut text = String::new();
    for (page_num, _) in doc.get_pages() {
        if let Ok(page_text) = doc.extract_text(&[page_num]) {
            text.push_str(&page_text);
            text.push('\n');
        }
    }
    Ok(text)
}
