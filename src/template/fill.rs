//! Template filling and artifact generation.
//!
//! Substitution rule shared by every path: a placeholder whose key exists in
//! the information map is replaced; a placeholder whose key is absent stays as
//! literal placeholder text so staff can see which data is still missing.

use std::io::{Read, Write};

use serde_json::{Map, Value};

use super::extract::pdf_text;
use super::{pdf, Artifact, TemplateSource, LINE_BREAK_TAG_RE, MARKUP_TAG_RE, TRIPLE_BRACE_RE};
use crate::catalog::models::{DocumentType, TemplateFormat};
use crate::error::ApiError;

/// Generate an artifact from a resolved template source.
pub fn generate(source: &TemplateSource, information: &Map<String, Value>) -> Result<Artifact, ApiError> {
    match source {
        TemplateSource::Inline(markup) => html_to_artifact(markup, information),
        TemplateSource::File { format, bytes } => match format {
            TemplateFormat::Html => {
                html_to_artifact(&String::from_utf8_lossy(bytes), information)
            }
            TemplateFormat::Docx => {
                let filled = fill_docx(bytes, information).map_err(ApiError::Generation)?;
                Ok(Artifact {
                    bytes: filled,
                    extension: "docx",
                })
            }
            TemplateFormat::Pdf => {
                let filled = fill_pdf(bytes, information).map_err(ApiError::Generation)?;
                Ok(Artifact {
                    bytes: filled,
                    extension: "pdf",
                })
            }
        },
    }
}

/// Missing required field names for a document type's field schema, in schema
/// order. Presence requires a non-empty value.
pub fn validate_required_fields(
    document: &DocumentType,
    information: &Map<String, Value>,
) -> Vec<String> {
    let Some(fields) = &document.template_fields else {
        return Vec::new();
    };
    fields
        .iter()
        .filter(|f| f.required)
        .filter(|f| information.get(&f.name).map(value_is_empty).unwrap_or(true))
        .map(|f| f.name.clone())
        .collect()
}

fn value_is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Plain-text rendering of an information value for substitution.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn escape_xml(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Replace `{{{key}}}` occurrences with HTML-escaped values.
pub fn substitute_html(template: &str, information: &Map<String, Value>) -> String {
    let mut output = template.to_string();
    for (key, value) in information {
        let placeholder = format!("{{{{{{{}}}}}}}", key);
        output = output.replace(&placeholder, &escape_html(&value_text(value)));
    }
    output
}

/// Replace `{{{key}}}` occurrences with literal values.
pub fn substitute_text(template: &str, information: &Map<String, Value>) -> String {
    let mut output = template.to_string();
    for (key, value) in information {
        let placeholder = format!("{{{{{{{}}}}}}}", key);
        output = output.replace(&placeholder, &value_text(value));
    }
    output
}

/// Replace both `${key}` and `{{{key}}}` in a DOCX XML part. Values are
/// XML-escaped so the part stays well-formed.
fn substitute_docx_xml(xml: &str, information: &Map<String, Value>) -> String {
    let mut output = xml.to_string();
    for (key, value) in information {
        let escaped = escape_xml(&value_text(value));
        output = output.replace(&format!("${{{}}}", key), &escaped);
        output = output.replace(&format!("{{{{{{{}}}}}}}", key), &escaped);
    }
    output
}

fn html_to_artifact(markup: &str, information: &Map<String, Value>) -> Result<Artifact, ApiError> {
    let substituted = substitute_html(markup, information);
    let text = flatten_markup(&substituted);
    let bytes = pdf::render_text_pdf(&text).map_err(ApiError::Generation)?;
    Ok(Artifact {
        bytes,
        extension: "pdf",
    })
}

/// Flatten markup to paginated text: block-closing tags become line breaks,
/// remaining tags are dropped, entities are decoded.
fn flatten_markup(markup: &str) -> String {
    let with_breaks = LINE_BREAK_TAG_RE.replace_all(markup, "\n");
    let stripped = MARKUP_TAG_RE.replace_all(&with_breaks, "");
    let decoded = stripped
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&nbsp;", " ");
    decoded
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
        .trim_matches('\n')
        .to_string()
}

const DOCX_TEXT_PARTS: [&str; 1] = ["word/document.xml"];

fn is_docx_text_part(name: &str) -> bool {
    if DOCX_TEXT_PARTS.contains(&name) {
        return true;
    }
    (name.starts_with("word/header") || name.starts_with("word/footer")) && name.ends_with(".xml")
}

/// Rewrite a DOCX archive with placeholders substituted in the body and every
/// header/footer part. Formatting and all other parts are carried unchanged.
pub fn fill_docx(bytes: &[u8], information: &Map<String, Value>) -> Result<Vec<u8>, String> {
    let cursor = std::io::Cursor::new(bytes);
    let mut archive =
        zip::ZipArchive::new(cursor).map_err(|e| format!("failed to open DOCX template: {}", e))?;

    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| format!("failed to read DOCX entry: {}", e))?;
        let name = entry.name().to_string();
        if entry.is_dir() {
            continue;
        }

        let mut data = Vec::new();
        entry
            .read_to_end(&mut data)
            .map_err(|e| format!("failed to read DOCX part {}: {}", name, e))?;

        let data = if is_docx_text_part(&name) {
            let xml = String::from_utf8(data)
                .map_err(|e| format!("DOCX part {} is not UTF-8: {}", name, e))?;
            substitute_docx_xml(&xml, information).into_bytes()
        } else {
            data
        };

        writer
            .start_file(name.as_str(), options)
            .map_err(|e| format!("failed to write DOCX part {}: {}", name, e))?;
        writer
            .write_all(&data)
            .map_err(|e| format!("failed to write DOCX part {}: {}", name, e))?;
    }

    let cursor = writer
        .finish()
        .map_err(|e| format!("failed to finalize DOCX: {}", e))?;
    Ok(cursor.into_inner())
}

/// Best-effort PDF fill: substitute in the extracted text and re-render as a
/// plain paginated PDF. Layout of the original is not preserved. When the
/// extracted text contains no placeholders at all, the original bytes are
/// returned verbatim.
pub fn fill_pdf(bytes: &[u8], information: &Map<String, Value>) -> Result<Vec<u8>, String> {
    let text = match pdf_text(bytes) {
        Ok(text) => text,
        Err(e) => {
            log::warn!("PDF text extraction failed, copying template verbatim: {}", e);
            return Ok(bytes.to_vec());
        }
    };

    if !TRIPLE_BRACE_RE.is_match(&text) {
        return Ok(bytes.to_vec());
    }

    let substituted = substitute_text(&text, information);
    pdf::render_text_pdf(&substituted)
}
