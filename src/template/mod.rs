//! Template subsystem: placeholder extraction and document generation.
//!
//! Placeholders use the `{{{name}}}` convention everywhere, plus `${name}`
//! for DOCX merge fields. Extraction is advisory and degrades to an empty
//! result; generation surfaces failures to the caller.

pub mod extract;
pub mod fill;
pub mod pdf;

use lazy_static::lazy_static;
use regex::Regex;

use crate::catalog::models::{DocumentType, TemplateFormat};
use crate::error::ApiError;
use crate::storage::Storage;

lazy_static! {
    /// `{{{name}}}` placeholder.
    pub static ref TRIPLE_BRACE_RE: Regex =
        Regex::new(r"\{\{\{([A-Za-z0-9_]+)\}\}\}").expect("static placeholder pattern");
    /// `${name}` merge-field placeholder (DOCX only).
    pub static ref DOLLAR_BRACE_RE: Regex =
        Regex::new(r"\$\{([A-Za-z0-9_]+)\}").expect("static placeholder pattern");
    pub static ref WHITESPACE_RE: Regex = Regex::new(r"\s+").expect("static pattern");
    pub static ref MARKUP_TAG_RE: Regex = Regex::new(r"<[^>]*>").expect("static pattern");
    pub static ref LINE_BREAK_TAG_RE: Regex =
        Regex::new(r"(?i)<br\s*/?>|</p>|</div>|</h[1-6]>|</tr>|</li>").expect("static pattern");
}

/// A generated artifact ready to be stored.
#[derive(Debug)]
pub struct Artifact {
    pub bytes: Vec<u8>,
    pub extension: &'static str,
}

/// Where a document type's template comes from, dispatch-priority ordered:
/// inline markup wins over a stored file.
#[derive(Debug)]
pub enum TemplateSource {
    Inline(String),
    File {
        format: TemplateFormat,
        bytes: Vec<u8>,
    },
}

impl TemplateSource {
    /// Resolve the template for a document type, loading file bytes from
    /// storage when needed.
    pub async fn resolve(
        document: &DocumentType,
        storage: &dyn Storage,
    ) -> Result<Self, ApiError> {
        if let Some(markup) = &document.html_template {
            return Ok(Self::Inline(markup.clone()));
        }

        let path = document
            .template_path
            .as_deref()
            .ok_or_else(|| ApiError::Generation("No template found for this document".to_string()))?;

        if !storage.exists(path).await {
            return Err(ApiError::Generation("Template file not found".to_string()));
        }

        let format = document
            .template_format
            .or_else(|| {
                path.rsplit('.')
                    .next()
                    .and_then(TemplateFormat::from_extension)
            })
            .ok_or_else(|| {
                ApiError::Generation(
                    "Unsupported template format. Use HTML, DOCX, or PDF templates.".to_string(),
                )
            })?;

        let bytes = storage.read(path).await.map_err(ApiError::Storage)?;
        Ok(Self::File { format, bytes })
    }
}
