use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Declared template format for an uploaded template file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TemplateFormat {
    Pdf,
    Docx,
    Html,
}

impl TemplateFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "html" | "htm" => Some(Self::Html),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Html => "html",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Number,
    Date,
    Textarea,
    Email,
}

/// One entry of a document type's declared field schema.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TemplateField {
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Active,
    Inactive,
}

/// A named requirement the requestor must attach (e.g. "Valid ID").
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Requirement {
    pub id: i64,
    pub name: String,
    pub description: String,
}

/// A requestable certificate/document category with its requirement list and
/// optional generation template.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DocumentType {
    pub id: i64,
    pub document_name: String,
    pub description: String,
    pub status: DocumentStatus,
    /// Inline markup template; takes priority over `template_path`.
    pub html_template: Option<String>,
    pub template_path: Option<String>,
    pub template_format: Option<TemplateFormat>,
    pub template_fields: Option<Vec<TemplateField>>,
    pub requirements: Vec<Requirement>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DocumentType {
    pub fn has_template(&self) -> bool {
        self.html_template.is_some() || self.template_path.is_some()
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateDocumentTypeRequest {
    pub document_name: String,
    pub description: String,
    pub status: Option<DocumentStatus>,
    #[serde(default)]
    pub requirements: Vec<RequirementInput>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateDocumentTypeRequest {
    pub document_name: Option<String>,
    pub description: Option<String>,
    pub status: Option<DocumentStatus>,
    pub requirements: Option<Vec<RequirementInput>>,
}

/// Requirement payload for create/update; an `id` marks an existing row to
/// update, absence of an `id` creates a new one.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RequirementInput {
    pub id: Option<i64>,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct InlineTemplateRequest {
    pub html_template: Option<String>,
    pub template_fields: Option<Vec<TemplateField>>,
}
