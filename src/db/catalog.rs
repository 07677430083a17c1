//! Document catalog operations.

use chrono::Utc;

use super::AppState;
use crate::catalog::models::{
    DocumentStatus, DocumentType, Requirement, RequirementInput, TemplateField, TemplateFormat,
};
use crate::error::ApiError;

impl AppState {
    pub fn insert_document_type(
        &self,
        document_name: String,
        description: String,
        status: DocumentStatus,
        requirements: Vec<RequirementInput>,
    ) -> Result<DocumentType, ApiError> {
        let mut documents = self.documents.write();
        if documents
            .values()
            .any(|d| d.document_name.eq_ignore_ascii_case(&document_name))
        {
            return Err(ApiError::validation_fields(
                "document_name already exists",
                vec!["document_name".to_string()],
            ));
        }

        let now = Utc::now();
        let requirements = requirements
            .into_iter()
            .map(|input| Requirement {
                id: self.next_requirement_id(),
                name: input.name,
                description: input.description,
            })
            .collect();

        let document = DocumentType {
            id: self.next_document_id(),
            document_name,
            description,
            status,
            html_template: None,
            template_path: None,
            template_format: None,
            template_fields: None,
            requirements,
            created_at: now,
            updated_at: now,
        };
        documents.insert(document.id, document.clone());
        Ok(document)
    }

    pub fn get_document_type(&self, id: i64) -> Option<DocumentType> {
        self.documents.read().get(&id).cloned()
    }

    pub fn document_type_exists(&self, id: i64) -> bool {
        self.documents.read().contains_key(&id)
    }

    pub fn list_document_types(&self, status: Option<DocumentStatus>) -> Vec<DocumentType> {
        let mut documents: Vec<DocumentType> = self
            .documents
            .read()
            .values()
            .filter(|d| status.map(|s| d.status == s).unwrap_or(true))
            .cloned()
            .collect();
        documents.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        documents
    }

    /// Update basic fields and synchronize the requirement list: inputs with
    /// an id update the matching row, inputs without one create a new row,
    /// and requirements absent from the input are deleted.
    pub fn update_document_type(
        &self,
        id: i64,
        document_name: Option<String>,
        description: Option<String>,
        status: Option<DocumentStatus>,
        requirements: Option<Vec<RequirementInput>>,
    ) -> Result<DocumentType, ApiError> {
        let mut documents = self.documents.write();
        if let Some(name) = &document_name {
            if documents
                .values()
                .any(|d| d.id != id && d.document_name.eq_ignore_ascii_case(name))
            {
                return Err(ApiError::validation_fields(
                    "document_name already exists",
                    vec!["document_name".to_string()],
                ));
            }
        }

        let mut new_requirements: Option<Vec<Requirement>> = None;
        if let Some(inputs) = requirements {
            let document = documents
                .get(&id)
                .ok_or_else(|| ApiError::NotFound("Document not found".to_string()))?;
            let mut synced = Vec::with_capacity(inputs.len());
            for input in inputs {
                match input.id {
                    Some(req_id) => {
                        if document.requirements.iter().any(|r| r.id == req_id) {
                            synced.push(Requirement {
                                id: req_id,
                                name: input.name,
                                description: input.description,
                            });
                        }
                    }
                    None => synced.push(Requirement {
                        id: self.next_requirement_id(),
                        name: input.name,
                        description: input.description,
                    }),
                }
            }
            new_requirements = Some(synced);
        }

        let document = documents
            .get_mut(&id)
            .ok_or_else(|| ApiError::NotFound("Document not found".to_string()))?;
        if let Some(name) = document_name {
            document.document_name = name;
        }
        if let Some(description) = description {
            document.description = description;
        }
        if let Some(status) = status {
            document.status = status;
        }
        if let Some(requirements) = new_requirements {
            document.requirements = requirements;
        }
        document.updated_at = Utc::now();
        Ok(document.clone())
    }

    pub fn delete_document_type(&self, id: i64) -> Result<DocumentType, ApiError> {
        self.documents
            .write()
            .remove(&id)
            .ok_or_else(|| ApiError::NotFound("Document not found".to_string()))
    }

    /// Record an uploaded template file, returning the replaced path if any.
    pub fn set_template_file(
        &self,
        id: i64,
        path: String,
        format: TemplateFormat,
    ) -> Result<Option<String>, ApiError> {
        let mut documents = self.documents.write();
        let document = documents
            .get_mut(&id)
            .ok_or_else(|| ApiError::NotFound("Document not found".to_string()))?;
        let previous = document.template_path.replace(path);
        document.template_format = Some(format);
        document.updated_at = Utc::now();
        Ok(previous)
    }

    pub fn set_inline_template(
        &self,
        id: i64,
        html_template: Option<String>,
        template_fields: Option<Vec<TemplateField>>,
    ) -> Result<DocumentType, ApiError> {
        let mut documents = self.documents.write();
        let document = documents
            .get_mut(&id)
            .ok_or_else(|| ApiError::NotFound("Document not found".to_string()))?;
        if html_template.is_some() {
            document.html_template = html_template;
        }
        if template_fields.is_some() {
            document.template_fields = template_fields;
        }
        document.updated_at = Utc::now();
        Ok(document.clone())
    }

    /// Detach both template sources, returning the file path to discard.
    pub fn clear_template(&self, id: i64) -> Result<Option<String>, ApiError> {
        let mut documents = self.documents.write();
        let document = documents
            .get_mut(&id)
            .ok_or_else(|| ApiError::NotFound("Document not found".to_string()))?;
        document.html_template = None;
        document.template_format = None;
        document.updated_at = Utc::now();
        Ok(document.template_path.take())
    }
}
