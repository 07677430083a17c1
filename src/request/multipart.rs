//! Multipart parsers for request creation and requirement uploads.

use actix_multipart::Multipart;
use futures::StreamExt;
use sanitize_filename::sanitize;

use crate::error::ApiError;
use crate::request::lifecycle::RequirementFile;

pub const REQUIREMENT_MAX_BYTES: usize = 5 * 1024 * 1024;
pub const TEMPLATE_MAX_BYTES: usize = 10 * 1024 * 1024;

const REQUIREMENT_EXTENSIONS: [&str; 1] = ["pdf"];
const TEMPLATE_EXTENSIONS: [&str; 4] = ["pdf", "docx", "html", "htm"];

/// Form fields accepted by the multipart create route. Requirement files are
/// sent as `requirement_<id>` parts.
pub struct CreateRequestForm {
    pub document: Option<i64>,
    pub requestor: Option<i64>,
    pub information: Option<String>,
    pub files: Vec<RequirementFile>,
}

pub async fn parse_create_request(mut multipart: Multipart) -> Result<CreateRequestForm, ApiError> {
    let mut form = CreateRequestForm {
        document: None,
        requestor: None,
        information: None,
        files: Vec::new(),
    };

    while let Some(item) = multipart.next().await {
        let mut field = item.map_err(|e| ApiError::bad_request(e.to_string()))?;
        let disposition = field
            .content_disposition()
            .ok_or_else(|| ApiError::bad_request("Content disposition not found"))?;
        let name = disposition
            .get_name()
            .ok_or_else(|| ApiError::bad_request("Field name not found"))?
            .to_string();
        let maybe_filename = disposition.get_filename().map(sanitize);

        match name.as_str() {
            "document" => {
                let value = read_text_field(&mut field).await?;
                form.document = Some(parse_id(&value, "document")?);
            }
            "requestor" => {
                let value = read_text_field(&mut field).await?;
                form.requestor = Some(parse_id(&value, "requestor")?);
            }
            "information" => {
                form.information = Some(read_text_field(&mut field).await?);
            }
            _ if name.starts_with("requirement_") => {
                let requirement_id = parse_id(&name["requirement_".len()..], &name)?;
                let filename = maybe_filename
                    .ok_or_else(|| ApiError::bad_request("No filename in requirement field"))?;
                check_extension(&filename, &REQUIREMENT_EXTENSIONS)?;
                let bytes =
                    read_file_field(&mut field, REQUIREMENT_MAX_BYTES, &filename).await?;
                form.files.push(RequirementFile {
                    requirement_id,
                    filename,
                    bytes,
                });
            }
            _ => continue,
        }
    }

    Ok(form)
}

/// A single requirement upload: `requirement` id field plus a `file` part.
pub async fn parse_requirement_upload(
    mut multipart: Multipart,
) -> Result<(i64, String, Vec<u8>), ApiError> {
    let mut requirement_id: Option<i64> = None;
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(item) = multipart.next().await {
        let mut field = item.map_err(|e| ApiError::bad_request(e.to_string()))?;
        let disposition = field
            .content_disposition()
            .ok_or_else(|| ApiError::bad_request("Content disposition not found"))?;
        let name = disposition
            .get_name()
            .ok_or_else(|| ApiError::bad_request("Field name not found"))?
            .to_string();
        let maybe_filename = disposition.get_filename().map(sanitize);

        match name.as_str() {
            "requirement" => {
                let value = read_text_field(&mut field).await?;
                requirement_id = Some(parse_id(&value, "requirement")?);
            }
            "file" => {
                let filename = maybe_filename
                    .ok_or_else(|| ApiError::bad_request("No filename in file field"))?;
                check_extension(&filename, &REQUIREMENT_EXTENSIONS)?;
                let bytes =
                    read_file_field(&mut field, REQUIREMENT_MAX_BYTES, &filename).await?;
                file = Some((filename, bytes));
            }
            _ => continue,
        }
    }

    let requirement_id = requirement_id
        .ok_or_else(|| ApiError::missing_fields(vec!["requirement".to_string()]))?;
    let (filename, bytes) =
        file.ok_or_else(|| ApiError::missing_fields(vec!["file".to_string()]))?;
    Ok((requirement_id, filename, bytes))
}

/// A template upload: one `file` part in a supported format.
pub async fn parse_template_upload(mut multipart: Multipart) -> Result<(String, Vec<u8>), ApiError> {
    while let Some(item) = multipart.next().await {
        let mut field = item.map_err(|e| ApiError::bad_request(e.to_string()))?;
        let disposition = field
            .content_disposition()
            .ok_or_else(|| ApiError::bad_request("Content disposition not found"))?;
        let name = disposition
            .get_name()
            .ok_or_else(|| ApiError::bad_request("Field name not found"))?;

        if name != "file" {
            continue;
        }
        let filename = disposition
            .get_filename()
            .map(sanitize)
            .ok_or_else(|| ApiError::bad_request("No filename in file field"))?;
        check_extension(&filename, &TEMPLATE_EXTENSIONS)?;
        let bytes = read_file_field(&mut field, TEMPLATE_MAX_BYTES, &filename).await?;
        return Ok((filename, bytes));
    }

    Err(ApiError::missing_fields(vec!["file".to_string()]))
}

async fn read_text_field(field: &mut actix_multipart::Field) -> Result<String, ApiError> {
    let mut buffer = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(|e| ApiError::bad_request(e.to_string()))?;
        buffer.extend_from_slice(&chunk);
    }
    String::from_utf8(buffer).map_err(|e| ApiError::bad_request(e.to_string()))
}

async fn read_file_field(
    field: &mut actix_multipart::Field,
    max_bytes: usize,
    filename: &str,
) -> Result<Vec<u8>, ApiError> {
    let mut buffer = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(|e| ApiError::bad_request(e.to_string()))?;
        if buffer.len() + chunk.len() > max_bytes {
            return Err(ApiError::validation(format!(
                "File {} exceeds the {} MB size limit",
                filename,
                max_bytes / (1024 * 1024)
            )));
        }
        buffer.extend_from_slice(&chunk);
    }
    Ok(buffer)
}

fn parse_id(value: &str, field: &str) -> Result<i64, ApiError> {
    value.trim().parse::<i64>().map_err(|_| {
        ApiError::validation_fields(
            format!("Field '{}' must be a numeric identifier", field),
            vec![field.to_string()],
        )
    })
}

fn check_extension(filename: &str, allowed: &[&str]) -> Result<(), ApiError> {
    let extension = filename
        .rsplit('.')
        .next()
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if allowed.contains(&extension.as_str()) {
        Ok(())
    } else {
        Err(ApiError::validation(format!(
            "File type .{} is not allowed, expected one of: {}",
            extension,
            allowed.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_id_rejects_non_numeric() {
        assert!(parse_id("12", "document").is_ok());
        assert!(parse_id("abc", "document").is_err());
        assert!(parse_id(" 7 ", "document").is_ok());
    }

    #[test]
    fn extension_check_is_case_insensitive() {
        assert!(check_extension("scan.PDF", &REQUIREMENT_EXTENSIONS).is_ok());
        assert!(check_extension("scan.exe", &REQUIREMENT_EXTENSIONS).is_err());
        assert!(check_extension("letter.docx", &TEMPLATE_EXTENSIONS).is_ok());
    }
}
