use std::io::Write;

use barangay_server::catalog::models::TemplateFormat;
use barangay_server::template::extract::{extract_from_text, extract_placeholders};
use barangay_server::template::pdf::render_text_pdf;

fn build_docx(document_xml: &str) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();
    writer
        .start_file("[Content_Types].xml", options)
        .unwrap();
    writer
        .write_all(br#"<?xml version="1.0"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"/>"#)
        .unwrap();
    writer.start_file("word/document.xml", options).unwrap();
    writer.write_all(document_xml.as_bytes()).unwrap();
    writer.finish().unwrap().into_inner()
}

#[test]
fn html_templates_yield_both_conventions_in_first_seen_order() {
    let markup = "<p>Dear ${first_name},</p><p>your {{{document_name}}} is ready. \
                  Again: {{{document_name}}} and ${first_name}.</p>";
    assert_eq!(
        extract_placeholders(markup.as_bytes(), TemplateFormat::Html),
        vec!["first_name".to_string(), "document_name".to_string()]
    );
}

#[test]
fn malformed_markers_are_not_placeholders() {
    assert_eq!(
        extract_from_text("{{two_braces}} {{{with space}}} ${ok-dash} {{{fine_1}}}"),
        vec!["fine_1".to_string()]
    );
}

#[test]
fn docx_placeholders_survive_split_text_runs() {
    let xml = r#"<?xml version="1.0"?><w:document xmlns:w="w"><w:body>
        <w:p><w:r><w:t>{{{full_</w:t></w:r><w:r><w:t>name}}}</w:t></w:r></w:p>
        <w:p><w:r><w:t>${civil_status}</w:t></w:r></w:p>
    </w:body></w:document>"#;
    let bytes = build_docx(xml);
    assert_eq!(
        extract_placeholders(&bytes, TemplateFormat::Docx),
        vec!["civil_status".to_string(), "full_name".to_string()]
    );
}

#[test]
fn docx_without_placeholders_yields_empty() {
    let xml = r#"<?xml version="1.0"?><w:document xmlns:w="w"><w:body>
        <w:p><w:r><w:t>Plain certificate text.</w:t></w:r></w:p>
    </w:body></w:document>"#;
    assert!(extract_placeholders(&build_docx(xml), TemplateFormat::Docx).is_empty());
}

#[test]
fn pdf_placeholders_are_found_in_flattened_text() {
    let bytes =
        render_text_pdf("This certifies that {{{full_name}}} resides at {{{address}}}.").unwrap();
    let placeholders = extract_placeholders(&bytes, TemplateFormat::Pdf);
    assert!(placeholders.contains(&"full_name".to_string()));
    assert!(placeholders.contains(&"address".to_string()));
}

#[test]
fn corrupt_templates_degrade_to_an_empty_set() {
    assert!(extract_placeholders(b"not a zip archive", TemplateFormat::Docx).is_empty());
    assert!(extract_placeholders(b"not a pdf either", TemplateFormat::Pdf).is_empty());
}
