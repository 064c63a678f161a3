//! Built-in sample template for trying the pipeline without a real form

use crate::docx::{wrap_body, DocxResult};
use crate::template::TemplateDocument;

fn paragraph(text: &str) -> String {
    format!("<w:p><w:r><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>", text)
}

fn cell(text: &str) -> String {
    format!("<w:tc><w:tcPr><w:tcW w:w=\"4500\" w:type=\"dxa\"/></w:tcPr>{}</w:tc>", paragraph(text))
}

fn row(label: &str, value: &str) -> String {
    format!("<w:tr>{}{}</w:tr>", cell(label), cell(value))
}

/// A small inspection report form. The claim number placeholder is split
/// across runs the way Word often saves it.
pub fn sample_template() -> DocxResult<TemplateDocument> {
    let mut body = String::new();
    body.push_str(concat!(
        "<w:p><w:r><w:rPr><w:b/><w:sz w:val=\"32\"/></w:rPr>",
        "<w:t>GLR Sample Template</w:t></w:r></w:p>"
    ));
    body.push_str(&paragraph("Insured: [INSURED_NAME]"));
    body.push_str(&paragraph("Policy #: [POLICY_NUMBER]"));
    body.push_str(concat!(
        "<w:p><w:r><w:t xml:space=\"preserve\">Claim #: [CLAIM</w:t></w:r>",
        "<w:proofErr w:type=\"spellStart\"/>",
        "<w:r><w:rPr><w:b/></w:rPr><w:t>_NUMBER]</w:t></w:r></w:p>"
    ));
    body.push_str(&paragraph("Date Inspected: [DATE_INSPECTED]"));
    body.push_str(&paragraph(
        "Address: [INSURED_H_STREET], [INSURED_H_CITY], [INSURED_H_STATE] [INSURED_H_ZIP]",
    ));
    body.push_str(&paragraph("Type of Loss: [TOL_CODE]"));
    body.push_str("<w:tbl><w:tblPr><w:tblW w:w=\"9000\" w:type=\"dxa\"/></w:tblPr>");
    body.push_str(&row("Roof", "[ROOF_DETAILS]"));
    body.push_str(&row("Front elevation", "[FRONT_ELEVATION]"));
    body.push_str(&row("Interior", "[INTERIOR]"));
    body.push_str("</w:tbl>");
    body.push_str(&paragraph("Damage Summary:"));
    body.push_str(&paragraph("[DAMAGE_SUMMARY]"));

    TemplateDocument::from_document_xml(&wrap_body(&body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_placeholders() {
        let template = sample_template().unwrap();
        let names: Vec<String> = template
            .discover()
            .iter()
            .map(|name| name.as_str().to_string())
            .collect();
        assert!(names.contains(&"CLAIM_NUMBER".to_string()));
        assert!(names.contains(&"ROOF_DETAILS".to_string()));
        assert_eq!(names.len(), 13);
    }

    #[test]
    fn test_sample_plain_text() {
        let text = sample_template().unwrap().plain_text();
        assert!(text.starts_with("GLR Sample Template\n\nInsured: [INSURED_NAME]"));
        assert!(text.contains("Roof | [ROOF_DETAILS]\nFront elevation | [FRONT_ELEVATION]"));
    }
}
