//! Boilerplate parts for packages built from a bare `document.xml`

use crate::docx::namespaces;

/// Main document path used for generated packages
pub const MAIN_DOCUMENT_PART: &str = "word/document.xml";

const CONTENT_TYPES_XML: &str = concat!(
    "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\r\n",
    "<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">",
    "<Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>",
    "<Default Extension=\"xml\" ContentType=\"application/xml\"/>",
    "<Override PartName=\"/word/document.xml\" ",
    "ContentType=\"application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml\"/>",
    "</Types>"
);

const ROOT_RELS_XML: &str = concat!(
    "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\r\n",
    "<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">",
    "<Relationship Id=\"rId1\" ",
    "Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument\" ",
    "Target=\"word/document.xml\"/>",
    "</Relationships>"
);

const DOCUMENT_RELS_XML: &str = concat!(
    "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\r\n",
    "<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\"/>"
);

/// The smallest package Word opens: content types, root rels, document rels
/// and the given main document.
pub fn minimal_package(document_xml: &str) -> Vec<(String, Vec<u8>)> {
    vec![
        ("[Content_Types].xml".to_string(), CONTENT_TYPES_XML.as_bytes().to_vec()),
        ("_rels/.rels".to_string(), ROOT_RELS_XML.as_bytes().to_vec()),
        ("word/_rels/document.xml.rels".to_string(), DOCUMENT_RELS_XML.as_bytes().to_vec()),
        (MAIN_DOCUMENT_PART.to_string(), document_xml.as_bytes().to_vec()),
    ]
}

/// Wrap body content (`w:p`/`w:tbl` markup) in a `w:document`
pub fn wrap_body(body_xml: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\r\n\
         <w:document xmlns:w=\"{}\" xmlns:r=\"{}\"><w:body>{}</w:body></w:document>",
        namespaces::W,
        namespaces::R,
        body_xml
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::relationships::Relationships;
    use crate::docx::relationship_types;
    use crate::docx::xml_tree::XmlDocument;

    #[test]
    fn test_minimal_package_is_well_formed() {
        let parts = minimal_package(&wrap_body("<w:p/>"));
        for (name, bytes) in &parts {
            let text = std::str::from_utf8(bytes).unwrap();
            assert!(XmlDocument::parse(text).is_ok(), "{} should parse", name);
        }
        let rels = Relationships::parse(std::str::from_utf8(&parts[1].1).unwrap()).unwrap();
        assert_eq!(
            rels.get_by_type(relationship_types::DOCUMENT).unwrap().target,
            MAIN_DOCUMENT_PART
        );
    }
}
