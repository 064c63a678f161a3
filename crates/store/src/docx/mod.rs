//! DOCX package access
//!
//! A DOCX file is a ZIP archive of XML parts:
//! - `[Content_Types].xml` - Content type definitions
//! - `_rels/.rels` - Root relationships (points at the main document)
//! - `word/document.xml` - Main document content
//! - `word/_rels/document.xml.rels` - Document relationships (headers, footers, media)
//! - `word/header*.xml`, `word/footer*.xml` - Header and footer content
//!
//! Parts the template engine does not edit are carried through byte for byte.

mod error;
mod package;
mod reader;
mod relationships;
mod writer;
mod xml_tree;

pub use error::{DocxError, DocxResult};
pub use package::{minimal_package, wrap_body, MAIN_DOCUMENT_PART};
pub use reader::{DocxReader, XmlParser};
pub use relationships::{part_dir, rels_path_for, resolve_target, Relationship, Relationships, TargetMode};
pub use writer::DocxWriter;
pub use xml_tree::{XmlDocument, XmlElement, XmlNode};

/// XML namespaces used in DOCX files
pub mod namespaces {
    /// Main WordprocessingML namespace
    pub const W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
    /// Relationships namespace
    pub const R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
}

/// Relationship types the template engine follows
pub mod relationship_types {
    pub const DOCUMENT: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
    pub const STYLES: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
    pub const HEADER: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/header";
    pub const FOOTER: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/footer";
}
