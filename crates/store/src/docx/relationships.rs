//! Relationships (.rels) file parsing
//!
//! DOCX uses relationships to connect parts of the document together. The
//! template engine only follows them to find the main document and its
//! header and footer parts.

use crate::docx::error::{DocxError, DocxResult};
use crate::docx::xml_tree::XmlDocument;

/// A single relationship in a .rels file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// Unique ID within the rels file (e.g., "rId1")
    pub id: String,
    /// Relationship type URI
    pub rel_type: String,
    /// Target path (relative to the source part)
    pub target: String,
    /// Target mode (Internal or External)
    pub target_mode: TargetMode,
}

/// Target mode for relationships
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetMode {
    /// Internal target within the package
    #[default]
    Internal,
    /// External target (URL)
    External,
}

/// Relationships from one .rels file, in file order
#[derive(Debug, Clone, Default)]
pub struct Relationships {
    relationships: Vec<Relationship>,
}

impl Relationships {
    /// Parse a .rels file from its XML content
    pub fn parse(content: &str) -> DocxResult<Self> {
        let doc = XmlDocument::parse(content)?;
        let mut relationships = Vec::new();

        for element in doc.root.elements().filter(|e| e.is("Relationship")) {
            let required = |name: &str| {
                element.attribute(name).map(str::to_string).ok_or_else(|| {
                    DocxError::InvalidStructure(format!("Relationship missing {}", name))
                })
            };
            let target_mode = match element.attribute("TargetMode") {
                Some("External") => TargetMode::External,
                _ => TargetMode::Internal,
            };
            relationships.push(Relationship {
                id: required("Id")?,
                rel_type: required("Type")?,
                target: required("Target")?,
                target_mode,
            });
        }

        Ok(Self { relationships })
    }

    /// Get a relationship by ID
    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.relationships.iter().find(|r| r.id == id)
    }

    /// Get the first relationship of a type
    pub fn get_by_type(&self, rel_type: &str) -> Option<&Relationship> {
        self.relationships.iter().find(|r| r.rel_type == rel_type)
    }

    /// Internal targets of a type, in file order
    pub fn internal_targets(&self, rel_type: &str) -> Vec<&str> {
        self.relationships
            .iter()
            .filter(|r| r.rel_type == rel_type && r.target_mode == TargetMode::Internal)
            .map(|r| r.target.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.relationships.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relationships.is_empty()
    }
}

/// Resolve a relationship target against the directory of its source part.
/// `source_dir` is empty for package-level relationships.
pub fn resolve_target(source_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut segments: Vec<&str> = source_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Path of the .rels part that belongs to `part`, e.g.
/// `word/document.xml` -> `word/_rels/document.xml.rels`
pub fn rels_path_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}

/// Directory portion of a part path, empty at the package root
pub fn part_dir(part: &str) -> &str {
    part.rsplit_once('/').map_or("", |(dir, _)| dir)
}
