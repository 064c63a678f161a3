//! ZIP archive reading and small XML value helpers

use crate::docx::error::{DocxError, DocxResult};
use std::io::{Read, Seek};
use zip::ZipArchive;

/// A wrapper around a ZIP archive for reading DOCX files
pub struct DocxReader<R: Read + Seek> {
    archive: ZipArchive<R>,
}

impl<R: Read + Seek> DocxReader<R> {
    /// Create a new DOCX reader from a source that implements Read + Seek
    pub fn new(reader: R) -> DocxResult<Self> {
        let archive = ZipArchive::new(reader)?;
        Ok(Self { archive })
    }

    /// Read a file from the archive as a string
    pub fn read_file_as_string(&mut self, path: &str) -> DocxResult<String> {
        let bytes = self.read_file_as_bytes(path)?;
        Ok(String::from_utf8(bytes)?)
    }

    /// Read a file from the archive as bytes
    pub fn read_file_as_bytes(&mut self, path: &str) -> DocxResult<Vec<u8>> {
        let mut file = self.archive.by_name(path).map_err(|e| {
            if matches!(e, zip::result::ZipError::FileNotFound) {
                DocxError::MissingPart(path.to_string())
            } else {
                DocxError::from(e)
            }
        })?;

        let mut contents = Vec::new();
        file.read_to_end(&mut contents)?;
        Ok(contents)
    }

    /// Every file entry with its bytes, in archive order. Directory entries
    /// are skipped.
    pub fn entries(&mut self) -> DocxResult<Vec<(String, Vec<u8>)>> {
        let mut entries = Vec::with_capacity(self.archive.len());
        for index in 0..self.archive.len() {
            let mut file = self.archive.by_index(index)?;
            if file.is_dir() {
                continue;
            }
            let mut contents = Vec::new();
            file.read_to_end(&mut contents)?;
            entries.push((file.name().to_string(), contents));
        }
        Ok(entries)
    }

    /// Check if a file exists in the archive
    pub fn file_exists(&self, path: &str) -> bool {
        self.archive.file_names().any(|name| name == path)
    }

    /// Check if this looks like a DOCX package at all
    pub fn is_valid_docx(&self) -> bool {
        self.file_exists("[Content_Types].xml") && self.file_exists("_rels/.rels")
    }
}

/// Value helpers for WordprocessingML markup
pub struct XmlParser;

impl XmlParser {
    /// Parse a half-point value to points
    /// DOCX uses half-points for font sizes
    pub fn parse_half_points(value: &str) -> Option<f32> {
        value.parse::<f32>().ok().map(|v| v / 2.0)
    }

    /// Parse a boolean value (0/1, true/false, on/off)
    pub fn parse_bool(value: &str) -> bool {
        matches!(value.to_lowercase().as_str(), "1" | "true" | "on" | "yes")
    }

    /// Check if an element name matches with optional namespace prefix
    pub fn matches_element(name: &str, expected: &str) -> bool {
        Self::local_name(name) == expected
    }

    /// `w:t` -> `t`
    pub fn local_name(name: &str) -> &str {
        name.rsplit_once(':').map_or(name, |(_, local)| local)
    }

    /// `w:t` -> `w:`, `t` -> empty
    pub fn prefix_of(name: &str) -> &str {
        name.rsplit_once(':')
            .map_or("", |(prefix, _)| &name[..prefix.len() + 1])
    }
}
