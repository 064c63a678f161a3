//! DOCX package writer
//!
//! Writes package parts back into a ZIP archive. XML parts are deflated,
//! media and other binary parts are stored as-is.

use crate::docx::error::DocxResult;
use std::io::{Seek, Write};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Streams parts into a DOCX archive
pub struct DocxWriter<W: Write + Seek> {
    zip: ZipWriter<W>,
}

impl<W: Write + Seek> DocxWriter<W> {
    /// Create a new DOCX writer
    pub fn new(writer: W) -> Self {
        Self {
            zip: ZipWriter::new(writer),
        }
    }

    /// Write one part, picking compression from its extension
    pub fn write_part(&mut self, path: &str, content: &[u8]) -> DocxResult<()> {
        if is_text_part(path) {
            self.write_file(path, content)
        } else {
            self.write_binary(path, content)
        }
    }

    /// Write a text file to the archive
    pub fn write_file(&mut self, path: &str, content: &[u8]) -> DocxResult<()> {
        let options = SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);
        self.zip.start_file(path, options)?;
        self.zip.write_all(content)?;
        Ok(())
    }

    /// Write a binary file to the archive
    pub fn write_binary(&mut self, path: &str, content: &[u8]) -> DocxResult<()> {
        let options = SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);
        self.zip.start_file(path, options)?;
        self.zip.write_all(content)?;
        Ok(())
    }

    /// Finish the archive and hand back the underlying writer
    pub fn finish(self) -> DocxResult<W> {
        Ok(self.zip.finish()?)
    }
}

fn is_text_part(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    lower.ends_with(".xml") || lower.ends_with(".rels") || lower.ends_with(".txt")
}
