//! Template documents: discover placeholders, fill them, save the result
//!
//! A [`TemplateDocument`] keeps every package part as loaded. The main
//! document and its headers and footers are parsed into XML trees; all other
//! parts (styles, media, settings) are written back unchanged. Filling never
//! mutates the receiver: it works on a copy and returns it in a
//! [`FillOutcome`].

use crate::docx::{
    minimal_package, part_dir, rels_path_for, relationship_types, resolve_target, DocxError,
    DocxReader, DocxResult, DocxWriter, Relationships, XmlDocument, XmlElement, XmlNode, XmlParser,
};
use crate::error::{Result, StoreError};
use crate::template::blocks::{collect_blocks, collect_segments, for_each_paragraph_mut, Block};
use crate::template::reconcile::{self, SegmentText};
use doc_model::{scan_placeholders, MappingResult, PlaceholderName};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::{BufReader, Cursor, Read, Seek, Write};
use std::path::Path;
use tracing::{debug, info, warn};

/// Which story a content part belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PartKind {
    Body,
    Header,
    Footer,
}

#[derive(Debug, Clone)]
struct ContentPart {
    path: String,
    kind: PartKind,
    xml: XmlDocument,
    modified: bool,
}

/// A loaded `.docx` template
#[derive(Debug, Clone)]
pub struct TemplateDocument {
    /// Every package entry, in archive order
    parts: Vec<(String, Vec<u8>)>,
    /// Parsed main document first, then headers, then footers
    content: Vec<ContentPart>,
}

/// A paragraph that could not be filled and was left as it was
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockFailure {
    /// Package part holding the paragraph
    pub part: String,
    /// Paragraph ordinal within the part, counting table cell paragraphs
    pub block: usize,
    pub placeholder: String,
    pub reason: String,
    /// Paragraph text as it remains in the output
    pub text: String,
}

/// Result of [`TemplateDocument::fill`]
#[derive(Debug, Clone)]
pub struct FillOutcome {
    /// The filled copy
    pub document: TemplateDocument,
    /// Number of placeholder occurrences replaced
    pub replacements: usize,
    pub filled: BTreeSet<PlaceholderName>,
    /// Placeholders left in place because the mapping had no value
    pub left_unmapped: BTreeSet<PlaceholderName>,
    pub failures: Vec<BlockFailure>,
}

impl FillOutcome {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.left_unmapped.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "Replaced {} occurrence(s) of {} placeholder(s); {} left unmapped, {} block(s) failed",
            self.replacements,
            self.filled.len(),
            self.left_unmapped.len(),
            self.failures.len()
        )
    }
}

impl TemplateDocument {
    /// Load a template from disk
    pub fn load(path: impl AsRef<Path>) -> DocxResult<Self> {
        let path = path.as_ref();
        let file = fs::File::open(path)?;
        let document = Self::from_reader(BufReader::new(file))?;
        debug!(path = %path.display(), parts = document.parts.len(), "Loaded template");
        Ok(document)
    }

    /// Load a template from in-memory `.docx` bytes
    pub fn from_bytes(bytes: &[u8]) -> DocxResult<Self> {
        Self::from_reader(Cursor::new(bytes))
    }

    pub fn from_reader<R: Read + Seek>(reader: R) -> DocxResult<Self> {
        let mut reader = DocxReader::new(reader)?;
        if !reader.is_valid_docx() {
            return Err(DocxError::InvalidStructure(
                "package has no [Content_Types].xml or _rels/.rels".to_string(),
            ));
        }
        Self::from_parts(reader.entries()?)
    }

    /// Build a template around a bare `word/document.xml`
    pub fn from_document_xml(document_xml: &str) -> DocxResult<Self> {
        Self::from_parts(minimal_package(document_xml))
    }

    fn from_parts(parts: Vec<(String, Vec<u8>)>) -> DocxResult<Self> {
        let root_rels = Relationships::parse(&part_text(&parts, "_rels/.rels")?)?;
        let main_path = root_rels
            .get_by_type(relationship_types::DOCUMENT)
            .map(|rel| resolve_target("", &rel.target))
            .ok_or_else(|| DocxError::MissingPart("main document relationship".to_string()))?;

        let main = XmlDocument::parse(&part_text(&parts, &main_path)?)?;
        if !main.root.is("document") {
            return Err(DocxError::InvalidStructure(format!(
                "{} root is <{}>, expected <w:document>",
                main_path, main.root.name
            )));
        }

        let mut content = vec![ContentPart {
            path: main_path.clone(),
            kind: PartKind::Body,
            xml: main,
            modified: false,
        }];

        let rels_path = rels_path_for(&main_path);
        if has_part(&parts, &rels_path) {
            let doc_rels = Relationships::parse(&part_text(&parts, &rels_path)?)?;
            let stories = [
                (relationship_types::HEADER, PartKind::Header),
                (relationship_types::FOOTER, PartKind::Footer),
            ];
            for (rel_type, kind) in stories {
                for target in doc_rels.internal_targets(rel_type) {
                    let path = resolve_target(part_dir(&main_path), target);
                    if !has_part(&parts, &path) {
                        warn!(part = %path, "Referenced header/footer part is missing");
                        continue;
                    }
                    let xml = XmlDocument::parse(&part_text(&parts, &path)?)?;
                    content.push(ContentPart {
                        path,
                        kind,
                        xml,
                        modified: false,
                    });
                }
            }
        }

        Ok(Self { parts, content })
    }

    /// Body blocks of the main document, in order
    pub fn blocks(&self) -> Vec<Block> {
        collect_blocks(&self.content[0].xml.root)
    }

    /// Blocks of every content part (body, headers, footers)
    pub fn part_blocks(&self) -> Vec<(&str, PartKind, Vec<Block>)> {
        self.content
            .iter()
            .map(|part| (part.path.as_str(), part.kind, collect_blocks(&part.xml.root)))
            .collect()
    }

    /// Number of body-level blocks in the main document
    pub fn block_count(&self) -> usize {
        self.blocks().len()
    }

    /// Distinct placeholder names across body, tables, headers and footers
    pub fn discover(&self) -> BTreeSet<PlaceholderName> {
        let mut names = BTreeSet::new();
        for part in &self.content {
            for block in collect_blocks(&part.xml.root) {
                for paragraph in block.paragraphs() {
                    names.extend(scan_placeholders(&paragraph.text()).into_iter().map(|m| m.name));
                }
            }
        }
        names
    }

    /// Every discovered placeholder with an empty value, for hand editing
    pub fn placeholder_template(&self) -> BTreeMap<String, String> {
        self.discover()
            .into_iter()
            .map(|name| (name.as_str().to_string(), String::new()))
            .collect()
    }

    /// Readable text of the main document: paragraphs as lines, table rows
    /// as ` | `-separated cells, sections separated by blank lines.
    pub fn plain_text(&self) -> String {
        let mut sections = Vec::new();
        for block in self.blocks() {
            match block {
                Block::Paragraph(paragraph) => {
                    let text = paragraph.text();
                    if !text.trim().is_empty() {
                        sections.push(text);
                    }
                }
                Block::Table(table) => {
                    let rows: Vec<String> = table
                        .rows
                        .iter()
                        .map(|row| {
                            row.cells
                                .iter()
                                .map(|cell| cell.text())
                                .collect::<Vec<_>>()
                                .join(" | ")
                        })
                        .collect();
                    if !rows.is_empty() {
                        sections.push(rows.join("\n"));
                    }
                }
            }
        }
        sections.join("\n\n")
    }

    /// Replace every mapped placeholder in a copy of this document.
    ///
    /// Placeholders whose mapping value is unmapped (or that are absent from
    /// the mapping) stay in the output verbatim. A paragraph whose runs
    /// cannot be reconciled is left untouched and reported in
    /// [`FillOutcome::failures`]; the rest of the document is still filled.
    pub fn fill(&self, mapping: &MappingResult) -> FillOutcome {
        let mut document = self.clone();
        let mut replacements = 0;
        let mut filled = BTreeSet::new();
        let mut left_unmapped = BTreeSet::new();
        let mut failures = Vec::new();

        for part in &mut document.content {
            let part_path = part.path.clone();
            let mut ordinal = 0usize;
            let mut changed = false;

            for_each_paragraph_mut(&mut part.xml.root, &mut |paragraph: &mut XmlElement| {
                let block = ordinal;
                ordinal += 1;
                match fill_paragraph(paragraph, mapping) {
                    Ok(plan) => {
                        replacements += plan.replaced.len();
                        changed |= !plan.edits.is_empty();
                        filled.extend(plan.replaced);
                        left_unmapped.extend(plan.left);
                    }
                    Err(failure) => {
                        let text: String = collect_segments(paragraph)
                            .into_iter()
                            .map(|segment| segment.text)
                            .collect();
                        warn!(
                            part = %part_path,
                            block,
                            placeholder = %failure.placeholder,
                            "Could not fill paragraph: {}",
                            failure.reason
                        );
                        failures.push(BlockFailure {
                            part: part_path.clone(),
                            block,
                            placeholder: failure.placeholder,
                            reason: failure.reason,
                            text,
                        });
                    }
                }
            });

            part.modified |= changed;
        }

        info!(
            replacements,
            filled = filled.len(),
            left_unmapped = left_unmapped.len(),
            failures = failures.len(),
            "Template filled"
        );

        FillOutcome {
            document,
            replacements,
            filled,
            left_unmapped,
            failures,
        }
    }

    /// Serialize the package. Edited parts are re-serialized; all other
    /// entries are written back byte for byte in their original order.
    pub fn to_bytes(&self) -> DocxResult<Vec<u8>> {
        let mut writer = DocxWriter::new(Cursor::new(Vec::new()));
        for (name, bytes) in &self.parts {
            match self.content.iter().find(|part| part.modified && &part.path == name) {
                Some(part) => writer.write_part(name, part.xml.to_xml().as_bytes())?,
                None => writer.write_part(name, bytes)?,
            }
        }
        Ok(writer.finish()?.into_inner())
    }

    /// Write the document to `path`. The package is fully built in memory
    /// before anything touches the filesystem, and the file is written
    /// under a temporary name and renamed into place, so a failure never
    /// leaves a partial `.docx` behind.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;
        write_atomically(path, &bytes).map_err(|source| StoreError::Persist {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), bytes = bytes.len(), "Saved document");
        Ok(())
    }
}

fn has_part(parts: &[(String, Vec<u8>)], name: &str) -> bool {
    parts.iter().any(|(part, _)| part == name)
}

fn part_text(parts: &[(String, Vec<u8>)], name: &str) -> DocxResult<String> {
    let (_, bytes) = parts
        .iter()
        .find(|(part, _)| part == name)
        .ok_or_else(|| DocxError::MissingPart(name.to_string()))?;
    let text = String::from_utf8(bytes.clone())?;
    Ok(match text.strip_prefix('\u{FEFF}') {
        Some(stripped) => stripped.to_string(),
        None => text,
    })
}

/// Why a paragraph was left as it was
struct ParagraphFailure {
    placeholder: String,
    reason: String,
}

impl From<reconcile::ReconcileError> for ParagraphFailure {
    fn from(error: reconcile::ReconcileError) -> Self {
        Self {
            placeholder: error.placeholder.as_str().to_string(),
            reason: error.reason,
        }
    }
}

fn fill_paragraph(
    paragraph: &mut XmlElement,
    mapping: &MappingResult,
) -> std::result::Result<reconcile::ReconcilePlan, ParagraphFailure> {
    let segments = collect_segments(paragraph);
    let texts: Vec<SegmentText<'_>> = segments
        .iter()
        .map(|segment| SegmentText {
            text: &segment.text,
            editable: segment.editable(),
        })
        .collect();
    let plan = reconcile::plan(&texts, |name| mapping.value_for(name))?;

    // check every target before the first edit so a paragraph is never half filled
    for edit in &plan.edits {
        let target = paragraph.descendant(&segments[edit.segment].path);
        if !target.is_some_and(|element| element.is("t")) {
            return Err(ParagraphFailure {
                placeholder: plan
                    .replaced
                    .first()
                    .map(|name| name.as_str().to_string())
                    .unwrap_or_default(),
                reason: "text element moved while filling".to_string(),
            });
        }
    }

    // later segments first, so splicing line breaks keeps earlier paths valid
    for edit in plan.edits.iter().rev() {
        write_segment(paragraph, &segments[edit.segment].path, &edit.text);
    }
    Ok(plan)
}

/// Put `text` into the `w:t` at `path`. Newlines become `w:br` siblings
/// inside the same run, so the run's formatting carries over to every line.
fn write_segment(paragraph: &mut XmlElement, path: &[usize], text: &str) {
    let Some((&index, run_path)) = path.split_last() else {
        return;
    };
    let Some(run) = paragraph.descendant_mut(run_path) else {
        return;
    };
    let Some(XmlNode::Element(original)) = run.children.get(index) else {
        return;
    };

    let break_name = format!("{}br", XmlParser::prefix_of(&original.name));
    let template = XmlElement {
        name: original.name.clone(),
        attributes: original.attributes.clone(),
        children: Vec::new(),
    };

    let text = sanitize(text);
    let mut nodes = Vec::new();
    for (line_number, line) in text.split('\n').enumerate() {
        if line_number > 0 {
            nodes.push(XmlNode::Element(XmlElement::new(break_name.clone())));
        }
        let mut element = template.clone();
        element.set_attribute("xml:space", "preserve");
        element.set_text(line);
        nodes.push(XmlNode::Element(element));
    }
    run.children.splice(index..=index, nodes);
}

/// Normalize line endings and drop characters XML 1.0 cannot carry
fn sanitize(text: &str) -> String {
    text.replace("\r\n", "\n")
        .replace('\r', "\n")
        .chars()
        .filter(|&c| matches!(c, '\t' | '\n') || (c >= ' ' && c != '\u{FFFE}' && c != '\u{FFFF}'))
        .collect()
}

/// Write through a uniquely named temp file in the target directory, then
/// rename over `path`. Concurrent saves never share a temp file.
fn write_atomically(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let file_name = path.file_name().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "output path has no file name")
    })?;
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let mut prefix = std::ffi::OsString::from(".");
    prefix.push(file_name);
    prefix.push(".");
    let mut temp = tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(".tmp")
        .tempfile_in(parent)?;
    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;
    // a failed persist drops the temp file, which removes it
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
