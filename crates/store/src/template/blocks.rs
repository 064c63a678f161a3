//! Block tree over WordprocessingML content
//!
//! The body of a part is a sequence of paragraphs and tables; table cells
//! hold their own blocks, so tables nest. Content controls (`w:sdt`) and
//! custom XML wrappers are transparent at both block and run level.

use crate::docx::{XmlElement, XmlNode, XmlParser};
use serde::Serialize;

/// Character formatting carried by a run
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RunFormatting {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    /// Font size in points
    pub size: Option<f32>,
    /// Hex color, e.g. `FF0000`
    pub color: Option<String>,
    pub font: Option<String>,
}

impl RunFormatting {
    /// Read `w:rPr` from a run element
    pub(crate) fn from_run(run: &XmlElement) -> Self {
        let mut formatting = Self::default();
        let Some(properties) = run.child("rPr") else {
            return formatting;
        };
        let toggle = |element: &XmlElement| {
            element.w_attribute("val").map_or(true, XmlParser::parse_bool)
        };
        for property in properties.elements() {
            match property.local_name() {
                "b" => formatting.bold = toggle(property),
                "i" => formatting.italic = toggle(property),
                "u" => {
                    formatting.underline = property.w_attribute("val").map_or(true, |v| v != "none")
                }
                "sz" => {
                    formatting.size = property.w_attribute("val").and_then(XmlParser::parse_half_points)
                }
                "color" => formatting.color = property.w_attribute("val").map(str::to_string),
                "rFonts" => {
                    formatting.font = property
                        .w_attribute("ascii")
                        .or_else(|| property.w_attribute("hAnsi"))
                        .map(str::to_string)
                }
                _ => {}
            }
        }
        formatting
    }
}

/// What a piece of run content is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunContent {
    /// Editable text from `w:t`
    Text,
    Tab,
    Break,
    /// Symbol or special hyphen; rendered but not editable as text
    Symbol,
}

/// One text-bearing piece of a run, in reading order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextRun {
    pub text: String,
    pub kind: RunContent,
    pub formatting: RunFormatting,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Paragraph {
    pub runs: Vec<TextRun>,
}

impl Paragraph {
    /// Visible text of the paragraph
    pub fn text(&self) -> String {
        self.runs.iter().map(|run| run.text.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TableCell {
    pub blocks: Vec<Block>,
}

impl TableCell {
    /// Non-empty paragraph lines, nested tables flattened
    pub fn text(&self) -> String {
        let mut lines = Vec::new();
        collect_lines(&self.blocks, &mut lines);
        lines.join("\n")
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TableRow {
    pub cells: Vec<TableCell>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Table {
    pub rows: Vec<TableRow>,
}

/// A body-level block
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
}

impl Block {
    /// Every paragraph in this block, depth first
    pub fn paragraphs(&self) -> Vec<&Paragraph> {
        let mut out = Vec::new();
        push_paragraphs(self, &mut out);
        out
    }
}

fn push_paragraphs<'b>(block: &'b Block, out: &mut Vec<&'b Paragraph>) {
    match block {
        Block::Paragraph(paragraph) => out.push(paragraph),
        Block::Table(table) => {
            for cell in table.rows.iter().flat_map(|row| &row.cells) {
                for inner in &cell.blocks {
                    push_paragraphs(inner, out);
                }
            }
        }
    }
}

fn collect_lines(blocks: &[Block], lines: &mut Vec<String>) {
    for block in blocks {
        match block {
            Block::Paragraph(paragraph) => {
                let text = paragraph.text();
                if !text.trim().is_empty() {
                    lines.push(text);
                }
            }
            Block::Table(table) => {
                for cell in table.rows.iter().flat_map(|row| &row.cells) {
                    collect_lines(&cell.blocks, lines);
                }
            }
        }
    }
}

/// How the visitor treats an element found among blocks
enum BlockKind {
    Paragraph,
    Table,
    /// Walk straight through (`w:body`, `w:sdt`, `w:sdtContent`, ...)
    Container,
    Skip,
}

fn block_kind(element: &XmlElement) -> BlockKind {
    match element.local_name() {
        "p" => BlockKind::Paragraph,
        "tbl" => BlockKind::Table,
        "document" | "body" | "hdr" | "ftr" | "sdt" | "sdtContent" | "customXml" => {
            BlockKind::Container
        }
        _ => BlockKind::Skip,
    }
}

/// Build the block tree under a part's root element
pub fn collect_blocks(root: &XmlElement) -> Vec<Block> {
    let mut blocks = Vec::new();
    push_blocks(root, &mut blocks);
    blocks
}

fn push_blocks(container: &XmlElement, blocks: &mut Vec<Block>) {
    for element in container.elements() {
        match block_kind(element) {
            BlockKind::Paragraph => blocks.push(Block::Paragraph(read_paragraph(element))),
            BlockKind::Table => blocks.push(Block::Table(read_table(element))),
            BlockKind::Container => push_blocks(element, blocks),
            BlockKind::Skip => {}
        }
    }
}

fn read_paragraph(paragraph: &XmlElement) -> Paragraph {
    Paragraph {
        runs: collect_segments(paragraph)
            .into_iter()
            .map(|segment| TextRun {
                text: segment.text,
                kind: segment.kind,
                formatting: segment.formatting,
            })
            .collect(),
    }
}

fn read_table(table: &XmlElement) -> Table {
    let mut rows = Vec::new();
    for row in rows_of(table) {
        let cells = cells_of(row)
            .into_iter()
            .map(|cell| {
                let mut blocks = Vec::new();
                push_blocks(cell, &mut blocks);
                TableCell { blocks }
            })
            .collect();
        rows.push(TableRow { cells });
    }
    Table { rows }
}

/// `w:tr` children, looking through row-level content controls
fn rows_of(table: &XmlElement) -> Vec<&XmlElement> {
    let mut rows = Vec::new();
    descend_to(table, "tr", &mut rows);
    rows
}

fn cells_of(row: &XmlElement) -> Vec<&XmlElement> {
    let mut cells = Vec::new();
    descend_to(row, "tc", &mut cells);
    cells
}

fn descend_to<'e>(parent: &'e XmlElement, local: &str, out: &mut Vec<&'e XmlElement>) {
    for element in parent.elements() {
        if element.is(local) {
            out.push(element);
        } else if matches!(element.local_name(), "sdt" | "sdtContent" | "customXml") {
            descend_to(element, local, out);
        }
    }
}

/// Visit every paragraph element under `root` mutably, in document order,
/// including paragraphs inside (nested) table cells.
pub(crate) fn for_each_paragraph_mut<F>(root: &mut XmlElement, visit: &mut F)
where
    F: FnMut(&mut XmlElement),
{
    for node in &mut root.children {
        let XmlNode::Element(element) = node else {
            continue;
        };
        match block_kind(element) {
            BlockKind::Paragraph => visit(element),
            BlockKind::Table => visit_table_mut(element, visit),
            BlockKind::Container => for_each_paragraph_mut(element, visit),
            BlockKind::Skip => {}
        }
    }
}

fn visit_table_mut<F>(element: &mut XmlElement, visit: &mut F)
where
    F: FnMut(&mut XmlElement),
{
    for node in &mut element.children {
        let XmlNode::Element(child) = node else {
            continue;
        };
        match child.local_name() {
            "tr" | "sdt" | "sdtContent" | "customXml" => visit_table_mut(child, visit),
            "tc" => for_each_paragraph_mut(child, visit),
            _ => {}
        }
    }
}

/// A text-bearing leaf inside a paragraph, addressed by child indices from
/// the paragraph element
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Segment {
    pub text: String,
    pub kind: RunContent,
    pub formatting: RunFormatting,
    pub path: Vec<usize>,
}

impl Segment {
    pub fn editable(&self) -> bool {
        self.kind == RunContent::Text
    }
}

/// Elements whose runs are part of the paragraph's visible text
fn is_run_container(local: &str) -> bool {
    matches!(
        local,
        "hyperlink" | "ins" | "smartTag" | "fldSimple" | "sdt" | "sdtContent" | "customXml"
            | "moveTo" | "dir" | "bdo"
    )
}

/// Text leaves of a paragraph in reading order. Deleted and moved-from
/// revisions and field instructions are not visible text and are skipped.
pub(crate) fn collect_segments(paragraph: &XmlElement) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut path = Vec::new();
    walk_runs(paragraph, &mut path, &mut segments);
    segments
}

fn walk_runs(container: &XmlElement, path: &mut Vec<usize>, segments: &mut Vec<Segment>) {
    for (index, node) in container.children.iter().enumerate() {
        let XmlNode::Element(element) = node else {
            continue;
        };
        path.push(index);
        let local = element.local_name();
        if local == "r" {
            read_run(element, path, segments);
        } else if is_run_container(local) {
            walk_runs(element, path, segments);
        }
        path.pop();
    }
}

fn read_run(run: &XmlElement, path: &mut Vec<usize>, segments: &mut Vec<Segment>) {
    let formatting = RunFormatting::from_run(run);
    for (index, node) in run.children.iter().enumerate() {
        let XmlNode::Element(element) = node else {
            continue;
        };
        let (text, kind) = match element.local_name() {
            "t" => (element.text(), RunContent::Text),
            "tab" | "ptab" => ("\t".to_string(), RunContent::Tab),
            "br" | "cr" => ("\n".to_string(), RunContent::Break),
            "noBreakHyphen" => ("\u{2011}".to_string(), RunContent::Symbol),
            "softHyphen" => ("\u{00AD}".to_string(), RunContent::Symbol),
            "sym" => {
                let symbol = element
                    .w_attribute("char")
                    .and_then(|code| u32::from_str_radix(code, 16).ok())
                    .and_then(char::from_u32)
                    .unwrap_or('\u{FFFD}');
                (symbol.to_string(), RunContent::Symbol)
            }
            _ => continue,
        };
        path.push(index);
        segments.push(Segment {
            text,
            kind,
            formatting: formatting.clone(),
            path: path.clone(),
        });
        path.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::XmlDocument;

    fn parse(body: &str) -> XmlDocument {
        XmlDocument::parse(&crate::docx::wrap_body(body)).unwrap()
    }

    #[test]
    fn test_runs_through_hyperlinks_and_content_controls() {
        let doc = parse(concat!(
            "<w:p>",
            "<w:r><w:t>A</w:t></w:r>",
            "<w:hyperlink><w:r><w:t>B</w:t></w:r></w:hyperlink>",
            "<w:sdt><w:sdtPr/><w:sdtContent><w:r><w:t>C</w:t></w:r></w:sdtContent></w:sdt>",
            "<w:del><w:r><w:delText>gone</w:delText></w:r></w:del>",
            "<w:r><w:instrText> PAGE </w:instrText></w:r>",
            "<w:r><w:tab/><w:t>D</w:t><w:br/></w:r>",
            "</w:p>"
        ));
        let blocks = collect_blocks(&doc.root);
        let Block::Paragraph(paragraph) = &blocks[0] else {
            panic!("expected a paragraph");
        };
        assert_eq!(paragraph.text(), "ABC\tD\n");
    }

    #[test]
    fn test_formatting_is_read() {
        let doc = parse(concat!(
            "<w:p><w:r><w:rPr><w:b/><w:i w:val=\"0\"/><w:sz w:val=\"28\"/>",
            "<w:color w:val=\"FF0000\"/><w:rFonts w:ascii=\"Arial\"/><w:u w:val=\"single\"/></w:rPr>",
            "<w:t>x</w:t></w:r></w:p>"
        ));
        let blocks = collect_blocks(&doc.root);
        let Block::Paragraph(paragraph) = &blocks[0] else {
            panic!("expected a paragraph");
        };
        let formatting = &paragraph.runs[0].formatting;
        assert!(formatting.bold);
        assert!(!formatting.italic);
        assert!(formatting.underline);
        assert_eq!(formatting.size, Some(14.0));
        assert_eq!(formatting.color.as_deref(), Some("FF0000"));
        assert_eq!(formatting.font.as_deref(), Some("Arial"));
    }

    #[test]
    fn test_nested_tables() {
        let doc = parse(concat!(
            "<w:tbl><w:tblPr/><w:tr><w:tc><w:p><w:r><w:t>outer</w:t></w:r></w:p>",
            "<w:tbl><w:tr><w:tc><w:p><w:r><w:t>inner</w:t></w:r></w:p></w:tc></w:tr></w:tbl>",
            "</w:tc><w:tc><w:p/></w:tc></w:tr></w:tbl>",
            "<w:p><w:r><w:t>after</w:t></w:r></w:p>"
        ));
        let blocks = collect_blocks(&doc.root);
        assert_eq!(blocks.len(), 2);
        let Block::Table(table) = &blocks[0] else {
            panic!("expected a table");
        };
        assert_eq!(table.rows[0].cells.len(), 2);
        assert_eq!(table.rows[0].cells[0].text(), "outer\ninner");
        let texts: Vec<String> = blocks[0].paragraphs().iter().map(|p| p.text()).collect();
        assert_eq!(texts, vec!["outer", "inner", ""]);
    }

    #[test]
    fn test_mutable_visit_matches_block_order() {
        let mut doc = parse(concat!(
            "<w:p><w:r><w:t>1</w:t></w:r></w:p>",
            "<w:tbl><w:tr><w:tc><w:p><w:r><w:t>2</w:t></w:r></w:p>",
            "<w:tbl><w:tr><w:tc><w:p><w:r><w:t>3</w:t></w:r></w:p></w:tc></w:tr></w:tbl>",
            "</w:tc></w:tr></w:tbl>",
            "<w:sdt><w:sdtContent><w:p><w:r><w:t>4</w:t></w:r></w:p></w:sdtContent></w:sdt>",
            "<w:sectPr/>"
        ));
        let mut seen = Vec::new();
        for_each_paragraph_mut(&mut doc.root, &mut |p: &mut XmlElement| {
            let text: String = collect_segments(p).into_iter().map(|s| s.text).collect();
            seen.push(text);
        });
        assert_eq!(seen, vec!["1", "2", "3", "4"]);

        let blocks = collect_blocks(&doc.root);
        let from_tree: Vec<String> = blocks
            .iter()
            .flat_map(|b| b.paragraphs())
            .map(|p| p.text())
            .collect();
        assert_eq!(from_tree, seen);
    }

    #[test]
    fn test_segment_paths_address_text_elements() {
        let doc = parse("<w:p><w:pPr/><w:hyperlink><w:r><w:rPr/><w:t>x</w:t></w:r></w:hyperlink></w:p>");
        let paragraph = doc.root.descendant(&[0, 0]).unwrap();
        let segments = collect_segments(paragraph);
        assert_eq!(segments[0].path, vec![1, 0, 1]);
        assert!(paragraph.descendant(&segments[0].path).unwrap().is("t"));
        assert!(segments[0].editable());
    }
}
