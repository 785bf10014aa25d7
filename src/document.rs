//! Structured view of a WordprocessingML body (`word/document.xml`).
//!
//! The body is split into paragraphs, tables and opaque blocks. Every part
//! keeps its original XML, so serializing an unmodified document yields the
//! input byte for byte. Only paragraphs that are explicitly rewritten get new
//! markup.

use crate::error::{LetterError, Result};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Any element tag: group 1 = closing slash, group 2 = name, group 3 = self-closing slash
    static ref TAG_RE: Regex =
        Regex::new(r"<(/)?([A-Za-z_][\w.\-]*(?::[\w.\-]+)?)[^>]*?(/)?>").unwrap();
    static ref BODY_OPEN_RE: Regex = Regex::new(r"<w:body(?:\s[^>]*)?>").unwrap();
    static ref FONT_RE: Regex = Regex::new(r#"<w:rFonts\s[^>]*?w:ascii="([^"]*)""#).unwrap();
    static ref SIZE_RE: Regex = Regex::new(r#"<w:sz\s+w:val="(\d+)""#).unwrap();
    static ref BOLD_RE: Regex = Regex::new(r#"<w:b(?:\s+w:val="([^"]*)")?\s*/>"#).unwrap();
}

/// Drawings and embedded objects. Their text belongs to their own paragraphs
/// (text boxes), never to the run or paragraph that anchors them.
const OBJECT_ELEMENTS: [&str; 5] = [
    "mc:AlternateContent",
    "w:drawing",
    "w:pict",
    "w:object",
    "w:txbxContent",
];

fn is_object(name: Option<&str>) -> bool {
    name.is_some_and(|n| OBJECT_ELEMENTS.contains(&n))
}

// ─── XML helpers ────────────────────────────────────────────────────────────

/// Characters XML 1.0 does not allow in a document at all.
fn is_forbidden_xml_char(ch: char) -> bool {
    (ch < ' ' && !matches!(ch, '\t' | '\n' | '\r')) || ch == '\u{FFFE}' || ch == '\u{FFFF}'
}

/// Escape markup characters and drop characters XML cannot carry.
pub fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c if is_forbidden_xml_char(c) => {}
            _ => out.push(ch),
        }
    }
    out
}

pub fn xml_unescape(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let Some(semi) = tail.find(';') else {
            out.push_str(tail);
            return out;
        };
        let entity = &tail[1..semi];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ if entity.starts_with("#x") || entity.starts_with("#X") => {
                u32::from_str_radix(&entity[2..], 16).ok().and_then(char::from_u32)
            }
            _ if entity.starts_with('#') => entity[1..].parse().ok().and_then(char::from_u32),
            _ => None,
        };
        match decoded {
            Some(ch) => {
                out.push(ch);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// A top-level node of an XML fragment: an element (`name` set) or the text
/// between elements.
struct Node<'a> {
    name: Option<&'a str>,
    xml: &'a str,
}

fn emit<'a>(
    inner: &'a str,
    nodes: &mut Vec<Node<'a>>,
    cursor: &mut usize,
    start: usize,
    end: usize,
    name: &'a str,
) {
    if start > *cursor {
        nodes.push(Node {
            name: None,
            xml: &inner[*cursor..start],
        });
    }
    nodes.push(Node {
        name: Some(name),
        xml: &inner[start..end],
    });
    *cursor = end;
}

/// Split a fragment into its top-level elements and the gaps between them.
fn children(inner: &str) -> Vec<Node<'_>> {
    let mut nodes = Vec::new();
    let mut depth = 0usize;
    let mut cursor = 0usize;
    let mut open: Option<(usize, &str)> = None;

    for caps in TAG_RE.captures_iter(inner) {
        let Some(whole) = caps.get(0) else { continue };
        let name = caps.get(2).map_or("", |m| m.as_str());
        if caps.get(1).is_some() {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                if let Some((start, open_name)) = open.take() {
                    emit(inner, &mut nodes, &mut cursor, start, whole.end(), open_name);
                }
            }
        } else if caps.get(3).is_some() {
            if depth == 0 {
                emit(inner, &mut nodes, &mut cursor, whole.start(), whole.end(), name);
            }
        } else {
            if depth == 0 {
                open = Some((whole.start(), name));
            }
            depth += 1;
        }
    }
    if cursor < inner.len() {
        nodes.push(Node {
            name: None,
            xml: &inner[cursor..],
        });
    }
    nodes
}

/// Split an element into (opening tag, content, closing tag).
fn split_element(xml: &str) -> (&str, &str, &str) {
    let open_end = xml.find('>').map_or(xml.len(), |i| i + 1);
    if xml[..open_end].ends_with("/>") {
        return (&xml[..open_end], "", "");
    }
    let close_start = xml
        .rfind("</")
        .filter(|&i| i >= open_end)
        .unwrap_or(xml.len());
    (&xml[..open_end], &xml[open_end..close_start], &xml[close_start..])
}

/// Rebuild a fragment, replacing every outermost `name` element with `f(element)`.
fn replace_elements(xml: &str, name: &str, f: &mut dyn FnMut(&str) -> String) -> String {
    let mut out = String::with_capacity(xml.len());
    for node in children(xml) {
        match node.name {
            Some(n) if n == name => out.push_str(&f(node.xml)),
            Some(_) => {
                let (open, inner, close) = split_element(node.xml);
                out.push_str(open);
                out.push_str(&replace_elements(inner, name, f));
                out.push_str(close);
            }
            None => out.push_str(node.xml),
        }
    }
    out
}

/// Outermost `name` elements of a fragment, not looking inside `skip` elements.
fn find_elements<'a>(xml: &'a str, name: &str, skip: &str, found: &mut Vec<&'a str>) {
    for node in children(xml) {
        match node.name {
            Some(n) if n == name => found.push(node.xml),
            Some(n) if n == skip => {}
            Some(_) => find_elements(split_element(node.xml).1, name, skip, found),
            None => {}
        }
    }
}

fn contains_object(run_xml: &str) -> bool {
    children(split_element(run_xml).1)
        .iter()
        .any(|n| is_object(n.name))
}

/// A run reduced to its properties and embedded objects.
fn object_run(run_xml: &str) -> String {
    let (open, inner, close) = split_element(run_xml);
    let mut out = open.to_string();
    for node in children(inner) {
        if node.name == Some("w:rPr") || is_object(node.name) {
            out.push_str(node.xml);
        }
    }
    out.push_str(close);
    out
}

// ─── Runs ───────────────────────────────────────────────────────────────────

/// A styled run as found in the document.
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub text: String,
    pub font: Option<String>,
    /// Font size in half-points (`w:sz`)
    pub size_half_points: Option<u32>,
    pub bold: bool,
}

impl Run {
    /// Reads direct children only: text inside drawings and text boxes is
    /// not part of the run.
    fn parse(xml: &str) -> Self {
        let mut text = String::new();
        let mut rpr = "";
        for node in children(split_element(xml).1) {
            match node.name {
                Some("w:rPr") => rpr = split_element(node.xml).1,
                Some("w:t") => text.push_str(&xml_unescape(split_element(node.xml).1)),
                Some("w:tab") => text.push('\t'),
                Some("w:br") | Some("w:cr") => text.push('\n'),
                _ => {}
            }
        }
        let bold = BOLD_RE.captures(rpr).is_some_and(|c| {
            !matches!(
                c.get(1).map(|v| v.as_str()),
                Some("0") | Some("false") | Some("off")
            )
        });
        Self {
            text,
            font: FONT_RE.captures(rpr).map(|c| xml_unescape(&c[1])),
            size_half_points: SIZE_RE.captures(rpr).and_then(|c| c[1].parse().ok()),
            bold,
        }
    }
}

/// Largest font size Word accepts (1638 pt).
const MAX_SIZE_HALF_POINTS: f32 = 3276.0;

/// Formatting applied to runs written by the generator.
#[derive(Debug, Clone, PartialEq)]
pub struct RunStyle {
    pub font: String,
    pub size_half_points: u32,
    pub bold: bool,
}

impl RunStyle {
    pub fn new(font: impl Into<String>, size_pt: f32) -> Self {
        Self {
            font: font.into(),
            size_half_points: (size_pt * 2.0).round().max(1.0).min(MAX_SIZE_HALF_POINTS) as u32,
            bold: false,
        }
    }

    pub fn with_bold(&self, bold: bool) -> Self {
        Self {
            bold,
            ..self.clone()
        }
    }

    fn rpr_xml(&self) -> String {
        let font = xml_escape(&self.font);
        format!(
            r#"<w:rPr><w:rFonts w:ascii="{f}" w:hAnsi="{f}" w:cs="{f}"/>{b}<w:sz w:val="{s}"/><w:szCs w:val="{s}"/></w:rPr>"#,
            f = font,
            b = if self.bold { "<w:b/><w:bCs/>" } else { "" },
            s = self.size_half_points,
        )
    }

    /// A single run holding `text`; tabs and newlines become `w:tab` / `w:br`.
    fn run_xml(&self, text: &str) -> String {
        fn flush(out: &mut String, buf: &mut String) {
            if !buf.is_empty() {
                out.push_str(r#"<w:t xml:space="preserve">"#);
                out.push_str(&xml_escape(buf));
                out.push_str("</w:t>");
                buf.clear();
            }
        }

        let mut out = String::from("<w:r>");
        out.push_str(&self.rpr_xml());
        let mut buf = String::new();
        for ch in text.chars() {
            match ch {
                '\t' => {
                    flush(&mut out, &mut buf);
                    out.push_str("<w:tab/>");
                }
                '\n' => {
                    flush(&mut out, &mut buf);
                    out.push_str("<w:br/>");
                }
                '\r' => {}
                _ => buf.push(ch),
            }
        }
        flush(&mut out, &mut buf);
        out.push_str("</w:r>");
        out
    }
}

// ─── Paragraphs ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    xml: String,
}

impl Paragraph {
    pub fn from_xml(xml: impl Into<String>) -> Self {
        Self { xml: xml.into() }
    }

    /// A plain paragraph with one run.
    pub fn new(text: &str, style: &RunStyle) -> Self {
        Self {
            xml: format!("<w:p>{}</w:p>", style.run_xml(text)),
        }
    }

    /// A paragraph using the named paragraph style (e.g. "Heading1").
    pub fn styled(style_id: &str, text: &str, style: &RunStyle) -> Self {
        Self {
            xml: format!(
                r#"<w:p><w:pPr><w:pStyle w:val="{}"/></w:pPr>{}</w:p>"#,
                xml_escape(style_id),
                style.run_xml(text)
            ),
        }
    }

    pub fn page_break() -> Self {
        Self {
            xml: r#"<w:p><w:r><w:br w:type="page"/></w:r></w:p>"#.to_string(),
        }
    }

    pub fn xml(&self) -> &str {
        &self.xml
    }

    /// Concatenated text of all runs.
    pub fn text(&self) -> String {
        self.runs().into_iter().map(|r| r.text).collect()
    }

    /// Runs in order, including runs nested in hyperlinks and similar wrappers.
    /// Runs inside text boxes belong to the text box paragraphs.
    pub fn runs(&self) -> Vec<Run> {
        fn collect(fragment: &str, runs: &mut Vec<Run>) {
            for node in children(fragment) {
                match node.name {
                    Some("w:r") => runs.push(Run::parse(node.xml)),
                    Some("w:pPr") | Some("w:rPr") | None => {}
                    n if is_object(n) => {}
                    Some(_) => collect(split_element(node.xml).1, runs),
                }
            }
        }
        let mut runs = Vec::new();
        collect(split_element(&self.xml).1, &mut runs);
        runs
    }

    /// The `w:pPr` element, if any.
    pub fn properties(&self) -> Option<&str> {
        let (_, inner, _) = split_element(&self.xml);
        children(inner)
            .into_iter()
            .find(|n| n.name == Some("w:pPr"))
            .map(|n| n.xml)
    }

    /// Replace all content with one run, keeping the paragraph properties
    /// and any anchored drawings or objects (placed after the new run).
    pub fn set_text(&mut self, text: &str, style: &RunStyle) {
        let (open, inner, _) = split_element(&self.xml);
        let open = match open.strip_suffix("/>") {
            Some(start) => format!("{}>", start.trim_end()),
            None => open.to_string(),
        };
        let mut properties = String::new();
        let mut objects = String::new();
        for node in children(inner) {
            match node.name {
                Some("w:pPr") => properties.push_str(node.xml),
                Some("w:r") if contains_object(node.xml) => objects.push_str(&object_run(node.xml)),
                n if is_object(n) => objects.push_str(node.xml),
                _ => {}
            }
        }
        self.xml = format!(
            "{}{}{}{}</w:p>",
            open,
            properties,
            style.run_xml(text),
            objects
        );
    }

    /// Blocks of each text box anchored in this paragraph. Only the primary
    /// rendering is read; the VML fallback copy is skipped.
    pub fn text_boxes(&self) -> Vec<Vec<Block>> {
        let mut found = Vec::new();
        find_elements(
            split_element(&self.xml).1,
            "w:txbxContent",
            "mc:Fallback",
            &mut found,
        );
        found
            .into_iter()
            .map(|xml| parse_blocks(split_element(xml).1))
            .collect()
    }

    /// Edit the blocks of every text box, the VML fallback copy included, so
    /// both renderings of a drawing stay in step.
    pub fn edit_text_boxes(&mut self, mut f: impl FnMut(&mut [Block])) {
        if !self.xml.contains("<w:txbxContent") {
            return;
        }
        let (open, inner, close) = split_element(&self.xml);
        let inner = replace_elements(inner, "w:txbxContent", &mut |xml: &str| -> String {
            let (box_open, box_inner, box_close) = split_element(xml);
            let mut blocks = parse_blocks(box_inner);
            f(blocks.as_mut_slice());
            let mut out = box_open.to_string();
            for block in &blocks {
                out.push_str(&block.to_xml());
            }
            out.push_str(box_close);
            out
        });
        self.xml = format!("{}{}{}", open, inner, close);
    }
}

// ─── Tables ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    open: String,
    blocks: Vec<Block>,
    close: String,
}

impl Cell {
    fn parse(xml: &str) -> Self {
        let (open, inner, close) = split_element(xml);
        Self {
            open: open.to_string(),
            blocks: parse_blocks(inner),
            close: close.to_string(),
        }
    }

    pub fn blocks_mut(&mut self) -> &mut [Block] {
        &mut self.blocks
    }

    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.blocks.iter().filter_map(Block::as_paragraph)
    }

    pub fn text(&self) -> String {
        self.paragraphs()
            .map(Paragraph::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn to_xml(&self) -> String {
        let mut out = self.open.clone();
        for block in &self.blocks {
            out.push_str(&block.to_xml());
        }
        out.push_str(&self.close);
        out
    }
}

#[derive(Debug, Clone, PartialEq)]
enum RowPart {
    Cell(Cell),
    Raw(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    open: String,
    parts: Vec<RowPart>,
    close: String,
}

impl Row {
    fn parse(xml: &str) -> Self {
        let (open, inner, close) = split_element(xml);
        let parts = children(inner)
            .into_iter()
            .map(|n| match n.name {
                Some("w:tc") => RowPart::Cell(Cell::parse(n.xml)),
                _ => RowPart::Raw(n.xml.to_string()),
            })
            .collect();
        Self {
            open: open.to_string(),
            parts,
            close: close.to_string(),
        }
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.parts.iter().filter_map(|p| match p {
            RowPart::Cell(c) => Some(c),
            RowPart::Raw(_) => None,
        })
    }

    pub fn cells_mut(&mut self) -> impl Iterator<Item = &mut Cell> {
        self.parts.iter_mut().filter_map(|p| match p {
            RowPart::Cell(c) => Some(c),
            RowPart::Raw(_) => None,
        })
    }

    fn to_xml(&self) -> String {
        let mut out = self.open.clone();
        for part in &self.parts {
            match part {
                RowPart::Cell(c) => out.push_str(&c.to_xml()),
                RowPart::Raw(s) => out.push_str(s),
            }
        }
        out.push_str(&self.close);
        out
    }
}

#[derive(Debug, Clone, PartialEq)]
enum TablePart {
    Row(Row),
    Raw(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    open: String,
    parts: Vec<TablePart>,
    close: String,
}

impl Table {
    pub fn from_xml(xml: &str) -> Self {
        let (open, inner, close) = split_element(xml);
        let parts = children(inner)
            .into_iter()
            .map(|n| match n.name {
                Some("w:tr") => TablePart::Row(Row::parse(n.xml)),
                _ => TablePart::Raw(n.xml.to_string()),
            })
            .collect();
        Self {
            open: open.to_string(),
            parts,
            close: close.to_string(),
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.parts.iter().filter_map(|p| match p {
            TablePart::Row(r) => Some(r),
            TablePart::Raw(_) => None,
        })
    }

    pub fn rows_mut(&mut self) -> impl Iterator<Item = &mut Row> {
        self.parts.iter_mut().filter_map(|p| match p {
            TablePart::Row(r) => Some(r),
            TablePart::Raw(_) => None,
        })
    }

    /// Table style id from `w:tblStyle`, if set.
    pub fn style(&self) -> Option<String> {
        lazy_static! {
            static ref STYLE_RE: Regex = Regex::new(r#"<w:tblStyle\s+w:val="([^"]*)""#).unwrap();
        }
        self.parts.iter().find_map(|p| match p {
            TablePart::Raw(s) => STYLE_RE.captures(s).map(|c| xml_unescape(&c[1])),
            TablePart::Row(_) => None,
        })
    }

    pub fn to_xml(&self) -> String {
        let mut out = self.open.clone();
        for part in &self.parts {
            match part {
                TablePart::Row(r) => out.push_str(&r.to_xml()),
                TablePart::Raw(s) => out.push_str(s),
            }
        }
        out.push_str(&self.close);
        out
    }
}

// ─── Blocks and document ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
    /// Anything else (section properties, content controls, whitespace)
    Other(String),
}

impl Block {
    pub fn as_paragraph(&self) -> Option<&Paragraph> {
        match self {
            Block::Paragraph(p) => Some(p),
            _ => None,
        }
    }

    pub fn to_xml(&self) -> String {
        match self {
            Block::Paragraph(p) => p.xml.clone(),
            Block::Table(t) => t.to_xml(),
            Block::Other(s) => s.clone(),
        }
    }
}

fn parse_blocks(inner: &str) -> Vec<Block> {
    children(inner)
        .into_iter()
        .map(|n| match n.name {
            Some("w:p") => Block::Paragraph(Paragraph::from_xml(n.xml)),
            Some("w:tbl") => Block::Table(Table::from_xml(n.xml)),
            _ => Block::Other(n.xml.to_string()),
        })
        .collect()
}

fn collect_text(blocks: &[Block], lines: &mut Vec<String>) {
    for block in blocks {
        match block {
            Block::Paragraph(p) => {
                lines.push(p.text());
                for text_box in p.text_boxes() {
                    collect_text(&text_box, lines);
                }
            }
            Block::Table(t) => {
                for row in t.rows() {
                    for cell in row.cells() {
                        collect_text(&cell.blocks, lines);
                    }
                }
            }
            Block::Other(_) => {}
        }
    }
}

/// A parsed `word/document.xml`.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    head: String,
    blocks: Vec<Block>,
    tail: String,
}

impl Document {
    pub fn parse(xml: &str) -> Result<Self> {
        let open = BODY_OPEN_RE
            .find(xml)
            .ok_or_else(|| LetterError::InvalidTemplate {
                reason: "document.xml has no <w:body>".to_string(),
            })?;
        let close = xml
            .rfind("</w:body>")
            .filter(|&i| i >= open.end())
            .ok_or_else(|| LetterError::InvalidTemplate {
                reason: "document.xml has no </w:body>".to_string(),
            })?;
        Ok(Self {
            head: xml[..open.end()].to_string(),
            blocks: parse_blocks(&xml[open.end()..close]),
            tail: xml[close..].to_string(),
        })
    }

    pub fn to_xml(&self) -> String {
        let mut out = self.head.clone();
        for block in &self.blocks {
            out.push_str(&block.to_xml());
        }
        out.push_str(&self.tail);
        out
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn blocks_mut(&mut self) -> &mut [Block] {
        &mut self.blocks
    }

    /// Body paragraphs (not those inside tables).
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.blocks.iter().filter_map(Block::as_paragraph)
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Table(t) => Some(t),
            _ => None,
        })
    }

    pub fn paragraph_count(&self) -> usize {
        self.paragraphs().count()
    }

    pub fn table_count(&self) -> usize {
        self.tables().count()
    }

    /// Append a block at the end of the body, before the section properties.
    pub fn push_block(&mut self, block: Block) {
        let at = self
            .blocks
            .iter()
            .rposition(|b| matches!(b, Block::Other(s) if s.trim_start().starts_with("<w:sectPr")))
            .unwrap_or(self.blocks.len());
        self.blocks.insert(at, block);
    }

    /// All paragraph text in document order, one line per paragraph.
    pub fn plain_text(&self) -> String {
        let mut lines = Vec::new();
        collect_text(&self.blocks, &mut lines);
        lines.join("\n")
    }
}

#[cfg(test)]
pub(crate) fn wrap_body(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}<w:sectPr><w:pgSz w:w="12240" w:h="15840"/></w:sectPr></w:body></w:document>"#,
        body
    )
}

/// A paragraph anchoring a text box, stored as a drawing with a VML fallback.
#[cfg(test)]
pub(crate) const TEXT_BOX_ANCHOR: &str = r#"<w:p><w:r><w:t xml:space="preserve">Anchor </w:t></w:r><w:r><w:rPr><w:noProof/></w:rPr><mc:AlternateContent><mc:Choice Requires="wps"><w:drawing><wp:anchor><a:graphic><a:graphicData><wps:wsp><wps:txbx><w:txbxContent><w:p><w:r><w:t>[Comuna]</w:t></w:r></w:p></w:txbxContent></wps:txbx></wps:wsp></a:graphicData></a:graphic></wp:anchor></w:drawing></mc:Choice><mc:Fallback><w:pict><v:shape><v:textbox><w:txbxContent><w:p><w:r><w:t>[Comuna]</w:t></w:r></w:p></w:txbxContent></v:textbox></v:shape></w:pict></mc:Fallback></mc:AlternateContent></w:r></w:p>"#;
