//! Annex tables: parsing pasted tab-separated data and appending it to a
//! letter as a formatted table on a new page.

use crate::document::{Block, Document, Paragraph, RunStyle, Table};
use crate::error::{LetterError, Result};
use csv::{ErrorKind, ReaderBuilder, Trim};

/// Usable page width in twips for the annex table grid.
const TABLE_WIDTH_TWIPS: usize = 9000;

/// A rectangular grid of named columns.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnexDataset {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl AnnexDataset {
    /// Build a dataset, rejecting rows whose width differs from the header.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        if columns.is_empty() {
            return Err(LetterError::MalformedAnnex("no columns".to_string()));
        }
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != columns.len()) {
            return Err(LetterError::MalformedAnnex(format!(
                "row {} has {} fields, expected {}",
                i + 1,
                row.len(),
                columns.len()
            )));
        }
        Ok(Self { columns, rows })
    }

    /// Parse text pasted from a spreadsheet (tab-separated, header first).
    ///
    /// Blank input means "no annex" and yields `None`. Ragged rows or a
    /// comma/semicolon separated paste are rejected as a whole.
    pub fn parse_tsv(text: &str) -> Result<Option<Self>> {
        let Some(header_line) = text.lines().find(|l| !l.trim().is_empty()) else {
            return Ok(None);
        };
        if !header_line.contains('\t') && (header_line.contains(',') || header_line.contains(';')) {
            return Err(LetterError::MalformedAnnex(
                "header has no TAB separators (looks comma or semicolon separated)".to_string(),
            ));
        }

        let mut reader = ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .trim(Trim::All)
            .from_reader(text.as_bytes());

        let columns: Vec<String> = reader
            .headers()
            .map_err(annex_error)?
            .iter()
            .map(str::to_string)
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(annex_error)?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        Self::new(columns, rows).map(Some)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// True when there are no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn annex_error(err: csv::Error) -> LetterError {
    let message = match err.kind() {
        ErrorKind::UnequalLengths {
            pos,
            expected_len,
            len,
        } => match pos {
            Some(p) => format!("line {} has {} fields, expected {}", p.line(), len, expected_len),
            None => format!("a row has {} fields, expected {}", len, expected_len),
        },
        _ => err.to_string(),
    };
    LetterError::MalformedAnnex(message)
}

/// Visual settings for the appended annex.
#[derive(Debug, Clone)]
pub struct AnnexStyle {
    pub heading: String,
    /// Table style id, e.g. "LightGrid"
    pub table_style: String,
    pub run: RunStyle,
}

fn cell_xml(text: &str, width: usize, style: &RunStyle) -> String {
    format!(
        r#"<w:tc><w:tcPr><w:tcW w:w="{}" w:type="dxa"/></w:tcPr>{}</w:tc>"#,
        width,
        Paragraph::new(text, style).xml()
    )
}

/// Build a (rows + 1) x columns table: bold header row, regular body rows.
pub fn annex_table(dataset: &AnnexDataset, style: &AnnexStyle) -> Table {
    let width = TABLE_WIDTH_TWIPS / dataset.columns.len().max(1);
    let header_style = style.run.with_bold(true);
    let body_style = style.run.with_bold(false);

    let border = r#"w:val="single" w:sz="4" w:space="0" w:color="auto""#;
    let mut xml = format!(
        r#"<w:tbl><w:tblPr><w:tblStyle w:val="{}"/><w:tblW w:w="0" w:type="auto"/><w:tblBorders><w:top {b}/><w:left {b}/><w:bottom {b}/><w:right {b}/><w:insideH {b}/><w:insideV {b}/></w:tblBorders><w:tblLook w:val="04A0" w:firstRow="1" w:lastRow="0" w:firstColumn="1" w:lastColumn="0" w:noHBand="0" w:noVBand="1"/></w:tblPr><w:tblGrid>"#,
        crate::document::xml_escape(&style.table_style),
        b = border
    );
    for _ in &dataset.columns {
        xml.push_str(&format!(r#"<w:gridCol w:w="{}"/>"#, width));
    }
    xml.push_str("</w:tblGrid>");

    xml.push_str("<w:tr><w:trPr><w:tblHeader/></w:trPr>");
    for column in &dataset.columns {
        xml.push_str(&cell_xml(column, width, &header_style));
    }
    xml.push_str("</w:tr>");

    for row in &dataset.rows {
        xml.push_str("<w:tr>");
        for value in row {
            xml.push_str(&cell_xml(value, width, &body_style));
        }
        xml.push_str("</w:tr>");
    }
    xml.push_str("</w:tbl>");

    Table::from_xml(&xml)
}

/// Append a page break, the annex heading and the data table.
///
/// Returns the number of data rows appended; an absent or empty dataset
/// leaves the document untouched.
pub fn append_annex(
    doc: &mut Document,
    dataset: Option<&AnnexDataset>,
    style: &AnnexStyle,
) -> usize {
    let Some(dataset) = dataset.filter(|d| !d.is_empty()) else {
        return 0;
    };
    let heading_run = RunStyle {
        size_half_points: style.run.size_half_points.saturating_add(8),
        ..style.run.with_bold(true)
    };
    doc.push_block(Block::Paragraph(Paragraph::page_break()));
    doc.push_block(Block::Paragraph(Paragraph::styled(
        "Heading1",
        &style.heading,
        &heading_run,
    )));
    doc.push_block(Block::Table(annex_table(dataset, style)));
    dataset.rows.len()
}
