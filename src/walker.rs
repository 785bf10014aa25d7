//! Document walker: applies the token table to every paragraph.

use crate::document::{Block, Document, Paragraph, RunStyle, Table};
use crate::emphasis::EmphasisRules;
use crate::tokens::{substitute, TokenTable};

/// Counters from one walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkStats {
    pub visited: usize,
    pub rewritten: usize,
    pub bold: usize,
}

pub struct Walker<'a> {
    table: &'a TokenTable,
    emphasis: &'a EmphasisRules,
    style: &'a RunStyle,
    stats: WalkStats,
}

impl<'a> Walker<'a> {
    pub fn new(table: &'a TokenTable, emphasis: &'a EmphasisRules, style: &'a RunStyle) -> Self {
        Self {
            table,
            emphasis,
            style,
            stats: WalkStats::default(),
        }
    }

    /// Rewrite body paragraphs top to bottom, then every table cell in
    /// document order (rows top to bottom, cells left to right).
    pub fn walk(mut self, doc: &mut Document) -> WalkStats {
        for block in doc.blocks_mut() {
            if let Block::Paragraph(p) = block {
                self.visit(p);
            }
        }
        for block in doc.blocks_mut() {
            if let Block::Table(t) = block {
                self.visit_table(t);
            }
        }
        self.stats
    }

    fn visit_blocks(&mut self, blocks: &mut [Block]) {
        for block in blocks {
            match block {
                Block::Paragraph(p) => self.visit(p),
                Block::Table(t) => self.visit_table(t),
                Block::Other(_) => {}
            }
        }
    }

    fn visit_table(&mut self, table: &mut Table) {
        for row in table.rows_mut() {
            for cell in row.cells_mut() {
                self.visit_blocks(cell.blocks_mut());
            }
        }
    }

    /// Text boxes anchored in the paragraph are walked first, as paragraphs
    /// of their own.
    fn visit(&mut self, paragraph: &mut Paragraph) {
        self.stats.visited += 1;
        paragraph.edit_text_boxes(|blocks| self.visit_blocks(blocks));
        let old_text = paragraph.text();
        let new_text = substitute(&old_text, self.table);
        if new_text == old_text {
            return;
        }
        let bold = self.emphasis.is_bold(&new_text);
        log::debug!("Rewrote paragraph (bold={}): {:?}", bold, new_text);
        paragraph.set_text(&new_text, &self.style.with_bold(bold));
        self.stats.rewritten += 1;
        if bold {
            self.stats.bold += 1;
        }
    }
}

/// Apply `table` to every paragraph of `doc`.
pub fn rewrite_document(
    doc: &mut Document,
    table: &TokenTable,
    emphasis: &EmphasisRules,
    style: &RunStyle,
) -> WalkStats {
    Walker::new(table, emphasis, style).walk(doc)
}
