//! HTML body -> document blocks.
//!
//! Traversal never touches the output document: it returns the blocks for one
//! body and the builder appends them.

use markup5ever_rcdom::Handle;
use tracing::debug;

use crate::config::ReportConfig;
use crate::markup::{
    children_named, classify, contains_any_tag, descendants_named, element_children,
    has_class, inline_text, item_text, tag_lower, text_content, NodeKind,
};
use crate::model::{
    Alignment, Block, ListKind, ListRef, Paragraph, ParagraphStyle, Run, RunFont, Table, TableCell,
};

const PAGE_BREAK_CLASS: &str = "page-break";
const BOLD_TAGS: [&str; 2] = ["strong", "b"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOptions {
    pub container_depth: usize,
    pub code_font: RunFont,
}

impl ConvertOptions {
    pub fn from_config(cfg: &ReportConfig) -> Self {
        Self {
            container_depth: cfg.container_depth,
            code_font: RunFont {
                family: cfg.fonts.code.clone(),
                size_pt: cfg.fonts.code_size,
            },
        }
    }
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self::from_config(&ReportConfig::default())
    }
}

/// Conversion state carried across files. The only state is the list counter,
/// which keeps list instances distinct over the whole report.
#[derive(Debug, Clone)]
pub struct Converter {
    opts: ConvertOptions,
    next_list: u32,
}

impl Converter {
    pub fn new(opts: ConvertOptions) -> Self {
        Self { opts, next_list: 1 }
    }

    /// Converts the direct children of `body`, in order.
    pub fn convert_body(&mut self, body: &Handle) -> Vec<Block> {
        let mut blocks = Vec::new();
        for child in element_children(body) {
            self.convert_node(&child, 0, &mut blocks);
        }
        blocks
    }

    /// `depth` counts the containers entered above `node`.
    pub fn convert_node(&mut self, node: &Handle, depth: usize, out: &mut Vec<Block>) {
        match classify(node) {
            NodeKind::Heading(level) => {
                let text = inline_text(node);
                if text.is_empty() {
                    return;
                }
                out.push(Block::Paragraph(Paragraph {
                    style: ParagraphStyle::Heading(level),
                    align: (level == 1).then_some(Alignment::Center),
                    runs: vec![Run::plain(text)],
                }));
            }
            NodeKind::Paragraph => {
                let text = inline_text(node);
                if text.chars().count() <= 1 {
                    return;
                }
                let run = if contains_any_tag(node, &BOLD_TAGS) {
                    Run::bold(text)
                } else {
                    Run::plain(text)
                };
                out.push(Block::Paragraph(Paragraph {
                    style: ParagraphStyle::Normal,
                    align: Some(Alignment::Justify),
                    runs: vec![run],
                }));
            }
            NodeKind::UnorderedList => self.convert_list(node, ListKind::Bullet, out),
            NodeKind::OrderedList => self.convert_list(node, ListKind::Number, out),
            NodeKind::Table => convert_table(node, out),
            NodeKind::Division => {
                if has_class(node, PAGE_BREAK_CLASS) {
                    out.push(Block::PageBreak);
                    return;
                }
                if depth >= self.opts.container_depth {
                    debug!(depth, "container below conversion depth, skipped");
                    return;
                }
                for child in element_children(node) {
                    self.convert_node(&child, depth + 1, out);
                }
            }
            NodeKind::Preformatted => {
                let raw = text_content(node);
                let text = raw.trim();
                if text.is_empty() {
                    return;
                }
                out.push(Block::Paragraph(Paragraph {
                    style: ParagraphStyle::Normal,
                    align: None,
                    runs: vec![Run {
                        text: text.to_string(),
                        bold: false,
                        font: Some(self.opts.code_font.clone()),
                    }],
                }));
            }
            NodeKind::Other => {
                debug!(tag = ?tag_lower(node), "unhandled element ignored");
            }
        }
    }

    fn convert_list(&mut self, node: &Handle, kind: ListKind, out: &mut Vec<Block>) {
        let list = ListRef {
            kind,
            instance: self.next_list,
        };
        self.next_list += 1;

        for li in children_named(node, &["li"]) {
            let text = item_text(&li);
            if text.is_empty() {
                continue;
            }
            out.push(Block::Paragraph(Paragraph {
                style: ParagraphStyle::List(list),
                align: None,
                runs: vec![Run::plain(text)],
            }));
        }
    }
}

fn convert_table(node: &Handle, out: &mut Vec<Block>) {
    let rows: Vec<Vec<Handle>> = descendants_named(node, "tr")
        .iter()
        .map(|tr| children_named(tr, &["th", "td"]))
        .collect();
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    if columns == 0 {
        debug!(rows = rows.len(), "table without cells skipped");
        return;
    }

    let rows = rows
        .iter()
        .map(|cells| {
            (0..columns)
                .map(|j| match cells.get(j) {
                    Some(cell) => TableCell {
                        text: inline_text(cell),
                        header: tag_lower(cell).as_deref() == Some("th"),
                    },
                    None => TableCell::blank(),
                })
                .collect()
        })
        .collect();

    out.push(Block::Table(Table { columns, rows }));
    out.push(Block::Paragraph(Paragraph::blank()));
}
