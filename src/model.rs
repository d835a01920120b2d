//! In-memory word-processing document: an ordered list of blocks plus the
//! style registry they are rendered against.

use crate::config::FontConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Center,
    Justify,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Bullet,
    Number,
}

/// A list paragraph; `instance` identifies the source list so numbered lists
/// can restart at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListRef {
    pub kind: ListKind,
    pub instance: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParagraphStyle {
    Normal,
    Heading(u8), // 1..=3
    List(ListRef),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunFont {
    pub family: String,
    pub size_pt: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub text: String,
    pub bold: bool,
    pub font: Option<RunFont>,
}

impl Run {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: false,
            font: None,
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: true,
            font: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paragraph {
    pub style: ParagraphStyle,
    pub align: Option<Alignment>,
    pub runs: Vec<Run>,
}

impl Paragraph {
    pub fn blank() -> Self {
        Self {
            style: ParagraphStyle::Normal,
            align: None,
            runs: Vec::new(),
        }
    }

    /// Concatenated text of all runs.
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCell {
    pub text: String,
    pub header: bool,
}

impl TableCell {
    pub fn blank() -> Self {
        Self {
            text: String::new(),
            header: false,
        }
    }
}

/// Rectangular table: every row holds exactly `columns` cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub columns: usize,
    pub rows: Vec<Vec<TableCell>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
    PageBreak,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleSheet {
    pub body_font: String,
    pub body_size_pt: u32,
    pub heading_font: String,
}

impl StyleSheet {
    pub fn from_fonts(fonts: &FontConfig) -> Self {
        Self {
            body_font: fonts.body.clone(),
            body_size_pt: fonts.body_size,
            heading_font: fonts.body.clone(),
        }
    }
}

impl Default for StyleSheet {
    fn default() -> Self {
        Self::from_fonts(&FontConfig::default())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub styles: StyleSheet,
    pub title: Option<String>,
    pub blocks: Vec<Block>,
}

impl Document {
    pub fn new(styles: StyleSheet) -> Self {
        Self {
            styles,
            title: None,
            blocks: Vec::new(),
        }
    }

    pub fn extend(&mut self, blocks: impl IntoIterator<Item = Block>) {
        self.blocks.extend(blocks);
    }

    pub fn needs_numbering(&self) -> bool {
        self.blocks.iter().any(|b| {
            matches!(
                b,
                Block::Paragraph(Paragraph {
                    style: ParagraphStyle::List(_),
                    ..
                })
            )
        })
    }

    /// Distinct numbered-list instances, in first-use order.
    pub fn numbered_lists(&self) -> Vec<u32> {
        let mut out: Vec<u32> = Vec::new();
        for b in &self.blocks {
            if let Block::Paragraph(Paragraph {
                style: ParagraphStyle::List(ListRef {
                    kind: ListKind::Number,
                    instance,
                }),
                ..
            }) = b
            {
                if !out.contains(instance) {
                    out.push(*instance);
                }
            }
        }
        out
    }
}
