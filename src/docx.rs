//! WordprocessingML package writer.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Seek, Write};
use std::path::Path;

use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::error::{ReportError, Result};
use crate::model::{
    Alignment, Block, Document, ListKind, Paragraph, ParagraphStyle, Run, StyleSheet, Table,
};

const NS_W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_CT: &str = "http://schemas.openxmlformats.org/package/2006/content-types";
const NS_RELS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

/// Letter page minus 1" margins, in twentieths of a point.
const TEXT_WIDTH_TWIPS: usize = 9360;

/// Heading size over the body size, for levels 1..=3.
const HEADING_EXTRA_PT: [u32; 3] = [4, 2, 1];

const BULLET_NUM_ID: u32 = 1;

/// numId per numbered-list instance. Bullets share [`BULLET_NUM_ID`].
type NumberingMap = BTreeMap<u32, u32>;

/// XML 1.0 `Char` production; anything else makes the part unreadable.
fn is_xml_char(ch: char) -> bool {
    matches!(ch, '\t' | '\n' | '\r') || (ch >= ' ' && !matches!(ch, '\u{FFFE}' | '\u{FFFF}'))
}

/// Escapes markup characters and drops characters XML cannot carry.
fn xml_escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars().filter(|c| is_xml_char(*c)) {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

fn numbering_map(doc: &Document) -> NumberingMap {
    doc.numbered_lists()
        .into_iter()
        .zip(BULLET_NUM_ID + 1..)
        .collect()
}

fn run_xml(run: &Run) -> String {
    if run.text.is_empty() {
        return String::new();
    }
    let mut out = String::new();
    out.push_str("<w:r>");
    if run.bold || run.font.is_some() {
        out.push_str("<w:rPr>");
        if let Some(font) = &run.font {
            let family = xml_escape_text(&font.family);
            out.push_str(&format!(
                "<w:rFonts w:ascii=\"{family}\" w:hAnsi=\"{family}\" w:cs=\"{family}\"/>"
            ));
        }
        if run.bold {
            out.push_str("<w:b/>");
        }
        if let Some(font) = &run.font {
            let half_points = font.size_pt * 2;
            out.push_str(&format!(
                "<w:sz w:val=\"{half_points}\"/><w:szCs w:val=\"{half_points}\"/>"
            ));
        }
        out.push_str("</w:rPr>");
    }

    // Line breaks and tabs become their own elements, as Word expects.
    let mut first_line = true;
    for line in run.text.split('\n') {
        if !first_line {
            out.push_str("<w:br/>");
        }
        first_line = false;
        let mut first_piece = true;
        for piece in line.split('\t') {
            if !first_piece {
                out.push_str("<w:tab/>");
            }
            first_piece = false;
            if !piece.is_empty() {
                out.push_str("<w:t xml:space=\"preserve\">");
                out.push_str(&xml_escape_text(piece));
                out.push_str("</w:t>");
            }
        }
    }
    out.push_str("</w:r>");
    out
}

fn paragraph_xml(p: &Paragraph, numbering: &NumberingMap) -> String {
    let mut props = String::new();
    match p.style {
        ParagraphStyle::Normal => {}
        ParagraphStyle::Heading(level) => {
            props.push_str(&format!("<w:pStyle w:val=\"Heading{level}\"/>"));
        }
        ParagraphStyle::List(list) => {
            let (style, num_id) = match list.kind {
                ListKind::Bullet => ("ListBullet", BULLET_NUM_ID),
                ListKind::Number => (
                    "ListNumber",
                    numbering.get(&list.instance).copied().unwrap_or(BULLET_NUM_ID + 1),
                ),
            };
            props.push_str(&format!("<w:pStyle w:val=\"{style}\"/>"));
            props.push_str("<w:numPr><w:ilvl w:val=\"0\"/>");
            props.push_str(&format!("<w:numId w:val=\"{num_id}\"/></w:numPr>"));
        }
    }
    match p.align {
        None => {}
        Some(Alignment::Center) => props.push_str("<w:jc w:val=\"center\"/>"),
        Some(Alignment::Justify) => props.push_str("<w:jc w:val=\"both\"/>"),
    }

    let mut out = String::new();
    out.push_str("<w:p>");
    if !props.is_empty() {
        out.push_str("<w:pPr>");
        out.push_str(&props);
        out.push_str("</w:pPr>");
    }
    for run in &p.runs {
        out.push_str(&run_xml(run));
    }
    out.push_str("</w:p>");
    out
}

fn table_xml(t: &Table) -> String {
    let col_width = TEXT_WIDTH_TWIPS / t.columns.max(1);

    let mut out = String::new();
    out.push_str("<w:tbl>");
    out.push_str("<w:tblPr>");
    out.push_str("<w:tblW w:w=\"0\" w:type=\"auto\"/>");
    out.push_str(
        r#"<w:tblBorders>
<w:top w:val="single" w:sz="4" w:space="0" w:color="4F81BD"/>
<w:left w:val="single" w:sz="4" w:space="0" w:color="4F81BD"/>
<w:bottom w:val="single" w:sz="4" w:space="0" w:color="4F81BD"/>
<w:right w:val="single" w:sz="4" w:space="0" w:color="4F81BD"/>
<w:insideH w:val="single" w:sz="4" w:space="0" w:color="4F81BD"/>
<w:insideV w:val="single" w:sz="4" w:space="0" w:color="4F81BD"/>
</w:tblBorders>"#,
    );
    out.push_str("</w:tblPr>");

    out.push_str("<w:tblGrid>");
    for _ in 0..t.columns {
        out.push_str(&format!("<w:gridCol w:w=\"{col_width}\"/>"));
    }
    out.push_str("</w:tblGrid>");

    for row in &t.rows {
        out.push_str("<w:tr>");
        for cell in row {
            out.push_str("<w:tc>");
            out.push_str(&format!(
                "<w:tcPr><w:tcW w:w=\"{col_width}\" w:type=\"dxa\"/></w:tcPr>"
            ));
            out.push_str("<w:p>");
            out.push_str(&run_xml(&Run {
                text: cell.text.clone(),
                bold: cell.header,
                font: None,
            }));
            out.push_str("</w:p>");
            out.push_str("</w:tc>");
        }
        out.push_str("</w:tr>");
    }

    out.push_str("</w:tbl>");
    out
}

fn document_xml(doc: &Document, numbering: &NumberingMap) -> String {
    let mut body = String::new();
    for b in &doc.blocks {
        match b {
            Block::Paragraph(p) => body.push_str(&paragraph_xml(p, numbering)),
            Block::Table(t) => body.push_str(&table_xml(t)),
            Block::PageBreak => body.push_str("<w:p><w:r><w:br w:type=\"page\"/></w:r></w:p>"),
        }
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="{NS_W}" xmlns:r="{NS_R}">
  <w:body>
    {body}
    <w:sectPr>
      <w:pgSz w:w="12240" w:h="15840"/>
      <w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="708" w:footer="708" w:gutter="0"/>
      <w:cols w:space="708"/>
      <w:docGrid w:linePitch="360"/>
    </w:sectPr>
  </w:body>
</w:document>"#
    )
}

#[derive(Debug, Clone, Copy)]
struct Parts {
    numbering: bool,
    core: bool,
}

fn content_types_xml(parts: Parts) -> String {
    let mut out = String::new();
    out.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    out.push('\n');
    out.push_str(&format!(r#"<Types xmlns="{NS_CT}">"#));
    out.push('\n');
    out.push_str(
        r#"  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
    );
    out.push('\n');
    out.push_str(r#"  <Default Extension="xml" ContentType="application/xml"/>"#);
    out.push('\n');
    out.push_str(r#"  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#);
    out.push('\n');
    out.push_str(r#"  <Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>"#);
    out.push('\n');
    if parts.numbering {
        out.push_str(r#"  <Override PartName="/word/numbering.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.numbering+xml"/>"#);
        out.push('\n');
    }
    if parts.core {
        out.push_str(r#"  <Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>"#);
        out.push('\n');
    }
    out.push_str("</Types>");
    out
}

fn rels_xml(parts: Parts) -> String {
    let mut out = String::new();
    out.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    out.push('\n');
    out.push_str(&format!(r#"<Relationships xmlns="{NS_RELS}">"#));
    out.push('\n');
    out.push_str(r#"  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>"#);
    out.push('\n');
    if parts.core {
        out.push_str(r#"  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>"#);
        out.push('\n');
    }
    out.push_str("</Relationships>");
    out
}

fn document_rels_xml(parts: Parts) -> String {
    let mut out = String::new();
    out.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    out.push('\n');
    out.push_str(&format!(r#"<Relationships xmlns="{NS_RELS}">"#));
    out.push('\n');
    out.push_str(r#"  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#);
    out.push('\n');
    if parts.numbering {
        out.push_str(r#"  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/numbering" Target="numbering.xml"/>"#);
        out.push('\n');
    }
    out.push_str("</Relationships>");
    out
}

fn styles_xml(styles: &StyleSheet) -> String {
    let body_font = xml_escape_text(&styles.body_font);
    let heading_font = xml_escape_text(&styles.heading_font);
    let body_sz = styles.body_size_pt * 2;

    let mut out = String::new();
    out.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    out.push('\n');
    out.push_str(&format!(r#"<w:styles xmlns:w="{NS_W}">"#));
    out.push_str(&format!(
        r#"
  <w:docDefaults>
    <w:rPrDefault>
      <w:rPr>
        <w:rFonts w:ascii="{body_font}" w:hAnsi="{body_font}" w:cs="{body_font}"/>
        <w:sz w:val="{body_sz}"/>
        <w:szCs w:val="{body_sz}"/>
      </w:rPr>
    </w:rPrDefault>
  </w:docDefaults>
  <w:style w:type="paragraph" w:default="1" w:styleId="Normal">
    <w:name w:val="Normal"/>
    <w:qFormat/>
    <w:pPr>
      <w:spacing w:after="120"/>
    </w:pPr>
    <w:rPr>
      <w:rFonts w:ascii="{body_font}" w:hAnsi="{body_font}" w:cs="{body_font}"/>
      <w:sz w:val="{body_sz}"/>
      <w:szCs w:val="{body_sz}"/>
    </w:rPr>
  </w:style>"#
    ));

    for (i, extra) in HEADING_EXTRA_PT.iter().enumerate() {
        let level = i + 1;
        let sz = (styles.body_size_pt + extra) * 2;
        let before = 360 - 60 * i;
        out.push_str(&format!(
            r#"
  <w:style w:type="paragraph" w:styleId="Heading{level}">
    <w:name w:val="heading {level}"/>
    <w:basedOn w:val="Normal"/>
    <w:next w:val="Normal"/>
    <w:uiPriority w:val="9"/>
    <w:qFormat/>
    <w:pPr>
      <w:keepNext/>
      <w:spacing w:before="{before}" w:after="120"/>
      <w:outlineLvl w:val="{i}"/>
    </w:pPr>
    <w:rPr>
      <w:rFonts w:ascii="{heading_font}" w:hAnsi="{heading_font}" w:cs="{heading_font}"/>
      <w:b/>
      <w:sz w:val="{sz}"/>
      <w:szCs w:val="{sz}"/>
    </w:rPr>
  </w:style>"#
        ));
    }

    for (id, name) in [("ListBullet", "List Bullet"), ("ListNumber", "List Number")] {
        out.push_str(&format!(
            r#"
  <w:style w:type="paragraph" w:styleId="{id}">
    <w:name w:val="{name}"/>
    <w:basedOn w:val="Normal"/>
    <w:uiPriority w:val="99"/>
    <w:pPr>
      <w:spacing w:after="60"/>
      <w:ind w:left="720" w:hanging="360"/>
    </w:pPr>
  </w:style>"#
        ));
    }

    out.push_str("\n</w:styles>");
    out
}

fn numbering_xml(numbering: &NumberingMap) -> String {
    let mut out = String::new();
    out.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    out.push('\n');
    out.push_str(&format!(r#"<w:numbering xmlns:w="{NS_W}">"#));
    out.push_str(
        r#"
  <w:abstractNum w:abstractNumId="1">
    <w:multiLevelType w:val="singleLevel"/>
    <w:lvl w:ilvl="0"><w:start w:val="1"/><w:numFmt w:val="bullet"/><w:lvlText w:val="•"/><w:lvlJc w:val="left"/><w:pPr><w:ind w:left="720" w:hanging="360"/></w:pPr></w:lvl>
  </w:abstractNum>
  <w:abstractNum w:abstractNumId="2">
    <w:multiLevelType w:val="singleLevel"/>
    <w:lvl w:ilvl="0"><w:start w:val="1"/><w:numFmt w:val="decimal"/><w:lvlText w:val="%1."/><w:lvlJc w:val="left"/><w:pPr><w:ind w:left="720" w:hanging="360"/></w:pPr></w:lvl>
  </w:abstractNum>"#,
    );
    out.push_str(&format!(
        "\n  <w:num w:numId=\"{BULLET_NUM_ID}\"><w:abstractNumId w:val=\"1\"/></w:num>"
    ));
    for num_id in numbering.values() {
        out.push_str(&format!(
            "\n  <w:num w:numId=\"{num_id}\"><w:abstractNumId w:val=\"2\"/><w:lvlOverride w:ilvl=\"0\"><w:startOverride w:val=\"1\"/></w:lvlOverride></w:num>"
        ));
    }
    out.push_str("\n</w:numbering>");
    out
}

fn core_xml(title: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/">
  <dc:title>{}</dc:title>
</cp:coreProperties>"#,
        xml_escape_text(title)
    )
}

/// Streams the package parts of `doc` into `writer`.
///
/// Entry timestamps are pinned to the zip epoch so identical documents give
/// identical bytes.
pub fn write_package<W: Write + Seek>(writer: W, doc: &Document) -> std::result::Result<W, ZipError> {
    let numbering = numbering_map(doc);
    let parts = Parts {
        numbering: doc.needs_numbering(),
        core: doc.title.is_some(),
    };

    let mut zip = ZipWriter::new(writer);
    let opts = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default());

    zip.start_file("[Content_Types].xml", opts)?;
    zip.write_all(content_types_xml(parts).as_bytes())?;

    zip.start_file("_rels/.rels", opts)?;
    zip.write_all(rels_xml(parts).as_bytes())?;

    zip.start_file("word/document.xml", opts)?;
    zip.write_all(document_xml(doc, &numbering).as_bytes())?;

    zip.start_file("word/styles.xml", opts)?;
    zip.write_all(styles_xml(&doc.styles).as_bytes())?;

    if parts.numbering {
        zip.start_file("word/numbering.xml", opts)?;
        zip.write_all(numbering_xml(&numbering).as_bytes())?;
    }

    zip.start_file("word/_rels/document.xml.rels", opts)?;
    zip.write_all(document_rels_xml(parts).as_bytes())?;

    if let Some(title) = &doc.title {
        zip.start_file("docProps/core.xml", opts)?;
        zip.write_all(core_xml(title).as_bytes())?;
    }

    zip.finish()
}

pub fn save(doc: &Document, path: &Path) -> Result<()> {
    let f = File::create(path).map_err(|e| ReportError::io(path, e))?;
    write_package(f, doc)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ListRef, RunFont, TableCell};
    use std::io::Cursor;

    fn to_bytes(doc: &Document) -> Vec<u8> {
        write_package(Cursor::new(Vec::new()), doc).unwrap().into_inner()
    }

    fn list_item(kind: ListKind, instance: u32, text: &str) -> Block {
        Block::Paragraph(Paragraph {
            style: ParagraphStyle::List(ListRef { kind, instance }),
            align: None,
            runs: vec![Run::plain(text)],
        })
    }

    #[test]
    fn escapes_markup_in_text() {
        let xml = run_xml(&Run::plain("a < b & \"c\""));
        assert!(xml.contains("a &lt; b &amp; &quot;c&quot;"));
    }

    #[test]
    fn control_characters_are_dropped() {
        let xml = run_xml(&Run::plain("ab\u{1}cd\u{b}\u{c}e\u{1f}"));
        assert!(xml.contains(">abcde</w:t>"));
        assert!(!xml.chars().any(|c| !is_xml_char(c)));
        assert_eq!(xml_escape_text("\u{FFFF}ok\u{8}"), "ok");
    }

    #[test]
    fn code_run_keeps_breaks_and_tabs() {
        let run = Run {
            text: "line1\n\tline2".into(),
            bold: false,
            font: Some(RunFont {
                family: "Courier New".into(),
                size_pt: 10,
            }),
        };
        let xml = run_xml(&run);
        assert!(xml.contains(r#"<w:rFonts w:ascii="Courier New""#));
        assert!(xml.contains(r#"<w:sz w:val="20"/>"#));
        assert!(xml.contains("line1</w:t><w:br/><w:tab/><w:t xml:space=\"preserve\">line2"));
    }

    #[test]
    fn heading_and_alignment_properties() {
        let p = Paragraph {
            style: ParagraphStyle::Heading(1),
            align: Some(Alignment::Center),
            runs: vec![Run::plain("Title")],
        };
        let xml = paragraph_xml(&p, &NumberingMap::new());
        assert!(xml.starts_with(r#"<w:p><w:pPr><w:pStyle w:val="Heading1"/><w:jc w:val="center"/></w:pPr>"#));
    }

    #[test]
    fn blank_paragraph_has_no_runs() {
        assert_eq!(paragraph_xml(&Paragraph::blank(), &NumberingMap::new()), "<w:p></w:p>");
    }

    #[test]
    fn numbered_lists_get_their_own_num_ids() {
        let mut doc = Document::new(StyleSheet::default());
        doc.extend([
            list_item(ListKind::Number, 4, "a"),
            list_item(ListKind::Bullet, 5, "b"),
            list_item(ListKind::Number, 6, "c"),
        ]);
        let map = numbering_map(&doc);
        assert_eq!(map.get(&4), Some(&2));
        assert_eq!(map.get(&6), Some(&3));

        let xml = document_xml(&doc, &map);
        assert!(xml.contains(r#"<w:pStyle w:val="ListBullet"/><w:numPr><w:ilvl w:val="0"/><w:numId w:val="1"/>"#));
        assert!(xml.contains(r#"<w:numId w:val="3"/>"#));

        let numbering = numbering_xml(&map);
        assert_eq!(numbering.matches("<w:startOverride").count(), 2);
    }

    #[test]
    fn table_grid_matches_column_count() {
        let t = Table {
            columns: 3,
            rows: vec![vec![
                TableCell {
                    text: "H".into(),
                    header: true,
                },
                TableCell::blank(),
                TableCell::blank(),
            ]],
        };
        let xml = table_xml(&t);
        assert_eq!(xml.matches("<w:gridCol").count(), 3);
        assert_eq!(xml.matches("<w:tc>").count(), 3);
        assert!(xml.contains("<w:rPr><w:b/></w:rPr><w:t xml:space=\"preserve\">H</w:t>"));
        assert_eq!(xml.matches("<w:p></w:p>").count(), 2);
    }

    #[test]
    fn styles_carry_configured_fonts() {
        let xml = styles_xml(&StyleSheet::default());
        assert!(xml.contains(r#"w:ascii="Times New Roman""#));
        assert!(xml.contains(r#"<w:sz w:val="24"/>"#));
        for level in 1..=3 {
            assert!(xml.contains(&format!(r#"w:styleId="Heading{level}""#)));
        }
        assert_eq!(xml.matches("<w:b/>").count(), 3);
    }

    #[test]
    fn optional_parts_follow_content() {
        let plain = Parts {
            numbering: false,
            core: false,
        };
        assert!(!content_types_xml(plain).contains("numbering"));
        assert!(!rels_xml(plain).contains("core-properties"));

        let full = Parts {
            numbering: true,
            core: true,
        };
        assert!(content_types_xml(full).contains("/word/numbering.xml"));
        assert!(document_rels_xml(full).contains("numbering.xml"));
        assert!(rels_xml(full).contains("docProps/core.xml"));
    }

    #[test]
    fn identical_documents_give_identical_bytes() {
        let mut doc = Document::new(StyleSheet::default());
        doc.title = Some("Report".into());
        doc.extend([list_item(ListKind::Number, 1, "x"), Block::PageBreak]);
        assert_eq!(to_bytes(&doc), to_bytes(&doc));
    }
}
