//! End-to-end runs over temporary report directories.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use report2docx::{build_report, NoopObserver, ReportConfig, ReportError, SkipReason};
use tempfile::TempDir;

fn write(dir: &Path, name: &str, html: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, html).unwrap();
    path
}

fn config_for(dir: &TempDir, files: &[&str]) -> ReportConfig {
    ReportConfig {
        files: files.iter().map(PathBuf::from).collect(),
        input_dir: dir.path().to_path_buf(),
        output: dir.path().join("report.docx"),
        ..ReportConfig::default()
    }
}

fn read_part(docx: &Path, part: &str) -> Option<String> {
    let f = fs::File::open(docx).unwrap();
    let mut archive = zip::ZipArchive::new(f).unwrap();
    let mut entry = archive.by_name(part).ok()?;
    let mut out = String::new();
    entry.read_to_string(&mut out).unwrap();
    Some(out)
}

fn position(haystack: &str, needle: &str) -> usize {
    haystack
        .find(needle)
        .unwrap_or_else(|| panic!("{needle:?} not found"))
}

#[test]
fn files_are_merged_in_list_order() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "b.html", "<html><body><h1>Chapter B</h1><p>Body of B.</p></body></html>");
    write(dir.path(), "a.html", "<html><body><h1>Chapter A</h1><ul><li>item A</li></ul></body></html>");

    let cfg = config_for(&dir, &["b.html", "a.html"]);
    let summary = build_report(&cfg, &NoopObserver).unwrap();
    assert_eq!(summary.converted.len(), 2);
    assert!(summary.skipped.is_empty());
    assert!(summary.output.is_absolute());

    let xml = read_part(&cfg.output, "word/document.xml").unwrap();
    let b = position(&xml, "Chapter B");
    let body_b = position(&xml, "Body of B.");
    let a = position(&xml, "Chapter A");
    let item = position(&xml, "item A");
    assert!(b < body_b && body_b < a && a < item);

    assert!(read_part(&cfg.output, "word/numbering.xml").is_some());
    let styles = read_part(&cfg.output, "word/styles.xml").unwrap();
    assert!(styles.contains("Times New Roman"));
}

#[test]
fn missing_inputs_are_skipped_and_the_rest_processed() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "ok.html", "<body><h2>Still here</h2></body>");
    write(dir.path(), "fragment.html", "<p>no body element</p>");

    let cfg = config_for(&dir, &["gone.html", "fragment.html", "ok.html"]);
    let summary = build_report(&cfg, &NoopObserver).unwrap();

    assert_eq!(
        summary.skipped,
        vec![
            (dir.path().join("gone.html"), SkipReason::MissingFile),
            (dir.path().join("fragment.html"), SkipReason::MissingBody),
        ]
    );
    assert_eq!(summary.converted, vec![dir.path().join("ok.html")]);

    let xml = read_part(&cfg.output, "word/document.xml").unwrap();
    assert!(xml.contains("Still here"));
    assert!(!xml.contains("no body element"));
}

#[test]
fn heading_and_bold_paragraph_scenario() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "in.html", "<body><h1>Title</h1><p>Hello <strong>world</strong></p></body>");

    let cfg = config_for(&dir, &["in.html"]);
    let summary = build_report(&cfg, &NoopObserver).unwrap();
    assert_eq!(summary.blocks, 2);

    let xml = read_part(&cfg.output, "word/document.xml").unwrap();
    assert!(xml.contains(
        r#"<w:p><w:pPr><w:pStyle w:val="Heading1"/><w:jc w:val="center"/></w:pPr><w:r><w:t xml:space="preserve">Title</w:t></w:r></w:p>"#
    ));
    assert!(xml.contains(
        r#"<w:p><w:pPr><w:jc w:val="both"/></w:pPr><w:r><w:rPr><w:b/></w:rPr><w:t xml:space="preserve">Hello world</w:t></w:r></w:p>"#
    ));
    assert!(read_part(&cfg.output, "word/numbering.xml").is_none());
}

#[test]
fn ragged_table_scenario() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "t.html",
        "<body><table><tr><th>A</th><th>B</th></tr><tr><td>1</td></tr></table></body>",
    );

    let cfg = config_for(&dir, &["t.html"]);
    let summary = build_report(&cfg, &NoopObserver).unwrap();
    // table + spacing paragraph
    assert_eq!(summary.blocks, 2);

    let xml = read_part(&cfg.output, "word/document.xml").unwrap();
    assert_eq!(xml.matches("<w:tr>").count(), 2);
    assert_eq!(xml.matches("<w:tc>").count(), 4);
    assert_eq!(xml.matches("<w:gridCol").count(), 2);
    let rest = &xml[xml.rfind("<w:tr>").unwrap()..];
    let second_row = &rest[..rest.find("</w:tr>").unwrap()];
    assert!(second_row.contains(">1</w:t>"));
    assert_eq!(second_row.matches("<w:p></w:p>").count(), 1);
}

#[test]
fn rerun_produces_identical_package() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "r.html",
        "<body><h1>R</h1><ol><li>one</li><li>two</li></ol><pre>code\n  indented</pre>\
         <div class=\"page-break\"></div><h3>End</h3></body>",
    );

    let mut cfg = config_for(&dir, &["r.html"]);
    cfg.title = Some("Deterministic".into());
    build_report(&cfg, &NoopObserver).unwrap();
    let first = fs::read(&cfg.output).unwrap();
    build_report(&cfg, &NoopObserver).unwrap();
    let second = fs::read(&cfg.output).unwrap();
    assert_eq!(first, second);

    let core = read_part(&cfg.output, "docProps/core.xml").unwrap();
    assert!(core.contains("<dc:title>Deterministic</dc:title>"));
    let xml = read_part(&cfg.output, "word/document.xml").unwrap();
    assert!(xml.contains(r#"<w:br w:type="page"/>"#));
    assert!(xml.contains(r#"<w:rFonts w:ascii="Courier New""#));
}

#[test]
fn invalid_config_is_fatal_before_any_output() {
    let dir = TempDir::new().unwrap();
    let cfg = config_for(&dir, &[]);
    let err = build_report(&cfg, &NoopObserver).unwrap_err();
    assert!(matches!(err, ReportError::Config { .. }));
    assert!(!cfg.output.exists());
}

#[test]
fn unreadable_input_aborts_the_run() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("bad.html"), [0xff, 0xfe, 0x00, 0xc3]).unwrap();
    write(dir.path(), "ok.html", "<body><h1>ok</h1></body>");

    let cfg = config_for(&dir, &["bad.html", "ok.html"]);
    let err = build_report(&cfg, &NoopObserver).unwrap_err();
    assert!(matches!(err, ReportError::Io { .. }));
    assert!(!cfg.output.exists());
}

#[test]
fn numbered_lists_in_separate_files_restart() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "one.html", "<body><ol><li>alpha</li><li>beta</li></ol></body>");
    write(dir.path(), "two.html", "<body><ol><li>gamma</li></ol></body>");

    let cfg = config_for(&dir, &["one.html", "two.html"]);
    build_report(&cfg, &NoopObserver).unwrap();

    let xml = read_part(&cfg.output, "word/document.xml").unwrap();
    assert_eq!(xml.matches(r#"<w:numId w:val="2"/>"#).count(), 2);
    assert_eq!(xml.matches(r#"<w:numId w:val="3"/>"#).count(), 1);
    assert!(position(&xml, "beta") < position(&xml, r#"<w:numId w:val="3"/>"#));

    let numbering = read_part(&cfg.output, "word/numbering.xml").unwrap();
    assert!(numbering.contains(r#"<w:num w:numId="2">"#));
    assert!(numbering.contains(r#"<w:num w:numId="3">"#));
    assert_eq!(numbering.matches(r#"<w:startOverride w:val="1"/>"#).count(), 2);
}

#[test]
fn control_characters_never_reach_the_package() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "c.html", "<body><p>ab\u{1}cd</p><pre>x\u{b}y</pre></body>");

    let cfg = config_for(&dir, &["c.html"]);
    build_report(&cfg, &NoopObserver).unwrap();

    let xml = read_part(&cfg.output, "word/document.xml").unwrap();
    assert!(!xml.contains('\u{1}'));
    assert!(!xml.contains('\u{b}'));
    assert!(xml.contains(">abcd</w:t>"));
    assert!(xml.contains(">xy</w:t>"));
}
