//! Document builder: owns the output document across the whole run and feeds
//! it one HTML file at a time.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::ReportConfig;
use crate::convert::{ConvertOptions, Converter};
use crate::docx;
use crate::error::{ReportError, Result};
use crate::markup::{find_body, has_body_tag, html5_parse};
use crate::model::{Document, StyleSheet};

/// Why a listed input contributed nothing. Skips never abort the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingFile,
    MissingBody,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingFile => f.write_str("file not found"),
            SkipReason::MissingBody => f.write_str("no body content found"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    Converted { blocks: usize },
    Skipped(SkipReason),
}

pub struct ReportBuilder {
    document: Document,
    converter: Converter,
}

impl ReportBuilder {
    /// Empty document with the configured base and heading styles.
    pub fn initialize(config: &ReportConfig) -> Self {
        let mut document = Document::new(StyleSheet::from_fonts(&config.fonts));
        document.title = config.title.clone();
        Self {
            document,
            converter: Converter::new(ConvertOptions::from_config(config)),
        }
    }

    pub fn process_file(&mut self, path: &Path) -> Result<FileOutcome> {
        if !path.exists() {
            info!(path = %path.display(), "input file not found, skipping");
            return Ok(FileOutcome::Skipped(SkipReason::MissingFile));
        }
        let html = std::fs::read_to_string(path).map_err(|e| ReportError::io(path, e))?;
        let outcome = self.process_html(&html);
        match outcome {
            FileOutcome::Skipped(reason) => {
                info!(path = %path.display(), %reason, "skipping input file");
            }
            FileOutcome::Converted { blocks } => {
                info!(path = %path.display(), blocks, "converted input file");
            }
        }
        Ok(outcome)
    }

    /// Converts one HTML source and appends its blocks.
    pub fn process_html(&mut self, html: &str) -> FileOutcome {
        if !has_body_tag(html) {
            return FileOutcome::Skipped(SkipReason::MissingBody);
        }
        let dom = html5_parse(html);
        let Some(body) = find_body(&dom.document) else {
            return FileOutcome::Skipped(SkipReason::MissingBody);
        };
        let blocks = self.converter.convert_body(&body);
        let count = blocks.len();
        self.document.extend(blocks);
        debug!(added = count, total = self.document.blocks.len(), "blocks appended");
        FileOutcome::Converted { blocks: count }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Writes the package and returns the absolute output path.
    pub fn finalize(self, output: &Path) -> Result<PathBuf> {
        docx::save(&self.document, output)?;
        let abs = std::fs::canonicalize(output).map_err(|e| ReportError::io(output, e))?;
        info!(path = %abs.display(), blocks = self.document.blocks.len(), "document written");
        Ok(abs)
    }
}

/// Progress hooks for [`build_report`]. Every method defaults to a no-op.
pub trait ReportObserver {
    /// `index` is 1-based.
    fn on_file_start(&self, index: usize, total: usize, path: &Path) {
        let _ = (index, total, path);
    }

    fn on_file_skipped(&self, index: usize, total: usize, path: &Path, reason: SkipReason) {
        let _ = (index, total, path, reason);
    }

    fn on_file_complete(&self, index: usize, total: usize, path: &Path, blocks: usize) {
        let _ = (index, total, path, blocks);
    }
}

pub struct NoopObserver;

impl ReportObserver for NoopObserver {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSummary {
    pub output: PathBuf,
    pub converted: Vec<PathBuf>,
    pub skipped: Vec<(PathBuf, SkipReason)>,
    pub blocks: usize,
}

/// Runs the whole pipeline: initialize, every configured file in order, then
/// finalize. The first fatal error stops the run before anything is written.
pub fn build_report(config: &ReportConfig, observer: &dyn ReportObserver) -> Result<ReportSummary> {
    config.validate()?;

    let files = config.resolved_files();
    let total = files.len();
    let mut builder = ReportBuilder::initialize(config);
    let mut converted = Vec::new();
    let mut skipped = Vec::new();

    for (i, path) in files.into_iter().enumerate() {
        let index = i + 1;
        observer.on_file_start(index, total, &path);
        match builder.process_file(&path)? {
            FileOutcome::Converted { blocks } => {
                observer.on_file_complete(index, total, &path, blocks);
                converted.push(path);
            }
            FileOutcome::Skipped(reason) => {
                observer.on_file_skipped(index, total, &path, reason);
                skipped.push((path, reason));
            }
        }
    }

    let blocks = builder.document().blocks.len();
    let output = builder.finalize(&config.output)?;
    Ok(ReportSummary {
        output,
        converted,
        skipped,
        blocks,
    })
}
