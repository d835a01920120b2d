//! Merge an ordered list of HTML report files into one `.docx` document.
//!
//! Recognized block elements (`h1`–`h3`, `p`, `ul`, `ol`, `table`, `div`,
//! `pre`) become headings, paragraphs, list items, tables and page breaks;
//! everything else is ignored.

pub mod builder;
pub mod config;
pub mod convert;
pub mod docx;
pub mod error;
pub mod markup;
pub mod model;

pub use builder::{
    build_report, FileOutcome, NoopObserver, ReportBuilder, ReportObserver, ReportSummary,
    SkipReason,
};
pub use config::{FontConfig, ReportConfig};
pub use error::{ReportError, Result};
pub use model::{Block, Document};
