//! Report configuration.
//!
//! Every field has a default reproducing the stock report run, so an empty
//! TOML file (or no file at all) is a valid configuration. CLI flags are
//! applied on top of whatever was loaded.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ReportError, Result};

const DEFAULT_FILES: [&str; 6] = [
    "Report_00_TOC_Abstract.html",
    "Report_01_Chapter1_Introduction.html",
    "Report_02_Chapter2_SystemAnalysis.html",
    "Report_03_Chapter3_DevelopmentEnvironment.html",
    "Report_04_Chapter4_SystemDesign.html",
    "Report_05_Chapters5-9_References.html",
];

const DEFAULT_OUTPUT: &str = "GPublishing_Services_Project_Report.docx";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Input HTML files, in report order.
    #[serde(default = "default_files")]
    pub files: Vec<PathBuf>,

    /// Base directory for relative entries in `files`.
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,

    /// Output .docx path.
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Document title stored in the package properties.
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub fonts: FontConfig,

    /// Number of nested container (`div`) levels whose children are converted.
    #[serde(default = "default_container_depth")]
    pub container_depth: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            files: default_files(),
            input_dir: default_input_dir(),
            output: default_output(),
            title: None,
            fonts: FontConfig::default(),
            container_depth: default_container_depth(),
        }
    }
}

/// `[fonts]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontConfig {
    #[serde(default = "default_body_font")]
    pub body: String,

    /// Points.
    #[serde(default = "default_body_size")]
    pub body_size: u32,

    /// Fixed-width family used for preformatted blocks.
    #[serde(default = "default_code_font")]
    pub code: String,

    #[serde(default = "default_code_size")]
    pub code_size: u32,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            body: default_body_font(),
            body_size: default_body_size(),
            code: default_code_font(),
            code_size: default_code_size(),
        }
    }
}

fn default_files() -> Vec<PathBuf> {
    DEFAULT_FILES.iter().map(PathBuf::from).collect()
}
fn default_input_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_output() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT)
}
fn default_container_depth() -> usize {
    1
}
fn default_body_font() -> String {
    "Times New Roman".into()
}
fn default_body_size() -> u32 {
    12
}
fn default_code_font() -> String {
    "Courier New".into()
}
fn default_code_size() -> u32 {
    10
}

impl ReportConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| ReportError::io(path, e))?;
        toml::from_str(&raw).map_err(|source| ReportError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|source| ReportError::ConfigParse {
            path: PathBuf::from("<inline>"),
            source,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.files.is_empty() {
            return Err(ReportError::config("no input files configured"));
        }
        if self.fonts.body.trim().is_empty() || self.fonts.code.trim().is_empty() {
            return Err(ReportError::config("font family names must not be blank"));
        }
        if self.fonts.body_size == 0 || self.fonts.code_size == 0 {
            return Err(ReportError::config("font sizes must be positive"));
        }
        if self.output.as_os_str().is_empty() {
            return Err(ReportError::config("output path must not be empty"));
        }
        Ok(())
    }

    /// Input paths with `input_dir` applied to relative entries.
    pub fn resolved_files(&self) -> Vec<PathBuf> {
        self.files
            .iter()
            .map(|f| {
                if f.is_absolute() {
                    f.clone()
                } else {
                    self.input_dir.join(f)
                }
            })
            .collect()
    }
}
