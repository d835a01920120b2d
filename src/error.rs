use std::path::PathBuf;

/// Fatal errors. Per-file problems that only cause a skip are reported as
/// [`crate::builder::SkipReason`] instead.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write docx package: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("config error: {message}")]
    Config { message: String },

    #[error("invalid config file {path:?}: {source}")]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

pub type Result<T> = std::result::Result<T, ReportError>;

impl ReportError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }
}
