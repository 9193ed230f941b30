//! 错误类型
//!
//! 整个 crate 共用一个错误枚举；`kind()` 用于区分 I/O、配置、实体名三类错误。

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, IngestError>;

/// 错误大类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    Configuration,
    UnrecognizedEntity,
    Data,
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed log {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("log {path} shrank to {len} bytes, already consumed {offset}")]
    LogTruncated { path: PathBuf, len: u64, offset: u64 },

    #[error("unknown unit: {0}")]
    UnknownUnit(String),

    #[error("unknown aggregation mode: {0}")]
    UnknownMode(String),

    #[error("invalid unit table: {0}")]
    InvalidUnitTable(String),

    #[error("unrecognized entity id: {0}")]
    UnrecognizedEntityId(String),

    #[error("invalid event log {path}: {reason}")]
    InvalidEventLog { path: PathBuf, reason: String },
}

impl IngestError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io { .. } => ErrorKind::Io,
            Self::Csv { .. } | Self::LogTruncated { .. } | Self::InvalidEventLog { .. } => {
                ErrorKind::Data
            }
            Self::UnknownUnit(_) | Self::UnknownMode(_) | Self::InvalidUnitTable(_) => {
                ErrorKind::Configuration
            }
            Self::UnrecognizedEntityId(_) => ErrorKind::UnrecognizedEntity,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }
}
