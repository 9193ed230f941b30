//! 增量读取
//!
//! 水位同时记录已消费的行数与最后一个完整行末尾的字节偏移，每次轮询只解析新增字节。
//! 末尾没有换行符的半行仍在被写入，留到下一次轮询。

use csv::{ReaderBuilder, StringRecord};
use serde::Serialize;
use std::fs::File;
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::path::Path;
use tracing::{debug, trace};

use super::DELIMITER;
use crate::error::{IngestError, Result};

/// 已消费的行数（不含表头）与字节偏移；只增不减。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Watermark {
    pub rows: usize,
    pub offset: u64,
}

/// 一次读取的结果
#[derive(Debug, Clone, Default)]
pub struct LogChunk {
    /// 仅在从文件开头读取时给出
    pub headers: Option<StringRecord>,
    pub rows: Vec<StringRecord>,
    pub watermark: Watermark,
}

/// 读取 `previous` 之后追加的行。
///
/// - `previous == None`：从头读取全部行
/// - 文件尚不存在：视为没有新行，水位不变
pub fn read_new_rows(path: &Path, previous: Option<Watermark>) -> Result<LogChunk> {
    let prev = previous.unwrap_or_default();
    let mut file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            trace!(path = %path.display(), "日志尚未创建");
            return Ok(LogChunk {
                watermark: prev,
                ..LogChunk::default()
            });
        }
        Err(e) => return Err(IngestError::io(path, e)),
    };

    let len = file.metadata().map_err(|e| IngestError::io(path, e))?.len();
    if len < prev.offset {
        return Err(IngestError::LogTruncated {
            path: path.to_path_buf(),
            len,
            offset: prev.offset,
        });
    }

    file.seek(SeekFrom::Start(prev.offset))
        .map_err(|e| IngestError::io(path, e))?;
    let mut buf = Vec::with_capacity((len - prev.offset) as usize);
    file.read_to_end(&mut buf)
        .map_err(|e| IngestError::io(path, e))?;

    let complete = buf.iter().rposition(|&b| b == b'\n').map_or(0, |i| i + 1);
    if complete == 0 {
        return Ok(LogChunk {
            watermark: prev,
            ..LogChunk::default()
        });
    }

    let from_start = prev.offset == 0;
    let mut rdr = ReaderBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(from_start)
        .flexible(true)
        .from_reader(&buf[..complete]);

    let headers = if from_start {
        Some(rdr.headers().map_err(|e| IngestError::csv(path, e))?.clone())
    } else {
        None
    };
    let rows = rdr
        .records()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| IngestError::csv(path, e))?;

    let watermark = Watermark {
        rows: prev.rows + rows.len(),
        offset: prev.offset + complete as u64,
    };
    debug!(
        path = %path.display(),
        new_rows = rows.len(),
        total_rows = watermark.rows,
        offset = watermark.offset,
        "读取新日志行"
    );
    Ok(LogChunk {
        headers,
        rows,
        watermark,
    })
}
