//! 实体名解析
//!
//! 固定文法：`[sim<N>_]cl<M>_<label>_output.txt`
//! - `N`：仿真编号（十进制，可省略）
//! - `M`：客户端编号（十进制）
//! - `label`：ABR 算法名，非空的任意文本

use serde::Serialize;
use std::path::Path;

use crate::error::{IngestError, Result};

const OUTPUT_SUFFIX: &str = "_output.txt";

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct EntityId {
    pub name: String,
    pub sim_id: Option<u32>,
    pub client: u32,
    pub algorithm: String,
}

impl EntityId {
    pub fn parse(name: &str) -> Result<Self> {
        let bad = || IngestError::UnrecognizedEntityId(name.to_string());

        let stem = name.strip_suffix(OUTPUT_SUFFIX).ok_or_else(bad)?;
        let (sim_id, rest) = match stem.strip_prefix("sim") {
            Some(after) => {
                let (n, rest) = split_number(after).ok_or_else(bad)?;
                (Some(n), rest.strip_prefix('_').ok_or_else(bad)?)
            }
            None => (None, stem),
        };
        let rest = rest.strip_prefix("cl").ok_or_else(bad)?;
        let (client, rest) = split_number(rest).ok_or_else(bad)?;
        let algorithm = rest.strip_prefix('_').ok_or_else(bad)?;
        if algorithm.is_empty() {
            return Err(bad());
        }

        Ok(Self {
            name: name.to_string(),
            sim_id,
            client,
            algorithm: algorithm.to_string(),
        })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| IngestError::UnrecognizedEntityId(path.display().to_string()))?;
        Self::parse(name)
    }

    /// 去掉 `sim<N>_` 前缀与输出后缀后的短名，例如 `cl0_panda`
    pub fn short_name(&self) -> &str {
        let stem = self.name.strip_suffix(OUTPUT_SUFFIX).unwrap_or(&self.name);
        match self.sim_id {
            Some(_) => stem.split_once('_').map_or(stem, |(_, rest)| rest),
            None => stem,
        }
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// 拆出开头的十进制数字
pub(crate) fn split_number(raw: &str) -> Option<(u32, &str)> {
    let end = raw
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map_or(raw.len(), |(i, _)| i);
    if end == 0 {
        return None;
    }
    let n = raw[..end].parse().ok()?;
    Some((n, &raw[end..]))
}
