use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::EntityId;
use super::entity::split_number;
use crate::error::{IngestError, Result};

/// 列出某次仿真的全部客户端输出文件，按客户端编号排序。
///
/// 目录尚未创建时返回空列表；不符合实体名文法的文件直接跳过。
pub fn discover_outputs(dir: &Path, sim_id: u32) -> Result<Vec<PathBuf>> {
    let mut found: Vec<(u32, PathBuf)> = list_names(dir)?
        .into_iter()
        .filter_map(|name| {
            let id = EntityId::parse(&name).ok()?;
            (id.sim_id == Some(sim_id)).then(|| (id.client, dir.join(name)))
        })
        .collect();
    found.sort();
    Ok(found.into_iter().map(|(_, p)| p).collect())
}

/// 目录中出现过的全部仿真编号（文件名以 `sim<N>_` 开头），升序。
pub fn sim_ids(dir: &Path) -> Result<Vec<u32>> {
    let ids: BTreeSet<u32> = list_names(dir)?
        .iter()
        .filter_map(|name| {
            let (n, rest) = split_number(name.strip_prefix("sim")?)?;
            rest.starts_with('_').then_some(n)
        })
        .collect();
    Ok(ids.into_iter().collect())
}

fn list_names(dir: &Path) -> Result<Vec<String>> {
    let entries = match fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(IngestError::io(dir, e)),
    };
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| IngestError::io(dir, e))?;
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        }
    }
    Ok(names)
}
