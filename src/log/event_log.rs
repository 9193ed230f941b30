//! 事件日志（`sim<N>_event_log.txt`，表头 `Time_Now;Event;Value`）
//!
//! 目前只关心 `BottleneckRate` 事件：从 `Time_Now`（秒）起瓶颈链路带宽变为 `Value`（kbit/s）。

use csv::ReaderBuilder;
use serde::Serialize;
use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::DELIMITER;
use crate::error::{IngestError, Result};

pub const BOTTLENECK_RATE_EVENT: &str = "BottleneckRate";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RateChange {
    pub at_secs: f64,
    pub kbps: f64,
}

/// 按时间排序的瓶颈带宽变更
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BottleneckSchedule {
    changes: Vec<RateChange>,
}

impl BottleneckSchedule {
    pub fn new(mut changes: Vec<RateChange>) -> Self {
        changes.sort_by(|a, b| a.at_secs.total_cmp(&b.at_secs));
        Self { changes }
    }

    pub fn changes(&self) -> &[RateChange] {
        &self.changes
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// `t` 秒时生效的带宽：最后一个 `at_secs <= t` 的变更
    pub fn rate_at(&self, t: f64) -> Option<f64> {
        let n = self.changes.partition_point(|c| c.at_secs <= t);
        n.checked_sub(1).map(|i| self.changes[i].kbps)
    }
}

pub fn event_log_path(dir: &Path, sim_id: u32) -> PathBuf {
    dir.join(format!("sim{sim_id}_event_log.txt"))
}

/// 读取事件日志；文件不存在时返回空表。
pub fn read_event_log(path: &Path) -> Result<BottleneckSchedule> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BottleneckSchedule::default()),
        Err(e) => return Err(IngestError::io(path, e)),
    };
    let mut rdr = ReaderBuilder::new()
        .delimiter(DELIMITER)
        .flexible(true)
        .from_reader(file);

    let headers = rdr.headers().map_err(|e| IngestError::csv(path, e))?.clone();
    let col = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| IngestError::InvalidEventLog {
                path: path.to_path_buf(),
                reason: format!("missing column {name}"),
            })
    };
    let (t_col, ev_col, v_col) = (col("Time_Now")?, col("Event")?, col("Value")?);

    let mut changes = Vec::new();
    for rec in rdr.records() {
        let rec = rec.map_err(|e| IngestError::csv(path, e))?;
        if rec.get(ev_col).map(str::trim) != Some(BOTTLENECK_RATE_EVENT) {
            continue;
        }
        let parse = |i: usize| rec.get(i).and_then(|v| v.trim().parse::<f64>().ok());
        let (Some(at_secs), Some(kbps)) = (parse(t_col), parse(v_col)) else {
            continue;
        };
        changes.push(RateChange { at_secs, kbps });
    }

    debug!(path = %path.display(), changes = changes.len(), "读取瓶颈带宽事件");
    Ok(BottleneckSchedule::new(changes))
}
