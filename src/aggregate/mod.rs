//! 跨实体聚合
//!
//! 同一指标的多条序列按时间键对齐后合并：某条序列缺失的键按 0 计入（不是插值，也不丢弃）。
//! 除了全体实体的合并结果，还按实体名里的算法名分组各合并一次。

mod preset;
mod summary;

pub use preset::AggregatedUnit;
pub use summary::ClientSummary;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{IngestError, Result};
use crate::log::EntityId;
use crate::series::{SeriesIndex, UnitSeries};
use crate::unit::UnitKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateMode {
    Average,
    Sum,
    /// 与 `Sum` 数值相同，提示可视化层按堆叠面积绘制
    StackedSum,
}

impl AggregateMode {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_lowercase().as_str() {
            "avg" | "average" | "mean" => Ok(Self::Average),
            "sum" => Ok(Self::Sum),
            "stacked_sum" | "stacked-sum" | "stackedsum" => Ok(Self::StackedSum),
            _ => Err(IngestError::UnknownMode(raw.to_string())),
        }
    }

    pub fn is_stacked(self) -> bool {
        matches!(self, Self::StackedSum)
    }
}

/// 合并若干条序列；空列表得到空序列。
pub fn aggregate<'a>(
    series: impl IntoIterator<Item = &'a UnitSeries>,
    mode: AggregateMode,
) -> UnitSeries {
    let mut index = None;
    let mut count = 0usize;
    let mut acc: BTreeMap<u64, f64> = BTreeMap::new();
    for s in series {
        index.get_or_insert(s.index);
        count += 1;
        for (k, v) in s.iter() {
            *acc.entry(k).or_insert(0.0) += v;
        }
    }

    let index = index.unwrap_or(SeriesIndex::Seconds);
    if count == 0 {
        return UnitSeries::new(index);
    }
    let divisor = match mode {
        AggregateMode::Average => count as f64,
        AggregateMode::Sum | AggregateMode::StackedSum => 1.0,
    };
    UnitSeries::from_points(index, acc.into_iter().map(|(k, v)| (k, v / divisor)))
}

/// 一次聚合的完整结果：全体实体 + 按算法分组
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateReport {
    pub unit: UnitKind,
    pub mode: AggregateMode,
    pub entities: usize,
    pub overall: UnitSeries,
    pub by_algorithm: BTreeMap<String, UnitSeries>,
}

/// 对 (实体, 序列) 列表做整体聚合，并按算法名分组聚合。
pub fn aggregate_by_algorithm<'a>(
    unit: UnitKind,
    entries: impl IntoIterator<Item = (&'a EntityId, &'a UnitSeries)>,
    mode: AggregateMode,
) -> AggregateReport {
    let entries: Vec<(&EntityId, &UnitSeries)> = entries.into_iter().collect();

    let mut groups: BTreeMap<&str, Vec<&UnitSeries>> = BTreeMap::new();
    for (id, s) in &entries {
        groups.entry(id.algorithm.as_str()).or_default().push(*s);
    }
    let by_algorithm = groups
        .into_iter()
        .map(|(algo, members)| (algo.to_string(), aggregate(members, mode)))
        .collect();

    AggregateReport {
        unit,
        mode,
        entities: entries.len(),
        overall: aggregate(entries.iter().map(|(_, s)| *s), mode),
        by_algorithm,
    }
}
