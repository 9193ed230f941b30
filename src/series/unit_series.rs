use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{Sample, SimTime};

/// 序列索引的含义
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesIndex {
    /// 原始采样时间（纳秒）
    Nanos,
    /// 重采样后的整秒窗口编号
    Seconds,
}

/// 某实体某指标的时间序列：时间键 -> 值，按键有序。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitSeries {
    pub index: SeriesIndex,
    points: BTreeMap<u64, f64>,
}

impl UnitSeries {
    pub fn new(index: SeriesIndex) -> Self {
        Self {
            index,
            points: BTreeMap::new(),
        }
    }

    pub fn seconds() -> Self {
        Self::new(SeriesIndex::Seconds)
    }

    pub fn from_points(index: SeriesIndex, points: impl IntoIterator<Item = (u64, f64)>) -> Self {
        Self {
            index,
            points: points.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, key: u64) -> Option<f64> {
        self.points.get(&key).copied()
    }

    pub fn insert(&mut self, key: u64, value: f64) {
        self.points.insert(key, value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (u64, f64)> + '_ {
        self.points.iter().map(|(k, v)| (*k, *v))
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.values().copied()
    }

    pub fn last(&self) -> Option<(u64, f64)> {
        self.points.last_key_value().map(|(k, v)| (*k, *v))
    }

    /// 丢弃键 >= `from` 的点
    pub(crate) fn truncate_from(&mut self, from: u64) {
        let _ = self.points.split_off(&from);
    }

    pub fn sum(&self) -> f64 {
        self.points.values().sum()
    }

    pub fn mean(&self) -> Option<f64> {
        if self.points.is_empty() {
            return None;
        }
        Some(self.sum() / self.points.len() as f64)
    }

    /// 相邻两点取值不同的次数
    pub fn count_changes(&self) -> usize {
        let values: Vec<f64> = self.values().collect();
        values.windows(2).filter(|w| w[0] != w[1]).count()
    }

    /// 把序列还原成采样点（整秒索引按窗口起点换算）
    pub fn to_samples(&self) -> Vec<Sample> {
        self.iter()
            .map(|(k, value)| Sample {
                at: match self.index {
                    SeriesIndex::Nanos => SimTime(k),
                    SeriesIndex::Seconds => SimTime::from_secs(k),
                },
                value,
            })
            .collect()
    }

    /// 键集合相同且各点误差不超过 `tol`
    pub fn approx_eq(&self, other: &UnitSeries, tol: f64) -> bool {
        self.index == other.index
            && self.points.len() == other.points.len()
            && self
                .points
                .iter()
                .zip(other.points.iter())
                .all(|((ka, va), (kb, vb))| ka == kb && (va - vb).abs() <= tol)
    }
}

impl Default for UnitSeries {
    fn default() -> Self {
        Self::seconds()
    }
}
