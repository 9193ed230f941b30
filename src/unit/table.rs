use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use super::descriptor::default_reducer;
use super::{DisplayHints, Reducer, TimeUnit, UnitDescriptor, UnitKind};
use crate::error::{IngestError, Result};

/// JSON 配置文件格式
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitTableSpec {
    pub units: Vec<UnitDescriptorSpec>,
}

/// 单个指标的 JSON 配置；省略的字段按指标语义补默认值。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitDescriptorSpec {
    pub kind: UnitKind,
    pub index: String,
    pub value: String,
    #[serde(default = "default_resample")]
    pub resample: bool,
    #[serde(default = "default_time_unit")]
    pub time_unit: TimeUnit,
    #[serde(default)]
    pub reducer: Option<Reducer>,
    #[serde(default)]
    pub forward_fill: Option<bool>,
    #[serde(default)]
    pub scale: Option<f64>,
    #[serde(flatten)]
    pub display: DisplayHints,
}

fn default_resample() -> bool {
    true
}

fn default_time_unit() -> TimeUnit {
    TimeUnit::Seconds
}

impl UnitDescriptorSpec {
    fn resolve(self) -> Result<UnitDescriptor> {
        if self.index.trim().is_empty() || self.value.trim().is_empty() {
            return Err(IngestError::InvalidUnitTable(format!(
                "unit {} needs both index and value columns",
                self.kind
            )));
        }
        let scale = self.scale.unwrap_or(if self.kind.is_counter() {
            super::BYTES_TO_KILOBITS
        } else {
            1.0
        });
        if !scale.is_finite() {
            return Err(IngestError::InvalidUnitTable(format!(
                "unit {} has non-finite scale",
                self.kind
            )));
        }
        let reducer = self.reducer.unwrap_or_else(|| default_reducer(self.kind));
        Ok(UnitDescriptor {
            kind: self.kind,
            index: self.index,
            value: self.value,
            resample: self.resample,
            time_unit: self.time_unit,
            reducer,
            forward_fill: self.forward_fill.unwrap_or(reducer != Reducer::Sum),
            scale,
            display: self.display,
        })
    }
}

/// 指标配方表（按 `UnitKind` 索引，加载时即完成校验）
#[derive(Debug, Clone)]
pub struct UnitTable {
    units: BTreeMap<UnitKind, UnitDescriptor>,
}

impl UnitTable {
    pub fn new(descriptors: impl IntoIterator<Item = UnitDescriptor>) -> Result<Self> {
        let mut units = BTreeMap::new();
        for d in descriptors {
            let kind = d.kind;
            // 带宽效率按整秒窗口对齐带宽表，只能基于重采样后的 kbit 序列
            if kind == UnitKind::Efficiency && !d.resample {
                return Err(IngestError::InvalidUnitTable(format!(
                    "unit {kind} must be resampled"
                )));
            }
            if units.insert(kind, d).is_some() {
                return Err(IngestError::InvalidUnitTable(format!(
                    "unit {kind} defined more than once"
                )));
            }
        }
        Ok(Self { units })
    }

    /// 离线分析用的配方：所有指标都按 1 秒重采样，时间列为秒。
    pub fn standard() -> Self {
        Self::preset(true, TimeUnit::Seconds)
    }

    /// 实时视图用的配方：只有吞吐量/效率做重采样，其余保留原始采样点（纳秒索引）。
    pub fn live() -> Self {
        Self::preset(false, TimeUnit::Nanoseconds)
    }

    fn preset(resample: bool, unit: TimeUnit) -> Self {
        let units = [
            UnitDescriptor::new(
                UnitKind::BufferLevel,
                "Time_Now",
                "Buffer_Level",
                resample,
                unit,
            )
            .with_display("BufferLevel(seconds)", "Buffer Level", "hv"),
            UnitDescriptor::new(
                UnitKind::Throughput,
                "Time_Now",
                "Bytes_Received",
                true,
                TimeUnit::Seconds,
            )
            .with_display("Kb", "Throughput", "linear"),
            UnitDescriptor::new(
                UnitKind::Efficiency,
                "Time_Now",
                "Bytes_Received",
                true,
                TimeUnit::Seconds,
            )
            .with_display("Capacity used", "Efficiency", "linear"),
            UnitDescriptor::new(
                UnitKind::BufferUnderrun,
                "Time_Now",
                "Buffer_Underrun",
                resample,
                unit,
            )
            .with_display("Buffer Underrun", "Buffer Underrun", "hv"),
            UnitDescriptor::new(
                UnitKind::SegmentSize,
                "Download_Request_Sent",
                "Segment_Size",
                resample,
                unit,
            )
            .with_display("Size (Bit)", "Segment Size", "hv"),
            UnitDescriptor::new(
                UnitKind::QualityLevel,
                "Time_Now",
                "Rep_Level",
                resample,
                unit,
            )
            .with_display("Quality Level", "Quality Level", "hv"),
        ];
        Self {
            units: units.into_iter().map(|d| (d.kind, d)).collect(),
        }
    }

    pub fn from_spec(spec: UnitTableSpec) -> Result<Self> {
        let descriptors = spec
            .units
            .into_iter()
            .map(UnitDescriptorSpec::resolve)
            .collect::<Result<Vec<_>>>()?;
        Self::new(descriptors)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let spec: UnitTableSpec =
            serde_json::from_str(raw).map_err(|e| IngestError::InvalidUnitTable(e.to_string()))?;
        Self::from_spec(spec)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| IngestError::io(path, e))?;
        Self::from_json_str(&raw)
    }

    pub fn get(&self, kind: UnitKind) -> Result<&UnitDescriptor> {
        self.units
            .get(&kind)
            .ok_or_else(|| IngestError::UnknownUnit(kind.name().to_string()))
    }

    /// 按短名查找（例如 `"tp"`）
    pub fn lookup(&self, name: &str) -> Result<&UnitDescriptor> {
        self.get(UnitKind::parse(name)?)
    }

    pub fn kinds(&self) -> impl Iterator<Item = UnitKind> + '_ {
        self.units.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &UnitDescriptor> {
        self.units.values()
    }
}

impl Default for UnitTable {
    fn default() -> Self {
        Self::standard()
    }
}
