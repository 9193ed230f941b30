use serde::{Deserialize, Serialize};

use crate::error::{IngestError, Result};

/// 已知的指标种类（名字与仪表盘里的短名一致）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum UnitKind {
    #[serde(rename = "bl")]
    BufferLevel,
    #[serde(rename = "tp")]
    Throughput,
    #[serde(rename = "eff")]
    Efficiency,
    #[serde(rename = "bul")]
    BufferUnderrun,
    #[serde(rename = "segSize")]
    SegmentSize,
    #[serde(rename = "qualLevel")]
    QualityLevel,
}

impl UnitKind {
    pub const ALL: [UnitKind; 6] = [
        UnitKind::BufferLevel,
        UnitKind::Throughput,
        UnitKind::Efficiency,
        UnitKind::BufferUnderrun,
        UnitKind::SegmentSize,
        UnitKind::QualityLevel,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::BufferLevel => "bl",
            Self::Throughput => "tp",
            Self::Efficiency => "eff",
            Self::BufferUnderrun => "bul",
            Self::SegmentSize => "segSize",
            Self::QualityLevel => "qualLevel",
        }
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let name = raw.trim();
        Self::ALL
            .into_iter()
            .find(|k| k.name() == name)
            .ok_or_else(|| IngestError::UnknownUnit(raw.to_string()))
    }

    /// 是否为累计计数器类指标（按窗口求和再换算成 kbit）
    pub fn is_counter(self) -> bool {
        matches!(self, Self::Throughput | Self::Efficiency)
    }
}

impl std::fmt::Display for UnitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
