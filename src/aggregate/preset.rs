use serde::Serialize;

use super::AggregateMode;
use crate::error::{IngestError, Result};
use crate::unit::UnitKind;

/// 仪表盘上的预置聚合图：指标 + 聚合方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AggregatedUnit {
    pub name: &'static str,
    pub unit: UnitKind,
    pub mode: AggregateMode,
}

impl AggregatedUnit {
    pub const ALL: [AggregatedUnit; 5] = [
        AggregatedUnit {
            name: "avgTp",
            unit: UnitKind::Throughput,
            mode: AggregateMode::Average,
        },
        AggregatedUnit {
            name: "avgBl",
            unit: UnitKind::BufferLevel,
            mode: AggregateMode::Average,
        },
        AggregatedUnit {
            name: "avgSegSize",
            unit: UnitKind::SegmentSize,
            mode: AggregateMode::Average,
        },
        AggregatedUnit {
            name: "avgQualLevel",
            unit: UnitKind::QualityLevel,
            mode: AggregateMode::Average,
        },
        AggregatedUnit {
            name: "totalEff",
            unit: UnitKind::Efficiency,
            mode: AggregateMode::StackedSum,
        },
    ];

    pub fn lookup(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|a| a.name == name.trim())
            .ok_or_else(|| IngestError::UnknownUnit(name.to_string()))
    }
}
