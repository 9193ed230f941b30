use serde::Serialize;

use crate::log::EntityId;
use crate::series::UnitSeries;

/// 单个客户端的整体统计
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientSummary {
    pub entity: String,
    pub client: u32,
    pub algorithm: String,
    /// 质量等级切换次数
    pub quality_changes: Option<usize>,
    /// 卡顿总时长（秒窗口内卡顿标志之和）
    pub total_underrun: Option<f64>,
    pub mean_quality: Option<f64>,
    pub mean_efficiency: Option<f64>,
}

impl ClientSummary {
    pub fn build(
        id: &EntityId,
        quality: Option<&UnitSeries>,
        underrun: Option<&UnitSeries>,
        efficiency: Option<&UnitSeries>,
    ) -> Self {
        Self {
            entity: id.name.clone(),
            client: id.client,
            algorithm: id.algorithm.clone(),
            quality_changes: quality.map(UnitSeries::count_changes),
            total_underrun: underrun.map(UnitSeries::sum),
            mean_quality: quality.and_then(UnitSeries::mean),
            mean_efficiency: efficiency.and_then(UnitSeries::mean),
        }
    }
}
