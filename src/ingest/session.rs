//! 摄取会话
//!
//! 持有一次仿真运行期间的全部缓存（实体 -> 原始行 / 水位 / 派生序列）。
//! 单写者：所有修改都经过 `&mut self`，多线程使用时需在外部加锁。

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::record::EntityRecord;
use crate::aggregate::{AggregateMode, AggregateReport, ClientSummary, aggregate_by_algorithm};
use crate::error::{IngestError, Result};
use crate::log::{BottleneckSchedule, EntityId, LogChunk, discover_outputs, read_new_rows};
use crate::series::{UnitSeries, efficiency};
use crate::unit::{UnitKind, UnitTable};

/// 一次目录轮询的结果
#[derive(Debug, Default)]
pub struct PollReport {
    /// 本次轮询到的实体数
    pub entities: usize,
    /// 新增原始行数
    pub new_rows: usize,
    /// 读取失败的实体；其缓存保持不变，下次轮询重试
    pub failures: Vec<(PathBuf, IngestError)>,
}

#[derive(Debug)]
pub struct IngestionSession {
    units: UnitTable,
    entities: BTreeMap<String, EntityRecord>,
    bottleneck: Option<BottleneckSchedule>,
}

impl IngestionSession {
    pub fn new(units: UnitTable) -> Self {
        info!(units = units.kinds().count(), "创建摄取会话");
        Self {
            units,
            entities: BTreeMap::new(),
            bottleneck: None,
        }
    }

    pub fn units(&self) -> &UnitTable {
        &self.units
    }

    /// 新一次仿真开始：清空全部缓存
    pub fn reset(&mut self) {
        info!(entities = self.entities.len(), "重置摄取会话");
        self.entities.clear();
        self.bottleneck = None;
    }

    /// 按客户端编号排序的实体
    pub fn entities(&self) -> Vec<&EntityRecord> {
        let mut all: Vec<&EntityRecord> = self.entities.values().collect();
        all.sort_by(|a, b| (a.id.client, &a.id.name).cmp(&(b.id.client, &b.id.name)));
        all
    }

    pub fn entity(&self, name: &str) -> Option<&EntityRecord> {
        self.entities.get(name)
    }

    pub fn series(&self, entity: &str, unit: UnitKind) -> Option<&UnitSeries> {
        self.entities.get(entity)?.series(unit)
    }

    /// 读取实体日志的新行，只更新原始缓存与读取水位。
    pub fn read_entity(&mut self, path: &Path) -> Result<(EntityId, usize)> {
        let id = EntityId::from_path(path)?;
        let previous = self.entities.get(&id.name).and_then(EntityRecord::watermark);
        // 读取失败时直接返回，缓存不受影响
        let chunk = read_new_rows(path, previous)?;
        let record = self
            .entities
            .entry(id.name.clone())
            .or_insert_with(|| EntityRecord::new(id.clone(), Some(path.to_path_buf())));
        let added = record.append(chunk);
        Ok((id, added))
    }

    /// 追加一批新行并把尚未并入的行合并进 `unit` 的派生序列。
    pub fn merge_new(
        &mut self,
        entity: &EntityId,
        unit: UnitKind,
        chunk: LogChunk,
    ) -> Result<&UnitSeries> {
        let desc = self.units.get(unit)?;
        let record = self
            .entities
            .entry(entity.name.clone())
            .or_insert_with(|| EntityRecord::new(entity.clone(), None));
        record.append(chunk);
        Ok(record.fold(desc))
    }

    /// 只合并已缓存但尚未并入 `unit` 的行
    pub fn refresh(&mut self, entity: &str, unit: UnitKind) -> Result<&UnitSeries> {
        let desc = self.units.get(unit)?;
        let record = self
            .entities
            .get_mut(entity)
            .ok_or_else(|| IngestError::UnrecognizedEntityId(entity.to_string()))?;
        Ok(record.fold(desc))
    }

    /// 轮询单个日志文件，并更新给定指标
    pub fn poll_file(&mut self, path: &Path, units: &[UnitKind]) -> Result<usize> {
        for &unit in units {
            self.units.get(unit)?;
        }
        let (id, added) = self.read_entity(path)?;
        for &unit in units {
            self.refresh(&id.name, unit)?;
        }
        Ok(added)
    }

    /// 轮询某次仿真的全部客户端日志。单个实体失败不影响其他实体。
    #[tracing::instrument(skip(self, units), fields(units = units.len()))]
    pub fn poll_dir(&mut self, dir: &Path, sim_id: u32, units: &[UnitKind]) -> Result<PollReport> {
        for &unit in units {
            self.units.get(unit)?;
        }
        let mut report = PollReport::default();
        for path in discover_outputs(dir, sim_id)? {
            report.entities += 1;
            match self.poll_file(&path, units) {
                Ok(added) => report.new_rows += added,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "读取实体日志失败");
                    report.failures.push((path, e));
                }
            }
        }
        debug!(
            entities = report.entities,
            new_rows = report.new_rows,
            failures = report.failures.len(),
            "轮询完成"
        );
        Ok(report)
    }

    pub fn set_bottleneck_schedule(&mut self, schedule: BottleneckSchedule) {
        debug!(changes = schedule.changes().len(), "更新瓶颈带宽表");
        self.bottleneck = Some(schedule);
    }

    pub fn bottleneck_schedule(&self) -> Option<&BottleneckSchedule> {
        self.bottleneck.as_ref()
    }

    /// 实体的带宽利用率序列；缺少带宽表或效率指标尚未合并时为 `None`
    pub fn efficiency(&self, entity: &str) -> Option<UnitSeries> {
        let schedule = self.bottleneck.as_ref()?;
        let kbits = self.series(entity, UnitKind::Efficiency)?;
        Some(efficiency(kbits, schedule))
    }

    /// 聚合所有已合并 `unit` 的实体；没有实体时得到空序列
    pub fn aggregate(&self, unit: UnitKind, mode: AggregateMode) -> Result<AggregateReport> {
        self.units.get(unit)?;
        let entities = self.entities();

        if unit == UnitKind::Efficiency {
            let derived: Vec<(&EntityId, UnitSeries)> = entities
                .into_iter()
                .filter_map(|r| Some((&r.id, self.efficiency(&r.id.name)?)))
                .collect();
            return Ok(aggregate_by_algorithm(
                unit,
                derived.iter().map(|(id, s)| (*id, s)),
                mode,
            ));
        }

        Ok(aggregate_by_algorithm(
            unit,
            entities
                .into_iter()
                .filter_map(|r| Some((&r.id, r.series(unit)?))),
            mode,
        ))
    }

    /// 每个客户端的整体统计
    pub fn summaries(&self) -> Vec<ClientSummary> {
        self.entities()
            .into_iter()
            .map(|r| {
                let eff = self.efficiency(&r.id.name);
                ClientSummary::build(
                    &r.id,
                    r.series(UnitKind::QualityLevel),
                    r.series(UnitKind::BufferUnderrun),
                    eff.as_ref(),
                )
            })
            .collect()
    }
}

impl Default for IngestionSession {
    fn default() -> Self {
        Self::new(UnitTable::standard())
    }
}
