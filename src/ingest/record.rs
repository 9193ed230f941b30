//! 单个实体的缓存：原始行、读取水位、各指标的派生序列。

use csv::StringRecord;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::trace;

use crate::log::{EntityId, LogChunk, Watermark};
use crate::series::{Buckets, SeriesIndex, UnitSeries, append_raw, extract};
use crate::unit::{UnitDescriptor, UnitKind};

/// 某指标的派生状态
#[derive(Debug, Clone)]
pub(crate) struct UnitState {
    /// 已并入派生序列的原始行数
    pub folded: usize,
    buckets: Buckets,
    pub series: UnitSeries,
}

impl UnitState {
    fn new(desc: &UnitDescriptor) -> Self {
        let index = if desc.resample {
            SeriesIndex::Seconds
        } else {
            SeriesIndex::Nanos
        };
        Self {
            folded: 0,
            buckets: Buckets::default(),
            series: UnitSeries::new(index),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EntityRecord {
    pub id: EntityId,
    pub(crate) path: Option<PathBuf>,
    headers: Option<StringRecord>,
    rows: Vec<StringRecord>,
    watermark: Option<Watermark>,
    pub(crate) units: BTreeMap<UnitKind, UnitState>,
}

impl EntityRecord {
    pub(crate) fn new(id: EntityId, path: Option<PathBuf>) -> Self {
        Self {
            id,
            path,
            headers: None,
            rows: Vec::new(),
            watermark: None,
            units: BTreeMap::new(),
        }
    }

    pub fn watermark(&self) -> Option<Watermark> {
        self.watermark
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn units(&self) -> impl Iterator<Item = UnitKind> + '_ {
        self.units.keys().copied()
    }

    pub fn series(&self, unit: UnitKind) -> Option<&UnitSeries> {
        self.units.get(&unit).map(|s| &s.series)
    }

    /// 把新读到的行追加进原始缓存并推进水位
    pub(crate) fn append(&mut self, chunk: LogChunk) -> usize {
        if self.headers.is_none() {
            self.headers = chunk.headers;
        }
        let added = chunk.rows.len();
        self.rows.extend(chunk.rows);
        let advanced = match self.watermark {
            Some(w) => w.rows <= chunk.watermark.rows && w.offset <= chunk.watermark.offset,
            None => true,
        };
        if advanced {
            self.watermark = Some(chunk.watermark);
        }
        added
    }

    /// 把尚未并入的原始行抽取、重采样后合并进该指标的派生序列。
    ///
    /// 首次调用时处理整个原始缓存；之后只处理上次水位之后的行。
    pub(crate) fn fold(&mut self, desc: &UnitDescriptor) -> &UnitSeries {
        let state = self
            .units
            .entry(desc.kind)
            .or_insert_with(|| UnitState::new(desc));

        let Some(headers) = &self.headers else {
            return &state.series;
        };
        if state.folded >= self.rows.len() {
            return &state.series;
        }

        let fresh = &self.rows[state.folded..];
        let samples = extract(desc, headers, fresh);
        if desc.resample {
            if let Some(from) = state.buckets.absorb(&samples) {
                state.buckets.render_into(desc, from, &mut state.series);
            }
        } else {
            append_raw(&mut state.series, &samples);
        }
        trace!(
            entity = %self.id,
            unit = %desc.kind,
            rows = fresh.len(),
            samples = samples.len(),
            points = state.series.len(),
            "合并新行"
        );
        state.folded = self.rows.len();
        &state.series
    }
}
