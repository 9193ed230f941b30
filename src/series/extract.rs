//! 字段抽取：从原始日志行里取出 (时间, 值) 两列。

use csv::StringRecord;
use tracing::trace;

use super::{Sample, SeriesIndex, SimTime, UnitSeries};
use crate::unit::UnitDescriptor;

/// 按配方抽取时间列与值列，丢弃任一列缺失或无法解析的行，结果按时间稳定排序。
pub fn extract(
    desc: &UnitDescriptor,
    headers: &StringRecord,
    rows: &[StringRecord],
) -> Vec<Sample> {
    let (Some(index_col), Some(value_col)) =
        (column(headers, &desc.index), column(headers, &desc.value))
    else {
        trace!(unit = %desc.kind, index = %desc.index, value = %desc.value, "日志缺少所需列");
        return Vec::new();
    };

    let mut samples: Vec<Sample> = rows
        .iter()
        .filter_map(|row| {
            let at = parse_field(row.get(index_col)?)?;
            let value = parse_field(row.get(value_col)?)?;
            Some(Sample {
                at: SimTime::from_raw(at, desc.time_unit)?,
                value,
            })
        })
        .collect();
    samples.sort_by_key(|s| s.at);

    trace!(unit = %desc.kind, rows = rows.len(), kept = samples.len(), "抽取完成");
    samples
}

/// 不重采样的指标：直接按纳秒时间建序列，同一时间戳以最后一行为准。
pub fn raw_series(samples: &[Sample]) -> UnitSeries {
    let mut series = UnitSeries::new(SeriesIndex::Nanos);
    append_raw(&mut series, samples);
    series
}

pub(crate) fn append_raw(series: &mut UnitSeries, samples: &[Sample]) {
    for s in samples {
        series.insert(s.at.0, s.value);
    }
}

fn column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim() == name)
}

fn parse_field(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}
