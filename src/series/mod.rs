//! 时间序列处理
//!
//! 字段抽取 -> 1 秒窗口重采样 -> 每实体每指标的序列，以及可选的带宽效率换算。

mod efficiency;
mod extract;
mod resample;
mod time;
mod unit_series;

pub use efficiency::efficiency;
pub use extract::{extract, raw_series};
pub use resample::{resample, Buckets};
pub use time::{NANOS_PER_SEC, SimTime};
pub use unit_series::{SeriesIndex, UnitSeries};

pub(crate) use extract::append_raw;

/// 一个抽取出的采样点
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub at: SimTime,
    pub value: f64,
}

impl Sample {
    pub fn new(at: SimTime, value: f64) -> Self {
        Self { at, value }
    }
}
