//! 日志时间类型
//!
//! 定义自仿真开始经过的时间及其单位转换。

use crate::unit::TimeUnit;

pub const NANOS_PER_SEC: u64 = 1_000_000_000;

/// 自仿真开始经过的时间（纳秒）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SimTime(pub u64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0);

    pub fn from_secs(s: u64) -> SimTime {
        SimTime(s.saturating_mul(NANOS_PER_SEC))
    }

    /// 按列声明的单位解释一个原始数值；负数、NaN、无穷大返回 `None`。
    pub fn from_raw(raw: f64, unit: TimeUnit) -> Option<SimTime> {
        if !raw.is_finite() || raw < 0.0 {
            return None;
        }
        let nanos = match unit {
            TimeUnit::Seconds => raw * NANOS_PER_SEC as f64,
            TimeUnit::Nanoseconds => raw,
        };
        if nanos >= u64::MAX as f64 {
            return None;
        }
        Some(SimTime(nanos.round() as u64))
    }

    /// 所在 1 秒窗口的编号
    pub fn whole_secs(self) -> u64 {
        self.0 / NANOS_PER_SEC
    }

    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / NANOS_PER_SEC as f64
    }
}
