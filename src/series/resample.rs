//! 1 秒窗口重采样
//!
//! 窗口键为采样时间向下取整的秒数（即相对仿真开始的整秒偏移），输出从序列自身第一个窗口开始。
//! 每个窗口保留 (和, 计数, 最小值) 累加器，这样后续追加的行落入已有窗口时可以就地合并，
//! 增量结果与一次性全量重采样一致。

use std::collections::BTreeMap;

use super::{Sample, UnitSeries};
use crate::unit::{Reducer, UnitDescriptor};

#[derive(Debug, Clone, Copy)]
struct Accum {
    sum: f64,
    count: u64,
    min: f64,
}

impl Accum {
    fn new(v: f64) -> Self {
        Self {
            sum: v,
            count: 1,
            min: v,
        }
    }

    fn push(&mut self, v: f64) {
        self.sum += v;
        self.count += 1;
        self.min = self.min.min(v);
    }

    fn reduce(&self, reducer: Reducer) -> f64 {
        match reducer {
            Reducer::Sum => self.sum,
            Reducer::Mean => self.sum / self.count as f64,
            Reducer::Min => self.min,
        }
    }
}

/// 按整秒窗口累积的中间状态
#[derive(Debug, Clone, Default)]
pub struct Buckets {
    acc: BTreeMap<u64, Accum>,
}

impl Buckets {
    pub fn from_samples(samples: &[Sample]) -> Self {
        let mut b = Self::default();
        b.absorb(samples);
        b
    }

    pub fn is_empty(&self) -> bool {
        self.acc.is_empty()
    }

    /// 并入新的采样点，返回被触及的最小窗口编号（无新点时为 `None`）
    pub fn absorb(&mut self, samples: &[Sample]) -> Option<u64> {
        let mut lowest: Option<u64> = None;
        for s in samples {
            let sec = s.at.whole_secs();
            self.acc
                .entry(sec)
                .and_modify(|a| a.push(s.value))
                .or_insert_with(|| Accum::new(s.value));
            lowest = Some(lowest.map_or(sec, |l| l.min(sec)));
        }
        lowest
    }

    /// 重新生成 `out` 中键 >= `from` 的部分；更早的点保持不变。
    pub fn render_into(&self, desc: &UnitDescriptor, from: u64, out: &mut UnitSeries) {
        out.truncate_from(from);
        let mut prev = out.last();
        for (&sec, a) in self.acc.range(from..) {
            if desc.forward_fill {
                if let Some((last_sec, last_val)) = prev {
                    for gap in last_sec.saturating_add(1)..sec {
                        out.insert(gap, last_val);
                    }
                }
            }
            let value = a.reduce(desc.reducer) * desc.scale;
            out.insert(sec, value);
            prev = Some((sec, value));
        }
    }

    pub fn render(&self, desc: &UnitDescriptor) -> UnitSeries {
        let mut out = UnitSeries::seconds();
        self.render_into(desc, 0, &mut out);
        out
    }
}

/// 把一段有序采样点重采样为整秒序列；空输入得到空序列。
pub fn resample(desc: &UnitDescriptor, samples: &[Sample]) -> UnitSeries {
    Buckets::from_samples(samples).render(desc)
}
