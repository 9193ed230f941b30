use super::UnitSeries;
use crate::log::BottleneckSchedule;

/// 吞吐量（kbit / 秒窗口）除以当时的瓶颈带宽（kbit/s），得到带宽利用率。
///
/// 窗口 `s` 采用 `Time_Now <= s` 的最后一次带宽变更；第一次变更之前的窗口没有已知带宽，不输出。
pub fn efficiency(throughput: &UnitSeries, schedule: &BottleneckSchedule) -> UnitSeries {
    let mut out = UnitSeries::new(throughput.index);
    for (sec, kbits) in throughput.iter() {
        let Some(rate) = schedule.rate_at(sec as f64) else {
            continue;
        };
        if rate > 0.0 {
            out.insert(sec, kbits / rate);
        }
    }
    out
}
