use serde::{Deserialize, Serialize};

use super::UnitKind;

/// 原始时间列的单位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    /// 小数秒（客户端日志 `Time_Now` 的写法）
    Seconds,
    /// 整数纳秒
    Nanoseconds,
}

/// 1 秒窗口内的归约方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reducer {
    Sum,
    Mean,
    Min,
}

/// 仅供可视化层使用的展示属性，核心流程不读取
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayHints {
    #[serde(default)]
    pub y_axis: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub line_shape: Option<String>,
}

/// 一种指标的抽取与重采样配方
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitDescriptor {
    pub kind: UnitKind,
    /// 时间列名
    pub index: String,
    /// 值列名
    pub value: String,
    pub resample: bool,
    pub time_unit: TimeUnit,
    pub reducer: Reducer,
    /// 归约后对空窗口做前向填充
    pub forward_fill: bool,
    /// 归约后乘上的换算系数
    pub scale: f64,
    pub display: DisplayHints,
}

impl UnitDescriptor {
    /// 按指标语义给出默认配方：计数器求和并换算为 kbit，
    /// 卡顿标志取最小值，其余取均值；后两者前向填充。
    pub fn new(
        kind: UnitKind,
        index: &str,
        value: &str,
        resample: bool,
        time_unit: TimeUnit,
    ) -> Self {
        let reducer = default_reducer(kind);
        Self {
            kind,
            index: index.to_string(),
            value: value.to_string(),
            resample,
            time_unit,
            reducer,
            forward_fill: reducer != Reducer::Sum,
            scale: if kind.is_counter() {
                super::BYTES_TO_KILOBITS
            } else {
                1.0
            },
            display: DisplayHints::default(),
        }
    }

    pub fn with_display(mut self, y_axis: &str, title: &str, line_shape: &str) -> Self {
        self.display = DisplayHints {
            y_axis: Some(y_axis.to_string()),
            title: Some(title.to_string()),
            line_shape: Some(line_shape.to_string()),
        };
        self
    }
}

pub(crate) fn default_reducer(kind: UnitKind) -> Reducer {
    match kind {
        UnitKind::Throughput | UnitKind::Efficiency => Reducer::Sum,
        UnitKind::BufferUnderrun => Reducer::Min,
        UnitKind::BufferLevel | UnitKind::SegmentSize | UnitKind::QualityLevel => Reducer::Mean,
    }
}
