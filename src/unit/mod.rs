//! 指标单元（unit）配置
//!
//! 每种指标（缓冲区水位、吞吐量、分片大小……）都有固定的抽取/重采样方式：
//! 从哪一列取时间、从哪一列取值、时间单位、是否按 1 秒窗口重采样以及采用的归约方式。

mod descriptor;
mod kind;
mod table;

pub use descriptor::{DisplayHints, Reducer, TimeUnit, UnitDescriptor};
pub use kind::UnitKind;
pub use table::{UnitDescriptorSpec, UnitTable, UnitTableSpec};

/// 字节 -> kbit：`x * 8 * 0.001`
pub const BYTES_TO_KILOBITS: f64 = 8.0 * 0.001;
