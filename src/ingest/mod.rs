//! 增量摄取
//!
//! 轮询驱动：外部定时器每次触发一次 读取 -> 抽取 -> 重采样 -> 合并，
//! 派生序列始终等价于对全部原始行一次性处理的结果。

mod record;
mod session;

pub use record::EntityRecord;
pub use session::{IngestionSession, PollReport};
