//! 日志文件读取
//!
//! 客户端日志是以 `;` 分隔、带表头的文本，仿真运行期间不断追加。
//! 这里负责增量读取、实体名解析、输出文件发现以及事件日志（瓶颈带宽变更）的读取。

mod discover;
mod entity;
mod event_log;
mod reader;

pub use discover::{discover_outputs, sim_ids};
pub use entity::EntityId;
pub use event_log::{BottleneckSchedule, RateChange, event_log_path, read_event_log};
pub use reader::{LogChunk, Watermark, read_new_rows};

/// 日志字段分隔符
pub const DELIMITER: u8 = b';';
