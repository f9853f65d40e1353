//! 实时表情 / 注意力分析核心
//!
//! - `features`: 关键点 → 几何特征
//! - `classifier`: 有序规则情绪分类
//! - `attention`: 上游专注状态归一化
//! - `history`: 去重的最近状态历史
//! - `alert`: 告警策略
//! - `session`: 会话生命周期状态机
//! - `engine`: 多会话注册表、事件广播与归档

pub mod alert;
pub mod attention;
pub mod classifier;
pub mod engine;
pub mod features;
pub mod history;
pub mod metrics;
pub mod session;
pub mod types;

pub use engine::AffectEngine;
pub use history::HistoryBuffer;
pub use session::{SessionController, SessionSettings, StatusSnapshot};
