/// 默认历史记录条数（前端展示最近 5 条）
pub const DEFAULT_HISTORY_CAPACITY: usize = 5;

/// 历史记录条数上限
pub const MAX_HISTORY_CAPACITY: usize = 100;

/// 默认告警持续阈值：连续多少次异常观测后才进入 Warning
pub const DEFAULT_ALERT_SUSTAIN: u32 = 1;

/// 默认最大并发会话数
pub const DEFAULT_MAX_SESSIONS: usize = 64;

/// 默认 SSE 最大连接数
pub const DEFAULT_MAX_SSE_CONNECTIONS: usize = 100;

/// 会话归档记录默认保留天数
pub const DEFAULT_RECORD_RETENTION_DAYS: i64 = 30;

/// 未在使用中的会话（Idle / Starting / Failed）无活动超过此时长（分钟）后被清理
pub const STALE_SESSION_MINUTES: i64 = 60;

/// 会话事件广播通道容量
pub const SESSION_EVENT_CHANNEL_CAPACITY: usize = 256;

/// 归档列表默认分页大小
pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// 归档列表最大分页大小
pub const MAX_PAGE_SIZE: u64 = 100;

/// 故障原因最大长度（字符）
pub const MAX_REASON_LEN: usize = 512;
