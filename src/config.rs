//! 编译期配置

use log::LevelFilter;

/// 条件变量创建时为等待队列预留的槽位数
pub const CONDVAR_QUEUE_INIT_CAPACITY: usize = 1;

/// `SyncTable` 每类对象列表的初始容量
pub const TABLE_INIT_CAPACITY: usize = 4;

/// 将 `LOG` 环境变量的取值解析为日志级别
///
/// ## Behavior
/// - 识别 `error` / `warn` / `info` / `debug` / `trace`
/// - 未设置或无法识别时关闭日志
pub fn log_level(env: Option<&str>) -> LevelFilter {
    match env {
        Some("error") => LevelFilter::Error,
        Some("warn") => LevelFilter::Warn,
        Some("info") => LevelFilter::Info,
        Some("debug") => LevelFilter::Debug,
        Some("trace") => LevelFilter::Trace,
        _ => LevelFilter::Off,
    }
}
