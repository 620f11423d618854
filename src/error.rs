//! 同步原语的可恢复错误类型
//!
//! 只有“创建时资源耗尽”属于可恢复错误；
//! 其余契约违反一律 panic，不会出现在这里。

use alloc::collections::TryReserveError;
use core::fmt;

/// 同步对象创建失败的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncError {
    /// 分配名字、等待队列或句柄槽位时内存不足
    OutOfMemory,
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::OutOfMemory => write!(f, "out of memory"),
        }
    }
}

impl From<TryReserveError> for SyncError {
    fn from(_: TryReserveError) -> Self {
        SyncError::OutOfMemory
    }
}

pub type SyncResult<T> = Result<T, SyncError>;
