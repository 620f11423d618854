//! # 内核同步原语模块（sync）
//!
//! ## Overview
//! 本模块是所有阻塞式同步原语的统一入口：
//! - `semaphore`：计数型信号量
//! - `lock`：带持有者记录的互斥锁
//! - `condvar`：条件变量
//! - `table`：按整数句柄管理上述对象的资源表
//! - `up`：单处理器环境下的内部可变性与中断屏蔽封装
//!
//! ## Assumptions
//! - 系统运行在单处理器环境
//! - 所有同步原语都依赖 `UPIntrFreeCell` 提供的屏蔽中断互斥语义
//!
//! ## Invariants
//! - 内部状态仅能通过受控接口访问
//! - 睡眠之前必须已经归还 `UPIntrFreeCell` 的借用
//! - 睡眠的唯一位置是 `Semaphore::down`、`Lock::acquire` 与 `Condvar::wait`

mod condvar;
mod lock;
mod semaphore;
mod table;
mod up;

pub use condvar::Condvar;
pub use lock::Lock;
pub use semaphore::Semaphore;
pub use table::SyncTable;
pub use up::{UPIntrFreeCell, UPIntrRefMut};

use alloc::string::String;

use crate::error::SyncResult;

/// 复制一份诊断用名字，内存不足时返回错误而不是中止
fn dup_name(name: &str) -> SyncResult<String> {
    let mut dup = String::new();
    dup.try_reserve_exact(name.len())?;
    dup.push_str(name);
    Ok(dup)
}
