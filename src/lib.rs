//! # 单处理器内核阻塞式同步原语库（synch）
//!
//! ## Overview
//! 本库实现了内核线程层的三种 **阻塞式同步原语**：
//! - `Semaphore`：计数型信号量（P / V）
//! - `Lock`：带持有者记录的互斥锁
//! - `Condvar`：必须与 `Lock` 配合使用的条件变量（严格 FIFO 唤醒）
//!
//! 以及一个按进程管理同步对象句柄的 `SyncTable`。
//!
//! 调度器本身不在本库之内：内核在启动时通过 `hal::init`
//! 注册一个实现了 `hal::Platform` 的对象，本库只使用其中的
//! “屏蔽 / 恢复中断” 与 “在等待通道上睡眠 / 唤醒” 两类机制。
//!
//! ## Assumptions
//! - 系统运行在单处理器环境
//! - 屏蔽中断后，任何其他执行上下文（包括中断处理程序）都不会运行
//! - `sleep_on` 在挂起时原子地放弃中断屏蔽，恢复执行时重新获得
//!
//! ## Behavior
//! - 资源耗尽（创建时分配失败）以 `SyncError` 返回
//! - 其余所有误用（销毁仍在使用的对象、非持有者释放锁、在中断中阻塞等）
//!   均视为内核 bug，直接 panic

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod config;
pub mod console;
pub mod error;
pub mod hal;
pub mod sync;
pub mod task;

#[cfg(test)]
mod testutil;

pub use error::{SyncError, SyncResult};
pub use sync::{Condvar, Lock, Semaphore, SyncTable};
