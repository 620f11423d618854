//! # 信号量（Semaphore）同步原语模块
//!
//! ## Overview
//! 本模块实现了内核中的 **计数型信号量（Counting Semaphore）**，
//! 支持典型的 `P / V`（`down / up`）操作语义。
//!
//! 与“计数可为负、按队列逐个交接”的实现不同，这里的等待者不排队：
//! `up` 唤醒所有睡眠在该信号量上的上下文，被唤醒者在循环中
//! 重新检查计数，谁先检查到 `count > 0` 谁就拿走这一个单位。
//!
//! ## Assumptions
//! - 系统运行在单处理器环境下
//! - `UPIntrFreeCell` 能通过屏蔽中断保证临界区互斥
//!
//! ## Invariants
//! - `count >= 0`（由 `usize` 保证）
//! - `count == 初始值 + 已完成的 up 次数 - 已完成的 down 次数`
//! - 唤醒只是提示，不代表一定有可用单位
//!
//! ## Behavior
//! - `down`：若 `count == 0` 则睡眠，醒来后重新检查
//! - `up`：`count += 1`，然后唤醒全部等待者

use alloc::string::String;

use log::{debug, trace};

use super::{dup_name, UPIntrFreeCell};
use crate::error::SyncResult;
use crate::hal::{try_platform, IntrGuard, Platform};
use crate::task::{self, WaitChannel};

/// 信号量类型
pub struct Semaphore {
    name: String,
    chan: WaitChannel,
    inner: UPIntrFreeCell<SemaphoreInner>,
}

/// 信号量的内部状态
///
/// ## Fields
/// - `count`：当前可用资源计数
pub struct SemaphoreInner {
    count: usize,
}

impl Semaphore {
    /// 创建一个新的信号量
    ///
    /// ## Parameters
    /// - `name`：诊断用名字，会被复制一份
    /// - `res_count`：初始可用资源数量
    ///
    /// ## Errors
    /// - 复制名字时内存不足返回 `SyncError::OutOfMemory`
    pub fn new(name: &str, res_count: usize) -> SyncResult<Self> {
        let name = dup_name(name)?;
        trace!("semaphore {} created, count = {}", name, res_count);
        Ok(Self {
            name,
            chan: task::alloc_channel(),
            inner: unsafe { UPIntrFreeCell::new(SemaphoreInner { count: res_count }) },
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 当前可用资源数（只是一个快照）
    pub fn count(&self) -> usize {
        self.inner.exclusive_access().count
    }

    pub(crate) fn channel(&self) -> WaitChannel {
        self.chan
    }

    /// 执行 P 操作（down）
    ///
    /// ## Panics
    /// - 在中断处理程序中调用。即使此刻无需阻塞也会检查，
    ///   保证误用总能尽早暴露
    pub fn down(&self) {
        assert!(
            !task::in_interrupt(),
            "semaphore {}: down() called from an interrupt handler",
            self.name
        );
        let intr = IntrGuard::new();
        loop {
            {
                let mut inner = self.inner.exclusive_access();
                if inner.count > 0 {
                    inner.count -= 1;
                    break;
                }
            }
            debug!("semaphore {}: {} sleeping", self.name, task::current_thread());
            task::sleep_on(&intr, self.chan);
        }
    }

    /// 执行 V 操作（up）
    ///
    /// ## Behavior
    /// - 增加资源计数
    /// - 唤醒所有等待者，由它们重新竞争
    ///
    /// ## Panics
    /// - 计数溢出
    pub fn up(&self) {
        let mut inner = self.inner.exclusive_access();
        inner.count = inner
            .count
            .checked_add(1)
            .unwrap_or_else(|| panic!("semaphore {}: count overflow", self.name));
        task::wakeup_all(self.chan);
    }

    /// 销毁信号量
    ///
    /// ## Panics
    /// - 仍有上下文阻塞在 `down` 中
    pub fn destroy(self) {
        drop(self);
    }

    pub(crate) fn assert_no_sleepers(&self) {
        self.assert_no_sleepers_on(try_platform());
    }

    /// 尚未注册平台时没有任何上下文能够睡眠，跳过检查
    fn assert_no_sleepers_on(&self, platform: Option<&dyn Platform>) {
        let Some(platform) = platform else {
            return;
        };
        let token = platform.mask_interrupts();
        let busy = platform.has_sleepers(self.chan);
        platform.restore_interrupts(token);
        assert!(
            !busy,
            "semaphore {}: destroyed while contexts are blocked on it",
            self.name
        );
    }
}

/// 这里的检查与释放之间存在一个很窄的窗口：
/// 有上下文可能恰好在检查之后开始等待。这样的调用者本身就在误用接口，
/// 需要完全关闭这个窗口时应通过 `SyncTable` 的引用计数来管理生命周期。
impl Drop for Semaphore {
    fn drop(&mut self) {
        self.assert_no_sleepers();
        trace!("semaphore {} destroyed", self.name);
    }
}
