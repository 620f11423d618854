//! # 互斥锁（Lock）同步原语模块
//!
//! ## Overview
//! 带持有者记录的阻塞式互斥锁。它不建立在 `Semaphore` 之上，
//! 而是直接用同样的两种机制实现：屏蔽中断 + 在等待通道上睡眠。
//!
//! ## Assumptions
//! - 系统运行在单处理器环境下
//! - 当前执行上下文的 `ThreadId` 在其存活期间不变
//!
//! ## Invariants
//! - `owner.is_some()` 当且仅当锁被持有
//! - `owner` 一定是最近一次成功 `acquire` 且尚未 `release` 的线程
//! - 同一线程的 `acquire` 次数与 `release` 次数严格配对：
//!   持有者再次 `acquire` 直接 panic，而不是悄悄成功
//!
//! ## Behavior
//! - `acquire`：被他人持有时睡眠，醒来后重新检查
//! - `release`：清空持有者并唤醒全部等待者，不保证公平

use alloc::string::String;

use log::{debug, trace};

use super::{dup_name, UPIntrFreeCell};
use crate::error::SyncResult;
use crate::hal::IntrGuard;
use crate::task::{self, ThreadId, WaitChannel};

/// 阻塞式互斥锁
pub struct Lock {
    name: String,
    chan: WaitChannel,
    inner: UPIntrFreeCell<LockInner>,
}

pub struct LockInner {
    owner: Option<ThreadId>,
}

impl Lock {
    /// 创建一个未被持有的锁
    pub fn new(name: &str) -> SyncResult<Self> {
        let name = dup_name(name)?;
        trace!("lock {} created", name);
        Ok(Self {
            name,
            chan: task::alloc_channel(),
            inner: unsafe { UPIntrFreeCell::new(LockInner { owner: None }) },
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn channel(&self) -> WaitChannel {
        self.chan
    }

    /// 获取锁
    ///
    /// ## Panics
    /// - 在中断处理程序中调用
    /// - 当前线程已经持有该锁
    pub fn acquire(&self) {
        assert!(
            !task::in_interrupt(),
            "lock {}: acquire() called from an interrupt handler",
            self.name
        );
        let me = task::current_thread();
        let intr = IntrGuard::new();
        loop {
            {
                let mut inner = self.inner.exclusive_access();
                let owner = inner.owner;
                match owner {
                    None => {
                        inner.owner = Some(me);
                        break;
                    }
                    Some(holder) if holder == me => {
                        panic!("lock {}: {} acquiring a lock it already holds", self.name, me)
                    }
                    Some(_) => {}
                }
            }
            debug!("lock {}: {} sleeping", self.name, me);
            task::sleep_on(&intr, self.chan);
        }
    }

    /// 释放锁
    ///
    /// ## Panics
    /// - 调用者不是当前持有者
    pub fn release(&self) {
        let me = task::current_thread();
        let mut inner = self.inner.exclusive_access();
        assert!(
            inner.owner == Some(me),
            "lock {}: released by {} but held by {:?}",
            self.name,
            me,
            inner.owner
        );
        inner.owner = None;
        task::wakeup_all(self.chan);
    }

    /// 当前线程是否持有该锁
    pub fn held_by_current(&self) -> bool {
        let me = task::current_thread();
        self.inner.exclusive_access().owner == Some(me)
    }

    /// 是否被任意线程持有
    pub fn is_held(&self) -> bool {
        self.inner.exclusive_access().owner.is_some()
    }

    /// 销毁锁
    ///
    /// ## Panics
    /// - 锁仍被持有
    pub fn destroy(self) {
        drop(self);
    }

    pub(crate) fn assert_idle(&self) {
        let inner = self.inner.exclusive_access();
        assert!(
            inner.owner.is_none(),
            "lock {}: destroyed while held by {:?}",
            self.name,
            inner.owner
        );
    }
}

impl Drop for Lock {
    fn drop(&mut self) {
        let owner = self.inner.get_mut().owner;
        assert!(
            owner.is_none(),
            "lock {}: destroyed while held by {:?}",
            self.name,
            owner
        );
        trace!("lock {} destroyed", self.name);
    }
}
