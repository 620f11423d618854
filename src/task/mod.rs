//! # 执行上下文与睡眠 / 唤醒接口
//!
//! ## Overview
//! 同步原语看到的“线程”只有两样东西：
//! - `ThreadId`：用于记录锁的持有者、排入条件变量的等待队列
//! - `WaitChannel`：睡眠与唤醒时使用的等待键
//!
//! 本模块把 `hal::Platform` 的调度相关接口包装成自由函数，
//! 其中 `sleep_on` 要求调用者出示一个 `IntrGuard`，
//! 以类型的方式保证“只能在屏蔽中断期间睡眠”。

use core::fmt;
use core::sync::atomic::{AtomicUsize, Ordering};

use log::debug;

use crate::hal::{platform, IntrGuard};

/// 执行上下文的标识，在该上下文存活期间保持不变
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ThreadId(usize);

impl ThreadId {
    pub const fn new(raw: usize) -> Self {
        Self(raw)
    }

    pub const fn as_usize(self) -> usize {
        self.0
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

/// 睡眠 / 唤醒使用的等待键
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WaitChannel {
    /// 某个同步对象
    Object(usize),
    /// 某个特定线程，用于定向唤醒
    Thread(ThreadId),
}

static NEXT_OBJECT_ID: AtomicUsize = AtomicUsize::new(1);

/// 为新建的同步对象分配一个独占的等待通道
pub fn alloc_channel() -> WaitChannel {
    WaitChannel::Object(NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed))
}

pub fn current_thread() -> ThreadId {
    platform().current_thread()
}

pub fn in_interrupt() -> bool {
    platform().in_interrupt()
}

/// 在 `chan` 上睡眠
///
/// ## Behavior
/// - 挂起期间中断屏蔽被原子地放弃，返回时已重新屏蔽
/// - 被唤醒只是一个提示，调用者必须重新检查自己等待的条件
pub fn sleep_on(_intr: &IntrGuard, chan: WaitChannel) {
    platform().sleep_on(chan);
}

/// 唤醒所有睡眠在 `chan` 上的上下文
pub fn wakeup_all(chan: WaitChannel) {
    debug!("wakeup all on {:?}", chan);
    platform().wake_all(chan);
}

/// 定向唤醒某个线程
///
/// 每个线程只会睡眠在自己的 `WaitChannel::Thread` 上，
/// 因此这里最多唤醒一个上下文。
pub fn wakeup_thread(tid: ThreadId) {
    debug!("wakeup {}", tid);
    platform().wake_one(WaitChannel::Thread(tid));
}

pub fn has_sleepers(chan: WaitChannel) -> bool {
    platform().has_sleepers(chan)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channels_are_unique() {
        let a = alloc_channel();
        let b = alloc_channel();
        assert_ne!(a, b);
        assert_ne!(a, WaitChannel::Thread(ThreadId::new(1)));
    }

    #[test]
    fn test_wakeups_are_logged_at_debug() {
        crate::testutil::init();
        let _ = crate::console::init();
        let tid = ThreadId::new(usize::MAX - 7);
        let chan = alloc_channel();
        crate::testutil::wait_until(|| {
            log::set_max_level(log::LevelFilter::Debug);
            {
                let _intr = IntrGuard::new();
                wakeup_thread(tid);
                wakeup_all(chan);
            }
            let out = crate::testutil::console_output();
            out.contains("[DEBUG]")
                && out.contains(&alloc::format!("wakeup {}", tid))
                && out.contains(&alloc::format!("wakeup all on {:?}", chan))
        });
    }

    #[test]
    fn test_thread_id_display() {
        assert_eq!(alloc::format!("{}", ThreadId::new(7)), "T7");
    }
}
