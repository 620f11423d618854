//! # 条件变量（Condvar）同步原语模块
//!
//! ## Overview
//! 条件变量本身 **不保存条件状态**，只维护一个显式的 FIFO 等待队列
//! 和等待计数。具体条件判断需由使用者在互斥锁保护的临界区内完成。
//!
//! 与信号量 / 互斥锁“广播后各自重新检查”不同，`signal`
//! 每次只弹出队首线程并定向唤醒它，因此：
//! - 先 `wait` 的线程一定先被唤醒
//! - 每次 `signal` 恰好让一个等待者前进
//!
//! ## Assumptions
//! - 每个操作都与调用者持有的 `Lock` 配对使用
//! - 每个线程只会睡眠在自己的 `WaitChannel::Thread` 上
//!
//! ## Invariants
//! - 静止时 `waiting == wait_queue.len()`
//! - 线程只在“自己的 `wait` 挂起”到“被 `signal` 弹出”之间出现在队列中
//!
//! ## Behavior
//! - `wait` 严格遵循“释放锁、入队、睡眠，被唤醒后重新加锁”，
//!   其中前三步在同一段屏蔽中断区间内完成，`signal` 不会丢失

use alloc::collections::VecDeque;
use alloc::string::String;

use log::{debug, trace};

use super::{dup_name, Lock, UPIntrFreeCell};
use crate::config::CONDVAR_QUEUE_INIT_CAPACITY;
use crate::error::SyncResult;
use crate::hal::IntrGuard;
use crate::task::{self, ThreadId, WaitChannel};

/// 条件变量
pub struct Condvar {
    name: String,
    inner: UPIntrFreeCell<CondvarInner>,
}

/// 条件变量的内部状态
///
/// ## Fields
/// - `waiting`：正在等待的线程数
/// - `wait_queue`：等待线程的标识，按 `wait` 的先后排列
pub struct CondvarInner {
    waiting: usize,
    wait_queue: VecDeque<ThreadId>,
}

impl CondvarInner {
    /// 把 `tid` 排到队尾
    ///
    /// ## Panics
    /// - 为新等待者预留队列空间失败。`wait` 无法向调用者返回错误，
    ///   因此这里的内存不足视为致命错误
    fn enqueue(&mut self, tid: ThreadId, name: &str) {
        let needed = (self.waiting + 1).saturating_sub(self.wait_queue.len());
        if self.wait_queue.try_reserve(needed).is_err() {
            panic!("condvar {}: out of memory queuing {}", name, tid);
        }
        self.waiting += 1;
        self.wait_queue.push_back(tid);
    }
}

impl Condvar {
    /// 创建一个新的条件变量
    ///
    /// ## Invariants
    /// - 初始状态下等待队列为空
    pub fn new(name: &str) -> SyncResult<Self> {
        let name = dup_name(name)?;
        let mut wait_queue = VecDeque::new();
        wait_queue.try_reserve(CONDVAR_QUEUE_INIT_CAPACITY)?;
        trace!("condvar {} created", name);
        Ok(Self {
            name,
            inner: unsafe {
                UPIntrFreeCell::new(CondvarInner {
                    waiting: 0,
                    wait_queue,
                })
            },
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn waiting_count(&self) -> usize {
        self.inner.exclusive_access().waiting
    }

    fn assert_paired(&self, lock: &Lock, op: &str) {
        assert!(
            lock.held_by_current(),
            "condvar {}: {}() without holding lock {}",
            self.name,
            op,
            lock.name()
        );
    }

    /// 在条件变量上等待
    ///
    /// ## Behavior
    /// 1. 释放 `lock`
    /// 2. 加入等待队列
    /// 3. 睡眠，直到被 `signal` / `broadcast` 从队列中取出
    /// 4. 重新获取 `lock`（可能因普通的锁竞争再次睡眠）
    ///
    /// ## Panics
    /// - 调用者未持有 `lock`
    /// - 在中断处理程序中调用
    pub fn wait(&self, lock: &Lock) {
        self.assert_paired(lock, "wait");
        assert!(
            !task::in_interrupt(),
            "condvar {}: wait() called from an interrupt handler",
            self.name
        );
        let me = task::current_thread();
        let intr = IntrGuard::new();

        lock.release();
        self.inner.exclusive_session(|inner| inner.enqueue(me, &self.name));
        debug!("condvar {}: {} waiting", self.name, me);

        // 平台的唤醒只是提示：仍在队列里说明还没轮到自己
        while self
            .inner
            .exclusive_session(|inner| inner.wait_queue.contains(&me))
        {
            task::sleep_on(&intr, WaitChannel::Thread(me));
        }

        lock.acquire();
        drop(intr);
    }

    /// 唤醒等待时间最长的一个线程
    ///
    /// ## Behavior
    /// - 无人等待时什么也不做，不会为将来的 `wait` 留下信号
    ///
    /// ## Panics
    /// - 调用者未持有 `lock`
    pub fn signal(&self, lock: &Lock) {
        self.assert_paired(lock, "signal");
        self.signal_one();
    }

    /// 依次唤醒所有等待者，顺序与 `wait` 的先后一致
    ///
    /// ## Panics
    /// - 调用者未持有 `lock`
    pub fn broadcast(&self, lock: &Lock) {
        self.assert_paired(lock, "broadcast");
        let _intr = IntrGuard::new();
        while self.waiting_count() > 0 {
            self.signal_one();
        }
        let inner = self.inner.exclusive_access();
        assert!(
            inner.wait_queue.is_empty(),
            "condvar {}: queue not drained by broadcast",
            self.name
        );
    }

    fn signal_one(&self) {
        let mut inner = self.inner.exclusive_access();
        if inner.waiting == 0 {
            return;
        }
        inner.waiting -= 1;
        let next = inner.wait_queue.pop_front().unwrap_or_else(|| {
            panic!("condvar {}: waiting count disagrees with queue", self.name)
        });
        task::wakeup_thread(next);
    }

    /// 销毁条件变量
    ///
    /// ## Panics
    /// - 仍有线程在等待
    pub fn destroy(self) {
        drop(self);
    }

    pub(crate) fn assert_idle(&self) {
        let inner = self.inner.exclusive_access();
        assert!(
            inner.waiting == 0 && inner.wait_queue.is_empty(),
            "condvar {}: destroyed with {} waiter(s)",
            self.name,
            inner.waiting
        );
    }
}

impl Drop for Condvar {
    fn drop(&mut self) {
        let inner = self.inner.get_mut();
        assert!(
            inner.waiting == 0 && inner.wait_queue.is_empty(),
            "condvar {}: destroyed with {} waiter(s)",
            self.name,
            inner.waiting
        );
        trace!("condvar {} destroyed", self.name);
    }
}
