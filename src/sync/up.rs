//! # 单处理器中断屏蔽内部可变性封装
//!
//! ## Overview
//! `UPIntrFreeCell` 是所有同步原语保存私有状态的容器：
//! 访问前先屏蔽中断，再通过 `RefCell` 获得可变借用。
//! 在单处理器上，屏蔽中断即可让这段访问对其他所有上下文表现为原子操作。
//!
//! ## Assumptions
//! - 系统运行在单核处理器环境中
//! - 屏蔽中断可以提供足够的互斥保证
//!
//! ## Safety
//! - `unsafe impl Sync` 的正确性完全依赖“单处理器 + 中断屏蔽”这一前提
//! - 借用绝不能跨越 `sleep_on`：睡眠会放弃中断屏蔽，
//!   此时其他上下文再次借用将触发 `RefCell` 的借用冲突 panic
//!
//! ## Invariants
//! - 若某个 `UPIntrFreeCell` 处于可变借用状态，则中断必然被屏蔽
//! - `UPIntrRefMut` 先归还借用，再恢复中断

use core::cell::{RefCell, RefMut};
use core::ops::{Deref, DerefMut};

use crate::hal::IntrGuard;

/// 在访问期间自动屏蔽中断的 UP 内部可变性封装
pub struct UPIntrFreeCell<T> {
    inner: RefCell<T>,
}

unsafe impl<T> Sync for UPIntrFreeCell<T> {}

unsafe impl<T> Send for UPIntrFreeCell<T> {}

/// `UPIntrFreeCell` 的可变借用守卫
///
/// 字段按声明顺序析构：先释放 `RefMut`，再恢复中断。
pub struct UPIntrRefMut<'a, T> {
    inner: RefMut<'a, T>,
    _intr: IntrGuard,
}

impl<T> UPIntrFreeCell<T> {
    /// ## Safety
    /// - 使用者需保证仅在 UP 环境下使用
    pub const unsafe fn new(value: T) -> Self {
        Self {
            inner: RefCell::new(value),
        }
    }

    /// 屏蔽中断并获取内部数据的独占访问权
    ///
    /// ## Behavior
    /// - 若发生借用冲突将 panic
    pub fn exclusive_access(&self) -> UPIntrRefMut<'_, T> {
        let intr = IntrGuard::new();
        UPIntrRefMut {
            inner: self.inner.borrow_mut(),
            _intr: intr,
        }
    }

    /// 在独占访问会话中执行闭包
    pub fn exclusive_session<F, V>(&self, f: F) -> V
    where
        F: FnOnce(&mut T) -> V,
    {
        let mut inner = self.exclusive_access();
        f(inner.deref_mut())
    }

    /// 已经独占 cell 时的直接访问，无需屏蔽中断
    pub fn get_mut(&mut self) -> &mut T {
        self.inner.get_mut()
    }
}

impl<'a, T> Deref for UPIntrRefMut<'a, T> {
    type Target = T;
    fn deref(&self) -> &Self::Target {
        self.inner.deref()
    }
}

impl<'a, T> DerefMut for UPIntrRefMut<'a, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.inner.deref_mut()
    }
}
