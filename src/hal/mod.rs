//! # 平台抽象层（hal）
//!
//! ## Overview
//! 本模块定义了同步原语对外部调度器 / 中断控制器的 **全部依赖**，
//! 以 `Platform` trait 的形式给出。内核在启动早期调用 `init`
//! 注册自己的实现，之后所有原语都通过 `platform()` 访问它。
//!
//! ## Assumptions
//! - 单处理器：`mask_interrupts` 之后没有任何其他上下文可以运行
//! - `sleep_on` 只能在中断屏蔽期间调用，挂起时原子地放弃屏蔽，
//!   恢复执行时屏蔽状态与挂起前一致
//!
//! ## Invariants
//! - 平台对象一经注册便不可替换

mod intr;

pub use intr::IntrGuard;

use crate::task::{ThreadId, WaitChannel};
use spin::Once;

/// 调度器与中断控制器提供给同步原语的窄接口
pub trait Platform: Send + Sync {
    /// 屏蔽当前处理器上的中断，返回屏蔽前的级别
    fn mask_interrupts(&self) -> usize;

    /// 恢复到 `mask_interrupts` 返回的级别
    fn restore_interrupts(&self, token: usize);

    /// 让当前上下文在 `chan` 上睡眠，直到被唤醒
    ///
    /// ## Safety
    /// - 调用时中断必须处于屏蔽状态
    fn sleep_on(&self, chan: WaitChannel);

    /// 唤醒一个睡眠在 `chan` 上的上下文
    fn wake_one(&self, chan: WaitChannel);

    /// 唤醒所有睡眠在 `chan` 上的上下文
    fn wake_all(&self, chan: WaitChannel);

    /// 是否有上下文正睡眠在 `chan` 上
    fn has_sleepers(&self, chan: WaitChannel) -> bool;

    /// 当前执行上下文的标识
    fn current_thread(&self) -> ThreadId;

    /// 当前是否处于中断处理程序中
    fn in_interrupt(&self) -> bool;

    /// 日志输出
    fn console_write(&self, _s: &str) {}
}

static PLATFORM: Once<&'static dyn Platform> = Once::new();

/// 注册平台实现
///
/// ## Behavior
/// - 只有第一次调用生效，之后的调用被忽略
pub fn init(platform: &'static dyn Platform) {
    PLATFORM.call_once(|| platform);
}

/// 获取已注册的平台
///
/// ## Panics
/// - 尚未调用 `init` 时直接 panic
pub fn platform() -> &'static dyn Platform {
    *PLATFORM
        .get()
        .expect("synch: no platform registered, call hal::init first")
}

/// 获取已注册的平台，尚未注册时返回 `None`
pub fn try_platform() -> Option<&'static dyn Platform> {
    PLATFORM.get().copied()
}
