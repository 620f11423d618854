//! 中断屏蔽守卫

use core::marker::PhantomData;

use super::platform;

/// 中断屏蔽的 RAII 守卫
///
/// ## Overview
/// - 构造时屏蔽中断并记住之前的级别
/// - Drop 时恢复该级别
///
/// ## Invariants
/// - 生命周期内：中断始终被屏蔽（`sleep_on` 挂起期间除外）
/// - 守卫按作用域嵌套，恢复顺序与屏蔽顺序相反
/// - 不能跨执行上下文转移（`!Send`）
pub struct IntrGuard {
    token: usize,
    _not_send: PhantomData<*const ()>,
}

impl IntrGuard {
    pub fn new() -> Self {
        Self {
            token: platform().mask_interrupts(),
            _not_send: PhantomData,
        }
    }
}

impl Drop for IntrGuard {
    fn drop(&mut self) {
        platform().restore_interrupts(self.token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;

    #[test]
    fn test_guards_nest() {
        testutil::init();
        let outer = IntrGuard::new();
        assert_eq!(outer.token, 0);
        {
            let inner = IntrGuard::new();
            assert_eq!(inner.token, 1);
        }
        let again = IntrGuard::new();
        assert_eq!(again.token, 1);
        drop(again);
        drop(outer);
        assert_eq!(IntrGuard::new().token, 0);
    }
}
