//! 宿主机上的单处理器模拟平台，仅用于单元测试
//!
//! 每个 std 线程扮演一个内核线程。“屏蔽中断”即取得唯一的模拟 CPU，
//! 同一线程可以嵌套屏蔽；`sleep_on` 在睡眠期间交出 CPU，
//! 被唤醒后要等 CPU 空闲才能继续执行。

use std::cell::Cell;
use std::string::String;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Condvar as StdCondvar, Mutex as StdMutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};
use std::vec::Vec;

use lazy_static::lazy_static;

use crate::hal::{self, Platform};
use crate::task::{ThreadId, WaitChannel};

struct CpuState {
    owner: Option<ThreadId>,
    sleepers: Vec<(ThreadId, WaitChannel)>,
}

pub struct HostPlatform {
    cpu: StdMutex<CpuState>,
    cpu_changed: StdCondvar,
    console: StdMutex<String>,
    wake_log: StdMutex<Vec<WaitChannel>>,
}

static NEXT_TID: AtomicUsize = AtomicUsize::new(1);

thread_local! {
    static CURRENT: ThreadId = ThreadId::new(NEXT_TID.fetch_add(1, Ordering::Relaxed));
    static DEPTH: Cell<usize> = Cell::new(0);
    static IN_INTERRUPT: Cell<bool> = Cell::new(false);
}

lazy_static! {
    static ref HOST: HostPlatform = HostPlatform {
        cpu: StdMutex::new(CpuState {
            owner: None,
            sleepers: Vec::new(),
        }),
        cpu_changed: StdCondvar::new(),
        console: StdMutex::new(String::new()),
        wake_log: StdMutex::new(Vec::new()),
    };
}

fn current() -> ThreadId {
    CURRENT.with(|t| *t)
}

impl HostPlatform {
    fn state(&self) -> MutexGuard<'_, CpuState> {
        self.cpu.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn wait<'a>(&self, guard: MutexGuard<'a, CpuState>) -> MutexGuard<'a, CpuState> {
        self.cpu_changed
            .wait(guard)
            .unwrap_or_else(|e| e.into_inner())
    }
}

impl Platform for HostPlatform {
    fn mask_interrupts(&self) -> usize {
        let depth = DEPTH.with(|d| d.get());
        if depth == 0 {
            let me = current();
            let mut cpu = self.state();
            while cpu.owner.is_some() {
                cpu = self.wait(cpu);
            }
            cpu.owner = Some(me);
        }
        DEPTH.with(|d| d.set(depth + 1));
        depth
    }

    fn restore_interrupts(&self, token: usize) {
        let depth = DEPTH.with(|d| d.get());
        assert_eq!(depth, token + 1, "interrupt levels restored out of order");
        DEPTH.with(|d| d.set(token));
        if token == 0 {
            self.state().owner = None;
            self.cpu_changed.notify_all();
        }
    }

    fn sleep_on(&self, chan: WaitChannel) {
        let me = current();
        assert!(DEPTH.with(|d| d.get()) > 0, "sleep_on with interrupts enabled");
        let mut cpu = self.state();
        assert_eq!(cpu.owner, Some(me));
        cpu.sleepers.push((me, chan));
        cpu.owner = None;
        self.cpu_changed.notify_all();
        while cpu.owner.is_some() || cpu.sleepers.iter().any(|(t, _)| *t == me) {
            cpu = self.wait(cpu);
        }
        cpu.owner = Some(me);
    }

    fn wake_one(&self, chan: WaitChannel) {
        self.wake_log
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(chan);
        let mut cpu = self.state();
        if let Some(pos) = cpu.sleepers.iter().position(|(_, c)| *c == chan) {
            cpu.sleepers.remove(pos);
        }
        self.cpu_changed.notify_all();
    }

    fn wake_all(&self, chan: WaitChannel) {
        self.state().sleepers.retain(|(_, c)| *c != chan);
        self.cpu_changed.notify_all();
    }

    fn has_sleepers(&self, chan: WaitChannel) -> bool {
        self.state().sleepers.iter().any(|(_, c)| *c == chan)
    }

    fn current_thread(&self) -> ThreadId {
        current()
    }

    fn in_interrupt(&self) -> bool {
        IN_INTERRUPT.with(|f| f.get())
    }

    fn console_write(&self, s: &str) {
        self.console
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_str(s);
    }
}

/// 注册宿主平台，可重复调用
pub fn init() {
    hal::init(&*HOST);
}

/// 睡眠在 `chan` 上的线程数
pub fn sleeping_on(chan: WaitChannel) -> usize {
    HOST.state().sleepers.iter().filter(|(_, c)| *c == chan).count()
}

/// `wake_one` 依次唤醒过的线程中属于 `tids` 的那些，按唤醒先后排列
pub fn wake_log_for(tids: &[ThreadId]) -> Vec<ThreadId> {
    HOST.wake_log
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .iter()
        .filter_map(|chan| match chan {
            WaitChannel::Thread(tid) if tids.contains(tid) => Some(*tid),
            _ => None,
        })
        .collect()
}

pub fn console_output() -> String {
    HOST.console.lock().unwrap_or_else(|e| e.into_inner()).clone()
}

/// 以“中断处理程序”的身份运行 `f`
pub fn as_interrupt<R>(f: impl FnOnce() -> R) -> R {
    IN_INTERRUPT.with(|flag| flag.set(true));
    let r = f();
    IN_INTERRUPT.with(|flag| flag.set(false));
    r
}

/// 轮询直到 `cond` 成立，超时则 panic
pub fn wait_until(mut cond: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while !cond() {
        assert!(Instant::now() < deadline, "condition not reached in time");
        thread::sleep(Duration::from_millis(1));
    }
}
