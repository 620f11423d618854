//! # 同步对象资源表
//!
//! ## Overview
//! 内核向用户程序暴露同步原语时，通常以 **进程私有资源表** 的形式
//! 管理它们：每个进程维护独立的 semaphore / lock / condvar 列表，
//! 用户程序只拿到列表下标作为句柄。
//!
//! ## Safety
//! - 所有对表的访问都通过 `UPIntrFreeCell` 完成
//! - 在调用可能阻塞的操作（`down` / `acquire` / `wait`）前，
//!   先把对象的 `Arc` 克隆出来并归还表的借用，避免睡眠时仍借用着表
//!
//! ## Invariants
//! - 列表中 `Some(Arc<T>)` 表示已分配对象，`None` 表示可复用的空槽位
//! - 句柄越界或指向空槽位属于调用者 bug，直接 panic
//!
//! ## Behavior
//! - 创建时优先复用下标最小的空槽位
//! - `*_destroy` 先做对象自身的销毁检查再清空槽位；
//!   仍在途的使用者持有 `Arc`，对象在最后一个引用消失时才真正释放

use alloc::sync::Arc;
use alloc::vec::Vec;

use log::trace;

use super::{Condvar, Lock, Semaphore, UPIntrFreeCell};
use crate::config::TABLE_INIT_CAPACITY;
use crate::error::SyncResult;

/// 按句柄管理同步对象的资源表
pub struct SyncTable {
    inner: UPIntrFreeCell<SyncTableInner>,
}

struct SyncTableInner {
    semaphore_list: Vec<Option<Arc<Semaphore>>>,
    lock_list: Vec<Option<Arc<Lock>>>,
    condvar_list: Vec<Option<Arc<Condvar>>>,
}

/// 放入最小的空槽位，没有空槽位时追加
fn insert_slot<T>(list: &mut Vec<Option<T>>, item: T) -> SyncResult<usize> {
    if let Some(id) = list.iter().position(Option::is_none) {
        list[id] = Some(item);
        return Ok(id);
    }
    list.try_reserve(1)?;
    list.push(Some(item));
    Ok(list.len() - 1)
}

fn get_slot<T>(list: &[Option<Arc<T>>], kind: &str, id: usize) -> Arc<T> {
    match list.get(id) {
        Some(Some(item)) => Arc::clone(item),
        _ => panic!("invalid {} handle {}", kind, id),
    }
}

fn take_slot<T>(list: &mut [Option<Arc<T>>], kind: &str, id: usize) -> Arc<T> {
    match list.get_mut(id).and_then(Option::take) {
        Some(item) => item,
        None => panic!("invalid {} handle {}", kind, id),
    }
}

impl SyncTable {
    pub fn new() -> SyncResult<Self> {
        let mut inner = SyncTableInner {
            semaphore_list: Vec::new(),
            lock_list: Vec::new(),
            condvar_list: Vec::new(),
        };
        inner.semaphore_list.try_reserve(TABLE_INIT_CAPACITY)?;
        inner.lock_list.try_reserve(TABLE_INIT_CAPACITY)?;
        inner.condvar_list.try_reserve(TABLE_INIT_CAPACITY)?;
        Ok(Self {
            inner: unsafe { UPIntrFreeCell::new(inner) },
        })
    }

    fn semaphore(&self, id: usize) -> Arc<Semaphore> {
        get_slot(&self.inner.exclusive_access().semaphore_list, "semaphore", id)
    }

    fn lock(&self, id: usize) -> Arc<Lock> {
        get_slot(&self.inner.exclusive_access().lock_list, "lock", id)
    }

    fn condvar(&self, id: usize) -> Arc<Condvar> {
        get_slot(&self.inner.exclusive_access().condvar_list, "condvar", id)
    }

    /// 创建一个信号量，返回其句柄
    pub fn semaphore_create(&self, name: &str, res_count: usize) -> SyncResult<usize> {
        let sem = Arc::new(Semaphore::new(name, res_count)?);
        let id = insert_slot(&mut self.inner.exclusive_access().semaphore_list, sem)?;
        trace!("semaphore handle {} allocated", id);
        Ok(id)
    }

    pub fn semaphore_down(&self, sem_id: usize) {
        let sem = self.semaphore(sem_id);
        sem.down();
    }

    pub fn semaphore_up(&self, sem_id: usize) {
        self.semaphore(sem_id).up();
    }

    pub fn semaphore_count(&self, sem_id: usize) -> usize {
        self.semaphore(sem_id).count()
    }

    pub fn semaphore_destroy(&self, sem_id: usize) {
        let mut inner = self.inner.exclusive_access();
        get_slot(&inner.semaphore_list, "semaphore", sem_id).assert_no_sleepers();
        take_slot(&mut inner.semaphore_list, "semaphore", sem_id);
    }

    /// 创建一个互斥锁，返回其句柄
    pub fn lock_create(&self, name: &str) -> SyncResult<usize> {
        let lock = Arc::new(Lock::new(name)?);
        let id = insert_slot(&mut self.inner.exclusive_access().lock_list, lock)?;
        trace!("lock handle {} allocated", id);
        Ok(id)
    }

    pub fn lock_acquire(&self, lock_id: usize) {
        let lock = self.lock(lock_id);
        lock.acquire();
    }

    pub fn lock_release(&self, lock_id: usize) {
        self.lock(lock_id).release();
    }

    pub fn lock_held(&self, lock_id: usize) -> bool {
        self.lock(lock_id).held_by_current()
    }

    pub fn lock_destroy(&self, lock_id: usize) {
        let mut inner = self.inner.exclusive_access();
        get_slot(&inner.lock_list, "lock", lock_id).assert_idle();
        take_slot(&mut inner.lock_list, "lock", lock_id);
    }

    /// 创建一个条件变量，返回其句柄
    pub fn condvar_create(&self, name: &str) -> SyncResult<usize> {
        let condvar = Arc::new(Condvar::new(name)?);
        let id = insert_slot(&mut self.inner.exclusive_access().condvar_list, condvar)?;
        trace!("condvar handle {} allocated", id);
        Ok(id)
    }

    /// 在条件变量上等待，并释放 / 重新获取指定互斥锁
    pub fn condvar_wait(&self, condvar_id: usize, lock_id: usize) {
        let condvar = self.condvar(condvar_id);
        let lock = self.lock(lock_id);
        condvar.wait(&lock);
    }

    pub fn condvar_signal(&self, condvar_id: usize, lock_id: usize) {
        let condvar = self.condvar(condvar_id);
        let lock = self.lock(lock_id);
        condvar.signal(&lock);
    }

    pub fn condvar_broadcast(&self, condvar_id: usize, lock_id: usize) {
        let condvar = self.condvar(condvar_id);
        let lock = self.lock(lock_id);
        condvar.broadcast(&lock);
    }

    pub fn condvar_waiting(&self, condvar_id: usize) -> usize {
        self.condvar(condvar_id).waiting_count()
    }

    pub fn condvar_destroy(&self, condvar_id: usize) {
        let mut inner = self.inner.exclusive_access();
        get_slot(&inner.condvar_list, "condvar", condvar_id).assert_idle();
        take_slot(&mut inner.condvar_list, "condvar", condvar_id);
    }
}
