//! 时钟抽象
//!
//! 门面缓存通过 [`Clock`] 获取当前时间，测试中可以替换为 [`ManualClock`]
//! 精确控制 TTL 和 LRU 行为。

use parking_lot::Mutex;
use std::fmt::Debug;
use std::time::{Duration, Instant};

/// 单调时钟
pub trait Clock: Send + Sync + Debug {
    /// 当前时刻
    fn now(&self) -> Instant;
}

/// 系统单调时钟
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// 手动推进的时钟
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    elapsed: Mutex<Duration>,
}

impl ManualClock {
    /// 以当前时刻为起点创建时钟
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            elapsed: Mutex::new(Duration::ZERO),
        }
    }

    /// 向前推进指定时长
    pub fn advance(&self, by: Duration) {
        *self.elapsed.lock() += by;
    }

    /// 自创建以来经过的时长
    pub fn elapsed(&self) -> Duration {
        *self.elapsed.lock()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + *self.elapsed.lock()
    }
}
