//! 内存采样模块
//! 运行结束后采样一次已分配内存

use cap::Cap;
use std::alloc::System;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// 内存采样接口
pub trait MemoryProbe: Send + Sync {
    /// 当前已分配字节数
    fn resident_bytes(&self) -> usize;

    fn resident_mb(&self) -> f64 {
        self.resident_bytes() as f64 / BYTES_PER_MB
    }
}

/// 读取 `cap` 全局分配器计数
///
/// 只有把同一个 `Cap<System>` 注册为 `#[global_allocator]` 时数值才有意义。
#[derive(Clone, Copy)]
pub struct AllocatorProbe {
    allocator: &'static Cap<System>,
}

impl AllocatorProbe {
    pub const fn new(allocator: &'static Cap<System>) -> Self {
        Self { allocator }
    }
}

impl MemoryProbe for AllocatorProbe {
    fn resident_bytes(&self) -> usize {
        self.allocator.allocated()
    }
}

/// 不采样，始终为 0
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopProbe;

impl MemoryProbe for NoopProbe {
    fn resident_bytes(&self) -> usize {
        0
    }
}
