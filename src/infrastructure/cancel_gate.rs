//! 中止闸门 - 基础设施层
//!
//! 只持有一个协作式中止标志，不打断任何正在进行的调用

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// 协作式中止闸门
///
/// - 克隆得到的句柄共享同一个标志，可交给 UI / 信号处理器
/// - 只在固定检查点被读取：派发前、每个批次发起调用前
/// - 每次运行结束时由编排层清除
#[derive(Debug, Clone, Default)]
pub struct CancellationGate {
    flag: Arc<AtomicBool>,
}

impl CancellationGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// 发出中止请求，可重复调用
    pub fn request_cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    pub fn clear(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }

    /// 返回一个在 drop 时清除标志的守卫，保证任何退出路径都会复位
    pub fn clear_on_drop(&self) -> ClearOnDrop {
        ClearOnDrop { gate: self.clone() }
    }
}

/// 见 [`CancellationGate::clear_on_drop`]
#[must_use = "守卫被立即丢弃时会马上清除中止标志"]
pub struct ClearOnDrop {
    gate: CancellationGate,
}

impl Drop for ClearOnDrop {
    fn drop(&mut self) {
        self.gate.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_flag() {
        let gate = CancellationGate::new();
        let handle = gate.clone();
        assert!(!gate.is_cancelled());
        handle.request_cancel();
        handle.request_cancel();
        assert!(gate.is_cancelled());
    }

    #[test]
    fn test_guard_clears_on_early_exit() {
        fn run(gate: &CancellationGate) -> Result<(), &'static str> {
            let _guard = gate.clear_on_drop();
            gate.request_cancel();
            Err("提前退出")
        }

        let gate = CancellationGate::new();
        assert!(run(&gate).is_err());
        assert!(!gate.is_cancelled());
    }
}
