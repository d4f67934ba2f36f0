//! 内存存储实现模块
//!
//! 仅用于本地演示和测试。
//!
//! 包含以下实现：
//! - StateSpanStore: InMemorySpanStore
//! - TreatmentStore: InMemoryTreatmentStore

pub mod span;
pub mod treatment;

pub use span::*;
pub use treatment::*;
