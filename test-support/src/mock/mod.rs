//! Mock 实现模块
//!
//! 提供物理内存后端的 Mock 实现，用于测试

pub mod phys;

pub use phys::SimPhysMem;
