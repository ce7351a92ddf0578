//! 物理内存映射与寄存器访问
//!
//! 提供按位宽访问硬件寄存器的能力：每次访问临时映射覆盖目标地址的一页
//! （访问跨越页边界时映射两页），执行恰好一次与位宽相符的 volatile 读或写，
//! 然后立即解除映射。
//!
//! # 组件
//!
//! - [`RegWidth`] - 寄存器位宽（8/16/32/64）
//! - [`MapWindow`] - 由地址、位宽和页大小计算出的映射窗口
//! - [`PhysMem`] / [`MappedRegion`] - 物理地址空间后端抽象
//! - [`DevMem`] - 基于 `/dev/mem` 一类设备句柄的后端
//! - [`MappedRegister`] - 作用域内有效的已映射寄存器，离开作用域即解除映射
//! - [`RegisterIo`] - 寄存器读写引擎
//!
//! # 并发
//!
//! 映射严格属于单次调用，不在调用或线程之间共享，因此访问路径上没有任何锁。
//! 设备句柄本身只用于 `mmap`，从不 seek，可被并发调用共享。

mod error;
mod page;
mod phys;
mod register;
mod width;

pub use error::AccessError;
pub use page::{MapWindow, page_size};
pub use phys::{DevMem, MappedRegion, PhysMem};
pub use register::{MappedRegister, RegisterIo};
pub use width::RegWidth;
