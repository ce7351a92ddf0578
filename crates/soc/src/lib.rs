//! SoC 寄存器描述文件
//!
//! 描述文件是一个紧凑的二进制块，按顺序列出某颗 SoC 的寄存器组（group，
//! 原始格式中称为 "top"）及每组内的寄存器。此 crate 负责：
//!
//! - [`descriptor`] - 解码二进制描述文件为拥有所有权的 [`SocDescriptor`]
//! - [`resolve`] - 将文件系统路径解析为 [`PathResolution`]
//!
//! 解码后的模型在进程生命周期内只读，可以在多个线程间无锁共享。
//!
//! # 二进制格式
//!
//! 所有整数均为小端序，结构紧密排列：
//!
//! ```text
//! header: u32 magic(=0x57a32bcd), u32 version(=1), char soc_name[32], u32 top_count
//! 重复 top_count 次：
//!   char name[32], u32 reg_count, u32 next_offset
//!   重复 reg_count 次：char reg_name[64], u64 addr, u32 width
//! ```

pub mod descriptor;
pub mod error;
pub mod resolve;

mod reader;

pub use descriptor::{
    GROUP_HEADER_SIZE, GroupBlock, HEADER_SIZE, MAX_GROUP_NAME, MAX_REG_NAME, MAX_SOC_NAME,
    REGISTER_ENTRY_SIZE, RegisterEntry, SOC_MAGIC, SOC_VERSION, SocDescriptor,
};
pub use error::FormatError;
pub use resolve::PathResolution;
