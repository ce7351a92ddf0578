//! # 寄存器文件系统 (socfs)
//!
//! 将 SoC 描述文件中的寄存器导出为文件：
//!
//! ```text
//! /                 根目录，列出所有寄存器组
//! /<group>          寄存器组目录，列出组内寄存器
//! /<group>/<reg>    寄存器文件：读取得到 "0x<addr> -> 0x<value>\n"，写入数值即写寄存器
//! ```
//!
//! - [`codec`] - 读结果格式化与写入值解析
//! - [`SocFs`] - 实现 `vfs::FileSystem` 的操作提供者

pub mod codec;
pub mod socfs;

pub use codec::{ParseError, format_read_result, parse_write_value};
pub use socfs::{REGISTER_FILE_SIZE, SocFs};
