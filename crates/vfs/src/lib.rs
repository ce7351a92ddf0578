//! 基于路径的虚拟文件系统接口
//!
//! 此 crate 提供 socfs 各层共享的文件系统抽象，包括：
//!
//! - [`FileSystem`] trait - 以路径为键的文件系统操作接口（getattr/readdir/read/write/truncate）
//! - [`InodeMetadata`] / [`DirEntry`] - 元数据与目录项
//! - [`FsError`] - 与 POSIX 兼容的错误码
//! - 严格的路径解析（[`parse_path`]）
//!
//! 具体的文件系统（如 `fs::SocFs`）实现 [`FileSystem`]，宿主运行时适配层（如 FUSE）
//! 只面向该 trait 编写。

#![no_std]

extern crate alloc;

pub mod error;

mod file_system;
mod inode;
mod path;

// Re-export error
pub use error::FsError;

// Re-export inode
pub use inode::{DirEntry, FileMode, InodeMetadata, InodeType};

// Re-export file_system
pub use file_system::{FileSystem, StatFs};

// Re-export path
pub use path::{PathComponent, join_path, parse_path};
