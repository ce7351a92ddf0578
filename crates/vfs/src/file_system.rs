//! 文件系统抽象

use alloc::vec::Vec;

use crate::{DirEntry, FsError, InodeMetadata};

/// 文件系统 trait
///
/// 所有操作都以绝对路径为键，是宿主运行时调用的唯一入口。实现必须是 `Send + Sync`
/// 且不依赖调用顺序：宿主可能在多个工作线程上并发调用任意操作。
pub trait FileSystem: Send + Sync {
    /// 文件系统类型名称
    fn fs_type(&self) -> &'static str;

    /// 查询路径对应节点的元数据
    fn getattr(&self, path: &str) -> Result<InodeMetadata, FsError>;

    /// 列出目录内容（包含 `.` 与 `..`）
    fn readdir(&self, path: &str) -> Result<Vec<DirEntry>, FsError>;

    /// 从指定偏移量读取至多 `size` 字节
    fn read(&self, path: &str, offset: usize, size: usize) -> Result<Vec<u8>, FsError>;

    /// 向指定偏移量写入数据，返回接受的字节数
    fn write(&self, path: &str, offset: usize, data: &[u8]) -> Result<usize, FsError>;

    /// 截断文件到指定大小
    fn truncate(&self, path: &str, size: usize) -> Result<(), FsError>;

    /// 获取文件系统统计信息
    fn statfs(&self) -> Result<StatFs, FsError>;
}

/// 文件系统统计信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatFs {
    /// 块大小（单位：字节）
    pub block_size: usize,
    /// 总块数
    pub total_blocks: usize,
    /// 空闲块数
    pub free_blocks: usize,
    /// 可用块数（非特权用户）
    pub available_blocks: usize,
    /// 总 inode 数
    pub total_inodes: usize,
    /// 空闲 inode 数
    pub free_inodes: usize,
    /// 最大文件名长度
    pub max_filename_len: usize,
}
