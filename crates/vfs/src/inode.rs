//! 元数据与目录项
//!
//! socfs 的命名空间只有两种节点：目录（根与寄存器组）和普通文件（寄存器）。
//! 这里的类型以路径为键返回，不携带 inode 编号，编号由宿主适配层自行分配。

use alloc::string::String;

/// 文件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InodeType {
    /// 普通文件
    File,
    /// 目录
    Directory,
}

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// 文件权限和类型（与 POSIX 兼容）
    pub struct FileMode: u32 {
        // 文件类型掩码
        /// 文件类型掩码
        const S_IFMT   = 0o170000;
        /// 普通文件
        const S_IFREG  = 0o100000;
        /// 目录
        const S_IFDIR  = 0o040000;

        // 用户权限
        /// 用户读
        const S_IRUSR  = 0o400;
        /// 用户写
        const S_IWUSR  = 0o200;
        /// 用户执行
        const S_IXUSR  = 0o100;

        // 组权限
        /// 组读
        const S_IRGRP  = 0o040;
        /// 组写
        const S_IWGRP  = 0o020;
        /// 组执行
        const S_IXGRP  = 0o010;

        // 其他用户权限
        /// 其他读
        const S_IROTH  = 0o004;
        /// 其他写
        const S_IWOTH  = 0o002;
        /// 其他执行
        const S_IXOTH  = 0o001;
    }
}

impl FileMode {
    /// 仅保留权限位（去掉类型位）
    pub fn permissions(&self) -> u16 {
        (self.bits() & 0o7777) as u16
    }
}

/// 轻量级目录项（readdir 返回）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// 文件名
    pub name: String,
    /// 文件类型
    pub inode_type: InodeType,
}

impl DirEntry {
    /// 创建目录项
    pub fn new(name: impl Into<String>, inode_type: InodeType) -> Self {
        Self {
            name: name.into(),
            inode_type,
        }
    }
}

/// 文件元数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InodeMetadata {
    /// 文件类型
    pub inode_type: InodeType,
    /// 权限位（含类型位）
    pub mode: FileMode,
    /// 上报的文件大小（字节）
    ///
    /// 对寄存器文件而言只是占位值，不代表实际可读内容的长度。
    pub size: usize,
    /// 硬链接数
    pub nlinks: usize,
}

impl InodeMetadata {
    /// 目录元数据：`0o755`，链接数 2
    pub fn directory() -> Self {
        Self {
            inode_type: InodeType::Directory,
            mode: FileMode::from_bits_truncate(0o755 | FileMode::S_IFDIR.bits()),
            size: 0,
            nlinks: 2,
        }
    }

    /// 普通文件元数据：`0o666`，链接数 1
    pub fn file(size: usize) -> Self {
        Self {
            inode_type: InodeType::File,
            mode: FileMode::from_bits_truncate(0o666 | FileMode::S_IFREG.bits()),
            size,
            nlinks: 1,
        }
    }
}
