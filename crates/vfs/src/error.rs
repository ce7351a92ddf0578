//! VFS 错误类型
//!
//! 定义了与 POSIX 兼容的文件系统错误码，可通过 [`FsError::to_errno()`] 转换为系统调用错误码。

/// VFS 错误类型
///
/// 各错误码对应标准 POSIX errno 值。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsError {
    // 文件/目录相关
    /// 文件不存在 (-ENOENT)
    NotFound,
    /// 不是目录 (-ENOTDIR)
    NotDirectory,
    /// 是目录 (-EISDIR)
    IsDirectory,

    // 参数相关
    /// 无效参数 (-EINVAL)
    InvalidArgument,

    // 硬件访问相关
    /// 错误地址，寄存器访问失败 (-EFAULT)
    BadAddress,
}

impl FsError {
    /// 转换为系统调用错误码（负数）
    pub fn to_errno(&self) -> i32 {
        match self {
            FsError::NotFound => -2,
            FsError::BadAddress => -14,
            FsError::NotDirectory => -20,
            FsError::IsDirectory => -21,
            FsError::InvalidArgument => -22,
        }
    }
}

impl core::fmt::Display for FsError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            FsError::NotFound => "no such file or directory",
            FsError::NotDirectory => "not a directory",
            FsError::IsDirectory => "is a directory",
            FsError::InvalidArgument => "invalid argument",
            FsError::BadAddress => "bad address",
        };
        f.write_str(msg)
    }
}
