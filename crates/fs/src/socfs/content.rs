//! 寄存器文件内容生成

use vfs::FsError;

use crate::codec::format_read_result;

/// 动态内容生成器 trait
pub trait ContentGenerator: Send + Sync {
    /// 生成文件内容（每次调用时重新生成）
    fn generate(&self) -> Result<Vec<u8>, FsError>;
}

/// 寄存器文件的读出内容：每次生成都实际读取一次寄存器
pub struct RegisterReadout<F> {
    addr: u64,
    read: F,
}

impl<F> RegisterReadout<F>
where
    F: Fn() -> Result<u64, FsError> + Send + Sync,
{
    /// 以寄存器地址和读取函数创建生成器
    pub fn new(addr: u64, read: F) -> Self {
        Self { addr, read }
    }
}

impl<F> ContentGenerator for RegisterReadout<F>
where
    F: Fn() -> Result<u64, FsError> + Send + Sync,
{
    fn generate(&self) -> Result<Vec<u8>, FsError> {
        let value = (self.read)()?;
        Ok(format_read_result(self.addr, value).into_bytes())
    }
}

/// 取生成内容中 `[offset, offset + size)` 的部分，越界部分截去
pub fn slice_content(content: &[u8], offset: usize, size: usize) -> &[u8] {
    let start = offset.min(content.len());
    let end = start.saturating_add(size).min(content.len());
    &content[start..end]
}
