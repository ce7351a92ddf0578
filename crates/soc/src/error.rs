//! 描述文件错误类型

use thiserror::Error;

/// 描述文件格式错误
///
/// 启动阶段的致命错误：描述文件无法使用时进程不应继续运行。
#[derive(Debug, Error)]
pub enum FormatError {
    /// 魔数不匹配
    #[error("unsupported SoC file: bad magic 0x{found:08x} (expected 0x{expected:08x})")]
    BadMagic {
        /// 文件中的魔数
        found: u32,
        /// 期望的魔数
        expected: u32,
    },
    /// 版本号不匹配
    #[error("unsupported SoC file: version {found} (expected {expected})")]
    BadVersion {
        /// 文件中的版本号
        found: u32,
        /// 支持的版本号
        expected: u32,
    },
    /// 数据在某个字段中途结束
    #[error("SoC file truncated while reading {what} at offset {offset}")]
    Truncated {
        /// 正在读取的字段
        what: &'static str,
        /// 字段起始偏移
        offset: usize,
    },
    /// 寄存器组的 `next_offset` 指回已解码区域或越过文件末尾
    #[error("group '{group}' has invalid next_offset {offset} (block ends at {end})")]
    BadOffset {
        /// 寄存器组名
        group: String,
        /// 文件中的 next_offset
        offset: u32,
        /// 该组寄存器数组的结束偏移
        end: usize,
    },
    /// 严格模式下发现重名路径
    #[error("duplicate name in SoC file: {0}")]
    DuplicateName(String),
    /// 读取或映射描述文件失败
    #[error("can't map the SoC file: {0}")]
    Io(#[from] std::io::Error),
}
