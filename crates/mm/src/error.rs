//! 寄存器访问错误类型

use thiserror::Error;

/// 寄存器访问错误
#[derive(Debug, Error)]
pub enum AccessError {
    /// 位宽不是 8/16/32/64 之一
    #[error("register width {0} is not one of 8/16/32/64")]
    InvalidWidth(u32),
    /// 待写入的值超出寄存器位宽
    #[error("value {value:#x} does not fit in a {bits}-bit register")]
    ValueTooWide {
        /// 待写入的值
        value: u64,
        /// 寄存器位宽
        bits: u32,
    },
    /// 建立物理内存映射失败
    #[error("can't map {len:#x} bytes of physical memory at {base:#x}: {source}")]
    Mapping {
        /// 映射起始物理地址（页对齐）
        base: u64,
        /// 映射长度
        len: usize,
        /// 底层错误
        #[source]
        source: std::io::Error,
    },
    /// 请求的物理范围不在后端可访问的范围内
    #[error("physical range {base:#x}+{len:#x} is not backed by memory")]
    OutOfRange {
        /// 起始物理地址
        base: u64,
        /// 长度
        len: usize,
    },
}
