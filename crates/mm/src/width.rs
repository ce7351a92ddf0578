//! 寄存器位宽

use crate::AccessError;

/// 寄存器位宽
///
/// 只允许 8/16/32/64 位，其他值在访问前即被拒绝。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegWidth {
    /// 8 位
    Byte,
    /// 16 位
    Half,
    /// 32 位
    Word,
    /// 64 位
    Double,
}

impl RegWidth {
    /// 位数
    pub const fn bits(self) -> u32 {
        match self {
            RegWidth::Byte => 8,
            RegWidth::Half => 16,
            RegWidth::Word => 32,
            RegWidth::Double => 64,
        }
    }

    /// 字节数
    pub const fn bytes(self) -> usize {
        (self.bits() / 8) as usize
    }

    /// 该位宽能表示的最大值
    pub const fn max_value(self) -> u64 {
        match self {
            RegWidth::Byte => u8::MAX as u64,
            RegWidth::Half => u16::MAX as u64,
            RegWidth::Word => u32::MAX as u64,
            RegWidth::Double => u64::MAX,
        }
    }

    /// 检查值能否放入该位宽，不做截断
    pub fn check_value(self, value: u64) -> Result<u64, AccessError> {
        if value > self.max_value() {
            return Err(AccessError::ValueTooWide {
                value,
                bits: self.bits(),
            });
        }
        Ok(value)
    }
}

impl TryFrom<u32> for RegWidth {
    type Error = AccessError;

    fn try_from(bits: u32) -> Result<Self, Self::Error> {
        match bits {
            8 => Ok(RegWidth::Byte),
            16 => Ok(RegWidth::Half),
            32 => Ok(RegWidth::Word),
            64 => Ok(RegWidth::Double),
            other => Err(AccessError::InvalidWidth(other)),
        }
    }
}
