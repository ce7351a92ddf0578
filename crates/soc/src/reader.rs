//! 描述文件字节游标

use crate::FormatError;

/// 在描述文件字节上顺序读取小端字段的游标
pub(crate) struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// 从指定偏移开始读取
    pub(crate) fn at(bytes: &'a [u8], pos: usize) -> Self {
        Self { bytes, pos }
    }

    /// 当前偏移
    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    /// 剩余未读字节数
    pub(crate) fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.pos)
    }

    fn take(&mut self, len: usize, what: &'static str) -> Result<&'a [u8], FormatError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.bytes.len())
            .ok_or(FormatError::Truncated {
                what,
                offset: self.pos,
            })?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    pub(crate) fn u32(&mut self, what: &'static str) -> Result<u32, FormatError> {
        let raw = self.take(4, what)?;
        Ok(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }

    pub(crate) fn u64(&mut self, what: &'static str) -> Result<u64, FormatError> {
        let raw = self.take(8, what)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(raw);
        Ok(u64::from_le_bytes(buf))
    }

    /// 读取定长名字字段
    ///
    /// 名字到第一个 NUL 或字段容量为止，取两者中较短者；非 UTF-8 字节按替换字符处理。
    pub(crate) fn name(
        &mut self,
        capacity: usize,
        what: &'static str,
    ) -> Result<String, FormatError> {
        let raw = self.take(capacity, what)?;
        let len = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        Ok(String::from_utf8_lossy(&raw[..len]).into_owned())
    }
}
