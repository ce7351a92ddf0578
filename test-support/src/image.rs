//! 描述文件镜像构造器
//!
//! 按二进制格式编码描述文件，并允许故意写坏魔数、版本、组数或 `next_offset`，
//! 用来测试解码器的错误路径。

use std::io;
use std::path::Path;

const MAGIC: u32 = 0x57a3_2bcd;
const SOC_NAME_LEN: usize = 32;
const GROUP_NAME_LEN: usize = 32;
const REG_NAME_LEN: usize = 64;
const REG_ENTRY_LEN: usize = REG_NAME_LEN + 8 + 4;
const GROUP_HEADER_LEN: usize = GROUP_NAME_LEN + 4 + 4;

struct ImageGroup {
    name: String,
    regs: Vec<(String, u64, u32)>,
    padding: usize,
    next_offset: Option<u32>,
}

/// 描述文件镜像构造器
pub struct DescriptorImage {
    magic: u32,
    version: u32,
    soc_name: String,
    top_count: Option<u32>,
    groups: Vec<ImageGroup>,
}

impl DescriptorImage {
    /// 以 SoC 名创建空镜像（合法魔数与版本）
    pub fn new(soc_name: &str) -> Self {
        Self {
            magic: MAGIC,
            version: 1,
            soc_name: soc_name.to_string(),
            top_count: None,
            groups: Vec::new(),
        }
    }

    /// 追加一个寄存器组，寄存器以 `(名字, 地址, 位宽)` 给出
    pub fn group(mut self, name: &str, regs: &[(&str, u64, u32)]) -> Self {
        self.groups.push(ImageGroup {
            name: name.to_string(),
            regs: regs
                .iter()
                .map(|&(reg, addr, width)| (reg.to_string(), addr, width))
                .collect(),
            padding: 0,
            next_offset: None,
        });
        self
    }

    /// 覆盖魔数
    pub fn magic(mut self, magic: u32) -> Self {
        self.magic = magic;
        self
    }

    /// 覆盖版本号
    pub fn version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// 覆盖文件头中的组数
    pub fn top_count(mut self, count: u32) -> Self {
        self.top_count = Some(count);
        self
    }

    /// 在第 `index` 个组之后插入填充字节（`next_offset` 相应跳过）
    pub fn padding(mut self, index: usize, bytes: usize) -> Self {
        self.groups[index].padding = bytes;
        self
    }

    /// 覆盖第 `index` 个组的 `next_offset`
    pub fn next_offset(mut self, index: usize, offset: u32) -> Self {
        self.groups[index].next_offset = Some(offset);
        self
    }

    /// 编码为字节
    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&self.magic.to_le_bytes());
        out.extend_from_slice(&self.version.to_le_bytes());
        put_name(&mut out, &self.soc_name, SOC_NAME_LEN);
        let top_count = self.top_count.unwrap_or(self.groups.len() as u32);
        out.extend_from_slice(&top_count.to_le_bytes());

        for group in &self.groups {
            let start = out.len();
            let end = start + GROUP_HEADER_LEN + group.regs.len() * REG_ENTRY_LEN + group.padding;
            let next_offset = group.next_offset.unwrap_or(end as u32);

            put_name(&mut out, &group.name, GROUP_NAME_LEN);
            out.extend_from_slice(&(group.regs.len() as u32).to_le_bytes());
            out.extend_from_slice(&next_offset.to_le_bytes());
            for (name, addr, width) in &group.regs {
                put_name(&mut out, name, REG_NAME_LEN);
                out.extend_from_slice(&addr.to_le_bytes());
                out.extend_from_slice(&width.to_le_bytes());
            }
            out.resize(end, 0);
        }

        out
    }

    /// 编码并写入文件
    pub fn write_to(&self, path: &Path) -> io::Result<()> {
        std::fs::write(path, self.build())
    }
}

/// 写入定长名字字段，超长时截断（此时没有结尾 NUL）
fn put_name(out: &mut Vec<u8>, name: &str, capacity: usize) {
    let bytes = name.as_bytes();
    let len = bytes.len().min(capacity);
    out.extend_from_slice(&bytes[..len]);
    out.resize(out.len() + capacity - len, 0);
}
