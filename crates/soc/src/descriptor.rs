//! 描述文件解码与数据模型
//!
//! 原始格式中寄存器组以“柔性数组”方式内嵌寄存器表，并用 `next_offset` 串联。
//! 这里一次性解码为拥有所有权的 [`GroupBlock`] / [`RegisterEntry`] 序列，
//! 之后不再访问原始字节。

use std::collections::HashSet;
use std::fs::File;
use std::path::Path;

use memmap2::Mmap;

use crate::FormatError;
use crate::reader::Reader;

/// 描述文件魔数
pub const SOC_MAGIC: u32 = 0x57a3_2bcd;
/// 支持的描述文件版本
pub const SOC_VERSION: u32 = 1;

/// SoC 名字段容量
pub const MAX_SOC_NAME: usize = 32;
/// 寄存器组名字段容量
pub const MAX_GROUP_NAME: usize = 32;
/// 寄存器名字段容量
pub const MAX_REG_NAME: usize = 64;

/// 文件头大小：magic + version + soc_name + top_count
pub const HEADER_SIZE: usize = 4 + 4 + MAX_SOC_NAME + 4;
/// 寄存器组头大小：name + reg_count + next_offset
pub const GROUP_HEADER_SIZE: usize = MAX_GROUP_NAME + 4 + 4;
/// 单个寄存器记录大小：name + addr + width
pub const REGISTER_ENTRY_SIZE: usize = MAX_REG_NAME + 8 + 4;

/// 寄存器记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterEntry {
    name: String,
    addr: u64,
    width: u32,
}

impl RegisterEntry {
    /// 创建寄存器记录
    ///
    /// `width` 原样保存，合法性（8/16/32/64）在访问时才检查。
    pub fn new(name: impl Into<String>, addr: u64, width: u32) -> Self {
        Self {
            name: name.into(),
            addr,
            width,
        }
    }

    /// 寄存器名
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 物理地址
    pub fn addr(&self) -> u64 {
        self.addr
    }

    /// 位宽（单位：bit）
    pub fn width(&self) -> u32 {
        self.width
    }
}

/// 寄存器组
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupBlock {
    name: String,
    registers: Vec<RegisterEntry>,
}

impl GroupBlock {
    /// 创建寄存器组
    pub fn new(name: impl Into<String>, registers: Vec<RegisterEntry>) -> Self {
        Self {
            name: name.into(),
            registers,
        }
    }

    /// 组名
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 按声明顺序排列的寄存器
    pub fn registers(&self) -> &[RegisterEntry] {
        &self.registers
    }

    /// 按名字查找寄存器（精确匹配，重名时只返回第一个）
    pub fn find_register(&self, name: &str) -> Option<&RegisterEntry> {
        self.registers.iter().find(|reg| reg.name == name)
    }
}

/// 解码后的 SoC 描述
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocDescriptor {
    version: u32,
    soc_name: String,
    groups: Vec<GroupBlock>,
}

impl SocDescriptor {
    /// 由已解码的寄存器组构造描述
    pub fn new(soc_name: impl Into<String>, groups: Vec<GroupBlock>) -> Self {
        Self {
            version: SOC_VERSION,
            soc_name: soc_name.into(),
            groups,
        }
    }

    /// 只读映射并解码描述文件
    ///
    /// 映射只在解码期间存在，返回的模型不再引用文件。
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FormatError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        if file.metadata()?.len() == 0 {
            return Err(FormatError::Truncated {
                what: "header",
                offset: 0,
            });
        }

        // SAFETY: 私有只读映射，解码期间不会有其他代码修改该文件。
        let map = unsafe { Mmap::map(&file)? };
        let descriptor = Self::decode(&map)?;
        log::info!(
            "loaded SoC '{}' from {}: {} groups, {} registers",
            descriptor.soc_name,
            path.display(),
            descriptor.groups.len(),
            descriptor.register_count()
        );
        Ok(descriptor)
    }

    /// 解码描述文件字节
    pub fn decode(bytes: &[u8]) -> Result<Self, FormatError> {
        let mut reader = Reader::at(bytes, 0);

        let magic = reader.u32("magic")?;
        if magic != SOC_MAGIC {
            return Err(FormatError::BadMagic {
                found: magic,
                expected: SOC_MAGIC,
            });
        }
        let version = reader.u32("version")?;
        if version != SOC_VERSION {
            return Err(FormatError::BadVersion {
                found: version,
                expected: SOC_VERSION,
            });
        }
        let soc_name = reader.name(MAX_SOC_NAME, "soc_name")?;
        let top_count = reader.u32("top_count")?;

        let mut groups = Vec::new();
        let mut offset = reader.position();
        for index in 0..top_count {
            let (group, next_offset, end) = decode_group(bytes, offset)?;

            if index + 1 < top_count {
                let next = next_offset as usize;
                if next < end || next > bytes.len() {
                    return Err(FormatError::BadOffset {
                        group: group.name,
                        offset: next_offset,
                        end,
                    });
                }
                if next != end {
                    log::debug!(
                        "group '{}' is followed by {} padding bytes",
                        group.name,
                        next - end
                    );
                }
                offset = next;
            }
            groups.push(group);
        }

        Ok(Self {
            version,
            soc_name,
            groups,
        })
    }

    /// 文件格式版本
    pub fn version(&self) -> u32 {
        self.version
    }

    /// SoC 名
    pub fn soc_name(&self) -> &str {
        &self.soc_name
    }

    /// 按声明顺序排列的寄存器组
    pub fn groups(&self) -> &[GroupBlock] {
        &self.groups
    }

    /// 所有寄存器组中的寄存器总数
    pub fn register_count(&self) -> usize {
        self.groups.iter().map(|g| g.registers.len()).sum()
    }

    /// 按名字查找寄存器组（精确匹配，重名时只返回第一个）
    pub fn find_group(&self, name: &str) -> Option<&GroupBlock> {
        self.groups.iter().find(|group| group.name == name)
    }

    /// 列出所有因重名而不可达的路径
    ///
    /// 路径解析总是取第一个匹配项，后出现的同名组或同名寄存器永远无法访问。
    pub fn duplicate_names(&self) -> Vec<String> {
        let mut duplicates = Vec::new();
        let mut seen_groups = HashSet::new();

        for group in &self.groups {
            if !seen_groups.insert(group.name.as_str()) {
                duplicates.push(format!("/{}", group.name));
                continue;
            }
            let mut seen_regs = HashSet::new();
            for reg in &group.registers {
                if !seen_regs.insert(reg.name.as_str()) {
                    duplicates.push(format!("/{}/{}", group.name, reg.name));
                }
            }
        }

        duplicates
    }

    /// 严格模式：存在任何重名路径即报错
    pub fn check_unique_names(&self) -> Result<(), FormatError> {
        match self.duplicate_names().into_iter().next() {
            Some(path) => Err(FormatError::DuplicateName(path)),
            None => Ok(()),
        }
    }
}

/// 解码位于 `offset` 的寄存器组，返回组、其 `next_offset` 以及寄存器表的结束偏移
fn decode_group(bytes: &[u8], offset: usize) -> Result<(GroupBlock, u32, usize), FormatError> {
    let mut reader = Reader::at(bytes, offset);

    let name = reader.name(MAX_GROUP_NAME, "group name")?;
    let reg_count = reader.u32("reg_count")? as usize;
    let next_offset = reader.u32("next_offset")?;

    // reg_count 来自文件，预分配不能超过剩余字节能容纳的数量
    let capacity = reg_count.min(reader.remaining() / REGISTER_ENTRY_SIZE);
    let mut registers = Vec::with_capacity(capacity);
    for _ in 0..reg_count {
        let reg_name = reader.name(MAX_REG_NAME, "register name")?;
        let addr = reader.u64("register addr")?;
        let width = reader.u32("register width")?;
        registers.push(RegisterEntry::new(reg_name, addr, width));
    }

    Ok((GroupBlock { name, registers }, next_offset, reader.position()))
}
