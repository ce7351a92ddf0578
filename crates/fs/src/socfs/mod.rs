//! SocFs - 寄存器文件系统操作提供者
//!
//! 每个操作都是 (路径, 描述文件, 请求数据) 的纯函数：先解析路径，再按解析结果分派。
//! 描述文件只读，寄存器映射只存在于单次调用内，因此所有操作都可以并发执行。

mod content;

use std::sync::Arc;

use mm::{AccessError, RegisterIo};
use soc::{MAX_REG_NAME, PathResolution, RegisterEntry, SocDescriptor};
use vfs::{DirEntry, FileSystem, FsError, InodeMetadata, InodeType, StatFs};

use crate::codec::parse_write_value;
pub use content::{ContentGenerator, RegisterReadout, slice_content};

/// 寄存器文件上报的大小
///
/// 只是占位值，并非读出内容的实际长度，调用方不能依赖它分配缓冲区。
pub const REGISTER_FILE_SIZE: usize = 256;

/// 寄存器文件系统
pub struct SocFs {
    soc: Arc<SocDescriptor>,
    io: RegisterIo,
}

impl SocFs {
    /// 以已加载的描述文件和寄存器读写引擎创建文件系统
    pub fn new(soc: Arc<SocDescriptor>, io: RegisterIo) -> Self {
        Self { soc, io }
    }

    /// 导出的 SoC 描述
    pub fn descriptor(&self) -> &SocDescriptor {
        &self.soc
    }

    /// 解析到寄存器；目录返回 `IsDirectory`，不存在返回 `NotFound`
    fn register(&self, path: &str) -> Result<&RegisterEntry, FsError> {
        match self.soc.resolve(path) {
            PathResolution::Register(reg) => Ok(reg),
            PathResolution::Root | PathResolution::Group(_) => Err(FsError::IsDirectory),
            PathResolution::NotFound => Err(FsError::NotFound),
        }
    }

    fn read_register(&self, reg: &RegisterEntry) -> Result<u64, FsError> {
        self.io
            .read(reg.addr(), reg.width())
            .map_err(|err| access_error(reg, err))
    }
}

/// 把寄存器访问错误转换为文件系统错误并记录日志
fn access_error(reg: &RegisterEntry, err: AccessError) -> FsError {
    log::error!("register '{}' at {:#x}: {err}", reg.name(), reg.addr());
    match err {
        AccessError::ValueTooWide { .. } => FsError::InvalidArgument,
        AccessError::InvalidWidth(_)
        | AccessError::Mapping { .. }
        | AccessError::OutOfRange { .. } => FsError::BadAddress,
    }
}

/// 目录项列表：`.`、`..` 之后按声明顺序排列子项
fn dir_listing(children: impl Iterator<Item = DirEntry>) -> Vec<DirEntry> {
    let mut entries = vec![
        DirEntry::new(".", InodeType::Directory),
        DirEntry::new("..", InodeType::Directory),
    ];
    entries.extend(children);
    entries
}

impl FileSystem for SocFs {
    fn fs_type(&self) -> &'static str {
        "socfs"
    }

    fn getattr(&self, path: &str) -> Result<InodeMetadata, FsError> {
        log::debug!("getattr: {path}");
        match self.soc.resolve(path) {
            PathResolution::NotFound => Err(FsError::NotFound),
            resolved if resolved.is_dir() => Ok(InodeMetadata::directory()),
            _ => Ok(InodeMetadata::file(REGISTER_FILE_SIZE)),
        }
    }

    fn readdir(&self, path: &str) -> Result<Vec<DirEntry>, FsError> {
        log::debug!("readdir: {path}");
        match self.soc.resolve(path) {
            PathResolution::Root => Ok(dir_listing(
                self.soc
                    .groups()
                    .iter()
                    .map(|group| DirEntry::new(group.name(), InodeType::Directory)),
            )),
            PathResolution::Group(group) => Ok(dir_listing(
                group
                    .registers()
                    .iter()
                    .map(|reg| DirEntry::new(reg.name(), InodeType::File)),
            )),
            PathResolution::Register(_) => Err(FsError::NotDirectory),
            PathResolution::NotFound => {
                log::error!("couldn't find directory {path}");
                Err(FsError::NotFound)
            }
        }
    }

    fn read(&self, path: &str, offset: usize, size: usize) -> Result<Vec<u8>, FsError> {
        log::debug!("read: {path} size: {size} offset: {offset}");
        let reg = self.register(path)?;
        let content = RegisterReadout::new(reg.addr(), || self.read_register(reg)).generate()?;
        Ok(slice_content(&content, offset, size).to_vec())
    }

    fn write(&self, path: &str, offset: usize, data: &[u8]) -> Result<usize, FsError> {
        log::debug!("write: {path} size: {} offset: {offset}", data.len());
        let reg = self.register(path)?;

        let value = parse_write_value(data).map_err(|err| {
            log::error!("can't parse write value for {path}: {err}");
            FsError::InvalidArgument
        })?;

        log::info!("writing {value:#x} to {} at {:#x}", reg.name(), reg.addr());
        self.io
            .write(reg.addr(), reg.width(), value)
            .map_err(|err| access_error(reg, err))?;

        Ok(data.len())
    }

    fn truncate(&self, path: &str, size: usize) -> Result<(), FsError> {
        log::debug!("truncate: {path} size: {size}");
        match self.soc.resolve(path) {
            PathResolution::NotFound => Err(FsError::NotFound),
            _ => Ok(()),
        }
    }

    fn statfs(&self) -> Result<StatFs, FsError> {
        let files = 1 + self.soc.groups().len() + self.soc.register_count();
        Ok(StatFs {
            block_size: 4096,
            total_blocks: 0,
            free_blocks: 0,
            available_blocks: 0,
            total_inodes: files,
            free_inodes: 0,
            max_filename_len: MAX_REG_NAME,
        })
    }
}
