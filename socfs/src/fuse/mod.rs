//! FUSE 适配层
//!
//! 把内核经 FUSE 协议发来的 inode 请求翻译成 [`FileSystem`] 的路径操作。
//! 适配层本身不含寄存器语义，只负责编号映射、属性转换和错误码转换。
//!
//! 每个打开的文件句柄持有一份内容快照：偏移 0 处的读取访问寄存器并刷新快照，
//! 其余偏移从快照切片。这样 `cat` 在读到文件尾之前只访问一次寄存器。

mod inode_table;

use std::collections::HashMap;
use std::ffi::OsStr;
use std::time::{Duration, SystemTime};

use fuser::consts::FOPEN_DIRECT_IO;
use fuser::{
    FileAttr, FileType, Filesystem, ReplyAttr, ReplyData, ReplyDirectory, ReplyEmpty, ReplyEntry,
    ReplyOpen, ReplyStatfs, ReplyWrite, Request, TimeOrNow,
};
use ::fs::socfs::slice_content;
use vfs::{FileSystem, FsError, InodeMetadata, InodeType};

pub use inode_table::{InodeEntry, InodeTable};

/// 属性与目录项缓存时间
const TTL: Duration = Duration::from_secs(1);

/// 上报给内核的块大小
const BLOCK_SIZE: u32 = 512;

fn file_type(kind: InodeType) -> FileType {
    match kind {
        InodeType::File => FileType::RegularFile,
        InodeType::Directory => FileType::Directory,
    }
}

/// [`FsError`] 转换为 FUSE 回复使用的正 errno
fn errno(err: FsError) -> i32 {
    -err.to_errno()
}

/// 挂载到 FUSE 的文件系统
pub struct SocFuse<F: FileSystem> {
    fs: F,
    inodes: InodeTable,
    uid: u32,
    gid: u32,
    mounted_at: SystemTime,
    /// 句柄号 -> 内容快照（尚未读取时为 `None`）
    handles: HashMap<u64, Option<Vec<u8>>>,
    next_fh: u64,
}

impl<F: FileSystem> SocFuse<F> {
    /// 包装文件系统并建立 inode 表
    ///
    /// 文件属主为当前进程的用户和组。
    pub fn new(fs: F) -> Result<Self, FsError> {
        let inodes = InodeTable::build(&fs)?;
        // SAFETY: getuid/getgid 总是成功且没有副作用。
        let (uid, gid) = unsafe { (libc::getuid(), libc::getgid()) };
        Ok(Self {
            fs,
            inodes,
            uid,
            gid,
            mounted_at: SystemTime::now(),
            handles: HashMap::new(),
            next_fh: 1,
        })
    }

    /// inode 表
    pub fn inodes(&self) -> &InodeTable {
        &self.inodes
    }

    fn entry(&self, ino: u64) -> Result<&InodeEntry, FsError> {
        self.inodes.get(ino).ok_or(FsError::NotFound)
    }

    fn to_file_attr(&self, ino: u64, meta: &InodeMetadata) -> FileAttr {
        let size = meta.size as u64;
        FileAttr {
            ino,
            size,
            blocks: size.div_ceil(u64::from(BLOCK_SIZE)),
            atime: self.mounted_at,
            mtime: self.mounted_at,
            ctime: self.mounted_at,
            crtime: self.mounted_at,
            kind: file_type(meta.inode_type),
            perm: meta.mode.permissions(),
            nlink: meta.nlinks as u32,
            uid: self.uid,
            gid: self.gid,
            rdev: 0,
            blksize: BLOCK_SIZE,
            flags: 0,
        }
    }

    fn attr(&self, ino: u64) -> Result<FileAttr, FsError> {
        let entry = self.entry(ino)?;
        let meta = self.fs.getattr(&entry.path)?;
        Ok(self.to_file_attr(ino, &meta))
    }

    fn lookup_attr(&self, parent: u64, name: &OsStr) -> Result<FileAttr, FsError> {
        let name = name.to_str().ok_or(FsError::NotFound)?;
        let ino = self.inodes.lookup(parent, name).ok_or(FsError::NotFound)?;
        self.attr(ino)
    }

    /// 打开 `ino`，返回句柄号和打开标志
    ///
    /// 目录不分配句柄，句柄号为 0。
    fn open_file(&mut self, ino: u64) -> Result<(u64, u32), FsError> {
        if self.entry(ino)?.kind == InodeType::Directory {
            return Ok((0, 0));
        }
        let fh = self.next_fh;
        self.next_fh += 1;
        self.handles.insert(fh, None);
        // 页缓存会跳过 read，寄存器内容由句柄快照管理
        Ok((fh, FOPEN_DIRECT_IO))
    }

    /// 经句柄读取
    ///
    /// 偏移 0 或尚无快照时生成整份内容，之后的偏移只从快照切片。
    /// 未知句柄退化为直接按路径读取。
    fn read_file(
        &mut self,
        ino: u64,
        fh: u64,
        offset: usize,
        size: usize,
    ) -> Result<Vec<u8>, FsError> {
        let entry = self.inodes.get(ino).ok_or(FsError::NotFound)?;
        let Some(snapshot) = self.handles.get_mut(&fh) else {
            return self.fs.read(&entry.path, offset, size);
        };
        if offset == 0 || snapshot.is_none() {
            let len = self.fs.getattr(&entry.path)?.size;
            *snapshot = Some(self.fs.read(&entry.path, 0, len)?);
        }
        let content = snapshot.as_deref().unwrap_or_default();
        Ok(slice_content(content, offset, size).to_vec())
    }

    /// 释放句柄及其快照
    fn release_file(&mut self, fh: u64) {
        self.handles.remove(&fh);
    }

    /// 目录项列表，`.` 和 `..` 分别映射到目录自身与父目录
    fn dir_entries(&self, ino: u64) -> Result<Vec<(u64, FileType, String)>, FsError> {
        let dir = self.entry(ino)?;
        let entries = self.fs.readdir(&dir.path)?;

        let mut out = Vec::with_capacity(entries.len());
        for entry in entries {
            let entry_ino = match entry.name.as_str() {
                "." => ino,
                ".." => dir.parent,
                name => match self.inodes.lookup(ino, name) {
                    Some(child) => child,
                    None => continue,
                },
            };
            out.push((entry_ino, file_type(entry.inode_type), entry.name));
        }
        Ok(out)
    }
}

impl<F: FileSystem> Filesystem for SocFuse<F> {
    fn lookup(&mut self, _req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEntry) {
        match self.lookup_attr(parent, name) {
            Ok(attr) => reply.entry(&TTL, &attr, 0),
            Err(err) => reply.error(errno(err)),
        }
    }

    fn getattr(&mut self, _req: &Request<'_>, ino: u64, reply: ReplyAttr) {
        match self.attr(ino) {
            Ok(attr) => reply.attr(&TTL, &attr),
            Err(err) => reply.error(errno(err)),
        }
    }

    fn setattr(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _mode: Option<u32>,
        _uid: Option<u32>,
        _gid: Option<u32>,
        size: Option<u64>,
        _atime: Option<TimeOrNow>,
        _mtime: Option<TimeOrNow>,
        _ctime: Option<SystemTime>,
        _fh: Option<u64>,
        _crtime: Option<SystemTime>,
        _chgtime: Option<SystemTime>,
        _bkuptime: Option<SystemTime>,
        _flags: Option<u32>,
        reply: ReplyAttr,
    ) {
        let result = self.entry(ino).and_then(|entry| {
            if let Some(size) = size {
                self.fs.truncate(&entry.path, size as usize)?;
            }
            self.attr(ino)
        });
        match result {
            Ok(attr) => reply.attr(&TTL, &attr),
            Err(err) => reply.error(errno(err)),
        }
    }

    fn open(&mut self, _req: &Request<'_>, ino: u64, _flags: i32, reply: ReplyOpen) {
        match self.open_file(ino) {
            Ok((fh, flags)) => reply.opened(fh, flags),
            Err(err) => reply.error(errno(err)),
        }
    }

    fn read(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        fh: u64,
        offset: i64,
        size: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyData,
    ) {
        let result = usize::try_from(offset)
            .map_err(|_| FsError::InvalidArgument)
            .and_then(|offset| self.read_file(ino, fh, offset, size as usize));
        match result {
            Ok(data) => reply.data(&data),
            Err(err) => reply.error(errno(err)),
        }
    }

    fn write(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        data: &[u8],
        _write_flags: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyWrite,
    ) {
        let result = self.entry(ino).and_then(|entry| {
            let offset = usize::try_from(offset).map_err(|_| FsError::InvalidArgument)?;
            self.fs.write(&entry.path, offset, data)
        });
        match result {
            Ok(written) => reply.written(written as u32),
            Err(err) => reply.error(errno(err)),
        }
    }

    fn release(
        &mut self,
        _req: &Request<'_>,
        _ino: u64,
        fh: u64,
        _flags: i32,
        _lock_owner: Option<u64>,
        _flush: bool,
        reply: ReplyEmpty,
    ) {
        self.release_file(fh);
        reply.ok();
    }

    fn readdir(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        mut reply: ReplyDirectory,
    ) {
        let entries = match self.dir_entries(ino) {
            Ok(entries) => entries,
            Err(err) => return reply.error(errno(err)),
        };
        let skip = usize::try_from(offset).unwrap_or(0);
        for (index, (entry_ino, kind, name)) in entries.into_iter().enumerate().skip(skip) {
            // add 返回 true 表示缓冲区已满
            if reply.add(entry_ino, (index + 1) as i64, kind, name) {
                break;
            }
        }
        reply.ok();
    }

    fn statfs(&mut self, _req: &Request<'_>, _ino: u64, reply: ReplyStatfs) {
        match self.fs.statfs() {
            Ok(stat) => reply.statfs(
                stat.total_blocks as u64,
                stat.free_blocks as u64,
                stat.available_blocks as u64,
                stat.total_inodes as u64,
                stat.free_inodes as u64,
                stat.block_size as u32,
                stat.max_filename_len as u32,
                stat.block_size as u32,
            ),
            Err(err) => reply.error(errno(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ::fs::{REGISTER_FILE_SIZE, SocFs};
    use fuser::FUSE_ROOT_ID;
    use mm::RegisterIo;
    use soc::{GroupBlock, RegisterEntry, SocDescriptor};
    use test_support::SimPhysMem;

    use super::*;

    const BASE: u64 = 0x4000_0000;

    fn adapter() -> SocFuse<SocFs> {
        adapter_with_mem().0
    }

    fn adapter_with_mem() -> (SocFuse<SocFs>, Arc<SimPhysMem>) {
        let soc = SocDescriptor::new(
            "test",
            vec![
                GroupBlock::new(
                    "cpu",
                    vec![
                        RegisterEntry::new("ctrl", BASE, 32),
                        RegisterEntry::new("status", BASE + 4, 32),
                    ],
                ),
                GroupBlock::new("gpio", vec![RegisterEntry::new("data", BASE + 8, 8)]),
            ],
        );
        let mem = Arc::new(SimPhysMem::new(BASE, 0x1000));
        let io = RegisterIo::new(mem.clone());
        (SocFuse::new(SocFs::new(Arc::new(soc), io)).unwrap(), mem)
    }

    #[test]
    fn test_errno_is_positive() {
        assert_eq!(errno(FsError::NotFound), libc::ENOENT);
        assert_eq!(errno(FsError::InvalidArgument), libc::EINVAL);
        assert_eq!(errno(FsError::BadAddress), libc::EFAULT);
        assert_eq!(errno(FsError::IsDirectory), libc::EISDIR);
    }

    #[test]
    fn test_root_attr() {
        let fuse = adapter();
        let attr = fuse.attr(FUSE_ROOT_ID).unwrap();
        assert_eq!(attr.ino, FUSE_ROOT_ID);
        assert_eq!(attr.kind, FileType::Directory);
        assert_eq!(attr.perm, 0o755);
        assert_eq!(attr.nlink, 2);
    }

    #[test]
    fn test_register_attr() {
        let fuse = adapter();
        let cpu = fuse.inodes().lookup(FUSE_ROOT_ID, "cpu").unwrap();
        let attr = fuse.lookup_attr(cpu, OsStr::new("ctrl")).unwrap();
        assert_eq!(attr.kind, FileType::RegularFile);
        assert_eq!(attr.perm, 0o666);
        assert_eq!(attr.nlink, 1);
        assert_eq!(attr.size, REGISTER_FILE_SIZE as u64);
    }

    #[test]
    fn test_lookup_missing() {
        let fuse = adapter();
        assert_eq!(
            fuse.lookup_attr(FUSE_ROOT_ID, OsStr::new("nope")).unwrap_err(),
            FsError::NotFound
        );
        assert_eq!(fuse.attr(12345).unwrap_err(), FsError::NotFound);
    }

    #[test]
    fn test_root_dir_entries() {
        let fuse = adapter();
        let entries = fuse.dir_entries(FUSE_ROOT_ID).unwrap();
        let names: Vec<_> = entries.iter().map(|(_, _, name)| name.as_str()).collect();
        assert_eq!(names, [".", "..", "cpu", "gpio"]);
        assert_eq!(entries[0].0, FUSE_ROOT_ID);
        assert_eq!(entries[1].0, FUSE_ROOT_ID);
        assert_eq!(entries[2].1, FileType::Directory);
    }

    #[test]
    fn test_group_dir_entries() {
        let fuse = adapter();
        let gpio = fuse.inodes().ino_of("/gpio").unwrap();
        let entries = fuse.dir_entries(gpio).unwrap();
        assert_eq!(entries[0].0, gpio);
        assert_eq!(entries[1].0, FUSE_ROOT_ID);
        assert_eq!(
            entries[2],
            (
                fuse.inodes().ino_of("/gpio/data").unwrap(),
                FileType::RegularFile,
                "data".to_string()
            )
        );
    }

    #[test]
    fn test_dir_entries_on_file() {
        let fuse = adapter();
        let ctrl = fuse.inodes().ino_of("/cpu/ctrl").unwrap();
        assert_eq!(fuse.dir_entries(ctrl).unwrap_err(), FsError::NotDirectory);
    }

    #[test]
    fn test_read_to_eof_uses_one_snapshot() {
        let (mut fuse, mem) = adapter_with_mem();
        let ctrl = fuse.inodes().ino_of("/cpu/ctrl").unwrap();
        let (fh, flags) = fuse.open_file(ctrl).unwrap();
        assert_ne!(fh, 0);
        assert_eq!(flags, FOPEN_DIRECT_IO);

        mem.poke_value(BASE, 4, 0x1);
        let first = fuse.read_file(ctrl, fh, 0, 131072).unwrap();
        assert_eq!(first, b"0x40000000 -> 0x1\n");

        // 寄存器在两次 read 之间变化，文件尾的读取仍然基于同一份快照
        mem.poke_value(BASE, 4, 0x100);
        let tail = fuse.read_file(ctrl, fh, first.len(), 131072).unwrap();
        assert!(tail.is_empty());
        assert_eq!(mem.map_requests().len(), 1);

        // 回到偏移 0 重新读取寄存器
        let again = fuse.read_file(ctrl, fh, 0, 131072).unwrap();
        assert_eq!(again, b"0x40000000 -> 0x100\n");
        assert_eq!(mem.map_requests().len(), 2);
    }

    #[test]
    fn test_chunked_read_is_consistent() {
        let (mut fuse, mem) = adapter_with_mem();
        let status = fuse.inodes().ino_of("/cpu/status").unwrap();
        let (fh, _) = fuse.open_file(status).unwrap();

        mem.poke_value(BASE + 4, 4, 0xabcd);
        let mut text = fuse.read_file(status, fh, 0, 5).unwrap();
        mem.poke_value(BASE + 4, 4, 0x1);
        text.extend(fuse.read_file(status, fh, 5, 5).unwrap());
        text.extend(fuse.read_file(status, fh, 10, 64).unwrap());

        assert_eq!(text, b"0x40000004 -> 0xabcd\n");
        assert_eq!(mem.map_requests().len(), 1);
    }

    #[test]
    fn test_handles_are_independent() {
        let (mut fuse, mem) = adapter_with_mem();
        let ctrl = fuse.inodes().ino_of("/cpu/ctrl").unwrap();
        let (a, _) = fuse.open_file(ctrl).unwrap();
        let (b, _) = fuse.open_file(ctrl).unwrap();
        assert_ne!(a, b);

        mem.poke_value(BASE, 4, 0x2);
        fuse.read_file(ctrl, a, 0, 64).unwrap();
        mem.poke_value(BASE, 4, 0x3);
        assert_eq!(fuse.read_file(ctrl, b, 0, 64).unwrap(), b"0x40000000 -> 0x3\n");
        assert_eq!(fuse.read_file(ctrl, a, 4, 64).unwrap(), b"000000 -> 0x2\n");
    }

    #[test]
    fn test_release_drops_snapshot() {
        let (mut fuse, mem) = adapter_with_mem();
        let ctrl = fuse.inodes().ino_of("/cpu/ctrl").unwrap();
        let (fh, _) = fuse.open_file(ctrl).unwrap();
        fuse.read_file(ctrl, fh, 0, 64).unwrap();
        fuse.release_file(fh);
        assert!(fuse.handles.is_empty());

        // 已释放的句柄按路径直接读取
        mem.poke_value(BASE, 4, 0x7);
        assert_eq!(fuse.read_file(ctrl, fh, 14, 64).unwrap(), b"0x7\n");
    }

    #[test]
    fn test_open_dir_has_no_handle() {
        let mut fuse = adapter();
        assert_eq!(fuse.open_file(FUSE_ROOT_ID).unwrap(), (0, 0));
        assert!(fuse.handles.is_empty());
        assert_eq!(fuse.open_file(999).unwrap_err(), FsError::NotFound);
    }
}
