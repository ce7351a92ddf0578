//! 物理地址空间后端

use std::fs::File;
use std::io;
use std::os::fd::AsRawFd;
use std::ptr::NonNull;

use crate::{AccessError, page_size};

/// 一段已映射的物理内存
///
/// 映射在值被 drop 时解除。
pub trait MappedRegion {
    /// 映射起始处的可写指针
    fn as_mut_ptr(&mut self) -> *mut u8;

    /// 映射长度（字节）
    fn size(&self) -> usize;
}

/// 物理地址空间后端
///
/// 实现必须可以被多个线程同时调用 [`PhysMem::map`]：每次调用返回独立的映射，
/// 不允许保存任何与调用顺序相关的状态。
pub trait PhysMem: Send + Sync {
    /// 映射粒度（页大小）
    fn page_size(&self) -> usize;

    /// 以读写、共享方式映射 `[base, base + len)`
    ///
    /// `base` 已按 [`PhysMem::page_size`] 对齐，`len` 是页大小的整数倍。
    fn map(&self, base: u64, len: usize) -> Result<Box<dyn MappedRegion + '_>, AccessError>;
}

/// 基于物理内存设备句柄（如 `/dev/mem`）的后端
///
/// 句柄由调用方打开并交给 [`DevMem::new`]；此类型只用它发起映射。
#[derive(Debug)]
pub struct DevMem {
    file: File,
}

impl DevMem {
    /// 以已打开的读写句柄创建后端
    pub fn new(file: File) -> Self {
        Self { file }
    }
}

impl PhysMem for DevMem {
    fn page_size(&self) -> usize {
        page_size()
    }

    fn map(&self, base: u64, len: usize) -> Result<Box<dyn MappedRegion + '_>, AccessError> {
        let mapping_error = |source| AccessError::Mapping { base, len, source };

        let offset = libc::off_t::try_from(base)
            .map_err(|_| mapping_error(io::Error::from(io::ErrorKind::InvalidInput)))?;

        // SAFETY: 让内核选择映射地址，不会覆盖已有映射；fd 在 self 存活期间有效
        let addr = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                self.file.as_raw_fd(),
                offset,
            )
        };
        if addr == libc::MAP_FAILED {
            let source = io::Error::last_os_error();
            log::error!("can't map devmem at {base:#x}: {source}");
            return Err(mapping_error(source));
        }
        let ptr = NonNull::new(addr.cast::<u8>()).ok_or_else(|| {
            mapping_error(io::Error::other("mmap returned a null mapping"))
        })?;

        log::trace!("mapped {len:#x} bytes at phys {base:#x} to {:p}", ptr);
        Ok(Box::new(DevMemRegion { ptr, len }))
    }
}

/// `DevMem` 的一次映射
struct DevMemRegion {
    ptr: NonNull<u8>,
    len: usize,
}

impl MappedRegion for DevMemRegion {
    fn as_mut_ptr(&mut self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    fn size(&self) -> usize {
        self.len
    }
}

impl Drop for DevMemRegion {
    fn drop(&mut self) {
        // SAFETY: ptr/len 正是 mmap 返回的映射，且只在这里解除一次
        let ret = unsafe { libc::munmap(self.ptr.as_ptr().cast(), self.len) };
        if ret != 0 {
            log::error!("can't unmap devmem: {}", io::Error::last_os_error());
        }
    }
}
