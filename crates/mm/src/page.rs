//! 页大小与映射窗口

use once_cell::sync::Lazy;

use crate::RegWidth;

/// 页大小查询失败时的回退值
const FALLBACK_PAGE_SIZE: usize = 4096;

static PAGE_SIZE: Lazy<usize> = Lazy::new(|| {
    // SAFETY: sysconf 没有内存安全方面的前置条件
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if size > 0 {
        size as usize
    } else {
        log::warn!("sysconf(_SC_PAGESIZE) failed, assuming {FALLBACK_PAGE_SIZE}");
        FALLBACK_PAGE_SIZE
    }
});

/// 获取本机页大小
#[inline]
pub fn page_size() -> usize {
    *PAGE_SIZE
}

/// 一次寄存器访问所需的映射窗口
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapWindow {
    /// 映射起始物理地址（页对齐）
    pub page_base: u64,
    /// 目标地址在映射内的偏移
    pub offset_in_page: usize,
    /// 映射长度：一页，或访问跨页时两页
    pub len: usize,
}

impl MapWindow {
    /// 计算覆盖 `[addr, addr + width.bytes())` 的映射窗口
    ///
    /// `page_size` 必须是 2 的幂。
    pub fn new(addr: u64, width: RegWidth, page_size: usize) -> Self {
        debug_assert!(page_size.is_power_of_two());

        let mask = page_size as u64 - 1;
        let offset_in_page = (addr & mask) as usize;
        let len = if offset_in_page + width.bytes() > page_size {
            page_size * 2
        } else {
            page_size
        };

        Self {
            page_base: addr & !mask,
            offset_in_page,
            len,
        }
    }

    /// 访问是否跨越页边界
    pub fn spans_pages(&self, page_size: usize) -> bool {
        self.len > page_size
    }
}
