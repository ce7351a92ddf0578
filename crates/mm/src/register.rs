//! 寄存器读写引擎

use std::ptr;
use std::sync::Arc;

use crate::{AccessError, MapWindow, MappedRegion, PhysMem, RegWidth};

/// 已映射的寄存器
///
/// 持有覆盖寄存器的映射，离开作用域时映射随之解除（包括出错返回的路径）。
/// 每次 [`read`](MappedRegister::read) / [`write`](MappedRegister::write)
/// 恰好执行一次与位宽相符的 volatile 访问，不会拆成逐字节访问。
pub struct MappedRegister<'a> {
    region: Box<dyn MappedRegion + 'a>,
    offset: usize,
    width: RegWidth,
}

impl<'a> MappedRegister<'a> {
    /// 映射 `addr` 处宽度为 `width` 的寄存器
    pub fn map(mem: &'a dyn PhysMem, addr: u64, width: RegWidth) -> Result<Self, AccessError> {
        let page_size = mem.page_size();
        let window = MapWindow::new(addr, width, page_size);
        if window.spans_pages(page_size) {
            log::debug!("register at {addr:#x} spans a page boundary, mapping two pages");
        }

        let region = mem.map(window.page_base, window.len)?;
        if window.offset_in_page + width.bytes() > region.size() {
            return Err(AccessError::OutOfRange {
                base: window.page_base,
                len: region.size(),
            });
        }

        Ok(Self {
            region,
            offset: window.offset_in_page,
            width,
        })
    }

    /// 寄存器位宽
    pub fn width(&self) -> RegWidth {
        self.width
    }

    fn ptr(&mut self) -> *mut u8 {
        // SAFETY: map() 已检查 offset + width 不超过映射长度
        unsafe { self.region.as_mut_ptr().add(self.offset) }
    }

    /// 读取寄存器，结果零扩展为 u64
    pub fn read(&mut self) -> u64 {
        let ptr = self.ptr();
        // SAFETY: ptr 起始的 width 字节位于当前映射内
        unsafe {
            match self.width {
                RegWidth::Byte => ptr::read_volatile(ptr) as u64,
                RegWidth::Half => load(ptr, u16::from_ne_bytes) as u64,
                RegWidth::Word => load(ptr, u32::from_ne_bytes) as u64,
                RegWidth::Double => load(ptr, u64::from_ne_bytes),
            }
        }
    }

    /// 写入寄存器
    ///
    /// `value` 超出位宽的高位被丢弃；需要拒绝越界值的调用方应先用
    /// [`RegWidth::check_value`] 检查。
    pub fn write(&mut self, value: u64) {
        let ptr = self.ptr();
        // SAFETY: ptr 起始的 width 字节位于当前映射内
        unsafe {
            match self.width {
                RegWidth::Byte => ptr::write_volatile(ptr, value as u8),
                RegWidth::Half => store(ptr, value as u16, u16::to_ne_bytes),
                RegWidth::Word => store(ptr, value as u32, u32::to_ne_bytes),
                RegWidth::Double => store(ptr, value, u64::to_ne_bytes),
            }
        }
    }
}

/// 单次 volatile 读取 `T`
///
/// 地址未对齐时（跨页访问必然如此）改为读取同尺寸的字节数组，
/// 避免解引用未对齐的类型指针。
///
/// # Safety
/// `ptr` 起始的 `N` 字节必须可读。
unsafe fn load<T: Copy, const N: usize>(ptr: *mut u8, from_bytes: fn([u8; N]) -> T) -> T {
    let typed = ptr.cast::<T>();
    if typed.is_aligned() {
        // SAFETY: 调用者保证可读，且已对齐
        unsafe { ptr::read_volatile(typed) }
    } else {
        // SAFETY: [u8; N] 的对齐要求为 1
        from_bytes(unsafe { ptr::read_volatile(ptr.cast::<[u8; N]>()) })
    }
}

/// 单次 volatile 写入 `T`，未对齐时的处理同 [`load`]
///
/// # Safety
/// `ptr` 起始的 `N` 字节必须可写。
unsafe fn store<T: Copy, const N: usize>(ptr: *mut u8, value: T, to_bytes: fn(T) -> [u8; N]) {
    let typed = ptr.cast::<T>();
    if typed.is_aligned() {
        // SAFETY: 调用者保证可写，且已对齐
        unsafe { ptr::write_volatile(typed, value) }
    } else {
        // SAFETY: [u8; N] 的对齐要求为 1
        unsafe { ptr::write_volatile(ptr.cast::<[u8; N]>(), to_bytes(value)) }
    }
}

/// 寄存器读写引擎
///
/// 每次访问都独立映射、访问、解除映射，不缓存任何映射。
#[derive(Clone)]
pub struct RegisterIo {
    mem: Arc<dyn PhysMem>,
}

impl RegisterIo {
    /// 以给定物理内存后端创建引擎
    pub fn new(mem: Arc<dyn PhysMem>) -> Self {
        Self { mem }
    }

    /// 读取 `addr` 处宽度为 `width` 位的寄存器
    ///
    /// 非法位宽在尝试映射之前即返回 [`AccessError::InvalidWidth`]。
    pub fn read(&self, addr: u64, width: u32) -> Result<u64, AccessError> {
        let width = RegWidth::try_from(width)?;
        let mut reg = MappedRegister::map(self.mem.as_ref(), addr, width)?;
        Ok(reg.read())
    }

    /// 向 `addr` 处宽度为 `width` 位的寄存器写入 `value`
    ///
    /// 非法位宽或超出位宽的值在尝试映射之前即被拒绝，寄存器保持不变。
    pub fn write(&self, addr: u64, width: u32, value: u64) -> Result<(), AccessError> {
        let width = RegWidth::try_from(width)?;
        let value = width.check_value(value)?;
        let mut reg = MappedRegister::map(self.mem.as_ref(), addr, width)?;
        reg.write(value);
        Ok(())
    }
}
