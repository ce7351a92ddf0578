//! 物理内存后端的 Mock 实现

use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use mm::{AccessError, MappedRegion, PhysMem};

/// 模拟的物理地址空间
///
/// 以一段字节数组模拟 `[base, base + size)` 的物理内存。每次映射复制出对应窗口，
/// 映射 drop 时只写回被改动过的字节，所以同一页上并发的访问不会互相覆盖。
/// 同时记录所有映射请求，并统计尚未解除的映射数量。
pub struct SimPhysMem {
    base: u64,
    page_size: usize,
    mem: Mutex<Vec<u8>>,
    requests: Mutex<Vec<(u64, usize)>>,
    live: AtomicUsize,
    fail_maps: AtomicBool,
}

impl SimPhysMem {
    /// 创建页大小为 4096 的模拟内存
    pub fn new(base: u64, size: usize) -> Self {
        Self::with_page_size(base, size, 4096)
    }

    /// 以指定页大小创建模拟内存
    pub fn with_page_size(base: u64, size: usize, page_size: usize) -> Self {
        Self {
            base,
            page_size,
            mem: Mutex::new(vec![0; size]),
            requests: Mutex::new(Vec::new()),
            live: AtomicUsize::new(0),
            fail_maps: AtomicBool::new(false),
        }
    }

    fn mem(&self) -> MutexGuard<'_, Vec<u8>> {
        self.mem.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn index(&self, addr: u64, len: usize) -> usize {
        let start = (addr - self.base) as usize;
        assert!(start + len <= self.mem().len(), "address {addr:#x} outside simulated memory");
        start
    }

    /// 直接写入字节（不经过映射，不记录请求）
    pub fn poke(&self, addr: u64, bytes: &[u8]) {
        let start = self.index(addr, bytes.len());
        self.mem()[start..start + bytes.len()].copy_from_slice(bytes);
    }

    /// 直接读取字节
    pub fn peek(&self, addr: u64, len: usize) -> Vec<u8> {
        let start = self.index(addr, len);
        self.mem()[start..start + len].to_vec()
    }

    /// 以本机字节序写入 `bytes` 字节宽的值
    pub fn poke_value(&self, addr: u64, bytes: usize, value: u64) {
        match bytes {
            1 => self.poke(addr, &(value as u8).to_ne_bytes()),
            2 => self.poke(addr, &(value as u16).to_ne_bytes()),
            4 => self.poke(addr, &(value as u32).to_ne_bytes()),
            8 => self.poke(addr, &value.to_ne_bytes()),
            _ => panic!("unsupported value size {bytes}"),
        }
    }

    /// 以本机字节序读取 `bytes` 字节宽的值
    pub fn peek_value(&self, addr: u64, bytes: usize) -> u64 {
        let raw = self.peek(addr, bytes);
        match bytes {
            1 => raw[0] as u64,
            2 => u16::from_ne_bytes([raw[0], raw[1]]) as u64,
            4 => u32::from_ne_bytes([raw[0], raw[1], raw[2], raw[3]]) as u64,
            8 => {
                let mut buf = [0u8; 8];
                buf.copy_from_slice(&raw);
                u64::from_ne_bytes(buf)
            }
            _ => panic!("unsupported value size {bytes}"),
        }
    }

    /// 至今收到的所有映射请求 `(base, len)`
    pub fn map_requests(&self) -> Vec<(u64, usize)> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// 尚未解除的映射数量
    pub fn live_mappings(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// 让之后的映射请求全部失败
    pub fn set_fail_maps(&self, fail: bool) {
        self.fail_maps.store(fail, Ordering::SeqCst);
    }
}

impl PhysMem for SimPhysMem {
    fn page_size(&self) -> usize {
        self.page_size
    }

    fn map(&self, base: u64, len: usize) -> Result<Box<dyn MappedRegion + '_>, AccessError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((base, len));

        if self.fail_maps.load(Ordering::SeqCst) {
            return Err(AccessError::Mapping {
                base,
                len,
                source: io::Error::other("simulated mapping failure"),
            });
        }

        let mem = self.mem();
        let start = base
            .checked_sub(self.base)
            .map(|off| off as usize)
            .filter(|&start| start + len <= mem.len())
            .ok_or(AccessError::OutOfRange { base, len })?;
        let original = mem[start..start + len].to_vec();
        drop(mem);

        self.live.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(SimRegion {
            owner: self,
            start,
            buf: original.clone(),
            original,
        }))
    }
}

/// `SimPhysMem` 的一次映射：窗口副本，drop 时写回改动过的字节
struct SimRegion<'a> {
    owner: &'a SimPhysMem,
    start: usize,
    buf: Vec<u8>,
    original: Vec<u8>,
}

impl MappedRegion for SimRegion<'_> {
    fn as_mut_ptr(&mut self) -> *mut u8 {
        self.buf.as_mut_ptr()
    }

    fn size(&self) -> usize {
        self.buf.len()
    }
}

impl Drop for SimRegion<'_> {
    fn drop(&mut self) {
        let mut mem = self.owner.mem();
        let window = &mut mem[self.start..self.start + self.buf.len()];
        for ((cell, &new), &old) in window.iter_mut().zip(&self.buf).zip(&self.original) {
            if new != old {
                *cell = new;
            }
        }
        drop(mem);
        self.owner.live.fetch_sub(1, Ordering::SeqCst);
    }
}
