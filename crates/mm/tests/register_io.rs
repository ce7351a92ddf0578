use std::sync::Arc;

use mm::{AccessError, MappedRegister, PhysMem, RegWidth, RegisterIo};
use test_support::SimPhysMem;

const BASE: u64 = 0x1000_0000;
const PAGE: usize = 4096;

fn setup() -> (Arc<SimPhysMem>, RegisterIo) {
    let mem = Arc::new(SimPhysMem::new(BASE, 4 * PAGE));
    let io = RegisterIo::new(mem.clone());
    (mem, io)
}

/// 页首、页中、页尾（强制跨页）三种偏移
fn offsets() -> [u64; 3] {
    [0, 0x800, PAGE as u64 - 1]
}

#[test]
fn test_read_all_widths_and_offsets() {
    let (mem, io) = setup();
    for (bits, bytes, value) in [
        (8, 1, 0xa5u64),
        (16, 2, 0xbeef),
        (32, 4, 0xdead_beef),
        (64, 8, 0x0123_4567_89ab_cdef),
    ] {
        for offset in offsets() {
            let addr = BASE + PAGE as u64 + offset;
            mem.poke_value(addr, bytes, value);
            assert_eq!(io.read(addr, bits).unwrap(), value, "width {bits} offset {offset:#x}");
        }
    }
    assert_eq!(mem.live_mappings(), 0);
}

#[test]
fn test_write_all_widths_and_offsets() {
    let (mem, io) = setup();
    for (bits, bytes, value) in [
        (8, 1, 0x5au64),
        (16, 2, 0xcafe),
        (32, 4, 0x1234_5678),
        (64, 8, 0xfedc_ba98_7654_3210),
    ] {
        for offset in offsets() {
            let addr = BASE + PAGE as u64 + offset;
            io.write(addr, bits, value).unwrap();
            assert_eq!(mem.peek_value(addr, bytes), value, "width {bits} offset {offset:#x}");
        }
    }
    assert_eq!(mem.live_mappings(), 0);
}

#[test]
fn test_write_does_not_touch_neighbours() {
    let (mem, io) = setup();
    let addr = BASE + 0x104;
    mem.poke(addr - 4, &[0xff; 12]);
    io.write(addr, 16, 0).unwrap();
    assert_eq!(
        mem.peek(addr - 4, 12),
        [0xff, 0xff, 0xff, 0xff, 0, 0, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]
    );
}

#[test]
fn test_single_page_mapping() {
    let (mem, io) = setup();
    io.read(BASE + PAGE as u64 + 0x10, 32).unwrap();
    assert_eq!(mem.map_requests(), vec![(BASE + PAGE as u64, PAGE)]);
}

#[test]
fn test_page_spanning_mapping() {
    let (mem, io) = setup();
    let addr = BASE + 2 * PAGE as u64 - 2;
    io.write(addr, 32, 0xaabb_ccdd).unwrap();
    assert_eq!(mem.map_requests(), vec![(BASE + PAGE as u64, 2 * PAGE)]);
    assert_eq!(io.read(addr, 32).unwrap(), 0xaabb_ccdd);
}

#[test]
fn test_invalid_width_never_maps() {
    let (mem, io) = setup();
    assert!(matches!(io.read(BASE, 24), Err(AccessError::InvalidWidth(24))));
    assert!(matches!(io.write(BASE, 0, 1), Err(AccessError::InvalidWidth(0))));
    assert!(mem.map_requests().is_empty());
}

#[test]
fn test_value_too_wide_never_maps() {
    let (mem, io) = setup();
    mem.poke_value(BASE, 1, 0x12);
    assert!(matches!(
        io.write(BASE, 8, 0x100),
        Err(AccessError::ValueTooWide { value: 0x100, bits: 8 })
    ));
    assert!(mem.map_requests().is_empty());
    assert_eq!(mem.peek_value(BASE, 1), 0x12);
}

#[test]
fn test_mapping_failure() {
    let (mem, io) = setup();
    mem.set_fail_maps(true);
    assert!(matches!(io.read(BASE, 32), Err(AccessError::Mapping { .. })));
    assert!(matches!(io.write(BASE, 32, 1), Err(AccessError::Mapping { .. })));
    assert_eq!(mem.live_mappings(), 0);
}

#[test]
fn test_out_of_range() {
    let (mem, io) = setup();
    assert!(matches!(io.read(BASE + 8 * PAGE as u64, 32), Err(AccessError::OutOfRange { .. })));
    assert_eq!(mem.live_mappings(), 0);
}

#[test]
fn test_mapped_register_releases_on_drop() {
    let mem = SimPhysMem::new(BASE, PAGE);
    {
        let mut reg =
            MappedRegister::map(&mem as &dyn PhysMem, BASE + 8, RegWidth::Double).unwrap();
        assert_eq!(mem.live_mappings(), 1);
        reg.write(7);
        assert_eq!(reg.read(), 7);
        assert_eq!(reg.width(), RegWidth::Double);
    }
    assert_eq!(mem.live_mappings(), 0);
    assert_eq!(mem.peek_value(BASE + 8, 8), 7);
}

#[test]
fn test_overlapping_mappings_keep_each_write() {
    let mem = SimPhysMem::new(BASE, PAGE);
    let phys = &mem as &dyn PhysMem;

    let mut reader = MappedRegister::map(phys, BASE, RegWidth::Word).unwrap();
    let mut writer = MappedRegister::map(phys, BASE + 4, RegWidth::Word).unwrap();
    assert_eq!(mem.live_mappings(), 2);

    writer.write(0x1234);
    drop(writer);
    assert_eq!(reader.read(), 0);
    // 先映射、后释放的只读窗口不能把旧内容写回
    drop(reader);

    assert_eq!(mem.live_mappings(), 0);
    assert_eq!(mem.peek_value(BASE + 4, 4), 0x1234);
}
