use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use embedded_storage::nor_flash::{NorFlash, NorFlashError, NorFlashErrorKind, ReadNorFlash};
use spif_core::geometry::{find_by_name, FlashGeometry, JedecId, KNOWN_CHIPS};
use spif_core::shared::SharedFlash;
use spif_core::spi::opcodes;
use spif_core::transport::{BusMode, FlashBus, QspiBus, SpiBus};
use spif_core::{DriverConfig, Error, FlashDriver, PollConfig, UnknownChipPolicy};

use super::*;

fn spi_flash_with(config: DummyConfig, driver: DriverConfig) -> DummySpiFlash {
    let bus = SpiBus::new(DummySpi::new(DummyChip::new(config)));
    FlashDriver::init(bus, DummyPlatform::default(), driver).unwrap()
}

fn spi_flash(config: DummyConfig) -> DummySpiFlash {
    spi_flash_with(config, DriverConfig::default())
}

fn qspi_flash(config: DummyConfig) -> DummyQspiFlash {
    let bus = QspiBus::new(DummyQspi::new(DummyChip::new(config)));
    FlashDriver::init(bus, DummyPlatform::default(), DriverConfig::default()).unwrap()
}

fn spi_chip(flash: &DummySpiFlash) -> &DummyChip {
    flash.bus().transport().chip()
}

fn spi_chip_mut(flash: &mut DummySpiFlash) -> &mut DummyChip {
    flash.bus_mut().transport_mut().chip_mut()
}

fn qspi_chip(flash: &DummyQspiFlash) -> &DummyChip {
    flash.bus().transport().chip()
}

fn quiet() -> DummyConfig {
    DummyConfig::default().with_busy_polls(0)
}

#[test]
fn test_init_detects_first_table_entry() {
    let flash = spi_flash(DummyConfig::default());
    assert_eq!(flash.geometry_index(), 0);
    assert_eq!(flash.geometry().name, "W25Q128JV-IN/IQ/JQ");
    assert_eq!(flash.jedec_id(), JedecId::new(0xEF, 0x40, 0x18));
    assert_eq!(flash.mode(), BusMode::Spi);
    assert_eq!(flash.bus().transport().stats().inits, 1);
    assert_eq!(spi_chip(&flash).opcodes(), vec![opcodes::RDID]);
}

#[test]
fn test_init_detects_each_known_chip() {
    for (index, geometry) in KNOWN_CHIPS.iter().enumerate() {
        let flash = spi_flash(DummyConfig::from_geometry(geometry));
        assert_eq!(flash.geometry_index(), index, "{}", geometry.name);

        let flash = qspi_flash(DummyConfig::from_geometry(geometry));
        assert_eq!(flash.geometry_index(), index, "{}", geometry.name);
        assert_eq!(flash.mode(), BusMode::Qspi);
    }
}

#[test]
fn test_init_gt25q40d_geometry() {
    let geometry = find_by_name(KNOWN_CHIPS, "GT25Q40D").unwrap();
    let flash = spi_flash(DummyConfig::from_geometry(geometry));
    assert_eq!(flash.geometry_index(), 1);
    assert_eq!(flash.geometry().chip_size, 512 * 1024);
    assert_eq!(flash.geometry().block_size, 32 * 1024);
}

#[test]
fn test_init_rejects_unknown_chip() {
    let id = JedecId::new(0x12, 0x34, 0x56);
    let config = DummyConfig {
        jedec_id: id,
        ..DummyConfig::default()
    };
    let bus = SpiBus::new(DummySpi::new(DummyChip::new(config)));
    let result = FlashDriver::init(bus, DummyPlatform::default(), DriverConfig::default());
    assert_eq!(result.err(), Some(Error::UnsupportedChip(id)));
}

static BAD_PAGE_TABLE: &[FlashGeometry] = &[FlashGeometry {
    name: "W25Q128JV-BAD",
    manufacturer_id: 0xEF,
    memory_type_id: 0x40,
    capacity_id: 0x18,
    chip_size: 16 * 1024 * 1024,
    block_size: 64 * 1024,
    sector_size: 4 * 1024,
    page_size: 0,
}];

#[test]
fn test_init_rejects_invalid_geometry() {
    let bus = SpiBus::new(DummySpi::new(DummyChip::new(DummyConfig::default())));
    let result = FlashDriver::init(
        bus,
        DummyPlatform::default(),
        DriverConfig::default().with_chips(BAD_PAGE_TABLE),
    );
    assert_eq!(result.err(), Some(Error::InvalidGeometry));
}

#[test]
fn test_init_unknown_chip_fallback() {
    let config = DummyConfig {
        jedec_id: JedecId::new(0x12, 0x34, 0x56),
        ..DummyConfig::default()
    };
    let flash = spi_flash_with(
        config,
        DriverConfig::default().with_unknown_chip(UnknownChipPolicy::FallbackToFirst),
    );
    assert_eq!(flash.geometry_index(), 0);
    assert_eq!(flash.jedec_id(), JedecId::new(0x12, 0x34, 0x56));
}

#[test]
fn test_program_then_read_page() {
    let mut flash = spi_flash(DummyConfig::default());
    flash.page_program(0x1000, &[0x11; 256]).unwrap();

    let mut buf = [0u8; 256];
    flash.read(0x1000, &mut buf).unwrap();
    assert_eq!(buf, [0x11; 256]);
}

#[test]
fn test_program_then_read_page_qspi() {
    let mut flash = qspi_flash(DummyConfig::default());
    flash.page_program(0x1000, &[0x11; 256]).unwrap();

    let mut buf = [0u8; 256];
    flash.read(0x1000, &mut buf).unwrap();
    assert_eq!(buf, [0x11; 256]);

    let chip = flash.bus().transport().chip();
    let pp = chip
        .log()
        .iter()
        .find(|t| t.opcode == opcodes::PP)
        .copied()
        .unwrap();
    assert_eq!(pp.address, Some(0x1000));
    assert_eq!(pp.write_len, 256);
}

#[test]
fn test_program_partial_pages() {
    let mut flash = spi_flash(quiet());
    for (addr, len) in [(0x2000u32, 1usize), (0x20FF, 1), (0x2310, 0xF0), (0x2400, 17)] {
        let data: Vec<u8> = (0..len).map(|i| i as u8 ^ 0x5A).collect();
        flash.page_program(addr, &data).unwrap();

        let mut buf = vec![0u8; len];
        flash.read(addr, &mut buf).unwrap();
        assert_eq!(buf, data, "addr 0x{:X}", addr);
    }
}

#[test]
fn test_program_crossing_page_rejected_without_bus_activity() {
    let mut flash = spi_flash(DummyConfig::default());
    flash.page_program(0x1000, &[0x22; 18]).unwrap();

    let frames = flash.bus().transport().stats().frames;
    let locks = flash.bus().transport().stats().locks;
    spi_chip_mut(&mut flash).clear_log();

    assert_eq!(
        flash.page_program(0x1012, &[0x11; 256]),
        Err(Error::PageBoundary)
    );
    assert_eq!(flash.bus().transport().stats().frames, frames);
    assert_eq!(flash.bus().transport().stats().locks, locks);
    assert!(spi_chip(&flash).log().is_empty());

    let data = spi_chip(&flash).data();
    assert!(data[0x1000..0x1012].iter().all(|&b| b == 0x22));
    assert!(data[0x1012..0x1100].iter().all(|&b| b == 0xFF));
}

#[test]
fn test_program_larger_than_page_rejected() {
    let mut flash = spi_flash(DummyConfig::default());
    assert_eq!(
        flash.page_program(0x1000, &[0x00; 257]),
        Err(Error::PageBoundary)
    );
}

#[test]
fn test_sector_erase_reads_back_erased() {
    let mut flash = spi_flash(DummyConfig::default());
    flash.page_program(0x1000, &[0x00; 256]).unwrap();
    flash.page_program(0x2000, &[0x00; 256]).unwrap();

    flash.sector_erase(0x1000).unwrap();

    let mut buf = [0u8; 256];
    flash.read(0x1000, &mut buf).unwrap();
    assert_eq!(buf, [0xFF; 256]);

    // The next sector is untouched
    flash.read(0x2000, &mut buf).unwrap();
    assert_eq!(buf, [0x00; 256]);
}

#[test]
fn test_sector_erase_unaligned_address_erases_containing_sector() {
    let mut flash = spi_flash(DummyConfig::default());
    flash.write(0x3000, &[0x00; 4096]).unwrap();
    flash.sector_erase(0x3ABC).unwrap();
    assert!(spi_chip(&flash).data()[0x3000..0x4000]
        .iter()
        .all(|&b| b == 0xFF));
}

#[test]
fn test_block_erases() {
    let mut flash = spi_flash(DummyConfig::default());
    flash.page_program(0x10000, &[0x00; 16]).unwrap();
    flash.page_program(0x18000, &[0x00; 16]).unwrap();

    flash.block_erase_32(0x18010).unwrap();
    let data = spi_chip(&flash).data();
    assert!(data[0x18000..0x20000].iter().all(|&b| b == 0xFF));
    assert_eq!(&data[0x10000..0x10010], &[0x00; 16]);

    flash.block_erase_64(0x1FFFF).unwrap();
    assert!(spi_chip(&flash).data()[0x10000..0x20000]
        .iter()
        .all(|&b| b == 0xFF));
}

#[test]
fn test_chip_erase() {
    let mut flash = spi_flash(DummyConfig::default());
    flash.page_program(0, &[0x00; 256]).unwrap();
    flash.page_program(0xFFFF00, &[0x00; 256]).unwrap();

    flash.chip_erase().unwrap();
    assert!(spi_chip(&flash).data().iter().all(|&b| b == 0xFF));
    assert!(spi_chip(&flash).opcodes().contains(&opcodes::CE_C7));
}

#[test]
fn test_program_crossing_page_rejected_qspi() {
    let mut flash = qspi_flash(DummyConfig::default());
    flash.page_program(0x1000, &[0x22; 18]).unwrap();
    let frames = flash.bus().transport().stats().frames;

    assert_eq!(
        flash.page_program(0x1012, &[0x11; 256]),
        Err(Error::PageBoundary)
    );
    assert_eq!(flash.bus().transport().stats().frames, frames);

    let data = qspi_chip(&flash).data();
    assert!(data[0x1000..0x1012].iter().all(|&b| b == 0x22));
    assert!(data[0x1012..0x1100].iter().all(|&b| b == 0xFF));
}

#[test]
fn test_erases_qspi() {
    let mut flash = qspi_flash(DummyConfig::default());
    let mut buf = [0u8; 16];

    flash.page_program(0x1000, &[0x00; 16]).unwrap();
    flash.sector_erase(0x1000).unwrap();
    flash.read(0x1000, &mut buf).unwrap();
    assert_eq!(buf, [0xFF; 16]);

    flash.page_program(0x18000, &[0x00; 16]).unwrap();
    flash.block_erase_32(0x18000).unwrap();
    flash.read(0x18000, &mut buf).unwrap();
    assert_eq!(buf, [0xFF; 16]);

    flash.page_program(0x20000, &[0x00; 16]).unwrap();
    flash.block_erase_64(0x2F000).unwrap();
    flash.read(0x20000, &mut buf).unwrap();
    assert_eq!(buf, [0xFF; 16]);

    flash.page_program(0xFFFF00, &[0x00; 16]).unwrap();
    flash.chip_erase().unwrap();
    assert!(qspi_chip(&flash).data().iter().all(|&b| b == 0xFF));

    let erases: Vec<(u8, Option<u32>)> = qspi_chip(&flash)
        .log()
        .iter()
        .filter(|t| {
            matches!(
                t.opcode,
                opcodes::SE_20 | opcodes::BE_52 | opcodes::BE_D8 | opcodes::CE_C7
            )
        })
        .map(|t| (t.opcode, t.address))
        .collect();
    assert_eq!(
        erases,
        vec![
            (opcodes::SE_20, Some(0x1000)),
            (opcodes::BE_52, Some(0x18000)),
            (opcodes::BE_D8, Some(0x2F000)),
            (opcodes::CE_C7, None)
        ]
    );
}

#[test]
fn test_program_sequence_is_bracketed() {
    let mut flash = spi_flash(quiet());
    spi_chip_mut(&mut flash).clear_log();

    flash.page_program(0x1000, &[0xA5; 4]).unwrap();
    assert_eq!(
        spi_chip(&flash).opcodes(),
        vec![
            opcodes::WREN,
            opcodes::RDSR,
            opcodes::PP,
            opcodes::RDSR,
            opcodes::WRDI
        ]
    );
}

#[test]
fn test_erase_waits_until_idle() {
    let mut flash = spi_flash(DummyConfig::default().with_busy_polls(2));
    spi_chip_mut(&mut flash).clear_log();

    flash.sector_erase(0).unwrap();
    assert_eq!(
        spi_chip(&flash).opcodes(),
        vec![
            opcodes::WREN,
            opcodes::RDSR,
            opcodes::SE_20,
            opcodes::RDSR,
            opcodes::RDSR,
            opcodes::RDSR,
            opcodes::WRDI
        ]
    );

    let (_bus, platform) = flash.release().unwrap();
    assert_eq!(platform.delays, 2);
    assert_eq!(
        platform.total_us,
        2 * DriverConfig::default().erase_poll.delay_us as u64
    );
}

#[test]
fn test_reads_are_not_bracketed() {
    let mut flash = spi_flash(DummyConfig::default());
    flash.page_program(0x4000, &[0x3C; 32]).unwrap();
    spi_chip_mut(&mut flash).clear_log();

    let mut buf = [0u8; 32];
    flash.read(0x4000, &mut buf).unwrap();
    flash.fast_read(0x4000, &mut buf).unwrap();
    assert_eq!(buf, [0x3C; 32]);
    assert_eq!(
        spi_chip(&flash).opcodes(),
        vec![opcodes::READ, opcodes::FAST_READ]
    );
    assert_eq!(flash.bus().transport().stats().locks, 1);
}

#[test]
fn test_fast_read_qspi() {
    let mut flash = qspi_flash(DummyConfig::default());
    flash.page_program(0x4000, &[0x3C; 32]).unwrap();

    let mut buf = [0u8; 32];
    flash.fast_read(0x4000, &mut buf).unwrap();
    assert_eq!(buf, [0x3C; 32]);
}

#[test]
fn test_stuck_busy_times_out_within_bound() {
    let mut flash = spi_flash_with(
        quiet(),
        DriverConfig::default().with_poll(PollConfig::new(10, 1)),
    );
    spi_chip_mut(&mut flash).set_stuck_busy(true);
    spi_chip_mut(&mut flash).clear_log();

    assert_eq!(flash.page_program(0, &[0x00; 4]), Err(Error::Timeout));

    let ops = spi_chip(&flash).opcodes();
    assert_eq!(&ops[..3], &[opcodes::WREN, opcodes::RDSR, opcodes::PP]);
    assert_eq!(ops.len(), 3 + 10);
    assert!(ops[3..].iter().all(|&op| op == opcodes::RDSR));

    let stats = flash.bus().transport().stats();
    assert_eq!(stats.locks, 1);
    assert_eq!(stats.unlocks, 1);
}

#[test]
fn test_transport_error_propagates_and_releases_lock() {
    let mut flash = spi_flash(quiet());
    spi_chip_mut(&mut flash).fail_on(Some(opcodes::PP));
    spi_chip_mut(&mut flash).clear_log();

    assert_eq!(flash.page_program(0, &[0x00; 4]), Err(Error::Transport));
    assert_eq!(
        spi_chip(&flash).opcodes(),
        vec![opcodes::WREN, opcodes::RDSR, opcodes::PP]
    );

    let stats = flash.bus().transport().stats();
    assert_eq!(stats.locks, stats.unlocks);

    // The bus is usable again afterwards
    spi_chip_mut(&mut flash).fail_on(None);
    flash.page_program(0, &[0x00; 4]).unwrap();
}

#[test]
fn test_out_of_bounds_rejected_without_bus_activity() {
    let mut flash = spi_flash(DummyConfig::default());
    let frames = flash.bus().transport().stats().frames;

    let mut buf = [0u8; 512];
    assert_eq!(
        flash.read(0xFF_FF00, &mut buf),
        Err(Error::AddressOutOfBounds)
    );
    assert_eq!(
        flash.fast_read(0x100_0000, &mut buf[..1]),
        Err(Error::AddressOutOfBounds)
    );
    assert_eq!(
        flash.sector_erase(0x100_0000),
        Err(Error::AddressOutOfBounds)
    );
    assert_eq!(
        flash.write(0xFF_FFF0, &[0u8; 32]),
        Err(Error::AddressOutOfBounds)
    );
    assert_eq!(flash.bus().transport().stats().frames, frames);

    // Last byte is fine
    flash.read(0xFF_FFFF, &mut buf[..1]).unwrap();
}

#[test]
fn test_write_splits_at_page_boundaries() {
    let mut flash = spi_flash(DummyConfig::default());
    let data: Vec<u8> = (0..600u32).map(|i| (i * 7) as u8).collect();
    spi_chip_mut(&mut flash).clear_log();

    flash.write(0x10F0, &data).unwrap();

    let programs: Vec<(Option<u32>, usize)> = spi_chip(&flash)
        .log()
        .iter()
        .filter(|t| t.opcode == opcodes::PP)
        .map(|t| (t.address, t.write_len))
        .collect();
    assert_eq!(
        programs,
        vec![
            (Some(0x10F0), 0x10),
            (Some(0x1100), 256),
            (Some(0x1200), 256),
            (Some(0x1300), 72)
        ]
    );

    let mut buf = vec![0u8; data.len()];
    flash.read(0x10F0, &mut buf).unwrap();
    assert_eq!(buf, data);
    assert_eq!(flash.bus().transport().stats().locks, 1);
}

#[test]
fn test_read_chunked_by_transport_limit() {
    let spi = DummySpi::new(DummyChip::new(DummyConfig::default())).with_max_read_len(64);
    let mut flash =
        FlashDriver::init(SpiBus::new(spi), DummyPlatform::default(), DriverConfig::default())
            .unwrap();
    flash.write(0x1000, &[0x42; 256]).unwrap();
    spi_chip_mut(&mut flash).clear_log();

    let mut buf = [0u8; 256];
    flash.read(0x1000, &mut buf).unwrap();
    assert_eq!(buf, [0x42; 256]);

    let reads: Vec<Option<u32>> = spi_chip(&flash).log().iter().map(|t| t.address).collect();
    assert_eq!(
        reads,
        vec![Some(0x1000), Some(0x1040), Some(0x1080), Some(0x10C0)]
    );
}

#[test]
fn test_empty_operations_touch_nothing() {
    let mut flash = spi_flash(DummyConfig::default());
    let frames = flash.bus().transport().stats().frames;

    flash.page_program(0x1000, &[]).unwrap();
    flash.read(0x1000, &mut []).unwrap();
    flash.fast_read(0x1000, &mut []).unwrap();
    assert_eq!(flash.bus().transport().stats().frames, frames);
}

#[test]
fn test_qspi_address_phase() {
    let mut flash = qspi_flash(DummyConfig::default());

    let _ = flash.read_status().unwrap();
    assert_eq!(flash.bus().transport().last_address(), Some(None));

    let mut buf = [0u8; 4];
    flash.read(0x12_3456, &mut buf).unwrap();
    assert_eq!(
        flash.bus().transport().last_address(),
        Some(Some(0x12_3456))
    );
}

#[test]
fn test_frame_too_large_for_transport() {
    let bus: SpiBus<DummySpi, 16> =
        SpiBus::with_frame_capacity(DummySpi::new(DummyChip::new(quiet())));
    let mut flash = FlashDriver::init(bus, DummyPlatform::default(), DriverConfig::default())
        .unwrap();

    assert_eq!(
        flash.page_program(0x1000, &[0x00; 256]),
        Err(Error::FrameTooLarge)
    );
    flash.page_program(0x1000, &[0x00; 8]).unwrap();

    let stats = flash.bus().transport().stats();
    assert_eq!(stats.locks, 2);
    assert_eq!(stats.unlocks, 2);
}

#[test]
fn test_read_sfdp_signature() {
    let mut flash = spi_flash(DummyConfig::default());
    let mut sig = [0u8; 4];
    flash.read_sfdp(0, &mut sig).unwrap();
    assert_eq!(&sig, b"SFDP");

    let mut flash = qspi_flash(DummyConfig::default());
    flash.read_sfdp(0, &mut sig).unwrap();
    assert_eq!(&sig, b"SFDP");
}

#[test]
fn test_status_registers() {
    let mut flash = spi_flash(DummyConfig::default());
    assert!(!flash.read_status().unwrap().is_busy());
    assert_eq!(flash.read_status_registers().unwrap(), [0x00, 0x02, 0x60]);
}

#[test]
fn test_release_deinitializes_bus() {
    let flash = spi_flash(DummyConfig::default());
    let (bus, _platform) = flash.release().unwrap();
    assert_eq!(bus.transport().stats().deinits, 1);
}

#[test]
fn test_boxed_bus() {
    let bus: Box<dyn FlashBus + Send> = Box::new(QspiBus::new(DummyQspi::new(DummyChip::new(
        DummyConfig::default(),
    ))));
    let mut flash =
        FlashDriver::init(bus, DummyPlatform::default(), DriverConfig::default()).unwrap();
    assert_eq!(flash.mode(), BusMode::Qspi);

    flash.page_program(0x100, &[0x77; 16]).unwrap();
    let mut buf = [0u8; 16];
    flash.read(0x100, &mut buf).unwrap();
    assert_eq!(buf, [0x77; 16]);
}

#[test]
fn test_shared_sequences_do_not_interleave() {
    let shared = SharedFlash::new(spi_flash(DummyConfig::default()));

    let handles: Vec<_> = (0..4u32)
        .map(|i| {
            let flash = shared.clone();
            thread::spawn(move || {
                for page in 0..8u32 {
                    flash
                        .page_program(i * 0x1_0000 + page * 256, &[i as u8; 256])
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let ops = shared
        .with(|d| Ok(d.bus().transport().chip().opcodes()))
        .unwrap();
    let sequence = [
        opcodes::WREN,
        opcodes::RDSR,
        opcodes::PP,
        opcodes::RDSR,
        opcodes::RDSR,
        opcodes::WRDI,
    ];
    assert_eq!(ops[0], opcodes::RDID);
    assert_eq!(ops.len(), 1 + 32 * sequence.len());
    assert!(ops[1..].chunks(sequence.len()).all(|c| c == sequence));

    for i in 0..4u32 {
        let mut buf = [0u8; 256];
        shared.read(i * 0x1_0000 + 7 * 256, &mut buf).unwrap();
        assert_eq!(buf, [i as u8; 256]);
    }
}

#[test]
fn test_shared_lock_timeout() {
    let shared = SharedFlash::new(spi_flash_with(
        DummyConfig::default(),
        DriverConfig::default().with_lock_timeout_ms(20),
    ));

    let (tx, rx) = mpsc::channel();
    let holder = {
        let flash = shared.clone();
        thread::spawn(move || {
            flash.with(|_| {
                tx.send(()).unwrap();
                thread::sleep(Duration::from_millis(300));
                Ok(())
            })
        })
    };

    rx.recv().unwrap();
    assert_eq!(shared.read_status().err(), Some(Error::LockTimeout));
    holder.join().unwrap().unwrap();

    // Available again once the holder is done
    assert!(shared.read_status().is_ok());
}

#[test]
fn test_nor_flash_erase_uses_blocks_where_aligned() {
    let mut flash = spi_flash(DummyConfig::default());
    flash.write(0xF000, &[0x00; 0x3000]).unwrap();
    spi_chip_mut(&mut flash).clear_log();

    NorFlash::erase(&mut flash, 0xF000, 0x2_1000).unwrap();

    let erases: Vec<(u8, Option<u32>)> = spi_chip(&flash)
        .log()
        .iter()
        .filter(|t| matches!(t.opcode, opcodes::SE_20 | opcodes::BE_52 | opcodes::BE_D8))
        .map(|t| (t.opcode, t.address))
        .collect();
    assert_eq!(
        erases,
        vec![
            (opcodes::SE_20, Some(0xF000)),
            (opcodes::BE_D8, Some(0x1_0000)),
            (opcodes::SE_20, Some(0x2_0000))
        ]
    );
    assert!(spi_chip(&flash).data()[0xF000..0x1_2000]
        .iter()
        .all(|&b| b == 0xFF));
}

#[test]
fn test_nor_flash_erase_without_64k_blocks() {
    let geometry = find_by_name(KNOWN_CHIPS, "GT25Q40D").unwrap();
    let mut flash = spi_flash(DummyConfig::from_geometry(geometry));
    flash.write(0, &[0x00; 0x100]).unwrap();
    spi_chip_mut(&mut flash).clear_log();

    NorFlash::erase(&mut flash, 0, 0x1_1000).unwrap();

    let erases: Vec<(u8, Option<u32>)> = spi_chip(&flash)
        .log()
        .iter()
        .filter(|t| matches!(t.opcode, opcodes::SE_20 | opcodes::BE_52 | opcodes::BE_D8))
        .map(|t| (t.opcode, t.address))
        .collect();
    assert_eq!(
        erases,
        vec![
            (opcodes::BE_52, Some(0)),
            (opcodes::BE_52, Some(0x8000)),
            (opcodes::SE_20, Some(0x1_0000))
        ]
    );
    assert!(spi_chip(&flash).data()[..0x100].iter().all(|&b| b == 0xFF));
}

#[test]
fn test_nor_flash_errors() {
    let mut flash = spi_flash(DummyConfig::default());
    assert_eq!(ReadNorFlash::capacity(&flash), 16 * 1024 * 1024);

    let err = NorFlash::erase(&mut flash, 0x100, 0x1000).unwrap_err();
    assert_eq!(err.kind(), NorFlashErrorKind::NotAligned);

    let err = NorFlash::erase(&mut flash, 0, 0x100_1000).unwrap_err();
    assert_eq!(err.kind(), NorFlashErrorKind::OutOfBounds);

    NorFlash::write(&mut flash, 0x20, &[1, 2, 3]).unwrap();
    let mut buf = [0u8; 3];
    ReadNorFlash::read(&mut flash, 0x20, &mut buf).unwrap();
    assert_eq!(buf, [1, 2, 3]);
}
