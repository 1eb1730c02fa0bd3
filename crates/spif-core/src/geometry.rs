//! Flash geometry registry
//!
//! Known devices are described by a compiled-in table keyed by the 3-byte
//! JEDEC ID returned by RDID (0x9F).

use core::fmt;

/// JEDEC manufacturer ID: Winbond
pub const MFR_WINBOND: u8 = 0xEF;
/// JEDEC manufacturer ID: Giantec
pub const MFR_GIANTEC: u8 = 0xC4;
/// JEDEC manufacturer ID: GigaDevice
pub const MFR_GIGADEVICE: u8 = 0xC8;
/// JEDEC manufacturer ID: Macronix
pub const MFR_MACRONIX: u8 = 0xC2;

/// 3-byte identity returned by the RDID command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct JedecId {
    /// Manufacturer ID
    pub manufacturer: u8,
    /// Memory type ID
    pub memory_type: u8,
    /// Capacity ID
    pub capacity: u8,
}

impl JedecId {
    /// Create a JEDEC ID from its three bytes
    pub const fn new(manufacturer: u8, memory_type: u8, capacity: u8) -> Self {
        Self {
            manufacturer,
            memory_type,
            capacity,
        }
    }

    /// Build from the raw RDID response
    pub const fn from_bytes(bytes: [u8; 3]) -> Self {
        Self::new(bytes[0], bytes[1], bytes[2])
    }

    /// Raw RDID response bytes
    pub const fn to_bytes(self) -> [u8; 3] {
        [self.manufacturer, self.memory_type, self.capacity]
    }
}

impl fmt::Display for JedecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02X} {:02X} {:02X}",
            self.manufacturer, self.memory_type, self.capacity
        )
    }
}

/// Geometry of a known flash device
///
/// All sizes are in bytes. `page_size` and `sector_size` are powers of two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashGeometry {
    /// Part name
    pub name: &'static str,
    /// JEDEC manufacturer ID
    pub manufacturer_id: u8,
    /// JEDEC memory type ID
    pub memory_type_id: u8,
    /// JEDEC capacity ID
    pub capacity_id: u8,
    /// Total size
    pub chip_size: u32,
    /// Erase block size
    pub block_size: u32,
    /// Erase sector size
    pub sector_size: u32,
    /// Program page size
    pub page_size: u32,
}

impl FlashGeometry {
    /// The JEDEC ID this entry matches
    pub const fn jedec_id(&self) -> JedecId {
        JedecId::new(self.manufacturer_id, self.memory_type_id, self.capacity_id)
    }

    /// Returns true if `id` matches this entry exactly
    pub const fn matches(&self, id: JedecId) -> bool {
        self.manufacturer_id == id.manufacturer
            && self.memory_type_id == id.memory_type
            && self.capacity_id == id.capacity
    }

    /// Check that `[addr, addr + len)` lies inside the device
    pub fn contains_range(&self, addr: u32, len: usize) -> bool {
        // u64 arithmetic avoids overflow for large lengths
        addr as u64 + len as u64 <= self.chip_size as u64
    }

    /// Check the sizes the driver relies on
    ///
    /// Page and sector sizes must be non-zero powers of two, a page must fit
    /// in a sector, and the block and chip sizes must be whole sectors.
    pub const fn is_valid(&self) -> bool {
        self.page_size.is_power_of_two()
            && self.sector_size.is_power_of_two()
            && self.page_size <= self.sector_size
            && self.block_size != 0
            && self.block_size % self.sector_size == 0
            && self.chip_size != 0
            && self.chip_size % self.sector_size == 0
    }

    /// Offset of `addr` inside its page
    pub const fn page_offset(&self, addr: u32) -> u32 {
        addr & (self.page_size - 1)
    }
}

const KIB: u32 = 1024;
const MIB: u32 = 1024 * 1024;

/// Compiled-in table of known devices
///
/// Entry 0 is the geometry assumed by `UnknownChipPolicy::FallbackToFirst`.
pub static KNOWN_CHIPS: &[FlashGeometry] = &[
    // 2.7V - 3.6V
    FlashGeometry {
        name: "W25Q128JV-IN/IQ/JQ",
        manufacturer_id: MFR_WINBOND,
        memory_type_id: 0x40,
        capacity_id: 0x18,
        chip_size: 16 * MIB,
        block_size: 64 * KIB,
        sector_size: 4 * KIB,
        page_size: 256,
    },
    // 1.65V - 3.6V
    FlashGeometry {
        name: "GT25Q40D",
        manufacturer_id: MFR_GIANTEC,
        memory_type_id: 0x40,
        capacity_id: 0x13,
        chip_size: 512 * KIB,
        block_size: 32 * KIB,
        sector_size: 4 * KIB,
        page_size: 256,
    },
    FlashGeometry {
        name: "W25Q64JV-IQ/JQ",
        manufacturer_id: MFR_WINBOND,
        memory_type_id: 0x40,
        capacity_id: 0x17,
        chip_size: 8 * MIB,
        block_size: 64 * KIB,
        sector_size: 4 * KIB,
        page_size: 256,
    },
    FlashGeometry {
        name: "W25Q32JV-IQ/JQ",
        manufacturer_id: MFR_WINBOND,
        memory_type_id: 0x40,
        capacity_id: 0x16,
        chip_size: 4 * MIB,
        block_size: 64 * KIB,
        sector_size: 4 * KIB,
        page_size: 256,
    },
    FlashGeometry {
        name: "W25Q16JV-IQ/JQ",
        manufacturer_id: MFR_WINBOND,
        memory_type_id: 0x40,
        capacity_id: 0x15,
        chip_size: 2 * MIB,
        block_size: 64 * KIB,
        sector_size: 4 * KIB,
        page_size: 256,
    },
    FlashGeometry {
        name: "GD25Q128C",
        manufacturer_id: MFR_GIGADEVICE,
        memory_type_id: 0x40,
        capacity_id: 0x18,
        chip_size: 16 * MIB,
        block_size: 64 * KIB,
        sector_size: 4 * KIB,
        page_size: 256,
    },
    FlashGeometry {
        name: "MX25L12835F",
        manufacturer_id: MFR_MACRONIX,
        memory_type_id: 0x20,
        capacity_id: 0x18,
        chip_size: 16 * MIB,
        block_size: 64 * KIB,
        sector_size: 4 * KIB,
        page_size: 256,
    },
];

/// Find the index of the entry matching `id` exactly
pub fn find_geometry(table: &[FlashGeometry], id: JedecId) -> Option<usize> {
    table.iter().position(|chip| chip.matches(id))
}

/// Find a table entry by part name (case-insensitive)
///
/// Matches either the full name or its base part number before the package
/// suffix, so "W25Q64JV" finds "W25Q64JV-IQ/JQ".
pub fn find_by_name<'t>(table: &'t [FlashGeometry], name: &str) -> Option<&'t FlashGeometry> {
    table.iter().find(|chip| {
        let base = chip.name.split('-').next().unwrap_or(chip.name);
        chip.name.eq_ignore_ascii_case(name) || base.eq_ignore_ascii_case(name)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_exact_match() {
        let id = JedecId::new(MFR_GIANTEC, 0x40, 0x13);
        assert_eq!(find_geometry(KNOWN_CHIPS, id), Some(1));
        assert_eq!(KNOWN_CHIPS[1].name, "GT25Q40D");
    }

    #[test]
    fn test_find_requires_all_three_bytes() {
        // Winbond manufacturer and type, unknown capacity
        let id = JedecId::new(MFR_WINBOND, 0x40, 0x19);
        assert_eq!(find_geometry(KNOWN_CHIPS, id), None);
        // Same capacity as W25Q128JV, different vendor
        let id = JedecId::new(0x20, 0x40, 0x18);
        assert_eq!(find_geometry(KNOWN_CHIPS, id), None);
    }

    #[test]
    fn test_table_entries_are_consistent() {
        for chip in KNOWN_CHIPS {
            assert!(chip.is_valid(), "{}", chip.name);
            assert!(chip.page_size.is_power_of_two(), "{}", chip.name);
            assert!(chip.sector_size.is_power_of_two(), "{}", chip.name);
            assert_eq!(chip.block_size % chip.sector_size, 0, "{}", chip.name);
            assert_eq!(chip.chip_size % chip.block_size, 0, "{}", chip.name);
            // Capacity ID encodes log2 of the size in bytes
            assert_eq!(1u32 << chip.capacity_id, chip.chip_size, "{}", chip.name);
        }
    }

    #[test]
    fn test_find_by_name() {
        let chip = find_by_name(KNOWN_CHIPS, "w25q64jv-iq/jq").unwrap();
        assert_eq!(chip.jedec_id(), JedecId::new(MFR_WINBOND, 0x40, 0x17));
        let chip = find_by_name(KNOWN_CHIPS, "W25Q64JV").unwrap();
        assert_eq!(chip.capacity_id, 0x17);
        assert!(find_by_name(KNOWN_CHIPS, "W25Q64").is_none());
        assert!(find_by_name(KNOWN_CHIPS, "nope").is_none());
    }

    #[test]
    fn test_invalid_geometry() {
        let good = KNOWN_CHIPS[0];
        assert!(!FlashGeometry { page_size: 0, ..good }.is_valid());
        assert!(!FlashGeometry { page_size: 384, ..good }.is_valid());
        assert!(!FlashGeometry { sector_size: 0, ..good }.is_valid());
        assert!(!FlashGeometry { page_size: 8192, ..good }.is_valid());
        assert!(!FlashGeometry { block_size: 6 * 1024, ..good }.is_valid());
        assert!(!FlashGeometry { chip_size: 0, ..good }.is_valid());
    }

    #[test]
    fn test_contains_range() {
        let chip = &KNOWN_CHIPS[1];
        assert!(chip.contains_range(0, 512 * 1024));
        assert!(chip.contains_range(512 * 1024 - 1, 1));
        assert!(!chip.contains_range(512 * 1024 - 1, 2));
        assert!(!chip.contains_range(u32::MAX, usize::MAX));
    }

    #[test]
    fn test_jedec_display() {
        let id = JedecId::from_bytes([0xEF, 0x40, 0x18]);
        let mut s = heapless::String::<16>::new();
        core::fmt::write(&mut s, format_args!("{}", id)).unwrap();
        assert_eq!(s.as_str(), "EF 40 18");
    }
}
