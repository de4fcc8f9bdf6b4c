// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Memory maps of the supported chip variants.
//!
//! Each variant has exactly one fixed table derived from its datasheet. The
//! table is looked up by variant for every planning call; there is no global
//! mutable state.
//!
//! - MSP432P401R / MSP432P401M: <https://www.ti.com/lit/ds/symlink/msp432p401r.pdf>
//! - MSP432P4111: <https://www.ti.com/lit/ds/symlink/msp432p4111.pdf>

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RegionError;
use crate::permissions::Permissions;
use crate::region::{Region, RegionId, RegionSet};

/// Size of one vector table entry. The table is indexed in machine words.
pub const VECTOR_ENTRY_SIZE: u64 = 4;

/// Cortex-M system exception entries following the reset vector (NMI through
/// SysTick, including the reserved slots).
pub const SYSTEM_EXCEPTION_COUNT: u64 = 14;

const KIB: u64 = 1024;

const SRAM_BASE: u64 = 0x2000_0000;

/// A supported chip variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChipVariant {
    Msp432P401R,
    Msp432P401M,
    Msp432P4111,
}

struct MemoryMap {
    name: &'static str,
    flash_base: u64,
    flash_length: u64,
    sram_base: u64,
    sram_length: u64,
    interrupts: u64,
}

impl ChipVariant {
    pub const ALL: [ChipVariant; 3] = [
        ChipVariant::Msp432P401R,
        ChipVariant::Msp432P401M,
        ChipVariant::Msp432P4111,
    ];

    const fn memory_map(&self) -> MemoryMap {
        match self {
            ChipVariant::Msp432P401R => MemoryMap {
                name: "msp432p401r",
                flash_base: 0,
                flash_length: 256 * KIB,
                sram_base: SRAM_BASE,
                sram_length: 64 * KIB,
                interrupts: 64,
            },
            ChipVariant::Msp432P401M => MemoryMap {
                name: "msp432p401m",
                flash_base: 0,
                flash_length: 128 * KIB,
                sram_base: SRAM_BASE,
                sram_length: 32 * KIB,
                interrupts: 64,
            },
            ChipVariant::Msp432P4111 => MemoryMap {
                name: "msp432p4111",
                flash_base: 0,
                flash_length: 2048 * KIB,
                sram_base: SRAM_BASE,
                sram_length: 256 * KIB,
                interrupts: 64,
            },
        }
    }

    /// Lower-case TI package name, e.g. `msp432p401r`.
    pub fn name(&self) -> &'static str {
        self.memory_map().name
    }

    /// Number of device interrupt lines in the NVIC.
    pub fn interrupt_count(&self) -> u64 {
        self.memory_map().interrupts
    }

    /// Size in bytes of the complete vector table: the initial stack pointer,
    /// the reset vector, the system exceptions and one entry per interrupt.
    pub fn vector_table_size(&self) -> u64 {
        (2 + SYSTEM_EXCEPTION_COUNT + self.interrupt_count()) * VECTOR_ENTRY_SIZE
    }

    /// Reads the chip variant from a configuration file holding the package
    /// name, as written by the board configuration step.
    pub fn from_config_file<P: AsRef<Path>>(path: P) -> Result<Self, RegionError> {
        let contents = std::fs::read_to_string(path)?;
        contents.parse()
    }
}

impl FromStr for ChipVariant {
    type Err = RegionError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let name = name.trim();
        ChipVariant::ALL
            .into_iter()
            .find(|variant| variant.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| RegionError::UnknownVariant(name.to_string()))
    }
}

impl core::fmt::Display for ChipVariant {
    fn fmt(&self, formatter: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(formatter, "{}", self.name())
    }
}

/// Returns the memory regions of `variant`.
///
/// Flash is not writable: the firmware image does not modify itself.
pub fn define_regions(variant: ChipVariant) -> Result<RegionSet, RegionError> {
    let map = variant.memory_map();
    RegionSet::new(vec![
        Region::new(
            RegionId::NonVolatileStorage,
            map.flash_base,
            map.flash_length,
            Permissions::READ_EXECUTE,
        ),
        Region::new(
            RegionId::WorkingMemory,
            map.sram_base,
            map.sram_length,
            Permissions::READ_WRITE_EXECUTE,
        ),
    ])
}

/// Like [`define_regions`], keyed by package name. Fails with
/// [`RegionError::UnknownVariant`] for names without a memory map.
pub fn define_regions_by_name(name: &str) -> Result<RegionSet, RegionError> {
    define_regions(name.parse()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::{validate_disjoint, ADDRESS_SPACE_END};

    #[test]
    fn msp432p401r_memory_map() {
        let regions = define_regions(ChipVariant::Msp432P401R).unwrap();
        let flash = regions.get(RegionId::NonVolatileStorage).unwrap();
        let ram = regions.get(RegionId::WorkingMemory).unwrap();

        assert_eq!((flash.base, flash.length), (0, 0x4_0000));
        assert_eq!(flash.permissions, Permissions::READ_EXECUTE);
        assert_eq!((ram.base, ram.length), (0x2000_0000, 0x1_0000));
        assert_eq!(ram.permissions, Permissions::READ_WRITE_EXECUTE);
    }

    #[test]
    fn every_variant_is_disjoint_and_addressable() {
        for variant in ChipVariant::ALL {
            let regions = define_regions(variant).unwrap();
            assert_eq!(regions.len(), 2, "{variant}");
            assert!(validate_disjoint(regions.as_slice()).is_ok(), "{variant}");
            for region in regions.iter() {
                assert!(region.length > 0, "{variant}: {region}");
                assert!(region.end() <= ADDRESS_SPACE_END, "{variant}: {region}");
            }
        }
    }

    #[test]
    fn lookup_by_name() {
        assert_eq!(
            "MSP432P401R".parse::<ChipVariant>().unwrap(),
            ChipVariant::Msp432P401R
        );
        assert_eq!(
            " msp432p4111\n".parse::<ChipVariant>().unwrap(),
            ChipVariant::Msp432P4111
        );
        for variant in ChipVariant::ALL {
            assert_eq!(variant.name().parse::<ChipVariant>().unwrap(), variant);
        }
    }

    #[test]
    fn unknown_variant() {
        match define_regions_by_name("msp430g2553") {
            Err(RegionError::UnknownVariant(name)) => assert_eq!(name, "msp430g2553"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn vector_table_is_word_indexed() {
        // 1 stack pointer + 1 reset + 14 system exceptions + 64 interrupts.
        assert_eq!(ChipVariant::Msp432P401R.vector_table_size(), 80 * 4);
    }

    #[test]
    fn variant_from_missing_config_file() {
        let result = ChipVariant::from_config_file("/nonexistent/chip-variant");
        assert!(matches!(result, Err(RegionError::Io(_))));
    }
}
