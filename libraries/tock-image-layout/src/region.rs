// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Regions of the device memory map.

use serde::{Deserialize, Serialize};

use crate::error::{OverlapError, RegionError};
use crate::permissions::Permissions;

/// First address past the 32-bit physical address space of Cortex-M parts.
pub const ADDRESS_SPACE_END: u64 = 1 << 32;

/// Region bases and lengths are whole machine words.
pub const REGION_ALIGNMENT: u64 = 4;

/// Identifies a physically distinct memory area.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RegionId {
    /// Flash, holding the image across power loss.
    NonVolatileStorage,
    /// SRAM, holding the stack and mutable data at runtime.
    WorkingMemory,
}

impl RegionId {
    /// Name of the region in the linker script `MEMORY` command.
    pub fn linker_name(&self) -> &'static str {
        match self {
            RegionId::NonVolatileStorage => "FLASH",
            RegionId::WorkingMemory => "RAM",
        }
    }
}

impl core::fmt::Display for RegionId {
    fn fmt(&self, formatter: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            RegionId::NonVolatileStorage => write!(formatter, "non-volatile-storage"),
            RegionId::WorkingMemory => write!(formatter, "working-memory"),
        }
    }
}

/// A named, permissioned address range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    pub base: u64,
    pub length: u64,
    pub permissions: Permissions,
}

impl Region {
    pub const fn new(id: RegionId, base: u64, length: u64, permissions: Permissions) -> Self {
        Self {
            id,
            base,
            length,
            permissions,
        }
    }

    /// First address after the region. Saturates rather than wrapping so an
    /// out of range region is still reported as such.
    pub fn end(&self) -> u64 {
        self.base.saturating_add(self.length)
    }

    pub fn contains(&self, address: u64) -> bool {
        address >= self.base && address < self.end()
    }

    /// Whether `[start, start + length)` lies entirely inside the region. An
    /// empty range is contained if it starts inside the region or exactly at
    /// its end.
    pub fn contains_range(&self, start: u64, length: u64) -> bool {
        match start.checked_add(length) {
            Some(end) => start >= self.base && end <= self.end(),
            None => false,
        }
    }

    /// The shared part of two regions, if any.
    pub fn intersection(&self, other: &Region) -> Option<(u64, u64)> {
        let start = self.base.max(other.base);
        let end = self.end().min(other.end());
        if start < end {
            Some((start, end))
        } else {
            None
        }
    }

    pub fn intersects(&self, other: &Region) -> bool {
        self.intersection(other).is_some()
    }
}

impl core::fmt::Display for Region {
    fn fmt(&self, formatter: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            formatter,
            "{} [{:#010x}..{:#010x}) ({})",
            self.id,
            self.base,
            self.end(),
            self.permissions
        )
    }
}

/// Fails if the address ranges of any two regions intersect.
///
/// This must hold before any placement happens.
pub fn validate_disjoint(regions: &[Region]) -> Result<(), OverlapError> {
    for (index, first) in regions.iter().enumerate() {
        for second in &regions[index + 1..] {
            if let Some((start, end)) = first.intersection(second) {
                return Err(OverlapError {
                    first: first.id,
                    second: second.id,
                    start,
                    end,
                });
            }
        }
    }
    Ok(())
}

/// Checks a memory map as a whole: every region inside the physical address
/// space and word aligned, and no two regions overlapping.
pub fn validate_regions(regions: &[Region]) -> Result<(), RegionError> {
    for region in regions {
        if !matches!(region.base.checked_add(region.length), Some(end) if end <= ADDRESS_SPACE_END)
        {
            return Err(RegionError::OutsideAddressSpace {
                region: region.id,
                end: region.end(),
            });
        }
        if region.base % REGION_ALIGNMENT != 0 || region.length % REGION_ALIGNMENT != 0 {
            return Err(RegionError::Misaligned {
                region: region.id,
                base: region.base,
                length: region.length,
            });
        }
    }
    validate_disjoint(regions)?;
    Ok(())
}

/// The validated memory map of one chip variant.
///
/// Deserializing goes through [`RegionSet::new`], so a set read from JSON is
/// checked the same way as one built in code.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RegionList")]
pub struct RegionSet {
    regions: Vec<Region>,
}

#[derive(Deserialize)]
struct RegionList {
    regions: Vec<Region>,
}

impl TryFrom<RegionList> for RegionSet {
    type Error = RegionError;

    fn try_from(list: RegionList) -> Result<Self, Self::Error> {
        RegionSet::new(list.regions)
    }
}

impl RegionSet {
    /// Builds a region set, rejecting overlapping or unaligned regions and
    /// regions that leave the physical address space.
    pub fn new(regions: Vec<Region>) -> Result<Self, RegionError> {
        validate_regions(&regions)?;
        Ok(Self { regions })
    }

    pub fn get(&self, id: RegionId) -> Option<&Region> {
        self.regions.iter().find(|region| region.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter()
    }

    pub fn as_slice(&self) -> &[Region] {
        &self.regions
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flash(base: u64, length: u64) -> Region {
        Region::new(
            RegionId::NonVolatileStorage,
            base,
            length,
            Permissions::READ_EXECUTE,
        )
    }

    fn ram(base: u64, length: u64) -> Region {
        Region::new(
            RegionId::WorkingMemory,
            base,
            length,
            Permissions::READ_WRITE_EXECUTE,
        )
    }

    #[test]
    fn adjacent_regions_do_not_overlap() {
        assert!(validate_disjoint(&[flash(0, 0x1000), ram(0x1000, 0x1000)]).is_ok());
    }

    #[test]
    fn overlap_names_both_regions_and_range() {
        let err = validate_disjoint(&[flash(0, 0x2000), ram(0x1800, 0x1000)]).unwrap_err();
        assert_eq!(err.first, RegionId::NonVolatileStorage);
        assert_eq!(err.second, RegionId::WorkingMemory);
        assert_eq!((err.start, err.end), (0x1800, 0x2000));
        assert_eq!(
            err.to_string(),
            "regions non-volatile-storage and working-memory overlap at 0x00001800..0x00002000"
        );
    }

    #[test]
    fn region_set_rejects_overlap() {
        let result = RegionSet::new(vec![flash(0, 0x2000), ram(0x1000, 0x1000)]);
        assert!(matches!(result, Err(RegionError::Overlap(_))));
    }

    #[test]
    fn region_may_end_exactly_at_top_of_address_space() {
        assert!(RegionSet::new(vec![ram(0xFFFF_0000, 0x1_0000)]).is_ok());
        let result = RegionSet::new(vec![ram(0xFFFF_0000, 0x1_0001)]);
        assert!(matches!(
            result,
            Err(RegionError::OutsideAddressSpace {
                region: RegionId::WorkingMemory,
                end: 0x1_0000_0001,
            })
        ));
    }

    #[test]
    fn region_set_rejects_unaligned_regions() {
        assert!(matches!(
            RegionSet::new(vec![flash(0, 0x1001)]),
            Err(RegionError::Misaligned {
                region: RegionId::NonVolatileStorage,
                base: 0,
                length: 0x1001,
            })
        ));
        assert!(matches!(
            RegionSet::new(vec![ram(0x2000_0002, 0x1000)]),
            Err(RegionError::Misaligned { .. })
        ));
    }

    #[test]
    fn deserializing_validates_the_region_set() {
        let valid = RegionSet::new(vec![flash(0, 0x4_0000), ram(0x2000_0000, 0x1_0000)]).unwrap();
        let json = serde_json::to_string(&valid).unwrap();
        assert_eq!(serde_json::from_str::<RegionSet>(&json).unwrap(), valid);

        let past_address_space = r#"{ "regions": [{
            "id": "non-volatile-storage",
            "base": 4294901760,
            "length": 131072,
            "permissions": { "read": true, "write": false, "execute": true }
        }] }"#;
        let err = serde_json::from_str::<RegionSet>(past_address_space).unwrap_err();
        assert!(err.to_string().contains("past the 32-bit address space"));

        let overlapping = format!(
            r#"{{ "regions": [{}, {}] }}"#,
            serde_json::to_string(&flash(0, 0x2000)).unwrap(),
            serde_json::to_string(&ram(0x1000, 0x1000)).unwrap()
        );
        assert!(serde_json::from_str::<RegionSet>(&overlapping).is_err());
    }

    #[test]
    fn containment() {
        let region = ram(0x2000_0000, 0x100);
        assert!(region.contains(0x2000_0000));
        assert!(region.contains(0x2000_00FF));
        assert!(!region.contains(0x2000_0100));
        assert!(region.contains_range(0x2000_0080, 0x80));
        assert!(!region.contains_range(0x2000_0080, 0x81));
        assert!(region.contains_range(0x2000_0100, 0));
        assert!(!region.contains_range(u64::MAX, 2));
    }
}
