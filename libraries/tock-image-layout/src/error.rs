// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Errors returned while describing memory or planning an image.
//!
//! Every error is fatal for the build: no partial plan is ever returned.

use crate::catalogue::BlockKind;
use crate::permissions::Permission;
use crate::region::RegionId;

/// Two regions claim the same addresses.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("regions {first} and {second} overlap at {start:#010x}..{end:#010x}")]
pub struct OverlapError {
    pub first: RegionId,
    pub second: RegionId,
    /// Start of the shared address range.
    pub start: u64,
    /// End (exclusive) of the shared address range.
    pub end: u64,
}

/// Errors in the memory map of a chip.
#[derive(thiserror::Error, Debug)]
pub enum RegionError {
    #[error("no memory map is known for chip variant `{0}`")]
    UnknownVariant(String),
    #[error(transparent)]
    Overlap(#[from] OverlapError),
    #[error("region {region} ends at {end:#x}, past the 32-bit address space")]
    OutsideAddressSpace { region: RegionId, end: u64 },
    #[error("region {region} at {base:#x} with length {length:#x} is not word aligned")]
    Misaligned {
        region: RegionId,
        base: u64,
        length: u64,
    },
    #[error("cannot read chip variant configuration: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors produced while placing material into regions.
#[derive(thiserror::Error, Debug)]
pub enum LayoutError {
    #[error(transparent)]
    Region(#[from] RegionError),
    #[error("memory map has no {0} region")]
    MissingRegion(RegionId),
    #[error("region {region} must allow {permission} access")]
    MissingPermission {
        region: RegionId,
        permission: Permission,
    },
    #[error("image is not bootable: no reset vector in the {0} block")]
    MissingRequiredBlock(BlockKind),
    #[error("region {region} overflowed: needs {needed:#x} bytes, {available:#x} available")]
    RegionOverflow {
        region: RegionId,
        needed: u64,
        available: u64,
    },
    #[error("{bytes:#x} bytes of unwind index material supplied but the policy rejects it")]
    UnwindIndexPresent { bytes: u64 },
    #[error("{0} block does not fit in the address space")]
    AddressOverflow(BlockKind),
}

impl From<OverlapError> for LayoutError {
    fn from(error: OverlapError) -> Self {
        LayoutError::Region(RegionError::Overlap(error))
    }
}
