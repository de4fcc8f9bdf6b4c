// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Assigns blocks to regions and derives the boundary markers.
//!
//! The order is fixed by the chip:
//!
//! ```text
//!  FLASH (base)                          RAM (base)
//!  +---------------------------+         +---------------------------+
//!  | .vectors                  |         | .bss        _szero..      |
//!  |   initial stack pointer   |         |             .._ezero      |
//!  |   reset vector            |         +---------------------------+
//!  |   system exceptions       |         | .data       _srelocate..  |
//!  |   interrupts              |         |             .._erelocate  |
//!  +---------------------------+         +---------------------------+
//!  | .text                     |         |           free            |
//!  +---------------------------+         |            ...            |
//!  | .rodata                   |         |  stack (grows down)       |
//!  +---------------------------+ _etext  +---------------------------+ _estack
//!  | .data initial values      |
//!  +---------------------------+
//! ```

use log::{debug, info, warn};

use crate::catalogue::{BlockKind, Catalogue, Category, Fragment};
use crate::chip::VECTOR_ENTRY_SIZE;
use crate::config::{LayoutConfig, UnwindIndexPolicy};
use crate::error::LayoutError;
use crate::marker::BoundaryMarkers;
use crate::permissions::Permission;
use crate::plan::{DiscardReason, DiscardedFragment, LayoutPlan, PlacedBlock, PlacedFragment};
use crate::region::{validate_regions, Region, RegionId, RegionSet};

/// Every block starts on a machine word boundary. The vector table is indexed
/// in words and the startup routine copies and zeroes whole words.
pub const BLOCK_ALIGNMENT: u64 = 4;

/// Size of the initial stack pointer entry at the start of the vector table.
const STACK_POINTER_ENTRY_SIZE: u64 = 4;

/// Plans with the default configuration.
pub fn plan(regions: &RegionSet, catalogue: &Catalogue) -> Result<LayoutPlan, LayoutError> {
    Planner::new(LayoutConfig::default()).plan(regions, catalogue)
}

pub struct Planner {
    config: LayoutConfig,
}

impl Planner {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Places every live fragment of `catalogue` into `regions`.
    ///
    /// Either the whole plan is returned or an error naming the offending
    /// region or block; no partial plan is ever produced.
    pub fn plan(
        &self,
        regions: &RegionSet,
        catalogue: &Catalogue,
    ) -> Result<LayoutPlan, LayoutError> {
        validate_regions(regions.as_slice())?;

        let flash = require_region(
            regions,
            RegionId::NonVolatileStorage,
            &[Permission::Read, Permission::Execute],
        )?;
        let ram = require_region(
            regions,
            RegionId::WorkingMemory,
            &[Permission::Read, Permission::Write],
        )?;

        // Checked before any size accounting so a missing vector table is
        // never reported as an overflow.
        let reset_vector: u64 = catalogue
            .fragments(Category::ResetVector)
            .map(|fragment| fragment.size)
            .sum();
        if reset_vector < VECTOR_ENTRY_SIZE {
            return Err(LayoutError::MissingRequiredBlock(BlockKind::StartupVectors));
        }

        let discarded = self.discard(catalogue)?;
        let live: Vec<&Fragment> = catalogue
            .iter()
            .filter(|fragment| fragment.category.block().is_some() && fragment.is_live())
            .collect();

        let stack_top = ram.end();
        if stack_top > u64::from(u32::MAX) {
            return Err(LayoutError::AddressOverflow(BlockKind::StartupVectors));
        }

        // Flash: vectors, code, constants, then the `.data` initial values.
        let vectors = place_block(
            BlockKind::StartupVectors,
            flash.id,
            flash.base,
            STACK_POINTER_ENTRY_SIZE,
            &live,
        )?;
        let code = place_block(
            BlockKind::Code,
            flash.id,
            align(vectors.end(), BlockKind::Code)?,
            0,
            &live,
        )?;
        let constants = place_block(
            BlockKind::Constants,
            flash.id,
            align(code.end(), BlockKind::Constants)?,
            0,
            &live,
        )?;

        // RAM: `.bss`, then `.data`.
        let bss = place_block(BlockKind::ZeroInitData, ram.id, ram.base, 0, &live)?;
        let mut data = place_block(
            BlockKind::InitData,
            ram.id,
            align(bss.end(), BlockKind::InitData)?,
            0,
            &live,
        )?;
        let load_address = align(constants.end(), BlockKind::InitData)?;
        load_address
            .checked_add(data.size)
            .ok_or(LayoutError::AddressOverflow(BlockKind::InitData))?;
        data.load_address = Some(load_address);

        let markers = BoundaryMarkers {
            bss_start: bss.start,
            bss_end: bss.end(),
            data_start: data.start,
            data_end: data.end(),
            data_load_source_start: load_address,
            stack_top,
        };

        let plan = LayoutPlan {
            regions: regions.clone(),
            entry_point: self.config.entry_point.clone(),
            stack_size: self.config.stack_size,
            unwind_index: self.config.unwind_index,
            blocks: [vectors, code, constants, bss, data],
            markers,
            discarded,
        };

        for block in plan.blocks() {
            debug!(
                "{} in {}: {:#010x}..{:#010x} ({} fragments)",
                block.kind,
                block.region,
                block.start,
                block.end(),
                block.fragments.len()
            );
        }

        // Capacity is checked per region once everything is assigned.
        for region in [flash, ram] {
            let needed = plan.usage(region.id);
            if needed > region.length {
                return Err(LayoutError::RegionOverflow {
                    region: region.id,
                    needed,
                    available: region.length,
                });
            }
            info!(
                "{}: {:#x} of {:#x} bytes used",
                region.id, needed, region.length
            );
        }

        Ok(plan)
    }

    /// Applies the unwind index policy and drops dead material.
    fn discard(&self, catalogue: &Catalogue) -> Result<Vec<DiscardedFragment>, LayoutError> {
        let unwind_bytes: u64 = catalogue
            .fragments(Category::UnwindIndex)
            .map(|fragment| fragment.size)
            .sum();

        if unwind_bytes > 0 {
            match self.config.unwind_index {
                UnwindIndexPolicy::Reject => {
                    return Err(LayoutError::UnwindIndexPresent {
                        bytes: unwind_bytes,
                    });
                }
                UnwindIndexPolicy::Discard => {
                    warn!(
                        "discarding {:#x} bytes of unwind index material",
                        unwind_bytes
                    );
                }
            }
        }

        let mut discarded = Vec::new();
        for fragment in catalogue.iter() {
            let reason = if fragment.category == Category::UnwindIndex {
                DiscardReason::UnwindIndex
            } else if !fragment.is_live() {
                warn!(
                    "dropping unreferenced {} ({} bytes)",
                    fragment.name, fragment.size
                );
                DiscardReason::Unreferenced
            } else {
                continue;
            };
            discarded.push(DiscardedFragment {
                name: fragment.name.clone(),
                category: fragment.category,
                size: fragment.size,
                reason,
            });
        }
        Ok(discarded)
    }
}

fn require_region<'a>(
    regions: &'a RegionSet,
    id: RegionId,
    permissions: &[Permission],
) -> Result<&'a Region, LayoutError> {
    let region = regions.get(id).ok_or(LayoutError::MissingRegion(id))?;
    for &permission in permissions {
        if !region.permissions.allows(permission) {
            return Err(LayoutError::MissingPermission {
                region: id,
                permission,
            });
        }
    }
    Ok(region)
}

fn align(address: u64, kind: BlockKind) -> Result<u64, LayoutError> {
    address
        .checked_next_multiple_of(BLOCK_ALIGNMENT)
        .ok_or(LayoutError::AddressOverflow(kind))
}

/// Lays out the fragments of `kind` contiguously from `start`, after
/// `reserved` leading bytes, in category sub-order and then catalogue order.
fn place_block(
    kind: BlockKind,
    region: RegionId,
    start: u64,
    reserved: u64,
    live: &[&Fragment],
) -> Result<PlacedBlock, LayoutError> {
    let mut cursor = start + reserved;
    let mut fragments = Vec::new();

    for &category in kind.categories() {
        for fragment in live.iter().filter(|fragment| fragment.category == category) {
            fragments.push(PlacedFragment {
                name: fragment.name.clone(),
                category,
                address: cursor,
                size: fragment.size,
                keep: fragment.keep || category.is_vector(),
            });
            cursor = cursor
                .checked_add(fragment.size)
                .ok_or(LayoutError::AddressOverflow(kind))?;
        }
    }

    Ok(PlacedBlock {
        kind,
        region,
        start,
        size: cursor - start,
        keep: kind == BlockKind::StartupVectors,
        load_address: None,
        fragments,
    })
}
