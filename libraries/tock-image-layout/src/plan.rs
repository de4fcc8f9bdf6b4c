// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! The result of planning: where every block landed.

use serde::{Deserialize, Serialize};

use crate::catalogue::{BlockKind, Category};
use crate::config::UnwindIndexPolicy;
use crate::marker::{BoundaryMarkers, MarkerName};
use crate::region::{Region, RegionId, RegionSet};

/// A fragment with its assigned address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedFragment {
    pub name: String,
    pub category: Category,
    pub address: u64,
    pub size: u64,
    /// Survives the linker's section garbage collection.
    pub keep: bool,
}

/// A block of contiguous material in one region.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedBlock {
    pub kind: BlockKind,
    pub region: RegionId,
    /// Runtime address of the first byte.
    pub start: u64,
    pub size: u64,
    /// The whole block survives dead-material elimination.
    pub keep: bool,
    /// Where the initial contents are stored in flash, if that differs from
    /// the runtime address. Only set for the initialized data block.
    pub load_address: Option<u64>,
    pub fragments: Vec<PlacedFragment>,
}

impl PlacedBlock {
    pub fn end(&self) -> u64 {
        self.start + self.size
    }

    /// Bytes the block contributes to the flash image.
    pub fn image_size(&self) -> u64 {
        match self.kind {
            BlockKind::ZeroInitData => 0,
            _ => self.size,
        }
    }
}

/// Why a fragment is missing from the image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiscardReason {
    /// Unwind index material, dropped by [`UnwindIndexPolicy::Discard`].
    UnwindIndex,
    /// Neither referenced nor marked keep.
    Unreferenced,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscardedFragment {
    pub name: String,
    pub category: Category,
    pub size: u64,
    pub reason: DiscardReason,
}

/// A complete placement of one image.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutPlan {
    pub(crate) regions: RegionSet,
    pub(crate) entry_point: String,
    pub(crate) stack_size: u64,
    pub(crate) unwind_index: UnwindIndexPolicy,
    /// Indexed by `BlockKind::index()`.
    pub(crate) blocks: [PlacedBlock; 5],
    pub(crate) markers: BoundaryMarkers,
    pub(crate) discarded: Vec<DiscardedFragment>,
}

impl LayoutPlan {
    pub fn regions(&self) -> &RegionSet {
        &self.regions
    }

    pub fn block(&self, kind: BlockKind) -> &PlacedBlock {
        &self.blocks[kind.index()]
    }

    /// Blocks in placement order.
    pub fn blocks(&self) -> impl Iterator<Item = &PlacedBlock> {
        self.blocks.iter()
    }

    pub fn markers(&self) -> &BoundaryMarkers {
        &self.markers
    }

    pub fn marker(&self, name: MarkerName) -> u64 {
        self.markers.get(name)
    }

    /// Value of the first vector table word.
    pub fn initial_stack_pointer(&self) -> u64 {
        self.markers.stack_top
    }

    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    pub fn stack_size(&self) -> u64 {
        self.stack_size
    }

    pub fn unwind_index_policy(&self) -> UnwindIndexPolicy {
        self.unwind_index
    }

    pub fn discarded(&self) -> &[DiscardedFragment] {
        &self.discarded
    }

    /// Bytes of `region` claimed by the plan, including alignment padding and
    /// the stack reservation in working memory.
    pub fn usage(&self, region: RegionId) -> u64 {
        let base = self.region(region).map_or(0, |r| r.base);
        let data = self.block(BlockKind::InitData);
        // Padding before an empty `.data` block is not claimed.
        let end = match region {
            RegionId::NonVolatileStorage if data.size == 0 => {
                self.block(BlockKind::Constants).end()
            }
            RegionId::NonVolatileStorage => self.markers.data_load_source_start + data.size,
            RegionId::WorkingMemory if data.size == 0 => {
                self.block(BlockKind::ZeroInitData).end()
            }
            RegionId::WorkingMemory => data.end(),
        };
        let stack = match region {
            RegionId::WorkingMemory => self.stack_size,
            RegionId::NonVolatileStorage => 0,
        };
        (end - base).saturating_add(stack)
    }

    pub fn free(&self, region: RegionId) -> u64 {
        self.region(region)
            .map_or(0, |r| r.length.saturating_sub(self.usage(region)))
    }

    /// Size of the flash image: everything up to the end of the `.data`
    /// initial values.
    pub fn image_size(&self) -> u64 {
        self.usage(RegionId::NonVolatileStorage)
    }

    /// The plan as a JSON descriptor for tools that do not read linker
    /// scripts.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    fn region(&self, id: RegionId) -> Option<&Region> {
        self.regions.get(id)
    }
}
