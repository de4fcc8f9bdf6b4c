// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! The catalogue of compiled material handed over by the build pipeline.
//!
//! Material is grouped by an explicit [`Category`] instead of by matching
//! section names against glob patterns. Input section names are still
//! understood through [`Category::from_section_name`] so a catalogue can be
//! built straight from an object file's section table.

use serde::{Deserialize, Serialize};

use crate::chip::{ChipVariant, SYSTEM_EXCEPTION_COUNT, VECTOR_ENTRY_SIZE};

/// Kind of compiled material.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    /// The reset vector entry, pointing at the entry point.
    ResetVector,
    /// System exception handler entries (NMI through SysTick).
    ExceptionVectors,
    /// Device interrupt handler entries.
    InterruptVectors,
    Code,
    ReadOnlyData,
    /// Mutable data that starts zeroed (`.bss`).
    ZeroInitData,
    /// Mutable data with initial values (`.data`).
    InitData,
    /// ARM exception index tables used for stack unwinding. Never placed.
    UnwindIndex,
}

impl Category {
    /// Input section patterns collected for this category.
    pub fn input_sections(&self) -> &'static [&'static str] {
        match self {
            Category::ResetVector => &[".vector_table.reset"],
            Category::ExceptionVectors => &[".vector_table.exceptions"],
            Category::InterruptVectors => &[".vector_table.interrupts"],
            Category::Code => &[".text", ".text.*"],
            Category::ReadOnlyData => &[".rodata", ".rodata.*"],
            Category::ZeroInitData => &[".bss", ".bss.*", "COMMON"],
            Category::InitData => &[".data", ".data.*"],
            Category::UnwindIndex => &[".ARM.exidx", ".ARM.exidx.*"],
        }
    }

    /// Classifies an input section by name. Returns `None` for sections that
    /// carry no loadable material (debug info, comments, ...).
    pub fn from_section_name(name: &str) -> Option<Category> {
        const ALL: [Category; 8] = [
            Category::ResetVector,
            Category::ExceptionVectors,
            Category::InterruptVectors,
            Category::Code,
            Category::ReadOnlyData,
            Category::ZeroInitData,
            Category::InitData,
            Category::UnwindIndex,
        ];
        ALL.into_iter().find(|category| {
            category.input_sections().iter().any(|pattern| {
                match pattern.strip_suffix('*') {
                    Some(prefix) => name.starts_with(prefix),
                    None => name == *pattern,
                }
            })
        })
    }

    /// The block this material is placed in, or `None` if it is discarded.
    pub fn block(&self) -> Option<BlockKind> {
        match self {
            Category::ResetVector | Category::ExceptionVectors | Category::InterruptVectors => {
                Some(BlockKind::StartupVectors)
            }
            Category::Code => Some(BlockKind::Code),
            Category::ReadOnlyData => Some(BlockKind::Constants),
            Category::ZeroInitData => Some(BlockKind::ZeroInitData),
            Category::InitData => Some(BlockKind::InitData),
            Category::UnwindIndex => None,
        }
    }

    pub fn is_vector(&self) -> bool {
        self.block() == Some(BlockKind::StartupVectors)
    }
}

/// A contiguous block of placed material.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockKind {
    StartupVectors,
    Code,
    Constants,
    ZeroInitData,
    InitData,
}

impl BlockKind {
    /// Blocks in placement order.
    pub const ORDER: [BlockKind; 5] = [
        BlockKind::StartupVectors,
        BlockKind::Code,
        BlockKind::Constants,
        BlockKind::ZeroInitData,
        BlockKind::InitData,
    ];

    /// Position in [`BlockKind::ORDER`].
    pub fn index(&self) -> usize {
        match self {
            BlockKind::StartupVectors => 0,
            BlockKind::Code => 1,
            BlockKind::Constants => 2,
            BlockKind::ZeroInitData => 3,
            BlockKind::InitData => 4,
        }
    }

    /// Output section name in the linker script.
    pub fn section_name(&self) -> &'static str {
        match self {
            BlockKind::StartupVectors => ".vectors",
            BlockKind::Code => ".text",
            BlockKind::Constants => ".rodata",
            BlockKind::ZeroInitData => ".bss",
            BlockKind::InitData => ".data",
        }
    }

    /// Categories collected into this block, in their required sub-order.
    pub fn categories(&self) -> &'static [Category] {
        match self {
            BlockKind::StartupVectors => &[
                Category::ResetVector,
                Category::ExceptionVectors,
                Category::InterruptVectors,
            ],
            BlockKind::Code => &[Category::Code],
            BlockKind::Constants => &[Category::ReadOnlyData],
            BlockKind::ZeroInitData => &[Category::ZeroInitData],
            BlockKind::InitData => &[Category::InitData],
        }
    }
}

impl core::fmt::Display for BlockKind {
    fn fmt(&self, formatter: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            BlockKind::StartupVectors => "startup-vectors",
            BlockKind::Code => "code",
            BlockKind::Constants => "constants",
            BlockKind::ZeroInitData => "zero-init-data",
            BlockKind::InitData => "init-data",
        };
        write!(formatter, "{name}")
    }
}

/// One piece of compiled material. Its contents are opaque here; only the
/// size matters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    pub name: String,
    pub category: Category,
    pub size: u64,
    /// Preserve the fragment even if nothing references it.
    pub keep: bool,
    /// Whether upstream reachability analysis found a reference to it.
    pub referenced: bool,
}

impl Fragment {
    pub fn new(name: &str, category: Category, size: u64) -> Self {
        Self {
            name: name.to_string(),
            category,
            size,
            keep: category.is_vector(),
            referenced: true,
        }
    }

    /// Builds a fragment from an input section, or `None` if the section holds
    /// no loadable material.
    pub fn from_section(name: &str, size: u64) -> Option<Self> {
        Category::from_section_name(name).map(|category| Fragment::new(name, category, size))
    }

    pub fn keep(mut self) -> Self {
        self.keep = true;
        self
    }

    pub fn unreferenced(mut self) -> Self {
        self.referenced = false;
        self
    }

    /// Vector entries are always live: a dropped entry would leave garbage
    /// in the table that the processor jumps through.
    pub fn is_live(&self) -> bool {
        self.keep || self.referenced || self.category.is_vector()
    }
}

/// Ordered set of fragments making up one image.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalogue {
    fragments: Vec<Fragment>,
}

impl Catalogue {
    pub fn new() -> Self {
        Self::default()
    }

    /// The three vector table parts of `variant`, with nothing else.
    pub fn startup_vectors(variant: ChipVariant) -> Self {
        let mut catalogue = Catalogue::new();
        catalogue.push(Fragment::new(
            "reset_vector",
            Category::ResetVector,
            VECTOR_ENTRY_SIZE,
        ));
        catalogue.push(Fragment::new(
            "BASE_VECTORS",
            Category::ExceptionVectors,
            SYSTEM_EXCEPTION_COUNT * VECTOR_ENTRY_SIZE,
        ));
        catalogue.push(Fragment::new(
            "IRQS",
            Category::InterruptVectors,
            variant.interrupt_count() * VECTOR_ENTRY_SIZE,
        ));
        catalogue
    }

    pub fn push(&mut self, fragment: Fragment) {
        self.fragments.push(fragment);
    }

    pub fn with(mut self, fragment: Fragment) -> Self {
        self.push(fragment);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &Fragment> {
        self.fragments.iter()
    }

    /// Fragments of `category`, in catalogue order.
    pub fn fragments(&self, category: Category) -> impl Iterator<Item = &Fragment> {
        self.fragments
            .iter()
            .filter(move |fragment| fragment.category == category)
    }

    pub fn contains(&self, category: Category) -> bool {
        self.fragments(category).next().is_some()
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }
}

impl FromIterator<Fragment> for Catalogue {
    fn from_iter<I: IntoIterator<Item = Fragment>>(iter: I) -> Self {
        Self {
            fragments: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_names_map_to_categories() {
        assert_eq!(
            Category::from_section_name(".vector_table.reset"),
            Some(Category::ResetVector)
        );
        assert_eq!(
            Category::from_section_name(".text.main"),
            Some(Category::Code)
        );
        assert_eq!(Category::from_section_name(".text"), Some(Category::Code));
        assert_eq!(
            Category::from_section_name(".rodata.str1.1"),
            Some(Category::ReadOnlyData)
        );
        assert_eq!(
            Category::from_section_name("COMMON"),
            Some(Category::ZeroInitData)
        );
        assert_eq!(
            Category::from_section_name(".ARM.exidx.text.main"),
            Some(Category::UnwindIndex)
        );
        assert_eq!(Category::from_section_name(".debug_info"), None);
        assert_eq!(Category::from_section_name(".textual"), None);
    }

    #[test]
    fn block_order_matches_index() {
        for (index, kind) in BlockKind::ORDER.iter().enumerate() {
            assert_eq!(kind.index(), index);
        }
    }

    #[test]
    fn unwind_index_has_no_block() {
        assert_eq!(Category::UnwindIndex.block(), None);
        assert_eq!(
            Category::InterruptVectors.block(),
            Some(BlockKind::StartupVectors)
        );
    }

    #[test]
    fn vectors_are_kept_by_default() {
        let vector = Fragment::new("IRQS", Category::InterruptVectors, 256).unreferenced();
        assert!(vector.keep);
        assert!(vector.is_live());

        let code = Fragment::new("unused_fn", Category::Code, 8).unreferenced();
        assert!(!code.is_live());
        assert!(code.keep().is_live());
    }

    #[test]
    fn startup_vectors_fill_the_table() {
        let variant = ChipVariant::Msp432P401R;
        let catalogue = Catalogue::startup_vectors(variant);
        let total: u64 = catalogue.iter().map(|fragment| fragment.size).sum();
        // Everything except the stack pointer word.
        assert_eq!(total + VECTOR_ENTRY_SIZE, variant.vector_table_size());
        assert!(catalogue.contains(Category::ResetVector));
    }
}
