// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Renders a [`LayoutPlan`] as a GNU ld linker script.
//!
//! The script reproduces the planned order for the linker. The linker still
//! resolves the final addresses from the real section sizes, and the
//! `ASSERT`s catch an image that outgrows its regions at link time.
//!
//! Fragments marked keep are listed by name ahead of the wildcard patterns of
//! their block so `--gc-sections` cannot drop them.

use core::fmt;
use std::path::Path;

use crate::catalogue::{BlockKind, Category};
use crate::config::UnwindIndexPolicy;
use crate::marker::MarkerName;
use crate::plan::LayoutPlan;
use crate::planner::BLOCK_ALIGNMENT;
use crate::region::RegionId;

pub struct LinkerScript<'a> {
    plan: &'a LayoutPlan,
}

impl<'a> LinkerScript<'a> {
    pub fn new(plan: &'a LayoutPlan) -> Self {
        Self { plan }
    }

    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        std::fs::write(path, self.to_string())
    }

    fn write_memory(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "MEMORY")?;
        writeln!(f, "{{")?;
        for region in self.plan.regions().iter() {
            writeln!(
                f,
                "    {:<5} ({:<3}) : ORIGIN = {:#010x}, LENGTH = {:#010x}",
                region.id.linker_name(),
                region.permissions.to_string(),
                region.base,
                region.length
            )?;
        }
        writeln!(f, "}}")
    }

    fn write_markers(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "/* Planned boundary markers:")?;
        for (name, address) in self.plan.markers().iter() {
            writeln!(f, " *   {:<24} {:<12} {:#010x}", name, name.symbol(), address)?;
        }
        writeln!(f, " */")
    }

    fn write_block(&self, f: &mut fmt::Formatter<'_>, kind: BlockKind) -> fmt::Result {
        let region = self.plan.block(kind).region.linker_name();
        match kind {
            BlockKind::StartupVectors => {
                writeln!(f, "    {} ORIGIN({}) :", kind.section_name(), region)?;
                writeln!(f, "    {{")?;
                writeln!(f, "        LONG({});", MarkerName::StackTop.symbol())?;
                for category in kind.categories() {
                    writeln!(f, "        KEEP(*({}));", patterns(*category))?;
                }
            }
            BlockKind::ZeroInitData => {
                writeln!(f, "    {} (NOLOAD) : ALIGN({})", kind.section_name(), BLOCK_ALIGNMENT)?;
                writeln!(f, "    {{")?;
                writeln!(f, "        {} = .;", MarkerName::BssStart.symbol())?;
                self.write_kept(f, kind)?;
                writeln!(f, "        *({});", patterns(Category::ZeroInitData))?;
                writeln!(f, "        {} = .;", MarkerName::BssEnd.symbol())?;
            }
            BlockKind::InitData => {
                writeln!(f, "    {} : ALIGN({})", kind.section_name(), BLOCK_ALIGNMENT)?;
                writeln!(f, "    {{")?;
                writeln!(f, "        {} = .;", MarkerName::DataStart.symbol())?;
                self.write_kept(f, kind)?;
                writeln!(f, "        *({});", patterns(Category::InitData))?;
                writeln!(f, "        {} = .;", MarkerName::DataEnd.symbol())?;
            }
            BlockKind::Code | BlockKind::Constants => {
                writeln!(f, "    {} : ALIGN({})", kind.section_name(), BLOCK_ALIGNMENT)?;
                writeln!(f, "    {{")?;
                self.write_kept(f, kind)?;
                for category in kind.categories() {
                    writeln!(f, "        *({});", patterns(*category))?;
                }
                if kind == BlockKind::Constants {
                    // The `.data` initial values follow on a word boundary.
                    writeln!(f, "        . = ALIGN({});", BLOCK_ALIGNMENT)?;
                }
            }
        }
        match kind {
            BlockKind::InitData => writeln!(
                f,
                "    }} > {} AT > {}",
                region,
                RegionId::NonVolatileStorage.linker_name()
            ),
            _ => writeln!(f, "    }} > {}", region),
        }
    }

    fn write_kept(&self, f: &mut fmt::Formatter<'_>, kind: BlockKind) -> fmt::Result {
        for fragment in self.plan.block(kind).fragments.iter() {
            if fragment.keep {
                writeln!(f, "        KEEP(*({}));", fragment.name)?;
            }
        }
        Ok(())
    }

    fn write_unwind_index(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unwind = patterns(Category::UnwindIndex);
        match self.plan.unwind_index_policy() {
            UnwindIndexPolicy::Discard => {
                writeln!(f, "    /DISCARD/ :")?;
                writeln!(f, "    {{")?;
                writeln!(f, "        *({});", unwind)?;
                writeln!(f, "    }}")
            }
            UnwindIndexPolicy::Reject => {
                writeln!(f, "    .ARM.exidx :")?;
                writeln!(f, "    {{")?;
                writeln!(f, "        *({});", unwind)?;
                writeln!(f, "    }} > {}", RegionId::NonVolatileStorage.linker_name())?;
                writeln!(
                    f,
                    "    ASSERT(SIZEOF(.ARM.exidx) == 0, \"unwind index material in image; build with panic=abort\")"
                )
            }
        }
    }

    fn write_asserts(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flash = RegionId::NonVolatileStorage.linker_name();
        writeln!(
            f,
            "ASSERT(ADDR(.vectors) == ORIGIN({flash}), \"vector table must start at the base of {flash}\")"
        )?;
        writeln!(
            f,
            "ASSERT({} + SIZEOF(.data) <= ORIGIN({flash}) + LENGTH({flash}), \"region {} overflowed\")",
            MarkerName::DataLoadSourceStart.symbol(),
            RegionId::NonVolatileStorage
        )?;
        writeln!(
            f,
            "ASSERT({} + {:#x} <= {}, \"region {} overflowed\")",
            MarkerName::DataEnd.symbol(),
            self.plan.stack_size(),
            MarkerName::StackTop.symbol(),
            RegionId::WorkingMemory
        )
    }
}

/// `.text .text.*` style list of the input sections of `category`.
fn patterns(category: Category) -> String {
    category.input_sections().join(" ")
}

impl fmt::Display for LinkerScript<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "/* Generated by tock-image-layout. Do not edit. */")?;
        writeln!(f)?;
        self.write_memory(f)?;
        writeln!(f)?;
        writeln!(f, "ENTRY({})", self.plan.entry_point())?;
        writeln!(f)?;
        self.write_markers(f)?;
        writeln!(
            f,
            "{} = ORIGIN({ram}) + LENGTH({ram});",
            MarkerName::StackTop.symbol(),
            ram = RegionId::WorkingMemory.linker_name()
        )?;
        writeln!(f)?;
        writeln!(f, "SECTIONS")?;
        writeln!(f, "{{")?;
        for kind in BlockKind::ORDER {
            self.write_block(f, kind)?;
            writeln!(f)?;
        }
        writeln!(
            f,
            "    {} = LOADADDR(.data);",
            MarkerName::DataLoadSourceStart.symbol()
        )?;
        writeln!(f)?;
        self.write_unwind_index(f)?;
        writeln!(f, "}}")?;
        writeln!(f)?;
        self.write_asserts(f)
    }
}

