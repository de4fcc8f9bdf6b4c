// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Boundary markers read by the startup routine.
//!
//! The symbol names are the ones `tock-rt0` and the chip crates declare as
//! `extern` statics: the startup code copies `_etext.._etext + (_erelocate -
//! _srelocate)` to `_srelocate` and zeroes `_szero.._ezero` before `main`.

use serde::{Deserialize, Serialize};

/// Name of a boundary marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MarkerName {
    BssStart,
    BssEnd,
    DataStart,
    DataEnd,
    /// Flash address holding the initial values of `.data`.
    DataLoadSourceStart,
    /// Initial stack pointer, the top of working memory.
    StackTop,
}

impl MarkerName {
    pub const ALL: [MarkerName; 6] = [
        MarkerName::BssStart,
        MarkerName::BssEnd,
        MarkerName::DataStart,
        MarkerName::DataEnd,
        MarkerName::DataLoadSourceStart,
        MarkerName::StackTop,
    ];

    /// Linker symbol exported for this marker.
    pub fn symbol(&self) -> &'static str {
        match self {
            MarkerName::BssStart => "_szero",
            MarkerName::BssEnd => "_ezero",
            MarkerName::DataStart => "_srelocate",
            MarkerName::DataEnd => "_erelocate",
            MarkerName::DataLoadSourceStart => "_etext",
            MarkerName::StackTop => "_estack",
        }
    }
}

impl core::fmt::Display for MarkerName {
    fn fmt(&self, formatter: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            MarkerName::BssStart => "bss-start",
            MarkerName::BssEnd => "bss-end",
            MarkerName::DataStart => "data-start",
            MarkerName::DataEnd => "data-end",
            MarkerName::DataLoadSourceStart => "data-load-source-start",
            MarkerName::StackTop => "stack-top",
        };
        formatter.pad(name)
    }
}

/// Resolved marker addresses. Computed once, after every block is placed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundaryMarkers {
    pub bss_start: u64,
    pub bss_end: u64,
    pub data_start: u64,
    pub data_end: u64,
    pub data_load_source_start: u64,
    pub stack_top: u64,
}

impl BoundaryMarkers {
    pub fn get(&self, name: MarkerName) -> u64 {
        match name {
            MarkerName::BssStart => self.bss_start,
            MarkerName::BssEnd => self.bss_end,
            MarkerName::DataStart => self.data_start,
            MarkerName::DataEnd => self.data_end,
            MarkerName::DataLoadSourceStart => self.data_load_source_start,
            MarkerName::StackTop => self.stack_top,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (MarkerName, u64)> + '_ {
        MarkerName::ALL
            .into_iter()
            .map(move |name| (name, self.get(name)))
    }

    /// Bytes the startup routine zero fills.
    pub fn bss_len(&self) -> u64 {
        self.bss_end - self.bss_start
    }

    /// Bytes the startup routine copies from flash.
    pub fn data_len(&self) -> u64 {
        self.data_end - self.data_start
    }
}
