// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Boot-time memory layout for Cortex-M firmware images.
//!
//! This crate decides where each kind of compiled material lives in a
//! firmware image and which boundary symbols the startup code gets:
//!
//! - [`chip`] and [`region`] describe the memory map of a chip variant:
//!   flash for the image, SRAM for the stack and mutable data.
//! - [`planner`] places the vector table, code, constants, `.bss` and `.data`
//!   in their fixed order and computes the [`marker`]s (`_szero`, `_ezero`,
//!   `_srelocate`, `_erelocate`, `_etext`, `_estack`) that `tock-rt0` uses to
//!   copy `.data` and zero `.bss` before `main`.
//! - [`script`] renders the resulting [`LayoutPlan`] as a linker script;
//!   [`LayoutPlan::to_json`] gives the same plan as a JSON descriptor.
//!
//! Board build scripts use this through `tock-build-scripts`:
//!
//! ```rust,ignore
//! use tock_image_layout::{chip, planner, Catalogue, ChipVariant, LinkerScript};
//!
//! let variant = ChipVariant::Msp432P401R;
//! let regions = chip::define_regions(variant)?;
//! let plan = planner::plan(&regions, &Catalogue::startup_vectors(variant))?;
//! LinkerScript::new(&plan).write_to_file("layout.ld")?;
//! ```

// Planning does not require any unsafe operations.
#![forbid(unsafe_code)]

pub mod catalogue;
pub mod chip;
pub mod config;
pub mod error;
pub mod marker;
pub mod permissions;
pub mod plan;
pub mod planner;
pub mod region;
pub mod script;


pub use catalogue::{BlockKind, Catalogue, Category, Fragment};
pub use chip::{define_regions, define_regions_by_name, ChipVariant};
pub use config::{LayoutConfig, UnwindIndexPolicy};
pub use error::{LayoutError, OverlapError, RegionError};
pub use marker::{BoundaryMarkers, MarkerName};
pub use permissions::{Permission, Permissions};
pub use plan::LayoutPlan;
pub use planner::{plan, Planner};
pub use region::{validate_disjoint, validate_regions, Region, RegionId, RegionSet};
pub use script::LinkerScript;
