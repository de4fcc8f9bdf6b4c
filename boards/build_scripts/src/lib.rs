// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Build script helpers for Tock boards.
//!
//! Board crates add this crate as a build dependency and call it from their
//! `build.rs`:
//!
//! ```rust,ignore
//! fn main() {
//!     tock_build_scripts::default_linker_script(tock_image_layout::ChipVariant::Msp432P401R);
//! }
//! ```

mod default;

pub use default::{
    add_out_dir_to_linker_search_path, chip_variant_cfg, default_linker_script,
    layout_from_config_file, render_layout, set_linker_script, write_layout, Error,
    LINKER_SCRIPT,
};
