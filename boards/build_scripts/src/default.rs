// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Provide helpers for building Tock boards with a generated linker script.
//!
//! Instead of each board carrying a hand-written `layout.ld`, the script is
//! generated from the chip's memory map by `tock-image-layout` into `OUT_DIR`
//! and passed to the linker.

use std::fs;
use std::path::{Path, PathBuf};

use tock_image_layout::{
    define_regions, Catalogue, ChipVariant, LayoutConfig, LayoutError, LinkerScript, Planner,
    RegionError,
};

/// Name of the generated linker script in `OUT_DIR`.
pub const LINKER_SCRIPT: &str = "layout.ld";

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error(transparent)]
    Region(#[from] RegionError),
    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Setup the Tock board to link with the generated layout for `variant`.
///
/// Must be called from a build script, as it relies on `OUT_DIR` and prints
/// cargo directives. Any error fails the build.
pub fn default_linker_script(variant: ChipVariant) {
    let out_dir = match std::env::var_os("OUT_DIR") {
        Some(out_dir) => PathBuf::from(out_dir),
        None => panic!("`default_linker_script` must be called from a build script"),
    };

    let path = match write_layout(variant, &LayoutConfig::default(), &out_dir) {
        Ok(path) => path,
        Err(err) => panic!("Cannot generate the {variant} linker script: {err}"),
    };

    chip_variant_cfg(variant);
    add_out_dir_to_linker_search_path(&out_dir);
    set_linker_script(&path);
}

/// Plans the vector table of `variant` and renders the linker script.
///
/// Code and data sizes are only known to the linker, so the plan here covers
/// the fixed parts of the image. The script's `ASSERT`s check the rest at
/// link time.
pub fn render_layout(variant: ChipVariant, config: &LayoutConfig) -> Result<String, Error> {
    let regions = define_regions(variant)?;
    let plan = Planner::new(config.clone()).plan(&regions, &Catalogue::startup_vectors(variant))?;
    Ok(LinkerScript::new(&plan).to_string())
}

/// Writes the linker script for `variant` into `out_dir`.
pub fn write_layout(
    variant: ChipVariant,
    config: &LayoutConfig,
    out_dir: &Path,
) -> Result<PathBuf, Error> {
    let path = out_dir.join(LINKER_SCRIPT);
    let script = render_layout(variant, config)?;
    fs::write(&path, script).map_err(|source| Error::Write {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

/// Reads the chip variant from the board's configuration file and reruns the
/// build script when it changes.
pub fn layout_from_config_file<P: AsRef<Path>>(path: P) -> Result<ChipVariant, Error> {
    println!("cargo:rerun-if-changed={}", path.as_ref().display());
    Ok(ChipVariant::from_config_file(path)?)
}

/// Expose the chip variant to the board crate as `cfg(msp432_package = "...")`.
pub fn chip_variant_cfg(variant: ChipVariant) {
    let values: Vec<String> = ChipVariant::ALL
        .iter()
        .map(|variant| format!("\"{}\"", variant.name()))
        .collect();
    println!(
        "cargo:rustc-check-cfg=cfg(msp432_package, values({}))",
        values.join(", ")
    );
    println!("cargo:rustc-cfg=msp432_package=\"{}\"", variant.name());
}

/// Include `OUT_DIR` in the linker file search path.
pub fn add_out_dir_to_linker_search_path(out_dir: &Path) {
    println!("cargo:rustc-link-arg=-L{}", out_dir.display());
}

/// Pass the given linker script to the linker.
pub fn set_linker_script(path: &Path) {
    println!("cargo:rustc-link-arg=-T{}", path.display());
    println!("cargo:rerun-if-changed=build.rs");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tock_image_layout::UnwindIndexPolicy;

    #[test]
    fn msp432p401r_layout() {
        let script = render_layout(ChipVariant::Msp432P401R, &LayoutConfig::default()).unwrap();
        assert!(script.contains("LENGTH = 0x00040000"));
        assert!(script.contains("ORIGIN = 0x20000000, LENGTH = 0x00010000"));
        assert!(script.contains("/DISCARD/"));
    }

    #[test]
    fn larger_variant_layout() {
        let script = render_layout(ChipVariant::Msp432P4111, &LayoutConfig::default()).unwrap();
        assert!(script.contains("LENGTH = 0x00200000"));
        assert!(script.contains("LENGTH = 0x00040000"));
    }

    #[test]
    fn stack_larger_than_ram_fails() {
        let config = LayoutConfig {
            stack_size: 0x1_0001,
            ..LayoutConfig::default()
        };
        let err = render_layout(ChipVariant::Msp432P401R, &config).unwrap_err();
        assert!(matches!(
            err,
            Error::Layout(LayoutError::RegionOverflow { needed: 0x1_0001, .. })
        ));
    }

    #[test]
    fn writes_into_out_dir() {
        let out_dir = std::env::temp_dir().join(format!("tock-layout-{}", std::process::id()));
        fs::create_dir_all(&out_dir).unwrap();
        let config = LayoutConfig {
            unwind_index: UnwindIndexPolicy::Reject,
            ..LayoutConfig::default()
        };

        let path = write_layout(ChipVariant::Msp432P401M, &config, &out_dir).unwrap();
        assert_eq!(path, out_dir.join(LINKER_SCRIPT));
        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(
            written,
            render_layout(ChipVariant::Msp432P401M, &config).unwrap()
        );

        fs::remove_dir_all(&out_dir).unwrap();
    }

    #[test]
    fn variant_from_config_file() {
        let out_dir = std::env::temp_dir().join(format!("tock-variant-{}", std::process::id()));
        fs::create_dir_all(&out_dir).unwrap();
        let config = out_dir.join("chip");
        fs::write(&config, "msp432p401r\n").unwrap();

        assert_eq!(
            layout_from_config_file(&config).unwrap(),
            ChipVariant::Msp432P401R
        );

        fs::write(&config, "cc2650").unwrap();
        assert!(matches!(
            layout_from_config_file(&config),
            Err(Error::Region(RegionError::UnknownVariant(_)))
        ));

        fs::remove_dir_all(&out_dir).unwrap();
    }
}
