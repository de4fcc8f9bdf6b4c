// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Options that shape a layout beyond what the chip memory map fixes.
//!
//! Boards normally use [`LayoutConfig::default()`]. A board that needs a
//! different entry point or a stack reservation builds its own value, or
//! reads one from the JSON configuration written by the board configurator.

use serde::{Deserialize, Serialize};

/// Name of the reset handler when the board does not choose one.
pub const DEFAULT_ENTRY_POINT: &str = "reset_handler";

/// What to do with ARM unwind index material (`.ARM.exidx*`).
///
/// Tock kernels are built with `panic = "abort"`, so nothing reads the unwind
/// tables at runtime. They only occupy flash.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnwindIndexPolicy {
    /// Leave the material out of the image. Non-empty material is logged and
    /// listed in the plan's discarded fragments.
    #[default]
    Discard,
    /// Fail planning if any non-empty unwind material is supplied.
    Reject,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Symbol of the routine the reset vector points at.
    pub entry_point: String,

    /// Bytes reserved for the stack at the top of working memory.
    ///
    /// The stack grows down from the top of RAM, so `.bss` and `.data` must
    /// leave this much room above them. Zero means no reservation is checked.
    pub stack_size: u64,

    pub unwind_index: UnwindIndexPolicy,
}

impl LayoutConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            entry_point: DEFAULT_ENTRY_POINT.to_string(),
            stack_size: 0,
            unwind_index: UnwindIndexPolicy::Discard,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = LayoutConfig::from_json(r#"{ "stack_size": 4096 }"#).unwrap();
        assert_eq!(config.stack_size, 0x1000);
        assert_eq!(config.entry_point, DEFAULT_ENTRY_POINT);
        assert_eq!(config.unwind_index, UnwindIndexPolicy::Discard);
    }

    #[test]
    fn policy_from_json() {
        let config = LayoutConfig::from_json(r#"{ "unwind_index": "reject" }"#).unwrap();
        assert_eq!(config.unwind_index, UnwindIndexPolicy::Reject);
    }
}
