// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Memory access permissions.

use serde::{Deserialize, Serialize};

/// A single access right.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Permission {
    Read,
    Write,
    Execute,
}

impl core::fmt::Display for Permission {
    fn fmt(&self, formatter: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Permission::Read => write!(formatter, "read"),
            Permission::Write => write!(formatter, "write"),
            Permission::Execute => write!(formatter, "execute"),
        }
    }
}

/// Permissions associated with a region of memory, a subset of
/// {read, write, execute}.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    pub read: bool,
    pub write: bool,
    pub execute: bool,
}

impl Permissions {
    pub const READ_EXECUTE: Permissions = Permissions {
        read: true,
        write: false,
        execute: true,
    };

    pub const READ_WRITE_EXECUTE: Permissions = Permissions {
        read: true,
        write: true,
        execute: true,
    };

    pub fn allows(&self, permission: Permission) -> bool {
        match permission {
            Permission::Read => self.read,
            Permission::Write => self.write,
            Permission::Execute => self.execute,
        }
    }
}

/// Formats as a GNU ld `MEMORY` attribute string, e.g. `rx` or `rwx`.
impl core::fmt::Display for Permissions {
    fn fmt(&self, formatter: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if self.read {
            write!(formatter, "r")?;
        }
        if self.write {
            write!(formatter, "w")?;
        }
        if self.execute {
            write!(formatter, "x")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linker_attributes() {
        assert_eq!(Permissions::READ_EXECUTE.to_string(), "rx");
        assert_eq!(Permissions::READ_WRITE_EXECUTE.to_string(), "rwx");
        assert_eq!(Permissions::default().to_string(), "");
    }

    #[test]
    fn flash_is_not_writable() {
        assert!(!Permissions::READ_EXECUTE.allows(Permission::Write));
        assert!(Permissions::READ_EXECUTE.allows(Permission::Execute));
    }
}
