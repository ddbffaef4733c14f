// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Command tables and command resolution.
//!
//! Each device type declares a static table mapping command names to a
//! symbolic identifier and the methods it accepts. A shared table of
//! [common commands](CommonCommand) is available to every device type.
//!
//! Resolution looks in the device table first, then in the common table,
//! ignoring ASCII case. A name found in neither resolves to
//! [`Resolved::Unknown`].
//!
//! # Examples
//!
//! ```
//! use alpaca_hub::command::{resolve, CommandEntry, CommonCommand, Resolved};
//! use alpaca_hub::types::Access;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
//! enum Lamp {
//!     Brightness,
//! }
//!
//! const LAMP: &[CommandEntry<Lamp>] =
//!     &[CommandEntry::new("brightness", Lamp::Brightness, Access::Get)];
//!
//! assert!(matches!(resolve(LAMP, "BRIGHTNESS"), Resolved::Device(e) if e.id == Lamp::Brightness));
//! assert!(matches!(resolve(LAMP, "Name"), Resolved::Common(e) if e.id == CommonCommand::Name));
//! assert!(matches!(resolve(LAMP, "explode"), Resolved::Unknown));
//! ```

mod common;
mod stats;

pub use common::{COMMON_COMMANDS, CommonCommand};
pub use stats::{CommandCounter, CommandStats, CommandUsage};

use crate::types::Access;

/// One row of a command table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandEntry<C> {
    /// Lowercase command name as it appears in the URL.
    pub name: &'static str,
    /// Symbolic identifier handed to the handler.
    pub id: C,
    /// Methods the command accepts.
    pub access: Access,
}

impl<C> CommandEntry<C> {
    /// Creates a table entry.
    #[must_use]
    pub const fn new(name: &'static str, id: C, access: Access) -> Self {
        Self { name, id, access }
    }
}

/// Finds `name` in `table`, ignoring ASCII case.
#[must_use]
pub fn find<'a, C>(table: &'a [CommandEntry<C>], name: &str) -> Option<&'a CommandEntry<C>> {
    table
        .iter()
        .find(|entry| entry.name.eq_ignore_ascii_case(name))
}

/// Returns `true` if no two entries of `table` share a name.
#[must_use]
pub fn names_are_unique<C>(table: &[CommandEntry<C>]) -> bool {
    table.iter().enumerate().all(|(i, entry)| {
        table[i + 1..]
            .iter()
            .all(|other| !other.name.eq_ignore_ascii_case(entry.name))
    })
}

/// Outcome of looking up a command name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved<C> {
    /// Found in the device-specific table.
    Device(CommandEntry<C>),
    /// Found in the common table.
    Common(CommandEntry<CommonCommand>),
    /// Found nowhere.
    Unknown,
}

impl<C: Copy> Resolved<C> {
    /// Returns the key under which usage statistics are recorded.
    #[must_use]
    pub const fn key(&self) -> CommandKey<C> {
        match self {
            Self::Device(entry) => CommandKey::Device(entry.id),
            Self::Common(entry) => CommandKey::Common(entry.id),
            Self::Unknown => CommandKey::Unknown,
        }
    }

    /// Returns the access kind of the resolved entry.
    #[must_use]
    pub const fn access(&self) -> Option<Access> {
        match self {
            Self::Device(entry) => Some(entry.access),
            Self::Common(entry) => Some(entry.access),
            Self::Unknown => None,
        }
    }
}

/// Resolves `name` against a device table and then the common table.
#[must_use]
pub fn resolve<C: Copy>(device_table: &[CommandEntry<C>], name: &str) -> Resolved<C> {
    if let Some(entry) = find(device_table, name) {
        Resolved::Device(*entry)
    } else if let Some(entry) = find(COMMON_COMMANDS, name) {
        Resolved::Common(*entry)
    } else {
        Resolved::Unknown
    }
}

/// Identifies a command for statistics, across both tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKey<C> {
    /// A device-specific command.
    Device(C),
    /// A common command.
    Common(CommonCommand),
    /// Any unrecognized name.
    Unknown,
}

impl<C: Copy + PartialEq> CommandKey<C> {
    /// Returns the table name for this key.
    #[must_use]
    pub fn name(&self, device_table: &[CommandEntry<C>]) -> &'static str {
        match self {
            Self::Device(id) => device_table
                .iter()
                .find(|entry| entry.id == *id)
                .map_or("?", |entry| entry.name),
            Self::Common(id) => id.as_str(),
            Self::Unknown => "unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Focus {
        Position,
        Move,
        Name,
    }

    const TABLE: &[CommandEntry<Focus>] = &[
        CommandEntry::new("position", Focus::Position, Access::Get),
        CommandEntry::new("move", Focus::Move, Access::Put),
        CommandEntry::new("name", Focus::Name, Access::Get),
    ];

    #[test]
    fn lookup_ignores_case() {
        for name in ["position", "Position", "POSITION"] {
            assert_eq!(resolve(TABLE, name).key(), CommandKey::Device(Focus::Position));
        }
    }

    #[test]
    fn device_table_shadows_common() {
        assert_eq!(resolve(TABLE, "name").key(), CommandKey::Device(Focus::Name));
        assert_eq!(
            resolve(TABLE, "description").key(),
            CommandKey::Common(CommonCommand::Description)
        );
    }

    #[test]
    fn unknown_is_sentinel() {
        let resolved = resolve(TABLE, "teleport");
        assert_eq!(resolved, Resolved::Unknown);
        assert_eq!(resolved.access(), None);
        assert_eq!(resolved.key().name(TABLE), "unknown");
    }

    #[test]
    fn key_names() {
        assert_eq!(CommandKey::Device(Focus::Move).name(TABLE), "move");
        assert_eq!(
            CommandKey::<Focus>::Common(CommonCommand::ReadAll).name(TABLE),
            "readall"
        );
    }

    #[test]
    fn uniqueness_check() {
        assert!(names_are_unique(TABLE));
        assert!(names_are_unique(COMMON_COMMANDS));

        let dup = [
            CommandEntry::new("move", Focus::Move, Access::Put),
            CommandEntry::new("MOVE", Focus::Position, Access::Get),
        ];
        assert!(!names_are_unique(&dup));
    }
}
