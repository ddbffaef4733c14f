// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-command usage counters.
//!
//! Counters are diagnostic only; nothing reads them to make decisions.

use std::collections::HashMap;
use std::hash::Hash;

use super::{CommandEntry, CommandKey};
use crate::error::Status;
use crate::types::Method;

/// Usage of one command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommandCounter {
    /// Dispatches made with GET.
    pub gets: u64,
    /// Dispatches made with PUT.
    pub puts: u64,
    /// Dispatches that ended in a non-success status.
    pub errors: u64,
    /// Status of the most recent dispatch.
    pub last_status: Status,
}

impl CommandCounter {
    /// Total dispatches.
    #[must_use]
    pub const fn calls(&self) -> u64 {
        self.gets + self.puts
    }

    fn record(&mut self, method: Method, status: Status) {
        match method {
            Method::Get => self.gets += 1,
            Method::Put => self.puts += 1,
        }
        if status.is_error() {
            self.errors += 1;
        }
        self.last_status = status;
    }
}

/// Usage counters for one device, keyed by command.
#[derive(Debug, Clone)]
pub struct CommandStats<C> {
    counters: HashMap<CommandKey<C>, CommandCounter>,
    total: CommandCounter,
}

impl<C> Default for CommandStats<C> {
    fn default() -> Self {
        Self {
            counters: HashMap::new(),
            total: CommandCounter::default(),
        }
    }
}

impl<C: Copy + Eq + Hash> CommandStats<C> {
    /// Creates empty statistics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one dispatch of `key` with `method` ending in `status`.
    pub fn record(&mut self, key: CommandKey<C>, method: Method, status: Status) {
        self.counters.entry(key).or_default().record(method, status);
        self.total.record(method, status);
    }

    /// Returns the counter for `key`, if it was ever dispatched.
    #[must_use]
    pub fn get(&self, key: CommandKey<C>) -> Option<&CommandCounter> {
        self.counters.get(&key)
    }

    /// Returns the sum over all commands.
    #[must_use]
    pub const fn total(&self) -> &CommandCounter {
        &self.total
    }

    /// Returns named usage rows, busiest first.
    #[must_use]
    pub fn usage(&self, device_table: &[CommandEntry<C>]) -> Vec<CommandUsage> {
        let mut rows: Vec<CommandUsage> = self
            .counters
            .iter()
            .map(|(key, counter)| CommandUsage {
                command: key.name(device_table),
                counter: *counter,
            })
            .collect();
        rows.sort_by(|a, b| {
            b.counter
                .calls()
                .cmp(&a.counter.calls())
                .then(a.command.cmp(b.command))
        });
        rows
    }
}

/// A named usage row, detached from the device's command type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandUsage {
    /// Table name of the command, or `"unknown"`.
    pub command: &'static str,
    /// Its counters.
    pub counter: CommandCounter,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommonCommand;
    use crate::types::Access;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Cmd {
        Halt,
    }

    const TABLE: &[CommandEntry<Cmd>] = &[CommandEntry::new("halt", Cmd::Halt, Access::Put)];

    #[test]
    fn counts_by_method_and_errors() {
        let mut stats = CommandStats::new();
        stats.record(CommandKey::Device(Cmd::Halt), Method::Put, Status::Success);
        stats.record(
            CommandKey::Device(Cmd::Halt),
            Method::Get,
            Status::InvalidOperation,
        );

        let halt = stats.get(CommandKey::Device(Cmd::Halt)).unwrap();
        assert_eq!(halt.puts, 1);
        assert_eq!(halt.gets, 1);
        assert_eq!(halt.errors, 1);
        assert_eq!(halt.last_status, Status::InvalidOperation);
        assert_eq!(stats.total().calls(), 2);
    }

    #[test]
    fn unseen_command_has_no_counter() {
        let stats = CommandStats::<Cmd>::new();
        assert!(stats.get(CommandKey::Unknown).is_none());
        assert_eq!(stats.total().calls(), 0);
    }

    #[test]
    fn usage_rows_are_named_and_sorted() {
        let mut stats = CommandStats::new();
        stats.record(CommandKey::Unknown, Method::Get, Status::InvalidOperation);
        for _ in 0..3 {
            stats.record(
                CommandKey::Common(CommonCommand::Name),
                Method::Get,
                Status::Success,
            );
        }
        stats.record(CommandKey::Device(Cmd::Halt), Method::Put, Status::Success);

        let rows = stats.usage(TABLE);
        let names: Vec<&str> = rows.iter().map(|row| row.command).collect();
        assert_eq!(names, ["name", "halt", "unknown"]);
        assert_eq!(rows[0].counter.gets, 3);
    }
}
