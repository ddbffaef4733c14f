// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Commands every Alpaca device answers.

use std::fmt;

use super::CommandEntry;
use crate::types::Access;

/// Identifier of a command from the shared table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommonCommand {
    /// Invoke a named driver action.
    Action,
    /// Send a raw command, no reply.
    CommandBlind,
    /// Send a raw command, boolean reply.
    CommandBool,
    /// Send a raw command, string reply.
    CommandString,
    /// Connect to the hardware.
    Connect,
    /// Read or set the connection state.
    Connected,
    /// Whether a connect or disconnect is in progress.
    Connecting,
    /// Device description.
    Description,
    /// Snapshot of the operational properties.
    DeviceState,
    /// Disconnect from the hardware.
    Disconnect,
    /// Driver description.
    DriverInfo,
    /// Driver version string.
    DriverVersion,
    /// Implemented interface version.
    InterfaceVersion,
    /// Device name.
    Name,
    /// Every readable property in one reply.
    ReadAll,
    /// Names of the supported actions. No device here implements custom
    /// actions, so the reply is always an empty list.
    SupportedActions,
}

impl CommonCommand {
    /// Returns the table name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Action => "action",
            Self::CommandBlind => "commandblind",
            Self::CommandBool => "commandbool",
            Self::CommandString => "commandstring",
            Self::Connect => "connect",
            Self::Connected => "connected",
            Self::Connecting => "connecting",
            Self::Description => "description",
            Self::DeviceState => "devicestate",
            Self::Disconnect => "disconnect",
            Self::DriverInfo => "driverinfo",
            Self::DriverVersion => "driverversion",
            Self::InterfaceVersion => "interfaceversion",
            Self::Name => "name",
            Self::ReadAll => "readall",
            Self::SupportedActions => "supportedactions",
        }
    }
}

impl fmt::Display for CommonCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const fn entry(id: CommonCommand, access: Access) -> CommandEntry<CommonCommand> {
    CommandEntry::new(id.as_str(), id, access)
}

/// The shared command table.
pub const COMMON_COMMANDS: &[CommandEntry<CommonCommand>] = &[
    entry(CommonCommand::Action, Access::Put),
    entry(CommonCommand::CommandBlind, Access::Put),
    entry(CommonCommand::CommandBool, Access::Put),
    entry(CommonCommand::CommandString, Access::Put),
    entry(CommonCommand::Connect, Access::Put),
    entry(CommonCommand::Connected, Access::Both),
    entry(CommonCommand::Connecting, Access::Get),
    entry(CommonCommand::Description, Access::Get),
    entry(CommonCommand::DeviceState, Access::Get),
    entry(CommonCommand::Disconnect, Access::Put),
    entry(CommonCommand::DriverInfo, Access::Get),
    entry(CommonCommand::DriverVersion, Access::Get),
    entry(CommonCommand::InterfaceVersion, Access::Get),
    entry(CommonCommand::Name, Access::Get),
    entry(CommonCommand::ReadAll, Access::Get),
    entry(CommonCommand::SupportedActions, Access::Get),
];
