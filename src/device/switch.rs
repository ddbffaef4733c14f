// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Switch bank simulator.

use serde_json::{Value, json};

use super::{Call, Driver, ReadAll};
use crate::command::CommandEntry;
use crate::error::DeviceError;
use crate::types::{Access, DeviceType};

/// Number of channels in a default bank.
pub const DEFAULT_SWITCH_COUNT: usize = 8;

/// One switch channel.
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchChannel {
    /// Channel name, writable through `setswitchname`.
    pub name: String,
    /// Channel description.
    pub description: String,
    /// Current value.
    pub value: f64,
    /// Lowest value.
    pub min: f64,
    /// Highest value.
    pub max: f64,
    /// Value increment.
    pub step: f64,
    /// Whether clients may set the value.
    pub writable: bool,
}

impl SwitchChannel {
    /// Creates a writable on/off channel, initially off.
    #[must_use]
    pub fn boolean(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            description: name.clone(),
            name,
            value: 0.0,
            min: 0.0,
            max: 1.0,
            step: 1.0,
            writable: true,
        }
    }

    /// Makes the channel read-only.
    #[must_use]
    pub fn read_only(mut self) -> Self {
        self.writable = false;
        self
    }

    /// `true` when the value is above the minimum.
    #[must_use]
    pub fn is_on(&self) -> bool {
        self.value > self.min
    }
}

/// Identifiers of the switch commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwitchCommand {
    /// Whether a channel is writable.
    CanWrite,
    /// Boolean state of a channel.
    GetSwitch,
    /// Channel description.
    GetSwitchDescription,
    /// Channel name.
    GetSwitchName,
    /// Channel value.
    GetSwitchValue,
    /// Number of channels.
    MaxSwitch,
    /// Highest channel value.
    MaxSwitchValue,
    /// Lowest channel value.
    MinSwitchValue,
    /// Sets the boolean state.
    SetSwitch,
    /// Renames a channel.
    SetSwitchName,
    /// Sets the value.
    SetSwitchValue,
    /// Channel value increment.
    SwitchStep,
}

const COMMANDS: &[CommandEntry<SwitchCommand>] = &[
    CommandEntry::new("canwrite", SwitchCommand::CanWrite, Access::Get),
    CommandEntry::new("getswitch", SwitchCommand::GetSwitch, Access::Get),
    CommandEntry::new("getswitchdescription", SwitchCommand::GetSwitchDescription, Access::Get),
    CommandEntry::new("getswitchname", SwitchCommand::GetSwitchName, Access::Get),
    CommandEntry::new("getswitchvalue", SwitchCommand::GetSwitchValue, Access::Get),
    CommandEntry::new("maxswitch", SwitchCommand::MaxSwitch, Access::Get),
    CommandEntry::new("maxswitchvalue", SwitchCommand::MaxSwitchValue, Access::Get),
    CommandEntry::new("minswitchvalue", SwitchCommand::MinSwitchValue, Access::Get),
    CommandEntry::new("setswitch", SwitchCommand::SetSwitch, Access::Put),
    CommandEntry::new("setswitchname", SwitchCommand::SetSwitchName, Access::Put),
    CommandEntry::new("setswitchvalue", SwitchCommand::SetSwitchValue, Access::Put),
    CommandEntry::new("switchstep", SwitchCommand::SwitchStep, Access::Get),
];

/// A bank of simulated switches.
#[derive(Debug, Clone)]
pub struct SimulatedSwitch {
    channels: Vec<SwitchChannel>,
}

impl Default for SimulatedSwitch {
    fn default() -> Self {
        Self::new(DEFAULT_SWITCH_COUNT)
    }
}

impl SimulatedSwitch {
    /// Creates `count` on/off channels named `Switch 0`, `Switch 1`, ...
    #[must_use]
    pub fn new(count: usize) -> Self {
        Self::with_channels((0..count).map(|i| SwitchChannel::boolean(format!("Switch {i}"))))
    }

    /// Creates a bank from explicit channels.
    #[must_use]
    pub fn with_channels(channels: impl IntoIterator<Item = SwitchChannel>) -> Self {
        Self {
            channels: channels.into_iter().collect(),
        }
    }

    /// The channels.
    #[must_use]
    pub fn channels(&self) -> &[SwitchChannel] {
        &self.channels
    }

    fn index(&self, call: &Call<'_>) -> Result<usize, DeviceError> {
        let id = call.params().integer("Id")?;
        usize::try_from(id)
            .ok()
            .filter(|&index| index < self.channels.len())
            .ok_or_else(|| {
                DeviceError::invalid_value(format!(
                    "Id {id} out of range 0..{}",
                    self.channels.len()
                ))
            })
    }

    fn channel(&self, call: &Call<'_>) -> Result<&SwitchChannel, DeviceError> {
        let index = self.index(call)?;
        Ok(&self.channels[index])
    }

    fn writable_channel(&mut self, call: &Call<'_>) -> Result<&mut SwitchChannel, DeviceError> {
        let index = self.index(call)?;
        let channel = &mut self.channels[index];
        if !channel.writable {
            return Err(DeviceError::not_implemented(format!(
                "Switch {index} is read-only"
            )));
        }
        Ok(channel)
    }
}

impl Driver for SimulatedSwitch {
    type Command = SwitchCommand;

    const DEVICE_TYPE: DeviceType = DeviceType::Switch;
    const COMMANDS: &'static [CommandEntry<SwitchCommand>] = COMMANDS;
    const INTERFACE_VERSION: i32 = 2;
    const DRIVER_INFO: &'static str = "alpaca-hub simulated switch bank";

    fn handle(&mut self, command: SwitchCommand, call: &mut Call<'_>) -> Result<(), DeviceError> {
        match command {
            SwitchCommand::MaxSwitch => call.reply(self.channels.len()),
            SwitchCommand::CanWrite => {
                let writable = self.channel(call)?.writable;
                call.reply(writable);
            }
            SwitchCommand::GetSwitch => {
                let on = self.channel(call)?.is_on();
                call.reply(on);
            }
            SwitchCommand::GetSwitchDescription => {
                let description = self.channel(call)?.description.clone();
                call.reply(description);
            }
            SwitchCommand::GetSwitchName => {
                let name = self.channel(call)?.name.clone();
                call.reply(name);
            }
            SwitchCommand::GetSwitchValue => {
                let value = self.channel(call)?.value;
                call.reply(value);
            }
            SwitchCommand::MaxSwitchValue => {
                let max = self.channel(call)?.max;
                call.reply(max);
            }
            SwitchCommand::MinSwitchValue => {
                let min = self.channel(call)?.min;
                call.reply(min);
            }
            SwitchCommand::SwitchStep => {
                let step = self.channel(call)?.step;
                call.reply(step);
            }
            SwitchCommand::SetSwitch => {
                let state = call.params().boolean("State")?;
                let channel = self.writable_channel(call)?;
                channel.value = if state { channel.max } else { channel.min };
                tracing::debug!(switch = %channel.name, state, "Switch set");
            }
            SwitchCommand::SetSwitchValue => {
                let value = call.params().number("Value")?;
                let channel = self.writable_channel(call)?;
                if !(channel.min..=channel.max).contains(&value) {
                    return Err(DeviceError::invalid_value(format!(
                        "Value {value} out of range {}..={}",
                        channel.min, channel.max
                    )));
                }
                channel.value = value;
                tracing::debug!(switch = %channel.name, value, "Switch value set");
            }
            SwitchCommand::SetSwitchName => {
                let name = call.params().text("Name")?.to_owned();
                let channel = self.writable_channel(call)?;
                channel.name = name;
            }
        }
        Ok(())
    }

    fn read_all(&self, fields: &mut ReadAll<'_>) {
        fields.add("maxswitch", self.channels.len());
        let switches: Vec<Value> = self
            .channels
            .iter()
            .map(|c| {
                json!({
                    "name": c.name,
                    "value": c.value,
                    "canwrite": c.writable,
                })
            })
            .collect();
        fields.add("switches", switches);
    }
}
