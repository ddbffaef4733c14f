// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Absolute focuser simulator.
//!
//! A `move` records a timed transition towards the target. While moving,
//! each tick advances the reported position along the travel at
//! [`FocuserSettings::step_rate`]; `halt` freezes it where it is.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tokio::time::Instant;

use super::{Call, Driver, ReadAll};
use crate::command::CommandEntry;
use crate::error::DeviceError;
use crate::state::Transition;
use crate::types::{Access, DeviceType, Method};

/// Tick delay while the focuser travels.
pub const MOVING_TICK: Duration = Duration::from_millis(100);

/// Tick delay at rest.
pub const IDLE_TICK: Duration = Duration::from_secs(1);

/// Static characteristics of a simulated focuser.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct FocuserSettings {
    /// Position at start-up.
    pub position: i32,
    /// Highest position.
    pub max_step: i32,
    /// Longest single move.
    pub max_increment: i32,
    /// Step size in microns.
    pub step_size: f64,
    /// Reported temperature in °C.
    pub temperature: f64,
    /// Whether temperature compensation can be switched on.
    pub temp_comp_available: bool,
    /// Travel speed in steps per second. Zero moves instantly.
    pub step_rate: u32,
}

impl Default for FocuserSettings {
    fn default() -> Self {
        Self {
            position: 4570,
            max_step: 87_000,
            max_increment: 10_000,
            step_size: 0.2667,
            temperature: 22.3,
            temp_comp_available: false,
            step_rate: 1000,
        }
    }
}

/// Identifiers of the focuser commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FocuserCommand {
    Absolute,
    Halt,
    IsMoving,
    MaxIncrement,
    MaxStep,
    Move,
    Position,
    StepSize,
    TempComp,
    TempCompAvailable,
    Temperature,
}

const COMMANDS: &[CommandEntry<FocuserCommand>] = &[
    CommandEntry::new("absolute", FocuserCommand::Absolute, Access::Get),
    CommandEntry::new("halt", FocuserCommand::Halt, Access::Put),
    CommandEntry::new("ismoving", FocuserCommand::IsMoving, Access::Get),
    CommandEntry::new("maxincrement", FocuserCommand::MaxIncrement, Access::Get),
    CommandEntry::new("maxstep", FocuserCommand::MaxStep, Access::Get),
    CommandEntry::new("move", FocuserCommand::Move, Access::Put),
    CommandEntry::new("position", FocuserCommand::Position, Access::Get),
    CommandEntry::new("stepsize", FocuserCommand::StepSize, Access::Get),
    CommandEntry::new("tempcomp", FocuserCommand::TempComp, Access::Both),
    CommandEntry::new("tempcompavailable", FocuserCommand::TempCompAvailable, Access::Get),
    CommandEntry::new("temperature", FocuserCommand::Temperature, Access::Get),
];

#[derive(Debug, Clone, Copy)]
struct Travel {
    from: i32,
    transition: Transition<i32>,
}

impl Travel {
    #[allow(clippy::cast_possible_truncation)]
    fn position_at(&self, now: Instant) -> i32 {
        let target = self.transition.target();
        let span = f64::from(target - self.from);
        self.from + (span * self.transition.progress(now)).round() as i32
    }
}

/// A simulated absolute focuser.
#[derive(Debug, Clone)]
pub struct SimulatedFocuser {
    settings: FocuserSettings,
    position: i32,
    travel: Option<Travel>,
    temp_comp: bool,
}

impl Default for SimulatedFocuser {
    fn default() -> Self {
        Self::new(FocuserSettings::default())
    }
}

impl SimulatedFocuser {
    /// Creates a focuser at rest at `settings.position`.
    #[must_use]
    pub fn new(settings: FocuserSettings) -> Self {
        Self {
            position: settings.position.clamp(0, settings.max_step.max(0)),
            settings,
            travel: None,
            temp_comp: false,
        }
    }

    /// Position as of the last tick or command.
    #[must_use]
    pub const fn position(&self) -> i32 {
        self.position
    }

    /// Whether a move is in progress.
    #[must_use]
    pub const fn is_moving(&self) -> bool {
        self.travel.is_some()
    }

    fn start_move(&mut self, call: &Call<'_>) -> Result<(), DeviceError> {
        let requested = call.params().integer("Position")?;
        let target = i32::try_from(requested)
            .ok()
            .filter(|t| (0..=self.settings.max_step).contains(t))
            .ok_or_else(|| {
                DeviceError::invalid_value(format!(
                    "Position {requested} out of range 0..={}",
                    self.settings.max_step
                ))
            })?;

        let distance = (target - self.position).unsigned_abs();
        if distance > self.settings.max_increment.unsigned_abs() {
            return Err(DeviceError::invalid_value(format!(
                "Move of {distance} steps exceeds the maximum increment {}",
                self.settings.max_increment
            )));
        }

        let duration = if self.settings.step_rate == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(f64::from(distance) / f64::from(self.settings.step_rate))
        };
        self.travel = Some(Travel {
            from: self.position,
            transition: Transition::new(target, call.now(), duration),
        });
        tracing::debug!(from = self.position, target, "Focuser moving");
        Ok(())
    }

    fn halt(&mut self, now: Instant) {
        if let Some(travel) = self.travel.take() {
            self.position = travel.position_at(now);
            tracing::debug!(position = self.position, "Focuser halted");
        }
    }
}

impl Driver for SimulatedFocuser {
    type Command = FocuserCommand;

    const DEVICE_TYPE: DeviceType = DeviceType::Focuser;
    const COMMANDS: &'static [CommandEntry<FocuserCommand>] = COMMANDS;
    const INTERFACE_VERSION: i32 = 3;
    const DRIVER_INFO: &'static str = "alpaca-hub simulated focuser";

    fn handle(&mut self, command: FocuserCommand, call: &mut Call<'_>) -> Result<(), DeviceError> {
        match command {
            FocuserCommand::Absolute => call.reply(true),
            FocuserCommand::Halt => self.halt(call.now()),
            FocuserCommand::IsMoving => call.reply(self.is_moving()),
            FocuserCommand::MaxIncrement => call.reply(self.settings.max_increment),
            FocuserCommand::MaxStep => call.reply(self.settings.max_step),
            FocuserCommand::Move => self.start_move(call)?,
            FocuserCommand::Position => call.reply(self.position),
            FocuserCommand::StepSize => call.reply(self.settings.step_size),
            FocuserCommand::TempComp => match call.method() {
                Method::Get => call.reply(self.temp_comp),
                Method::Put => {
                    let enable = call.params().boolean("TempComp")?;
                    if enable && !self.settings.temp_comp_available {
                        return Err(DeviceError::not_implemented(
                            "Temperature compensation is not available",
                        ));
                    }
                    self.temp_comp = enable;
                }
            },
            FocuserCommand::TempCompAvailable => call.reply(self.settings.temp_comp_available),
            FocuserCommand::Temperature => call.reply(self.settings.temperature),
        }
        Ok(())
    }

    fn read_all(&self, fields: &mut ReadAll<'_>) {
        fields.add("absolute", true);
        fields.add("ismoving", self.is_moving());
        fields.add("maxincrement", self.settings.max_increment);
        fields.add("maxstep", self.settings.max_step);
        fields.add("position", self.position);
        fields.add("stepsize", self.settings.step_size);
        fields.add("tempcomp", self.temp_comp);
        fields.add("tempcompavailable", self.settings.temp_comp_available);
        fields.add("temperature", self.settings.temperature);
    }

    fn device_state(&self, state: &mut Vec<(&'static str, Value)>) {
        state.push(("IsMoving", Value::from(self.is_moving())));
        state.push(("Position", Value::from(self.position)));
        state.push(("Temperature", Value::from(self.settings.temperature)));
    }

    fn tick(&mut self, now: Instant) -> Duration {
        let Some(travel) = self.travel else {
            return IDLE_TICK;
        };
        self.position = travel.position_at(now);
        if travel.transition.is_complete(now) {
            self.travel = None;
            tracing::debug!(position = self.position, "Focuser move complete");
            return IDLE_TICK;
        }
        MOVING_TICK
    }
}
