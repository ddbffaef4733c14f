// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Default handlers for the common command set.

use chrono::Utc;
use serde_json::{Value, json};

use super::{Call, CommonProperties, Driver, ReadAll};
use crate::command::CommonCommand;
use crate::error::DeviceError;
use crate::types::Method;

/// Handles a common command for `driver`.
///
/// This is the default behind [`Driver::handle_common`]; drivers that
/// override a few common commands call it for the rest.
///
/// # Errors
///
/// Returns not-implemented for the raw `action`/`command*` family, or
/// whatever the driver's connect/disconnect hooks and getters report.
pub fn handle_common<D: Driver>(
    driver: &mut D,
    command: CommonCommand,
    call: &mut Call<'_>,
    props: &mut CommonProperties,
) -> Result<(), DeviceError> {
    match command {
        CommonCommand::Action
        | CommonCommand::CommandBlind
        | CommonCommand::CommandBool
        | CommonCommand::CommandString => {
            return Err(DeviceError::not_implemented(format!(
                "{command} is not implemented"
            )));
        }
        CommonCommand::Connected => match call.method() {
            Method::Get => call.reply(props.connected()),
            Method::Put => {
                let connect = call.params().boolean("Connected")?;
                set_connected(driver, props, connect)?;
            }
        },
        CommonCommand::Connect => set_connected(driver, props, true)?,
        CommonCommand::Disconnect => set_connected(driver, props, false)?,
        CommonCommand::Connecting => call.reply(false),
        CommonCommand::Description => call.reply(props.info().description.as_str()),
        CommonCommand::DriverInfo => call.reply(D::DRIVER_INFO),
        CommonCommand::DriverVersion => call.reply(props.driver_version()),
        CommonCommand::InterfaceVersion => call.reply(D::INTERFACE_VERSION),
        CommonCommand::Name => call.reply(props.info().name.as_str()),
        CommonCommand::SupportedActions => call.reply(Value::Array(Vec::new())),
        CommonCommand::DeviceState => {
            let mut state = Vec::new();
            driver.device_state(&mut state);
            let mut entries: Vec<Value> = state
                .into_iter()
                .map(|(name, value)| json!({ "Name": name, "Value": value }))
                .collect();
            entries.push(json!({
                "Name": "TimeStamp",
                "Value": Utc::now().format("%Y-%m-%dT%H:%M:%S%.3f").to_string(),
            }));
            call.reply(entries);
        }
        CommonCommand::ReadAll => {
            let mut fields = ReadAll::new(call.out());
            fields.add("connected", props.connected());
            fields.add("description", props.info().description.as_str());
            fields.add("driverinfo", D::DRIVER_INFO);
            fields.add("driverversion", props.driver_version());
            fields.add("interfaceversion", D::INTERFACE_VERSION);
            fields.add("name", props.info().name.as_str());
            driver.read_all(&mut fields);
            return fields.finish();
        }
    }
    Ok(())
}

fn set_connected<D: Driver>(
    driver: &mut D,
    props: &mut CommonProperties,
    connect: bool,
) -> Result<(), DeviceError> {
    if connect == props.connected() {
        return Ok(());
    }
    if connect {
        driver.on_connect()?;
    } else {
        driver.on_disconnect()?;
    }
    props.set_connected(connect);
    tracing::info!(device = %props.info().name, connected = connect, "Connection state changed");
    Ok(())
}
