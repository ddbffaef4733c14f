// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `/management` endpoints.

use serde_json::{Value, json};

use super::DeviceRegistry;
use crate::error::DeviceError;
use crate::protocol::ManagementRoute;
use crate::response::{ResponseBuilder, VALUE};
use crate::types::Method;

/// Alpaca API versions served.
pub const API_VERSIONS: [u32; 1] = [1];

/// Writes the `Value` of a management route.
pub(crate) fn respond(
    route: ManagementRoute,
    method: Method,
    registry: &DeviceRegistry,
    out: &mut ResponseBuilder,
) -> Result<(), DeviceError> {
    if method != Method::Get {
        return Err(DeviceError::invalid_operation(
            "management endpoints only accept GET",
        ));
    }
    let value = match route {
        ManagementRoute::ApiVersions => json!(API_VERSIONS),
        ManagementRoute::Description => description(registry),
        ManagementRoute::ConfiguredDevices => configured_devices(registry),
    };
    out.add_value(VALUE, &value);
    Ok(())
}

fn description(registry: &DeviceRegistry) -> Value {
    let info = registry.info();
    json!({
        "ServerName": info.server_name,
        "Manufacturer": info.manufacturer,
        "ManufacturerVersion": info.manufacturer_version,
        "Location": info.location,
    })
}

fn configured_devices(registry: &DeviceRegistry) -> Value {
    registry
        .devices()
        .map(|device| {
            json!({
                "DeviceName": device.name,
                "DeviceType": device.device_type.display_name(),
                "DeviceNumber": device.number,
                "UniqueID": device.unique_id.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use tokio::time::Instant;

    use super::*;
    use crate::capabilities::Capabilities;
    use crate::device::{CoverCalibrator, SimulatedFocuser};
    use crate::manager::ServerInfo;

    fn get(registry: &mut DeviceRegistry, path: &str) -> Value {
        let raw = format!("GET {path} HTTP/1.1\r\n\r\n");
        let reply = registry.handle_raw(raw.as_bytes(), Instant::now());
        serde_json::from_str(reply.body()).unwrap()
    }

    fn registry() -> DeviceRegistry {
        let now = Instant::now();
        let mut registry = DeviceRegistry::new(ServerInfo {
            location: "Backyard".to_string(),
            ..ServerInfo::default()
        });
        registry.register(CoverCalibrator::simulated(Capabilities::full()), "Panel", now);
        registry.register(SimulatedFocuser::default(), "Focuser", now);
        registry
    }

    #[test]
    fn api_versions() {
        let value = get(&mut registry(), "/management/apiversions");
        assert_eq!(value["Value"], json!([1]));
        assert_eq!(value["ErrorNumber"], 0);
    }

    #[test]
    fn description_fields() {
        let value = get(&mut registry(), "/management/v1/description");
        assert_eq!(value["Value"]["Location"], "Backyard");
        assert_eq!(value["Value"]["ManufacturerVersion"], env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn configured_devices_list() {
        let mut registry = registry();
        let value = get(&mut registry, "/management/v1/configureddevices");
        let devices = value["Value"].as_array().unwrap();

        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0]["DeviceType"], "CoverCalibrator");
        assert_eq!(devices[1]["DeviceName"], "Focuser");
        assert_eq!(devices[1]["DeviceNumber"], 0);

        let id = devices[0]["UniqueID"].as_str().unwrap();
        assert!(uuid::Uuid::parse_str(id).is_ok());
    }

    #[test]
    fn put_is_rejected() {
        let now = Instant::now();
        let reply = registry().handle_raw(b"PUT /management/apiversions HTTP/1.1\r\n\r\n", now);
        let value: Value = serde_json::from_str(reply.body()).unwrap();
        assert_eq!(value["ErrorNumber"], 0x40B);
        assert!(value.get("Value").is_none());
    }
}
