// Peripheral records and the reducers applied to discovery events

use serde::Serialize;
use std::fmt;

/// Label shown for peripherals that advertise no name.
pub const DEFAULT_PLACEHOLDER_NAME: &str = "Không tên";

/// Platform-assigned peripheral identifier (a BD address on BlueZ).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PeripheralId(String);

impl PeripheralId {
    pub fn new(id: impl Into<String>) -> Self {
        PeripheralId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeripheralId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PeripheralId {
    fn from(id: &str) -> Self {
        PeripheralId::new(id)
    }
}

impl From<String> for PeripheralId {
    fn from(id: String) -> Self {
        PeripheralId(id)
    }
}

/// A "peripheral discovered" record as emitted by the native binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredPeripheral {
    pub id: PeripheralId,
    pub name: Option<String>,
    pub connected: bool,
}

impl DiscoveredPeripheral {
    pub fn new(id: impl Into<PeripheralId>, name: Option<&str>) -> Self {
        DiscoveredPeripheral {
            id: id.into(),
            name: name.map(str::to_string),
            connected: false,
        }
    }
}

/// A listed peripheral. Whether it is connected is owned by the screen,
/// not stored here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peripheral {
    pub id: PeripheralId,
    pub name: String,
}

/// Name to display for an advertised name; empty counts as absent.
pub fn display_name(name: Option<&str>, placeholder: &str) -> String {
    match name {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => placeholder.to_string(),
    }
}

/// Returns the entry to append for `record`, or `None` when `devices`
/// already lists its identifier. The first sighting of an id wins.
pub fn admit(
    devices: &[Peripheral],
    record: &DiscoveredPeripheral,
    placeholder: &str,
) -> Option<Peripheral> {
    if devices.iter().any(|device| device.id == record.id) {
        return None;
    }
    Some(Peripheral {
        id: record.id.clone(),
        name: display_name(record.name.as_deref(), placeholder),
    })
}
