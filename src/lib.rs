// BLE scanner screen: list nearby peripherals, connect to and disconnect from one

pub mod binding;
pub mod bluetooth;
pub mod command;
pub mod config;
pub mod error;
pub mod peripheral;
pub mod permissions;
pub mod screen;
pub mod view;

pub use binding::{BleBinding, DiscoveryEvents, StartOptions, Subscription};
pub use error::{BleError, Result};
pub use peripheral::{DiscoveredPeripheral, Peripheral, PeripheralId};
pub use screen::{ScanOptions, Screen, ScreenOptions};
pub use view::View;
