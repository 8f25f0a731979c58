// Configuration module for the BLE scanner screen

use serde::{Deserialize, Deserializer};
use std::path::Path;
use std::time::Duration;
use uuid::Uuid;

use crate::binding::StartOptions;
use crate::peripheral::DEFAULT_PLACEHOLDER_NAME;
use crate::permissions::{Platform, Rationale};
use crate::screen::{ScanOptions, ScreenOptions};
use crate::view::Labels;

pub const DEFAULT_CONFIG_PATH: &str = "ble-view.toml";
pub const ENV_PREFIX: &str = "BLE_VIEW";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub bluetooth: BluetoothConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub platform: Platform,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BluetoothConfig {
    /// Adapter name such as `hci0`; the default adapter when unset.
    #[serde(default)]
    pub adapter: Option<String>,
    #[serde(default)]
    pub show_alert: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScanConfig {
    /// A list in files; a comma-separated string from the environment.
    #[serde(default, deserialize_with = "uuid_list")]
    pub service_uuids: Vec<Uuid>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_allow_duplicates")]
    pub allow_duplicates: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            service_uuids: Vec::new(),
            timeout_secs: default_timeout_secs(),
            allow_duplicates: default_allow_duplicates(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_placeholder_name")]
    pub placeholder_name: String,
    #[serde(flatten)]
    pub labels: Labels,
    #[serde(default)]
    pub scan_rationale: Rationale,
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig {
            placeholder_name: default_placeholder_name(),
            labels: Labels::default(),
            scan_rationale: Rationale::default(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_allow_duplicates() -> bool {
    true
}

fn default_placeholder_name() -> String {
    DEFAULT_PLACEHOLDER_NAME.to_string()
}

fn uuid_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Uuid>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum UuidList {
        Many(Vec<Uuid>),
        Joined(String),
    }

    match UuidList::deserialize(deserializer)? {
        UuidList::Many(uuids) => Ok(uuids),
        UuidList::Joined(joined) => joined
            .split(',')
            .map(str::trim)
            .filter(|uuid| !uuid.is_empty())
            .map(|uuid| Uuid::parse_str(uuid).map_err(serde::de::Error::custom))
            .collect(),
    }
}

impl Config {
    pub fn screen_options(&self) -> ScreenOptions {
        ScreenOptions {
            start: StartOptions {
                show_alert: self.bluetooth.show_alert,
            },
            scan: ScanOptions {
                service_uuids: self.scan.service_uuids.clone(),
                timeout: Duration::from_secs(self.scan.timeout_secs),
                allow_duplicates: self.scan.allow_duplicates,
            },
            platform: self.platform.clone(),
            scan_rationale: self.ui.scan_rationale.clone(),
            placeholder_name: self.ui.placeholder_name.clone(),
            labels: self.ui.labels.clone(),
        }
    }
}

/// Built-in defaults, then `path` if it exists, then `BLE_VIEW__*`
/// environment variables (`BLE_VIEW__SCAN__TIMEOUT_SECS=10`).
pub fn load_config(path: &Path) -> Result<Config, ::config::ConfigError> {
    load_with(path, environment())
}

// Values stay strings; numbers and bools are converted per field on
// deserialization, so `BLE_VIEW__UI__SCAN=1` is the label "1".
fn environment() -> ::config::Environment {
    ::config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
}

fn load_with(path: &Path, env: ::config::Environment) -> Result<Config, ::config::ConfigError> {
    ::config::Config::builder()
        .add_source(::config::File::from(path).required(false))
        .add_source(env)
        .build()?
        .try_deserialize()
}
