// Runtime permissions requested before scanning

use log::debug;
use serde::Deserialize;
use std::fmt;
use std::future::Future;

/// Android API level from which fine location is a runtime permission.
pub const LOCATION_RUNTIME_API_LEVEL: u32 = 23;
/// Android API level that introduced the dedicated scan permission.
pub const BLUETOOTH_SCAN_API_LEVEL: u32 = 31;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    AccessFineLocation,
    BluetoothScan,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::AccessFineLocation => "android.permission.ACCESS_FINE_LOCATION",
            Permission::BluetoothScan => "android.permission.BLUETOOTH_SCAN",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
    NeverAskAgain,
}

/// Text of the dialog shown before the system prompt. Unset fields keep
/// their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Rationale {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_message")]
    pub message: String,
    #[serde(default = "default_button_neutral")]
    pub button_neutral: Option<String>,
    #[serde(default = "default_button_negative")]
    pub button_negative: Option<String>,
    #[serde(default = "default_button_positive")]
    pub button_positive: String,
}

fn default_title() -> String {
    "Quyền Quét Bluetooth".to_string()
}

fn default_message() -> String {
    "Ứng dụng cần quyền quét các thiết bị Bluetooth".to_string()
}

fn default_button_neutral() -> Option<String> {
    Some("Hỏi Lại Sau".to_string())
}

fn default_button_negative() -> Option<String> {
    Some("Hủy".to_string())
}

fn default_button_positive() -> String {
    "Đồng Ý".to_string()
}

impl Default for Rationale {
    fn default() -> Self {
        Rationale {
            title: default_title(),
            message: default_message(),
            button_neutral: default_button_neutral(),
            button_negative: default_button_negative(),
            button_positive: default_button_positive(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Platform {
    #[serde(default = "default_os")]
    pub os: String,
    #[serde(default)]
    pub api_level: Option<u32>,
}

impl Default for Platform {
    fn default() -> Self {
        Platform {
            os: default_os(),
            api_level: None,
        }
    }
}

fn default_os() -> String {
    std::env::consts::OS.to_string()
}

impl Platform {
    pub fn android(api_level: u32) -> Self {
        Platform {
            os: "android".to_string(),
            api_level: Some(api_level),
        }
    }

    fn android_api_level(&self) -> Option<u32> {
        if self.os == "android" {
            self.api_level
        } else {
            None
        }
    }
}

/// Permissions to request at mount, in request order.
pub fn required_permissions(platform: &Platform) -> Vec<Permission> {
    let mut permissions = Vec::new();
    if let Some(level) = platform.android_api_level() {
        if level >= LOCATION_RUNTIME_API_LEVEL {
            permissions.push(Permission::AccessFineLocation);
        }
        if level >= BLUETOOTH_SCAN_API_LEVEL {
            permissions.push(Permission::BluetoothScan);
        }
    }
    permissions
}

pub trait PermissionRequester {
    fn request(
        &self,
        permission: Permission,
        rationale: Option<&Rationale>,
    ) -> impl Future<Output = PermissionStatus> + Send;
}

/// Desktop hosts have no runtime prompts; BlueZ access is governed by D-Bus
/// policy, so everything is reported as granted.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostPermissions;

impl PermissionRequester for HostPermissions {
    async fn request(
        &self,
        permission: Permission,
        _rationale: Option<&Rationale>,
    ) -> PermissionStatus {
        debug!("{} granted by host policy", permission);
        PermissionStatus::Granted
    }
}
