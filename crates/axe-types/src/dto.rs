//! Request and response DTOs compatible with the AxeOS system API.

use serde::{Deserialize, Serialize};
use std::fmt;

/// System info snapshot (`GET <prefix>/info`).
///
/// The first block of fields is reported by every firmware release; the optional block only by
/// newer ones. Keys the firmware adds later are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemInfo {
    /// Watts.
    pub power: f64,
    /// Input voltage in millivolts.
    pub voltage: f64,
    /// Input current in milliamps.
    pub current: f64,
    pub fan_speed: f64,
    /// Gigahashes per second.
    pub hash_rate: f64,
    pub best_diff: String,
    pub free_heap: u64,
    /// Requested ASIC core voltage in millivolts.
    pub core_voltage: u32,
    pub ssid: String,
    pub wifi_pass: String,
    pub wifi_status: String,
    pub shares_accepted: u64,
    pub shares_rejected: u64,
    pub uptime_seconds: u64,
    #[serde(rename = "ASICModel")]
    pub asic_model: String,
    #[serde(rename = "stratumURL")]
    pub stratum_url: String,
    pub stratum_port: u16,
    pub stratum_user: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vr_temp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac_addr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub core_voltage_actual: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_session_diff: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asic_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub small_core_count: Option<u32>,
    #[serde(
        rename = "fallbackStratumURL",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub fallback_stratum_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_stratum_port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_stratum_user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub running_partition: Option<String>,
    #[serde(rename = "flipscreen", default, skip_serializing_if = "Option::is_none")]
    pub flip_screen: Option<u8>,
    #[serde(rename = "invertscreen", default, skip_serializing_if = "Option::is_none")]
    pub invert_screen: Option<u8>,
    #[serde(rename = "autofanspeed", default, skip_serializing_if = "Option::is_none")]
    pub auto_fan_speed: Option<u8>,
    /// Manual fan duty in percent, used when `autofanspeed` is 0.
    #[serde(rename = "fanspeed", default, skip_serializing_if = "Option::is_none")]
    pub manual_fan_speed: Option<u8>,
    #[serde(rename = "fanrpm", default, skip_serializing_if = "Option::is_none")]
    pub fan_rpm: Option<u32>,
    #[serde(rename = "overheat_mode", default, skip_serializing_if = "Option::is_none")]
    pub overheat_mode: Option<u8>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl SystemInfo {
    pub fn input_voltage_volts(&self) -> f64 {
        self.voltage / 1000.0
    }

    /// Joules per terahash. `None` while the device is not hashing.
    pub fn efficiency_j_per_th(&self) -> Option<f64> {
        if self.hash_rate > 0.0 {
            Some(self.power / (self.hash_rate / 1000.0))
        } else {
            None
        }
    }

    pub fn wifi_state(&self) -> WifiStatus {
        WifiStatus::parse(&self.wifi_status)
    }
}

/// Wi-Fi station state as reported in `wifiStatus`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WifiStatus {
    Connected,
    Disconnected,
    Connecting,
    Disconnecting,
    ConnectFailed,
    Retrying,
    Other(String),
}

impl WifiStatus {
    /// Lenient parse: case-insensitive, punctuation ignored, leading words decide.
    pub fn parse(raw: &str) -> Self {
        let words: Vec<String> = raw
            .split(|c: char| !c.is_ascii_alphabetic())
            .filter(|w| !w.is_empty())
            .map(|w| w.to_ascii_lowercase())
            .collect();
        let first = words.first().map(String::as_str).unwrap_or("");
        let second = words.get(1).map(String::as_str).unwrap_or("");
        match (first, second) {
            ("connected", _) => WifiStatus::Connected,
            ("disconnected", _) => WifiStatus::Disconnected,
            ("connecting", _) => WifiStatus::Connecting,
            ("disconnecting", _) => WifiStatus::Disconnecting,
            ("connect", "failed") | ("connection", "failed") | ("failed", _) => {
                WifiStatus::ConnectFailed
            }
            ("retrying", _) => WifiStatus::Retrying,
            _ => WifiStatus::Other(raw.trim().to_string()),
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, WifiStatus::Connected)
    }
}

impl fmt::Display for WifiStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WifiStatus::Connected => f.write_str("connected"),
            WifiStatus::Disconnected => f.write_str("disconnected"),
            WifiStatus::Connecting => f.write_str("connecting"),
            WifiStatus::Disconnecting => f.write_str("disconnecting"),
            WifiStatus::ConnectFailed => f.write_str("connect failed"),
            WifiStatus::Retrying => f.write_str("retrying"),
            WifiStatus::Other(s) => f.write_str(s),
        }
    }
}

/// Configuration patch (`PATCH <prefix>`). Unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemUpdate {
    #[serde(rename = "stratumURL", default, skip_serializing_if = "Option::is_none")]
    pub stratum_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stratum_port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stratum_user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stratum_password: Option<String>,
    #[serde(
        rename = "fallbackStratumURL",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub fallback_stratum_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_stratum_port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_stratum_user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_stratum_password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wifi_pass: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub core_voltage: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<f64>,
    #[serde(rename = "flipscreen", default, skip_serializing_if = "Option::is_none")]
    pub flip_screen: Option<u8>,
    #[serde(rename = "invertscreen", default, skip_serializing_if = "Option::is_none")]
    pub invert_screen: Option<u8>,
    #[serde(
        rename = "invertfanpolarity",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub invert_fan_polarity: Option<u8>,
    #[serde(rename = "autofanspeed", default, skip_serializing_if = "Option::is_none")]
    pub auto_fan_speed: Option<u8>,
    #[serde(rename = "fanspeed", default, skip_serializing_if = "Option::is_none")]
    pub manual_fan_speed: Option<u8>,
    #[serde(rename = "overheat_mode", default, skip_serializing_if = "Option::is_none")]
    pub overheat_mode: Option<u8>,

    /// Keys without a typed field; forwarded as-is.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl SystemUpdate {
    pub fn is_empty(&self) -> bool {
        self == &SystemUpdate::default()
    }

    /// Merge set fields into a snapshot (used by the mock device).
    pub fn apply_to(&self, info: &mut SystemInfo) {
        if let Some(ref v) = self.stratum_url {
            info.stratum_url = v.clone();
        }
        if let Some(v) = self.stratum_port {
            info.stratum_port = v;
        }
        if let Some(ref v) = self.stratum_user {
            info.stratum_user = v.clone();
        }
        if let Some(ref v) = self.fallback_stratum_url {
            info.fallback_stratum_url = Some(v.clone());
        }
        if let Some(v) = self.fallback_stratum_port {
            info.fallback_stratum_port = Some(v);
        }
        if let Some(ref v) = self.fallback_stratum_user {
            info.fallback_stratum_user = Some(v.clone());
        }
        if let Some(ref v) = self.ssid {
            info.ssid = v.clone();
        }
        if let Some(ref v) = self.wifi_pass {
            info.wifi_pass = v.clone();
        }
        if let Some(ref v) = self.hostname {
            info.hostname = Some(v.clone());
        }
        if let Some(v) = self.core_voltage {
            info.core_voltage = v;
        }
        if let Some(v) = self.frequency {
            info.frequency = Some(v);
        }
        if let Some(v) = self.flip_screen {
            info.flip_screen = Some(v);
        }
        if let Some(v) = self.invert_screen {
            info.invert_screen = Some(v);
        }
        if let Some(v) = self.auto_fan_speed {
            info.auto_fan_speed = Some(v);
        }
        if let Some(v) = self.manual_fan_speed {
            info.manual_fan_speed = Some(v);
        }
        if let Some(v) = self.overheat_mode {
            info.overheat_mode = Some(v);
        }
        // passwords are write-only on the device
        for (k, v) in &self.extra {
            info.extra.insert(k.clone(), v.clone());
        }
    }
}
