//! Endpoint table for the two generations of the AxeOS system API.

use crate::SystemApiError;
use std::fmt;
use std::str::FromStr;

/// API generation. Legacy firmware serves `/api/system`, current firmware `/api/v2/system`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ApiVersion {
    V1,
    #[default]
    V2,
}

/// Which image an OTA upload replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OtaTarget {
    /// Firmware application image.
    Firmware,
    /// Web dashboard (www partition) image.
    Www,
}

impl ApiVersion {
    /// Path used for `PATCH` and as the base of the other system routes.
    pub fn system_path(self) -> &'static str {
        match self {
            ApiVersion::V1 => "/api/system",
            ApiVersion::V2 => "/api/v2/system",
        }
    }

    pub fn info_path(self) -> &'static str {
        match self {
            ApiVersion::V1 => "/api/system/info",
            ApiVersion::V2 => "/api/v2/system/info",
        }
    }

    pub fn restart_path(self) -> &'static str {
        match self {
            ApiVersion::V1 => "/api/system/restart",
            ApiVersion::V2 => "/api/v2/system/restart",
        }
    }

    pub fn ota_path(self, target: OtaTarget) -> &'static str {
        match (self, target) {
            (ApiVersion::V1, OtaTarget::Firmware) => "/api/system/OTA",
            (ApiVersion::V1, OtaTarget::Www) => "/api/system/OTAWWW",
            (ApiVersion::V2, OtaTarget::Firmware) => "/api/v2/system/ota",
            (ApiVersion::V2, OtaTarget::Www) => "/api/v2/system/otawww",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ApiVersion::V1 => "v1",
            ApiVersion::V2 => "v2",
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApiVersion {
    type Err = SystemApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "v1" | "1" | "legacy" => Ok(ApiVersion::V1),
            "v2" | "2" => Ok(ApiVersion::V2),
            other => Err(SystemApiError::Config(format!(
                "unknown API version {:?} (expected v1 or v2)",
                other
            ))),
        }
    }
}

impl fmt::Display for OtaTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OtaTarget::Firmware => f.write_str("firmware"),
            OtaTarget::Www => f.write_str("www"),
        }
    }
}
