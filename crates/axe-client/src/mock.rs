//! Mock device for local development: canned snapshots per API version, no network.

use crate::ota;
use axe_types::{
    ApiVersion, OtaEvent, OtaTarget, OtaUpload, SystemApi, SystemApiError, SystemInfo,
    SystemUpdate,
};
use bytes::Bytes;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Latency the dashboard's mocked `getInfo` used.
pub const DEFAULT_LATENCY: Duration = Duration::from_secs(1);

pub const RESTART_REPLY: &str = "System will restart shortly.";
pub const OTA_REPLY: &str = "Firmware update complete, rebooting now!";

const STRATUM_USER: &str = "bc1q99n3pu025yyu0jlywpmwzalyhm36tg5u37w20d.bitaxe-U1";

/// Snapshot a legacy (`/api/system`) device reports.
pub fn legacy_fixture() -> SystemInfo {
    SystemInfo {
        power: 11.670000076293945,
        voltage: 5208.75,
        current: 2237.5,
        fan_speed: 82.0,
        hash_rate: 0.0,
        best_diff: "0".to_string(),
        free_heap: 200504,
        core_voltage: 1188,
        ssid: "skimadtrees-secure".to_string(),
        wifi_pass: "password".to_string(),
        wifi_status: "Connected!".to_string(),
        shares_accepted: 1,
        shares_rejected: 0,
        uptime_seconds: 38,
        asic_model: "BM1366".to_string(),
        stratum_url: "192.168.1.242".to_string(),
        stratum_port: 3333,
        stratum_user: STRATUM_USER.to_string(),
        temp: None,
        vr_temp: None,
        hostname: None,
        mac_addr: None,
        frequency: None,
        core_voltage_actual: None,
        best_session_diff: None,
        asic_count: None,
        small_core_count: None,
        fallback_stratum_url: None,
        fallback_stratum_port: None,
        fallback_stratum_user: None,
        version: None,
        board_version: None,
        running_partition: None,
        flip_screen: None,
        invert_screen: None,
        auto_fan_speed: None,
        manual_fan_speed: None,
        fan_rpm: None,
        overheat_mode: None,
        extra: serde_json::Map::new(),
    }
}

/// Snapshot a current (`/api/v2/system`) device reports.
pub fn v2_fixture() -> SystemInfo {
    SystemInfo {
        power: 14.3125,
        voltage: 5093.75,
        current: 3046.875,
        fan_speed: 68.0,
        hash_rate: 512.4,
        best_diff: "1.43G".to_string(),
        free_heap: 184316,
        core_voltage: 1200,
        shares_accepted: 1287,
        shares_rejected: 3,
        uptime_seconds: 86412,
        stratum_url: "public-pool.io".to_string(),
        stratum_port: 21496,
        temp: Some(58.25),
        vr_temp: Some(47.0),
        hostname: Some("bitaxe".to_string()),
        mac_addr: Some("40:4C:CA:5B:2E:10".to_string()),
        frequency: Some(525.0),
        core_voltage_actual: Some(1194),
        best_session_diff: Some("87.2M".to_string()),
        asic_count: Some(1),
        small_core_count: Some(894),
        fallback_stratum_url: Some("solo.ckpool.org".to_string()),
        fallback_stratum_port: Some(3333),
        fallback_stratum_user: Some(STRATUM_USER.to_string()),
        version: Some("v2.1.8".to_string()),
        board_version: Some("204".to_string()),
        running_partition: Some("factory".to_string()),
        flip_screen: Some(1),
        invert_screen: Some(0),
        auto_fan_speed: Some(1),
        manual_fan_speed: Some(100),
        fan_rpm: Some(4120),
        overheat_mode: Some(0),
        ..legacy_fixture()
    }
}

/// In-memory stand-in for a device. Patches and restarts mutate the held snapshot.
#[derive(Clone)]
pub struct MockSystemClient {
    version: ApiVersion,
    latency: Duration,
    info: Arc<RwLock<SystemInfo>>,
}

impl MockSystemClient {
    pub fn new(version: ApiVersion) -> Self {
        let info = match version {
            ApiVersion::V1 => legacy_fixture(),
            ApiVersion::V2 => v2_fixture(),
        };
        Self {
            version,
            latency: DEFAULT_LATENCY,
            info: Arc::new(RwLock::new(info)),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn version(&self) -> ApiVersion {
        self.version
    }

    async fn pause(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    async fn upload(
        &self,
        target: OtaTarget,
        path: PathBuf,
        events: &axe_types::OtaEventSender,
    ) -> Result<OtaEvent, SystemApiError> {
        let image = Bytes::from(tokio::fs::read(&path).await?);
        let total = image.len() as u64;
        tracing::info!(%target, path = %path.display(), bytes = total, "mock OTA upload");
        let _ = events.send(Ok(OtaEvent::Sent { total }));

        if image.is_empty() {
            let _ = events.send(Ok(OtaEvent::UploadProgress { loaded: 0, total }));
            return Err(SystemApiError::Status {
                status: 400,
                body: "empty image".to_string(),
            });
        }

        let parts = ota::chunks(&image);
        let step = if parts.is_empty() {
            Duration::ZERO
        } else {
            self.latency / parts.len() as u32
        };
        let mut loaded = 0u64;
        for chunk in parts {
            if !step.is_zero() {
                tokio::time::sleep(step).await;
            }
            loaded += chunk.len() as u64;
            let _ = events.send(Ok(OtaEvent::UploadProgress { loaded, total }));
        }
        Ok(OtaEvent::Response {
            status: 200,
            body: OTA_REPLY.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl SystemApi for MockSystemClient {
    async fn get_info(&self) -> Result<SystemInfo, SystemApiError> {
        self.pause().await;
        Ok(self.info.read().await.clone())
    }

    async fn restart(&self) -> Result<String, SystemApiError> {
        self.info.write().await.uptime_seconds = 0;
        tracing::info!("mock device restarted");
        Ok(RESTART_REPLY.to_string())
    }

    async fn update_system(&self, update: &SystemUpdate) -> Result<(), SystemApiError> {
        update.apply_to(&mut *self.info.write().await);
        tracing::debug!("mock device patched");
        Ok(())
    }

    fn ota_update(&self, target: OtaTarget, path: PathBuf) -> OtaUpload {
        let (tx, upload) = OtaUpload::from_channel();
        let mock = self.clone();
        tokio::spawn(async move {
            let outcome = mock.upload(target, path, &tx).await;
            let _ = tx.send(outcome);
        });
        upload
    }
}
