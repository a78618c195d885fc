//! HTTP and mock clients for the AxeOS device REST API.

mod config;
mod http;
pub mod mock;
mod ota;

pub use axe_types::{
    ApiVersion, OtaEvent, OtaTarget, OtaUpload, SystemApi, SystemApiError, SystemInfo,
    SystemUpdate, WifiStatus,
};
pub use config::{connect, ClientConfig};
pub use http::HttpSystemClient;
pub use mock::MockSystemClient;
pub use ota::OTA_CHUNK_SIZE;
