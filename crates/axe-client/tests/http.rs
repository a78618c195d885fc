//! HTTP client against a fake device: verbs, paths, payloads, OTA events, error mapping.

use axe_client::{
    mock, ApiVersion, HttpSystemClient, OtaEvent, SystemApi, SystemApiError, SystemUpdate,
    OTA_CHUNK_SIZE,
};
use serde_json::json;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use wiremock::matchers::{body_bytes, body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer, version: ApiVersion) -> HttpSystemClient {
    // trailing slash must not double up with route paths
    HttpSystemClient::new(format!("{}/", server.uri()), version)
}

fn image_file(bytes: &[u8]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(bytes).unwrap();
    file
}

#[tokio::test]
async fn get_info_v1_uses_legacy_path() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/system/info"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::to_value(mock::legacy_fixture()).unwrap()),
        )
        .expect(1)
        .mount(&server)
        .await;

    let info = client(&server, ApiVersion::V1).get_info().await.unwrap();
    assert_eq!(info, mock::legacy_fixture());
}

#[tokio::test]
async fn get_info_v2_keeps_unknown_keys() {
    let server = MockServer::start().await;
    let mut body = serde_json::to_value(mock::v2_fixture()).unwrap();
    body["displayTimeout"] = json!(-1);
    Mock::given(method("GET"))
        .and(path("/api/v2/system/info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(&server)
        .await;

    let info = client(&server, ApiVersion::V2).get_info().await.unwrap();
    assert_eq!(info.temp, Some(58.25));
    assert_eq!(info.extra.get("displayTimeout"), Some(&json!(-1)));
}

#[tokio::test]
async fn get_info_bad_json_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/system/info"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"power\": 1"))
        .mount(&server)
        .await;

    let err = client(&server, ApiVersion::V2).get_info().await.unwrap_err();
    assert!(matches!(err, SystemApiError::Decode(_)));
}

#[tokio::test]
async fn restart_posts_empty_object() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/system/restart"))
        .and(body_json(json!({})))
        .respond_with(ResponseTemplate::new(200).set_body_string(mock::RESTART_REPLY))
        .expect(1)
        .mount(&server)
        .await;

    let reply = client(&server, ApiVersion::V1).restart().await.unwrap();
    assert_eq!(reply, mock::RESTART_REPLY);
}

#[tokio::test]
async fn update_patches_only_set_fields() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/v2/system"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({
            "stratumURL": "solo.ckpool.org",
            "stratumPort": 3333,
            "coreVoltage": 1150
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let update = SystemUpdate {
        stratum_url: Some("solo.ckpool.org".to_string()),
        stratum_port: Some(3333),
        core_voltage: Some(1150),
        ..Default::default()
    };
    client(&server, ApiVersion::V2)
        .update_system(&update)
        .await
        .unwrap();
}

#[tokio::test]
async fn error_status_keeps_body() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/system"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Failed to parse JSON"))
        .mount(&server)
        .await;

    let err = client(&server, ApiVersion::V1)
        .update_system(&SystemUpdate::default())
        .await
        .unwrap_err();
    match err {
        SystemApiError::Status { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "Failed to parse JSON");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn slow_device_times_out_as_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/system/info"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let err = client(&server, ApiVersion::V2)
        .with_timeout(Duration::from_millis(100))
        .get_info()
        .await
        .unwrap_err();
    assert!(matches!(err, SystemApiError::Transport(_)));
}

#[tokio::test]
async fn firmware_ota_streams_octets_with_progress() {
    let server = MockServer::start().await;
    let image: Vec<u8> = (0..(OTA_CHUNK_SIZE * 2 + 123)).map(|i| (i % 251) as u8).collect();
    Mock::given(method("POST"))
        .and(path("/api/system/OTA"))
        .and(header("content-type", "application/octet-stream"))
        .and(body_bytes(image.clone()))
        .respond_with(ResponseTemplate::new(200).set_body_string(mock::OTA_REPLY))
        .expect(1)
        .mount(&server)
        .await;

    let file = image_file(&image);
    let mut upload = client(&server, ApiVersion::V1).perform_ota_update(file.path().to_path_buf());

    let mut events = Vec::new();
    while let Some(ev) = upload.next().await {
        events.push(ev.unwrap());
    }
    let total = image.len() as u64;
    assert_eq!(events.first(), Some(&OtaEvent::Sent { total }));
    assert_eq!(
        events.last(),
        Some(&OtaEvent::Response {
            status: 200,
            body: mock::OTA_REPLY.to_string()
        })
    );

    let progress: Vec<u64> = events
        .iter()
        .filter_map(|e| match e {
            OtaEvent::UploadProgress { loaded, .. } => Some(*loaded),
            _ => None,
        })
        .collect();
    assert_eq!(progress.len(), 3);
    assert!(progress.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(progress.last(), Some(&total));
}

#[tokio::test]
async fn www_ota_v2_path_and_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v2/system/otawww"))
        .respond_with(ResponseTemplate::new(400).set_body_string("Invalid image"))
        .expect(1)
        .mount(&server)
        .await;

    let file = image_file(b"not a www image");
    let err = client(&server, ApiVersion::V2)
        .perform_www_ota_update(file.path().to_path_buf())
        .finish()
        .await
        .unwrap_err();
    assert!(matches!(err, SystemApiError::Status { status: 400, .. }));
}

#[tokio::test]
async fn ota_missing_file_never_contacts_device() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut upload = client(&server, ApiVersion::V2)
        .perform_ota_update(PathBuf::from("/nonexistent/esp-miner.bin"));
    assert!(matches!(upload.next().await, Some(Err(SystemApiError::Io(_)))));
    assert!(upload.next().await.is_none());
}

#[tokio::test]
async fn ota_is_not_bound_by_request_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v2/system/ota"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(mock::OTA_REPLY)
                .set_delay(Duration::from_millis(600)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server, ApiVersion::V2).with_timeout(Duration::from_millis(100));
    let file = image_file(&[0xE9u8; 4096]);
    let reply = api
        .perform_ota_update(file.path().to_path_buf())
        .finish()
        .await
        .unwrap();
    assert_eq!(reply, mock::OTA_REPLY);
}

#[tokio::test]
async fn empty_image_reports_full_progress_before_device_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v2/system/ota"))
        .respond_with(ResponseTemplate::new(400).set_body_string("empty image"))
        .expect(1)
        .mount(&server)
        .await;

    let file = image_file(&[]);
    let mut upload = client(&server, ApiVersion::V2).perform_ota_update(file.path().to_path_buf());
    assert_eq!(upload.next().await.unwrap().unwrap(), OtaEvent::Sent { total: 0 });
    let progress = upload.next().await.unwrap().unwrap();
    assert_eq!(progress, OtaEvent::UploadProgress { loaded: 0, total: 0 });
    assert_eq!(progress.percent(), Some(100));
    assert!(matches!(
        upload.next().await,
        Some(Err(SystemApiError::Status { status: 400, .. }))
    ));
}
