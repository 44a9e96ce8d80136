//! Recorded command tests
//!
//! The table below pairs each recording under `tests/recordings/` with the
//! command line that produced it and a check on the command's JSON output.

mod common;

use acrctl::acr::{RegistryClient, RegistryUpdateParameters, StorageAccountProperties, Tags};
use acrctl::fixture;
use serde_json::Value;
use wiremock::MockServer;

macro_rules! recorded_tests {
    ($($name:ident: [$($arg:expr),* $(,)?] => $check:expr;)*) => {
        $(
            #[tokio::test]
            async fn $name() {
                let output = common::run_recorded(stringify!($name), &[$($arg),*]).await;
                let check: fn(&Value) = $check;
                check(&output);
            }
        )*
    };
}

recorded_tests! {
    acr_check_name: ["acr", "check-name", "-n", "acrreg1"] => |out| {
        assert_eq!(out["nameAvailable"], true);
    };
    acr_list: ["acr", "list"] => |out| {
        let registries = out.as_array().expect("list output");
        assert_eq!(registries.len(), 2);
        assert_eq!(registries[1]["tags"]["env"], "test");
    };
    acr_list_by_group: ["acr", "list", "-g", "acrrg"] => |out| {
        assert_eq!(out.as_array().expect("list output").len(), 1);
    };
    acr_show: ["acr", "show", "-n", "acrreg1"] => |out| {
        assert_eq!(out["name"], "acrreg1");
        assert_eq!(out["properties"]["loginServer"], "acrreg1-microsoft.azurecr.io");
    };
    acr_create_with_storage: [
        "acr", "create", "-n", "acrreg1", "-g", "acrrg", "-l", "westus",
        "--storage-account-name", "acrstore1",
    ] => |out| {
        assert_eq!(out["name"], "acrreg1");
        assert_eq!(out["properties"]["storageAccount"]["name"], "acrstore1");
    };
    acr_update: ["acr", "update", "-n", "acrreg1", "--admin-enabled", "true", "--tags", "team=infra"] => |out| {
        assert_eq!(out["tags"]["team"], "infra");
        assert_eq!(out["properties"]["adminUserEnabled"], true);
    };
    acr_delete: ["acr", "delete", "-n", "acrreg1"] => |out| {
        assert!(out.is_null());
    };
}

#[test]
fn create_recording_collapses_polling() {
    let recorded = fixture::load(&common::recording_path("acr_create_with_storage")).unwrap();
    assert_eq!(recorded.interactions.len(), 6);

    let shrunk = common::load_shrunk("acr_create_with_storage");
    assert_eq!(shrunk.interactions.len(), 3);

    let put = &shrunk.interactions[2];
    assert!(put.request.is_method("PUT"));
    assert_eq!(put.response.code(), Some(200));
    assert!(put
        .response
        .body_text()
        .unwrap()
        .contains("acrreg1-microsoft.azurecr.io"));
}

#[test]
fn recordings_without_polling_are_left_alone() {
    for name in ["acr_list", "acr_show", "acr_update", "acr_delete"] {
        let recorded = fixture::load(&common::recording_path(name)).unwrap();
        assert_eq!(common::load_shrunk(name), recorded, "{} changed", name);
    }
}

#[tokio::test]
async fn replay_rejects_a_different_patch_body() {
    let recorded = common::load_shrunk("acr_update");
    let patch = recorded.interactions[2].clone();
    assert!(patch.request.is_method("PATCH"));

    let server = MockServer::start().await;
    common::mount_cassette(&server, &fixture::Cassette::from_interactions(vec![patch])).await;
    let client = common::replay_client(&server);

    let mut parameters = RegistryUpdateParameters {
        tags: Some(Tags::from([("team".to_string(), "infra".to_string())])),
        admin_user_enabled: Some(true),
        storage_account: None,
    };
    let expected = parameters.clone();

    parameters.storage_account = Some(StorageAccountProperties::new("acrstore1", "k"));
    assert!(client.update("acrrg", "acrreg1", &parameters).await.is_err());

    assert!(client.update("acrrg", "acrreg1", &expected).await.is_ok());
}

#[tokio::test]
async fn replay_rejects_a_different_api_version() {
    let cassette = common::load_shrunk("acr_check_name");
    let server = MockServer::start().await;
    common::mount_cassette(&server, &cassette).await;
    let client = common::replay_client(&server);

    let url = format!(
        "{}/subscriptions/{}/providers/Microsoft.ContainerRegistry/checkNameAvailability?api-version=2019-05-01",
        server.uri(),
        common::SUBSCRIPTION
    );
    let body = serde_json::json!({
        "name": "acrreg1",
        "type": "Microsoft.ContainerRegistry/registries"
    });

    assert!(client.post(&url, Some(&body)).await.is_err());
    assert!(client.check_name_availability("acrreg1").await.is_ok());
}
