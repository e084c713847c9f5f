mod common;

use serde_json::json;

use common::{status, FakeCloud};
use tf_provider_cloud::Diagnostics;

const UNKNOWN: &str = "74D93920-ED26-11E3-AC10-0800200C9A66";

#[tokio::test(start_paused = true)]
async fn volume_lifecycle() {
    let cloud = FakeCloud::new();
    let server = common::server(&cloud, json!({}));
    let volume = common::resource(&server, "cloud_volume");

    let config = json!({"name": "data", "size_gib": 10, "availability_zone": "zone-a"});
    let state = common::create(volume, config).await.unwrap();
    assert_eq!(state["id"], "vol-1");
    assert_eq!(state["status"], "completed");
    assert_eq!(state["volume_type"], "standard");
    assert_eq!(state["snapshot_id"], json!(null));

    let config = json!({"name": "data", "size_gib": 20, "availability_zone": "zone-a"});
    let (planned, replace) = common::plan_update(volume, &state, config.clone())
        .await
        .unwrap();
    assert!(replace.is_empty());
    assert_eq!(planned["id"], "vol-1");
    assert_eq!(planned["volume_type"], "standard");

    let state = common::update(volume, &state, config).await.unwrap();
    assert_eq!(state["size_gib"], 20);
    assert_eq!(cloud.volume("vol-1").unwrap().size_gib, 20);

    common::destroy(volume, &state).await.unwrap();
    assert!(cloud.volume("vol-1").is_none());
    assert_eq!(
        cloud.calls(),
        ["create_volume vol-1", "update_volume vol-1", "delete_volume vol-1"]
    );
}

#[tokio::test(start_paused = true)]
async fn unchanged_volume_is_not_updated() {
    let cloud = FakeCloud::new();
    let server = common::server(&cloud, json!({}));
    let volume = common::resource(&server, "cloud_volume");

    let config = json!({"name": "data", "size_gib": 10, "availability_zone": "zone-a"});
    let state = common::create(volume, config.clone()).await.unwrap();
    cloud.clear_calls();

    let state = common::update(volume, &state, config).await.unwrap();
    assert_eq!(state["size_gib"], 10);
    assert!(cloud.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn volumes_cannot_shrink() {
    let cloud = FakeCloud::new();
    let server = common::server(&cloud, json!({}));
    let volume = common::resource(&server, "cloud_volume");

    let config = json!({"size_gib": 10, "availability_zone": "zone-a"});
    let state = common::create(volume, config).await.unwrap();

    let config = json!({"size_gib": 5, "availability_zone": "zone-a"});
    let diags = common::plan_update(volume, &state, config).await.unwrap_err();
    assert_eq!(diags.errors[0].summary, "Volumes cannot shrink");
    assert_eq!(diags.errors[0].attribute.to_string(), "size_gib");
}

#[tokio::test(start_paused = true)]
async fn zone_change_replaces_the_volume() {
    let cloud = FakeCloud::new();
    let server = common::server(&cloud, json!({}));
    let volume = common::resource(&server, "cloud_volume");

    let config = json!({"size_gib": 10, "availability_zone": "zone-a"});
    let state = common::create(volume, config).await.unwrap();

    let config = json!({"size_gib": 10, "availability_zone": "zone-b"});
    let (_, replace) = common::plan_update(volume, &state, config).await.unwrap();
    assert_eq!(replace, ["availability_zone"]);
}

#[tokio::test(start_paused = true)]
async fn invalid_volume_config() {
    let cloud = FakeCloud::new();
    let server = common::server(&cloud, json!({}));
    let volume = common::resource(&server, "cloud_volume");

    let diags = common::validate(volume, json!({"size_gib": 0})).await;
    let attributes = diags
        .errors
        .iter()
        .map(|diag| diag.attribute.to_string())
        .collect::<Vec<_>>();
    assert_eq!(attributes, ["size_gib", "availability_zone"]);

    let diags = common::validate(volume, json!({"size_gib": UNKNOWN, "availability_zone": "a"}))
        .await;
    assert!(diags.errors.is_empty());
}

#[tokio::test(start_paused = true)]
async fn volume_deleted_outside_terraform_is_gone() {
    let cloud = FakeCloud::new();
    let server = common::server(&cloud, json!({}));
    let volume = common::resource(&server, "cloud_volume");

    let config = json!({"size_gib": 10, "availability_zone": "zone-a"});
    let state = common::create(volume, config).await.unwrap();
    assert_eq!(common::read(volume, &state).await.unwrap(), state);

    cloud.remove_volume("vol-1");
    assert_eq!(common::read(volume, &state).await.unwrap(), json!(null));
    common::destroy(volume, &state).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn volume_error_status_fails_the_creation() {
    let cloud = FakeCloud::new();
    let server = common::server(&cloud, json!({}));
    let volume = common::resource(&server, "cloud_volume");

    cloud.script_next_creation(vec![status("creating_error_quota")]);
    let config = json!({"size_gib": 10, "availability_zone": "zone-a"});
    let diags = common::create(volume, config).await.unwrap_err();
    assert_eq!(diags.errors[0].summary, "Volume did not complete");
    assert!(diags.errors[0].detail.contains("creating_error_quota"));
}

#[tokio::test(start_paused = true)]
async fn volume_creation_times_out() {
    let cloud = FakeCloud::new();
    let server = common::server(&cloud, json!({"timeouts": [{"volume": 1}]}));
    let volume = common::resource(&server, "cloud_volume");

    cloud.script_next_creation(vec![]);
    let start = tokio::time::Instant::now();
    let config = json!({"size_gib": 10, "availability_zone": "zone-a"});
    let diags = common::create(volume, config).await.unwrap_err();
    assert!(diags.errors[0].detail.contains("timeout"));
    assert_eq!(start.elapsed().as_secs(), 60);
}

#[tokio::test(start_paused = true)]
async fn volumes_are_listed_page_by_page() {
    let cloud = FakeCloud::new();
    let server = common::server(&cloud, json!({"page_size": 2}));
    for (name, size) in [("a", 1), ("b", 2), ("web", 3), ("c", 4), ("web", 5)] {
        cloud.add_volume(name, size);
    }

    let mut diags = Diagnostics::default();
    let volumes = server.get_data_source(&mut diags, "cloud_volumes").unwrap();
    let state = volumes
        .read(&mut diags, common::raw(&json!({})))
        .await
        .unwrap();
    let state = common::json(&state);
    assert_eq!(state["volumes"].as_array().unwrap().len(), 5);

    let requests = cloud.page_requests();
    assert_eq!(requests.len(), 3);
    assert!(requests.iter().all(|request| request.page_size == 2));

    let state = volumes
        .read(&mut diags, common::raw(&json!({"name": "web"})))
        .await
        .unwrap();
    let state = common::json(&state);
    let sizes = state["volumes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|volume| volume["size_gib"].as_i64().unwrap())
        .collect::<Vec<_>>();
    assert_eq!(sizes, [3, 5]);
    assert!(diags.errors.is_empty());
}

#[tokio::test(start_paused = true)]
async fn snapshot_lifecycle() {
    let cloud = FakeCloud::new();
    let server = common::server(&cloud, json!({}));
    let snapshot = common::resource(&server, "cloud_snapshot");
    let volume_id = cloud.add_volume("data", 8);

    let config = json!({"volume_id": volume_id, "description": "nightly"});
    let state = common::create(snapshot, config.clone()).await.unwrap();
    assert_eq!(state["status"], "completed");
    assert_eq!(state["size_gib"], 8);

    let (planned, replace) = common::plan_update(snapshot, &state, config).await.unwrap();
    assert!(replace.is_empty());
    assert_eq!(planned, state);

    let config = json!({"volume_id": volume_id, "description": "weekly"});
    let (planned, replace) = common::plan_update(snapshot, &state, config).await.unwrap();
    assert_eq!(replace, ["description"]);
    assert_eq!(planned["id"], UNKNOWN);

    common::destroy(snapshot, &state).await.unwrap();
    assert_eq!(common::read(snapshot, &state).await.unwrap(), json!(null));
}
