mod support;

#[tokio::test]
async fn when_listing_doors_then_every_level_door_is_reported() {
    let base_url = support::ensure_server();
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{base_url}/doors"))
        .send()
        .await
        .expect("request should succeed");
    assert_eq!(res.status(), reqwest::StatusCode::OK);

    let doors: Vec<serde_json::Value> = res.json().await.expect("doors body should be json");
    let mut ids: Vec<u64> = doors
        .iter()
        .filter_map(|d| d["door_id"].as_u64())
        .collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![1, 2]);
}

#[tokio::test]
async fn when_requesting_unknown_door_then_not_found() {
    let base_url = support::ensure_server();
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{base_url}/doors/999"))
        .send()
        .await
        .expect("request should succeed");

    assert_eq!(res.status(), reqwest::StatusCode::NOT_FOUND);
    let body: serde_json::Value = res.json().await.expect("error body should be json");
    assert_eq!(body["error"], "door not found");
}

#[tokio::test]
async fn when_requesting_plate_gated_door_then_it_starts_closed() {
    let base_url = support::ensure_server();

    // Door 2 needs two floor plates; nothing in the tests stands on them.
    let res = reqwest::get(format!("{base_url}/doors/2"))
        .await
        .expect("request should succeed");

    assert_eq!(res.status(), reqwest::StatusCode::OK);
    let body: serde_json::Value = res.json().await.expect("door body should be json");
    assert_eq!(body["door_id"], 2);
    assert_eq!(body["is_open"], false);
}
