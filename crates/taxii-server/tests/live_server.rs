// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

mod common;

use common::{config_json, parse, TAXII};
use std::io::Write;
use std::net::TcpListener;
use std::time::{Duration, Instant};
use taxii_server::dependencies::DefaultServerDependencies;
use taxii_server::Server;

async fn wait_until_ready(client: &reqwest::Client, url: &str) {
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        if client.get(url).send().await.is_ok() {
            return;
        }
        assert!(Instant::now() < deadline, "server did not start listening at {}", url);
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

#[tokio::test]
async fn serves_seeded_sqlite_collection_over_http() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let dir = tempfile::tempdir().unwrap();
    let mut value = config_json();
    value["global"]["listen"] = serde_json::json!(addr.to_string());
    value["global"]["prefix"] = serde_json::json!(format!("{}/", dir.path().display()));
    value["global"]["db_type"] = serde_json::json!("sqlite3");
    value["global"]["db_file"] = serde_json::json!("db/taxii.db");
    let config = parse(&value);

    let seed = dir.path().join("seed.json");
    let mut file = std::fs::File::create(&seed).unwrap();
    write!(
        file,
        "{}",
        serde_json::json!({
            "col-1": [{
                "type": "malware",
                "spec_version": "2.1",
                "id": "malware--1",
                "created": "2024-05-01T00:00:00Z",
                "modified": "2024-05-01T00:00:00Z",
                "name": "Example",
                "is_family": false
            }]
        })
    )
    .unwrap();

    let state = DefaultServerDependencies::new(&config)
        .await
        .expect("dependencies")
        .seed(&seed)
        .await
        .expect("seed")
        .into_state();
    let server = Server::with_state(&config, state).expect("server");
    assert_eq!(server.addr(), addr);
    let handle = tokio::spawn(async move {
        server.run().await.expect("server run");
    });

    let client = reqwest::Client::new();
    let base = format!("http://{}", addr);
    wait_until_ready(&client, &format!("{}/taxii2/", base)).await;

    let response = client
        .get(format!("{}/api1/collections/col-1/objects/", base))
        .header("Accept", TAXII)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(response.headers()["content-type"], TAXII);
    let envelope: serde_json::Value = response.json().await.unwrap();
    assert_eq!(envelope["more"], false);
    assert_eq!(envelope["objects"][0]["id"], "malware--1");

    let response = client
        .get(format!("{}/api1/collections/col-1/", base))
        .send()
        .await
        .unwrap();
    let collection: serde_json::Value = response.json().await.unwrap();
    assert_eq!(collection["title"], "Indicators");

    let response = client
        .get(format!("{}/api1/collections/col-1/objects/", base))
        .header("Accept", "text/plain")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::NOT_ACCEPTABLE);

    assert!(dir.path().join("db/taxii.db").exists());
    handle.abort();
}

#[tokio::test]
async fn startup_fails_when_the_port_is_taken() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().unwrap();

    let mut value = config_json();
    value["global"]["listen"] = serde_json::json!(addr.to_string());
    let config = parse(&value);

    let server = Server::new(&config).await.expect("server");
    let err = server.run().await.unwrap_err();
    assert!(matches!(err, taxii_server::StartupError::Bind { .. }), "{}", err);
    drop(listener);
}
