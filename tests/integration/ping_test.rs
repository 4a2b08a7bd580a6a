// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::start_test_server;
use serde_json::{json, Value};

#[tokio::test]
async fn test_ping_route() {
    let base = start_test_server().await;

    let response = reqwest::get(format!("{}/ping", base)).await.unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let body: Value = serde_json::from_str(&response.text().await.unwrap()).unwrap();
    assert_eq!(body, json!({ "message": "pong" }));
}
