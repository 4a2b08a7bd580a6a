// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{extract::Path, routing::get, Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// 本地测试服务器
///
/// - `GET /ping` 返回 `{"message":"pong"}`
/// - `GET /bytes/{n}` 返回 n 个字节
pub fn router() -> Router {
    Router::new()
        .route("/ping", get(ping))
        .route("/bytes/{n}", get(bytes))
}

async fn ping() -> Json<Value> {
    Json(json!({ "message": "pong" }))
}

async fn bytes(Path(n): Path<usize>) -> Vec<u8> {
    vec![b'a'; n]
}

/// 在随机端口上启动测试服务器，返回基础地址
pub async fn start_test_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, router()).await.unwrap();
    });

    format!("http://{}", addr)
}
