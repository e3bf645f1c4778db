//! Local HTTP stubs for client tests

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::Router;
use tokio::net::TcpListener;

/// What a stub endpoint saw
#[derive(Debug, Clone, Default)]
pub(crate) struct CapturedRequest {
    pub(crate) query: HashMap<String, String>,
    pub(crate) raw_query: Option<String>,
    pub(crate) subscription_key: Option<String>,
    pub(crate) authorization: Option<String>,
    pub(crate) body: Option<serde_json::Value>,
}

pub(crate) type Captured = Arc<Mutex<Vec<CapturedRequest>>>;

/// Serve `router` on an ephemeral local port and return its root URL
pub(crate) async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

pub(crate) fn header(headers: &axum::http::HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}
