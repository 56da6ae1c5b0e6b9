#![allow(dead_code)]

use anyhow::Result;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use dailymed_mcp::{McpServer, MappingIndex, ServerConfig};
use serde_json::{Value, json};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

/// Test utilities for integration testing
pub mod test_utils {
    use super::*;

    pub fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
    }

    /// Load a text fixture
    pub fn load_fixture(name: &str) -> Result<String> {
        Ok(std::fs::read_to_string(fixtures_dir().join(name))?)
    }

    pub fn fixture_index() -> Result<MappingIndex> {
        Ok(MappingIndex::load_from_dir(fixtures_dir())?)
    }

    /// Server configuration pointing at the fixtures and a local upstream
    pub fn test_config(base_url: &str) -> ServerConfig {
        ServerConfig {
            base_url: base_url.to_string(),
            request_timeout_secs: 5,
            data_dir: fixtures_dir(),
            use_system_proxy: false,
            ..Default::default()
        }
    }

    pub fn test_server(base_url: &str) -> Result<McpServer> {
        McpServer::initialize(test_config(base_url))
    }

    /// Parse the pretty JSON text of a successful tool result
    pub fn tool_json(content: &str) -> Value {
        serde_json::from_str(content).expect("tool content should be JSON")
    }
}

/// A request received by the mock upstream
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl RecordedRequest {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.query.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }
}

type RequestLog = Arc<Mutex<Vec<RecordedRequest>>>;

/// In-process stand-in for the DailyMed v2 API
pub struct MockUpstream {
    pub base_url: String,
    requests: RequestLog,
}

impl MockUpstream {
    pub async fn start() -> Result<Self> {
        let requests: RequestLog = Arc::default();
        let app = Router::new()
            .route("/drugnames.json", get(drug_names))
            .route("/spls.json", get(spls))
            .route("/ndcs.json", get(ndcs))
            .route("/spls/{set_id}", get(spl_document))
            .route("/spls/{set_id}/media.json", get(spl_media))
            .route("/spls/{set_id}/history.json", get(spl_history))
            .with_state(requests.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            base_url: format!("http://{}", addr),
            requests,
        })
    }

    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .map(|log| log.iter().filter(|r| r.path == path).cloned().collect())
            .unwrap_or_default()
    }
}

fn record(log: &RequestLog, path: &str, query: Vec<(String, String)>) -> RecordedRequest {
    let request = RecordedRequest {
        path: path.to_string(),
        query,
    };
    if let Ok(mut log) = log.lock() {
        log.push(request.clone());
    }
    request
}

async fn drug_names(State(log): State<RequestLog>, Query(query): Query<Vec<(String, String)>>) -> Json<Value> {
    let request = record(&log, "/drugnames.json", query);
    let data = match request.param("drug_name") {
        Some("aspirin") => json!([
            { "drug_name": "ASPIRIN", "name_type": "G" },
            { "drug_name": "BAYER ASPIRIN", "name_type": "B", "active_ingredient": "ASPIRIN" },
            { "drug_name": "ECOTRIN", "name_type": "B" }
        ]),
        _ => json!([]),
    };
    Json(json!({ "data": data, "metadata": { "total_elements": data.as_array().map_or(0, Vec::len) } }))
}

fn listing_item(set_id: &str, title: &str) -> Value {
    json!({ "setid": set_id, "title": title, "published_date": "Nov 08, 2023", "spl_version": 3 })
}

async fn spls(State(log): State<RequestLog>, Query(query): Query<Vec<(String, String)>>) -> Response {
    let request = record(&log, "/spls.json", query);
    let data = match request.param("drug_name") {
        Some("ASPIRIN") => json!([
            listing_item("set-aspirin", "LOW DOSE ASPIRIN"),
            listing_item("set-shared", "ASPIRIN AND CAFFEINE")
        ]),
        Some("BAYER ASPIRIN") => json!([
            listing_item("set-shared", "ASPIRIN AND CAFFEINE"),
            listing_item("set-bayer", "BAYER ASPIRIN")
        ]),
        Some("ECOTRIN") => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        _ => json!([
            listing_item("set-aspirin", "LOW DOSE ASPIRIN"),
            listing_item("set-ibuprofen", "IBUPROFEN")
        ]),
    };
    Json(json!({ "data": data, "metadata": { "total_elements": "250" } })).into_response()
}

async fn ndcs(State(log): State<RequestLog>, Query(query): Query<Vec<(String, String)>>) -> Json<Value> {
    record(&log, "/ndcs.json", query);
    Json(json!({
        "data": [{ "ndc": "0280-2000-10" }, { "ndc": 12345 }],
        "metadata": { "total_elements": 40 }
    }))
}

async fn spl_document(State(log): State<RequestLog>, Path(file): Path<String>) -> Response {
    record(&log, &format!("/spls/{}", file), Vec::new());
    match file.strip_suffix(".xml") {
        Some(set_id) => match test_utils::load_fixture(&format!("spl_{}.xml", set_id)) {
            Ok(xml) => ([("content-type", "application/xml")], xml).into_response(),
            Err(_) => StatusCode::NOT_FOUND.into_response(),
        },
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn spl_media(Path(set_id): Path<String>) -> Json<Value> {
    Json(json!({
        "data": {
            "setid": set_id,
            "media": [{ "name": "label.jpg", "mime_type": "image/jpeg", "url": "https://example.org/label.jpg" }]
        }
    }))
}

async fn spl_history(Path(set_id): Path<String>) -> Json<Value> {
    Json(json!({
        "data": [
            { "setid": set_id, "spl_version": 3, "published_date": "Nov 08, 2023" },
            { "setid": set_id, "spl_version": "2", "published_date": "Jan 02, 2022" }
        ]
    }))
}
