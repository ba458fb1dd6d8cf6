//! In-memory stand-in for the clock's HTTP API

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use ledclock::errors::ClockError;
use ledclock::http::client::ResourceFetcher;
use serde_json::{json, Value};
use tokio::time::Instant;

/// How the fake device answers one path
#[derive(Debug, Clone)]
pub enum Route {
    Json(Value),
    NetworkError,
    Timeout,
}

/// A request the fake device received
#[derive(Debug, Clone)]
pub struct Call {
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub at: Instant,
}

pub struct MockFetcher {
    routes: Mutex<HashMap<String, Route>>,
    latency: Mutex<Duration>,
    calls: Mutex<Vec<Call>>,
}

impl MockFetcher {
    /// A healthy clock answering every polled resource
    pub fn healthy(latency: Duration) -> Self {
        let fetcher = Self {
            routes: Mutex::new(HashMap::new()),
            latency: Mutex::new(latency),
            calls: Mutex::new(Vec::new()),
        };
        fetcher.set_route("/status", Route::Json(json!({ "uptime": 1234, "chipModel": "ESP32" })));
        fetcher.set_route(
            "/config",
            Route::Json(json!({
                "brightness": { "type": "int", "value": 40 },
                "hostname": { "type": "string", "value": "clock" },
                "animation": { "type": "enum", "value": { "value": "Static", "values": ["Static", "Rainbow"] } },
            })),
        );
        fetcher.set_route("/leds", Route::Json(json!({ "count": 32 })));
        fetcher.set_route("/tasks", Route::Json(json!([{ "name": "ledmanager" }])));
        fetcher.set_route(
            "/ota",
            Route::Json(json!({ "success": true, "percentage": 0, "isInProgress": false })),
        );
        fetcher
    }

    pub fn set_route(&self, path: &str, route: Route) {
        self.routes.lock().unwrap().insert(path.to_string(), route);
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = latency;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, path: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| c.path == path).count()
    }

    async fn answer(&self, path: &str, query: &[(String, String)], body: Option<Value>) -> Result<Value, ClockError> {
        self.calls.lock().unwrap().push(Call {
            path: path.to_string(),
            query: query.to_vec(),
            body,
            at: Instant::now(),
        });

        let latency = *self.latency.lock().unwrap();
        tokio::time::sleep(latency).await;

        let route = self.routes.lock().unwrap().get(path).cloned();
        match route {
            Some(Route::Json(value)) => Ok(value),
            Some(Route::NetworkError) => Err(ClockError::NetworkError("connection reset".to_string())),
            Some(Route::Timeout) => Err(ClockError::Timeout(3000)),
            None => Err(ClockError::NetworkError(format!("404 Not Found: {}", path))),
        }
    }
}

#[async_trait]
impl ResourceFetcher for MockFetcher {
    async fn get(&self, path: &str, query: &[(String, String)]) -> Result<Value, ClockError> {
        self.answer(path, query, None).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, ClockError> {
        self.answer(path, &[], Some(body.clone())).await
    }
}
