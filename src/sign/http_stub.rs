//! Canned-response HTTP server for tests.
//!
//! Serves a fixed `(method, path) → (status, body)` table from an axum
//! fallback handler on an ephemeral localhost port and records every
//! request it sees.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use tokio::net::TcpListener;

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    /// Header names are lowercase.
    pub headers: HashMap<String, String>,
    pub body: String,
}

type Routes = HashMap<(String, String), (u16, String)>;

#[derive(Clone)]
struct StubState {
    routes: Arc<Routes>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

#[derive(Clone)]
pub struct HttpStub {
    pub base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl HttpStub {
    /// `routes` entries are `(method, path, status, body)`.  Anything else
    /// answers 404.
    pub async fn start(routes: &[(&str, &str, u16, &str)]) -> Self {
        let routes: Routes = routes
            .iter()
            .map(|(m, p, s, b)| ((m.to_string(), p.to_string()), (*s, b.to_string())))
            .collect();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = StubState {
            routes: Arc::new(routes),
            requests: requests.clone(),
        };
        let app = Router::new().fallback(answer).with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, requests }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

async fn answer(
    State(state): State<StubState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    let path = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());
    let (status, response_body) = state
        .routes
        .get(&(method.as_str().to_string(), path.clone()))
        .cloned()
        .unwrap_or((404, String::new()));

    state.requests.lock().unwrap().push(RecordedRequest {
        method: method.as_str().to_string(),
        path,
        headers: headers
            .iter()
            .map(|(k, v)| {
                (
                    k.as_str().to_string(),
                    v.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect(),
        body,
    });

    let status = StatusCode::from_u16(status).unwrap();
    let payload = if method == Method::HEAD {
        String::new()
    } else {
        response_body
    };
    (status, [(header::CONTENT_TYPE, "application/json")], payload).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_requests_and_answers_table() {
        let stub = HttpStub::start(&[("POST", "/echo", 201, r#"{"ok":true}"#)]).await;
        let client = reqwest::Client::new();

        let resp = client
            .post(format!("{}/echo", stub.base_url))
            .header("X-Token", "abc")
            .body("hello")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 201);
        assert_eq!(resp.text().await.unwrap(), r#"{"ok":true}"#);

        let resp = client
            .get(format!("{}/other", stub.base_url))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 404);

        let requests = stub.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].method, "POST");
        assert_eq!(requests[0].path, "/echo");
        assert_eq!(requests[0].headers.get("x-token").unwrap(), "abc");
        assert_eq!(requests[0].body, "hello");
        assert_eq!(requests[1].path, "/other");
    }
}
