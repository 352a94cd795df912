//! Response-finalization audit stage.
//!
//! Runs around every route: the inbound payload (query for GET, JSON body
//! for POST) is captured before the handler, the outcome after, and the
//! finished record is handed to the sink without being awaited. A full
//! channel, a dead writer task, or an unwritable log file degrades to a
//! `warn` log; the response to the caller is never delayed or altered.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::Response,
};
use serde_json::{Map, Value};
use storebot_core::{AuditRecord, AuditSink};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tracing::warn;
use url::form_urlencoded;

use crate::storefront::AppState;

/// Payloads past this size are audited as null rather than buffered whole.
const MAX_AUDITED_BODY_BYTES: usize = 1024 * 1024;

#[derive(Clone)]
pub struct AuditHandle {
    sink: Arc<dyn AuditSink>,
}

impl AuditHandle {
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink }
    }

    /// Sink appending one JSON line per record to `path` from a background
    /// task. Must be called from within a tokio runtime.
    pub fn file(path: PathBuf) -> Self {
        Self::new(Arc::new(FileAuditSink::spawn(path)))
    }

    fn send(&self, record: AuditRecord) {
        self.sink.record(record);
    }
}

/// Forwards records over an unbounded channel to a writer task owning the
/// append-only file handle.
pub struct FileAuditSink {
    tx: mpsc::UnboundedSender<AuditRecord>,
}

impl FileAuditSink {
    pub fn spawn(path: PathBuf) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<AuditRecord>();

        tokio::spawn(async move {
            let mut file = match tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .await
            {
                Ok(file) => file,
                Err(error) => {
                    warn!(
                        event_name = "audit.file_open_failed",
                        path = %path.display(),
                        error = %error,
                        "audit log file could not be opened; records will be dropped"
                    );
                    // Keep draining so senders never observe a closed channel
                    // as an error worth surfacing.
                    while rx.recv().await.is_some() {}
                    return;
                }
            };

            while let Some(record) = rx.recv().await {
                let mut line = match serde_json::to_string(&record) {
                    Ok(line) => line,
                    Err(error) => {
                        warn!(
                            event_name = "audit.serialize_failed",
                            error = %error,
                            "audit record could not be serialized"
                        );
                        continue;
                    }
                };
                line.push('\n');
                if let Err(error) = file.write_all(line.as_bytes()).await {
                    warn!(
                        event_name = "audit.write_failed",
                        path = %path.display(),
                        error = %error,
                        "audit record could not be appended"
                    );
                }
            }
        });

        Self { tx }
    }
}

impl AuditSink for FileAuditSink {
    fn record(&self, record: AuditRecord) {
        if self.tx.send(record).is_err() {
            warn!(event_name = "audit.channel_closed", "audit writer task is gone");
        }
    }
}

/// Middleware wrapping every route.
pub async fn capture(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let (payload, request) = capture_payload(request).await;

    let response = next.run(request).await;

    let status = response.status();
    state.audit.send(AuditRecord::new(
        method.as_str(),
        &path,
        payload,
        status.as_u16(),
        status.canonical_reason().unwrap_or_default(),
    ));
    response
}

/// Pulls the auditable payload out of the request, handing back a request
/// the downstream extractors can still consume.
async fn capture_payload(request: Request) -> (Value, Request) {
    if request.method() == Method::GET {
        let payload = query_to_value(request.uri().query().unwrap_or_default());
        return (payload, request);
    }

    let (parts, body) = request.into_parts();
    match axum::body::to_bytes(body, MAX_AUDITED_BODY_BYTES).await {
        Ok(bytes) => {
            let payload = if bytes.is_empty() {
                Value::Object(Map::new())
            } else {
                serde_json::from_slice(&bytes).unwrap_or(Value::Null)
            };
            (payload, Request::from_parts(parts, Body::from(bytes)))
        }
        Err(_) => (Value::Null, Request::from_parts(parts, Body::empty())),
    }
}

fn query_to_value(query: &str) -> Value {
    let mut map = Map::new();
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        map.insert(key.into_owned(), Value::String(value.into_owned()));
    }
    Value::Object(map)
}
